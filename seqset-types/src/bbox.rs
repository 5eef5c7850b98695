use crate::period::Period;
use crate::point::GeoPoint;
use crate::range::NumRange;
use crate::timestamp::TimestampTz;
use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};

/// A numeric value range crossed with a time extent.
///
/// Summarises temporal integers and floats: every value lies in
/// `[xmin, xmax]` and every timestamp in `[tmin, tmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TBox {
    /// Minimum value
    pub xmin: f64,
    /// Maximum value
    pub xmax: f64,
    /// Earliest timestamp
    pub tmin: TimestampTz,
    /// Latest timestamp
    pub tmax: TimestampTz,
}

impl TBox {
    /// Box of a single value at a single instant.
    pub fn from_instant(value: f64, t: TimestampTz) -> Self {
        Self {
            xmin: value,
            xmax: value,
            tmin: t,
            tmax: t,
        }
    }

    /// Check if a value lies within the value extent.
    pub fn contains_value(&self, value: f64) -> bool {
        value >= self.xmin && value <= self.xmax
    }

    /// Check if the value extent overlaps a numeric range.
    pub fn overlaps_range(&self, range: &NumRange) -> bool {
        let below = range.upper() < self.xmin || (range.upper() == self.xmin && !range.upper_inc());
        let above = range.lower() > self.xmax || (range.lower() == self.xmax && !range.lower_inc());
        !(below || above)
    }

    /// Grow this box to cover `other`.
    pub fn expand(&mut self, other: &TBox) {
        self.xmin = self.xmin.min(other.xmin);
        self.xmax = self.xmax.max(other.xmax);
        self.tmin = self.tmin.min(other.tmin);
        self.tmax = self.tmax.max(other.tmax);
    }
}

/// A spatial extent (2D or 3D) crossed with a time extent.
///
/// Summarises temporal points. `srid`, `has_z` and `geodetic` are copied
/// from the points and are identical across one temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct STBox {
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    /// Only meaningful when `has_z` is set
    pub zmin: f64,
    pub zmax: f64,
    pub has_z: bool,
    pub geodetic: bool,
    pub srid: i32,
    pub tmin: TimestampTz,
    pub tmax: TimestampTz,
}

impl STBox {
    /// Box of a single point at a single instant.
    pub fn from_instant(point: &GeoPoint, t: TimestampTz) -> Self {
        let z = point.z.unwrap_or(0.0);
        Self {
            xmin: point.x(),
            xmax: point.x(),
            ymin: point.y(),
            ymax: point.y(),
            zmin: z,
            zmax: z,
            has_z: point.has_z(),
            geodetic: point.geodetic,
            srid: point.srid,
            tmin: t,
            tmax: t,
        }
    }

    /// Check if a point is contained within the spatial extent.
    pub fn contains_point(&self, point: &GeoPoint) -> bool {
        let in_plane = point.x() >= self.xmin
            && point.x() <= self.xmax
            && point.y() >= self.ymin
            && point.y() <= self.ymax;
        match (self.has_z, point.z) {
            (true, Some(z)) => in_plane && z >= self.zmin && z <= self.zmax,
            _ => in_plane,
        }
    }

    /// Grow this box to cover `other`.
    pub fn expand(&mut self, other: &STBox) {
        self.xmin = self.xmin.min(other.xmin);
        self.xmax = self.xmax.max(other.xmax);
        self.ymin = self.ymin.min(other.ymin);
        self.ymax = self.ymax.max(other.ymax);
        if self.has_z {
            self.zmin = self.zmin.min(other.zmin);
            self.zmax = self.zmax.max(other.zmax);
        }
        self.tmin = self.tmin.min(other.tmin);
        self.tmax = self.tmax.max(other.tmax);
    }
}

/// The bounding summary of a temporal value, by value kind.
///
/// Booleans and text are summarised by their time extent only, numbers by a
/// [`TBox`] and points by an [`STBox`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BBox {
    Period(Period),
    TBox(TBox),
    STBox(STBox),
}

impl BBox {
    /// Box of one value at one instant; `None` for boxless kinds.
    pub fn of_instant(value: &Value, t: TimestampTz) -> Option<BBox> {
        match value {
            Value::Bool(_) | Value::Text(_) => Some(BBox::Period(Period::instant(t))),
            Value::Int(_) | Value::Float(_) => {
                value.as_f64().map(|x| BBox::TBox(TBox::from_instant(x, t)))
            }
            Value::Point(p) => Some(BBox::STBox(STBox::from_instant(p, t))),
            Value::Double2(..) => None,
        }
    }

    /// Whether boxes of values of `kind` are `TBox`, `STBox` or time-only.
    pub fn kind_tag(kind: ValueKind) -> Option<u8> {
        match kind {
            ValueKind::Bool | ValueKind::Text => Some(1),
            ValueKind::Int | ValueKind::Float => Some(2),
            ValueKind::GeomPoint | ValueKind::GeogPoint => Some(3),
            ValueKind::Double2 => None,
        }
    }

    /// Time extent of the box. For value boxes the bounds are inclusive.
    pub fn period(&self) -> Period {
        match self {
            BBox::Period(p) => *p,
            BBox::TBox(b) => Period::instant(b.tmin).span(&Period::instant(b.tmax)),
            BBox::STBox(b) => Period::instant(b.tmin).span(&Period::instant(b.tmax)),
        }
    }

    pub fn as_tbox(&self) -> Option<&TBox> {
        match self {
            BBox::TBox(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_stbox(&self) -> Option<&STBox> {
        match self {
            BBox::STBox(b) => Some(b),
            _ => None,
        }
    }

    /// Grow this box to cover `other`. Boxes of different shapes are left
    /// unchanged, since they never summarise the same value.
    pub fn expand(&mut self, other: &BBox) {
        match (self, other) {
            (BBox::Period(a), BBox::Period(b)) => *a = a.span(b),
            (BBox::TBox(a), BBox::TBox(b)) => a.expand(b),
            (BBox::STBox(a), BBox::STBox(b)) => a.expand(b),
            _ => {}
        }
    }

    /// Sound pre-test for value containment: `false` proves absence.
    pub fn may_contain(&self, value: &Value) -> bool {
        match (self, value) {
            (BBox::TBox(b), v) => v.as_f64().is_some_and(|x| b.contains_value(x)),
            (BBox::STBox(b), Value::Point(p)) => b.contains_point(p),
            (BBox::Period(_), _) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    #[test]
    fn test_tbox_expand() {
        let mut b = TBox::from_instant(2.0, t(10));
        b.expand(&TBox::from_instant(-1.0, t(20)));
        assert_eq!(b.xmin, -1.0);
        assert_eq!(b.xmax, 2.0);
        assert_eq!(b.tmin, t(10));
        assert_eq!(b.tmax, t(20));
    }

    #[test]
    fn test_tbox_overlaps_range() {
        let b = TBox {
            xmin: 1.0,
            xmax: 3.0,
            tmin: t(0),
            tmax: t(1),
        };
        assert!(b.overlaps_range(&NumRange::new(3.0, 5.0, true, true).unwrap()));
        assert!(!b.overlaps_range(&NumRange::new(3.0, 5.0, false, true).unwrap()));
        assert!(!b.overlaps_range(&NumRange::new(-1.0, 1.0, true, false).unwrap()));
        assert!(b.overlaps_range(&NumRange::new(0.0, 10.0, true, true).unwrap()));
    }

    #[test]
    fn test_stbox_contains_point() {
        let mut b = STBox::from_instant(&GeoPoint::new(0.0, 0.0), t(0));
        b.expand(&STBox::from_instant(&GeoPoint::new(10.0, 5.0), t(5)));
        assert!(b.contains_point(&GeoPoint::new(5.0, 2.5)));
        assert!(!b.contains_point(&GeoPoint::new(11.0, 2.5)));
    }

    #[test]
    fn test_of_instant_by_kind() {
        assert!(matches!(
            BBox::of_instant(&Value::Bool(true), t(1)),
            Some(BBox::Period(_))
        ));
        assert!(matches!(
            BBox::of_instant(&Value::Int(4), t(1)),
            Some(BBox::TBox(_))
        ));
        assert!(BBox::of_instant(&Value::Double2(1.0, 2.0), t(1)).is_none());
    }

    #[test]
    fn test_may_contain_prunes() {
        let b = BBox::TBox(TBox::from_instant(1.0, t(0)));
        assert!(b.may_contain(&Value::Int(1)));
        assert!(!b.may_contain(&Value::Float(1.5)));
    }
}
