use geo::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D or 3D point value carried by temporal points.
///
/// The planar coordinates live in a `geo::Point`; the optional `z` holds the
/// altitude/elevation. `srid` and `geodetic` describe the coordinate
/// reference, and every instant of one temporal point must agree on them.
///
/// # Examples
///
/// ```
/// use seqset_types::point::GeoPoint;
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(10.0, 0.0);
/// assert_eq!(a.lerp(&b, 0.25).x(), 2.5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Planar coordinates (longitude/latitude or x/y)
    pub point: Point<f64>,
    /// Altitude/elevation, present for 3D points
    pub z: Option<f64>,
    /// Spatial reference identifier
    pub srid: i32,
    /// True for geography (lon/lat on the sphere) points
    pub geodetic: bool,
}

impl GeoPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: None,
            srid: 0,
            geodetic: false,
        }
    }

    pub fn new_3d(x: f64, y: f64, z: f64) -> Self {
        Self {
            point: Point::new(x, y),
            z: Some(z),
            srid: 0,
            geodetic: false,
        }
    }

    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn geodetic(mut self) -> Self {
        self.geodetic = true;
        self
    }

    pub fn x(&self) -> f64 {
        self.point.x()
    }

    pub fn y(&self) -> f64 {
        self.point.y()
    }

    pub fn has_z(&self) -> bool {
        self.z.is_some()
    }

    /// True when both points share SRID, dimensionality and geodetic flag.
    pub fn same_reference(&self, other: &GeoPoint) -> bool {
        self.srid == other.srid
            && self.has_z() == other.has_z()
            && self.geodetic == other.geodetic
    }

    /// Linear interpolation towards `other`; `ratio` in `[0, 1]`.
    pub fn lerp(&self, other: &GeoPoint, ratio: f64) -> GeoPoint {
        let lerp = |a: f64, b: f64| a + (b - a) * ratio;
        GeoPoint {
            point: Point::new(lerp(self.x(), other.x()), lerp(self.y(), other.y())),
            z: match (self.z, other.z) {
                (Some(a), Some(b)) => Some(lerp(a, b)),
                _ => None,
            },
            srid: self.srid,
            geodetic: self.geodetic,
        }
    }

    /// Euclidean distance, using `z` when both points carry it.
    pub fn distance(&self, other: &GeoPoint) -> f64 {
        let dx = self.x() - other.x();
        let dy = self.y() - other.y();
        let dz = match (self.z, other.z) {
            (Some(a), Some(b)) => a - b,
            _ => 0.0,
        };
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub(crate) fn coords(&self) -> [f64; 3] {
        [self.x(), self.y(), self.z.unwrap_or(0.0)]
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.srid != 0 {
            write!(f, "SRID={};", self.srid)?;
        }
        match self.z {
            Some(z) => write!(f, "POINT Z ({} {} {})", self.x(), self.y(), z),
            None => write!(f, "POINT({} {})", self.x(), self.y()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_3d() {
        let p1 = GeoPoint::new_3d(0.0, 0.0, 0.0);
        let p2 = GeoPoint::new_3d(3.0, 4.0, 12.0);
        assert_eq!(p1.distance(&p2), 13.0);
    }

    #[test]
    fn test_same_reference() {
        let a = GeoPoint::new(1.0, 2.0).with_srid(4326);
        assert!(a.same_reference(&GeoPoint::new(5.0, 6.0).with_srid(4326)));
        assert!(!a.same_reference(&GeoPoint::new(5.0, 6.0)));
        assert!(!a.same_reference(&GeoPoint::new_3d(5.0, 6.0, 1.0).with_srid(4326)));
    }

    #[test]
    fn test_display() {
        assert_eq!(GeoPoint::new(1.0, 2.5).to_string(), "POINT(1 2.5)");
        assert_eq!(
            GeoPoint::new_3d(1.0, 2.0, 3.0).with_srid(4326).to_string(),
            "SRID=4326;POINT Z (1 2 3)"
        );
    }
}
