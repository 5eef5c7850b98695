//! Base values carried by temporal types.
//!
//! `ValueKind` is the closed set of supported base types. Each kind exposes
//! its capabilities (ordering, arithmetic, box projection) through methods so
//! operators dispatch once on the kind rather than per element.

use crate::error::TypeError;
use crate::point::GeoPoint;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The base type of a temporal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValueKind {
    Bool = 1,
    Int = 2,
    Float = 3,
    Text = 4,
    GeomPoint = 5,
    GeogPoint = 6,
    /// Internal pair of doubles used by aggregate state; has no bounding box.
    Double2 = 7,
}

impl ValueKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            1 => Ok(ValueKind::Bool),
            2 => Ok(ValueKind::Int),
            3 => Ok(ValueKind::Float),
            4 => Ok(ValueKind::Text),
            5 => Ok(ValueKind::GeomPoint),
            6 => Ok(ValueKind::GeogPoint),
            7 => Ok(ValueKind::Double2),
            other => Err(TypeError::UnknownKindTag(other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::GeomPoint => "geometry point",
            ValueKind::GeogPoint => "geography point",
            ValueKind::Double2 => "double2",
        }
    }

    /// Kinds with a numeric value range (`TBox`).
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float)
    }

    /// Kinds that support linear interpolation between instants.
    pub fn is_continuous(self) -> bool {
        matches!(
            self,
            ValueKind::Float | ValueKind::GeomPoint | ValueKind::GeogPoint | ValueKind::Double2
        )
    }

    pub fn is_spatial(self) -> bool {
        matches!(self, ValueKind::GeomPoint | ValueKind::GeogPoint)
    }

    /// Kinds that carry a trailing bounding box.
    pub fn has_bbox(self) -> bool {
        self != ValueKind::Double2
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single base value.
///
/// Equality, ordering and hashing are total: floats compare with
/// `f64::total_cmp`, so `Value` can be used as a map key and deduplicated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Float(f64),
    Text(String),
    Point(GeoPoint),
    Double2(f64, f64),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Point(p) if p.geodetic => ValueKind::GeogPoint,
            Value::Point(_) => ValueKind::GeomPoint,
            Value::Double2(..) => ValueKind::Double2,
        }
    }

    /// Numeric projection used by boxes, ranges and aggregates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(f64::from(*i)),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<&GeoPoint> {
        match self {
            Value::Point(p) => Some(p),
            _ => None,
        }
    }

    /// Value at `ratio` of the way towards `other`, for continuous kinds.
    ///
    /// Returns `None` for kinds without linear interpolation or when the
    /// operands are of different kinds.
    pub fn interpolate(&self, other: &Value, ratio: f64) -> Option<Value> {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Some(Value::Float(a + (b - a) * ratio)),
            (Value::Point(a), Value::Point(b)) => Some(Value::Point(a.lerp(b, ratio))),
            (Value::Double2(a1, a2), Value::Double2(b1, b2)) => Some(Value::Double2(
                a1 + (b1 - a1) * ratio,
                a2 + (b2 - a2) * ratio,
            )),
            _ => None,
        }
    }

    /// Deterministic 32-bit hash of the value.
    pub fn hash32(&self) -> u32 {
        let mut hasher = FxHasher::default();
        self.hash(&mut hasher);
        let h = hasher.finish();
        (h ^ (h >> 32)) as u32
    }
}

fn cmp_point(a: &GeoPoint, b: &GeoPoint) -> Ordering {
    let (ca, cb) = (a.coords(), b.coords());
    ca[0]
        .total_cmp(&cb[0])
        .then_with(|| ca[1].total_cmp(&cb[1]))
        .then_with(|| ca[2].total_cmp(&cb[2]))
        .then_with(|| a.has_z().cmp(&b.has_z()))
        .then_with(|| a.srid.cmp(&b.srid))
        .then_with(|| a.geodetic.cmp(&b.geodetic))
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Point(a), Value::Point(b)) => cmp_point(a, b),
            (Value::Double2(a1, a2), Value::Double2(b1, b2)) => {
                a1.total_cmp(b1).then_with(|| a2.total_cmp(b2))
            }
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().tag().hash(state);
        match self {
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Point(p) => {
                for c in p.coords() {
                    c.to_bits().hash(state);
                }
                p.has_z().hash(state);
                p.srid.hash(state);
            }
            Value::Double2(a, b) => {
                a.to_bits().hash(state);
                b.to_bits().hash(state);
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => f.write_str(if *b { "t" } else { "f" }),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Point(p) => write!(f, "{}", p),
            Value::Double2(a, b) => write!(f, "({},{})", a, b),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<GeoPoint> for Value {
    fn from(p: GeoPoint) -> Self {
        Value::Point(p)
    }
}
