//! # seqset-types
//!
//! Time, value and bounding-box types shared by the temporal sequence-set
//! engine.
//!
//! - **Time types**: `TimestampTz`, `Period`, `PeriodSet`, `TimestampSet`
//! - **Value types**: `Value`, `ValueKind`, `GeoPoint`, `NumRange`
//! - **Bounding boxes**: `TBox`, `STBox`, `BBox`
//!
//! All types are serializable with Serde. Point values are built on top of
//! the `geo` crate's geometric primitives.
//!
//! ## Examples
//!
//! ```rust
//! use seqset_types::period::Period;
//! use seqset_types::timestamp::TimestampTz;
//!
//! let lower = TimestampTz::parse("2000-01-01").unwrap();
//! let upper = TimestampTz::parse("2000-01-02").unwrap();
//! let day = Period::new(lower, upper, true, false).unwrap();
//! assert!(day.contains_timestamp(lower));
//! assert!(!day.contains_timestamp(upper));
//! ```

pub mod bbox;
pub mod error;
pub mod period;
pub mod periodset;
pub mod point;
pub mod range;
pub mod timestamp;
pub mod timestampset;
pub mod value;

pub use bbox::{BBox, STBox, TBox};
pub use error::TypeError;
pub use period::{Period, cmp_lower_bounds, cmp_upper_bounds};
pub use periodset::PeriodSet;
pub use point::GeoPoint;
pub use range::NumRange;
pub use timestamp::TimestampTz;
pub use timestampset::TimestampSet;
pub use value::{Value, ValueKind};
