//! Temporal sequence sets with a compact single-buffer layout, bounding
//! boxes and a temporal algebra.
//!
//! ```rust
//! use seqset::{Instant, Interpolation, Sequence, SequenceSet, TimestampTz, Value};
//!
//! let t = TimestampTz::from_micros;
//! let morning = Sequence::new(
//!     vec![Instant::new(1.0, t(0)), Instant::new(3.0, t(10))],
//!     true,
//!     true,
//!     Interpolation::Linear,
//!     true,
//! )?;
//! let evening = Sequence::new(
//!     vec![Instant::new(3.0, t(20)), Instant::new(1.0, t(30))],
//!     true,
//!     true,
//!     Interpolation::Linear,
//!     true,
//! )?;
//! let set = SequenceSet::new(vec![morning, evening], true)?;
//! assert_eq!(set.count(), 2);
//! assert_eq!(set.value_at_timestamp(t(5))?, Some(Value::Float(2.0)));
//! assert_eq!(set.value_at_timestamp(t(15))?, None);
//! # Ok::<(), seqset::SeqSetError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod seqset;
pub mod storage;
pub mod temporal;

pub use builder::SeqSetBuilder;
pub use compute::Intersection;
pub use config::Config;
pub use error::{Result, SeqSetError};
pub use seqset::{Location, SequenceSet, SetFlags};
pub use temporal::{Fragments, Instant, InstantSet, Interpolation, Sequence};

pub use seqset_types::{
    BBox, GeoPoint, NumRange, Period, PeriodSet, STBox, TBox, TimestampSet, TimestampTz,
    TypeError, Value, ValueKind,
};

#[cfg(feature = "snapshot")]
pub use storage::snapshot::SNAPSHOT_VERSION;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{Config, Result, SeqSetBuilder, SeqSetError, SequenceSet};

    pub use crate::{Instant, InstantSet, Interpolation, Intersection, Sequence};

    pub use seqset_types::{NumRange, Period, PeriodSet, TimestampSet, TimestampTz, Value};
}
