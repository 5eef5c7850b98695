//! Instants and continuous sequences, the parts a sequence set is made of.

pub mod instant;
pub mod sequence;

pub use instant::{Instant, InstantSet};
pub use sequence::{Fragments, Interpolation, Sequence};

/// Tolerance for collinearity and on-segment tests of interpolated values.
pub(crate) const EPSILON: f64 = 1e-9;
