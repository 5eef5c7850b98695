use crate::error::TypeError;
use crate::period::Period;
use crate::timestamp::TimestampTz;
use serde::{Deserialize, Serialize};

/// An ordered set of distinct timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TimestampSetRepr")]
pub struct TimestampSet {
    times: Vec<TimestampTz>,
}

#[derive(Deserialize)]
struct TimestampSetRepr {
    times: Vec<TimestampTz>,
}

impl TryFrom<TimestampSetRepr> for TimestampSet {
    type Error = TypeError;

    fn try_from(repr: TimestampSetRepr) -> Result<Self, TypeError> {
        TimestampSet::new(repr.times)
    }
}

impl TimestampSet {
    /// Sorts and deduplicates the input.
    pub fn new(mut times: Vec<TimestampTz>) -> Result<Self, TypeError> {
        if times.is_empty() {
            return Err(TypeError::EmptySet("timestamp set"));
        }
        times.sort_unstable();
        times.dedup();
        Ok(Self { times })
    }

    pub fn times(&self) -> &[TimestampTz] {
        &self.times
    }

    pub fn count(&self) -> usize {
        self.times.len()
    }

    pub fn time_n(&self, index: usize) -> Option<TimestampTz> {
        self.times.get(index).copied()
    }

    /// Bounding period `[first, last]`.
    pub fn bbox(&self) -> Period {
        Period::instant(self.times[0]).span(&Period::instant(self.times[self.times.len() - 1]))
    }
}
