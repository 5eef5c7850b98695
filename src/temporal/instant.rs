use crate::error::{Result, SeqSetError};
use seqset_types::{Period, TimestampTz, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single `(value, timestamp)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instant {
    t: TimestampTz,
    value: Value,
}

impl Instant {
    pub fn new(value: impl Into<Value>, t: TimestampTz) -> Self {
        Self {
            t,
            value: value.into(),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn t(&self) -> TimestampTz {
        self.t
    }

    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub(crate) fn with_time(&self, t: TimestampTz) -> Instant {
        Instant {
            t,
            value: self.value.clone(),
        }
    }

    pub(crate) fn hash32(&self) -> u32 {
        let micros = self.t.micros() as u64;
        let time_hash = (micros ^ (micros >> 32)) as u32;
        self.value.hash32().wrapping_mul(31).wrapping_add(time_hash)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.t)
    }
}

/// Check that `next` may follow `prev` inside one temporal value.
pub(crate) fn check_compatible(prev: &Value, next: &Value) -> Result<()> {
    if prev.kind() != next.kind() {
        return Err(SeqSetError::KindMismatch {
            expected: prev.kind(),
            found: next.kind(),
        });
    }
    if let (Value::Point(a), Value::Point(b)) = (prev, next)
        && !a.same_reference(b)
    {
        return Err(SeqSetError::MixedGeometry(format!(
            "SRID {} ({}) does not match SRID {} ({})",
            a.srid,
            if a.has_z() { "3D" } else { "2D" },
            b.srid,
            if b.has_z() { "3D" } else { "2D" }
        )));
    }
    Ok(())
}

/// A set of instants at strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstantSet {
    instants: Vec<Instant>,
}

impl InstantSet {
    /// Instants must share one kind and be strictly increasing in time.
    pub fn new(instants: Vec<Instant>) -> Result<Self> {
        if instants.is_empty() {
            return Err(SeqSetError::EmptyInput("instant set"));
        }
        for pair in instants.windows(2) {
            check_compatible(pair[0].value(), pair[1].value())?;
            if pair[0].t() >= pair[1].t() {
                return Err(SeqSetError::BrokenOrdering {
                    prev: pair[0].t(),
                    next: pair[1].t(),
                });
            }
        }
        Ok(Self { instants })
    }

    /// Callers guarantee the ordering and kind invariants.
    pub(crate) fn from_sorted(instants: Vec<Instant>) -> Option<Self> {
        (!instants.is_empty()).then_some(Self { instants })
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn count(&self) -> usize {
        self.instants.len()
    }

    pub fn kind(&self) -> ValueKind {
        self.instants[0].kind()
    }

    pub fn start_timestamp(&self) -> TimestampTz {
        self.instants[0].t()
    }

    pub fn end_timestamp(&self) -> TimestampTz {
        self.instants[self.instants.len() - 1].t()
    }

    /// Bounding period `[first, last]`.
    pub fn period(&self) -> Period {
        Period::instant(self.start_timestamp()).span(&Period::instant(self.end_timestamp()))
    }
}

impl fmt::Display for InstantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, inst) in self.instants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", inst)?;
        }
        write!(f, "}}")
    }
}
