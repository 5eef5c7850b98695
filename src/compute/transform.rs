//! Whole-set transformations: merging, casts, interpolation change and
//! time shift.

use super::normalize::normalize_sequences;
use crate::error::{Result, SeqSetError};
use crate::seqset::{SequenceSet, align_interpolation};
use crate::temporal::{Interpolation, Sequence};
use seqset_types::{Value, ValueKind};

/// Join two sequences that share one inclusive instant with equal values.
fn join_at_shared_instant(prev: Sequence, next: &Sequence) -> Sequence {
    let mut instants = prev.instants().to_vec();
    instants.pop();
    instants.extend_from_slice(next.instants());
    Sequence::make(
        instants,
        prev.period().lower_inc(),
        next.period().upper_inc(),
        prev.interpolation(),
        true,
    )
}

impl SequenceSet {
    /// Union of two sets defined on disjoint times.
    pub fn merge(&self, other: &SequenceSet) -> Result<SequenceSet> {
        SequenceSet::merge_all(&[self.clone(), other.clone()])
    }

    /// Union of sets defined on disjoint times.
    ///
    /// Two sets may share a single instant when they agree on its value;
    /// the result is normalized.
    pub fn merge_all(sets: &[SequenceSet]) -> Result<SequenceSet> {
        let Some(first) = sets.first() else {
            return Err(SeqSetError::EmptyInput("merge"));
        };
        let mut sequences = Vec::new();
        for set in sets {
            if set.kind() != first.kind() {
                return Err(SeqSetError::KindMismatch {
                    expected: first.kind(),
                    found: set.kind(),
                });
            }
            sequences.extend(set.sequences()?);
        }
        let mut sequences = align_interpolation(sequences);
        if sequences
            .iter()
            .any(|s| s.interpolation() != sequences[0].interpolation())
        {
            return Err(SeqSetError::MixedInterpolation);
        }
        sequences.sort_by(|a, b| a.period().cmp(b.period()));

        let mut merged: Vec<Sequence> = Vec::with_capacity(sequences.len());
        for seq in sequences {
            let Some(prev) = merged.pop() else {
                merged.push(seq);
                continue;
            };
            let (p, n) = (prev.period(), seq.period());
            if p.upper() == n.lower() && p.upper_inc() && n.lower_inc() {
                if prev.end_instant().value() != seq.start_instant().value() {
                    return Err(SeqSetError::ConflictingValues { at: n.lower() });
                }
                merged.push(join_at_shared_instant(prev, &seq));
            } else if p.upper() > n.lower() {
                return Err(SeqSetError::BrokenOrdering {
                    prev: p.upper(),
                    next: n.lower(),
                });
            } else {
                merged.push(prev);
                merged.push(seq);
            }
        }
        log::debug!(
            "merging {} sets into {} sequences",
            sets.len(),
            merged.len()
        );
        SequenceSet::build(merged, true, first.alignment())
    }

    /// The same values at times moved by `delta_micros`.
    pub fn shift(&self, delta_micros: i64) -> Result<SequenceSet> {
        let mut shifted = Vec::with_capacity(self.count());
        for i in 0..self.count() {
            let seq = self.seq(i)?.shift(delta_micros).ok_or_else(|| {
                SeqSetError::InvalidInput(format!(
                    "shifting by {} microseconds leaves the timestamp range",
                    delta_micros
                ))
            })?;
            shifted.push(seq);
        }
        SequenceSet::from_sequences(shifted, self.alignment())
            .ok_or(SeqSetError::EmptyInput("sequence set"))
    }

    /// Turn a stepwise float or point set into an equivalent linear one.
    pub fn step_to_linear(&self) -> Result<SequenceSet> {
        if self.is_linear() {
            return Ok(self.clone());
        }
        if !self.kind().is_continuous() {
            return Err(SeqSetError::unsupported("step_to_linear", self.kind()));
        }
        let mut pieces = Vec::with_capacity(self.total_count());
        for i in 0..self.count() {
            pieces.extend(self.seq(i)?.step_to_linear());
        }
        SequenceSet::from_sequences(normalize_sequences(pieces), self.alignment())
            .ok_or(SeqSetError::EmptyInput("sequence set"))
    }

    fn map_sequences(
        &self,
        interp: Interpolation,
        f: impl Fn(&Value) -> Value,
    ) -> Result<SequenceSet> {
        let mut mapped = Vec::with_capacity(self.count());
        for i in 0..self.count() {
            mapped.push(self.seq(i)?.map_values(interp, &f));
        }
        SequenceSet::from_sequences(normalize_sequences(mapped), self.alignment())
            .ok_or(SeqSetError::EmptyInput("sequence set"))
    }

    /// Cast an integer set to floats, keeping stepwise interpolation.
    pub fn int_to_float(&self) -> Result<SequenceSet> {
        if self.kind() != ValueKind::Int {
            return Err(SeqSetError::unsupported("int_to_float", self.kind()));
        }
        self.map_sequences(Interpolation::Stepwise, |v| match v {
            Value::Int(i) => Value::Float(f64::from(*i)),
            other => other.clone(),
        })
    }

    /// Cast a stepwise float set to integers, truncating toward zero.
    pub fn float_to_int(&self) -> Result<SequenceSet> {
        if self.kind() != ValueKind::Float || self.is_linear() {
            return Err(SeqSetError::unsupported("float_to_int", self.kind()));
        }
        self.map_sequences(Interpolation::Stepwise, |v| match v {
            Value::Float(x) => Value::Int(*x as i32),
            other => other.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Instant;
    use seqset_types::{Period, TimestampTz};

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    fn step(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> Sequence {
        let instants = points.iter().map(|&(v, us)| Instant::new(v, t(us))).collect();
        Sequence::new(instants, lower_inc, upper_inc, Interpolation::Stepwise, true)
            .expect("valid sequence")
    }

    fn single(seq: Sequence) -> SequenceSet {
        SequenceSet::from_sequence(seq)
    }

    #[test]
    fn test_merge_disjoint_sets() {
        let a = single(step(&[(1.0, 20), (2.0, 30)], true, true));
        let b = single(step(&[(1.0, 0), (2.0, 10)], true, true));
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.count(), 2);
        assert_eq!(merged.start_timestamp(), t(0));
    }

    #[test]
    fn test_merge_joins_shared_instant() {
        let a = single(step(&[(1.0, 0), (2.0, 10)], true, true));
        let b = single(step(&[(2.0, 10), (3.0, 20)], true, true));
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.count(), 1);
        assert_eq!(merged.total_count(), 3);
    }

    #[test]
    fn test_merge_rejects_conflicts_and_overlaps() {
        let a = single(step(&[(1.0, 0), (2.0, 10)], true, true));
        let b = single(step(&[(5.0, 10), (3.0, 20)], true, true));
        assert!(matches!(
            a.merge(&b),
            Err(SeqSetError::ConflictingValues { .. })
        ));
        let c = single(step(&[(5.0, 5), (3.0, 20)], true, true));
        assert!(matches!(
            a.merge(&c),
            Err(SeqSetError::BrokenOrdering { .. })
        ));
        assert!(matches!(
            SequenceSet::merge_all(&[]),
            Err(SeqSetError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_merge_with_instant_set() {
        let lone = SequenceSet::from_instant(Instant::new(3.0, t(40)));
        assert!(lone.is_linear());

        let stepwise = single(step(&[(1.0, 0), (2.0, 10)], true, true));
        let merged = stepwise.merge(&lone).unwrap();
        assert!(!merged.is_linear());
        assert_eq!(merged.count(), 2);

        let linear = single(
            Sequence::new(
                vec![Instant::new(1.0, t(0)), Instant::new(2.0, t(10))],
                true,
                true,
                Interpolation::Linear,
                true,
            )
            .expect("valid sequence"),
        );
        let merged = linear.merge(&lone).unwrap();
        assert!(merged.is_linear());
        assert_eq!(merged.total_count(), 3);

        let later = single(step(&[(2.0, 20), (2.0, 30)], true, true));
        assert!(matches!(
            linear.merge(&later),
            Err(SeqSetError::MixedInterpolation)
        ));
    }

    #[test]
    fn test_shift() {
        let set = single(step(&[(1.0, 0), (2.0, 10)], true, true));
        let shifted = set.shift(100).unwrap();
        assert_eq!(
            shifted.period(),
            Period::new(t(100), t(110), true, true).unwrap()
        );
        assert!(set.shift(i64::MAX).is_err());
    }

    #[test]
    fn test_step_to_linear() {
        let set = single(step(&[(1.0, 0), (2.0, 10), (2.0, 20)], true, true));
        let linear = set.step_to_linear().unwrap();
        assert!(linear.is_linear());
        assert_eq!(linear.value_at_timestamp(t(5)).unwrap(), Some(Value::Float(1.0)));
        assert_eq!(linear.value_at_timestamp(t(15)).unwrap(), Some(Value::Float(2.0)));
        let ints = SequenceSet::from_instant(Instant::new(1, t(0)));
        assert!(ints.step_to_linear().is_err());
    }

    #[test]
    fn test_int_float_casts() {
        let set = single(step(&[(1.7, 0), (1.2, 10), (-2.5, 20)], true, true));
        let ints = set.float_to_int().unwrap();
        assert_eq!(ints.kind(), ValueKind::Int);
        assert_eq!(ints.value_at_timestamp(t(15)).unwrap(), Some(Value::Int(1)));
        assert_eq!(ints.end_instant().unwrap(), Instant::new(-2, t(20)));
        let back = ints.int_to_float().unwrap();
        assert_eq!(back.kind(), ValueKind::Float);
        assert!(!back.is_linear());
        assert!(ints.float_to_int().is_err());
    }
}
