//! Equality, total order and hashing of sequence sets.
//!
//! The arena of every set is validated when it is built or loaded, so the
//! decoding inside the trait impls cannot fail in practice; if it ever did,
//! the sets compare unequal.

use crate::error::Result;
use crate::seqset::SequenceSet;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

impl SequenceSet {
    /// Structural equality: same kind, flags, box and sequences.
    pub fn equal(&self, other: &SequenceSet) -> Result<bool> {
        if self.kind() != other.kind()
            || self.count() != other.count()
            || self.flags() != other.flags()
        {
            return Ok(false);
        }
        if self.bbox()? != other.bbox()? {
            return Ok(false);
        }
        for i in 0..self.count() {
            if self.seq(i)? != other.seq(i)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Total order: kind, then the inclusivity of the first lower bound
    /// (inclusive first), then of the last upper bound (exclusive first),
    /// then sequence by sequence, then count.
    pub fn compare(&self, other: &SequenceSet) -> Result<Ordering> {
        let by_kind = self.kind().cmp(&other.kind());
        if by_kind != Ordering::Equal {
            return Ok(by_kind);
        }
        let (a, b) = (self.period(), other.period());
        if a.lower_inc() != b.lower_inc() {
            return Ok(if a.lower_inc() {
                Ordering::Less
            } else {
                Ordering::Greater
            });
        }
        if a.upper_inc() != b.upper_inc() {
            return Ok(if a.upper_inc() {
                Ordering::Greater
            } else {
                Ordering::Less
            });
        }
        for i in 0..self.count().min(other.count()) {
            let ord = self.seq(i)?.cmp(&other.seq(i)?);
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(self.count().cmp(&other.count()))
    }

    /// Order-sensitive fold of the sequence hashes.
    pub fn hash32(&self) -> u32 {
        (0..self.count()).fold(1u32, |h, i| {
            let seq_hash = self.seq(i).map_or(0, |seq| seq.hash32());
            (h << 5).wrapping_sub(h).wrapping_add(seq_hash)
        })
    }
}

impl PartialEq for SequenceSet {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other).unwrap_or(false)
    }
}

impl Eq for SequenceSet {}

impl PartialOrd for SequenceSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SequenceSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
            .unwrap_or_else(|_| self.as_bytes().cmp(other.as_bytes()))
    }
}

impl Hash for SequenceSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash32());
    }
}

#[cfg(test)]
mod tests {
    use crate::seqset::SequenceSet;
    use crate::temporal::{Instant, Interpolation, Sequence};
    use seqset_types::TimestampTz;
    use std::cmp::Ordering;

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    fn seq(values: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> Sequence {
        let instants = values.iter().map(|&(v, us)| Instant::new(v, t(us))).collect();
        Sequence::new(instants, lower_inc, upper_inc, Interpolation::Linear, true)
            .expect("valid sequence")
    }

    fn set(seqs: Vec<Sequence>) -> SequenceSet {
        SequenceSet::new(seqs, true).expect("valid set")
    }

    #[test]
    fn test_equal_sets() {
        let a = set(vec![seq(&[(1.0, 0), (2.0, 10)], true, true)]);
        let b = set(vec![seq(&[(1.0, 0), (2.0, 10)], true, true)]);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
        assert_eq!(a.hash32(), b.hash32());
    }

    #[test]
    fn test_inclusive_lower_bound_sorts_first() {
        let inc = set(vec![seq(&[(5.0, 0), (6.0, 10)], true, true)]);
        let exc = set(vec![seq(&[(1.0, 0), (2.0, 10)], false, true)]);
        assert!(inc < exc);
    }

    #[test]
    fn test_exclusive_upper_bound_sorts_first() {
        let exc = set(vec![seq(&[(5.0, 0), (6.0, 10)], true, false)]);
        let inc = set(vec![seq(&[(1.0, 0), (2.0, 10)], true, true)]);
        assert!(exc < inc);
    }

    #[test]
    fn test_count_breaks_ties() {
        let one = set(vec![seq(&[(1.0, 0), (2.0, 10)], true, true)]);
        let two = set(vec![
            seq(&[(1.0, 0), (2.0, 10)], true, true),
            seq(&[(1.0, 20), (2.0, 30)], true, true),
        ]);
        assert!(one < two);
        assert_ne!(one, two);
        assert_ne!(one.hash32(), two.hash32());
    }

    #[test]
    fn test_hash_of_single_sequence() {
        let s = seq(&[(1.0, 0), (2.0, 10)], true, true);
        let h = set(vec![s.clone()]).hash32();
        assert_eq!(h, 31u32.wrapping_add(s.hash32()));
    }
}
