//! Constructors: validated builds, internal assembly of operator results,
//! and incremental appends.

use super::{SequenceSet, SetFlags};
use crate::compute::normalize::normalize_sequences;
use crate::config::Config;
use crate::error::{Result, SeqSetError};
use crate::storage::codec;
use crate::storage::layout::{self, Header};
use crate::temporal::instant::check_compatible;
use crate::temporal::{Instant, InstantSet, Interpolation, Sequence};
use bytes::{Bytes, BytesMut};
use seqset_types::{BBox, PeriodSet, Value};

/// One sequence of an operator result, optionally with its packed bytes
/// from a source arena so it can be copied without re-encoding.
pub(crate) struct Part {
    seq: Sequence,
    packed: Option<Bytes>,
}

impl Part {
    pub fn fresh(seq: Sequence) -> Self {
        Self { seq, packed: None }
    }

    pub fn reused(seq: Sequence, packed: Bytes) -> Self {
        Self {
            seq,
            packed: Some(packed),
        }
    }
}

impl From<Sequence> for Part {
    fn from(seq: Sequence) -> Self {
        Part::fresh(seq)
    }
}

/// Give instantaneous sequences the interpolation of the longer sequences
/// they are grouped with.
pub(crate) fn align_interpolation(sequences: Vec<Sequence>) -> Vec<Sequence> {
    let Some(interp) = sequences
        .iter()
        .find(|s| s.count() > 1)
        .map(Sequence::interpolation)
    else {
        return sequences;
    };
    sequences
        .into_iter()
        .map(|s| s.with_interpolation(interp))
        .collect()
}

/// Check the cross-sequence invariants of a candidate set.
pub(crate) fn check_sequences(sequences: &[Sequence]) -> Result<()> {
    let Some(first) = sequences.first() else {
        return Err(SeqSetError::EmptyInput("sequence set"));
    };
    for seq in &sequences[1..] {
        if seq.kind() != first.kind() {
            return Err(SeqSetError::KindMismatch {
                expected: first.kind(),
                found: seq.kind(),
            });
        }
        if seq.interpolation() != first.interpolation() {
            return Err(SeqSetError::MixedInterpolation);
        }
        check_compatible(first.start_instant().value(), seq.start_instant().value())?;
    }
    for pair in sequences.windows(2) {
        if !follows(&pair[0], &pair[1]) {
            return Err(SeqSetError::BrokenOrdering {
                prev: pair[0].period().upper(),
                next: pair[1].period().lower(),
            });
        }
    }
    Ok(())
}

/// Whether `next` starts after `prev` ends, allowing a shared instant only
/// when at most one side includes it.
pub(crate) fn follows(prev: &Sequence, next: &Sequence) -> bool {
    let (p, n) = (prev.period(), next.period());
    p.upper() < n.lower() || (p.upper() == n.lower() && !(p.upper_inc() && n.lower_inc()))
}

/// Union of the per-sequence boxes.
pub(crate) fn union_bbox(sequences: &[Sequence]) -> Option<BBox> {
    let mut boxes = sequences.iter().filter_map(Sequence::bbox);
    let mut acc = boxes.next()?;
    for b in boxes {
        acc.expand(&b);
    }
    Some(acc)
}

fn encode(seq: &Sequence) -> Bytes {
    let mut buf = BytesMut::with_capacity(codec::packed_len(seq));
    codec::put_packed(&mut buf, seq);
    buf.freeze()
}

impl SequenceSet {
    /// Build a set from sequences, checking every invariant.
    ///
    /// With `normalize`, touching sequences whose shared instant agrees are
    /// joined, and redundant instants are dropped.
    pub fn new(sequences: Vec<Sequence>, normalize: bool) -> Result<Self> {
        Self::build(sequences, normalize, Config::default().alignment)
    }

    pub(crate) fn build(sequences: Vec<Sequence>, normalize: bool, align: usize) -> Result<Self> {
        let sequences = align_interpolation(sequences);
        check_sequences(&sequences)?;
        let sequences = if normalize {
            normalize_sequences(sequences)
        } else {
            sequences
        };
        log::debug!(
            "building sequence set from {} sequences (normalize={})",
            sequences.len(),
            normalize
        );
        Ok(Self::pack(
            sequences.into_iter().map(Part::fresh).collect(),
            align,
        ))
    }

    /// Pack operator output into a new set; `None` when `parts` is empty.
    ///
    /// The parts must already satisfy the set invariants.
    pub(crate) fn from_parts(parts: Vec<Part>, align: usize) -> Option<Self> {
        if parts.is_empty() {
            return None;
        }
        Some(Self::pack(parts, align))
    }

    /// Pack a non-empty list of parts.
    fn pack(parts: Vec<Part>, align: usize) -> Self {
        let first = &parts[0];
        let kind = first.seq.kind();
        let flags = SetFlags::for_values(
            first.seq.interpolation(),
            first.seq.start_instant().value(),
        );
        let period = first.seq.period().span(parts[parts.len() - 1].seq.period());

        let mut bbox: Option<BBox> = None;
        let mut totalcount = 0;
        let mut packed = Vec::with_capacity(parts.len());
        for part in parts {
            totalcount += part.seq.count();
            if let Some(b) = part.seq.bbox() {
                match bbox.as_mut() {
                    Some(acc) => acc.expand(&b),
                    None => bbox = Some(b),
                }
            }
            packed.push(part.packed.unwrap_or_else(|| encode(&part.seq)));
        }

        let header = Header {
            count: packed.len(),
            totalcount,
            kind,
            flags: flags.bits(),
            align,
        };
        log::trace!(
            "packed {} sequences ({} instants) of kind {}",
            header.count,
            totalcount,
            kind
        );
        let buf = layout::assemble(&header, &packed, bbox.as_ref());
        Self {
            header,
            period,
            buf,
        }
    }

    /// Like [`SequenceSet::from_parts`] but for plain sequences.
    pub(crate) fn from_sequences(sequences: Vec<Sequence>, align: usize) -> Option<Self> {
        Self::from_parts(sequences.into_iter().map(Part::fresh).collect(), align)
    }

    pub fn from_sequence(seq: Sequence) -> Self {
        Self::pack(vec![Part::fresh(seq)], Config::default().alignment)
    }

    /// A set holding one instantaneous sequence.
    pub fn from_instant(instant: Instant) -> Self {
        Self::from_sequence(Sequence::from_instant(instant))
    }

    /// One instantaneous sequence per instant of `set`.
    pub fn from_instant_set(set: &InstantSet) -> Self {
        let parts = set
            .instants()
            .iter()
            .cloned()
            .map(|inst| Part::fresh(Sequence::from_instant(inst)))
            .collect();
        Self::pack(parts, Config::default().alignment)
    }

    /// A constant `value` over every period of `periods`.
    pub fn from_base(value: Value, periods: &PeriodSet, interp: Interpolation) -> Self {
        Self::from_base_aligned(value, periods, interp, Config::default().alignment)
    }

    pub(crate) fn from_base_aligned(
        value: Value,
        periods: &PeriodSet,
        interp: Interpolation,
        align: usize,
    ) -> Self {
        let parts = periods
            .periods()
            .iter()
            .map(|p| Part::fresh(Sequence::constant(value.clone(), p, interp)))
            .collect();
        Self::pack(parts, align)
    }

    /// Extend the last sequence with `instant`.
    ///
    /// Every earlier sequence is copied byte for byte; only the last one is
    /// re-encoded, and the box grows by the new instant.
    pub fn append_instant(&self, instant: Instant) -> Result<Self> {
        if instant.kind() != self.kind() {
            return Err(SeqSetError::KindMismatch {
                expected: self.kind(),
                found: instant.kind(),
            });
        }
        let last_index = self.count() - 1;
        let last = self.seq(last_index)?;
        check_compatible(last.end_instant().value(), instant.value())?;
        let extended = last.append_instant(instant.clone())?;

        let mut packed = Vec::with_capacity(self.count());
        for i in 0..last_index {
            packed.push(self.packed(i)?);
        }
        packed.push(encode(&extended));

        let mut bbox = self.bbox()?;
        if let (Some(acc), Some(b)) = (bbox.as_mut(), BBox::of_instant(instant.value(), instant.t()))
        {
            acc.expand(&b);
        }
        let header = Header {
            totalcount: self.total_count() - last.count() + extended.count(),
            ..self.header
        };
        let period = self.period.span(extended.period());
        log::trace!("appended instant at {} to sequence set", instant.t());
        Ok(Self {
            header,
            period,
            buf: layout::assemble(&header, &packed, bbox.as_ref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqset_types::{Period, TimestampTz};

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    fn linear(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool) -> Sequence {
        let instants = points.iter().map(|&(v, us)| Instant::new(v, t(us))).collect();
        Sequence::new(instants, lower_inc, upper_inc, Interpolation::Linear, true)
            .expect("valid sequence")
    }

    #[test]
    fn test_build_validates_in_order() {
        assert!(matches!(
            SequenceSet::new(vec![], true),
            Err(SeqSetError::EmptyInput(_))
        ));

        let ints = Sequence::from_instant(Instant::new(1, t(10)));
        let floats = linear(&[(1.0, 0), (2.0, 5)], true, true);
        assert!(matches!(
            SequenceSet::new(vec![floats.clone(), ints], true),
            Err(SeqSetError::KindMismatch { .. })
        ));

        let stepwise = Sequence::new(
            vec![Instant::new(1.0, t(10)), Instant::new(2.0, t(20))],
            true,
            true,
            Interpolation::Stepwise,
            true,
        )
        .expect("valid sequence");
        assert!(matches!(
            SequenceSet::new(vec![floats.clone(), stepwise], true),
            Err(SeqSetError::MixedInterpolation)
        ));

        let overlapping = linear(&[(3.0, 5), (4.0, 8)], true, true);
        assert!(matches!(
            SequenceSet::new(vec![floats, overlapping], true),
            Err(SeqSetError::BrokenOrdering { .. })
        ));
    }

    #[test]
    fn test_touching_sequences_need_one_exclusive_bound() {
        let a = linear(&[(1.0, 0), (2.0, 10)], true, false);
        let b = linear(&[(5.0, 10), (6.0, 20)], true, true);
        let set = SequenceSet::new(vec![a, b], true).expect("touching sequences");
        assert_eq!(set.count(), 2);
        assert_eq!(set.total_count(), 4);
        assert_eq!(
            set.period(),
            Period::new(t(0), t(20), true, true).expect("period")
        );
    }

    #[test]
    fn test_normalize_joins_agreeing_sequences() {
        let a = linear(&[(1.0, 0), (2.0, 10)], true, false);
        let b = linear(&[(2.0, 10), (3.0, 20)], true, true);
        let joined = SequenceSet::new(vec![a.clone(), b.clone()], true).expect("set");
        assert_eq!(joined.count(), 1);
        assert_eq!(joined.total_count(), 2);

        let raw = SequenceSet::new(vec![a, b], false).expect("set");
        assert_eq!(raw.count(), 2);
    }

    #[test]
    fn test_append_instant_extends_last_sequence() {
        let a = linear(&[(1.0, 0), (2.0, 10)], true, true);
        let b = linear(&[(5.0, 20), (6.0, 30)], true, true);
        let set = SequenceSet::new(vec![a, b], true).expect("set");
        let appended = set
            .append_instant(Instant::new(10.0, t(40)))
            .expect("append");
        assert_eq!(appended.count(), 2);
        assert_eq!(appended.total_count(), 5);
        assert_eq!(appended.end_timestamp(), t(40));
        assert_eq!(appended.packed(0).unwrap(), set.packed(0).unwrap());
        let bbox = appended.bbox().unwrap().unwrap();
        assert_eq!(bbox.as_tbox().unwrap().xmax, 10.0);

        assert!(matches!(
            set.append_instant(Instant::new(1.0, t(25))),
            Err(SeqSetError::BrokenOrdering { .. })
        ));
        assert!(matches!(
            set.append_instant(Instant::new(1, t(50))),
            Err(SeqSetError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_instantaneous_sequence_takes_set_interpolation() {
        let single = Sequence::from_instant(Instant::new(3.0, t(20)));
        assert!(single.interpolation().is_linear());

        let set = SequenceSet::new(
            vec![linear(&[(1.0, 0), (2.0, 10)], true, true), single.clone()],
            true,
        )
        .unwrap();
        assert!(set.is_linear());
        assert_eq!(set.count(), 2);

        let stepwise = Sequence::new(
            vec![Instant::new(1.0, t(0)), Instant::new(2.0, t(10))],
            true,
            true,
            Interpolation::Stepwise,
            true,
        )
        .expect("valid sequence");
        let set = SequenceSet::new(vec![stepwise, single], true).unwrap();
        assert!(!set.is_linear());
        assert!(
            set.sequences()
                .unwrap()
                .iter()
                .all(|s| !s.interpolation().is_linear())
        );
        let back = SequenceSet::from_layout_bytes(set.as_bytes().clone()).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_from_instant_set_keeps_each_instant_apart() {
        let set = InstantSet::new(vec![
            Instant::new(1, t(0)),
            Instant::new(1, t(10)),
            Instant::new(2, t(20)),
        ])
        .expect("instant set");
        let seqset = SequenceSet::from_instant_set(&set);
        assert_eq!(seqset.count(), 3);
        assert!(seqset.sequences().unwrap().iter().all(|s| s.count() == 1));
    }

    #[test]
    fn test_from_base_has_one_sequence_per_period() {
        let ps = PeriodSet::new(vec![
            Period::new(t(0), t(1_000_000), true, false).unwrap(),
            Period::new(t(2_000_000), t(3_000_000), true, true).unwrap(),
        ])
        .unwrap();
        let set = SequenceSet::from_base(Value::Bool(true), &ps, Interpolation::Linear);
        assert_eq!(set.count(), 2);
        assert!(!set.is_linear());
        assert_eq!(
            set.to_string(),
            "{[t@1970-01-01 00:00:00+00, t@1970-01-01 00:00:01+00), \
             [t@1970-01-01 00:00:02+00, t@1970-01-01 00:00:03+00]}"
        );
    }

    #[test]
    fn test_follows() {
        let a = linear(&[(1.0, 0), (2.0, 10)], true, true);
        let b = linear(&[(1.0, 10), (2.0, 20)], false, true);
        let c = linear(&[(1.0, 10), (2.0, 20)], true, true);
        assert!(follows(&a, &b));
        assert!(!follows(&a, &c));
    }
}
