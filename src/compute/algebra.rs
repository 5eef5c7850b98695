//! Temporal intersection and synchronization.
//!
//! Both are merge-joins over two time-ordered collections: a cursor per
//! operand, a pairwise step handed to [`Sequence`], and a rule for which
//! cursor to advance. The operand whose current sequence ends first moves;
//! at equal end timestamps the exclusive end moves first, and equal ends
//! with equal inclusivity move both.

use super::SeqCursor;
use crate::config::Config;
use crate::error::Result;
use crate::seqset::SequenceSet;
use crate::temporal::{Instant, InstantSet, Sequence};
use seqset_types::{Period, TimestampTz, cmp_upper_bounds};
use std::cmp::Ordering;

/// Outcome of intersecting or synchronizing two temporal values.
///
/// `Disjoint` means the values never coexist in time; it is an ordinary
/// result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intersection<A, B = A> {
    Disjoint,
    /// Each operand restricted to the common time.
    Overlap(A, B),
}

impl<A, B> Intersection<A, B> {
    pub fn is_disjoint(&self) -> bool {
        matches!(self, Intersection::Disjoint)
    }

    pub fn into_option(self) -> Option<(A, B)> {
        match self {
            Intersection::Disjoint => None,
            Intersection::Overlap(a, b) => Some((a, b)),
        }
    }

    /// Exchange the two sides, for mirrored argument orders.
    pub fn swap(self) -> Intersection<B, A> {
        match self {
            Intersection::Disjoint => Intersection::Disjoint,
            Intersection::Overlap(a, b) => Intersection::Overlap(b, a),
        }
    }
}

/// Which cursors to advance after comparing two periods' upper bounds.
fn advance(a: &Period, b: &Period) -> (bool, bool) {
    match cmp_upper_bounds(a.upper(), a.upper_inc(), b.upper(), b.upper_inc()) {
        Ordering::Less => (true, false),
        Ordering::Greater => (false, true),
        Ordering::Equal => (true, true),
    }
}

/// First sequence of `set` that can reach `t`.
fn start_index(set: &SequenceSet, t: TimestampTz) -> Result<usize> {
    Ok(match set.locate(t)? {
        Ok(i) | Err(i) => i,
    })
}

fn pack_pair(
    left: Vec<Sequence>,
    right: Vec<Sequence>,
    align: usize,
) -> Intersection<SequenceSet> {
    match (
        SequenceSet::from_sequences(left, align),
        SequenceSet::from_sequences(right, align),
    ) {
        (Some(a), Some(b)) => Intersection::Overlap(a, b),
        _ => Intersection::Disjoint,
    }
}

impl SequenceSet {
    fn merge_join(
        &self,
        other: &SequenceSet,
        mut step: impl FnMut(&Sequence, &Sequence) -> Option<(Sequence, Sequence)>,
    ) -> Result<Intersection<SequenceSet>> {
        if !self.period().overlaps(&other.period()) {
            log::trace!("bounding periods are disjoint, skipping merge-join");
            return Ok(Intersection::Disjoint);
        }
        let mut i = start_index(self, other.start_timestamp())?;
        let mut j = start_index(other, self.start_timestamp())?;
        let (mut left, mut right) = (Vec::new(), Vec::new());
        let (mut ca, mut cb) = (SeqCursor::new(self)?, SeqCursor::new(other)?);
        while i < self.count() && j < other.count() {
            let a = ca.get(i)?;
            let b = cb.get(j)?;
            if let Some((x, y)) = step(a, b) {
                left.push(x);
                right.push(y);
            }
            let (next_a, next_b) = advance(a.period(), b.period());
            i += next_a as usize;
            j += next_b as usize;
        }
        Ok(pack_pair(left, right, self.alignment()))
    }

    /// Both sets restricted to the instants covered by both.
    ///
    /// The results are not normalized, so the k-th sequence of one side
    /// always spans the same period as the k-th sequence of the other.
    pub fn intersect(&self, other: &SequenceSet) -> Result<Intersection<SequenceSet>> {
        self.merge_join(other, |a, b| a.intersect(b))
    }

    /// Like [`SequenceSet::intersect`], but both sides are also resampled
    /// at the union of their timestamps (plus crossings, when requested and
    /// both are linear).
    pub fn synchronize(
        &self,
        other: &SequenceSet,
        crossings: bool,
    ) -> Result<Intersection<SequenceSet>> {
        self.merge_join(other, |a, b| a.synchronize(b, crossings))
    }

    /// [`SequenceSet::synchronize`] with crossings taken from `config`.
    pub fn synchronize_with(
        &self,
        other: &SequenceSet,
        config: &Config,
    ) -> Result<Intersection<SequenceSet>> {
        self.synchronize(other, config.crossings)
    }

    fn join_sequence(
        &self,
        seq: &Sequence,
        mut step: impl FnMut(&Sequence, &Sequence) -> Option<(Sequence, Sequence)>,
    ) -> Result<Intersection<SequenceSet>> {
        let period = seq.period();
        if !self.period().overlaps(period) {
            log::trace!("sequence lies outside the bounding period");
            return Ok(Intersection::Disjoint);
        }
        let (mut left, mut right) = (Vec::new(), Vec::new());
        for i in start_index(self, period.lower())?..self.count() {
            let s = self.seq(i)?;
            if let Some((x, y)) = step(&s, seq) {
                left.push(x);
                right.push(y);
            }
            let sp = s.period();
            if cmp_upper_bounds(period.upper(), period.upper_inc(), sp.upper(), sp.upper_inc())
                != Ordering::Greater
            {
                break;
            }
        }
        Ok(pack_pair(left, right, self.alignment()))
    }

    /// The set and one sequence, restricted to their common time.
    pub fn intersect_sequence(&self, seq: &Sequence) -> Result<Intersection<SequenceSet>> {
        self.join_sequence(seq, |a, b| a.intersect(b))
    }

    pub fn synchronize_sequence(
        &self,
        seq: &Sequence,
        crossings: bool,
    ) -> Result<Intersection<SequenceSet>> {
        self.join_sequence(seq, |a, b| a.synchronize(b, crossings))
    }

    /// The value of the set at the instant's timestamp, paired with the
    /// instant itself.
    pub fn intersect_instant(&self, inst: &Instant) -> Result<Intersection<Instant>> {
        Ok(match self.at_timestamp(inst.t())? {
            Some(mine) => Intersection::Overlap(mine, inst.clone()),
            None => Intersection::Disjoint,
        })
    }

    /// The set sampled at every timestamp of `set` it covers, paired with
    /// the matching instants of `set`.
    pub fn intersect_instant_set(
        &self,
        set: &InstantSet,
    ) -> Result<Intersection<InstantSet>> {
        if !self.period().overlaps(&set.period()) {
            log::trace!("instant set lies outside the bounding period");
            return Ok(Intersection::Disjoint);
        }
        let (mut left, mut right) = (Vec::new(), Vec::new());
        let mut cursor = SeqCursor::new(self)?;
        let mut i = start_index(self, set.start_timestamp())?;
        for inst in set.instants() {
            let t = inst.t();
            while i < self.count() {
                let p = self.seq_period(i)?;
                if p.upper() > t || (p.upper() == t && p.upper_inc()) {
                    break;
                }
                i += 1;
            }
            if i == self.count() {
                break;
            }
            if let Some(value) = cursor.get(i)?.value_at(t) {
                left.push(Instant::new(value, t));
                right.push(inst.clone());
            }
        }
        Ok(
            match (InstantSet::from_sorted(left), InstantSet::from_sorted(right)) {
                (Some(a), Some(b)) => Intersection::Overlap(a, b),
                _ => Intersection::Disjoint,
            },
        )
    }
}

impl Sequence {
    /// Mirror of [`SequenceSet::intersect_sequence`].
    pub fn intersect_set(&self, set: &SequenceSet) -> Result<Intersection<SequenceSet>> {
        set.intersect_sequence(self).map(Intersection::swap)
    }

    /// Mirror of [`SequenceSet::synchronize_sequence`].
    pub fn synchronize_set(
        &self,
        set: &SequenceSet,
        crossings: bool,
    ) -> Result<Intersection<SequenceSet>> {
        set.synchronize_sequence(self, crossings)
            .map(Intersection::swap)
    }
}

impl Instant {
    /// Mirror of [`SequenceSet::intersect_instant`].
    pub fn intersect_set(&self, set: &SequenceSet) -> Result<Intersection<Instant>> {
        set.intersect_instant(self).map(Intersection::swap)
    }
}

impl InstantSet {
    /// Mirror of [`SequenceSet::intersect_instant_set`].
    pub fn intersect_set(&self, set: &SequenceSet) -> Result<Intersection<InstantSet>> {
        set.intersect_instant_set(self).map(Intersection::swap)
    }
}
