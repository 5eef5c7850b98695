//! Restriction of sequence sets by value and by time.
//!
//! Each `at_*` operator keeps the parts of a set where a condition holds and
//! each `minus_*` operator keeps the rest. An empty result is `Ok(None)`.

use super::SeqCursor;
use super::normalize::normalize_sequences;
use crate::error::{Result, SeqSetError};
use crate::seqset::{Part, SequenceSet};
use crate::temporal::{Fragments, Instant, InstantSet, Sequence};
use seqset_types::{
    BBox, NumRange, Period, PeriodSet, TimestampSet, TimestampTz, Value, cmp_upper_bounds,
};
use std::cmp::Ordering;

impl SequenceSet {
    fn check_kind(&self, value: &Value) -> Result<()> {
        if value.kind() != self.kind() {
            return Err(SeqSetError::KindMismatch {
                expected: self.kind(),
                found: value.kind(),
            });
        }
        Ok(())
    }

    fn require_numeric(&self, op: &'static str) -> Result<()> {
        if !self.kind().is_numeric() {
            return Err(SeqSetError::unsupported(op, self.kind()));
        }
        Ok(())
    }

    /// Apply a per-sequence value restriction and rebuild with
    /// normalization, since fragments cut from neighbouring sequences may
    /// now join.
    fn restrict_values(
        &self,
        mut f: impl FnMut(&Sequence) -> Fragments,
    ) -> Result<Option<SequenceSet>> {
        let mut fragments = Vec::with_capacity(self.count());
        for i in 0..self.count() {
            fragments.extend(f(&self.seq(i)?));
        }
        Ok(SequenceSet::from_sequences(
            normalize_sequences(fragments),
            self.alignment(),
        ))
    }

    fn range_box_miss(&self, range: &NumRange) -> Result<bool> {
        Ok(match self.bbox()? {
            Some(BBox::TBox(b)) => !b.overlaps_range(range),
            _ => false,
        })
    }

    // ----- values -----

    /// The parts of the set where the value equals `value`.
    pub fn at_value(&self, value: &Value) -> Result<Option<SequenceSet>> {
        self.check_kind(value)?;
        if !self.may_contain(value)? {
            log::trace!("value {} outside bounding box", value);
            return Ok(None);
        }
        self.restrict_values(|seq| seq.at_value(value))
    }

    pub fn minus_value(&self, value: &Value) -> Result<Option<SequenceSet>> {
        self.check_kind(value)?;
        if !self.may_contain(value)? {
            log::trace!("value {} outside bounding box", value);
            return Ok(Some(self.clone()));
        }
        self.restrict_values(|seq| seq.minus_value(value))
    }

    fn candidate_values(&self, values: &[Value]) -> Result<Vec<Value>> {
        let mut kept = Vec::with_capacity(values.len());
        for v in values {
            self.check_kind(v)?;
            if self.may_contain(v)? {
                kept.push(v.clone());
            }
        }
        kept.sort();
        kept.dedup();
        Ok(kept)
    }

    pub fn at_values(&self, values: &[Value]) -> Result<Option<SequenceSet>> {
        let values = self.candidate_values(values)?;
        if values.is_empty() {
            return Ok(None);
        }
        self.restrict_values(|seq| seq.at_values(&values))
    }

    pub fn minus_values(&self, values: &[Value]) -> Result<Option<SequenceSet>> {
        let values = self.candidate_values(values)?;
        if values.is_empty() {
            return Ok(Some(self.clone()));
        }
        self.restrict_values(|seq| seq.minus_values(&values))
    }

    /// The parts of a numeric set whose value lies in `range`.
    pub fn at_range(&self, range: &NumRange) -> Result<Option<SequenceSet>> {
        self.require_numeric("at_range")?;
        if self.range_box_miss(range)? {
            log::trace!("range {} outside bounding box", range);
            return Ok(None);
        }
        self.restrict_values(|seq| seq.at_range(range))
    }

    pub fn minus_range(&self, range: &NumRange) -> Result<Option<SequenceSet>> {
        self.require_numeric("minus_range")?;
        if self.range_box_miss(range)? {
            return Ok(Some(self.clone()));
        }
        self.restrict_values(|seq| seq.minus_range(range))
    }

    fn candidate_ranges(&self, ranges: &[NumRange]) -> Result<Vec<NumRange>> {
        let mut kept = Vec::with_capacity(ranges.len());
        for r in ranges {
            if !self.range_box_miss(r)? {
                kept.push(*r);
            }
        }
        Ok(NumRange::normalize(kept))
    }

    pub fn at_ranges(&self, ranges: &[NumRange]) -> Result<Option<SequenceSet>> {
        self.require_numeric("at_ranges")?;
        let ranges = self.candidate_ranges(ranges)?;
        if ranges.is_empty() {
            return Ok(None);
        }
        self.restrict_values(|seq| seq.at_ranges(&ranges))
    }

    pub fn minus_ranges(&self, ranges: &[NumRange]) -> Result<Option<SequenceSet>> {
        self.require_numeric("minus_ranges")?;
        let ranges = self.candidate_ranges(ranges)?;
        if ranges.is_empty() {
            return Ok(Some(self.clone()));
        }
        self.restrict_values(|seq| seq.minus_ranges(&ranges))
    }

    /// The parts of the set where it takes its minimum value.
    pub fn at_min(&self) -> Result<Option<SequenceSet>> {
        self.at_value(&self.min_value()?)
    }

    pub fn at_max(&self) -> Result<Option<SequenceSet>> {
        self.at_value(&self.max_value()?)
    }

    pub fn minus_min(&self) -> Result<Option<SequenceSet>> {
        self.minus_value(&self.min_value()?)
    }

    pub fn minus_max(&self) -> Result<Option<SequenceSet>> {
        self.minus_value(&self.max_value()?)
    }

    // ----- timestamps -----

    pub fn value_at_timestamp(&self, t: TimestampTz) -> Result<Option<Value>> {
        Ok(self.at_timestamp(t)?.map(Instant::into_value))
    }

    /// The instant of the set at `t`, if the set is defined there.
    pub fn at_timestamp(&self, t: TimestampTz) -> Result<Option<Instant>> {
        if !self.period().contains_timestamp(t) {
            return Ok(None);
        }
        match self.locate(t)? {
            Ok(i) => Ok(self.seq(i)?.at_timestamp(t)),
            Err(_) => Ok(None),
        }
    }

    /// Remove the instant at `t`. At most one sequence is split; the others
    /// are copied unchanged.
    pub fn minus_timestamp(&self, t: TimestampTz) -> Result<Option<SequenceSet>> {
        if !self.period().contains_timestamp(t) {
            return Ok(Some(self.clone()));
        }
        let i = match self.locate(t)? {
            Ok(i) => i,
            Err(_) => return Ok(Some(self.clone())),
        };
        let mut parts = Vec::with_capacity(self.count() + 1);
        for k in 0..i {
            parts.push(Part::reused(self.seq(k)?, self.packed(k)?));
        }
        parts.extend(self.seq(i)?.minus_timestamp(t).into_iter().map(Part::fresh));
        for k in i + 1..self.count() {
            parts.push(Part::reused(self.seq(k)?, self.packed(k)?));
        }
        Ok(SequenceSet::from_parts(parts, self.alignment()))
    }

    /// The instants of the set at the timestamps of `ts`.
    pub fn at_timestampset(&self, ts: &TimestampSet) -> Result<Option<InstantSet>> {
        if !self.period().overlaps(&ts.bbox()) {
            return Ok(None);
        }
        let mut out = Vec::new();
        let mut cursor = SeqCursor::new(self)?;
        let mut i = 0;
        for &t in ts.times() {
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
            if let Some(inst) = cursor.get(i)?.at_timestamp(t) {
                out.push(inst);
            }
        }
        Ok(InstantSet::from_sorted(out))
    }

    /// Remove the instants at the timestamps of `ts`.
    ///
    /// A timestamp that no sequence contains, including one that sits on
    /// the excluded bounds of two touching sequences, removes nothing.
    pub fn minus_timestampset(&self, ts: &TimestampSet) -> Result<Option<SequenceSet>> {
        if !self.period().overlaps(&ts.bbox()) {
            return Ok(Some(self.clone()));
        }
        let times = ts.times();
        let mut j = 0;
        let mut fragments = Vec::with_capacity(self.count());
        for i in 0..self.count() {
            let seq = self.seq(i)?;
            let p = seq.period();
            while j < times.len() && times[j] < p.lower() {
                j += 1;
            }
            let start = j;
            while j < times.len() && times[j] <= p.upper() {
                j += 1;
            }
            let inside: Vec<TimestampTz> = times[start..j]
                .iter()
                .copied()
                .filter(|&t| p.contains_timestamp(t))
                .collect();
            if inside.is_empty() {
                fragments.push(seq);
            } else {
                fragments.extend(seq.minus_timestampset(&TimestampSet::new(inside)?));
            }
            // the upper bound may also be the next sequence's lower bound
            j = start.max(j.saturating_sub(1));
        }
        Ok(SequenceSet::from_sequences(
            normalize_sequences(fragments),
            self.alignment(),
        ))
    }

    // ----- periods -----

    /// The set clipped to `period`.
    ///
    /// Sequences inside the period are copied unchanged; only the ones
    /// crossing its bounds are cut.
    pub fn at_period(&self, period: &Period) -> Result<Option<SequenceSet>> {
        if !self.period().overlaps(period) {
            log::trace!("period {} outside bounding period", period);
            return Ok(None);
        }
        if period.contains_period(&self.period()) {
            return Ok(Some(self.clone()));
        }
        let start = match self.locate(period.lower())? {
            Ok(i) | Err(i) => i,
        };
        let mut parts = Vec::new();
        for i in start..self.count() {
            let sp = self.seq_period(i)?;
            if period.contains_period(&sp) {
                parts.push(Part::reused(self.seq(i)?, self.packed(i)?));
            } else if let Some(clipped) = self.seq(i)?.at_period(period) {
                parts.push(Part::fresh(clipped));
            }
            if cmp_upper_bounds(period.upper(), period.upper_inc(), sp.upper(), sp.upper_inc())
                != Ordering::Greater
            {
                break;
            }
        }
        Ok(SequenceSet::from_parts(parts, self.alignment()))
    }

    pub fn minus_period(&self, period: &Period) -> Result<Option<SequenceSet>> {
        if !self.period().overlaps(period) {
            return Ok(Some(self.clone()));
        }
        match PeriodSet::from_period(self.period()).minus_period(period) {
            Some(rest) => self.at_periodset(&rest),
            None => Ok(None),
        }
    }

    /// The set clipped to the periods of `ps`, by merge-join.
    pub fn at_periodset(&self, ps: &PeriodSet) -> Result<Option<SequenceSet>> {
        if !self.period().overlaps(&ps.bbox()) {
            log::trace!("period set outside bounding period");
            return Ok(None);
        }
        let periods = ps.periods();
        let mut i = match self.locate(ps.bbox().lower())? {
            Ok(i) | Err(i) => i,
        };
        let mut j = 0;
        let mut cursor = SeqCursor::new(self)?;
        let mut parts = Vec::new();
        while i < self.count() && j < periods.len() {
            let sp = self.seq_period(i)?;
            let p = &periods[j];
            if p.contains_period(&sp) {
                parts.push(Part::reused(cursor.get(i)?.clone(), self.packed(i)?));
            } else if sp.overlaps(p)
                && let Some(clipped) = cursor.get(i)?.at_period(p)
            {
                parts.push(Part::fresh(clipped));
            }
            match cmp_upper_bounds(sp.upper(), sp.upper_inc(), p.upper(), p.upper_inc()) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        Ok(SequenceSet::from_parts(parts, self.alignment()))
    }

    pub fn minus_periodset(&self, ps: &PeriodSet) -> Result<Option<SequenceSet>> {
        if !self.period().overlaps(&ps.bbox()) {
            return Ok(Some(self.clone()));
        }
        let periods = ps.periods();
        let mut j = 0;
        let mut parts = Vec::with_capacity(self.count());
        for i in 0..self.count() {
            let sp = self.seq_period(i)?;
            // skip periods that end before this sequence starts
            while j < periods.len() && periods[j].is_before(&sp) {
                j += 1;
            }
            let touched = periods[j..]
                .iter()
                .take_while(|p| !sp.is_before(p))
                .any(|p| p.overlaps(&sp));
            if touched {
                parts.extend(self.seq(i)?.minus_periodset(ps).into_iter().map(Part::fresh));
            } else {
                parts.push(Part::reused(self.seq(i)?, self.packed(i)?));
            }
        }
        Ok(SequenceSet::from_parts(parts, self.alignment()))
    }
}
