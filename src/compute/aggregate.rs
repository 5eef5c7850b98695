//! Accessors and aggregates over a whole sequence set.

use crate::error::{Result, SeqSetError};
use crate::seqset::SequenceSet;
use crate::temporal::{Instant, Sequence};
use seqset_types::{BBox, NumRange, Period, PeriodSet, TimestampSet, TimestampTz, Value, ValueKind};

fn bbox_value(kind: ValueKind, x: f64) -> Value {
    match kind {
        ValueKind::Int => Value::Int(x as i32),
        _ => Value::Float(x),
    }
}

impl SequenceSet {
    /// Every instant in time order, dropping the duplicate stored at the
    /// shared bound of two touching sequences when both copies agree.
    pub fn instants(&self) -> Result<Vec<Instant>> {
        let mut out: Vec<Instant> = Vec::with_capacity(self.total_count());
        for i in 0..self.count() {
            for inst in self.seq(i)?.instants() {
                if out.last() != Some(inst) {
                    out.push(inst.clone());
                }
            }
        }
        Ok(out)
    }

    pub fn num_instants(&self) -> Result<usize> {
        Ok(self.instants()?.len())
    }

    /// Instant `n` of [`SequenceSet::instants`], counting from 1.
    pub fn instant_n(&self, n: usize) -> Result<Option<Instant>> {
        if n == 0 {
            return Ok(None);
        }
        Ok(self.instants()?.into_iter().nth(n - 1))
    }

    pub fn start_instant(&self) -> Result<Instant> {
        Ok(self.seq(0)?.start_instant().clone())
    }

    pub fn end_instant(&self) -> Result<Instant> {
        Ok(self.seq(self.count() - 1)?.end_instant().clone())
    }

    /// Distinct timestamps of all instants, in order.
    pub fn timestamps(&self) -> Result<Vec<TimestampTz>> {
        let mut out: Vec<TimestampTz> = Vec::with_capacity(self.total_count());
        for i in 0..self.count() {
            for inst in self.seq(i)?.instants() {
                if out.last() != Some(&inst.t()) {
                    out.push(inst.t());
                }
            }
        }
        Ok(out)
    }

    pub fn num_timestamps(&self) -> Result<usize> {
        Ok(self.timestamps()?.len())
    }

    /// Timestamp `n` of [`SequenceSet::timestamps`], counting from 1.
    pub fn timestamp_n(&self, n: usize) -> Result<Option<TimestampTz>> {
        if n == 0 {
            return Ok(None);
        }
        Ok(self.timestamps()?.get(n - 1).copied())
    }

    /// The periods the set is defined on.
    pub fn time(&self) -> Result<PeriodSet> {
        let periods = (0..self.count())
            .map(|i| self.seq_period(i))
            .collect::<Result<Vec<Period>>>()?;
        Ok(PeriodSet::new(periods)?)
    }

    /// Total duration of the sequences in microseconds, gaps excluded.
    pub fn timespan(&self) -> Result<i64> {
        let mut total = 0i64;
        for i in 0..self.count() {
            total = total.saturating_add(self.seq_period(i)?.duration_micros());
        }
        Ok(total)
    }

    /// Distinct values taken at the instants, sorted.
    pub fn values(&self) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::with_capacity(self.total_count());
        for i in 0..self.count() {
            values.extend(self.seq(i)?.instants().iter().map(|inst| inst.value().clone()));
        }
        values.sort();
        values.dedup();
        Ok(values)
    }

    /// The value ranges covered by a float set, normalized.
    ///
    /// A linear sequence covers the span between its extremes; an extreme
    /// reached only at an excluded bound is excluded from the range.
    pub fn float_ranges(&self) -> Result<Vec<NumRange>> {
        if self.kind() != ValueKind::Float {
            return Err(SeqSetError::unsupported("float_ranges", self.kind()));
        }
        let mut ranges = Vec::new();
        for i in 0..self.count() {
            let seq = self.seq(i)?;
            if seq.is_linear() {
                ranges.push(linear_range(&seq)?);
            } else {
                for inst in seq.instants() {
                    if let Some(x) = inst.value().as_f64() {
                        ranges.push(NumRange::singleton(x));
                    }
                }
            }
        }
        Ok(NumRange::normalize(ranges))
    }

    fn extreme_value(&self, op: &'static str, want_max: bool) -> Result<Value> {
        let kind = self.kind();
        if kind.is_spatial() || kind == ValueKind::Double2 {
            return Err(SeqSetError::unsupported(op, kind));
        }
        if let Some(BBox::TBox(b)) = self.bbox()? {
            return Ok(bbox_value(kind, if want_max { b.xmax } else { b.xmin }));
        }
        let mut best: Option<Value> = None;
        for i in 0..self.count() {
            let seq = self.seq(i)?;
            let v = if want_max {
                seq.max_value()
            } else {
                seq.min_value()
            };
            let better = match &best {
                None => true,
                Some(b) if want_max => v > b,
                Some(b) => v < b,
            };
            if better {
                best = Some(v.clone());
            }
        }
        best.ok_or(SeqSetError::EmptyInput("sequence set"))
    }

    /// Smallest value; read from the box for numeric sets.
    pub fn min_value(&self) -> Result<Value> {
        self.extreme_value("min_value", false)
    }

    pub fn max_value(&self) -> Result<Value> {
        self.extreme_value("max_value", true)
    }

    /// First instant taking the minimum value.
    pub fn min_instant(&self) -> Result<Instant> {
        let min = self.min_value()?;
        self.find_instant(|v| v == &min, "min_instant")
    }

    /// First instant taking the maximum value.
    pub fn max_instant(&self) -> Result<Instant> {
        let max = self.max_value()?;
        self.find_instant(|v| v == &max, "max_instant")
    }

    fn find_instant(&self, pred: impl Fn(&Value) -> bool, op: &'static str) -> Result<Instant> {
        for i in 0..self.count() {
            if let Some(inst) = self.seq(i)?.instants().iter().find(|inst| pred(inst.value())) {
                return Ok(inst.clone());
            }
        }
        Err(SeqSetError::InvalidInput(format!(
            "{}: no instant holds the extreme value",
            op
        )))
    }

    /// Integral of a numeric set over time, in value × microseconds.
    pub fn integral(&self) -> Result<f64> {
        let mut sum = 0.0;
        for i in 0..self.count() {
            sum += self.seq(i)?.integral()?;
        }
        Ok(sum)
    }

    /// Time-weighted average of a numeric set.
    ///
    /// A set made only of instantaneous sequences has no duration; its
    /// average is the plain mean of the per-sequence averages.
    pub fn twavg(&self) -> Result<f64> {
        let duration = self.timespan()?;
        if duration == 0 {
            let mut sum = 0.0;
            for i in 0..self.count() {
                sum += self.seq(i)?.twavg()?;
            }
            return Ok(sum / self.count() as f64);
        }
        Ok(self.integral()? / duration as f64)
    }

    // ----- ever / always -----

    fn any_instant(&self, pred: impl Fn(&Value) -> bool) -> Result<bool> {
        for i in 0..self.count() {
            if self.seq(i)?.instants().iter().any(|inst| pred(inst.value())) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn require_ordered(&self, op: &'static str, value: &Value) -> Result<()> {
        if value.kind() != self.kind() {
            return Err(SeqSetError::KindMismatch {
                expected: self.kind(),
                found: value.kind(),
            });
        }
        if self.kind().is_spatial() {
            return Err(SeqSetError::unsupported(op, self.kind()));
        }
        Ok(())
    }

    /// Whether the set takes `value` at some instant of its time.
    pub fn ever_eq(&self, value: &Value) -> Result<bool> {
        if value.kind() != self.kind() || !self.may_contain(value)? {
            return Ok(false);
        }
        for i in 0..self.count() {
            if !self.seq(i)?.at_value(value).is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether the set is `value` over all of its time.
    pub fn always_eq(&self, value: &Value) -> Result<bool> {
        if value.kind() != self.kind() || !self.may_contain(value)? {
            return Ok(false);
        }
        if let (Some(BBox::TBox(b)), Some(x)) = (self.bbox()?, value.as_f64()) {
            return Ok(b.xmin == x && b.xmax == x);
        }
        Ok(!self.any_instant(|v| v != value)?)
    }

    pub fn ever_lt(&self, value: &Value) -> Result<bool> {
        self.require_ordered("ever_lt", value)?;
        if let (Some(BBox::TBox(b)), Some(x)) = (self.bbox()?, value.as_f64())
            && b.xmin >= x
        {
            return Ok(false);
        }
        self.any_instant(|v| v < value)
    }

    pub fn ever_le(&self, value: &Value) -> Result<bool> {
        Ok(self.ever_lt(value)? || self.ever_eq(value)?)
    }

    pub fn always_lt(&self, value: &Value) -> Result<bool> {
        self.require_ordered("always_lt", value)?;
        if let (Some(BBox::TBox(b)), Some(x)) = (self.bbox()?, value.as_f64())
            && b.xmax < x
        {
            return Ok(true);
        }
        Ok(!(self.any_instant(|v| v > value)? || self.ever_eq(value)?))
    }

    pub fn always_le(&self, value: &Value) -> Result<bool> {
        self.require_ordered("always_le", value)?;
        if let (Some(BBox::TBox(b)), Some(x)) = (self.bbox()?, value.as_f64())
            && b.xmax <= x
        {
            return Ok(true);
        }
        Ok(!self.any_instant(|v| v > value)?)
    }

    // ----- time predicates -----

    pub fn intersects_timestamp(&self, t: TimestampTz) -> Result<bool> {
        if !self.period().contains_timestamp(t) {
            return Ok(false);
        }
        Ok(self.locate(t)?.is_ok())
    }

    pub fn intersects_timestampset(&self, ts: &TimestampSet) -> Result<bool> {
        if !self.period().overlaps(&ts.bbox()) {
            return Ok(false);
        }
        for &t in ts.times() {
            if self.intersects_timestamp(t)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn intersects_period(&self, period: &Period) -> Result<bool> {
        if !self.period().overlaps(period) {
            return Ok(false);
        }
        let candidates = match self.locate(period.lower())? {
            Ok(_) if period.lower_inc() => return Ok(true),
            // an exclusive lower bound may sit on the inclusive end of sequence i
            Ok(i) => i..i + 2,
            Err(i) => i..i + 1,
        };
        for i in candidates {
            if i >= self.count() {
                break;
            }
            if self.seq_period(i)?.overlaps(period) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn intersects_periodset(&self, ps: &PeriodSet) -> Result<bool> {
        if !self.period().overlaps(&ps.bbox()) {
            return Ok(false);
        }
        for p in ps.periods() {
            if self.intersects_period(p)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn linear_range(seq: &Sequence) -> Result<NumRange> {
    let instants = seq.instants();
    let n = instants.len();
    let period = seq.period();
    let included = |k: usize| (k > 0 || period.lower_inc()) && (k + 1 < n || period.upper_inc());
    let (min, max) = (seq.min_value(), seq.max_value());
    let (lo, hi) = match (min.as_f64(), max.as_f64()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Err(SeqSetError::unsupported("float_ranges", seq.kind())),
    };
    let attained = |target: &Value| {
        instants
            .iter()
            .enumerate()
            .any(|(k, inst)| inst.value() == target && included(k))
    };
    if lo == hi {
        return Ok(NumRange::singleton(lo));
    }
    Ok(NumRange::new(lo, hi, attained(min), attained(max))?)
}
