//! Continuous sequences of instants.
//!
//! A [`Sequence`] is the building block of a sequence set: a run of
//! instants over one period, interpolated either stepwise or linearly.
//! Every value restriction is reduced to "find the periods where the
//! predicate holds, then clip to each period", so clipping (`at_period`) is
//! the one place that knows how to cut a sequence.

use super::EPSILON;
use super::instant::{Instant, check_compatible};
use crate::error::{Result, SeqSetError};
use seqset_types::{BBox, NumRange, Period, PeriodSet, TimestampSet, TimestampTz, Value, ValueKind};
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Fragments produced by restricting one sequence; usually 0 to 2.
pub type Fragments = SmallVec<[Sequence; 2]>;

/// How values evolve between two consecutive instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Interpolation {
    /// The value holds until the next instant.
    Stepwise,
    /// The value changes linearly towards the next instant.
    Linear,
}

impl Interpolation {
    pub fn is_linear(self) -> bool {
        self == Interpolation::Linear
    }
}

/// An immutable continuous run of instants over a period.
///
/// Invariants, established by every constructor:
/// - instants are strictly increasing in time and share one kind (and, for
///   points, one SRID and dimensionality);
/// - a single-instant sequence includes both bounds;
/// - linear interpolation is only used by continuous kinds;
/// - a stepwise sequence with an exclusive upper bound carries the
///   penultimate value on its last instant;
/// - when normalized, no interior instant is redundant.
#[derive(Debug, Clone)]
pub struct Sequence {
    instants: Vec<Instant>,
    period: Period,
    interp: Interpolation,
}

impl Sequence {
    /// Validate and build a sequence.
    pub fn new(
        instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Result<Self> {
        let Some(first) = instants.first() else {
            return Err(SeqSetError::EmptyInput("sequence"));
        };
        let kind = first.kind();
        if instants.len() == 1 && !(lower_inc && upper_inc) {
            return Err(SeqSetError::InvalidSequence(format!(
                "instantaneous sequence at {} must include both bounds",
                first.t()
            )));
        }
        if interp.is_linear() && !kind.is_continuous() {
            return Err(SeqSetError::unsupported("linear interpolation", kind));
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
        Ok(Self::make(instants, lower_inc, upper_inc, interp, normalize))
    }

    /// Build from instants already known to satisfy the ordering and kind
    /// invariants. At least one instant is required, and a single instant
    /// must include both bounds.
    pub(crate) fn make(
        mut instants: Vec<Instant>,
        lower_inc: bool,
        upper_inc: bool,
        interp: Interpolation,
        normalize: bool,
    ) -> Self {
        let n = instants.len();
        if n > 1 && !interp.is_linear() && !upper_inc {
            let penultimate = instants[n - 2].value().clone();
            instants[n - 1] = Instant::new(penultimate, instants[n - 1].t());
        }
        if normalize && n > 2 {
            instants = normalize_instants(instants, interp);
        }
        let period = Period::new(
            instants[0].t(),
            instants[instants.len() - 1].t(),
            lower_inc,
            upper_inc,
        )
        .unwrap_or_else(|_| Period::instant(instants[0].t()));
        Self {
            instants,
            period,
            interp,
        }
    }

    /// Reassemble a decoded sequence; the caller has checked the period.
    pub(crate) fn from_parts(instants: Vec<Instant>, period: Period, interp: Interpolation) -> Self {
        Self {
            instants,
            period,
            interp,
        }
    }

    /// A single-instant sequence; continuous kinds default to linear.
    pub fn from_instant(instant: Instant) -> Self {
        let period = Period::instant(instant.t());
        let interp = if instant.kind().is_continuous() {
            Interpolation::Linear
        } else {
            Interpolation::Stepwise
        };
        Self {
            instants: vec![instant],
            period,
            interp,
        }
    }

    /// The same single instant under `interp`. Longer sequences are
    /// returned unchanged.
    pub(crate) fn with_interpolation(mut self, interp: Interpolation) -> Self {
        if self.instants.len() == 1 && (!interp.is_linear() || self.kind().is_continuous()) {
            self.interp = interp;
        }
        self
    }

    /// A constant `value` over `period`.
    pub fn constant(value: Value, period: &Period, interp: Interpolation) -> Self {
        let interp = if value.kind().is_continuous() {
            interp
        } else {
            Interpolation::Stepwise
        };
        if period.is_instant() {
            return Self {
                instants: vec![Instant::new(value, period.lower())],
                period: *period,
                interp,
            };
        }
        Self {
            instants: vec![
                Instant::new(value.clone(), period.lower()),
                Instant::new(value, period.upper()),
            ],
            period: *period,
            interp,
        }
    }

    pub fn instants(&self) -> &[Instant] {
        &self.instants
    }

    pub fn count(&self) -> usize {
        self.instants.len()
    }

    pub fn period(&self) -> &Period {
        &self.period
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interp
    }

    pub fn is_linear(&self) -> bool {
        self.interp.is_linear()
    }

    pub fn kind(&self) -> ValueKind {
        self.instants[0].kind()
    }

    pub fn start_instant(&self) -> &Instant {
        &self.instants[0]
    }

    pub fn end_instant(&self) -> &Instant {
        &self.instants[self.instants.len() - 1]
    }

    /// Value at `t`, or `None` when `t` is outside the period.
    pub fn value_at(&self, t: TimestampTz) -> Option<Value> {
        self.period
            .contains_timestamp(t)
            .then(|| self.value_at_inclusive(t))
    }

    /// Value at `t` treating both bounds as inclusive. `t` must lie within
    /// `[lower, upper]`.
    pub(crate) fn value_at_inclusive(&self, t: TimestampTz) -> Value {
        let idx = self.instants.partition_point(|inst| inst.t() <= t);
        if idx == 0 {
            return self.instants[0].value().clone();
        }
        let i = idx - 1;
        let inst = &self.instants[i];
        if inst.t() == t || !self.is_linear() || i + 1 == self.instants.len() {
            return inst.value().clone();
        }
        let next = &self.instants[i + 1];
        let ratio = t.micros_since(inst.t()) as f64 / next.t().micros_since(inst.t()) as f64;
        inst.value()
            .interpolate(next.value(), ratio)
            .unwrap_or_else(|| inst.value().clone())
    }

    pub fn min_value(&self) -> &Value {
        self.instants
            .iter()
            .map(Instant::value)
            .min()
            .unwrap_or(self.instants[0].value())
    }

    pub fn max_value(&self) -> &Value {
        self.instants
            .iter()
            .map(Instant::value)
            .max()
            .unwrap_or(self.instants[0].value())
    }

    /// Bounding box; `None` for boxless kinds.
    pub fn bbox(&self) -> Option<BBox> {
        let kind = self.kind();
        if !kind.has_bbox() {
            return None;
        }
        if !kind.is_numeric() && !kind.is_spatial() {
            return Some(BBox::Period(self.period));
        }
        let mut iter = self.instants.iter();
        let first = iter.next()?;
        let mut bbox = BBox::of_instant(first.value(), first.t())?;
        for inst in iter {
            if let Some(other) = BBox::of_instant(inst.value(), inst.t()) {
                bbox.expand(&other);
            }
        }
        Some(bbox)
    }

    /// Order-sensitive 32-bit hash over bounds, interpolation and instants.
    pub fn hash32(&self) -> u32 {
        let bounds = u32::from(self.period.lower_inc()) | (u32::from(self.period.upper_inc()) << 1);
        let mut h: u32 = 1;
        h = h.wrapping_mul(31).wrapping_add(bounds);
        h = h.wrapping_mul(31).wrapping_add(self.interp as u32);
        for inst in &self.instants {
            h = h.wrapping_mul(31).wrapping_add(inst.hash32());
        }
        h
    }

    /// Extend the sequence with an instant after its end.
    ///
    /// An instant at the upper bound is accepted only when it repeats the
    /// value already there.
    pub fn append_instant(&self, instant: Instant) -> Result<Sequence> {
        check_compatible(self.end_instant().value(), instant.value())?;
        let upper = self.period.upper();
        if instant.t() < upper {
            return Err(SeqSetError::BrokenOrdering {
                prev: upper,
                next: instant.t(),
            });
        }
        if instant.t() == upper {
            if self.period.upper_inc() && self.end_instant().value() == instant.value() {
                return Ok(self.clone());
            }
            return Err(SeqSetError::ConflictingValues { at: upper });
        }
        let mut instants = self.instants.clone();
        instants.push(instant);
        Ok(Sequence::make(
            instants,
            self.period.lower_inc(),
            true,
            self.interp,
            true,
        ))
    }

    pub fn shift(&self, delta_micros: i64) -> Option<Sequence> {
        let instants = self
            .instants
            .iter()
            .map(|inst| inst.t().checked_add_micros(delta_micros).map(|t| inst.with_time(t)))
            .collect::<Option<Vec<_>>>()?;
        Some(Sequence {
            instants,
            period: self.period.shift(delta_micros)?,
            interp: self.interp,
        })
    }

    /// Apply `f` to every value, keeping times and bounds.
    pub(crate) fn map_values(&self, interp: Interpolation, f: impl Fn(&Value) -> Value) -> Sequence {
        let instants = self
            .instants
            .iter()
            .map(|inst| Instant::new(f(inst.value()), inst.t()))
            .collect();
        Sequence::make(
            instants,
            self.period.lower_inc(),
            self.period.upper_inc(),
            interp,
            true,
        )
    }

    /// Convert a stepwise sequence into linear pieces with the same values.
    pub fn step_to_linear(&self) -> Vec<Sequence> {
        if self.is_linear() {
            return vec![self.clone()];
        }
        let n = self.instants.len();
        if n == 1 {
            return vec![Sequence {
                interp: Interpolation::Linear,
                ..self.clone()
            }];
        }
        let mut pieces = Vec::with_capacity(n);
        for i in 0..n - 1 {
            let (a, b) = (&self.instants[i], &self.instants[i + 1]);
            let is_last = i + 2 == n;
            let upper_inc = is_last && self.period.upper_inc() && a.value() == b.value();
            pieces.push(Sequence::make(
                vec![a.clone(), Instant::new(a.value().clone(), b.t())],
                if i == 0 { self.period.lower_inc() } else { true },
                upper_inc,
                Interpolation::Linear,
                false,
            ));
        }
        let last = &self.instants[n - 1];
        if self.period.upper_inc() && self.instants[n - 2].value() != last.value() {
            pieces.push(Sequence {
                instants: vec![last.clone()],
                period: Period::instant(last.t()),
                interp: Interpolation::Linear,
            });
        }
        pieces
    }

    /// Integral of the value over time, in value × microseconds.
    pub fn integral(&self) -> Result<f64> {
        let values = self.numeric_values("integral")?;
        let mut sum = 0.0;
        for i in 0..values.len().saturating_sub(1) {
            let dt = self.instants[i + 1].t().micros_since(self.instants[i].t()) as f64;
            sum += if self.is_linear() {
                (values[i] + values[i + 1]) / 2.0 * dt
            } else {
                values[i] * dt
            };
        }
        Ok(sum)
    }

    /// Time-weighted average; the value itself for an instantaneous sequence.
    pub fn twavg(&self) -> Result<f64> {
        let duration = self.period.duration_micros();
        if duration == 0 {
            let values = self.numeric_values("twavg")?;
            return Ok(values[0]);
        }
        Ok(self.integral()? / duration as f64)
    }

    fn numeric_values(&self, op: &'static str) -> Result<Vec<f64>> {
        self.instants
            .iter()
            .map(|inst| {
                inst.value()
                    .as_f64()
                    .ok_or_else(|| SeqSetError::unsupported(op, inst.kind()))
            })
            .collect()
    }

    // ----- time restrictions -----

    /// Clip the sequence to `p`.
    pub fn at_period(&self, p: &Period) -> Option<Sequence> {
        let inter = self.period.intersection(p)?;
        if inter == self.period {
            return Some(self.clone());
        }
        if inter.is_instant() {
            return Some(Sequence {
                instants: vec![Instant::new(self.value_at_inclusive(inter.lower()), inter.lower())],
                period: inter,
                interp: self.interp,
            });
        }
        let mut instants = Vec::with_capacity(self.instants.len() + 2);
        instants.push(Instant::new(self.value_at_inclusive(inter.lower()), inter.lower()));
        instants.extend(
            self.instants
                .iter()
                .filter(|inst| inst.t() > inter.lower() && inst.t() < inter.upper())
                .cloned(),
        );
        instants.push(Instant::new(self.value_at_inclusive(inter.upper()), inter.upper()));
        Some(Sequence::make(
            instants,
            inter.lower_inc(),
            inter.upper_inc(),
            self.interp,
            true,
        ))
    }

    pub fn minus_period(&self, p: &Period) -> Fragments {
        self.period
            .minus(p)
            .iter()
            .filter_map(|piece| self.at_period(piece))
            .collect()
    }

    pub fn at_periodset(&self, ps: &PeriodSet) -> Fragments {
        ps.periods()
            .iter()
            .filter_map(|p| self.at_period(p))
            .collect()
    }

    pub fn minus_periodset(&self, ps: &PeriodSet) -> Fragments {
        match PeriodSet::from_period(self.period).minus(ps) {
            Some(rest) => self.at_periodset(&rest),
            None => SmallVec::new(),
        }
    }

    pub fn at_timestamp(&self, t: TimestampTz) -> Option<Instant> {
        self.value_at(t).map(|v| Instant::new(v, t))
    }

    /// Remove one instant; splits the sequence in two when `t` is interior.
    pub fn minus_timestamp(&self, t: TimestampTz) -> Fragments {
        if !self.period.contains_timestamp(t) {
            return smallvec![self.clone()];
        }
        self.minus_period(&Period::instant(t))
    }

    pub fn at_timestampset(&self, ts: &TimestampSet) -> Vec<Instant> {
        ts.times()
            .iter()
            .filter_map(|&t| self.at_timestamp(t))
            .collect()
    }

    pub fn minus_timestampset(&self, ts: &TimestampSet) -> Fragments {
        let cuts: Vec<Period> = ts
            .times()
            .iter()
            .filter(|&&t| self.period.contains_timestamp(t))
            .map(|&t| Period::instant(t))
            .collect();
        match PeriodSet::new(cuts) {
            Ok(cuts) => self.minus_periodset(&cuts),
            Err(_) => smallvec![self.clone()],
        }
    }

    // ----- value restrictions -----

    /// Fragments where the value equals `value`.
    pub fn at_value(&self, value: &Value) -> Fragments {
        let hits = self.hit_periods(
            |v| v == value,
            |a, b| line_at_value(a, b, value),
        );
        let mut fragments = Fragments::new();
        for period in hits.iter().flat_map(|ps| ps.periods()) {
            if period.is_instant() && self.is_linear() {
                // exact value rather than an interpolated approximation
                fragments.push(Sequence {
                    instants: vec![Instant::new(value.clone(), period.lower())],
                    period: *period,
                    interp: self.interp,
                });
            } else if let Some(seq) = self.at_period(period) {
                fragments.push(seq);
            }
        }
        fragments
    }

    pub fn minus_value(&self, value: &Value) -> Fragments {
        let hits = self.hit_periods(
            |v| v == value,
            |a, b| line_at_value(a, b, value),
        );
        self.complement_of(hits)
    }

    pub fn at_values(&self, values: &[Value]) -> Fragments {
        let mut fragments: Fragments = values.iter().flat_map(|v| self.at_value(v)).collect();
        fragments.sort_by(|a, b| a.period.cmp(&b.period));
        fragments
    }

    pub fn minus_values(&self, values: &[Value]) -> Fragments {
        let hits = self.hit_periods(
            |v| values.contains(v),
            |a, b| {
                values
                    .iter()
                    .flat_map(|v| line_at_value(a, b, v))
                    .collect()
            },
        );
        self.complement_of(hits)
    }

    pub fn at_range(&self, range: &NumRange) -> Fragments {
        let hits = self.hit_periods(
            |v| v.as_f64().is_some_and(|x| range.contains(x)),
            |a, b| line_in_range(a, b, range).into_iter().collect(),
        );
        hits.iter()
            .flat_map(|ps| ps.periods())
            .filter_map(|p| self.at_period(p))
            .collect()
    }

    pub fn minus_range(&self, range: &NumRange) -> Fragments {
        let hits = self.hit_periods(
            |v| v.as_f64().is_some_and(|x| range.contains(x)),
            |a, b| line_in_range(a, b, range).into_iter().collect(),
        );
        self.complement_of(hits)
    }

    /// `ranges` must be normalized (sorted and disjoint).
    pub fn at_ranges(&self, ranges: &[NumRange]) -> Fragments {
        let mut fragments: Fragments = ranges.iter().flat_map(|r| self.at_range(r)).collect();
        fragments.sort_by(|a, b| a.period.cmp(&b.period));
        fragments
    }

    pub fn minus_ranges(&self, ranges: &[NumRange]) -> Fragments {
        let hits = self.hit_periods(
            |v| v.as_f64().is_some_and(|x| ranges.iter().any(|r| r.contains(x))),
            |a, b| {
                ranges
                    .iter()
                    .filter_map(|r| line_in_range(a, b, r))
                    .collect()
            },
        );
        self.complement_of(hits)
    }

    /// Periods, clipped to the sequence, where a value predicate holds.
    ///
    /// `step` tests a value held over a stepwise segment or a lone instant;
    /// `line` solves a linear segment `[a, b]` for the sub-periods where the
    /// predicate holds.
    fn hit_periods(
        &self,
        step: impl Fn(&Value) -> bool,
        line: impl Fn(&Instant, &Instant) -> SmallVec<[Period; 2]>,
    ) -> Option<PeriodSet> {
        let n = self.instants.len();
        let mut hits: Vec<Period> = Vec::new();
        if n == 1 {
            if step(self.instants[0].value()) {
                hits.push(self.period);
            }
        } else {
            for pair in self.instants.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                if self.is_linear() {
                    hits.extend(line(a, b));
                } else if step(a.value())
                    && let Ok(p) = Period::new(a.t(), b.t(), true, false)
                {
                    hits.push(p);
                }
            }
            let last = &self.instants[n - 1];
            if !self.is_linear() && self.period.upper_inc() && step(last.value()) {
                hits.push(Period::instant(last.t()));
            }
        }
        let clipped: Vec<Period> = hits
            .iter()
            .filter_map(|p| p.intersection(&self.period))
            .collect();
        PeriodSet::new(clipped).ok()
    }

    fn complement_of(&self, hits: Option<PeriodSet>) -> Fragments {
        match hits {
            None => smallvec![self.clone()],
            Some(hits) => self.minus_periodset(&hits),
        }
    }

    // ----- pairwise algebra -----

    /// Both sequences clipped to their common period.
    pub fn intersect(&self, other: &Sequence) -> Option<(Sequence, Sequence)> {
        let inter = self.period.intersection(&other.period)?;
        Some((self.at_period(&inter)?, other.at_period(&inter)?))
    }

    /// Both sequences clipped to their common period and resampled at the
    /// union of their timestamps.
    ///
    /// With `crossings`, when both are linear, the instants where the two
    /// values cross (numbers) or come closest (points) are added as well.
    pub fn synchronize(&self, other: &Sequence, crossings: bool) -> Option<(Sequence, Sequence)> {
        let inter = self.period.intersection(&other.period)?;
        let (a, b) = (self.at_period(&inter)?, other.at_period(&inter)?);
        if inter.is_instant() {
            return Some((a, b));
        }
        let mut times: Vec<TimestampTz> = a
            .instants
            .iter()
            .chain(b.instants.iter())
            .map(Instant::t)
            .collect();
        times.sort_unstable();
        times.dedup();
        if crossings && a.is_linear() && b.is_linear() {
            let mut extra = Vec::new();
            for pair in times.windows(2) {
                if let Some(t) = turning_point(&a, &b, pair[0], pair[1]) {
                    extra.push(t);
                }
            }
            if !extra.is_empty() {
                times.extend(extra);
                times.sort_unstable();
                times.dedup();
            }
        }
        let resample = |seq: &Sequence| {
            let instants = times
                .iter()
                .map(|&t| Instant::new(seq.value_at_inclusive(t), t))
                .collect();
            Sequence::make(instants, inter.lower_inc(), inter.upper_inc(), seq.interp, false)
        };
        Some((resample(&a), resample(&b)))
    }
}

/// Drop interior instants that add no information.
fn normalize_instants(instants: Vec<Instant>, interp: Interpolation) -> Vec<Instant> {
    let mut out: Vec<Instant> = Vec::with_capacity(instants.len());
    for inst in instants {
        if out.len() >= 2 {
            let (prev2, prev1) = (&out[out.len() - 2], &out[out.len() - 1]);
            let redundant = match interp {
                Interpolation::Stepwise => prev2.value() == prev1.value(),
                Interpolation::Linear => collinear(prev2, prev1, &inst),
            };
            if redundant {
                out.pop();
            }
        }
        out.push(inst);
    }
    out
}

/// True when `b` lies on the straight line from `a` to `c`.
fn collinear(a: &Instant, b: &Instant, c: &Instant) -> bool {
    if a.value() == b.value() && b.value() == c.value() {
        return true;
    }
    let ratio = b.t().micros_since(a.t()) as f64 / c.t().micros_since(a.t()) as f64;
    match a.value().interpolate(c.value(), ratio) {
        Some(expected) => values_close(&expected, b.value()),
        None => false,
    }
}

fn values_close(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(x), Value::Float(y)) => (x - y).abs() <= EPSILON,
        (Value::Point(p), Value::Point(q)) => p.same_reference(q) && p.distance(q) <= EPSILON,
        (Value::Double2(x1, x2), Value::Double2(y1, y2)) => {
            (x1 - y1).abs() <= EPSILON && (x2 - y2).abs() <= EPSILON
        }
        _ => a == b,
    }
}

/// Position `s` in `[0, 1]` of `v` on the segment from `a` to `b`, if any.
fn segment_ratio(a: &Value, b: &Value, v: &Value) -> Option<f64> {
    let ratio = match (a, b, v) {
        (Value::Float(x1), Value::Float(x2), Value::Float(x)) => (x - x1) / (x2 - x1),
        (Value::Point(p1), Value::Point(p2), Value::Point(p)) => {
            let (dx, dy) = (p2.x() - p1.x(), p2.y() - p1.y());
            let dz = match (p1.z, p2.z) {
                (Some(z1), Some(z2)) => z2 - z1,
                _ => 0.0,
            };
            if dx.abs() >= dy.abs() && dx.abs() >= dz.abs() {
                (p.x() - p1.x()) / dx
            } else if dy.abs() >= dz.abs() {
                (p.y() - p1.y()) / dy
            } else {
                (p.z.unwrap_or(0.0) - p1.z.unwrap_or(0.0)) / dz
            }
        }
        (Value::Double2(x1, _), Value::Double2(x2, _), Value::Double2(x, _)) if x1 != x2 => {
            (x - x1) / (x2 - x1)
        }
        (Value::Double2(_, y1), Value::Double2(_, y2), Value::Double2(_, y)) => (y - y1) / (y2 - y1),
        _ => return None,
    };
    if !(0.0..=1.0).contains(&ratio) {
        return None;
    }
    let projected = a.interpolate(b, ratio)?;
    values_close(&projected, v).then_some(ratio)
}

fn time_at_ratio(a: &Instant, b: &Instant, ratio: f64) -> TimestampTz {
    let dt = b.t().micros_since(a.t()) as f64;
    let offset = (dt * ratio).round() as i64;
    a.t().checked_add_micros(offset).unwrap_or(b.t())
}

/// Sub-periods of the closed linear segment `[a, b]` where the value is `v`.
fn line_at_value(a: &Instant, b: &Instant, v: &Value) -> SmallVec<[Period; 2]> {
    if a.value() == b.value() {
        if a.value() != v {
            return SmallVec::new();
        }
        return Period::new(a.t(), b.t(), true, true).into_iter().collect();
    }
    match segment_ratio(a.value(), b.value(), v) {
        Some(ratio) => smallvec![Period::instant(time_at_ratio(a, b, ratio))],
        None => SmallVec::new(),
    }
}

/// Sub-period of the closed linear segment `[a, b]` where the value lies in
/// `range`.
fn line_in_range(a: &Instant, b: &Instant, range: &NumRange) -> Option<Period> {
    let (fa, fb) = (a.value().as_f64()?, b.value().as_f64()?);
    if fa == fb {
        return range
            .contains(fa)
            .then(|| Period::new(a.t(), b.t(), true, true).ok())
            .flatten();
    }
    let ratio = |x: f64| (x - fa) / (fb - fa);
    let (mut start, mut start_inc, mut end, mut end_inc) = if fb > fa {
        (ratio(range.lower()), range.lower_inc(), ratio(range.upper()), range.upper_inc())
    } else {
        (ratio(range.upper()), range.upper_inc(), ratio(range.lower()), range.lower_inc())
    };
    if start > 1.0 || end < 0.0 {
        return None;
    }
    if start < 0.0 {
        (start, start_inc) = (0.0, true);
    }
    if end > 1.0 {
        (end, end_inc) = (1.0, true);
    }
    Period::new(
        time_at_ratio(a, b, start),
        time_at_ratio(a, b, end),
        start_inc,
        end_inc,
    )
    .ok()
}

/// Timestamp strictly inside `(t1, t2)` where two linear sequences cross
/// (numbers) or reach their minimum distance (points).
fn turning_point(a: &Sequence, b: &Sequence, t1: TimestampTz, t2: TimestampTz) -> Option<TimestampTz> {
    let (a1, a2) = (a.value_at_inclusive(t1), a.value_at_inclusive(t2));
    let (b1, b2) = (b.value_at_inclusive(t1), b.value_at_inclusive(t2));
    let ratio = match (&a1, &a2, &b1, &b2) {
        (Value::Float(x1), Value::Float(x2), Value::Float(y1), Value::Float(y2)) => {
            let (d1, d2) = (x1 - y1, x2 - y2);
            if d1 == 0.0 || d2 == 0.0 || (d1 > 0.0) == (d2 > 0.0) {
                return None;
            }
            d1 / (d1 - d2)
        }
        (Value::Point(p1), Value::Point(p2), Value::Point(q1), Value::Point(q2)) => {
            let start = [p1.x() - q1.x(), p1.y() - q1.y(), p1.z.unwrap_or(0.0) - q1.z.unwrap_or(0.0)];
            let end = [p2.x() - q2.x(), p2.y() - q2.y(), p2.z.unwrap_or(0.0) - q2.z.unwrap_or(0.0)];
            let delta = [end[0] - start[0], end[1] - start[1], end[2] - start[2]];
            let denom = delta.iter().map(|d| d * d).sum::<f64>();
            if denom == 0.0 {
                return None;
            }
            -(start[0] * delta[0] + start[1] * delta[1] + start[2] * delta[2]) / denom
        }
        _ => return None,
    };
    if ratio <= 0.0 || ratio >= 1.0 {
        return None;
    }
    let offset = (t2.micros_since(t1) as f64 * ratio).round() as i64;
    let t = t1.checked_add_micros(offset)?;
    (t > t1 && t < t2).then_some(t)
}

impl Ord for Sequence {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.instants.iter().zip(other.instants.iter()) {
            let ord = a.t().cmp(&b.t()).then_with(|| a.value().cmp(b.value()));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.instants
            .len()
            .cmp(&other.instants.len())
            .then_with(|| other.period.lower_inc().cmp(&self.period.lower_inc()))
            .then_with(|| self.period.upper_inc().cmp(&other.period.upper_inc()))
            .then_with(|| self.interp.cmp(&other.interp))
    }
}

impl PartialOrd for Sequence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sequence {}

impl Hash for Sequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash32());
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", if self.period.lower_inc() { '[' } else { '(' })?;
        for (i, inst) in self.instants.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", inst)?;
        }
        write!(f, "{}", if self.period.upper_inc() { ']' } else { ')' })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seqset_types::GeoPoint;

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    fn p(lower: i64, upper: i64, lower_inc: bool, upper_inc: bool) -> Period {
        Period::new(t(lower), t(upper), lower_inc, upper_inc).unwrap()
    }

    fn seq(points: &[(f64, i64)], lower_inc: bool, upper_inc: bool, interp: Interpolation) -> Sequence {
        let instants = points.iter().map(|&(v, us)| Instant::new(v, t(us))).collect();
        Sequence::new(instants, lower_inc, upper_inc, interp, true).unwrap()
    }

    fn linear(points: &[(f64, i64)]) -> Sequence {
        seq(points, true, true, Interpolation::Linear)
    }

    #[test]
    fn test_rejects_invalid_sequences() {
        let one = vec![Instant::new(1.0, t(0))];
        assert!(Sequence::new(one, true, false, Interpolation::Stepwise, true).is_err());

        let ints = vec![Instant::new(1, t(0)), Instant::new(2, t(1))];
        assert!(matches!(
            Sequence::new(ints, true, true, Interpolation::Linear, true),
            Err(SeqSetError::Unsupported { .. })
        ));

        let unordered = vec![Instant::new(1.0, t(5)), Instant::new(2.0, t(1))];
        assert!(matches!(
            Sequence::new(unordered, true, true, Interpolation::Linear, true),
            Err(SeqSetError::BrokenOrdering { .. })
        ));
    }

    #[test]
    fn test_normalization_drops_redundant_instants() {
        let s = seq(&[(1.0, 0), (1.0, 5), (2.0, 10)], true, true, Interpolation::Stepwise);
        assert_eq!(s.count(), 2);

        let l = linear(&[(0.0, 0), (5.0, 5), (10.0, 10)]);
        assert_eq!(l.count(), 2);

        let kinked = linear(&[(0.0, 0), (5.0, 5), (0.0, 10)]);
        assert_eq!(kinked.count(), 3);
    }

    #[test]
    fn test_stepwise_exclusive_upper_repeats_penultimate() {
        let s = seq(&[(1.0, 0), (2.0, 10)], true, false, Interpolation::Stepwise);
        assert_eq!(s.end_instant().value(), &Value::Float(1.0));
    }

    #[test]
    fn test_value_at_respects_interpolation() {
        let l = linear(&[(0.0, 0), (10.0, 10)]);
        assert_eq!(l.value_at(t(4)), Some(Value::Float(4.0)));
        let s = seq(&[(0.0, 0), (10.0, 10)], true, true, Interpolation::Stepwise);
        assert_eq!(s.value_at(t(4)), Some(Value::Float(0.0)));
        assert_eq!(s.value_at(t(10)), Some(Value::Float(10.0)));
        assert_eq!(s.value_at(t(11)), None);
    }

    #[test]
    fn test_at_period_interpolates_bounds() {
        let l = linear(&[(0.0, 0), (10.0, 10)]);
        let clipped = l.at_period(&p(2, 6, true, false)).unwrap();
        assert_eq!(clipped.period(), &p(2, 6, true, false));
        assert_eq!(clipped.start_instant().value(), &Value::Float(2.0));
        assert_eq!(clipped.end_instant().value(), &Value::Float(6.0));
        assert!(l.at_period(&p(11, 20, true, true)).is_none());
    }

    #[test]
    fn test_minus_timestamp_splits_interior() {
        let s = seq(&[(1.0, 0), (2.0, 5), (3.0, 10)], true, true, Interpolation::Stepwise);
        let parts = s.minus_timestamp(t(5));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].period(), &p(0, 5, true, false));
        assert_eq!(parts[1].period(), &p(5, 10, false, true));
        assert_eq!(parts[1].start_instant().value(), &Value::Float(2.0));
    }

    #[test]
    fn test_linear_at_value_is_exact_instant() {
        let l = linear(&[(0.0, 0), (3.0, 3)]);
        let hits = l.at_value(&Value::Float(1.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].period(), &Period::instant(t(1)));
        assert_eq!(hits[0].start_instant().value(), &Value::Float(1.0));
    }

    #[test]
    fn test_at_and_minus_value_partition_time() {
        let s = seq(&[(1.0, 0), (2.0, 5), (1.0, 10)], true, true, Interpolation::Stepwise);
        let at = s.at_value(&Value::Float(1.0));
        let minus = s.minus_value(&Value::Float(1.0));
        let mut periods: Vec<Period> = at.iter().chain(minus.iter()).map(|f| *f.period()).collect();
        periods.sort();
        assert_eq!(
            PeriodSet::new(periods).unwrap(),
            PeriodSet::from_period(*s.period())
        );
        assert_eq!(minus.len(), 1);
        assert_eq!(minus[0].period(), &p(5, 10, true, false));
    }

    #[test]
    fn test_at_range_on_linear_segment() {
        let l = linear(&[(0.0, 0), (10.0, 10)]);
        let range = NumRange::new(2.0, 4.0, true, false).unwrap();
        let hits = l.at_range(&range);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].period(), &p(2, 4, true, false));
        let rest = l.minus_range(&range);
        assert_eq!(rest.len(), 2);
    }

    #[test]
    fn test_synchronize_adds_crossing() {
        let a = linear(&[(0.0, 0), (10.0, 10)]);
        let b = linear(&[(10.0, 0), (0.0, 10)]);
        let (sa, sb) = a.synchronize(&b, true).unwrap();
        let times: Vec<_> = sa.instants().iter().map(Instant::t).collect();
        assert_eq!(times, vec![t(0), t(5), t(10)]);
        assert_eq!(sb.count(), 3);
        let (plain, _) = a.synchronize(&b, false).unwrap();
        assert_eq!(plain.count(), 2);
    }

    #[test]
    fn test_synchronize_point_turning_point() {
        let pt = |x: f64, y: f64| Value::Point(GeoPoint::new(x, y));
        let a = Sequence::new(
            vec![Instant::new(pt(0.0, 0.0), t(0)), Instant::new(pt(10.0, 0.0), t(10))],
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        let b = Sequence::new(
            vec![Instant::new(pt(10.0, 1.0), t(0)), Instant::new(pt(0.0, 1.0), t(10))],
            true,
            true,
            Interpolation::Linear,
            true,
        )
        .unwrap();
        let (sa, _) = a.synchronize(&b, true).unwrap();
        assert!(sa.instants().iter().any(|inst| inst.t() == t(5)));
    }

    #[test]
    fn test_append_instant() {
        let s = seq(&[(1.0, 0), (2.0, 5)], true, true, Interpolation::Linear);
        let longer = s.append_instant(Instant::new(4.0, t(10))).unwrap();
        assert_eq!(longer.period(), &p(0, 10, true, true));
        assert!(matches!(
            s.append_instant(Instant::new(4.0, t(3))),
            Err(SeqSetError::BrokenOrdering { .. })
        ));
        assert!(matches!(
            s.append_instant(Instant::new(9.0, t(5))),
            Err(SeqSetError::ConflictingValues { .. })
        ));
    }

    #[test]
    fn test_integral_and_twavg() {
        let s = seq(&[(2.0, 0), (4.0, 10)], true, true, Interpolation::Stepwise);
        assert_eq!(s.integral().unwrap(), 20.0);
        assert_eq!(s.twavg().unwrap(), 2.0);
        let l = linear(&[(2.0, 0), (4.0, 10)]);
        assert_eq!(l.twavg().unwrap(), 3.0);
    }

    #[test]
    fn test_step_to_linear() {
        let s = seq(&[(1.0, 0), (2.0, 5), (3.0, 10)], true, true, Interpolation::Stepwise);
        let pieces = s.step_to_linear();
        assert_eq!(pieces.len(), 3);
        assert!(pieces.iter().all(Sequence::is_linear));
        assert_eq!(pieces[0].period(), &p(0, 5, true, false));
        assert_eq!(pieces[2].period(), &Period::instant(t(10)));
    }

    #[test]
    fn test_order_and_hash_agree() {
        let a = linear(&[(1.0, 0), (2.0, 5)]);
        let b = linear(&[(1.0, 0), (2.0, 5)]);
        assert_eq!(a, b);
        assert_eq!(a.hash32(), b.hash32());
        let c = seq(&[(1.0, 0), (2.0, 5)], false, true, Interpolation::Linear);
        assert!(a < c);
    }

    #[test]
    fn test_display() {
        let s = seq(&[(1.0, 0), (2.5, 1_000_000)], true, false, Interpolation::Linear);
        assert_eq!(
            s.to_string(),
            "[1@1970-01-01 00:00:00+00, 2.5@1970-01-01 00:00:01+00)"
        );
    }
}
