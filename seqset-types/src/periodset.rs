use crate::error::TypeError;
use crate::period::Period;
use crate::timestamp::TimestampTz;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered set of disjoint, non-adjacent periods.
///
/// Construction sorts the input and merges overlapping or adjacent periods,
/// so every `PeriodSet` is normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodSetRepr")]
pub struct PeriodSet {
    periods: Vec<Period>,
}

/// Deserialized form, normalized through [`PeriodSet::new`].
#[derive(Deserialize)]
struct PeriodSetRepr {
    periods: Vec<Period>,
}

impl TryFrom<PeriodSetRepr> for PeriodSet {
    type Error = TypeError;

    fn try_from(repr: PeriodSetRepr) -> Result<Self, TypeError> {
        PeriodSet::new(repr.periods)
    }
}

impl PeriodSet {
    pub fn new(mut periods: Vec<Period>) -> Result<Self, TypeError> {
        if periods.is_empty() {
            return Err(TypeError::EmptySet("period set"));
        }
        periods.sort();
        let mut merged: Vec<Period> = Vec::with_capacity(periods.len());
        for period in periods {
            match merged.last_mut() {
                Some(last) if last.overlaps(&period) || last.is_adjacent(&period) => {
                    *last = last.span(&period);
                }
                _ => merged.push(period),
            }
        }
        Ok(Self { periods: merged })
    }

    pub fn from_period(period: Period) -> Self {
        Self {
            periods: vec![period],
        }
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn count(&self) -> usize {
        self.periods.len()
    }

    pub fn period_n(&self, index: usize) -> Option<&Period> {
        self.periods.get(index)
    }

    /// Bounding period of the whole set.
    pub fn bbox(&self) -> Period {
        let first = self.periods[0];
        let last = self.periods[self.periods.len() - 1];
        first.span(&last)
    }

    /// Binary search for the period containing `t`.
    ///
    /// Returns `Ok(index)` when found, otherwise `Err(index)` of the first
    /// period that starts after `t`.
    pub fn find_timestamp(&self, t: TimestampTz) -> Result<usize, usize> {
        let (mut lo, mut hi) = (0, self.periods.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let period = &self.periods[mid];
            if period.contains_timestamp(t) {
                return Ok(mid);
            }
            if t <= period.lower() {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Err(lo)
    }

    pub fn contains_timestamp(&self, t: TimestampTz) -> bool {
        self.find_timestamp(t).is_ok()
    }

    pub fn overlaps_period(&self, period: &Period) -> bool {
        self.periods.iter().any(|p| p.overlaps(period))
    }

    pub fn duration_micros(&self) -> i64 {
        self.periods.iter().map(Period::duration_micros).sum()
    }

    /// Remove `period` from the set; `None` when nothing remains.
    pub fn minus_period(&self, period: &Period) -> Option<PeriodSet> {
        let remaining: Vec<Period> = self
            .periods
            .iter()
            .flat_map(|p| p.minus(period))
            .collect();
        (!remaining.is_empty()).then_some(PeriodSet { periods: remaining })
    }

    /// Remove every period of `other` from the set; `None` when nothing remains.
    pub fn minus(&self, other: &PeriodSet) -> Option<PeriodSet> {
        let mut current = self.periods.clone();
        for cut in &other.periods {
            current = current.iter().flat_map(|p| p.minus(cut)).collect();
            if current.is_empty() {
                return None;
            }
        }
        Some(PeriodSet { periods: current })
    }

    pub fn intersection(&self, other: &PeriodSet) -> Option<PeriodSet> {
        let mut result = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.periods.len() && j < other.periods.len() {
            let (a, b) = (&self.periods[i], &other.periods[j]);
            if let Some(inter) = a.intersection(b) {
                result.push(inter);
            }
            match a.cmp_upper(b) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        (!result.is_empty()).then_some(PeriodSet { periods: result })
    }

    pub fn shift(&self, delta_micros: i64) -> Option<PeriodSet> {
        let periods = self
            .periods
            .iter()
            .map(|p| p.shift(delta_micros))
            .collect::<Option<Vec<_>>>()?;
        Some(PeriodSet { periods })
    }
}

impl From<Period> for PeriodSet {
    fn from(period: Period) -> Self {
        Self::from_period(period)
    }
}

impl fmt::Display for PeriodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, period) in self.periods.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", period)?;
        }
        write!(f, "}}")
    }
}
