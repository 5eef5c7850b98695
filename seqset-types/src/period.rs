use crate::error::TypeError;
use crate::timestamp::TimestampTz;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A time range with independently inclusive or exclusive bounds.
///
/// A period is never empty: either `lower < upper`, or `lower == upper`
/// and both bounds are inclusive (an instantaneous period).
///
/// # Examples
///
/// ```
/// use seqset_types::period::Period;
/// use seqset_types::timestamp::TimestampTz;
///
/// let t = |us| TimestampTz::from_micros(us);
/// let a = Period::new(t(0), t(10), true, false).unwrap();
/// let b = Period::new(t(10), t(20), true, true).unwrap();
/// assert!(!a.overlaps(&b));
/// assert!(a.is_adjacent(&b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PeriodRepr")]
pub struct Period {
    lower: TimestampTz,
    upper: TimestampTz,
    lower_inc: bool,
    upper_inc: bool,
}

#[derive(Deserialize)]
struct PeriodRepr {
    lower: TimestampTz,
    upper: TimestampTz,
    lower_inc: bool,
    upper_inc: bool,
}

impl TryFrom<PeriodRepr> for Period {
    type Error = TypeError;

    fn try_from(repr: PeriodRepr) -> Result<Self, TypeError> {
        Period::new(repr.lower, repr.upper, repr.lower_inc, repr.upper_inc)
    }
}

/// Compare two lower bounds: at equal timestamps an inclusive bound starts first.
pub fn cmp_lower_bounds(t1: TimestampTz, inc1: bool, t2: TimestampTz, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => Ordering::Equal,
    })
}

/// Compare two upper bounds: at equal timestamps an exclusive bound ends first.
pub fn cmp_upper_bounds(t1: TimestampTz, inc1: bool, t2: TimestampTz, inc2: bool) -> Ordering {
    t1.cmp(&t2).then_with(|| match (inc1, inc2) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => Ordering::Equal,
    })
}

/// True when a lower bound does not start after an upper bound.
fn lower_le_upper(lower: TimestampTz, lower_inc: bool, upper: TimestampTz, upper_inc: bool) -> bool {
    lower < upper || (lower == upper && lower_inc && upper_inc)
}

impl Period {
    pub fn new(
        lower: TimestampTz,
        upper: TimestampTz,
        lower_inc: bool,
        upper_inc: bool,
    ) -> Result<Self, TypeError> {
        if lower > upper {
            return Err(TypeError::InvalidPeriod(format!(
                "lower bound {} is after upper bound {}",
                lower, upper
            )));
        }
        if lower == upper && !(lower_inc && upper_inc) {
            return Err(TypeError::InvalidPeriod(format!(
                "instantaneous period at {} must include both bounds",
                lower
            )));
        }
        Ok(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// The period `[t, t]`.
    pub fn instant(t: TimestampTz) -> Self {
        Self {
            lower: t,
            upper: t,
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn lower(&self) -> TimestampTz {
        self.lower
    }

    pub fn upper(&self) -> TimestampTz {
        self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn is_instant(&self) -> bool {
        self.lower == self.upper
    }

    pub fn duration_micros(&self) -> i64 {
        self.upper.micros_since(self.lower)
    }

    pub fn contains_timestamp(&self, t: TimestampTz) -> bool {
        (self.lower < t || (self.lower == t && self.lower_inc))
            && (t < self.upper || (t == self.upper && self.upper_inc))
    }

    pub fn contains_period(&self, other: &Period) -> bool {
        cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
            != Ordering::Greater
            && cmp_upper_bounds(other.upper, other.upper_inc, self.upper, self.upper_inc)
                != Ordering::Greater
    }

    pub fn overlaps(&self, other: &Period) -> bool {
        lower_le_upper(self.lower, self.lower_inc, other.upper, other.upper_inc)
            && lower_le_upper(other.lower, other.lower_inc, self.upper, self.upper_inc)
    }

    /// True when `self` ends strictly before `other` starts.
    pub fn is_before(&self, other: &Period) -> bool {
        !lower_le_upper(other.lower, other.lower_inc, self.upper, self.upper_inc)
    }

    /// True when the periods touch at one instant owned by exactly one of them.
    pub fn is_adjacent(&self, other: &Period) -> bool {
        (self.upper == other.lower && self.upper_inc != other.lower_inc)
            || (other.upper == self.lower && other.upper_inc != self.lower_inc)
    }

    /// Order by upper bound only.
    pub fn cmp_upper(&self, other: &Period) -> Ordering {
        cmp_upper_bounds(self.upper, self.upper_inc, other.upper, other.upper_inc)
    }

    /// Order by lower bound only.
    pub fn cmp_lower(&self, other: &Period) -> Ordering {
        cmp_lower_bounds(self.lower, self.lower_inc, other.lower, other.lower_inc)
    }

    pub fn intersection(&self, other: &Period) -> Option<Period> {
        let (lower, lower_inc) = if self.cmp_lower(other) == Ordering::Less {
            (other.lower, other.lower_inc)
        } else {
            (self.lower, self.lower_inc)
        };
        let (upper, upper_inc) = if self.cmp_upper(other) == Ordering::Greater {
            (other.upper, other.upper_inc)
        } else {
            (self.upper, self.upper_inc)
        };
        lower_le_upper(lower, lower_inc, upper, upper_inc).then_some(Period {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// Smallest period covering both inputs.
    pub fn span(&self, other: &Period) -> Period {
        let (lower, lower_inc) = if self.cmp_lower(other) == Ordering::Greater {
            (other.lower, other.lower_inc)
        } else {
            (self.lower, self.lower_inc)
        };
        let (upper, upper_inc) = if self.cmp_upper(other) == Ordering::Less {
            (other.upper, other.upper_inc)
        } else {
            (self.upper, self.upper_inc)
        };
        Period {
            lower,
            upper,
            lower_inc,
            upper_inc,
        }
    }

    /// The parts of `self` not covered by `other`, in time order (at most two).
    pub fn minus(&self, other: &Period) -> Vec<Period> {
        if !self.overlaps(other) {
            return vec![*self];
        }
        let mut result = Vec::with_capacity(2);
        if self.cmp_lower(other) == Ordering::Less
            && lower_le_upper(self.lower, self.lower_inc, other.lower, !other.lower_inc)
        {
            result.push(Period {
                lower: self.lower,
                upper: other.lower,
                lower_inc: self.lower_inc,
                upper_inc: !other.lower_inc,
            });
        }
        if self.cmp_upper(other) == Ordering::Greater
            && lower_le_upper(other.upper, !other.upper_inc, self.upper, self.upper_inc)
        {
            result.push(Period {
                lower: other.upper,
                upper: self.upper,
                lower_inc: !other.upper_inc,
                upper_inc: self.upper_inc,
            });
        }
        result
    }

    pub fn shift(&self, delta_micros: i64) -> Option<Period> {
        Some(Period {
            lower: self.lower.checked_add_micros(delta_micros)?,
            upper: self.upper.checked_add_micros(delta_micros)?,
            lower_inc: self.lower_inc,
            upper_inc: self.upper_inc,
        })
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_lower(other).then_with(|| self.cmp_upper(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}, {}{}",
            if self.lower_inc { '[' } else { '(' },
            self.lower,
            self.upper,
            if self.upper_inc { ']' } else { ')' }
        )
    }
}
