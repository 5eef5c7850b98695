use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A range of numeric base values with independent bound inclusivity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumRange {
    lower: f64,
    upper: f64,
    lower_inc: bool,
    upper_inc: bool,
}

impl NumRange {
    pub fn new(lower: f64, upper: f64, lower_inc: bool, upper_inc: bool) -> Result<Self, TypeError> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(TypeError::InvalidRange(format!(
                "bounds must be finite, got [{}, {}]",
                lower, upper
            )));
        }
        if lower > upper || (lower == upper && !(lower_inc && upper_inc)) {
            return Err(TypeError::InvalidRange(format!(
                "range {}{}, {}{} is empty",
                if lower_inc { '[' } else { '(' },
                lower,
                upper,
                if upper_inc { ']' } else { ')' }
            )));
        }
        Ok(Self {
            lower,
            upper,
            lower_inc,
            upper_inc,
        })
    }

    /// The singleton range `[value, value]`.
    pub fn singleton(value: f64) -> Self {
        Self {
            lower: value,
            upper: value,
            lower_inc: true,
            upper_inc: true,
        }
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn lower_inc(&self) -> bool {
        self.lower_inc
    }

    pub fn upper_inc(&self) -> bool {
        self.upper_inc
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.lower < value || (self.lower == value && self.lower_inc))
            && (value < self.upper || (value == self.upper && self.upper_inc))
    }

    pub fn overlaps(&self, other: &NumRange) -> bool {
        let starts_before_end = |lo: f64, lo_inc: bool, hi: f64, hi_inc: bool| {
            lo < hi || (lo == hi && lo_inc && hi_inc)
        };
        starts_before_end(self.lower, self.lower_inc, other.upper, other.upper_inc)
            && starts_before_end(other.lower, other.lower_inc, self.upper, self.upper_inc)
    }

    fn touches(&self, next: &NumRange) -> bool {
        self.upper == next.lower && (self.upper_inc || next.lower_inc)
    }

    fn cmp_lower(&self, other: &NumRange) -> Ordering {
        self.lower.total_cmp(&other.lower).then(match (self.lower_inc, other.lower_inc) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }

    fn merge(&self, other: &NumRange) -> NumRange {
        let (upper, upper_inc) = match self.upper.total_cmp(&other.upper) {
            Ordering::Less => (other.upper, other.upper_inc),
            Ordering::Greater => (self.upper, self.upper_inc),
            Ordering::Equal => (self.upper, self.upper_inc || other.upper_inc),
        };
        NumRange {
            lower: self.lower,
            upper,
            lower_inc: self.lower_inc,
            upper_inc,
        }
    }

    /// Sort and merge overlapping or touching ranges.
    pub fn normalize(mut ranges: Vec<NumRange>) -> Vec<NumRange> {
        ranges.sort_by(|a, b| a.cmp_lower(b));
        let mut result: Vec<NumRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match result.last_mut() {
                Some(last) if last.overlaps(&range) || last.touches(&range) => {
                    *last = last.merge(&range);
                }
                _ => result.push(range),
            }
        }
        result
    }
}

impl fmt::Display for NumRange {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_bounds() {
        let r = NumRange::new(1.0, 2.0, false, true).unwrap();
        assert!(!r.contains(1.0));
        assert!(r.contains(1.5));
        assert!(r.contains(2.0));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(NumRange::new(2.0, 1.0, true, true).is_err());
        assert!(NumRange::new(1.0, 1.0, true, false).is_err());
        assert!(NumRange::new(f64::NAN, 1.0, true, true).is_err());
    }

    #[test]
    fn test_normalize_merges_touching() {
        let merged = NumRange::normalize(vec![
            NumRange::new(3.0, 4.0, true, true).unwrap(),
            NumRange::new(1.0, 2.0, true, false).unwrap(),
            NumRange::new(2.0, 2.5, true, true).unwrap(),
        ]);
        assert_eq!(
            merged,
            vec![
                NumRange::new(1.0, 2.5, true, true).unwrap(),
                NumRange::new(3.0, 4.0, true, true).unwrap(),
            ]
        );
    }
}
