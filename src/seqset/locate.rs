use super::SequenceSet;
use crate::error::Result;
use seqset_types::TimestampTz;

/// Where a timestamp falls in a set: `Ok(i)` when sequence `i` contains it,
/// `Err(i)` when it lies in the gap before sequence `i` (`i == count` past
/// the end).
pub type Location = std::result::Result<usize, usize>;

impl SequenceSet {
    /// Binary search for the sequence containing `t`.
    ///
    /// Only the packed headers are read, so each lookup step costs O(1).
    pub fn locate(&self, t: TimestampTz) -> Result<Location> {
        if t < self.period.lower() {
            return Ok(Err(0));
        }
        if t > self.period.upper() {
            return Ok(Err(self.count()));
        }
        let (mut lo, mut hi) = (0, self.count());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let period = self.seq_period(mid)?;
            if period.contains_timestamp(t) {
                return Ok(Ok(mid));
            }
            if t <= period.lower() {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(Err(lo))
    }
}

#[cfg(test)]
mod tests {
    use crate::seqset::SequenceSet;
    use crate::temporal::{Instant, Interpolation, Sequence};
    use seqset_types::TimestampTz;

    fn t(us: i64) -> TimestampTz {
        TimestampTz::from_micros(us)
    }

    fn set() -> SequenceSet {
        let seq = |a: i64, b: i64, lower_inc: bool, upper_inc: bool| {
            Sequence::new(
                vec![Instant::new(1, t(a)), Instant::new(2, t(b))],
                lower_inc,
                upper_inc,
                Interpolation::Stepwise,
                false,
            )
            .expect("valid sequence")
        };
        SequenceSet::new(
            vec![
                seq(10, 20, true, false),
                seq(20, 30, false, true),
                seq(40, 50, false, false),
            ],
            false,
        )
        .expect("valid set")
    }

    #[test]
    fn test_locate_inside_and_between() {
        let set = set();
        assert_eq!(set.locate(t(10)).unwrap(), Ok(0));
        assert_eq!(set.locate(t(15)).unwrap(), Ok(0));
        assert_eq!(set.locate(t(25)).unwrap(), Ok(1));
        assert_eq!(set.locate(t(30)).unwrap(), Ok(1));
        assert_eq!(set.locate(t(35)).unwrap(), Err(2));
        assert_eq!(set.locate(t(45)).unwrap(), Ok(2));
    }

    #[test]
    fn test_locate_on_excluded_bounds() {
        let set = set();
        // 20 is excluded by both neighbours
        assert_eq!(set.locate(t(20)).unwrap(), Err(1));
        assert_eq!(set.locate(t(40)).unwrap(), Err(2));
        assert_eq!(set.locate(t(50)).unwrap(), Err(3));
    }

    #[test]
    fn test_locate_outside_period() {
        let set = set();
        assert_eq!(set.locate(t(0)).unwrap(), Err(0));
        assert_eq!(set.locate(t(99)).unwrap(), Err(3));
    }
}
