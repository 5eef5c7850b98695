use crate::error::TypeError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A point on the UTC timeline with microsecond resolution.
///
/// Stored as microseconds since the Unix epoch, which keeps comparisons and
/// interpolation ratios exact integer arithmetic.
///
/// # Examples
///
/// ```
/// use seqset_types::timestamp::TimestampTz;
///
/// let t = TimestampTz::parse("2000-01-01 12:00:00").unwrap();
/// assert_eq!(t.to_string(), "2000-01-01 12:00:00+00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampTz(i64);

impl TimestampTz {
    pub const MIN: TimestampTz = TimestampTz(i64::MIN);
    pub const MAX: TimestampTz = TimestampTz(i64::MAX);

    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    /// Convert a `SystemTime`, saturating at the representable range.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self(i64::try_from(after.as_micros()).unwrap_or(i64::MAX)),
            Err(err) => {
                let before = err.duration().as_micros();
                Self(i64::try_from(before).map(|us| -us).unwrap_or(i64::MIN))
            }
        }
    }

    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_micros(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_micros(self.0.unsigned_abs())
        }
    }

    /// Parse a UTC timestamp.
    ///
    /// Accepted forms are RFC 3339 (`2000-01-01T10:00:00Z`),
    /// `YYYY-MM-DD HH:MM:SS[.ffffff][+00]` and a bare date `YYYY-MM-DD`.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let trimmed = input.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self(dt.with_timezone(&Utc).timestamp_micros()));
        }
        let naive = trimmed.strip_suffix("+00").unwrap_or(trimmed);
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S%.f") {
            return Ok(Self(dt.and_utc().timestamp_micros()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d")
            && let Some(dt) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(Self(dt.and_utc().timestamp_micros()));
        }
        Err(TypeError::InvalidTimestamp(input.to_string()))
    }

    pub fn checked_add_micros(self, delta: i64) -> Option<Self> {
        self.0.checked_add(delta).map(Self)
    }

    /// Signed distance `self - earlier` in microseconds.
    pub fn micros_since(self, earlier: TimestampTz) -> i64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<SystemTime> for TimestampTz {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

impl fmt::Display for TimestampTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match DateTime::<Utc>::from_timestamp_micros(self.0) {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f+00")),
            None => write!(f, "{}us", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms_agree() {
        let a = TimestampTz::parse("2000-01-01").unwrap();
        let b = TimestampTz::parse("2000-01-01 00:00:00+00").unwrap();
        let c = TimestampTz::parse("2000-01-01T00:00:00Z").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.micros(), 946_684_800_000_000);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TimestampTz::parse("yesterday").is_err());
    }

    #[test]
    fn test_display_fractional_seconds() {
        let t = TimestampTz::parse("2000-01-01 00:00:01.5").unwrap();
        assert_eq!(t.to_string(), "2000-01-01 00:00:01.500+00");
    }

    #[test]
    fn test_system_time_round_trip() {
        let t = TimestampTz::from_micros(1_640_995_200_000_000);
        assert_eq!(TimestampTz::from(t.to_system_time()), t);

        let before_epoch = TimestampTz::from_micros(-5);
        assert_eq!(TimestampTz::from(before_epoch.to_system_time()), before_epoch);
    }
}
