use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeParseError {
    #[error("invalid time unit in {0:?}, use s/m/h")]
    InvalidUnit(String),

    #[error("invalid time value in {0:?}")]
    InvalidValue(String),
}

/// Parse a `<integer><unit>` string (`45s`, `30m`, `1h`) into milliseconds.
///
/// The unit is checked before the value, so `"30"` is an invalid unit rather
/// than an invalid value.
pub fn parse_time_string(time: &str) -> Result<u64, TimeParseError> {
    let mut chars = time.chars();
    let unit = chars
        .next_back()
        .ok_or_else(|| TimeParseError::InvalidUnit(time.to_string()))?;

    let multiplier: u64 = match unit {
        's' => 1_000,
        'm' => 60 * 1_000,
        'h' => 60 * 60 * 1_000,
        _ => return Err(TimeParseError::InvalidUnit(time.to_string())),
    };

    let value: u64 = chars
        .as_str()
        .parse()
        .map_err(|_| TimeParseError::InvalidValue(time.to_string()))?;

    value
        .checked_mul(multiplier)
        .ok_or_else(|| TimeParseError::InvalidValue(time.to_string()))
}

/// Probe cadence and total run length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub duration: Duration,
}

impl Schedule {
    pub fn parse(interval: &str, duration: &str) -> Result<Self, TimeParseError> {
        Ok(Self {
            interval: Duration::from_millis(parse_time_string(interval)?),
            duration: Duration::from_millis(parse_time_string(duration)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds() {
        assert_eq!(parse_time_string("45s"), Ok(45_000));
        assert_eq!(parse_time_string("0s"), Ok(0));
    }

    #[test]
    fn minutes() {
        assert_eq!(parse_time_string("1m"), Ok(60_000));
        assert_eq!(parse_time_string("30m"), Ok(1_800_000));
    }

    #[test]
    fn hours() {
        assert_eq!(parse_time_string("1h"), Ok(3_600_000));
        assert_eq!(parse_time_string("24h"), Ok(86_400_000));
    }

    #[test]
    fn scales_linearly() {
        for n in [1u64, 7, 59, 120, 1_000] {
            assert_eq!(parse_time_string(&format!("{n}s")), Ok(n * 1_000));
            assert_eq!(parse_time_string(&format!("{n}m")), Ok(n * 60_000));
            assert_eq!(parse_time_string(&format!("{n}h")), Ok(n * 3_600_000));
        }
    }

    #[test]
    fn unknown_unit_rejected() {
        for input in ["5d", "30", "1H", "2w", ""] {
            assert_eq!(
                parse_time_string(input),
                Err(TimeParseError::InvalidUnit(input.to_string())),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn non_numeric_value_rejected() {
        for input in ["xm", "m", "-5s", "1.5h", " 5s", "10ms"] {
            assert_eq!(
                parse_time_string(input),
                Err(TimeParseError::InvalidValue(input.to_string())),
                "input {input:?}"
            );
        }
    }

    #[test]
    fn overflow_rejected() {
        let input = format!("{}h", u64::MAX / 1_000);
        assert!(matches!(
            parse_time_string(&input),
            Err(TimeParseError::InvalidValue(_))
        ));
    }

    #[test]
    fn schedule_parses_both_fields() {
        let schedule = Schedule::parse("1m", "30m").unwrap();
        assert_eq!(schedule.interval, Duration::from_secs(60));
        assert_eq!(schedule.duration, Duration::from_secs(30 * 60));
    }

    #[test]
    fn schedule_rejects_either_bad_field() {
        assert!(Schedule::parse("1x", "30m").is_err());
        assert!(Schedule::parse("1m", "30").is_err());
    }
}
