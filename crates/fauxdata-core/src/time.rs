use std::fmt::Write;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::error::Error;

/// Parse an absolute timestamp.
///
/// Accepts RFC 3339 (converted to UTC), `T` or space separated naive
/// datetimes with optional fractional seconds, and bare dates (midnight).
pub fn parse_timestamp_value(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.naive_utc())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M").ok())
        .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").ok())
        .or_else(|| parse_date_value(value).map(|date| date.and_time(NaiveTime::MIN)))
}

pub fn parse_date_value(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Format with a user-supplied strftime pattern, `None` if the pattern is invalid.
pub fn format_timestamp(value: NaiveDateTime, format: &str) -> Option<String> {
    let items = StrftimeItems::new(format);
    if items.clone().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", value.format_with_items(items)).ok()?;
    Some(out)
}

/// Parse a relative offset such as `-4H`, `1d12h` or `30 min`.
///
/// An optional leading sign applies to the whole expression.
pub fn parse_offset(value: &str) -> Option<TimeDelta> {
    let value = value.trim();
    let (negative, body) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value.strip_prefix('+').unwrap_or(value)),
    };

    let mut chars = body.chars().peekable();
    let mut total = TimeDelta::zero();
    let mut components = 0;

    loop {
        while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut number = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_digit() || ch == '.' {
                number.push(ch);
                chars.next();
            } else {
                break;
            }
        }
        while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
            chars.next();
        }
        let mut unit = String::new();
        while let Some(ch) = chars.peek().copied() {
            if ch.is_ascii_alphabetic() {
                unit.push(ch);
                chars.next();
            } else {
                break;
            }
        }

        if number.is_empty() || unit.is_empty() {
            return None;
        }
        let amount: f64 = number.parse().ok()?;
        let nanos_per_unit = unit_nanos(&unit)?;
        let nanos = amount * nanos_per_unit as f64;
        if !nanos.is_finite() || nanos.abs() > i64::MAX as f64 {
            return None;
        }
        total = total.checked_add(&TimeDelta::nanoseconds(nanos.round() as i64))?;
        components += 1;
    }

    if components == 0 {
        return None;
    }
    Some(if negative { -total } else { total })
}

fn unit_nanos(unit: &str) -> Option<i64> {
    const SECOND: i64 = 1_000_000_000;
    let nanos = match unit {
        "ns" | "N" => 1,
        "us" | "U" => 1_000,
        "ms" | "L" => 1_000_000,
        "s" | "S" | "sec" | "secs" | "second" | "seconds" => SECOND,
        "m" | "T" | "min" | "mins" | "minute" | "minutes" => 60 * SECOND,
        "h" | "H" | "hour" | "hours" => 3_600 * SECOND,
        "d" | "D" | "day" | "days" => 86_400 * SECOND,
        "w" | "W" | "week" | "weeks" => 7 * 86_400 * SECOND,
        _ => return None,
    };
    Some(nanos)
}

/// Sub-second precision used when drawing or encoding timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Seconds,
    #[default]
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimeUnit {
    /// Timestamp expressed as whole units since the Unix epoch.
    pub fn to_units(&self, value: NaiveDateTime) -> Option<i64> {
        let utc = value.and_utc();
        match self {
            TimeUnit::Seconds => Some(utc.timestamp()),
            TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
            TimeUnit::Microseconds => Some(utc.timestamp_micros()),
            TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
        }
    }

    pub fn from_units(&self, units: i64) -> Option<NaiveDateTime> {
        let dt = match self {
            TimeUnit::Seconds => DateTime::from_timestamp(units, 0),
            TimeUnit::Milliseconds => DateTime::from_timestamp_millis(units),
            TimeUnit::Microseconds => DateTime::from_timestamp_micros(units),
            TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(units)),
        };
        dt.map(|dt| dt.naive_utc())
    }

    /// Length of one unit.
    pub fn delta(&self) -> TimeDelta {
        match self {
            TimeUnit::Seconds => TimeDelta::seconds(1),
            TimeUnit::Milliseconds => TimeDelta::milliseconds(1),
            TimeUnit::Microseconds => TimeDelta::microseconds(1),
            TimeUnit::Nanoseconds => TimeDelta::nanoseconds(1),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "s" | "sec" | "seconds" => Ok(TimeUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimeUnit::Milliseconds),
            "us" | "micros" | "microseconds" => Ok(TimeUnit::Microseconds),
            "ns" | "nanos" | "nanoseconds" => Ok(TimeUnit::Nanoseconds),
            other => Err(Error::UnknownTimeUnit(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_offsets() {
        assert_eq!(parse_offset("-4H"), Some(TimeDelta::hours(-4)));
        assert_eq!(parse_offset("1d12h"), Some(TimeDelta::hours(36)));
        assert_eq!(parse_offset("30 min"), Some(TimeDelta::minutes(30)));
        assert_eq!(parse_offset("+2 days"), Some(TimeDelta::days(2)));
        assert_eq!(parse_offset("1.5s"), Some(TimeDelta::milliseconds(1500)));
    }

    #[test]
    fn rejects_malformed_offsets() {
        assert_eq!(parse_offset(""), None);
        assert_eq!(parse_offset("2021-03-04"), None);
        assert_eq!(parse_offset("5"), None);
        assert_eq!(parse_offset("3 fortnights"), None);
    }

    #[test]
    fn parses_timestamp_forms() {
        let expected = NaiveDate::from_ymd_opt(2023, 3, 3)
            .and_then(|d| d.and_hms_opt(1, 2, 3))
            .unwrap();
        assert_eq!(parse_timestamp_value("2023-03-03 01:02:03"), Some(expected));
        assert_eq!(parse_timestamp_value("2023-03-03T01:02:03"), Some(expected));
        assert_eq!(parse_timestamp_value("2023-03-03T01:02:03Z"), Some(expected));
        assert_eq!(
            parse_timestamp_value("2021-03-04"),
            NaiveDate::from_ymd_opt(2021, 3, 4).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(parse_timestamp_value("-4H"), None);
    }

    #[test]
    fn invalid_format_patterns_are_rejected() {
        let ts = parse_timestamp_value("2023-03-03 01:02:03").unwrap();
        assert_eq!(format_timestamp(ts, "%Y%m%d").as_deref(), Some("20230303"));
        assert_eq!(format_timestamp(ts, "%Q"), None);
    }

    #[test]
    fn time_unit_round_trips_through_epoch() {
        let ts = parse_timestamp_value("2023-03-03 01:02:03.250").unwrap();
        let units = TimeUnit::Milliseconds.to_units(ts).unwrap();
        assert_eq!(TimeUnit::Milliseconds.from_units(units), Some(ts));
        assert_eq!(
            TimeUnit::Seconds.from_units(TimeUnit::Seconds.to_units(ts).unwrap()),
            parse_timestamp_value("2023-03-03 01:02:03")
        );
    }
}
