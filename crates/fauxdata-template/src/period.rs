use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use fauxdata_core::{parse_offset, parse_timestamp_value};

use crate::errors::RenderError;

/// A `start`/`end` parameter: an absolute instant or an offset from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInput {
    Absolute(NaiveDateTime),
    Offset(TimeDelta),
}

impl TimeInput {
    /// Timestamps take precedence, so `2021-03-04` is never read as an offset.
    pub fn parse(value: &str) -> Result<Self, RenderError> {
        parse_timestamp_value(value)
            .map(TimeInput::Absolute)
            .or_else(|| parse_offset(value).map(TimeInput::Offset))
            .ok_or_else(|| RenderError::TimeInput {
                value: value.to_string(),
            })
    }
}

/// Half-open `[start, end)` window exposed to templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Resolve the generation window from optional `start`/`end` parameters.
///
/// Without parameters the window is the whole of yesterday. A single bound
/// yields a one-day window anchored on it, except that a positive `end`
/// offset or a negative `start` offset stretches between that bound and
/// `now`. Two bounds combine directly, with a relative bound measured from
/// the absolute one when the other is absolute.
pub fn resolve_time_period(
    start: Option<&str>,
    end: Option<&str>,
    now: NaiveDateTime,
) -> Result<TimeWindow, RenderError> {
    let start_input = parse_bound(start)?;
    let end_input = parse_bound(end)?;

    let day = TimeDelta::days(1);
    let zero = TimeDelta::zero();
    let shift = |base: NaiveDateTime, delta: TimeDelta| {
        base.checked_add_signed(delta)
            .ok_or_else(|| RenderError::WindowOverflow {
                start: start.unwrap_or_default().to_string(),
                end: end.unwrap_or_default().to_string(),
            })
    };

    use TimeInput::{Absolute, Offset};
    let (from, to) = match (start_input, end_input) {
        (None, None) => {
            let midnight = now.date().and_time(NaiveTime::MIN);
            (shift(midnight, -day)?, midnight)
        }
        (None, Some(Absolute(end))) => (shift(end, -day)?, end),
        (None, Some(Offset(offset))) if offset >= zero => (now, shift(now, offset)?),
        (None, Some(Offset(offset))) => {
            let end = shift(now, offset)?;
            (shift(end, -day)?, end)
        }
        (Some(Absolute(start)), None) => (start, shift(start, day)?),
        (Some(Offset(offset)), None) if offset >= zero => {
            let start = shift(now, offset)?;
            (start, shift(start, day)?)
        }
        (Some(Offset(offset)), None) => (shift(now, offset)?, now),
        (Some(Absolute(start)), Some(Absolute(end))) => (start, end),
        (Some(Offset(start)), Some(Offset(end))) => (shift(now, start)?, shift(now, end)?),
        (Some(Absolute(start)), Some(Offset(end))) => (start, shift(start, end)?),
        (Some(Offset(start)), Some(Absolute(end))) => (shift(end, start)?, end),
    };

    Ok(TimeWindow {
        start: from,
        end: to,
    })
}

fn parse_bound(value: Option<&str>) -> Result<Option<TimeInput>, RenderError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(TimeInput::parse)
        .transpose()
}
