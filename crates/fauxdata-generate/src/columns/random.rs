use chrono::TimeDelta;
use fauxdata_core::{DataType, TimeUnit, Value, parse_offset};
use rand::{Rng, RngCore};

use super::{ColumnContext, Generate};
use crate::errors::GenerationError;

/// Upper bound on generated string length, whatever `max` says.
pub const MAX_STRING_LENGTH: usize = 4096;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Uniform draw between inclusive bounds.
///
/// Bounds are literals and only interpreted here, so `min: y` parses but
/// fails at generation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Random {
    pub min: Value,
    pub max: Value,
    pub decimal_places: Option<i64>,
    pub time_unit: TimeUnit,
}

impl Generate for Random {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let rows = ctx.rows;
        match ctx.data_type.unwrap_or(DataType::Int) {
            DataType::Int => {
                let (min, max) = ordered(self.min.to_i64()?, self.max.to_i64()?)?;
                Ok((0..rows)
                    .map(|_| Value::Int(rng.random_range(min..=max)))
                    .collect())
            }
            DataType::Float => {
                let (min, max) = ordered(self.min.to_f64()?, self.max.to_f64()?)?;
                if !(max - min).is_finite() {
                    return Err(GenerationError::invalid(format!(
                        "Random Float bounds must be finite with a finite span, got [{min}, {max}]"
                    )));
                }
                let factor = match self.decimal_places {
                    None => None,
                    Some(places @ 0..=15) => Some(10_f64.powi(places as i32)),
                    Some(places) => {
                        return Err(GenerationError::invalid(format!(
                            "decimal_places must be between 0 and 15, got {places}"
                        )));
                    }
                };
                Ok((0..rows)
                    .map(|_| {
                        let value = rng.random_range(min..=max);
                        Value::Float(match factor {
                            Some(factor) => (value * factor).round() / factor,
                            None => value,
                        })
                    })
                    .collect())
            }
            DataType::String => {
                let (min, max) = ordered(length(&self.min)?, length(&self.max)?)?;
                let (min, max) = (min.min(MAX_STRING_LENGTH), max.min(MAX_STRING_LENGTH));
                Ok((0..rows)
                    .map(|_| {
                        let len = rng.random_range(min..=max);
                        let text: String = (0..len)
                            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
                            .collect();
                        Value::Text(text)
                    })
                    .collect())
            }
            DataType::Timestamp => {
                let unit = self.time_unit;
                let bound = |value: &Value| -> Result<i64, GenerationError> {
                    unit.to_units(value.to_timestamp()?).ok_or_else(|| {
                        GenerationError::invalid(format!("[{value}] does not fit the time unit"))
                    })
                };
                let (min, max) = ordered(bound(&self.min)?, bound(&self.max)?)?;
                (0..rows)
                    .map(|_| {
                        unit.from_units(rng.random_range(min..=max))
                            .map(Value::Timestamp)
                            .ok_or_else(|| GenerationError::invalid("timestamp out of range"))
                    })
                    .collect()
            }
            DataType::Date => {
                let (min, max) = ordered(self.min.to_date()?, self.max.to_date()?)?;
                let span = (max - min).num_days();
                (0..rows)
                    .map(|_| {
                        min.checked_add_signed(TimeDelta::days(rng.random_range(0..=span)))
                            .map(Value::Date)
                            .ok_or_else(|| GenerationError::invalid("date out of range"))
                    })
                    .collect()
            }
            other => Err(GenerationError::invalid(format!(
                "data type [{other}] not supported by Random"
            ))),
        }
    }
}

fn ordered<T: PartialOrd + std::fmt::Debug>(min: T, max: T) -> Result<(T, T), GenerationError> {
    if min > max {
        return Err(GenerationError::invalid(format!(
            "min {min:?} must be <= max {max:?}"
        )));
    }
    Ok((min, max))
}

fn length(value: &Value) -> Result<usize, GenerationError> {
    let length = value.to_i64()?;
    usize::try_from(length)
        .map_err(|_| GenerationError::invalid(format!("string length must be >= 0, got {length}")))
}

/// Shift an existing timestamp column by a uniform random offset in `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampOffset {
    pub source_column: String,
    pub min: Value,
    pub max: Value,
    pub time_unit: TimeUnit,
}

impl Generate for TimestampOffset {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let unit_nanos = self
            .time_unit
            .delta()
            .num_nanoseconds()
            .unwrap_or(1)
            .max(1);
        let (min, max) = ordered(
            offset_nanos(&self.min, self.time_unit)? / unit_nanos,
            offset_nanos(&self.max, self.time_unit)? / unit_nanos,
        )?;

        let source = ctx.frame.column(&self.source_column)?;
        source
            .values()
            .iter()
            .map(|value| {
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let shift = rng
                    .random_range(min..=max)
                    .checked_mul(unit_nanos)
                    .map(TimeDelta::nanoseconds)
                    .ok_or_else(|| GenerationError::invalid("offset out of range"))?;
                value
                    .to_timestamp()?
                    .checked_add_signed(shift)
                    .map(Value::Timestamp)
                    .ok_or_else(|| GenerationError::invalid("timestamp out of range"))
            })
            .collect()
    }
}

/// An offset literal: an expression such as `-2h`, or a bare count of `unit`.
fn offset_nanos(value: &Value, unit: TimeUnit) -> Result<i64, GenerationError> {
    let delta = match value {
        Value::Int(count) => unit.delta().checked_mul(
            i32::try_from(*count)
                .map_err(|_| GenerationError::invalid(format!("offset {count} is too large")))?,
        ),
        other => parse_offset(&other.to_string()),
    };
    let nanos = delta
        .and_then(|delta| delta.num_nanoseconds())
        .ok_or_else(|| fauxdata_core::Error::InvalidOffset(value.to_string()))?;
    Ok(nanos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fauxdata_core::{Frame, Series, parse_timestamp_value};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::columns::Column;

    fn generate_into(frame: &mut Frame, yaml: &str) -> Series {
        let column = Column::parse_from_yaml(yaml).expect("column parses");
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        column.maybe_add_column(frame, &mut rng).expect("column generates");
        frame.column(&column.name).expect("column present").clone()
    }

    fn generate(yaml: &str, rows: usize) -> Series {
        generate_into(&mut Frame::with_row_index(rows), yaml)
    }

    #[test]
    fn random_int_defaults_and_stays_in_bounds() {
        let series = generate("{name: mycol, column_type: Random, min: 5, max: 8}", 50);
        assert_eq!(series.dtype(), Some(DataType::Int));
        let ints: Vec<i64> = series.values().iter().map(|v| v.to_i64().unwrap()).collect();
        assert!(ints.iter().all(|v| (5..=8).contains(v)));
        assert!(ints.contains(&5));
        assert!(ints.contains(&8));
    }

    #[test]
    fn random_float_rounds_to_decimal_places() {
        let series = generate("col: f Random Float 1.23 3.45 1", 30);
        for value in series.values() {
            let Value::Float(value) = value else {
                panic!("expected float, got {value:?}");
            };
            assert!((1.2..=3.5).contains(value));
            assert!(((value * 10.0).round() - value * 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn random_string_length_is_capped() {
        let series = generate("col: s Random String 3 100000", 5);
        for value in series.values() {
            let text = value.as_str().expect("text");
            assert!(text.len() >= 3 && text.len() <= MAX_STRING_LENGTH);
            assert!(text.chars().all(|ch| ch.is_ascii_alphabetic()));
        }
    }

    #[test]
    fn random_timestamps_respect_unit_and_bounds() {
        let series = generate(
            "col: ts Random Timestamp '2023-03-03 00:00:00' '2026-12-12 23:59:59'\ntime_unit: s\n",
            20,
        );
        let min = parse_timestamp_value("2023-03-03 00:00:00").unwrap();
        let max = parse_timestamp_value("2026-12-12 23:59:59").unwrap();
        for value in series.values() {
            let ts = value.as_timestamp().expect("timestamp");
            assert!(ts >= min && ts <= max);
            assert_eq!(ts.and_utc().timestamp_subsec_nanos(), 0);
        }
    }

    #[test]
    fn random_rejects_inverted_bounds() {
        let column = Column::parse_from_yaml("col: r Random Int 9 1").unwrap();
        let mut frame = Frame::with_row_index(2);
        let err = column
            .maybe_add_column(&mut frame, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap_err();
        assert!(err.to_string().contains("must be <= max"), "{err}");
    }

    fn generation_error(yaml: &str) -> String {
        let column = Column::parse_from_yaml(yaml).unwrap();
        let mut frame = Frame::with_row_index(2);
        generate_into(&mut frame, "col: created Fixed Timestamp '2023-01-01 00:00:00'");
        let err = column
            .maybe_add_column(&mut frame, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap_err();
        err.to_string()
    }

    #[test]
    fn random_float_rejects_non_finite_bounds() {
        for yaml in [
            "col: f Random Float nan 1",
            "col: f Random Float 0 inf",
            "col: f Random Float -inf 0",
        ] {
            let message = generation_error(yaml);
            assert!(message.contains("column [f]"), "{message}");
            assert!(message.contains("finite"), "{message}");
        }
    }

    #[test]
    fn random_float_rejects_overflowing_span() {
        let message = generation_error(
            "{name: f, column_type: Random, data_type: Float, min: -1.0e308, max: 1.0e308}",
        );
        assert!(message.contains("column [f]"), "{message}");
        assert!(message.contains("finite span"), "{message}");
    }

    #[test]
    fn random_float_accepts_wide_finite_span() {
        let series = generate(
            "{name: f, column_type: Random, data_type: Float, min: -1.0e307, max: 1.0e307}",
            5,
        );
        assert!(series.values().iter().all(|v| v.to_f64().is_ok_and(f64::is_finite)));
    }

    #[test]
    fn timestamp_offset_rejects_unparseable_offsets() {
        let message = generation_error(
            "{col: updated TimestampOffset, source_column: created, min: soon, max: 2h}",
        );
        assert!(message.contains("column [updated]"), "{message}");
        assert!(message.contains("invalid offset 'soon'"), "{message}");
    }

    #[test]
    fn timestamp_offset_shifts_within_range() {
        let mut frame = Frame::with_row_index(10);
        generate_into(&mut frame, "col: created Fixed Timestamp '2023-01-01 00:00:00'");
        let shifted = generate_into(
            &mut frame,
            "{col: updated TimestampOffset, source_column: created, min: 1h, max: 2h}",
        );
        let base = parse_timestamp_value("2023-01-01 00:00:00").unwrap();
        for value in shifted.values() {
            let delta = value.as_timestamp().unwrap() - base;
            assert!(delta >= TimeDelta::hours(1) && delta <= TimeDelta::hours(2));
        }
    }
}
