use chrono::TimeDelta;
use fauxdata_core::{DataType, Value, parse_offset};
use rand::RngCore;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::seq::IndexedRandom;

use super::{ColumnContext, Generate};
use crate::errors::GenerationError;

/// The same literal in every row.
#[derive(Debug, Clone, PartialEq)]
pub struct Fixed {
    pub value: Value,
}

impl Generate for Fixed {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        Ok(vec![self.value.clone(); ctx.rows])
    }
}

/// All-null column carrying the declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Empty;

impl Generate for Empty {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        Ok(vec![Value::Null; ctx.rows])
    }
}

/// Draw with replacement from `values`, optionally weighted.
///
/// Weights shorter than the value list repeat from the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub values: Vec<Value>,
    pub weights: Vec<Value>,
}

impl Generate for Selection {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        if self.values.is_empty() {
            return Err(GenerationError::invalid("Selection requires at least one value"));
        }

        if self.weights.is_empty() {
            let mut values = Vec::with_capacity(ctx.rows);
            for _ in 0..ctx.rows {
                values.push(self.values.choose(rng).cloned().unwrap_or(Value::Null));
            }
            return Ok(values);
        }

        let weights = self
            .weights
            .iter()
            .cycle()
            .take(self.values.len())
            .map(Value::to_f64)
            .collect::<Result<Vec<_>, _>>()?;
        let index = WeightedIndex::new(&weights)
            .map_err(|err| GenerationError::invalid(format!("invalid Selection weights: {err}")))?;
        Ok((0..ctx.rows)
            .map(|_| self.values[index.sample(rng)].clone())
            .collect())
    }
}

/// Round-robin over `values` in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesValues {
    pub values: Vec<Value>,
}

impl Generate for SeriesValues {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        if self.values.is_empty() {
            return Err(GenerationError::invalid("Series requires at least one value"));
        }
        Ok(self.values.iter().cycle().take(ctx.rows).cloned().collect())
    }
}

/// Arithmetic progression, or a fixed-frequency range for temporal types.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequential {
    pub start: Option<Value>,
    pub step: Option<Value>,
}

const DEFAULT_TEMPORAL_STEP: &str = "1d";

impl Generate for Sequential {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        match ctx.data_type.unwrap_or(DataType::Int) {
            DataType::Int => {
                let start = self.start.as_ref().map(Value::to_i64).transpose()?.unwrap_or(0);
                let step = self.step.as_ref().map(Value::to_i64).transpose()?.unwrap_or(1);
                Ok((0..ctx.rows)
                    .map(|row| Value::Int(start.saturating_add((row as i64).saturating_mul(step))))
                    .collect())
            }
            DataType::Float => {
                let start = self.start.as_ref().map(Value::to_f64).transpose()?.unwrap_or(0.0);
                let step = self.step.as_ref().map(Value::to_f64).transpose()?.unwrap_or(1.0);
                Ok((0..ctx.rows)
                    .map(|row| Value::Float(start + step * row as f64))
                    .collect())
            }
            DataType::Timestamp | DataType::Date => {
                let start = self
                    .start
                    .as_ref()
                    .ok_or_else(|| {
                        GenerationError::invalid("Sequential timestamps require a start")
                    })?
                    .to_timestamp()?;
                let step = temporal_step(self.step.as_ref())?;
                let mut current = start;
                let mut values = Vec::with_capacity(ctx.rows);
                for _ in 0..ctx.rows {
                    values.push(Value::Timestamp(current));
                    current = current.checked_add_signed(step).ok_or_else(|| {
                        GenerationError::invalid("Sequential range overflows the timestamp range")
                    })?;
                }
                Ok(values)
            }
            other => Err(GenerationError::invalid(format!(
                "Sequential does not support data type [{other}]"
            ))),
        }
    }
}

fn temporal_step(step: Option<&Value>) -> Result<TimeDelta, GenerationError> {
    let text = match step {
        None => DEFAULT_TEMPORAL_STEP.to_string(),
        Some(value) => value.to_string(),
    };
    let step = parse_offset(&text).ok_or(fauxdata_core::Error::InvalidOffset(text))?;
    Ok(step)
}
