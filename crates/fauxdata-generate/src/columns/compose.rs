use fauxdata_core::{DataType, Frame, Value, format_timestamp};
use rand::{Rng, RngCore};

use super::{Column, ColumnContext, Generate};
use crate::errors::GenerationError;

/// One record per row built from sibling or nested columns.
///
/// Nested `columns` are generated into a scratch copy of the buffer, so
/// their names never reach the table.
#[derive(Debug, Clone, PartialEq)]
pub struct MapColumn {
    pub source_columns: Vec<String>,
    pub columns: Vec<Column>,
    pub json: bool,
    pub drop: bool,
    /// Keep a single randomly chosen non-null field per row.
    pub select_one: bool,
}

impl MapColumn {
    fn field_names(&self) -> Vec<String> {
        if !self.source_columns.is_empty() {
            return self.source_columns.clone();
        }
        let mut names: Vec<String> = Vec::new();
        for column in &self.columns {
            if !names.contains(&column.name) {
                names.push(column.name.clone());
            }
        }
        names
    }
}

impl Generate for MapColumn {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let names = self.field_names();
        if names.is_empty() {
            return Err(GenerationError::invalid(
                "Map requires source_columns or nested columns",
            ));
        }
        let nested = !self.columns.is_empty();

        let mut records = {
            let scratch;
            let source: &Frame = if nested {
                let mut frame = ctx.frame.clone();
                for column in &self.columns {
                    column.maybe_add_column(&mut frame, rng)?;
                }
                scratch = frame;
                &scratch
            } else {
                &*ctx.frame
            };
            rows_of(source, &names, ctx.rows)?
        };

        if self.select_one {
            for (row, record) in records.iter_mut().enumerate() {
                let keep = rng.random_range(0..record.len());
                for (index, (name, value)) in record.iter_mut().enumerate() {
                    if index == keep {
                        continue;
                    }
                    *value = Value::Null;
                    if !nested {
                        ctx.frame.column_mut(name.as_str())?.values_mut()[row] = Value::Null;
                    }
                }
            }
        }

        if self.drop && !nested {
            ctx.frame.drop_columns(&names)?;
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let value = Value::Struct(record);
                if self.json {
                    Value::Text(value.to_string())
                } else {
                    value
                }
            })
            .collect())
    }
}

fn rows_of(
    frame: &Frame,
    names: &[String],
    rows: usize,
) -> Result<Vec<Vec<(String, Value)>>, GenerationError> {
    let columns = names
        .iter()
        .map(|name| frame.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((0..rows)
        .map(|row| {
            columns
                .iter()
                .map(|series| {
                    (
                        series.name().to_string(),
                        series.get(row).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect()
        })
        .collect())
}

/// One ordered list per row from named sibling columns.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayColumn {
    pub source_columns: Vec<String>,
    pub drop_nulls: bool,
    pub drop: bool,
}

impl Generate for ArrayColumn {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        if self.source_columns.is_empty() {
            return Err(GenerationError::invalid("Array requires source_columns"));
        }
        let values = rows_of(ctx.frame, &self.source_columns, ctx.rows)?
            .into_iter()
            .map(|record| {
                Value::List(
                    record
                        .into_iter()
                        .map(|(_, value)| value)
                        .filter(|value| !(self.drop_nulls && value.is_null()))
                        .collect(),
                )
            })
            .collect();
        if self.drop {
            ctx.frame.drop_columns(&self.source_columns)?;
        }
        Ok(values)
    }
}

/// Look each source value up in a literal mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MapValues {
    pub source_column: String,
    pub values: Vec<(Value, Value)>,
    /// Used for unmapped inputs; null when absent.
    pub default: Option<Value>,
}

impl Generate for MapValues {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let source = ctx.frame.column(&self.source_column)?;
        Ok(source
            .values()
            .iter()
            .map(|input| {
                self.values
                    .iter()
                    .find(|(from, _)| from.matches(input))
                    .map(|(_, to)| to.clone())
                    .or_else(|| self.default.clone())
                    .unwrap_or(Value::Null)
            })
            .collect())
    }
}

/// Date part of a timestamp column, as a date, text or integer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractDate {
    pub source_column: String,
    pub date_format: Option<String>,
}

impl Generate for ExtractDate {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError> {
        let data_type = ctx.data_type.unwrap_or(DataType::Date);
        let source = ctx.frame.column(&self.source_column)?;
        source
            .values()
            .iter()
            .map(|value| {
                if value.is_null() {
                    return Ok(Value::Null);
                }
                let timestamp = value.to_timestamp()?;
                match data_type {
                    DataType::Date => Ok(Value::Date(timestamp.date())),
                    DataType::String => self.format(timestamp, "%Y-%m-%d").map(Value::Text),
                    DataType::Int => {
                        let text = self.format(timestamp, "%Y%m%d")?;
                        text.parse::<i64>().map(Value::Int).map_err(|_| {
                            GenerationError::invalid(format!(
                                "date [{text}] does not encode as an integer"
                            ))
                        })
                    }
                    other => Err(GenerationError::invalid(format!(
                        "ExtractDate does not support data type [{other}]"
                    ))),
                }
            })
            .collect()
    }
}

impl ExtractDate {
    fn format(
        &self,
        timestamp: chrono::NaiveDateTime,
        default: &str,
    ) -> Result<String, GenerationError> {
        let format = self.date_format.as_deref().unwrap_or(default);
        format_timestamp(timestamp, format)
            .ok_or_else(|| GenerationError::invalid(format!("invalid date_format [{format}]")))
    }
}
