use std::fmt;

use crate::error::{Error, Result};
use crate::types::DataType;
use crate::value::Value;

/// Name of the synthetic row-index column seeded into every buffer.
pub const ROW_INDEX_COLUMN: &str = "rowId";

/// A named column of cells with an optional semantic type.
///
/// The type survives even when every cell is null, so an all-null `Int`
/// column is still an `Int` column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    dtype: Option<DataType>,
    values: Vec<Value>,
}

impl Series {
    /// Build a series, inferring its type from the first non-null cell.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = infer_dtype(&values);
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn typed(name: impl Into<String>, dtype: Option<DataType>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dtype(&self) -> Option<DataType> {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_null()).count()
    }
}

fn infer_dtype(values: &[Value]) -> Option<DataType> {
    values.iter().find_map(Value::data_type)
}

/// Columnar tabular buffer with a fixed row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    height: usize,
    columns: Vec<Series>,
}

impl Frame {
    /// An empty buffer of `height` rows and no columns.
    pub fn new(height: usize) -> Self {
        Self {
            height,
            columns: Vec::new(),
        }
    }

    /// A buffer holding only the synthetic row index `0..rows`.
    pub fn with_row_index(rows: usize) -> Self {
        let mut frame = Frame::new(rows);
        frame.columns.push(row_index(rows));
        frame
    }

    /// Build a buffer from columns that must all share one length.
    pub fn from_columns(columns: Vec<Series>) -> Result<Self> {
        let height = columns.first().map(Series::len).unwrap_or(0);
        let mut frame = Frame::new(height);
        for series in columns {
            frame.insert(series)?;
        }
        Ok(frame)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Series] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Series::name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.iter().any(|series| series.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Series> {
        self.columns
            .iter()
            .find(|series| series.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Series> {
        self.columns
            .iter_mut()
            .find(|series| series.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }

    /// Insert a column, replacing any existing column of the same name in place.
    pub fn insert(&mut self, series: Series) -> Result<()> {
        if series.len() != self.height {
            return Err(Error::Length {
                name: series.name,
                expected: self.height,
                actual: series.values.len(),
            });
        }
        match self.columns.iter_mut().find(|existing| existing.name == series.name) {
            Some(existing) => *existing = series,
            None => self.columns.push(series),
        }
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Series> {
        let index = self
            .columns
            .iter()
            .position(|series| series.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))?;
        Ok(self.columns.remove(index))
    }

    pub fn drop_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        for name in names {
            self.remove(name.as_ref())?;
        }
        Ok(())
    }

    /// Project onto exactly `names`, in that order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame> {
        let mut frame = Frame::new(self.height);
        for name in names {
            frame.columns.push(self.column(name.as_ref())?.clone());
        }
        Ok(frame)
    }

    /// First `rows` rows of every column.
    pub fn head(&self, rows: usize) -> Frame {
        let height = rows.min(self.height);
        Frame {
            height,
            columns: self
                .columns
                .iter()
                .map(|series| Series {
                    name: series.name.clone(),
                    dtype: series.dtype,
                    values: series.values[..height].to_vec(),
                })
                .collect(),
        }
    }

    /// Cells of one row, paired with their column names.
    pub fn row(&self, index: usize) -> Vec<(&str, &Value)> {
        self.columns
            .iter()
            .filter_map(|series| series.get(index).map(|value| (series.name(), value)))
            .collect()
    }

    /// One struct value per row.
    pub fn records(&self) -> Vec<Value> {
        (0..self.height)
            .map(|index| {
                Value::Struct(
                    self.row(index)
                        .into_iter()
                        .map(|(name, value)| (name.to_string(), value.clone()))
                        .collect(),
                )
            })
            .collect()
    }
}

fn row_index(rows: usize) -> Series {
    Series::typed(
        ROW_INDEX_COLUMN,
        Some(DataType::Int),
        (0..rows).map(|index| Value::Int(index as i64)).collect(),
    )
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|series| series.values.iter().map(Value::to_string).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(series, column)| {
                column
                    .iter()
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(series.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(series, width)| format!("{:<width$}", series.name))
            .collect();
        writeln!(f, "{}", header.join(" | ").trim_end())?;
        let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
        writeln!(f, "{}", rule.join("-+-"))?;

        for row in 0..self.height {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(column, width)| format!("{:<width$}", column[row]))
                .collect();
            writeln!(f, "{}", line.join(" | ").trim_end())?;
        }
        Ok(())
    }
}
