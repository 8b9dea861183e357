//! Row sources seed the buffer a table's columns are generated into.

use std::fmt::Debug;
use std::path::{Path, PathBuf};

use fauxdata_core::{Frame, ROW_INDEX_COLUMN, Series, Value};

use crate::errors::GenerationError;

/// Produces the row-indexed buffer a table starts from.
pub trait RowSource: Debug {
    fn load(&self) -> Result<Frame, GenerationError>;

    /// Short description for logs and reports.
    fn describe(&self) -> String;
}

/// A fixed number of rows with only the synthetic row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountSource {
    pub rows: usize,
}

impl RowSource for CountSource {
    fn load(&self) -> Result<Frame, GenerationError> {
        Ok(Frame::with_row_index(self.rows))
    }

    fn describe(&self) -> String {
        format!("{} rows", self.rows)
    }
}

/// Rows read from a CSV file with a header row.
///
/// Every file column becomes a buffer column; cells are read as integers,
/// floats or text, and empty cells are null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvRowSource {
    pub path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn error(&self, err: impl ToString) -> GenerationError {
        GenerationError::RowSource {
            path: self.path.clone(),
            message: err.to_string(),
        }
    }
}

impl RowSource for CsvRowSource {
    fn load(&self) -> Result<Frame, GenerationError> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(|err| self.error(err))?;
        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| self.error(err))?
            .iter()
            .map(str::to_string)
            .collect();
        if headers.iter().any(|name| name == ROW_INDEX_COLUMN) {
            return Err(self.error(format!("column '{ROW_INDEX_COLUMN}' is reserved")));
        }

        let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
        for record in reader.records() {
            let record = record.map_err(|err| self.error(err))?;
            for (index, column) in columns.iter_mut().enumerate() {
                column.push(infer_cell(record.get(index).unwrap_or("")));
            }
        }

        let rows = columns.first().map(Vec::len).unwrap_or(0);
        let mut frame = Frame::with_row_index(rows);
        for (name, values) in headers.into_iter().zip(columns) {
            frame.insert(Series::new(name, values))?;
        }
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("rows from {}", self.path.display())
    }
}

fn infer_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(value) = cell.parse::<i64>() {
        return Value::Int(value);
    }
    if let Ok(value) = cell.parse::<f64>() {
        return Value::Float(value);
    }
    Value::Text(cell.to_string())
}

/// Build the source named by a table's `rows` entry.
pub fn row_source_from_yaml(
    node: &serde_yaml::Value,
    base: Option<&Path>,
) -> Result<Box<dyn RowSource>, String> {
    match node {
        serde_yaml::Value::Number(number) => number
            .as_u64()
            .and_then(|rows| usize::try_from(rows).ok())
            .map(|rows| Box::new(CountSource { rows }) as Box<dyn RowSource>)
            .ok_or_else(|| format!("rows must be a non-negative integer, got {number}")),
        serde_yaml::Value::String(path) => {
            let path = PathBuf::from(path);
            let path = match base {
                Some(base) if path.is_relative() => base.join(path),
                _ => path,
            };
            Ok(Box::new(CsvRowSource::new(path)))
        }
        other => Err(format!("rows must be an integer or a path, got {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fauxdata_core::DataType;

    #[test]
    fn count_source_builds_row_index() {
        let frame = CountSource { rows: 3 }.load().unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.column_names(), vec![ROW_INDEX_COLUMN]);
    }

    #[test]
    fn csv_source_infers_cells_and_appends_row_index() {
        let path = std::env::temp_dir().join(format!("rows-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, "id,score,label\n1,2.5,a\n2,,b\n").unwrap();

        let frame = CsvRowSource::new(&path).load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(frame.column_names(), vec![ROW_INDEX_COLUMN, "id", "score", "label"]);
        assert_eq!(frame.column("id").unwrap().dtype(), Some(DataType::Int));
        assert_eq!(
            frame.column("score").unwrap().values(),
            &[Value::Float(2.5), Value::Null]
        );
        assert_eq!(frame.column("label").unwrap().get(1), Some(&Value::from("b")));
    }

    #[test]
    fn missing_csv_reports_its_path() {
        let err = CsvRowSource::new("/nonexistent/rows.csv").load().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rows.csv"), "{err}");
    }

    #[test]
    fn rows_entry_selects_the_source() {
        let count = row_source_from_yaml(&serde_yaml::Value::from(4), None).unwrap();
        assert_eq!(count.describe(), "4 rows");
        let file =
            row_source_from_yaml(&serde_yaml::Value::from("data.csv"), Some(Path::new("/in")))
                .unwrap();
        assert_eq!(file.describe(), "rows from /in/data.csv");
        assert!(row_source_from_yaml(&serde_yaml::Value::from(-1), None).is_err());
    }
}
