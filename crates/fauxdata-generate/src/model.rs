use serde::{Deserialize, Serialize};

use crate::errors::TableError;
use crate::table::GeneratedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableStatus {
    Complete,
    Failed,
}

/// Serializable summary of one table in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    pub table: String,
    pub status: TableStatus,
    pub rows: usize,
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Serializable form of a whole run, written by `fauxdata run --report`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub duration_ms: u64,
    pub tables: Vec<TableSummary>,
}

/// What happened to one table.
#[derive(Debug)]
pub struct TableOutcome {
    pub table: String,
    pub result: Result<GeneratedTable, TableError>,
}

impl TableOutcome {
    pub fn status(&self) -> TableStatus {
        match self.result {
            Ok(_) => TableStatus::Complete,
            Err(_) => TableStatus::Failed,
        }
    }

    pub fn summary(&self) -> TableSummary {
        let (rows, columns, error) = match &self.result {
            Ok(generated) => (
                generated.frame.height(),
                generated
                    .frame
                    .column_names()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                None,
            ),
            Err(err) => (0, Vec::new(), Some(err.to_string())),
        };
        TableSummary {
            table: self.table.clone(),
            status: self.status(),
            rows,
            columns,
            error,
        }
    }
}

/// Report for a generation run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub outcomes: Vec<TableOutcome>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new(run_id: String) -> Self {
        Self {
            run_id,
            outcomes: Vec::new(),
            duration_ms: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &TableOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    pub fn tables(&self) -> impl Iterator<Item = &GeneratedTable> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    pub fn summaries(&self) -> Vec<TableSummary> {
        self.outcomes.iter().map(TableOutcome::summary).collect()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            run_id: self.run_id.clone(),
            duration_ms: self.duration_ms,
            tables: self.summaries(),
        }
    }

    /// Human-readable per-table summary.
    pub fn result(&self) -> String {
        let mut out = String::new();
        for summary in self.summaries() {
            let line = match (&summary.status, &summary.error) {
                (TableStatus::Complete, _) => format!(
                    "{}: complete ({} rows, columns: {})\n",
                    summary.table,
                    summary.rows,
                    summary.columns.join(", ")
                ),
                (TableStatus::Failed, error) => format!(
                    "{}: failed ({})\n",
                    summary.table,
                    error.as_deref().unwrap_or("unknown error")
                ),
            };
            out.push_str(&line);
        }
        out
    }

    /// The generated tables, or the first failure.
    pub fn into_result(self) -> Result<Vec<GeneratedTable>, TableError> {
        self.outcomes
            .into_iter()
            .map(|outcome| outcome.result)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GenerationError;
    use fauxdata_core::{Frame, Series, Value};

    fn report() -> RunReport {
        let mut report = RunReport::new("run".into());
        report.outcomes.push(TableOutcome {
            table: "users".into(),
            result: Ok(GeneratedTable {
                name: "users".into(),
                frame: Frame::from_columns(vec![Series::new("id", vec![Value::Int(1)])]).unwrap(),
            }),
        });
        report.outcomes.push(TableOutcome {
            table: "orders".into(),
            result: Err(TableError::Generation {
                table: "orders".into(),
                source: GenerationError::invalid("boom"),
            }),
        });
        report
    }

    #[test]
    fn result_lists_every_table() {
        let text = report().result();
        assert!(text.contains("users: complete (1 rows, columns: id)"), "{text}");
        assert!(text.contains("orders: failed (error on table [orders]"), "{text}");
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn summaries_serialize_with_status() {
        let json = serde_json::to_value(report().summary()).unwrap();
        assert_eq!(json["run_id"], "run");
        assert_eq!(json["tables"][0]["status"], "Complete");
        assert_eq!(json["tables"][1]["status"], "Failed");
        assert!(json["tables"][0].get("error").is_none());
    }

    #[test]
    fn into_result_yields_first_failure() {
        let report = report();
        assert!(!report.is_success());
        assert_eq!(report.failed().count(), 1);
        let err = report.into_result().unwrap_err();
        assert_eq!(err.table(), "orders");
    }
}
