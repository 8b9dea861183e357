use std::path::PathBuf;

use fauxdata_template::{ParseError, RenderError};
use thiserror::Error;

/// Failures while producing a column's values.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("error on column [{column}]. Caused by: {source}")]
    Column {
        column: String,
        source: Box<GenerationError>,
    },
    #[error("{0}")]
    Value(#[from] fauxdata_core::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("output_columns projection failed: {0}")]
    Projection(#[source] fauxdata_core::Error),
    #[error("failed to read rows from {path}: {message}")]
    RowSource { path: PathBuf, message: String },
}

impl GenerationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        GenerationError::Invalid(message.into())
    }
}

/// Failures raised by a sink.
#[derive(Debug, Error)]
pub enum TargetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A table-level failure naming the table and the phase it failed in.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("error on table [{table}] while parsing. Caused by: {source}")]
    Parsing { table: String, source: ParseError },
    #[error("error on table [{table}] while generating. Caused by: {source}")]
    Generation {
        table: String,
        source: GenerationError,
    },
    #[error("error on table [{table}] while loading target [{target}]. Caused by: {source}")]
    Loading {
        table: String,
        target: String,
        source: TargetError,
    },
}

impl TableError {
    pub fn table(&self) -> &str {
        match self {
            TableError::Parsing { table, .. }
            | TableError::Generation { table, .. }
            | TableError::Loading { table, .. } => table,
        }
    }
}

/// Failures of the top-level template entry points.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("template is not valid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid template document: {0}")]
    Document(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid base64 template: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("template is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
