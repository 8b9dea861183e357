//! Column engine, tables and templates for fauxdata.
//!
//! A [`Template`] is rendered and parsed into [`Table`]s; each table seeds a
//! buffer from its row source, adds its columns in declaration order and
//! hands the result to its targets.

pub mod columns;
pub mod errors;
pub mod model;
pub mod output;
pub mod source;
pub mod table;
pub mod targets;
pub mod template;

pub use columns::{Column, ColumnKind};
pub use errors::{GenerationError, TableError, TargetError, TemplateError};
pub use model::{RunReport, RunSummary, TableOutcome, TableStatus, TableSummary};
pub use source::{CountSource, CsvRowSource, RowSource};
pub use table::{GeneratedTable, Table};
pub use targets::{ConsoleTarget, FileTarget, FileType, Target};
pub use template::{Template, resolve_named};
