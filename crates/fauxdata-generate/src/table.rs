//! A table declaration: row source, ordered columns, targets and projection.

use std::path::Path;
use std::time::Instant;

use fauxdata_core::{Frame, ROW_INDEX_COLUMN};
use fauxdata_template::ParseError;
use rand::RngCore;
use serde_yaml::{Mapping, Value as YamlValue};
use tracing::{info, warn};

use crate::columns::Column;
use crate::errors::{GenerationError, TableError};
use crate::source::{RowSource, row_source_from_yaml};
use crate::targets::{Target, parse_target};

const TABLE_KEYS: &[&str] = &["name", "rows", "columns", "targets", "output_columns"];

/// The buffer produced by a successful `generate`.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedTable {
    pub name: String,
    pub frame: Frame,
}

#[derive(Debug)]
pub struct Table {
    pub name: String,
    pub rows: Box<dyn RowSource>,
    pub columns: Vec<Column>,
    pub targets: Vec<Box<dyn Target>>,
    pub output_columns: Option<Vec<String>>,
}

impl Table {
    /// Parse a table document. Relative row-source paths resolve against `base`.
    pub fn parse(node: &YamlValue, base: Option<&Path>) -> Result<Table, TableError> {
        let mapping = node.as_mapping();
        let name = mapping
            .and_then(|m| m.get("name"))
            .and_then(YamlValue::as_str)
            .unwrap_or("<unnamed>")
            .to_string();
        let Some(mapping) = mapping else {
            return Err(parsing(&name, ParseError::NotAMapping { family: "table" }));
        };
        parse_table(mapping, base).map_err(|source| parsing(&name, source))
    }

    pub fn parse_from_yaml(text: &str) -> Result<Table, TableError> {
        let node: YamlValue = serde_yaml::from_str(text)
            .map_err(|err| parsing("<unnamed>", ParseError::from(err)))?;
        Table::parse(&node, None)
    }

    /// Build the buffer: seed rows, add columns in order, drop the row index,
    /// then project onto `output_columns`.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Result<GeneratedTable, TableError> {
        let started = Instant::now();
        let frame = self.build(rng).map_err(|source| TableError::Generation {
            table: self.name.clone(),
            source,
        })?;
        info!(
            table = %self.name,
            rows = frame.height(),
            columns = frame.width(),
            duration_ms = started.elapsed().as_millis() as u64,
            "table generated"
        );
        Ok(GeneratedTable {
            name: self.name.clone(),
            frame,
        })
    }

    fn build(&self, rng: &mut dyn RngCore) -> Result<Frame, GenerationError> {
        let mut frame = self.rows.load()?;
        for column in &self.columns {
            column.maybe_add_column(&mut frame, rng)?;
        }
        if frame.contains(ROW_INDEX_COLUMN) {
            frame.remove(ROW_INDEX_COLUMN)?;
        }
        match &self.output_columns {
            Some(names) => frame.select(names).map_err(GenerationError::Projection),
            None => Ok(frame),
        }
    }

    /// Hand the table to every target in order; the first failure stops the rest.
    pub fn load(&self, table: &GeneratedTable) -> Result<(), TableError> {
        if self.targets.is_empty() {
            warn!(table = %self.name, "no targets configured");
            return Ok(());
        }
        for target in &self.targets {
            target.save(table).map_err(|source| TableError::Loading {
                table: self.name.clone(),
                target: target.name().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// `generate` then `load`; a generation failure skips loading.
    pub fn run(&self, rng: &mut dyn RngCore) -> Result<GeneratedTable, TableError> {
        let table = self.generate(rng)?;
        self.load(&table)?;
        Ok(table)
    }
}

fn parsing(table: &str, source: ParseError) -> TableError {
    TableError::Parsing {
        table: table.to_string(),
        source,
    }
}

fn parse_table(mapping: &Mapping, base: Option<&Path>) -> Result<Table, ParseError> {
    for key in mapping.keys() {
        match key.as_str() {
            Some(name) if TABLE_KEYS.contains(&name) => {}
            _ => {
                return Err(ParseError::UnexpectedField {
                    field: key.as_str().map(str::to_string).unwrap_or_else(|| format!("{key:?}")),
                });
            }
        }
    }

    let name = mapping
        .get("name")
        .and_then(YamlValue::as_str)
        .ok_or_else(|| ParseError::MissingField {
            field: "name".to_string(),
        })?
        .to_string();
    let rows = mapping.get("rows").ok_or_else(|| ParseError::MissingField {
        field: "rows".to_string(),
    })?;
    let rows = row_source_from_yaml(rows, base)
        .map_err(|message| ParseError::invalid("rows", message))?;

    let columns = match mapping.get("columns") {
        None | Some(YamlValue::Null) => Vec::new(),
        Some(YamlValue::Sequence(items)) => {
            items.iter().map(Column::parse).collect::<Result<_, _>>()?
        }
        Some(_) => return Err(ParseError::invalid("columns", "expected a list of columns")),
    };

    let targets = match mapping.get("targets") {
        None | Some(YamlValue::Null) => Vec::new(),
        Some(YamlValue::Sequence(items)) => {
            items.iter().map(parse_target).collect::<Result<_, _>>()?
        }
        Some(node @ YamlValue::Mapping(_)) => vec![parse_target(node)?],
        Some(_) => return Err(ParseError::invalid("targets", "expected a list of targets")),
    };

    let output_columns = match mapping.get("output_columns") {
        None | Some(YamlValue::Null) => None,
        Some(YamlValue::Sequence(items)) => Some(
            items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| {
                            ParseError::invalid("output_columns", "expected column names")
                        })
                })
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(_) => {
            return Err(ParseError::invalid(
                "output_columns",
                "expected a list of column names",
            ));
        }
    };

    Ok(Table {
        name,
        rows,
        columns,
        targets,
        output_columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fauxdata_core::Value;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    #[test]
    fn row_index_is_dropped() {
        let table = Table::parse_from_yaml(
            "
name: t
rows: 3
columns:
  - col: id Sequential Int 1
",
        )
        .unwrap();
        let generated = table.generate(&mut rng()).unwrap();
        assert_eq!(generated.frame.column_names(), vec!["id"]);
        assert_eq!(generated.frame.height(), 3);
    }

    #[test]
    fn output_columns_project_in_order() {
        let table = Table::parse_from_yaml(
            "
name: t
rows: 2
columns:
  - col: col1 Fixed Int 1
  - col: col2 Fixed String x
output_columns: [col2]
",
        )
        .unwrap();
        let generated = table.generate(&mut rng()).unwrap();
        assert_eq!(generated.frame.column_names(), vec!["col2"]);
        assert_eq!(generated.frame.column("col2").unwrap().get(0), Some(&Value::from("x")));
    }

    #[test]
    fn unknown_projection_column_fails_generation() {
        let table = Table::parse_from_yaml(
            "{name: t, rows: 1, columns: [{col: a Fixed Int 1}], output_columns: [zzz]}",
        )
        .unwrap();
        let err = table.generate(&mut rng()).unwrap_err();
        assert!(matches!(err, TableError::Generation { .. }));
        assert!(err.to_string().contains("zzz"), "{err}");
    }

    #[test]
    fn unknown_table_key_is_a_parse_error() {
        let err = Table::parse_from_yaml("{name: t, rows: 1, colums: []}").unwrap_err();
        assert_eq!(err.table(), "t");
        assert!(err.to_string().contains("unexpected field 'colums'"), "{err}");
    }

    #[test]
    fn nested_parse_errors_name_the_table_and_column() {
        let err = Table::parse_from_yaml("{name: users, rows: 1, columns: [{col: id Fixed}]}")
            .unwrap_err()
            .to_string();
        assert!(err.contains("table [users]"), "{err}");
        assert!(err.contains("column [id]"), "{err}");
        assert!(err.contains("missing required field 'value'"), "{err}");
    }

    #[test]
    fn single_target_mapping_is_accepted() {
        let table =
            Table::parse_from_yaml("{name: t, rows: 1, targets: {t: out Console}}").unwrap();
        assert_eq!(table.targets.len(), 1);
    }

    #[test]
    fn load_without_targets_is_a_no_op() {
        let table = Table::parse_from_yaml("{name: t, rows: 1}").unwrap();
        let generated = table.run(&mut rng()).unwrap();
        assert_eq!(generated.frame.width(), 0);
    }
}
