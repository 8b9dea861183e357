//! Sinks a generated table is written to.

mod console;
mod file;

use std::fmt::Debug;

use fauxdata_template::{Entity, FieldKind, FieldSpec, ParseError, Registration};

use crate::errors::TargetError;
use crate::table::GeneratedTable;

pub use console::ConsoleTarget;
pub use file::{FileTarget, FileType};

/// Receives a generated table. The core never retries a failed save.
pub trait Target: Debug {
    fn kind(&self) -> &'static str;

    fn name(&self) -> &str;

    fn save(&self, table: &GeneratedTable) -> Result<(), TargetError>;
}

const COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Str),
    FieldSpec::new("target", FieldKind::Str),
];

static TARGET_TYPES: &[Registration<Box<dyn Target>>] = &[
    Registration {
        type_name: "File",
        fields: &[
            FieldSpec::new("filetype", FieldKind::Str),
            FieldSpec::new("filepath", FieldKind::Str),
        ],
        build: |fields| {
            let filetype: FileType = fields
                .parsed("filetype")?
                .ok_or(ParseError::MissingField {
                    field: "filetype".to_string(),
                })?;
            Ok(Box::new(FileTarget {
                name: fields.required_str("name")?,
                filetype,
                filepath: fields.required_str("filepath")?.into(),
            }))
        },
    },
    Registration {
        type_name: "Console",
        fields: &[FieldSpec::new("rows", FieldKind::Int)],
        build: |fields| {
            let rows = match fields.int("rows")? {
                None => console::DEFAULT_ROWS,
                Some(rows) => usize::try_from(rows).map_err(|_| {
                    let message = format!("expected a non-negative count, got {rows}");
                    ParseError::invalid("rows", message)
                })?,
            };
            Ok(Box::new(ConsoleTarget {
                name: fields.required_str("name")?,
                rows,
            }))
        },
    },
];

impl Entity for Box<dyn Target> {
    const FAMILY: &'static str = "target";
    const TYPE_KEY: &'static str = "target";
    const SHORT_KEY: &'static str = "t";
    const COMMON_FIELDS: &'static [FieldSpec] = COMMON_FIELDS;
    const SHORT_SKIP: &'static [&'static str] = &[];

    fn registry() -> &'static [Registration<Self>] {
        TARGET_TYPES
    }
}

/// Parse one target declaration.
pub fn parse_target(node: &serde_yaml::Value) -> Result<Box<dyn Target>, ParseError> {
    fauxdata_template::parse(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Box<dyn Target>, ParseError> {
        fauxdata_template::parse_from_yaml(text)
    }

    #[test]
    fn shorthand_file_target() {
        let target = parse("t: out File csv /tmp/out.csv").unwrap();
        assert_eq!(target.kind(), "File");
        assert_eq!(target.name(), "out");
        assert_eq!(
            format!("{target:?}"),
            format!(
                "{:?}",
                FileTarget {
                    name: "out".into(),
                    filetype: FileType::Csv,
                    filepath: "/tmp/out.csv".into(),
                }
            )
        );
    }

    #[test]
    fn keyed_console_target_defaults_rows() {
        let target = parse("{name: screen, target: Console}").unwrap();
        assert_eq!(target.kind(), "Console");
        assert!(format!("{target:?}").contains("rows: 10"));
    }

    #[test]
    fn unknown_filetype_names_the_target() {
        let err = parse("t: out File parquet /tmp/out.parquet").unwrap_err().to_string();
        assert!(err.contains("target [out]"), "{err}");
        assert!(err.contains("parquet"), "{err}");
    }

    #[test]
    fn unknown_target_type_is_rejected() {
        let err = parse("t: out Bucket").unwrap_err().to_string();
        assert!(err.contains("could not find target type named [Bucket]"), "{err}");
    }
}
