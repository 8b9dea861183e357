//! Column declarations and the generation pipeline shared by every variant.

mod compose;
mod random;
mod simple;

use fauxdata_core::{DataType, Frame, Series, Value};
use fauxdata_template::{Entity, FieldKind, FieldSpec, Fields, ParseError, Registration};
use rand::RngCore;
use rand::seq::index::sample;
use tracing::debug;

use crate::errors::GenerationError;

pub use compose::{ArrayColumn, ExtractDate, MapColumn, MapValues};
pub use random::{MAX_STRING_LENGTH, Random, TimestampOffset};
pub use simple::{Empty, Fixed, Selection, SeriesValues, Sequential};

/// State a variant sees while producing its values.
pub struct ColumnContext<'a> {
    pub name: &'a str,
    /// Declared `data_type`, or the variant's default.
    pub data_type: Option<DataType>,
    pub rows: usize,
    pub frame: &'a mut Frame,
}

/// Produces one value per row of the buffer.
pub trait Generate {
    fn generate(
        &self,
        ctx: &mut ColumnContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<Value>, GenerationError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    Fixed(Fixed),
    Empty(Empty),
    Random(Random),
    Selection(Selection),
    Series(SeriesValues),
    Sequential(Sequential),
    Map(MapColumn),
    Array(ArrayColumn),
    MapValues(MapValues),
    ExtractDate(ExtractDate),
    TimestampOffset(TimestampOffset),
}

impl ColumnKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnKind::Fixed(_) => "Fixed",
            ColumnKind::Empty(_) => "Empty",
            ColumnKind::Random(_) => "Random",
            ColumnKind::Selection(_) => "Selection",
            ColumnKind::Series(_) => "Series",
            ColumnKind::Sequential(_) => "Sequential",
            ColumnKind::Map(_) => "Map",
            ColumnKind::Array(_) => "Array",
            ColumnKind::MapValues(_) => "MapValues",
            ColumnKind::ExtractDate(_) => "ExtractDate",
            ColumnKind::TimestampOffset(_) => "TimestampOffset",
        }
    }

    /// Type used when the declaration leaves `data_type` out.
    pub fn default_data_type(&self) -> Option<DataType> {
        match self {
            ColumnKind::Random(_) | ColumnKind::Sequential(_) => Some(DataType::Int),
            ColumnKind::ExtractDate(_) => Some(DataType::Date),
            ColumnKind::TimestampOffset(_) => Some(DataType::Timestamp),
            _ => None,
        }
    }

    fn generator(&self) -> &dyn Generate {
        match self {
            ColumnKind::Fixed(column) => column,
            ColumnKind::Empty(column) => column,
            ColumnKind::Random(column) => column,
            ColumnKind::Selection(column) => column,
            ColumnKind::Series(column) => column,
            ColumnKind::Sequential(column) => column,
            ColumnKind::Map(column) => column,
            ColumnKind::Array(column) => column,
            ColumnKind::MapValues(column) => column,
            ColumnKind::ExtractDate(column) => column,
            ColumnKind::TimestampOffset(column) => column,
        }
    }
}

/// A parsed column declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data_type: Option<DataType>,
    /// Share of rows, 0 to 100, overwritten with null after generation.
    pub null_percentage: u8,
    pub output_type: Option<DataType>,
    /// strftime pattern applied when `output_type` renders a temporal value as text.
    pub output_format: Option<String>,
    pub kind: ColumnKind,
}

impl Column {
    pub fn parse(node: &serde_yaml::Value) -> Result<Column, ParseError> {
        fauxdata_template::parse(node)
    }

    pub fn parse_from_yaml(text: &str) -> Result<Column, ParseError> {
        fauxdata_template::parse_from_yaml(text)
    }

    pub fn effective_data_type(&self) -> Option<DataType> {
        self.data_type.or_else(|| self.kind.default_data_type())
    }

    /// Generate this column into `frame`, annotating any failure with the column name.
    pub fn maybe_add_column(
        &self,
        frame: &mut Frame,
        rng: &mut dyn RngCore,
    ) -> Result<(), GenerationError> {
        self.add_column(frame, rng)
            .map_err(|source| GenerationError::Column {
                column: self.name.clone(),
                source: Box::new(source),
            })
    }

    /// Generate values, cast to the semantic type, inject nulls, then apply
    /// the output cast.
    pub fn add_column(
        &self,
        frame: &mut Frame,
        rng: &mut dyn RngCore,
    ) -> Result<(), GenerationError> {
        let data_type = self.effective_data_type();
        let rows = frame.height();
        let mut ctx = ColumnContext {
            name: &self.name,
            data_type,
            rows,
            frame: &mut *frame,
        };
        let mut values = self.kind.generator().generate(&mut ctx, rng)?;
        if values.len() != rows {
            return Err(GenerationError::invalid(format!(
                "produced {} values for {rows} rows",
                values.len()
            )));
        }

        if let Some(data_type) = data_type {
            values = cast_values(values, data_type, None)?;
        }
        inject_nulls(&mut values, self.null_percentage, rng);

        let series = match self.output_type {
            Some(output_type) => Series::typed(
                &self.name,
                Some(output_type),
                cast_values(values, output_type, self.output_format.as_deref())?,
            ),
            None if data_type.is_some() => Series::typed(&self.name, data_type, values),
            None => Series::new(&self.name, values),
        };
        debug!(
            column = %self.name,
            column_type = self.kind.type_name(),
            nulls = series.null_count(),
            "column generated"
        );
        frame.insert(series)?;
        Ok(())
    }
}

fn cast_values(
    values: Vec<Value>,
    data_type: DataType,
    format: Option<&str>,
) -> Result<Vec<Value>, GenerationError> {
    values
        .iter()
        .map(|value| value.cast_with_format(data_type, format))
        .collect::<Result<Vec<_>, _>>()
        .map_err(GenerationError::from)
}

/// Null out `percentage`% of rows chosen uniformly, independently per column.
fn inject_nulls(values: &mut [Value], percentage: u8, rng: &mut dyn RngCore) {
    if percentage == 0 || values.is_empty() {
        return;
    }
    let rows = values.len();
    let amount = (rows * usize::from(percentage.min(100)) + 50) / 100;
    for index in sample(rng, rows, amount.min(rows)) {
        values[index] = Value::Null;
    }
}

const COMMON_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", FieldKind::Str),
    FieldSpec::new("column_type", FieldKind::Str),
    FieldSpec::new("data_type", FieldKind::Str),
    FieldSpec::new("null_percentage", FieldKind::Int),
    FieldSpec::new("output_type", FieldKind::Str),
    FieldSpec::new("output_format", FieldKind::Str),
];

static COLUMN_TYPES: &[Registration<Column>] = &[
    Registration {
        type_name: "Fixed",
        fields: &[FieldSpec::new("value", FieldKind::Scalar)],
        build: |fields| {
            let data_type = declared_type(fields)?;
            let kind = ColumnKind::Fixed(Fixed {
                value: literal(fields.required_value("value")?, data_type),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Empty",
        fields: &[],
        build: |fields| column(fields, ColumnKind::Empty(Empty)),
    },
    Registration {
        type_name: "Random",
        fields: &[
            FieldSpec::new("min", FieldKind::Scalar),
            FieldSpec::new("max", FieldKind::Scalar),
            FieldSpec::new("decimal_places", FieldKind::Int),
            FieldSpec::new("time_unit", FieldKind::Str),
        ],
        build: |fields| {
            let bounds = match declared_type(fields)?.unwrap_or(DataType::Int) {
                DataType::String => Some(DataType::Int),
                other => Some(other),
            };
            let kind = ColumnKind::Random(Random {
                min: literal(fields.required_value("min")?, bounds),
                max: literal(fields.required_value("max")?, bounds),
                decimal_places: fields.int("decimal_places")?,
                time_unit: fields.parsed("time_unit")?.unwrap_or_default(),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Selection",
        fields: &[
            FieldSpec::new("values", FieldKind::List),
            FieldSpec::new("weights", FieldKind::List),
        ],
        build: |fields| {
            let kind = ColumnKind::Selection(Selection {
                values: fields.list("values")?,
                weights: fields.list("weights")?,
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Series",
        fields: &[FieldSpec::new("values", FieldKind::List)],
        build: |fields| {
            let kind = ColumnKind::Series(SeriesValues {
                values: fields.list("values")?,
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Sequential",
        fields: &[
            FieldSpec::new("start", FieldKind::Scalar),
            FieldSpec::new("step", FieldKind::Scalar),
        ],
        build: |fields| {
            let data_type = declared_type(fields)?.unwrap_or(DataType::Int);
            let step_type = data_type.is_numeric().then_some(data_type);
            let kind = ColumnKind::Sequential(Sequential {
                start: fields.value("start").map(|start| literal(start, Some(data_type))),
                step: fields.value("step").map(|step| literal(step, step_type)),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Map",
        fields: &[
            FieldSpec::new("source_columns", FieldKind::List),
            FieldSpec::new("columns", FieldKind::Entities),
            FieldSpec::new("json", FieldKind::Bool),
            FieldSpec::new("drop", FieldKind::Bool),
            FieldSpec::new("select_one", FieldKind::Bool),
        ],
        build: |fields| {
            let kind = ColumnKind::Map(MapColumn {
                source_columns: fields.str_list("source_columns")?,
                columns: fields.entities("columns")?,
                json: fields.bool("json")?.unwrap_or(false),
                drop: fields.bool("drop")?.unwrap_or(false),
                select_one: fields.bool("select_one")?.unwrap_or(false),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "Array",
        fields: &[
            FieldSpec::new("source_columns", FieldKind::List),
            FieldSpec::new("drop_nulls", FieldKind::Bool),
            FieldSpec::new("drop", FieldKind::Bool),
        ],
        build: |fields| {
            let kind = ColumnKind::Array(ArrayColumn {
                source_columns: fields.str_list("source_columns")?,
                drop_nulls: fields.bool("drop_nulls")?.unwrap_or(false),
                drop: fields.bool("drop")?.unwrap_or(false),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "MapValues",
        fields: &[
            FieldSpec::new("source_column", FieldKind::Str),
            FieldSpec::new("values", FieldKind::Mapping),
            FieldSpec::new("default", FieldKind::Scalar),
        ],
        build: |fields| {
            let data_type = declared_type(fields)?;
            let kind = ColumnKind::MapValues(MapValues {
                source_column: fields.required_str("source_column")?,
                values: fields.pairs("values")?,
                default: fields.value("default").map(|default| literal(default, data_type)),
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "ExtractDate",
        fields: &[
            FieldSpec::new("source_column", FieldKind::Str),
            FieldSpec::new("date_format", FieldKind::Str),
        ],
        build: |fields| {
            let kind = ColumnKind::ExtractDate(ExtractDate {
                source_column: fields.required_str("source_column")?,
                date_format: fields.str("date_format")?,
            });
            column(fields, kind)
        },
    },
    Registration {
        type_name: "TimestampOffset",
        fields: &[
            FieldSpec::new("source_column", FieldKind::Str),
            FieldSpec::new("min", FieldKind::Scalar),
            FieldSpec::new("max", FieldKind::Scalar),
            FieldSpec::new("time_unit", FieldKind::Str),
        ],
        build: |fields| {
            let kind = ColumnKind::TimestampOffset(TimestampOffset {
                source_column: fields.required_str("source_column")?,
                min: offset_literal(fields.required_value("min")?),
                max: offset_literal(fields.required_value("max")?),
                time_unit: fields.parsed("time_unit")?.unwrap_or_default(),
            });
            column(fields, kind)
        },
    },
];

fn declared_type(fields: &Fields<'_>) -> Result<Option<DataType>, ParseError> {
    fields.parsed("data_type")
}

/// Convert a literal to the column's type when it converts cleanly.
///
/// Shorthand tokens arrive as text and keyed values as YAML scalars; both
/// end up identical. A literal that does not convert is kept as declared
/// and fails at generation time under the column's name.
fn literal(value: Value, data_type: Option<DataType>) -> Value {
    match data_type {
        Some(data_type) => value.cast(data_type).unwrap_or(value),
        None => value,
    }
}

/// Offsets are expressions like `2h` or a bare count of `time_unit`.
fn offset_literal(value: Value) -> Value {
    match value.as_str().map(|text| text.trim().parse::<i64>()) {
        Some(Ok(count)) => Value::Int(count),
        _ => value,
    }
}

fn column(fields: &Fields<'_>, kind: ColumnKind) -> Result<Column, ParseError> {
    let null_percentage = match fields.int("null_percentage")? {
        None => 0,
        Some(value @ 0..=100) => value as u8,
        Some(value) => {
            return Err(ParseError::invalid(
                "null_percentage",
                format!("expected a value between 0 and 100, got {value}"),
            ));
        }
    };
    Ok(Column {
        name: fields.required_str("name")?,
        data_type: fields.parsed("data_type")?,
        null_percentage,
        output_type: fields.parsed("output_type")?,
        output_format: fields.str("output_format")?,
        kind,
    })
}

impl Entity for Column {
    const FAMILY: &'static str = "column";
    const TYPE_KEY: &'static str = "column_type";
    const SHORT_KEY: &'static str = "col";
    const COMMON_FIELDS: &'static [FieldSpec] = COMMON_FIELDS;
    const SHORT_SKIP: &'static [&'static str] =
        &["null_percentage", "output_type", "output_format"];

    fn registry() -> &'static [Registration<Self>] {
        COLUMN_TYPES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fauxdata_core::ROW_INDEX_COLUMN;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn generate(yaml: &str, rows: usize) -> Series {
        let column = Column::parse_from_yaml(yaml).expect("column parses");
        let mut frame = Frame::with_row_index(rows);
        column
            .maybe_add_column(&mut frame, &mut rng())
            .expect("column generates");
        frame.column(&column.name).expect("column present").clone()
    }

    #[test]
    fn shorthand_fixed_coerces_value() {
        let column = Column::parse_from_yaml("col: mycol Fixed Int 3").unwrap();
        assert_eq!(column.name, "mycol");
        assert_eq!(column.data_type, Some(DataType::Int));
        assert_eq!(
            column.kind,
            ColumnKind::Fixed(Fixed {
                value: Value::Int(3)
            })
        );
    }

    #[test]
    fn shorthand_and_keyed_columns_are_identical() {
        let short = Column::parse_from_yaml("col: mycol Random Float 1.5 2.5 2").unwrap();
        let keyed = Column::parse_from_yaml(
            "{name: mycol, column_type: Random, data_type: Float, min: 1.5, max: 2.5, decimal_places: 2}",
        )
        .unwrap();
        assert_eq!(short, keyed);
    }

    #[test]
    fn shorthand_string_literal_keeps_its_text() {
        let short = Column::parse_from_yaml("col: version Fixed String 1.10").unwrap();
        let keyed = Column::parse_from_yaml(
            "{name: version, column_type: Fixed, data_type: String, value: '1.10'}",
        )
        .unwrap();
        assert_eq!(short, keyed);
        let series = generate("col: version Fixed String 1.10", 2);
        assert_eq!(series.values(), &[Value::from("1.10"), Value::from("1.10")]);
    }

    #[test]
    fn shorthand_and_keyed_numeric_literals_agree() {
        let short = Column::parse_from_yaml("col: n Sequential Int 10 3").unwrap();
        let keyed = Column::parse_from_yaml(
            "{name: n, column_type: Sequential, data_type: Int, start: 10, step: 3}",
        )
        .unwrap();
        assert_eq!(short, keyed);

        let short =
            Column::parse_from_yaml("col: t TimestampOffset Timestamp start_ts 1 5").unwrap();
        assert!(matches!(
            &short.kind,
            ColumnKind::TimestampOffset(offset)
                if offset.min == Value::Int(1) && offset.max == Value::Int(5)
        ));
    }

    #[test]
    fn shorthand_keeps_quoted_values_whole() {
        let column = Column::parse_from_yaml("col: mycol Fixed String 'boop boop'").unwrap();
        assert_eq!(
            column.kind,
            ColumnKind::Fixed(Fixed {
                value: Value::from("boop boop")
            })
        );
    }

    #[test]
    fn shorthand_list_fields_come_from_keys() {
        let column =
            Column::parse_from_yaml("{col: mycol Selection Int, values: [4, 5]}").unwrap();
        assert_eq!(column.data_type, Some(DataType::Int));
        assert!(
            matches!(&column.kind, ColumnKind::Selection(selection)
                if selection.values == vec![Value::Int(4), Value::Int(5)])
        );
    }

    #[test]
    fn null_percentage_is_bounded() {
        let err =
            Column::parse_from_yaml("{col: x Fixed Int 1, null_percentage: 150}").unwrap_err();
        assert!(err.to_string().contains("null_percentage"), "{err}");
    }

    #[test]
    fn full_null_percentage_keeps_the_dtype() {
        let series = generate("{col: mycol Fixed Int 3, null_percentage: 100}", 5);
        assert_eq!(series.null_count(), 5);
        assert_eq!(series.dtype(), Some(DataType::Int));
    }

    #[test]
    fn partial_null_percentage_hits_the_expected_share() {
        let series = generate("{col: mycol Fixed Int 3, null_percentage: 30}", 10);
        assert_eq!(series.null_count(), 3);
        assert!(series.values().iter().all(|v| v.is_null() || *v == Value::Int(3)));
    }

    #[test]
    fn output_type_formats_temporal_values() {
        let series = generate(
            "col: day Fixed Timestamp '2023-03-03 10:00:00'\noutput_type: String\noutput_format: '%d/%m/%Y'\n",
            2,
        );
        assert_eq!(series.dtype(), Some(DataType::String));
        assert_eq!(series.values(), &[Value::from("03/03/2023"), Value::from("03/03/2023")]);
    }

    #[test]
    fn generation_errors_name_the_column() {
        let column =
            Column::parse_from_yaml("{name: mycol, column_type: Random, min: y, max: 10}").unwrap();
        let mut frame = Frame::with_row_index(3);
        let err = column.maybe_add_column(&mut frame, &mut rng()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("mycol"), "{message}");
        assert!(message.contains("invalid digit"), "{message}");
        assert_eq!(frame.column_names(), vec![ROW_INDEX_COLUMN]);
    }
}
