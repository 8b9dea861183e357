use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Semantic type tag attached to a column.
///
/// Each tag has one canonical in-memory representation:
/// `Int` is a nullable 64-bit integer, `Float` a 64-bit float, `String`
/// nullable text, `Timestamp` a nanosecond-precision naive datetime and
/// `Date` a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Int,
    Float,
    String,
    Bool,
    Timestamp,
    Date,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int => "Int",
            DataType::Float => "Float",
            DataType::String => "String",
            DataType::Bool => "Bool",
            DataType::Timestamp => "Timestamp",
            DataType::Date => "Date",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" | "int64" => Ok(DataType::Int),
            "float" | "float64" | "double" => Ok(DataType::Float),
            "string" | "str" | "text" => Ok(DataType::String),
            "bool" | "boolean" => Ok(DataType::Bool),
            "timestamp" | "datetime" => Ok(DataType::Timestamp),
            "date" => Ok(DataType::Date),
            _ => Err(Error::UnknownDataType(value.to_string())),
        }
    }
}
