use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Map, Number};

use crate::error::Error;
use crate::time::{format_timestamp, parse_date_value, parse_timestamp_value};
use crate::types::DataType;

/// A single cell of a generated table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    List(Vec<Value>),
    Struct(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Semantic type of a scalar value, `None` for null and composite values.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Bool(_) => Some(DataType::Bool),
            Value::Int(_) => Some(DataType::Int),
            Value::Float(_) => Some(DataType::Float),
            Value::Text(_) => Some(DataType::String),
            Value::Date(_) => Some(DataType::Date),
            Value::Timestamp(_) => Some(DataType::Timestamp),
            Value::Null | Value::List(_) | Value::Struct(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(value) => Some(*value),
            Value::Date(value) => Some(value.and_time(NaiveTime::MIN)),
            _ => None,
        }
    }

    /// Interpret the value as an integer, parsing text literals.
    pub fn to_i64(&self) -> Result<i64, Error> {
        match self {
            Value::Int(value) => Ok(*value),
            Value::Bool(value) => Ok(i64::from(*value)),
            Value::Float(value) if !value.is_finite() => {
                Err(self.conversion(DataType::Int, "value is not finite"))
            }
            Value::Float(value) if value.fract() != 0.0 => {
                Err(self.conversion(DataType::Int, "value has a fractional part"))
            }
            // i64::MAX rounds up to 2^63 as a float, so the upper bound is exclusive.
            Value::Float(value) if *value < i64::MIN as f64 || *value >= i64::MAX as f64 => {
                Err(self.conversion(DataType::Int, "value out of range"))
            }
            Value::Float(value) => Ok(*value as i64),
            Value::Text(text) => text
                .trim()
                .parse::<i64>()
                .map_err(|err| self.conversion(DataType::Int, err)),
            Value::Timestamp(value) => Ok(value.and_utc().timestamp()),
            _ => Err(self.conversion(DataType::Int, "unsupported source type")),
        }
    }

    pub fn to_f64(&self) -> Result<f64, Error> {
        match self {
            Value::Int(value) => Ok(*value as f64),
            Value::Float(value) => Ok(*value),
            Value::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|err| self.conversion(DataType::Float, err)),
            _ => Err(self.conversion(DataType::Float, "unsupported source type")),
        }
    }

    pub fn to_timestamp(&self) -> Result<NaiveDateTime, Error> {
        match self {
            Value::Timestamp(value) => Ok(*value),
            Value::Date(value) => Ok(value.and_time(NaiveTime::MIN)),
            Value::Text(text) => parse_timestamp_value(text).ok_or_else(|| {
                self.conversion(DataType::Timestamp, "unrecognised timestamp format")
            }),
            Value::Int(secs) => DateTime::from_timestamp(*secs, 0)
                .map(|dt| dt.naive_utc())
                .ok_or_else(|| self.conversion(DataType::Timestamp, "epoch out of range")),
            _ => Err(self.conversion(DataType::Timestamp, "unsupported source type")),
        }
    }

    pub fn to_date(&self) -> Result<NaiveDate, Error> {
        match self {
            Value::Date(value) => Ok(*value),
            Value::Timestamp(value) => Ok(value.date()),
            Value::Text(text) => parse_date_value(text)
                .or_else(|| parse_timestamp_value(text).map(|ts| ts.date()))
                .ok_or_else(|| self.conversion(DataType::Date, "unrecognised date format")),
            _ => Err(self.conversion(DataType::Date, "unsupported source type")),
        }
    }

    pub fn to_bool(&self) -> Result<bool, Error> {
        match self {
            Value::Bool(value) => Ok(*value),
            Value::Int(0) => Ok(false),
            Value::Int(1) => Ok(true),
            Value::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(self.conversion(DataType::Bool, "expected true or false")),
            },
            _ => Err(self.conversion(DataType::Bool, "unsupported source type")),
        }
    }

    /// Cast to the canonical representation of `target`. Null stays null.
    pub fn cast(&self, target: DataType) -> Result<Value, Error> {
        self.cast_with_format(target, None)
    }

    /// Cast, formatting temporal values with `format` when producing text.
    pub fn cast_with_format(&self, target: DataType, format: Option<&str>) -> Result<Value, Error> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        Ok(match target {
            DataType::Int => Value::Int(self.to_i64()?),
            DataType::Float => Value::Float(self.to_f64()?),
            DataType::Bool => Value::Bool(self.to_bool()?),
            DataType::Timestamp => Value::Timestamp(self.to_timestamp()?),
            DataType::Date => Value::Date(self.to_date()?),
            DataType::String => match (self, format) {
                (Value::Text(text), _) => Value::Text(text.clone()),
                (Value::Timestamp(_) | Value::Date(_), Some(format)) => {
                    let timestamp = self.to_timestamp()?;
                    Value::Text(format_timestamp(timestamp, format).ok_or_else(|| {
                        self.conversion(DataType::String, format!("invalid format [{format}]"))
                    })?)
                }
                (other, _) => Value::Text(other.to_string()),
            },
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(value) => serde_json::Value::Bool(*value),
            Value::Int(value) => serde_json::Value::Number((*value).into()),
            Value::Float(value) => Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(value) => serde_json::Value::String(value.clone()),
            Value::Date(_) | Value::Timestamp(_) => serde_json::Value::String(self.to_string()),
            Value::List(values) => {
                serde_json::Value::Array(values.iter().map(Value::to_json).collect())
            }
            Value::Struct(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    map.insert(key.clone(), value.to_json());
                }
                serde_json::Value::Object(map)
            }
        }
    }

    /// Convert a YAML literal from a template document.
    pub fn from_yaml(value: &serde_yaml::Value) -> Value {
        match value {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(value) => Value::Bool(*value),
            serde_yaml::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Value::Int(value)
                } else {
                    number.as_f64().map(Value::Float).unwrap_or(Value::Null)
                }
            }
            serde_yaml::Value::String(value) => Value::Text(value.clone()),
            serde_yaml::Value::Sequence(values) => {
                Value::List(values.iter().map(Value::from_yaml).collect())
            }
            serde_yaml::Value::Mapping(map) => Value::Struct(
                map.iter()
                    .map(|(key, value)| (yaml_key(key), Value::from_yaml(value)))
                    .collect(),
            ),
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }

    /// Loose equality used for lookups: same value, or same text rendering.
    pub fn matches(&self, other: &Value) -> bool {
        self == other
            || (!self.is_null() && !other.is_null() && self.to_string() == other.to_string())
    }

    fn conversion(&self, target: DataType, reason: impl fmt::Display) -> Error {
        Error::Conversion {
            value: format!("'{self}'"),
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(value) => value.clone(),
        other => Value::from_yaml(other).to_string(),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(value) => f.write_str(value),
            Value::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            Value::Timestamp(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::List(_) | Value::Struct(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}
