use std::fmt::Display;
use std::str::FromStr;

use fauxdata_core::Value;
use serde_yaml::{Mapping, Value as YamlValue};

use crate::errors::ParseError;
use crate::parts::split_parts;

/// How a declared field is read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Int,
    Float,
    Bool,
    /// Any YAML scalar; shorthand tokens are kept as text.
    Scalar,
    List,
    Mapping,
    /// Nested entities of the same family.
    Entities,
}

impl FieldKind {
    /// Only scalar fields can be filled from shorthand tokens.
    pub fn is_positional(self) -> bool {
        matches!(
            self,
            FieldKind::Str | FieldKind::Int | FieldKind::Float | FieldKind::Bool | FieldKind::Scalar
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// One concrete subtype of an entity family.
pub struct Registration<T> {
    pub type_name: &'static str,
    /// Subtype fields in shorthand order, after the family's common fields.
    pub fields: &'static [FieldSpec],
    pub build: fn(&Fields<'_>) -> Result<T, ParseError>,
}

/// A family of entities constructed from YAML declarations.
pub trait Entity: Sized + 'static {
    /// Label used in error messages.
    const FAMILY: &'static str;
    /// Key naming the subtype in keyed declarations.
    const TYPE_KEY: &'static str;
    /// Key holding the whitespace-separated shorthand declaration.
    const SHORT_KEY: &'static str;
    /// Fields shared by every subtype; must start with `name` then `TYPE_KEY`.
    const COMMON_FIELDS: &'static [FieldSpec];
    /// Common fields that shorthand tokens never fill.
    const SHORT_SKIP: &'static [&'static str];

    fn registry() -> &'static [Registration<Self>];
}

/// Build an entity from a YAML node.
///
/// Errors are wrapped with the family and declared name, so failures in
/// nested entities carry the whole chain of names.
pub fn parse<T: Entity>(node: &YamlValue) -> Result<T, ParseError> {
    let Some(mapping) = node.as_mapping() else {
        return Err(ParseError::NotAMapping { family: T::FAMILY });
    };
    build::<T>(mapping).map_err(|source| ParseError::Entity {
        family: T::FAMILY,
        name: declared_name::<T>(mapping),
        source: Box::new(source),
    })
}

pub fn parse_from_yaml<T: Entity>(text: &str) -> Result<T, ParseError> {
    let node: YamlValue = serde_yaml::from_str(text)?;
    parse(&node)
}

fn declared_name<T: Entity>(mapping: &Mapping) -> Option<String> {
    if let Some(name) = mapping.get("name").and_then(YamlValue::as_str) {
        return Some(name.to_string());
    }
    mapping
        .get(T::SHORT_KEY)
        .and_then(YamlValue::as_str)
        .and_then(|short| split_parts(short).into_iter().next())
}

fn build<T: Entity>(mapping: &Mapping) -> Result<T, ParseError> {
    let shorthand = match mapping.get(T::SHORT_KEY) {
        None => None,
        Some(YamlValue::String(text)) => Some(split_parts(text)),
        Some(_) => {
            return Err(ParseError::invalid(
                T::SHORT_KEY,
                "shorthand declaration must be a string",
            ));
        }
    };

    let type_name = shorthand
        .as_ref()
        .and_then(|parts| parts.get(1).cloned())
        .or_else(|| {
            mapping
                .get(T::TYPE_KEY)
                .and_then(YamlValue::as_str)
                .map(str::to_string)
        })
        .ok_or(ParseError::MissingType {
            family: T::FAMILY,
            key: T::TYPE_KEY,
            short_key: T::SHORT_KEY,
        })?;

    let registration = T::registry()
        .iter()
        .find(|registration| registration.type_name == type_name)
        .ok_or_else(|| ParseError::SubtypeNotFound {
            family: T::FAMILY,
            type_name: type_name.clone(),
        })?;
    let specs = || T::COMMON_FIELDS.iter().chain(registration.fields.iter());

    let mut fields = Mapping::new();
    if let Some(parts) = shorthand {
        let positional: Vec<&FieldSpec> = specs()
            .filter(|spec| spec.kind.is_positional() && !T::SHORT_SKIP.contains(&spec.name))
            .collect();
        if parts.len() > positional.len() {
            return Err(ParseError::TooManyValues {
                expected: positional.len(),
                found: parts.len(),
            });
        }
        for (spec, token) in positional.into_iter().zip(parts) {
            fields.insert(YamlValue::from(spec.name), coerce_token(spec, &token)?);
        }
    }

    // Keyed fields override shorthand tokens.
    for (key, value) in mapping {
        let Some(name) = key.as_str() else {
            return Err(ParseError::UnexpectedField {
                field: format!("{key:?}"),
            });
        };
        if name == T::SHORT_KEY {
            continue;
        }
        if !specs().any(|spec| spec.name == name) {
            return Err(ParseError::UnexpectedField {
                field: name.to_string(),
            });
        }
        fields.insert(key.clone(), value.clone());
    }

    (registration.build)(&Fields::new(&fields))
}

fn coerce_token(spec: &FieldSpec, token: &str) -> Result<YamlValue, ParseError> {
    let value = match spec.kind {
        FieldKind::Int => token.parse::<i64>().map(YamlValue::from).map_err(|_| {
            ParseError::invalid(spec.name, format!("expected an integer, got [{token}]"))
        })?,
        FieldKind::Float => token.parse::<f64>().map(YamlValue::from).map_err(|_| {
            ParseError::invalid(spec.name, format!("expected a number, got [{token}]"))
        })?,
        FieldKind::Bool => YamlValue::Bool(parse_bool(token).ok_or_else(|| {
            ParseError::invalid(spec.name, format!("expected true or false, got [{token}]"))
        })?),
        FieldKind::Scalar => scalar_token(token),
        _ => YamlValue::from(token),
    };
    Ok(value)
}

/// Shorthand literals stay text so the declared type decides how they
/// convert; only an explicit null marker becomes null.
fn scalar_token(token: &str) -> YamlValue {
    match token {
        "~" | "null" | "Null" | "NULL" => YamlValue::Null,
        _ => YamlValue::from(token),
    }
}

fn parse_bool(token: &str) -> Option<bool> {
    match token.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => None,
    }
}

/// Typed read access to the merged fields of one declaration.
///
/// A field set to YAML null is treated as absent, except by
/// [`Fields::required_value`].
pub struct Fields<'a> {
    mapping: &'a Mapping,
}

impl<'a> Fields<'a> {
    pub fn new(mapping: &'a Mapping) -> Self {
        Self { mapping }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.present(key).is_some()
    }

    fn present(&self, key: &str) -> Option<&'a YamlValue> {
        self.mapping.get(key).filter(|value| !value.is_null())
    }

    pub fn str(&self, key: &str) -> Result<Option<String>, ParseError> {
        match self.present(key) {
            None => Ok(None),
            Some(YamlValue::String(text)) => Ok(Some(text.clone())),
            Some(YamlValue::Number(number)) => Ok(Some(number.to_string())),
            Some(YamlValue::Bool(flag)) => Ok(Some(flag.to_string())),
            Some(_) => Err(ParseError::invalid(key, "expected a scalar")),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<String, ParseError> {
        self.str(key)?.ok_or_else(|| missing(key))
    }

    pub fn int(&self, key: &str) -> Result<Option<i64>, ParseError> {
        match self.present(key) {
            None => Ok(None),
            Some(YamlValue::Number(number)) => number
                .as_i64()
                .map(Some)
                .ok_or_else(|| {
                    ParseError::invalid(key, format!("expected an integer, got {number}"))
                }),
            Some(YamlValue::String(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| {
                    ParseError::invalid(key, format!("expected an integer, got [{text}]"))
                }),
            Some(_) => Err(ParseError::invalid(key, "expected an integer")),
        }
    }

    pub fn float(&self, key: &str) -> Result<Option<f64>, ParseError> {
        match self.present(key) {
            None => Ok(None),
            Some(YamlValue::Number(number)) => Ok(number.as_f64()),
            Some(YamlValue::String(text)) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ParseError::invalid(key, format!("expected a number, got [{text}]"))),
            Some(_) => Err(ParseError::invalid(key, "expected a number")),
        }
    }

    pub fn bool(&self, key: &str) -> Result<Option<bool>, ParseError> {
        match self.present(key) {
            None => Ok(None),
            Some(YamlValue::Bool(flag)) => Ok(Some(*flag)),
            Some(YamlValue::String(text)) => parse_bool(text)
                .map(Some)
                .ok_or_else(|| {
                    ParseError::invalid(key, format!("expected true or false, got [{text}]"))
                }),
            Some(_) => Err(ParseError::invalid(key, "expected true or false")),
        }
    }

    /// Read a string field through `FromStr`.
    pub fn parsed<T>(&self, key: &str) -> Result<Option<T>, ParseError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.str(key)?
            .map(|text| text.parse::<T>().map_err(|err| ParseError::invalid(key, err)))
            .transpose()
    }

    /// A literal value, left unvalidated until generation.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.present(key).map(Value::from_yaml)
    }

    /// A literal that must be declared; an explicit null is allowed.
    pub fn required_value(&self, key: &str) -> Result<Value, ParseError> {
        self.mapping
            .get(key)
            .map(Value::from_yaml)
            .ok_or_else(|| missing(key))
    }

    /// A sequence of literals; absent means empty.
    pub fn list(&self, key: &str) -> Result<Vec<Value>, ParseError> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(YamlValue::Sequence(items)) => Ok(items.iter().map(Value::from_yaml).collect()),
            Some(_) => Err(ParseError::invalid(key, "expected a list")),
        }
    }

    pub fn str_list(&self, key: &str) -> Result<Vec<String>, ParseError> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(YamlValue::Sequence(items)) => items
                .iter()
                .map(|item| match item {
                    YamlValue::String(text) => Ok(text.clone()),
                    YamlValue::Number(number) => Ok(number.to_string()),
                    _ => Err(ParseError::invalid(key, "expected a list of names")),
                })
                .collect(),
            Some(_) => Err(ParseError::invalid(key, "expected a list")),
        }
    }

    /// A literal-to-literal mapping in declaration order.
    pub fn pairs(&self, key: &str) -> Result<Vec<(Value, Value)>, ParseError> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(YamlValue::Mapping(map)) => Ok(map
                .iter()
                .map(|(from, to)| (Value::from_yaml(from), Value::from_yaml(to)))
                .collect()),
            Some(_) => Err(ParseError::invalid(key, "expected a mapping")),
        }
    }

    /// Nested declarations parsed through the same factory.
    pub fn entities<E: Entity>(&self, key: &str) -> Result<Vec<E>, ParseError> {
        match self.present(key) {
            None => Ok(Vec::new()),
            Some(YamlValue::Sequence(items)) => items.iter().map(parse::<E>).collect(),
            Some(_) => Err(ParseError::invalid(key, "expected a list of declarations")),
        }
    }
}

fn missing(key: &str) -> ParseError {
    ParseError::MissingField {
        field: key.to_string(),
    }
}
