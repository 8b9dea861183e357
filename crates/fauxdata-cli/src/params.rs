//! Runtime template parameters given as `--key value` arguments.

use fauxdata_template::{Variables, split_parts};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ParamError {
    #[error("expected a --key argument, got [{0}]")]
    Positional(String),
    #[error("invalid value for --{key}: {message}")]
    Invalid { key: String, message: String },
}

/// Parameters split into the ones the CLI consumes and template variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    pub variables: Variables,
    pub seed: Option<u64>,
    pub debug: bool,
}

impl Params {
    /// Later values win, so command line arguments override settings.
    pub fn merge(mut self, other: Params) -> Params {
        self.variables.extend(other.variables);
        self.seed = other.seed.or(self.seed);
        self.debug |= other.debug;
        self
    }
}

/// Parse a whole parameter line, honouring quotes.
pub fn parse_param_line(line: &str) -> Result<Params, ParamError> {
    parse_params(&split_parts(line))
}

/// Parse `--key value`, `--key=value` and bare `--flag` (true) arguments.
///
/// `seed` and `debug` are consumed here; everything else, including
/// `start` and `end`, becomes a template variable.
pub fn parse_params<S: AsRef<str>>(args: &[S]) -> Result<Params, ParamError> {
    let mut params = Params::default();
    let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
    let mut args = args.into_iter().peekable();
    while let Some(arg) = args.next() {
        let Some(key) = arg.strip_prefix("--").filter(|key| !key.is_empty()) else {
            return Err(ParamError::Positional(arg.to_string()));
        };
        let (key, value) = match key.split_once('=') {
            Some((key, value)) => (key, Some(value.to_string())),
            None => match args.next_if(|next| !next.starts_with("--")) {
                Some(value) => (key, Some(value.to_string())),
                None => (key, None),
            },
        };
        match key {
            "seed" => {
                let value = value.unwrap_or_default();
                params.seed = Some(value.parse().map_err(|_| ParamError::Invalid {
                    key: key.to_string(),
                    message: format!("expected a non-negative integer, got [{value}]"),
                })?);
            }
            "debug" => params.debug = value.as_deref().map(is_truthy).unwrap_or(true),
            _ => {
                let value = value.map(typed_value).unwrap_or(serde_json::Value::Bool(true));
                params.variables.insert(key.replace('-', "_"), value);
            }
        }
    }
    Ok(params)
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.to_ascii_lowercase().as_str(), "false" | "0" | "no")
}

fn typed_value(value: String) -> serde_json::Value {
    if let Ok(number) = value.parse::<i64>() {
        return number.into();
    }
    match value.as_str() {
        "true" => serde_json::Value::Bool(true),
        "false" => serde_json::Value::Bool(false),
        _ => serde_json::Value::String(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_value_forms() {
        let params =
            parse_params(&["--env", "test", "--rows=5", "--dry-run", "--label", "a b"]).unwrap();
        assert_eq!(params.variables.get("env"), Some(&json!("test")));
        assert_eq!(params.variables.get("rows"), Some(&json!(5)));
        assert_eq!(params.variables.get("dry_run"), Some(&json!(true)));
        assert_eq!(params.variables.get("label"), Some(&json!("a b")));
    }

    #[test]
    fn seed_and_debug_are_consumed() {
        let params = parse_params(&["--seed", "42", "--debug", "--start", "-4H"]).unwrap();
        assert_eq!(params.seed, Some(42));
        assert!(params.debug);
        assert_eq!(params.variables.get("start"), Some(&json!("-4H")));
        assert!(!params.variables.contains_key("seed"));
    }

    #[test]
    fn negative_offsets_are_values_not_flags() {
        let params = parse_params(&["--end", "-1d"]).unwrap();
        assert_eq!(params.variables.get("end"), Some(&json!("-1d")));
    }

    #[test]
    fn quoted_values_survive_a_param_line() {
        let params = parse_param_line("--env dev --start '2021-03-04 10:00:00'").unwrap();
        assert_eq!(params.variables.get("start"), Some(&json!("2021-03-04 10:00:00")));
    }

    #[test]
    fn rejects_positional_and_bad_seed() {
        assert_eq!(
            parse_params(&["stray"]).unwrap_err(),
            ParamError::Positional("stray".into())
        );
        assert!(matches!(parse_params(&["--seed", "x"]), Err(ParamError::Invalid { .. })));
    }

    #[test]
    fn merge_prefers_later_params() {
        let base = parse_param_line("--env dev --seed 1").unwrap();
        let merged = base.merge(parse_params(&["--env", "prod"]).unwrap());
        assert_eq!(merged.variables.get("env"), Some(&json!("prod")));
        assert_eq!(merged.seed, Some(1));
    }
}
