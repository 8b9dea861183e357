use std::collections::BTreeMap;

use regex::Regex;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::errors::RenderError;
use crate::render::{engine, render_text};

/// Flat variable mapping handed to the template engine.
pub type Variables = BTreeMap<String, JsonValue>;

/// Lines of the `variables:` block, trimmed, without blanks or comments.
pub fn extract_variable_lines(template: &str) -> Vec<String> {
    let Some(re) = Regex::new(r"(?ms)^variables:(.*?)^tables:").ok() else {
        return Vec::new();
    };
    let Some(block) = re.captures(template).and_then(|captures| captures.get(1)) else {
        return Vec::new();
    };
    block
        .as_str()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Resolve the template's `variables:` block on top of builtin and runtime values.
///
/// Runtime values overlay builtins. Each declared line is rendered against
/// the mapping built so far and only added when its key is not yet present,
/// so runtime values suppress the template's own defaults while later lines
/// still see them.
pub fn resolve_variables(
    template: &str,
    builtin: Variables,
    runtime: Variables,
) -> Result<Variables, RenderError> {
    let mut variables = builtin;
    variables.extend(runtime);

    let mut tera = engine();
    for line in extract_variable_lines(template) {
        let rendered = render_text(
            &mut tera,
            &line,
            &variables,
            &format!("variable line [{line}]"),
        )?;
        let (key, value) = parse_variable_line(&line, &rendered)?;
        if variables.contains_key(&key) {
            debug!(variable = %key, "variable already defined; keeping existing value");
            continue;
        }
        variables.insert(key, value);
    }

    Ok(variables)
}

fn parse_variable_line(line: &str, rendered: &str) -> Result<(String, JsonValue), RenderError> {
    let malformed = |message: String| RenderError::VariableLine {
        line: line.to_string(),
        message,
    };

    let mapping: serde_yaml::Mapping =
        serde_yaml::from_str(rendered).map_err(|err| malformed(err.to_string()))?;
    if mapping.len() != 1 {
        return Err(malformed(format!(
            "expected exactly one key, found {}",
            mapping.len()
        )));
    }
    let Some((key, value)) = mapping.into_iter().next() else {
        return Err(malformed("expected exactly one key".to_string()));
    };
    let Some(key) = key.as_str().map(str::to_string) else {
        return Err(malformed("variable names must be strings".to_string()));
    };
    let value = serde_json::to_value(&value).map_err(|err| malformed(err.to_string()))?;
    Ok((key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TEMPLATE: &str = "\
variables:
  env: dev
  dataset: {{env}}_users
  table: {{dataset}}.mytable
tables:
  - name: users
    rows: 1
";

    fn vars(pairs: &[(&str, JsonValue)]) -> Variables {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn extracts_declared_lines_only() {
        assert_eq!(
            extract_variable_lines(TEMPLATE),
            vec!["env: dev", "dataset: {{env}}_users", "table: {{dataset}}.mytable"]
        );
        assert!(extract_variable_lines("tables:\n  - name: a\n").is_empty());
    }

    #[test]
    fn later_lines_see_earlier_values() {
        let resolved = resolve_variables(TEMPLATE, Variables::new(), Variables::new()).unwrap();
        assert_eq!(
            resolved,
            vars(&[
                ("env", json!("dev")),
                ("dataset", json!("dev_users")),
                ("table", json!("dev_users.mytable")),
            ])
        );
    }

    #[test]
    fn runtime_values_win_and_propagate() {
        let resolved = resolve_variables(
            TEMPLATE,
            Variables::new(),
            vars(&[("env", json!("test"))]),
        )
        .unwrap();
        assert_eq!(
            resolved,
            vars(&[
                ("env", json!("test")),
                ("dataset", json!("test_users")),
                ("table", json!("test_users.mytable")),
            ])
        );
    }

    #[test]
    fn undeclared_runtime_values_pass_through() {
        let resolved = resolve_variables(
            TEMPLATE,
            vars(&[("today", json!("2021-02-02"))]),
            vars(&[("region", json!("eu"))]),
        )
        .unwrap();
        assert_eq!(resolved.get("region"), Some(&json!("eu")));
        assert_eq!(resolved.get("today"), Some(&json!("2021-02-02")));
        assert_eq!(resolved.get("table"), Some(&json!("dev_users.mytable")));
    }

    #[test]
    fn comments_are_skipped_and_scalars_keep_their_type() {
        let template = "variables:\n  # sizes\n  rows: 25\n  ratio: 0.5\ntables: []\n";
        let resolved = resolve_variables(template, Variables::new(), Variables::new()).unwrap();
        assert_eq!(resolved, vars(&[("rows", json!(25)), ("ratio", json!(0.5))]));
    }

    #[test]
    fn undefined_reference_names_the_line() {
        let template = "variables:\n  path: {{ missing }}/out\ntables: []\n";
        let err = resolve_variables(template, Variables::new(), Variables::new()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("missing"), "{message}");
        assert!(message.contains("path:"), "{message}");
    }

    #[test]
    fn multi_key_line_is_malformed() {
        let template = "variables:\n  a: {x: 1, y: 2}\n  {b: 1, c: 2}\ntables: []\n";
        let err = resolve_variables(template, Variables::new(), Variables::new()).unwrap_err();
        assert!(matches!(err, RenderError::VariableLine { .. }), "{err}");
    }
}
