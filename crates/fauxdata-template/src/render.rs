use std::collections::HashMap;
use std::error::Error as StdError;

use chrono::{Local, NaiveDate, NaiveDateTime};
use fauxdata_core::{parse_offset, parse_timestamp_value};
use rand::Rng;
use regex::Regex;
use serde_json::Value as JsonValue;
use tera::{Context, Tera};
use tracing::debug;

use crate::errors::RenderError;
use crate::period::{TimeWindow, resolve_time_period};
use crate::variables::{Variables, resolve_variables};

/// Timestamp layout of builtin variables; Tera's `date` filter reads it back.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output of a full render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub variables: Variables,
    pub window: TimeWindow,
}

/// Renders template text against builtin, declared and runtime variables.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenderer {
    now: Option<NaiveDateTime>,
}

impl TemplateRenderer {
    /// Renderer reading the local clock at render time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with a frozen "now".
    pub fn with_now(now: NaiveDateTime) -> Self {
        Self { now: Some(now) }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now.unwrap_or_else(|| Local::now().naive_local())
    }

    /// Render `template` strictly: every placeholder must resolve.
    ///
    /// `start` and `end` are consumed by the time window and never reach the
    /// variable mapping as runtime values.
    pub fn render(&self, template: &str, params: &Variables) -> Result<Rendered, RenderError> {
        let now = self.now();
        let mut runtime = params.clone();
        let start = runtime.remove("start").and_then(param_text);
        let end = runtime.remove("end").and_then(param_text);
        let window = resolve_time_period(start.as_deref(), end.as_deref(), now)?;

        let variables = resolve_variables(template, builtin_variables(now, &window), runtime)?;
        debug!(variables = ?variables, "resolved template variables");

        let mut tera = engine();
        let text = render_text(&mut tera, template, &variables, "template")?;
        Ok(Rendered {
            text,
            variables,
            window,
        })
    }
}

/// Variables every template can reference without declaring them.
pub fn builtin_variables(now: NaiveDateTime, window: &TimeWindow) -> Variables {
    let today = now.date();
    let utcnow = now
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.naive_utc())
        .unwrap_or(now);

    let mut variables = Variables::new();
    variables.insert("now".into(), timestamp_text(now));
    variables.insert("utcnow".into(), timestamp_text(utcnow));
    variables.insert("nowint".into(), JsonValue::from(epoch_seconds(now)));
    variables.insert("today".into(), date_text(today));
    variables.insert(
        "tomorrow".into(),
        date_text(today.succ_opt().unwrap_or(today)),
    );
    variables.insert(
        "yesterday".into(),
        date_text(today.pred_opt().unwrap_or(today)),
    );
    variables.insert("start".into(), timestamp_text(window.start));
    variables.insert("end".into(), timestamp_text(window.end));
    variables.insert("start_int".into(), JsonValue::from(epoch_seconds(window.start)));
    variables.insert("end_int".into(), JsonValue::from(epoch_seconds(window.end)));
    variables.insert("start_ymd".into(), date_text(window.start.date()));
    variables.insert("end_ymd".into(), date_text(window.end.date()));
    variables
}

fn timestamp_text(value: NaiveDateTime) -> JsonValue {
    JsonValue::String(value.format(TIMESTAMP_FORMAT).to_string())
}

fn date_text(value: NaiveDate) -> JsonValue {
    JsonValue::String(value.format(DATE_FORMAT).to_string())
}

fn epoch_seconds(value: NaiveDateTime) -> i64 {
    value
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.timestamp())
        .unwrap_or_else(|| value.and_utc().timestamp())
}

fn param_text(value: JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

pub(crate) fn engine() -> Tera {
    let mut tera = Tera::default();
    tera.register_function("randint", randint);
    tera.register_function("shift", shift);
    tera
}

pub(crate) fn render_text(
    tera: &mut Tera,
    text: &str,
    variables: &Variables,
    context: &str,
) -> Result<String, RenderError> {
    let mut tera_context = Context::new();
    for (key, value) in variables {
        tera_context.insert(key.as_str(), value);
    }
    tera.render_str(text, &tera_context)
        .map_err(|err| render_failure(&err, context))
}

fn render_failure(err: &tera::Error, context: &str) -> RenderError {
    let message = error_chain(err);
    match undefined_variable(&message) {
        Some(name) => RenderError::UndefinedVariable {
            name,
            context: context.to_string(),
        },
        None => RenderError::Template {
            context: context.to_string(),
            message,
        },
    }
}

fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

fn undefined_variable(message: &str) -> Option<String> {
    let re = Regex::new(r"Variable `([^`]+)` not found").ok()?;
    re.captures(message)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

fn randint(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let min = int_arg(args, "randint", "min")?;
    let max = int_arg(args, "randint", "max")?;
    if min > max {
        return Err(tera::Error::msg(format!(
            "randint: min {min} is greater than max {max}"
        )));
    }
    Ok(tera::Value::from(rand::rng().random_range(min..=max)))
}

fn shift(args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
    let ts = str_arg(args, "shift", "ts")?;
    let by = str_arg(args, "shift", "by")?;
    let base = parse_timestamp_value(&ts)
        .ok_or_else(|| tera::Error::msg(format!("shift: [{ts}] is not a timestamp")))?;
    let offset = parse_offset(&by)
        .ok_or_else(|| tera::Error::msg(format!("shift: [{by}] is not an offset")))?;
    let shifted = base
        .checked_add_signed(offset)
        .ok_or_else(|| tera::Error::msg("shift: result out of range"))?;
    let format = args
        .get("format")
        .and_then(|value| value.as_str())
        .unwrap_or(TIMESTAMP_FORMAT);
    Ok(tera::Value::String(shifted.format(format).to_string()))
}

fn int_arg(
    args: &HashMap<String, tera::Value>,
    function: &str,
    key: &str,
) -> tera::Result<i64> {
    match args.get(key) {
        Some(tera::Value::Number(number)) => number
            .as_i64()
            .ok_or_else(|| tera::Error::msg(format!("{function}: '{key}' must be an integer"))),
        Some(tera::Value::String(text)) => text
            .trim()
            .parse()
            .map_err(|_| tera::Error::msg(format!("{function}: '{key}' must be an integer"))),
        _ => Err(tera::Error::msg(format!(
            "{function}: missing integer argument '{key}'"
        ))),
    }
}

fn str_arg(
    args: &HashMap<String, tera::Value>,
    function: &str,
    key: &str,
) -> tera::Result<String> {
    match args.get(key) {
        Some(tera::Value::String(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(tera::Error::msg(format!(
            "{function}: missing argument '{key}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frozen() -> TemplateRenderer {
        TemplateRenderer::with_now(parse_timestamp_value("2021-02-02 15:05:06").unwrap())
    }

    #[test]
    fn builtins_follow_the_frozen_clock() {
        let rendered = frozen()
            .render("x: {{ today }} {{ yesterday }} {{ start }} {{ end_ymd }}", &Variables::new())
            .unwrap();
        assert_eq!(
            rendered.text,
            "x: 2021-02-02 2021-02-01 2021-02-01T00:00:00 2021-02-02"
        );
    }

    #[test]
    fn start_and_end_are_consumed_by_the_window() {
        let params: Variables = [("start".to_string(), json!("-4H"))].into_iter().collect();
        let rendered = frozen().render("w: {{ start }}/{{ end }}", &params).unwrap();
        assert_eq!(rendered.text, "w: 2021-02-02T11:05:06/2021-02-02T15:05:06");
        assert_eq!(rendered.variables.get("start"), Some(&json!("2021-02-02T11:05:06")));
    }

    #[test]
    fn date_filter_formats_window_bounds() {
        let rendered = frozen()
            .render(r#"{{ start | date(format="%Y_%m") }}"#, &Variables::new())
            .unwrap();
        assert_eq!(rendered.text, "2021_02");
    }

    #[test]
    fn missing_variable_is_fatal_and_named() {
        let template =
            "tables:\n  - name: t\n    targets:\n      - t: out File csv /tmp/x.{{fileext}}\n";
        let err = frozen().render(template, &Variables::new()).unwrap_err();
        assert!(
            matches!(&err, RenderError::UndefinedVariable { name, .. } if name == "fileext"),
            "{err}"
        );
        assert!(err.to_string().contains("fileext"));
    }

    #[test]
    fn builtin_functions() {
        let rendered = frozen()
            .render(
                r#"{{ shift(ts=start, by="36h") }} {{ randint(min=4, max=4) }}"#,
                &Variables::new(),
            )
            .unwrap();
        assert_eq!(rendered.text, "2021-02-02T12:00:00 4");
    }

    #[test]
    fn randint_rejects_inverted_bounds() {
        let err = frozen()
            .render("{{ randint(min=5, max=1) }}", &Variables::new())
            .unwrap_err();
        assert!(err.to_string().contains("greater than max"), "{err}");
    }
}
