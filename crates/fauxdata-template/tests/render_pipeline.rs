use chrono::NaiveDate;
use fauxdata_template::{RenderError, TemplateRenderer, Variables};
use serde_json::json;

const TEMPLATE: &str = r#"
variables:
  env: dev
  dataset: {{ env }}_events
  outfile: /tmp/{{ dataset }}_{{ start | date(format="%Y%m%d") }}.csv
tables:
  - name: {{ dataset }}
    rows: 3
    columns:
      - col: day Fixed String {{ start_ymd }}
    targets:
      - t: out File csv {{ outfile }}
"#;

fn renderer() -> TemplateRenderer {
    let now = NaiveDate::from_ymd_opt(2021, 2, 2)
        .and_then(|date| date.and_hms_opt(15, 5, 6))
        .expect("valid now");
    TemplateRenderer::with_now(now)
}

#[test]
fn renders_the_whole_document() {
    let rendered = renderer()
        .render(TEMPLATE, &Variables::new())
        .expect("render");

    assert!(rendered.text.contains("- name: dev_events"));
    assert!(rendered.text.contains("col: day Fixed String 2021-02-01"));
    assert!(rendered.text.contains("t: out File csv /tmp/dev_events_20210201.csv"));

    let doc: serde_yaml::Value = serde_yaml::from_str(&rendered.text).expect("valid yaml");
    assert_eq!(doc["tables"][0]["rows"].as_i64(), Some(3));
}

#[test]
fn runtime_parameters_reach_every_stage() {
    let params: Variables = [
        ("env".to_string(), json!("prod")),
        ("start".to_string(), json!("2022-07-01")),
    ]
    .into_iter()
    .collect();
    let rendered = renderer().render(TEMPLATE, &params).expect("render");

    assert_eq!(rendered.variables.get("dataset"), Some(&json!("prod_events")));
    assert_eq!(
        rendered.variables.get("outfile"),
        Some(&json!("/tmp/prod_events_20220701.csv"))
    );
    assert!(rendered.text.contains("col: day Fixed String 2022-07-01"));
}

#[test]
fn bad_window_parameter_is_a_render_error() {
    let params: Variables = [("end".to_string(), json!("whenever"))].into_iter().collect();
    let err = renderer().render(TEMPLATE, &params).unwrap_err();
    assert!(matches!(err, RenderError::TimeInput { ref value } if value == "whenever"));
}
