//! Template resolution for fauxdata.
//!
//! Turns raw template text plus runtime parameters into concrete YAML
//! (variable resolution, time window, Tera rendering) and turns YAML nodes
//! into typed entities through a registry-driven factory that understands
//! both the shorthand (`col: "name Type ..."`) and keyed syntaxes.

pub mod errors;
pub mod factory;
pub mod parts;
pub mod period;
pub mod render;
pub mod variables;

pub use errors::{ParseError, RenderError};
pub use factory::{Entity, FieldKind, FieldSpec, Fields, Registration, parse, parse_from_yaml};
pub use parts::split_parts;
pub use period::{TimeInput, TimeWindow, resolve_time_period};
pub use render::{Rendered, TemplateRenderer};
pub use variables::{Variables, extract_variable_lines, resolve_variables};
