//! Core contracts shared across fauxdata crates.
//!
//! This crate defines the cell [`Value`], the semantic [`DataType`] tags used by
//! templates, the columnar [`Frame`] buffer that columns are generated into, and
//! the timestamp/offset parsing helpers used by both rendering and generation.

pub mod error;
pub mod frame;
pub mod time;
pub mod types;
pub mod value;

pub use error::{Error, Result};
pub use frame::{Frame, ROW_INDEX_COLUMN, Series};
pub use time::{
    TimeUnit, format_timestamp, parse_date_value, parse_offset, parse_timestamp_value,
};
pub use types::DataType;
pub use value::Value;
