//! Serializers shared by the file and console targets.

pub mod csv;
pub mod json;

pub use self::csv::write_frame_csv;
pub use self::json::{write_frame_json, write_frame_jsonl};
