use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::str::FromStr;

use fauxdata_core::Frame;
use tracing::info;

use super::Target;
use crate::errors::TargetError;
use crate::output::{write_frame_csv, write_frame_json, write_frame_jsonl};
use crate::table::GeneratedTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Jsonl,
    Json,
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "jsonl" | "ndjson" => Ok(FileType::Jsonl),
            "json" => Ok(FileType::Json),
            other => Err(format!("unsupported filetype '{other}', expected csv, jsonl or json")),
        }
    }
}

/// Writes the table to a local file, creating parent directories.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTarget {
    pub name: String,
    pub filetype: FileType,
    pub filepath: PathBuf,
}

impl Target for FileTarget {
    fn kind(&self) -> &'static str {
        "File"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn save(&self, table: &GeneratedTable) -> Result<(), TargetError> {
        let bytes = self.write(&table.frame)?;
        info!(
            table = %table.name,
            target = %self.name,
            path = %self.filepath.display(),
            rows = table.frame.height(),
            bytes,
            "table written"
        );
        Ok(())
    }
}

impl FileTarget {
    /// Write the frame and return the size of the resulting file.
    fn write(&self, frame: &Frame) -> Result<u64, TargetError> {
        if let Some(parent) = self.filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&self.filepath)?);
        match self.filetype {
            FileType::Csv => write_frame_csv(&mut writer, frame)?,
            FileType::Jsonl => write_frame_jsonl(&mut writer, frame)?,
            FileType::Json => write_frame_json(&mut writer, frame)?,
        }
        writer.into_inner().map_err(|err| err.into_error())?;
        Ok(std::fs::metadata(&self.filepath)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fauxdata_core::{Series, Value};

    #[test]
    fn write_reports_the_file_size() {
        let dir = std::env::temp_dir()
            .join(format!("fauxdata-file-target-{}", std::process::id()));
        let target = FileTarget {
            name: "out".to_string(),
            filetype: FileType::Csv,
            filepath: dir.join("nested").join("people.csv"),
        };
        let frame = Frame::from_columns(vec![
            Series::new("id", vec![Value::Int(1), Value::Int(2)]),
            Series::new("name", vec![Value::from("ada"), Value::Null]),
        ])
        .unwrap();

        let bytes = target.write(&frame).unwrap();
        let text = std::fs::read_to_string(&target.filepath).unwrap();
        assert_eq!(text, "id,name\n1,ada\n2,\n");
        assert_eq!(bytes, text.len() as u64);
        std::fs::remove_dir_all(dir).unwrap();
    }
}
