use std::io::Write;

use fauxdata_core::Frame;

/// One JSON object per line, keys in column order.
pub fn write_frame_jsonl<W: Write>(mut writer: W, frame: &Frame) -> Result<(), serde_json::Error> {
    for record in frame.records() {
        serde_json::to_writer(&mut writer, &record.to_json())?;
        writer.write_all(b"\n").map_err(serde_json::Error::io)?;
    }
    writer.flush().map_err(serde_json::Error::io)
}

/// A pretty-printed JSON array of row objects.
pub fn write_frame_json<W: Write>(mut writer: W, frame: &Frame) -> Result<(), serde_json::Error> {
    let rows: Vec<serde_json::Value> =
        frame.records().iter().map(|record| record.to_json()).collect();
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer.flush().map_err(serde_json::Error::io)
}
