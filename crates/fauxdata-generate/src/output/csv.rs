use std::io::Write;

use fauxdata_core::Frame;

/// Write a frame as CSV with a header row; nulls become empty fields.
pub fn write_frame_csv<W: Write>(writer: W, frame: &Frame) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(frame.column_names())?;
    for row in 0..frame.height() {
        let record: Vec<String> = frame
            .row(row)
            .into_iter()
            .map(|(_, value)| value.to_string())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
