use crate::error::Result;
use crate::table::ResultSet;
use std::io::Write;

pub const DEFAULT_EXPORT_FILENAME: &str = "results.csv";

/// write a header row and every result row as csv
pub fn write_csv<W: Write>(result: &ResultSet, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(&result.columns)?;
    for row in &result.rows {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    csv_writer.flush()?;

    Ok(())
}
