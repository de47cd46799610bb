use std::io::Read;
use std::path::Path;

use csv::{Reader, ReaderBuilder};
use tracing::info;

use crate::error::Result;
use crate::roster::PersonRecord;

fn collect_records<R: Read>(mut reader: Reader<R>) -> Result<Vec<PersonRecord>> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;

        let mut record = PersonRecord::new();
        // Short rows read as blank in the columns they leave out
        for (i, column) in headers.iter().enumerate() {
            record.push(column.as_str(), row.get(i).unwrap_or("").trim());
        }

        // Spreadsheet exports often end with empty rows
        if record.is_blank() {
            continue;
        }
        records.push(record);
    }

    Ok(records)
}

/// Reads person records from CSV data with a header row.
///
/// Every column is kept; the roster decides which ones are period columns.
/// Rows shorter than the header are padded with blank values.
pub fn read_records<R: Read>(input: R) -> Result<Vec<PersonRecord>> {
    let reader = ReaderBuilder::new().flexible(true).from_reader(input);
    collect_records(reader)
}

/// Loads person records from a CSV file
pub fn load_records<P: AsRef<Path>>(csv_path: P) -> Result<Vec<PersonRecord>> {
    let reader = ReaderBuilder::new().flexible(true).from_path(csv_path.as_ref())?;
    let records = collect_records(reader)?;
    info!("Read {} rows from {}", records.len(), csv_path.as_ref().display());
    Ok(records)
}
