//! CSV output of crawl results

use crate::record::RunnerRecord;
use crate::CrawlError;
use std::io::Write;
use std::path::Path;

/// Writes records as CSV with the first record's keys as the header
///
/// Keys a record lacks become empty cells. A record with a key the first
/// record did not have is an error, and nothing is written in that case.
///
/// # Returns
///
/// * `Ok(usize)` - Number of data rows written
/// * `Err(CrawlError::EmptyResultSet)` - No records to derive a header from
/// * `Err(CrawlError::SchemaMismatch)` - A record does not fit the header
pub fn write_csv<W: Write>(records: &[RunnerRecord], writer: W) -> Result<usize, CrawlError> {
    let first = records.first().ok_or(CrawlError::EmptyResultSet)?;
    let header: Vec<&str> = first.keys().collect();
    check_schema(&header, records)?;

    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&header)?;

    for record in records {
        out.write_record(header.iter().map(|column| record.cell(column)))?;
    }

    out.flush()?;
    Ok(records.len())
}

/// First record whose keys are not all in the header
fn check_schema(header: &[&str], records: &[RunnerRecord]) -> Result<(), CrawlError> {
    for (row, record) in records.iter().enumerate() {
        let extra: Vec<String> = record
            .keys()
            .filter(|k| !header.contains(k))
            .map(str::to_string)
            .collect();
        if !extra.is_empty() {
            return Err(CrawlError::SchemaMismatch { row: row + 1, extra });
        }
    }
    Ok(())
}

/// Writes records to a CSV file, creating or truncating it
///
/// The records are checked against the header before the file is created.
pub fn write_csv_file(records: &[RunnerRecord], path: &Path) -> Result<usize, CrawlError> {
    let first = records.first().ok_or(CrawlError::EmptyResultSet)?;
    let header: Vec<&str> = first.keys().collect();
    check_schema(&header, records)?;

    tracing::info!("Writing {} results to {}", records.len(), path.display());
    let file = std::fs::File::create(path)?;
    write_csv(records, file)
}
