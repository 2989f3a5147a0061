//! CSV file sink.
//!
//! Writes the header row followed by one record per table row. Cells are
//! rendered with [`Value`](crate::models::Value)'s `Display`, so nulls become
//! empty fields and integral floats keep their `.0`.

use crate::error::EtlError;
use crate::models::Table;
use crate::outputs::ensure_has_rows;
use std::fs::File;
use std::path::Path;
use tracing::{info, instrument};

/// Write `table` to `path`, replacing any existing file.
///
/// # Errors
///
/// - [`EtlError::InvalidArgument`] if the table is empty or `path` does not
///   end in `.csv` (case-insensitive)
/// - [`EtlError::Io`] if the file cannot be created
/// - [`EtlError::Csv`] if writing a record fails
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = table.len()))]
pub fn save(table: &Table, path: &Path) -> Result<(), EtlError> {
    ensure_has_rows(table, "CSV")?;
    let is_csv = path
        .to_string_lossy()
        .to_ascii_lowercase()
        .ends_with(".csv");
    if !is_csv {
        return Err(EtlError::invalid(format!(
            "output file must be .csv, got {}",
            path.display()
        )));
    }

    let file = File::create(path)?;
    let mut writer = ::csv::Writer::from_writer(file);
    writer.write_record(table.columns())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(ToString::to_string))?;
    }
    writer.flush()?;

    info!("Wrote CSV");
    Ok(())
}
