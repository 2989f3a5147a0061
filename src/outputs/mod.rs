//! Output sinks for normalized (and raw) product tables.
//!
//! # Submodules
//!
//! - [`csv`]: Writes a [`Table`] to a `.csv` file
//! - [`postgres`]: Replaces a Postgres table with the rows of a [`Table`]
//! - [`sheets`]: Clears and rewrites a Google Sheets worksheet
//!
//! Every sink validates its arguments before touching the filesystem or the
//! network and fails with [`EtlError::InvalidArgument`] on an empty table or
//! a blank identifier.

pub mod csv;
pub mod postgres;
pub mod sheets;

use crate::error::EtlError;
use crate::models::Table;

/// Reject a table without rows or columns before any I/O.
pub(crate) fn ensure_has_rows(table: &Table, sink: &str) -> Result<(), EtlError> {
    if table.is_empty() {
        return Err(EtlError::invalid(format!("table is empty, cannot save to {sink}")));
    }
    Ok(())
}

/// Reject blank required identifiers, naming the first offender.
pub(crate) fn ensure_present(fields: &[(&str, &str)]) -> Result<(), EtlError> {
    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(EtlError::invalid(format!("{name} is required"))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    #[test]
    fn test_ensure_has_rows() {
        assert!(ensure_has_rows(&Table::default(), "CSV").is_err());
        assert!(ensure_has_rows(&Table::new(["col"]), "CSV").is_err());

        let mut table = Table::new(["col"]);
        table.push_row(vec![Value::Int(1)]);
        assert!(ensure_has_rows(&table, "CSV").is_ok());
    }

    #[test]
    fn test_ensure_present_names_missing_field() {
        let err = ensure_present(&[("connection_uri", "postgres://x"), ("table_name", " ")])
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid argument: table_name is required");
    }
}
