//! Data models for scraped product listings and their tabular representation.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`RawRecord`]: Unparsed text fields scraped from one product card
//! - [`CleanRecord`]: Fully typed product row produced by the normalizer
//! - [`Value`] and [`Table`]: A small column-oriented view shared by the
//!   normalizer and every output sink
//!
//! The serialized column names (`Title`, `Price`, ..., `timestamp`) match the
//! headers written to CSV and the column names created in the database.

use serde::Serialize;
use std::fmt;

pub const COL_TITLE: &str = "Title";
pub const COL_PRICE: &str = "Price";
pub const COL_RATING: &str = "Rating";
pub const COL_COLORS: &str = "Colors";
pub const COL_SIZE: &str = "Size";
pub const COL_GENDER: &str = "Gender";
pub const COL_TIMESTAMP: &str = "timestamp";

/// Output column order for both raw and clean tables.
pub const COLUMNS: [&str; 7] = [
    COL_TITLE,
    COL_PRICE,
    COL_RATING,
    COL_COLORS,
    COL_SIZE,
    COL_GENDER,
    COL_TIMESTAMP,
];

/// A product card as scraped, before any parsing.
///
/// Every field still carries its label, unit or currency symbol
/// (`"$20.00"`, `"Size: M"`). The extractor only builds one when all six data
/// fields were found, and `timestamp` is shared by every record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Colors")]
    pub colors: String,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    pub timestamp: String,
}

impl RawRecord {
    fn into_row(self) -> Vec<Value> {
        vec![
            Value::Text(self.title),
            Value::Text(self.price),
            Value::Text(self.rating),
            Value::Text(self.colors),
            Value::Text(self.size),
            Value::Text(self.gender),
            Value::Text(self.timestamp),
        ]
    }
}

/// A validated, typed product row ready for persistence.
///
/// `price` is in the target currency's integer unit (after the exchange rate
/// has been applied) and `title` is never one of the placeholder titles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanRecord {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Price")]
    pub price: i64,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Colors")]
    pub colors: i64,
    #[serde(rename = "Size")]
    pub size: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    pub timestamp: String,
}

impl CleanRecord {
    fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Text(self.title.clone()),
            Value::Int(self.price),
            Value::Float(self.rating),
            Value::Int(self.colors),
            Value::Text(self.size.clone()),
            Value::Text(self.gender.clone()),
            Value::Text(self.timestamp.clone()),
        ]
    }
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            // Keep a trailing ".0" so floats stay recognisable as floats on re-read.
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Named columns over rows of [`Value`]s.
///
/// Rows shorter than the header are padded with [`Value::Null`] on insert, so
/// every row always has exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the column count.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table with no rows or no columns holds no data.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterate over one column's cells, top to bottom.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }
}

impl From<Vec<RawRecord>> for Table {
    fn from(records: Vec<RawRecord>) -> Self {
        let mut table = Table::new(COLUMNS);
        for record in records {
            table.push_row(record.into_row());
        }
        table
    }
}

impl From<&[CleanRecord]> for Table {
    fn from(records: &[CleanRecord]) -> Self {
        let mut table = Table::new(COLUMNS);
        for record in records {
            table.push_row(record.to_row());
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str) -> RawRecord {
        RawRecord {
            title: title.to_string(),
            price: "$20.00".to_string(),
            rating: "Rating: 4.5 / 5".to_string(),
            colors: "3 Colors".to_string(),
            size: "Size: M".to_string(),
            gender: "Gender: Male".to_string(),
            timestamp: "2026-02-22T10:00:00".to_string(),
        }
    }

    #[test]
    fn test_table_from_raw_records_keeps_order_and_columns() {
        let table = Table::from(vec![raw("A"), raw("B")]);
        assert_eq!(table.columns(), COLUMNS.map(String::from).as_slice());
        assert_eq!(table.len(), 2);
        let titles: Vec<_> = table.column(COL_TITLE).unwrap().cloned().collect();
        assert_eq!(titles, vec![Value::from("A"), Value::from("B")]);
    }

    #[test]
    fn test_table_from_clean_records_is_typed() {
        let clean = CleanRecord {
            title: "T-Shirt".to_string(),
            price: 168000,
            rating: 4.5,
            colors: 3,
            size: "M".to_string(),
            gender: "Male".to_string(),
            timestamp: "2026-02-22T10:00:00".to_string(),
        };
        let table = Table::from(std::slice::from_ref(&clean));
        assert_eq!(table.rows()[0][1], Value::Int(168000));
        assert_eq!(table.rows()[0][2], Value::Float(4.5));
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut table = Table::new(["a", "b", "c"]);
        table.push_row(vec![Value::from("x")]);
        assert_eq!(table.rows()[0], vec![Value::from("x"), Value::Null, Value::Null]);
    }

    #[test]
    fn test_empty_table() {
        assert!(Table::default().is_empty());
        assert!(Table::new(COLUMNS).is_empty());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Float(5.0).to_string(), "5.0");
        assert_eq!(Value::Float(4.5).to_string(), "4.5");
        assert_eq!(Value::Int(19200000).to_string(), "19200000");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_raw_record_serializes_with_column_names() {
        let json = serde_json::to_string(&raw("Shirt")).unwrap();
        assert!(json.contains("\"Title\":\"Shirt\""));
        assert!(json.contains("\"timestamp\""));
    }
}
