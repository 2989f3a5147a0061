//! Normalization of raw scraped fields into typed product rows.
//!
//! Each raw field is parsed independently; a field that cannot be parsed
//! becomes `None` rather than an error. Rows are then filtered in a fixed
//! order:
//!
//! 1. placeholder titles (`"Unknown Product"`, `"N/A"`, `"None"`, `""`)
//! 2. rows with any missing field
//! 3. exact duplicates, compared on the parsed values, first occurrence kept
//!
//! Surviving rows come out as [`CleanRecord`]s, whose field order is the
//! fixed output column order.
//!
//! # Rounding
//!
//! Converted prices are rounded half-to-even (`10.5` → `10`, `11.5` → `12`).
//!
//! # Typed input
//!
//! The input is a [`Table`], so cells may already be typed. An `Int` price is
//! taken as already converted and passes through untouched, which makes
//! normalizing a normalized table a no-op.

use crate::error::EtlError;
use crate::models::{
    CleanRecord, Table, Value, COLUMNS, COL_COLORS, COL_GENDER, COL_PRICE, COL_RATING, COL_SIZE,
    COL_TIMESTAMP, COL_TITLE,
};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument};

/// Titles that mark a card as a placeholder rather than a real product.
pub const PLACEHOLDER_TITLES: [&str; 4] = ["Unknown Product", "N/A", "None", ""];

static PRICE_AMOUNT: Lazy<Regex> = Lazy::new(|| regex(r"\$\s*([\d.,]+)"));
static DECIMAL: Lazy<Regex> = Lazy::new(|| regex(r"\d+(?:\.\d+)?"));
static INTEGER: Lazy<Regex> = Lazy::new(|| regex(r"\d+"));
static SIZE_LABEL: Lazy<Regex> = Lazy::new(|| regex(r"(?i)^\s*size\s*:"));
static GENDER_LABEL: Lazy<Regex> = Lazy::new(|| regex(r"(?i)^\s*gender\s*:"));

fn regex(re: &str) -> Regex {
    Regex::new(re).unwrap_or_else(|e| panic!("bad pattern {re:?}: {e}"))
}

/// Convert a `$` price into the target currency's integer unit.
///
/// `"$1,200.00"` at `16000.0` gives `19200000`. Anything without a parseable
/// `$` amount gives `None`.
pub fn parse_price(value: &Value, exchange_rate: f64) -> Option<i64> {
    match value {
        Value::Text(text) => {
            let amount = PRICE_AMOUNT.captures(text)?.get(1)?.as_str().replace(',', "");
            let usd: f64 = amount.parse().ok()?;
            to_int((usd * exchange_rate).round_ties_even())
        }
        Value::Int(i) => Some(*i),
        Value::Float(x) => to_int(x.round_ties_even()),
        Value::Null => None,
    }
}

/// The first number in a rating text, e.g. `"Rating: 4.5 / 5"` gives `4.5`.
pub fn parse_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Text(text) => DECIMAL.find(text)?.as_str().parse().ok(),
        Value::Int(i) => Some(*i as f64),
        Value::Float(x) if x.is_finite() => Some(*x),
        _ => None,
    }
}

/// The first integer in a colour count text, e.g. `"3 Colors"` gives `3`.
pub fn parse_colors(value: &Value) -> Option<i64> {
    match value {
        Value::Text(text) => INTEGER.find(text)?.as_str().parse().ok(),
        Value::Int(i) if *i >= 0 => Some(*i),
        Value::Float(x) if *x >= 0.0 && x.fract() == 0.0 => to_int(*x),
        _ => None,
    }
}

/// `"Size: M"` gives `"M"`; the label match ignores case.
pub fn clean_size(value: &Value) -> Option<String> {
    strip_label(value, &SIZE_LABEL)
}

/// `"Gender: Male"` gives `"Male"`; the label match ignores case.
pub fn clean_gender(value: &Value) -> Option<String> {
    strip_label(value, &GENDER_LABEL)
}

fn strip_label(value: &Value, label: &Regex) -> Option<String> {
    let Value::Text(text) = value else {
        return None;
    };
    let cleaned = label.replace(text, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Any non-null value as a trimmed string.
fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Text(text) => Some(text.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn to_int(x: f64) -> Option<i64> {
    // Outside this range the `as` cast would saturate silently.
    (x.is_finite() && x >= i64::MIN as f64 && x < i64::MAX as f64).then_some(x as i64)
}

/// One row after field parsing, before filtering.
#[derive(Debug)]
struct ParsedRow {
    title: Option<String>,
    price: Option<i64>,
    rating: Option<f64>,
    colors: Option<i64>,
    size: Option<String>,
    gender: Option<String>,
    timestamp: Option<String>,
}

impl ParsedRow {
    fn has_placeholder_title(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|t| PLACEHOLDER_TITLES.contains(&t.trim()))
    }

    fn complete(self) -> Option<CleanRecord> {
        Some(CleanRecord {
            title: self.title?,
            price: self.price?,
            rating: self.rating?,
            colors: self.colors?,
            size: self.size?,
            gender: self.gender?,
            timestamp: self.timestamp?,
        })
    }
}

/// Identity of a clean row for duplicate detection. Ratings compare by bit
/// pattern so the key can be hashed.
fn dedup_key(r: &CleanRecord) -> (String, i64, u64, i64, String, String, String) {
    (
        r.title.clone(),
        r.price,
        r.rating.to_bits(),
        r.colors,
        r.size.clone(),
        r.gender.clone(),
        r.timestamp.clone(),
    )
}

/// Normalize a raw product table into clean, typed, de-duplicated rows.
///
/// # Errors
///
/// Returns [`EtlError::InvalidArgument`] if `table` has no rows or lacks any
/// of the seven required columns.
#[instrument(level = "info", skip(table), fields(rows = table.len()))]
pub fn transform_products(table: &Table, exchange_rate: f64) -> Result<Vec<CleanRecord>, EtlError> {
    if table.is_empty() {
        return Err(EtlError::invalid("cannot transform an empty table"));
    }
    let missing: Vec<&str> = COLUMNS
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::invalid(format!(
            "missing required columns: {}",
            missing.join(", ")
        )));
    }

    let idx = |name: &str| table.column_index(name).unwrap_or_default();
    let (title, price, rating, colors, size, gender, ts) = (
        idx(COL_TITLE),
        idx(COL_PRICE),
        idx(COL_RATING),
        idx(COL_COLORS),
        idx(COL_SIZE),
        idx(COL_GENDER),
        idx(COL_TIMESTAMP),
    );

    let parsed = table.rows().iter().map(|row| ParsedRow {
        title: coerce_text(&row[title]),
        price: parse_price(&row[price], exchange_rate),
        rating: parse_rating(&row[rating]),
        colors: parse_colors(&row[colors]),
        size: clean_size(&row[size]),
        gender: clean_gender(&row[gender]),
        timestamp: coerce_text(&row[ts]),
    });

    let clean: Vec<CleanRecord> = parsed
        .filter(|row| !row.has_placeholder_title())
        .filter_map(ParsedRow::complete)
        .unique_by(dedup_key)
        .collect();

    debug!(dropped = table.len() - clean.len(), "Dropped invalid or duplicate rows");
    info!(count = clean.len(), "Normalized products");
    Ok(clean)
}
