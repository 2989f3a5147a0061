//! Field extraction from a single product card.
//!
//! The title comes from the first heading-like element with text. The other
//! five fields are found by scanning the card's text nodes for a pattern
//! (a `$` amount, a rating, a colour count, a `Size:` or `Gender:` label).
//! A card only becomes a [`RawRecord`] when all six are present.

use crate::models::RawRecord;
use crate::scrapers::cards::{compile_selectors, first_success};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

/// Title selectors in priority order: headings before generic class names.
pub const TITLE_SELECTORS: [&str; 5] = ["h3", "h2", ".product-title", ".card-title", ".title"];

static TITLE_MATCHERS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&TITLE_SELECTORS));

fn ci_regex(re: &str) -> Regex {
    Regex::new(&format!("(?i){re}")).unwrap_or_else(|e| panic!("bad pattern {re:?}: {e}"))
}

pub static PRICE_PATTERN: Lazy<Regex> = Lazy::new(|| ci_regex(r"\$\s*[\d.,]+"));
pub static RATING_PATTERN: Lazy<Regex> = Lazy::new(|| ci_regex(r"rating|/ 5"));
pub static COLORS_PATTERN: Lazy<Regex> = Lazy::new(|| ci_regex(r"\b\d+\s*colors?\b"));
pub static SIZE_PATTERN: Lazy<Regex> = Lazy::new(|| ci_regex(r"size\s*:"));
pub static GENDER_PATTERN: Lazy<Regex> = Lazy::new(|| ci_regex(r"gender\s*:"));

/// Whitespace-trimmed, non-empty text nodes of `element` in document order.
fn stripped_strings<'a>(element: ElementRef<'a>) -> impl Iterator<Item = &'a str> {
    element.text().map(str::trim).filter(|t| !t.is_empty())
}

/// The card's title, from the first selector whose first match has text.
pub fn find_title(card: ElementRef<'_>) -> Option<String> {
    first_success(TITLE_MATCHERS.iter(), |selector| {
        let node = card.select(selector).next()?;
        let text: String = stripped_strings(node).collect();
        (!text.is_empty()).then_some(text)
    })
}

/// The first text node inside `card` that `pattern` matches, trimmed.
///
/// Patterns built here are case-insensitive; callers passing their own
/// regex decide case handling themselves.
pub fn find_by_pattern(card: ElementRef<'_>, pattern: &Regex) -> Option<String> {
    stripped_strings(card)
        .find(|text| pattern.is_match(text))
        .map(str::to_string)
}

/// Extract all six fields from `card`, stamping the record with `timestamp`.
///
/// Returns `None` when any field is missing; partial records are never built.
pub fn parse_product_card(card: ElementRef<'_>, timestamp: &str) -> Option<RawRecord> {
    Some(RawRecord {
        title: find_title(card)?,
        price: find_by_pattern(card, &PRICE_PATTERN)?,
        rating: find_by_pattern(card, &RATING_PATTERN)?,
        colors: find_by_pattern(card, &COLORS_PATTERN)?,
        size: find_by_pattern(card, &SIZE_PATTERN)?,
        gender: find_by_pattern(card, &GENDER_PATTERN)?,
        timestamp: timestamp.to_string(),
    })
}
