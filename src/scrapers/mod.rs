//! Catalog extraction.
//!
//! The scraper is split leaves-first:
//!
//! | Stage | Module | Job |
//! |-------|--------|-----|
//! | Fetcher | [`fetch`] | Page number to URL, URL to markup |
//! | Card locator | [`cards`] | Markup to product card elements |
//! | Field extractor | [`fields`] | Card to [`RawRecord`](crate::models::RawRecord) |
//! | Page scraper | [`catalog`] | Runs the above across a page range |
//!
//! Card and title lookup both use ordered selector fallbacks, since the
//! catalog's markup is not guaranteed to stay stable between deployments.

pub mod cards;
pub mod catalog;
pub mod fetch;
pub mod fields;
