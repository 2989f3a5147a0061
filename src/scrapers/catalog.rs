//! Catalog page scraper.
//!
//! Drives the fetcher, card locator and field extractor across a page range.
//! Pages are processed strictly in order, one at a time, with a fixed pause
//! after each page. A page that fails to download is logged and contributes
//! no records; the run carries on with the next page.

use crate::error::EtlError;
use crate::models::RawRecord;
use crate::scrapers::cards::locate_cards;
use crate::scrapers::fetch::{build_page_url, FetchHtml};
use crate::scrapers::fields::parse_product_card;
use crate::utils::{run_timestamp, truncate_for_log};
use scraper::Html;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Extract every valid product record from one page of markup.
///
/// Cards missing any field are skipped.
pub fn parse_page(html: &str, timestamp: &str) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let cards = locate_cards(&document);
    let records: Vec<RawRecord> = cards
        .iter()
        .filter_map(|card| parse_product_card(*card, timestamp))
        .collect();

    if cards.is_empty() {
        debug!(preview = %truncate_for_log(html, 200), "No product cards found");
    } else if records.len() < cards.len() {
        debug!(
            cards = cards.len(),
            skipped = cards.len() - records.len(),
            "Skipped incomplete product cards"
        );
    }
    records
}

/// Scrape pages `start_page..=end_page` from the catalog at `base_url`.
///
/// All records share one timestamp taken when the run starts. Output order
/// is page order, then card order within each page.
///
/// # Errors
///
/// Returns [`EtlError::InvalidArgument`] if `start_page < 1` or
/// `end_page < start_page`. Per-page fetch failures are not errors.
#[instrument(level = "info", skip(fetcher, base_url))]
pub async fn scrape_products<F: FetchHtml>(
    fetcher: &F,
    base_url: &str,
    start_page: i64,
    end_page: i64,
    delay: Duration,
) -> Result<Vec<RawRecord>, EtlError> {
    if start_page < 1 || end_page < start_page {
        return Err(EtlError::invalid(format!(
            "invalid page range {start_page}..={end_page}"
        )));
    }

    let timestamp = run_timestamp();
    let mut results = Vec::new();

    for page in start_page..=end_page {
        let url = build_page_url(base_url, page)?;
        match fetcher.fetch_html(&url).await {
            Ok(html) => {
                let rows = parse_page(&html, &timestamp);
                info!(page, rows = rows.len(), "Scraped catalog page");
                results.extend(rows);
            }
            Err(e) => {
                warn!(page, error = %e, "Page failed; skipping");
            }
        }
        sleep(delay).await;
    }

    info!(count = results.len(), "Finished scraping catalog");
    Ok(results)
}
