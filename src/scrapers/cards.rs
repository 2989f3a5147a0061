//! Product card location.
//!
//! Catalog markup drifts between deployments, so instead of one hard-coded
//! selector the locator walks an ordered list of candidates, most specific
//! container class first and a bare `article` tag last, and keeps the first
//! one that matches anything.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Card container selectors in priority order.
pub const CARD_SELECTORS: [&str; 4] = [".collection-card", ".product-card", ".card", "article"];

static CARD_MATCHERS: Lazy<Vec<Selector>> = Lazy::new(|| compile_selectors(&CARD_SELECTORS));

/// Compile a list of static selectors. Panics on an invalid literal.
pub(crate) fn compile_selectors(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|s| Selector::parse(s).unwrap_or_else(|e| panic!("bad selector {s:?}: {e}")))
        .collect()
}

/// Try each candidate in order and return the first non-`None` result.
pub(crate) fn first_success<C, T>(
    candidates: impl IntoIterator<Item = C>,
    attempt: impl FnMut(C) -> Option<T>,
) -> Option<T> {
    candidates.into_iter().find_map(attempt)
}

/// Find the product cards in a parsed page.
///
/// Returns every element matched by the first selector in [`CARD_SELECTORS`]
/// that matches at least one element, or an empty vector if none do.
pub fn locate_cards(document: &Html) -> Vec<ElementRef<'_>> {
    first_success(CARD_MATCHERS.iter(), |selector| {
        let found: Vec<_> = document.select(selector).collect();
        (!found.is_empty()).then_some(found)
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(cards: &[ElementRef<'_>]) -> Vec<String> {
        cards
            .iter()
            .map(|c| c.value().attr("class").unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_most_specific_selector_wins() {
        let doc = Html::parse_document(
            r#"<div class="card">generic</div>
               <div class="collection-card">a</div>
               <div class="collection-card">b</div>
               <article>c</article>"#,
        );
        let cards = locate_cards(&doc);
        assert_eq!(classes(&cards), vec!["collection-card", "collection-card"]);
    }

    #[test]
    fn test_falls_back_in_order() {
        let doc = Html::parse_document(
            r#"<div class="card">x</div><article>y</article><div class="card">z</div>"#,
        );
        assert_eq!(locate_cards(&doc).len(), 2);

        let doc = Html::parse_document("<main><article>one</article><article>two</article></main>");
        let cards = locate_cards(&doc);
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].value().name(), "article");
    }

    #[test]
    fn test_no_cards_yields_empty() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert!(locate_cards(&doc).is_empty());
    }

    #[test]
    fn test_first_success_short_circuits() {
        let mut tried = Vec::new();
        let hit = first_success([1, 2, 3, 4], |n| {
            tried.push(n);
            (n % 2 == 0).then_some(n * 10)
        });
        assert_eq!(hit, Some(20));
        assert_eq!(tried, vec![1, 2]);
    }
}
