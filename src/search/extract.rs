//! Best-effort extraction of ad cards from a rendered results page.
//!
//! The fetcher hands over the page HTML and this module does the rest, so the
//! selector fallback chains stay testable against fixture markup instead of a
//! live page. Lookup order per field:
//!
//! - title: `h6`, then `h4`, then the `—` placeholder
//! - price: `[data-testid="ad-price"]`, then `.price`, then the sentinel
//! - link: first non-empty anchor `href`, resolved to absolute; a card with
//!   no usable link is skipped entirely
//! - image: first non-empty `img` `src`, resolved to absolute, optional

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::AdRecord;

/// Hard cap on records returned per search.
pub const MAX_RESULTS: usize = 20;

/// Repeated listing-card container on the results page.
pub const CARD_SELECTOR: &str = "div[data-cy=\"l-card\"]";

pub const TITLE_PLACEHOLDER: &str = "—";
pub const PRICE_PLACEHOLDER: &str = "Price not specified";

static CARD: Lazy<Selector> =
    Lazy::new(|| Selector::parse(CARD_SELECTOR).expect("card selector"));
static TITLE_CHAIN: Lazy<Vec<Selector>> = Lazy::new(|| parse_chain(&["h6", "h4"]));
static PRICE_CHAIN: Lazy<Vec<Selector>> =
    Lazy::new(|| parse_chain(&["[data-testid=\"ad-price\"]", ".price"]));
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").expect("link selector"));
static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("image selector"));

fn parse_chain(selectors: &[&str]) -> Vec<Selector> {
    selectors
        .iter()
        .map(|selector| Selector::parse(selector).expect("field selector"))
        .collect()
}

/// Scan the page's listing cards in document order, stopping at
/// [`MAX_RESULTS`] records.
pub fn extract_records(html: &str, page_url: &Url) -> Vec<AdRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();
    for card in document.select(&CARD) {
        if records.len() >= MAX_RESULTS {
            break;
        }
        if let Some(record) = extract_card(card, page_url) {
            records.push(record);
        }
    }
    records
}

/// Extract one card. Returns `None` only when no usable link can be derived;
/// every other missing field falls back to its placeholder.
fn extract_card(card: ElementRef<'_>, page_url: &Url) -> Option<AdRecord> {
    let href = card
        .select(&LINK)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())?;
    let link = page_url.join(href).ok()?.to_string();

    let title = select_first_text(card, &TITLE_CHAIN)
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());
    let price = select_first_text(card, &PRICE_CHAIN)
        .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string());

    let image = card
        .select(&IMAGE)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .and_then(|src| page_url.join(src).ok())
        .map(|absolute| absolute.to_string());

    Some(AdRecord {
        title,
        price,
        link,
        image,
    })
}

fn select_first_text(card: ElementRef<'_>, chain: &[Selector]) -> Option<String> {
    for selector in chain {
        if let Some(element) = card.select(selector).next() {
            let text = element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
