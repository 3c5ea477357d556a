//! Listing index parser
//!
//! Turns one search-results page into its listing cards (detail-page URL and
//! advertised price), and turns each card into a stub record.

use crate::record::{FieldPath, FieldValue, Record};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// One listing card on a search-results page
pub const CARD_SELECTOR: &str = "article.card--result";

/// The anchor leading from a card to its detail page
pub const CARD_LINK_SELECTOR: &str = "a.card__title-link";

/// The advertised price of a card
pub const CARD_PRICE_SELECTOR: &str = ".card__price";

/// What the index page shows of one listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    /// Absolute detail-page URL
    pub url: Url,

    /// Price text as shown on the card ("€ 250,000")
    pub price: Option<String>,
}

/// Extracts every listing card with a usable detail link, in page order
///
/// Cards without the expected anchor (promotions, layout blocks) are skipped.
/// Duplicates are kept; the record sink ignores repeated URLs.
///
/// # Example
///
/// ```
/// use immo_harvest::crawler::extract_listing_cards;
/// use url::Url;
///
/// let html = r#"<article class="card--result">
///     <a class="card__title-link" href="/en/classified/house/for-sale/gent/9000/1">House</a>
///     <p class="card__price">€ 250,000</p>
/// </article>"#;
/// let base = Url::parse("https://www.immoweb.be").unwrap();
/// let cards = extract_listing_cards(html, &base);
/// assert_eq!(cards[0].url.as_str(), "https://www.immoweb.be/en/classified/house/for-sale/gent/9000/1");
/// assert_eq!(cards[0].price.as_deref(), Some("€ 250,000"));
/// ```
pub fn extract_listing_cards(html: &str, base_url: &Url) -> Vec<ListingCard> {
    let document = Html::parse_document(html);

    let (Ok(card_selector), Ok(link_selector), Ok(price_selector)) = (
        Selector::parse(CARD_SELECTOR),
        Selector::parse(CARD_LINK_SELECTOR),
        Selector::parse(CARD_PRICE_SELECTOR),
    ) else {
        return Vec::new();
    };

    let mut cards = Vec::new();
    for card in document.select(&card_selector) {
        let href = card
            .select(&link_selector)
            .next()
            .and_then(|anchor| anchor.value().attr("href"));

        let Some(url) = href.and_then(|href| resolve_link(href, base_url)) else {
            tracing::trace!("Skipping listing card without a detail link");
            continue;
        };

        let price = card
            .select(&price_selector)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty());

        cards.push(ListingCard { url, price });
    }

    cards
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves a card href against the site base URL
///
/// Returns None for empty, fragment-only and non-HTTP(S) links.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let url = base_url.join(href).ok()?;
    match url.scheme() {
        "http" | "https" => Some(url),
        _ => None,
    }
}

/// Creates the stub record for a listing card
///
/// The card price is parsed like any other price; a price the card shows as
/// text ("Price on request") leaves it unset. Detail URLs look like
/// `/en/classified/<type>/<for-sale|for-rent>/<locality>/<zip>/<id>`; when
/// they do, locality and postal code are taken from the path.
pub fn stub_for(card: &ListingCard) -> Record {
    let mut record = Record::stub(card.url.as_str());

    let segments: Vec<&str> = card
        .url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    let location = segments
        .iter()
        .position(|segment| *segment == "classified")
        .and_then(|i| segments.get(i + 3..i + 5));

    if let Some([locality, zip]) = location {
        if !zip.is_empty() && zip.chars().all(|c| c.is_ascii_digit()) {
            record.locality = Some(locality.replace('-', " "));
            record.zip_code = Some(zip.to_string());
        }
    }

    if let Some(price) = &card.price {
        if let Err(e) = record.apply(FieldPath::Price, FieldValue::from(price.as_str())) {
            tracing::trace!("{}: {}", card.url, e);
        }
    }

    record
}
