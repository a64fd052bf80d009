// scraper/links.rs
use ::scraper::{Html, Selector};
use url::Url;

/// Listing URLs from a search-results page, in document order.
/// Cards without a navigation anchor are skipped.
pub fn collect_links(html: &str) -> Vec<String> {
    if html.trim().is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(html);
    let (Ok(cards), Ok(anchor)) = (
        Selector::parse("div.listing-card"),
        Selector::parse("a.nav-link[href]"),
    ) else {
        return Vec::new();
    };

    document
        .select(&cards)
        .filter_map(|card| card.select(&anchor).next())
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves a possibly relative href against the search page URL.
/// Falls back to the raw href when the base is not a valid URL.
pub fn resolve_link(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}
