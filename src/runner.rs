// runner.rs
use crate::domain::{self, RawListing, ReconciledRow};
use crate::scraper::{collect_links, extract, resolve_link, PageFetcher};
use crate::spreadsheets::{ListingStore, StoreError};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("search page {url} could not be fetched: {reason}")]
    SearchPage { url: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub links_found: usize,
    pub listings_extracted: usize,
    pub listings_skipped: usize,
    pub properties: usize,
    pub rows_saved: usize,
}

/// One scrape run: search page, listing pages, merge, reconcile, save.
///
/// `prior` is the previously persisted dataset (if any) and `output` receives the
/// reconciled rows. Per-listing failures are logged and skipped; a missing search
/// page or a failing store aborts the run before anything is written.
pub fn run_scrape(
    fetcher: &dyn PageFetcher,
    search_url: &str,
    prior: Option<&dyn ListingStore>,
    output: &dyn ListingStore,
    today: NaiveDate,
) -> Result<RunSummary, RunError> {
    let previous: HashMap<String, ReconciledRow> = match prior {
        Some(store) => store.load()?,
        None => HashMap::new(),
    };

    let mut summary = RunSummary::default();
    let listings = scrape_listings(fetcher, search_url, today, &mut summary)?;

    let merged = domain::merge(listings);
    summary.properties = merged.len();

    let rows = domain::reconcile(merged, previous, today);
    output.save(&rows)?;
    summary.rows_saved = rows.len();

    tracing::info!(
        links = summary.links_found,
        extracted = summary.listings_extracted,
        skipped = summary.listings_skipped,
        properties = summary.properties,
        rows = summary.rows_saved,
        "✅ run complete"
    );
    Ok(summary)
}

/// Fetches the search page and every listing it links to, in discovery order.
pub fn scrape_listings(
    fetcher: &dyn PageFetcher,
    search_url: &str,
    today: NaiveDate,
    summary: &mut RunSummary,
) -> Result<Vec<RawListing>, RunError> {
    tracing::info!(url = search_url, "📄 fetching search page");
    let search_html = fetcher
        .fetch(search_url)
        .map_err(|e| RunError::SearchPage {
            url: search_url.to_string(),
            reason: e.to_string(),
        })?;
    if search_html.trim().is_empty() {
        return Err(RunError::SearchPage {
            url: search_url.to_string(),
            reason: "page has no content".to_string(),
        });
    }

    let links: Vec<String> = collect_links(&search_html)
        .iter()
        .map(|href| resolve_link(search_url, href))
        .collect();
    summary.links_found = links.len();
    tracing::info!("Found {} listings.", links.len());

    let mut listings = Vec::with_capacity(links.len());
    for link in &links {
        let html = match fetcher.fetch(link) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(url = %link, "skipping listing, no content: {e}");
                summary.listings_skipped += 1;
                continue;
            }
        };

        match extract(&html, link, today) {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                tracing::warn!(url = %link, "skipping listing: {e}");
                summary.listings_skipped += 1;
            }
        }
    }
    summary.listings_extracted = listings.len();

    Ok(listings)
}
