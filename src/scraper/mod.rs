pub mod extract;
pub mod fetch;
pub mod links;
pub mod lookup;
pub mod parse;
mod scraper_error;

pub use extract::extract;
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher};
pub use links::{collect_links, resolve_link};
pub use scraper_error::{ExtractionFailure, ScraperError};
