use thiserror::Error;

/// Failures of the page-fetch collaborator.
/// The run treats every variant the same way: the page has no content.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },
    #[error("Empty response body from {0}")]
    EmptyBody(String),
}

/// Why a single listing page could not become a `RawListing`.
#[derive(Debug, Error)]
pub enum ExtractionFailure {
    #[error("page has no content")]
    EmptyContent,
    #[error("listing has no address")]
    MissingAddress,
    #[error("unparsable listed-on date '{value}': {source}")]
    DateFormat {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
