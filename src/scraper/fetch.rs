// scraper/fetch.rs
use crate::scraper::ScraperError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use std::time::{Duration, Instant};

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

const MAX_BACKOFF_SECS: u64 = 10;
const JITTER_MAX_MILLIS: u64 = 1500;

/// Fetches rendered page HTML for a URL.
///
/// The run does not distinguish failure kinds: any error means the page has no content.
pub trait PageFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_attempts: 3,
            backoff: true,
        }
    }
}

/// Plain HTTP fetcher with retry and jittered backoff.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-SG,en;q=0.9"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ScraperError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn try_fetch(&self, url: &str) -> Result<String, ScraperError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ScraperError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let text = resp
            .text()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ScraperError::EmptyBody(url.to_string()));
        }
        Ok(text)
    }

    fn backoff(&self, attempt: u32) {
        if !self.config.backoff {
            return;
        }
        let base = std::cmp::min(2 * attempt as u64, MAX_BACKOFF_SECS);
        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MILLIS);
        std::thread::sleep(Duration::from_secs(base) + Duration::from_millis(jitter));
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        let attempts = self.config.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            let start = Instant::now();

            match self.try_fetch(url) {
                Ok(html) => {
                    tracing::debug!(url, attempt, elapsed = ?start.elapsed(), "fetched page");
                    return Ok(html);
                }
                Err(e) => {
                    tracing::warn!(
                        url,
                        attempt,
                        elapsed = ?start.elapsed(),
                        "⚠️ fetch failed: {e}"
                    );
                    last_err = Some(e);
                    if attempt < attempts {
                        self.backoff(attempt);
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop did not run".into())))
    }
}
