// config.rs
use crate::scraper::FetchConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {key}: {message}")]
    Invalid {
        key: &'static str,
        value: String,
        message: String,
    },
}

/// Process-level settings for the HTTP surface. The core never reads these;
/// paths and the clock are handed to it per run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub upload_dir: PathBuf,
    pub download_dir: PathBuf,
    pub workers: usize,
    pub log_level: String,
    pub fetch: FetchConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = parse_or(&lookup, "LISTING_TRACKER_FETCH_TIMEOUT_SECS", 60)?;

        Ok(Self {
            addr: parse_or(
                &lookup,
                "LISTING_TRACKER_ADDR",
                SocketAddr::from(([127, 0, 0, 1], 5002)),
            )?,
            upload_dir: lookup("LISTING_TRACKER_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            download_dir: lookup("LISTING_TRACKER_DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("downloads")),
            workers: parse_or(&lookup, "LISTING_TRACKER_WORKERS", 4)?,
            log_level: lookup("LISTING_TRACKER_LOG").unwrap_or_else(|| "info".to_string()),
            fetch: FetchConfig {
                timeout: Duration::from_secs(timeout_secs),
                max_attempts: parse_or(&lookup, "LISTING_TRACKER_FETCH_ATTEMPTS", 3)?,
                backoff: true,
            },
        })
    }

    pub fn output_workbook(&self) -> PathBuf {
        self.download_dir.join(OUTPUT_WORKBOOK)
    }
}

pub const OUTPUT_WORKBOOK: &str = "scraped_data.xlsx";

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
            value,
        }),
    }
}
