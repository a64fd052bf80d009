// src/tests/utils.rs
use crate::scraper::{PageFetcher, ScraperError};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const SEARCH_URL: &str = "https://www.example.sg/property-for-sale?district=D09";

/// Serves canned HTML by URL and records the order pages were requested in.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl PageFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> Result<String, ScraperError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScraperError::Network(format!("no canned page for {url}")))
    }
}

pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A fresh, not yet created folder under the OS temp dir.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "listing_tracker_{name}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

pub fn search_page(hrefs: &[&str]) -> String {
    let cards: String = hrefs
        .iter()
        .map(|href| {
            format!(r#"<div class="listing-card"><a class="nav-link" href="{href}">View</a></div>"#)
        })
        .collect();
    format!("<html><body><div class=\"results\">{cards}</div></body></html>")
}

pub fn listing_page(address: &str, price: &str, listed_on: &str, cea: &str) -> String {
    format!(
        r#"<html><body>
          <h2 class="amount" data-automation-id="overview-price-txt">{price}</h2>
          <span class="full-address__address">{address}</span>
          <span class="mrt-distance__text">4 mins (300 m) from Newton MRT</span>
          <div class="amenities">
            <div class="amenity"><h4>2 Beds</h4></div>
            <div class="amenity"><h4>2 Baths</h4></div>
            <div class="amenity"><h4>969 sqft</h4></div>
          </div>
          <div class="details">
            <div class="row"><div>Property Type</div><div>Condominium</div></div>
            <div class="row"><div>Listed On</div><div>{listed_on}</div></div>
          </div>
          <div class="agent-name-wrapper"><a>Agent Lim</a></div>
          <div class="agent-description">CEA: {cea} / L3009999X</div>
          <div class="agency">Harbour Realty</div>
        </body></html>"#
    )
}
