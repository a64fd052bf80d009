// src/domain/listing.rs

use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;

/// One listing page's extracted data.
/// Created per page fetch and consumed by the merger within the same run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawListing {
    // Address is the merge and reconciliation key, e.g. "10 Orchard Rd (D09)".
    pub address: String,
    pub district: Option<String>,
    pub links: Vec<String>,

    pub asking_price: Option<f64>,

    pub property_type: Option<String>,
    pub tenancy: Option<String>,
    pub land_size: Option<String>,
    pub psf: Option<String>,
    pub floor_area: Option<String>,
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,

    pub first_listed_on: Option<NaiveDate>,
    pub days_in_market: Option<i64>,

    // Transit
    pub mrt_time: Option<String>,
    pub mrt_distance: Option<String>,
    pub nearest_mrt: Option<String>,

    // Agent
    pub agent_name: Option<String>,
    pub agent_cea_number: Option<String>,
    pub agent_phone: Option<String>,
    pub agency: Option<String>,
}

/// One record per unique address within a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedListing {
    pub raw: RawListing,
    pub previous_price: Option<f64>,
    pub price_change: Option<f64>,
    pub agent_listing_count: u32,
    pub listing_agent_changes: u32,
}

impl ConsolidatedListing {
    /// Seeds a consolidated record from the first raw listing seen for an address.
    pub fn seed(raw: RawListing) -> Self {
        Self {
            raw,
            previous_price: None,
            price_change: None,
            agent_listing_count: 1,
            listing_agent_changes: 0,
        }
    }

    pub fn address(&self) -> &str {
        &self.raw.address
    }
}

/// Lifecycle status derived by comparing a run against the persisted store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingStatus {
    New,
    Existing,
    Expired,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::New => "New",
            ListingStatus::Existing => "Existing",
            ListingStatus::Expired => "Expired",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown listing status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ListingStatus {
    type Err = UnknownStatus;

    // Older workbooks wrote the status in lower case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(ListingStatus::New),
            "existing" => Ok(ListingStatus::Existing),
            "expired" => Ok(ListingStatus::Expired),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// The persisted unit: the only entity that survives across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledRow {
    pub status: ListingStatus,
    pub listing: ConsolidatedListing,
}

impl ReconciledRow {
    pub fn address(&self) -> &str {
        self.listing.address()
    }

    pub fn links(&self) -> &[String] {
        &self.listing.raw.links
    }
}

/// Whole days from `listed_on` to `today`, never negative.
pub fn days_between(listed_on: NaiveDate, today: NaiveDate) -> i64 {
    (today - listed_on).num_days().max(0)
}
