// spreadsheets/columns.rs
//
// Row schema of the persisted listings workbook. Column order is part of the
// contract with whoever opens the sheet.

use crate::domain::listing::{ConsolidatedListing, ListingStatus, RawListing, ReconciledRow};
use chrono::NaiveDate;

pub const STORED_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Address,
    ListingType,
    District,
    Links,
    AskingPrice,
    PreviousPrice,
    PriceChange,
    Size,
    Psf,
    FloorArea,
    PropertyType,
    Tenancy,
    Bedrooms,
    Bathrooms,
    DaysInMarket,
    FirstListedOn,
    MrtDistance,
    MrtTime,
    NearestMrt,
    AgentListingCount,
    ListingAgentChanges,
    AgentCeaNumber,
    AgentName,
    AgentPhone,
    Agency,
}

impl Column {
    pub const ALL: [Column; 25] = [
        Column::Address,
        Column::ListingType,
        Column::District,
        Column::Links,
        Column::AskingPrice,
        Column::PreviousPrice,
        Column::PriceChange,
        Column::Size,
        Column::Psf,
        Column::FloorArea,
        Column::PropertyType,
        Column::Tenancy,
        Column::Bedrooms,
        Column::Bathrooms,
        Column::DaysInMarket,
        Column::FirstListedOn,
        Column::MrtDistance,
        Column::MrtTime,
        Column::NearestMrt,
        Column::AgentListingCount,
        Column::ListingAgentChanges,
        Column::AgentCeaNumber,
        Column::AgentName,
        Column::AgentPhone,
        Column::Agency,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Address => "Address",
            Column::ListingType => "Listing Type",
            Column::District => "District",
            Column::Links => "Links",
            Column::AskingPrice => "Asking Price",
            Column::PreviousPrice => "Previous Price",
            Column::PriceChange => "Price Change",
            Column::Size => "Size",
            Column::Psf => "PSF",
            Column::FloorArea => "Floor Area",
            Column::PropertyType => "Property Type",
            Column::Tenancy => "Tenancy",
            Column::Bedrooms => "Bedrooms",
            Column::Bathrooms => "Bathrooms",
            Column::DaysInMarket => "Days in Market",
            Column::FirstListedOn => "First Listed On",
            Column::MrtDistance => "Mrt Distance",
            Column::MrtTime => "Mrt Time",
            Column::NearestMrt => "Nearest Mrt",
            Column::AgentListingCount => "Agent Listing Count",
            Column::ListingAgentChanges => "Listing Agent Changes",
            Column::AgentCeaNumber => "Agent CEA Number",
            Column::AgentName => "Agent Name",
            Column::AgentPhone => "Agent Phone",
            Column::Agency => "Agency",
        }
    }

    /// Headers written by earlier versions of the workbook.
    fn legacy_headers(self) -> &'static [&'static str] {
        match self {
            Column::ListingType => &["Listing Status"],
            Column::PriceChange => &["Wow Change"],
            Column::Size => &["Size / Strata Size (sqft)"],
            Column::Psf => &["$PSF"],
            Column::FloorArea => &["Land Gross Floor Area (sqft)"],
            Column::AgentListingCount => &["No Of Agent Listing"],
            Column::ListingAgentChanges => &["Listing Agents Change"],
            Column::AgentCeaNumber => &["Agent's CEA Number"],
            Column::AgentName => &["Agent's Name"],
            Column::AgentPhone => &["Agent's Phone Number"],
            _ => &[],
        }
    }

    pub fn from_header(header: &str) -> Option<Column> {
        let header = header.trim();
        Column::ALL.into_iter().find(|col| {
            col.header().eq_ignore_ascii_case(header)
                || col
                    .legacy_headers()
                    .iter()
                    .any(|h| h.eq_ignore_ascii_case(header))
        })
    }
}

/// A value as it lands in one spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

fn text(value: &Option<String>) -> CellValue {
    value
        .as_ref()
        .map_or(CellValue::Empty, |v| CellValue::Text(v.clone()))
}

fn number(value: Option<f64>) -> CellValue {
    value.map_or(CellValue::Empty, CellValue::Number)
}

pub fn encode(row: &ReconciledRow, column: Column) -> CellValue {
    let listing = &row.listing;
    let raw = &listing.raw;

    match column {
        Column::Address => CellValue::Text(raw.address.clone()),
        Column::ListingType => CellValue::Text(row.status.as_str().to_string()),
        Column::District => text(&raw.district),
        Column::Links if raw.links.is_empty() => CellValue::Empty,
        Column::Links => CellValue::Text(raw.links.join("\n")),
        Column::AskingPrice => number(raw.asking_price),
        Column::PreviousPrice => number(listing.previous_price),
        Column::PriceChange => number(listing.price_change),
        Column::Size => text(&raw.land_size),
        Column::Psf => text(&raw.psf),
        Column::FloorArea => text(&raw.floor_area),
        Column::PropertyType => text(&raw.property_type),
        Column::Tenancy => text(&raw.tenancy),
        Column::Bedrooms => text(&raw.bedrooms),
        Column::Bathrooms => text(&raw.bathrooms),
        Column::DaysInMarket => number(raw.days_in_market.map(|d| d as f64)),
        Column::FirstListedOn => raw.first_listed_on.map_or(CellValue::Empty, |d| {
            CellValue::Text(d.format(STORED_DATE_FORMAT).to_string())
        }),
        Column::MrtDistance => text(&raw.mrt_distance),
        Column::MrtTime => text(&raw.mrt_time),
        Column::NearestMrt => text(&raw.nearest_mrt),
        Column::AgentListingCount => CellValue::Number(listing.agent_listing_count as f64),
        Column::ListingAgentChanges => CellValue::Number(listing.listing_agent_changes as f64),
        Column::AgentCeaNumber => text(&raw.agent_cea_number),
        Column::AgentName => text(&raw.agent_name),
        Column::AgentPhone => text(&raw.agent_phone),
        Column::Agency => text(&raw.agency),
    }
}

/// Typed accessors over one loaded sheet row.
pub trait RowCells {
    fn text(&self, column: Column) -> Option<String>;
    fn number(&self, column: Column) -> Option<f64>;
    fn date(&self, column: Column) -> Option<NaiveDate>;
}

/// Rebuilds a persisted row. `status` is decided by the caller because unknown
/// statuses are a loader policy, not a schema one.
pub fn decode(cells: &dyn RowCells, address: String, status: ListingStatus) -> ReconciledRow {
    let raw = RawListing {
        address,
        district: cells.text(Column::District),
        links: cells
            .text(Column::Links)
            .map(|l| parse_links(&l))
            .unwrap_or_default(),
        asking_price: cells.number(Column::AskingPrice),
        property_type: cells.text(Column::PropertyType),
        tenancy: cells.text(Column::Tenancy),
        land_size: cells.text(Column::Size),
        psf: cells.text(Column::Psf),
        floor_area: cells.text(Column::FloorArea),
        bedrooms: cells.text(Column::Bedrooms),
        bathrooms: cells.text(Column::Bathrooms),
        first_listed_on: cells.date(Column::FirstListedOn),
        days_in_market: cells.number(Column::DaysInMarket).map(|d| d.round() as i64),
        mrt_time: cells.text(Column::MrtTime),
        mrt_distance: cells.text(Column::MrtDistance),
        nearest_mrt: cells.text(Column::NearestMrt),
        agent_name: cells.text(Column::AgentName),
        agent_cea_number: cells.text(Column::AgentCeaNumber),
        agent_phone: cells.text(Column::AgentPhone),
        agency: cells.text(Column::Agency),
    };

    ReconciledRow {
        status,
        listing: ConsolidatedListing {
            raw,
            previous_price: cells.number(Column::PreviousPrice),
            price_change: cells.number(Column::PriceChange),
            agent_listing_count: count(cells.number(Column::AgentListingCount)).unwrap_or(1),
            listing_agent_changes: count(cells.number(Column::ListingAgentChanges)).unwrap_or(0),
        },
    }
}

fn count(value: Option<f64>) -> Option<u32> {
    value.filter(|v| *v >= 0.0).map(|v| v.round() as u32)
}

/// Links cell: one URL per line. Older sheets hold a bracketed, quoted list.
pub fn parse_links(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    let body = cell
        .strip_prefix('[')
        .and_then(|c| c.strip_suffix(']'));

    let parts: Vec<&str> = match body {
        Some(list) => quoted_items(list).unwrap_or_else(|| list.split(',').collect()),
        None => cell.lines().collect(),
    };

    parts
        .into_iter()
        .map(|p| p.trim().trim_matches(|c| c == '\'' || c == '"').trim())
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

// Items of a bracketed list, each wrapped in ' or ". Commas inside quotes are
// part of the item. `None` when the list is not fully quoted.
fn quoted_items(list: &str) -> Option<Vec<&str>> {
    let mut items = Vec::new();
    let mut rest = list.trim();

    while !rest.is_empty() {
        let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;
        let inner = &rest[1..];
        let end = inner.find(quote)?;
        items.push(&inner[..end]);
        rest = inner[end + 1..].trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Some(items)
}

/// Accepts stored ISO dates, date-times and the site's "05 Mar 2024" layout.
pub fn parse_stored_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let date_part = text.split(|c| c == ' ' || c == 'T').next().unwrap_or(text);

    NaiveDate::parse_from_str(date_part, STORED_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(text, crate::scraper::parse::LISTED_ON_FORMAT))
        .ok()
}
