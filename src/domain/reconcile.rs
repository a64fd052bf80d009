// src/domain/reconcile.rs

use crate::domain::listing::{
    days_between, ConsolidatedListing, ListingStatus, ReconciledRow,
};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

/// Diffs the consolidated listings of this run against the previously persisted rows.
///
/// Every current address yields one row. Addresses that only exist in `previous`
/// are carried over untouched; the engine never drops history on its own.
/// The returned rows carry no ordering guarantee.
pub fn reconcile(
    current: HashMap<String, ConsolidatedListing>,
    mut previous: HashMap<String, ReconciledRow>,
    today: NaiveDate,
) -> Vec<ReconciledRow> {
    let mut rows = Vec::with_capacity(current.len() + previous.len());

    for (address, listing) in current {
        let row = match previous.remove(&address) {
            None => new_row(listing, today),
            Some(prior) => carried_row(listing, &prior, today),
        };
        rows.push(row);
    }

    // Whatever is left did not reappear in this run.
    rows.extend(previous.into_values());
    rows
}

fn new_row(mut listing: ConsolidatedListing, today: NaiveDate) -> ReconciledRow {
    listing.raw.days_in_market = listing
        .raw
        .first_listed_on
        .map(|listed| days_between(listed, today));

    ReconciledRow {
        status: ListingStatus::New,
        listing,
    }
}

fn carried_row(
    mut listing: ConsolidatedListing,
    prior: &ReconciledRow,
    today: NaiveDate,
) -> ReconciledRow {
    let pinned = prior
        .listing
        .raw
        .first_listed_on
        .or(listing.raw.first_listed_on);
    listing.raw.first_listed_on = pinned;
    listing.raw.days_in_market = pinned.map(|listed| days_between(listed, today));

    listing.listing_agent_changes =
        prior.listing.listing_agent_changes + agent_changed(prior, &listing) as u32;

    let status = if has_expired_links(prior.links(), &listing.raw.links) {
        ListingStatus::Expired
    } else {
        ListingStatus::Existing
    };

    ReconciledRow { status, listing }
}

/// True when at least one previously known link is missing from the current set.
pub fn has_expired_links(previous: &[String], current: &[String]) -> bool {
    let current: HashSet<&str> = current.iter().map(String::as_str).collect();
    previous.iter().any(|link| !current.contains(link.as_str()))
}

fn agent_changed(prior: &ReconciledRow, listing: &ConsolidatedListing) -> bool {
    match (
        prior.listing.raw.agent_cea_number.as_deref(),
        listing.raw.agent_cea_number.as_deref(),
    ) {
        (Some(before), Some(after)) => before != after,
        _ => false,
    }
}
