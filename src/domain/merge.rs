// src/domain/merge.rs

use crate::domain::listing::{ConsolidatedListing, RawListing};
use std::collections::HashMap;

/// Merges the raw listings of one run into one consolidated record per address.
///
/// Listings are consumed in discovery order. The first occurrence of an address
/// seeds the record; every later occurrence appends its links, bumps the agent
/// listing count and moves the asking price (last seen wins). All other fields
/// keep the value from the first occurrence.
pub fn merge(raw_listings: Vec<RawListing>) -> HashMap<String, ConsolidatedListing> {
    let mut merged: HashMap<String, ConsolidatedListing> = HashMap::new();

    for listing in raw_listings {
        match merged.get_mut(&listing.address) {
            None => {
                merged.insert(listing.address.clone(), ConsolidatedListing::seed(listing));
            }
            Some(existing) => absorb(existing, listing),
        }
    }

    merged
}

fn absorb(existing: &mut ConsolidatedListing, next: RawListing) {
    // Duplicates are kept; link dedup happens only when comparing link sets.
    existing.raw.links.extend(next.links);
    existing.agent_listing_count += 1;

    let previous = existing.raw.asking_price;
    existing.previous_price = previous;
    existing.price_change = match (previous, next.asking_price) {
        (Some(before), Some(after)) => Some(after - before),
        _ => None,
    };
    existing.raw.asking_price = next.asking_price;
}
