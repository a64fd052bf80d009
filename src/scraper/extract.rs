// scraper/extract.rs
use crate::domain::listing::{days_between, RawListing};
use crate::scraper::lookup::{LabelAdjacent, ListingDocument, SelectorPath};
use crate::scraper::parse::{
    derive_district, parse_amenities, parse_cea_number, parse_listed_on, parse_price,
    parse_transit,
};
use crate::scraper::ExtractionFailure;
use chrono::NaiveDate;

const ADDRESS: SelectorPath = SelectorPath("span.full-address__address");
const ASKING_PRICE: SelectorPath =
    SelectorPath("h2.amount[data-automation-id='overview-price-txt']");
const MRT_TEXT: SelectorPath = SelectorPath("span.mrt-distance__text");
const AGENT_NAME: SelectorPath = SelectorPath("div.agent-name-wrapper a");
const AGENT_DESCRIPTION: SelectorPath = SelectorPath("div.agent-description");
const AGENCY: SelectorPath = SelectorPath("div.agency");

const FLOOR_SIZE: LabelAdjacent = LabelAdjacent("Floor Size");
const PROPERTY_TYPE: LabelAdjacent = LabelAdjacent("Property Type");
const TENANCY: LabelAdjacent = LabelAdjacent("Currently Tenanted");
const LISTED_ON: LabelAdjacent = LabelAdjacent("Listed On");

const AMENITY_TOKENS: &str = "div.amenities div.amenity h4";
const PHONE_LINK: &str = "a[href^='tel:']";

/// Turns one listing page into a `RawListing`.
///
/// Individual fields degrade to `None` when they are missing or malformed. Only an
/// empty page, a missing address or an unparsable listed-on date reject the record.
/// `today` is the run clock, read once per run by the caller.
pub fn extract(
    html: &str,
    source_url: &str,
    today: NaiveDate,
) -> Result<RawListing, ExtractionFailure> {
    if html.trim().is_empty() {
        return Err(ExtractionFailure::EmptyContent);
    }
    let doc = ListingDocument::parse(html);

    let address = doc.text(&ADDRESS).ok_or(ExtractionFailure::MissingAddress)?;

    let first_listed_on = match doc.text(&LISTED_ON) {
        Some(value) => Some(
            parse_listed_on(&value)
                .map_err(|source| ExtractionFailure::DateFormat { value, source })?,
        ),
        None => None,
    };

    let amenities = parse_amenities(&doc.texts(AMENITY_TOKENS));
    let transit = parse_transit(doc.text(&MRT_TEXT).as_deref());

    Ok(RawListing {
        district: derive_district(&address),
        address,
        links: vec![source_url.to_string()],

        asking_price: parse_price(doc.text(&ASKING_PRICE).as_deref()),

        property_type: doc.text(&PROPERTY_TYPE),
        tenancy: doc.text(&TENANCY),
        land_size: amenities.land_size,
        psf: amenities.psf,
        floor_area: doc.text(&FLOOR_SIZE),
        bedrooms: amenities.bedrooms,
        bathrooms: amenities.bathrooms,

        first_listed_on,
        days_in_market: first_listed_on.map(|listed| days_between(listed, today)),

        mrt_time: transit.time,
        mrt_distance: transit.distance,
        nearest_mrt: transit.station,

        agent_name: doc.text(&AGENT_NAME),
        agent_cea_number: doc
            .text(&AGENT_DESCRIPTION)
            .and_then(|d| parse_cea_number(&d)),
        agent_phone: doc
            .attr(PHONE_LINK, "href")
            .map(|href| href.trim_start_matches("tel:").trim().to_string())
            .filter(|phone| !phone.is_empty()),
        agency: doc.text(&AGENCY),
    })
}
