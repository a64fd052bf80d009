// scraper/parse.rs
//
// Field normalization. Everything here degrades to `None` on bad input,
// except the listed-on date which the extractor treats as fatal.

use chrono::NaiveDate;

pub const LISTED_ON_FORMAT: &str = "%d %b %Y";

/// "S$1,234,567" -> 1234567.0
pub fn parse_price(text: Option<&str>) -> Option<f64> {
    let cleaned: String = text?
        .trim()
        .trim_start_matches("S$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Amenities {
    pub bedrooms: Option<String>,
    pub bathrooms: Option<String>,
    pub land_size: Option<String>,
    pub psf: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum AmenityKind {
    Bedrooms,
    Bathrooms,
    LandSize,
    Psf,
}

// Checked in this order; the first keyword found classifies the token.
const AMENITY_KEYWORDS: [(&str, AmenityKind); 4] = [
    ("bed", AmenityKind::Bedrooms),
    ("bath", AmenityKind::Bathrooms),
    ("sqft", AmenityKind::LandSize),
    ("psf", AmenityKind::Psf),
];

/// Classifies amenity tokens such as "3 Bed" or "1,200 sqft".
/// Unmatched tokens are ignored; for a repeated category the last token wins.
pub fn parse_amenities<S: AsRef<str>>(tokens: &[S]) -> Amenities {
    let mut out = Amenities::default();

    for token in tokens {
        let lower = token.as_ref().to_lowercase();
        let Some((value, kind)) = AMENITY_KEYWORDS.iter().find_map(|(keyword, kind)| {
            lower.find(*keyword).map(|pos| (lower[..pos].trim(), *kind))
        }) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        let slot = match kind {
            AmenityKind::Bedrooms => &mut out.bedrooms,
            AmenityKind::Bathrooms => &mut out.bathrooms,
            AmenityKind::LandSize => &mut out.land_size,
            AmenityKind::Psf => &mut out.psf,
        };
        *slot = Some(value.to_string());
    }

    out
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transit {
    pub time: Option<String>,
    pub distance: Option<String>,
    pub station: Option<String>,
}

/// Parses the transit fragment.
///
/// Accepted layouts:
/// - `"5 mins (400 m)"`
/// - `"400 m from Orchard MRT"`
/// - `"5 mins (400 m) from Orchard MRT"`
///
/// Anything else yields an empty `Transit`.
pub fn parse_transit(text: Option<&str>) -> Transit {
    let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
        return Transit::default();
    };

    // ASCII lowering keeps byte offsets aligned with `text`.
    let (head, station) = match text.to_ascii_lowercase().find(" from ") {
        Some(at) => (&text[..at], non_empty(&text[at + " from ".len()..])),
        None => (text, None),
    };

    match paren_span(head) {
        Some((open, close)) => Transit {
            time: non_empty(&head[..open]),
            distance: non_empty(&head[open + 1..close]),
            station,
        },
        None if station.is_some() => Transit {
            time: None,
            distance: non_empty(head),
            station,
        },
        None => Transit::default(),
    }
}

fn paren_span(text: &str) -> Option<(usize, usize)> {
    let open = text.find('(')?;
    let close = open + text[open..].find(')')?;
    Some((open, close))
}

/// "10 Orchard Rd (D09)" -> "09"
pub fn derive_district(address: &str) -> Option<String> {
    let (open, close) = paren_span(address)?;
    let code = address[open + 1..close].trim();

    let mut chars = code.chars();
    let number = match chars.next() {
        Some(prefix) if prefix.is_ascii_alphabetic() => chars.as_str(),
        _ => code,
    };
    non_empty(number)
}

/// Parses "05 Mar 2024".
pub fn parse_listed_on(text: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(text.trim(), LISTED_ON_FORMAT)
}

/// "CEA: R012345A / L3008022J" -> "R012345A"
pub fn parse_cea_number(description: &str) -> Option<String> {
    let (_, rest) = description.split_once("CEA: ")?;
    let number = rest.split(" / ").next().unwrap_or(rest);
    non_empty(number)
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
