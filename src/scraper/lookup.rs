// scraper/lookup.rs
use ::scraper::{ElementRef, Html, Selector};

/// A parsed listing page with typed field accessors.
pub struct ListingDocument {
    html: Html,
}

/// A strategy for locating one text field in a listing page.
pub trait FieldLookup {
    fn lookup(&self, html: &Html) -> Option<String>;
}

/// First element matching a CSS selector.
#[derive(Debug, Clone, Copy)]
pub struct SelectorPath(pub &'static str);

/// A `div` whose text equals the label exactly; the value is its next sibling `div`.
#[derive(Debug, Clone, Copy)]
pub struct LabelAdjacent(pub &'static str);

impl ListingDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn text(&self, lookup: &dyn FieldLookup) -> Option<String> {
        lookup.lookup(&self.html)
    }

    /// Stripped text of every element matching `selector`, in document order.
    pub fn texts(&self, selector: &str) -> Vec<String> {
        let Ok(selector) = Selector::parse(selector) else {
            return Vec::new();
        };
        self.html.select(&selector).filter_map(stripped_text).collect()
    }

    pub fn attr(&self, selector: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(selector).ok()?;
        self.html
            .select(&selector)
            .find_map(|el| el.value().attr(attr))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl FieldLookup for SelectorPath {
    fn lookup(&self, html: &Html) -> Option<String> {
        let selector = Selector::parse(self.0).ok()?;
        html.select(&selector).next().and_then(stripped_text)
    }
}

impl FieldLookup for LabelAdjacent {
    fn lookup(&self, html: &Html) -> Option<String> {
        let divs = Selector::parse("div").ok()?;
        // Wrapper rows holding only the label would otherwise match first.
        html.select(&divs)
            .filter(|el| first_child_div(*el).is_none())
            .filter(|el| stripped_text(*el).as_deref() == Some(self.0))
            .find_map(next_sibling_div)
            .and_then(stripped_text)
    }
}

fn first_child_div(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "div")
}

fn next_sibling_div(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sib| sib.value().name() == "div")
}

/// Text nodes trimmed and joined by single spaces; `None` when nothing is left.
pub fn stripped_text(el: ElementRef<'_>) -> Option<String> {
    let text = el
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <span class="full-address__address">  8 Sentosa Cove (D04) </span>
          <div class="details">
            <div class="row"><div>Property Type</div><div> Condominium </div></div>
            <div class="row"><div>Listed On</div><span>noise</span><div>05 Mar 2024</div></div>
            <div class="row"><div>Tenure</div></div>
          </div>
          <a href="tel:+6591234567">Call</a>
        </body></html>
    "#;

    #[test]
    fn selector_path_returns_stripped_text() {
        let doc = ListingDocument::parse(PAGE);
        assert_eq!(
            doc.text(&SelectorPath("span.full-address__address")).as_deref(),
            Some("8 Sentosa Cove (D04)")
        );
        assert_eq!(doc.text(&SelectorPath("span.missing")), None);
    }

    #[test]
    fn label_adjacent_skips_non_div_siblings() {
        let doc = ListingDocument::parse(PAGE);
        assert_eq!(
            doc.text(&LabelAdjacent("Property Type")).as_deref(),
            Some("Condominium")
        );
        assert_eq!(
            doc.text(&LabelAdjacent("Listed On")).as_deref(),
            Some("05 Mar 2024")
        );
    }

    #[test]
    fn label_adjacent_missing_label_or_value_is_none() {
        let doc = ListingDocument::parse(PAGE);
        assert_eq!(doc.text(&LabelAdjacent("Currently Tenanted")), None);
        assert_eq!(doc.text(&LabelAdjacent("Tenure")), None);
        // label match is exact
        assert_eq!(doc.text(&LabelAdjacent("Listed")), None);
    }

    #[test]
    fn attr_reads_first_match() {
        let doc = ListingDocument::parse(PAGE);
        assert_eq!(
            doc.attr("a[href^='tel:']", "href").as_deref(),
            Some("tel:+6591234567")
        );
    }
}
