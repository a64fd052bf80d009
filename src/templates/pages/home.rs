// templates/pages/home.rs

use crate::templates::{
    components::{column_list, panel, scrape_form},
    desktop_layout,
};
use maud::{html, Markup};

pub fn home_page() -> Markup {
    desktop_layout(
        "Listing Tracker",
        html! {
            h1 { "Scrape property listings" }

            (panel("New run", scrape_form()))

            (panel("How it works", html! {
                p {
                    "Every listing linked from the search page is scraped and listings for "
                    "the same address are merged. The result is reconciled against the "
                    "previous workbook and written to the download folder."
                }
                p { "Columns:" }
                (column_list())
            }))
        },
    )
}
