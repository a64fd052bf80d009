use maud::{html, Markup};

pub mod error;
pub mod scrape_form;

pub use error::html_error_response;
pub use scrape_form::scrape_form;

/// Titled section of the home page.
pub fn panel(title: &str, body: Markup) -> Markup {
    html! {
        section class="panel" {
            h2 class="panel-title" { (title) }
            (body)
        }
    }
}

/// The workbook columns, in the order they are written.
pub fn column_list() -> Markup {
    html! {
        ol class="columns" {
            @for column in crate::spreadsheets::columns::Column::ALL {
                li { (column.header()) }
            }
        }
    }
}
