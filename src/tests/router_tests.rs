use crate::config::AppConfig;
use crate::domain::{ConsolidatedListing, ListingStatus, RawListing, ReconciledRow};
use crate::errors::ServerError;
use crate::forms::MAX_FORM_BYTES;
use crate::router::{handle, AppState};
use crate::spreadsheets::{ListingStore, XlsxStore};
use crate::tests::utils::{
    date, fixed_today, listing_page, search_page, temp_path, FakeFetcher, SEARCH_URL,
};
use astra::{Body, Response};
use http::{Method, Request};
use std::io::Read;
use std::path::Path;

fn test_state(root: &Path, fetcher: FakeFetcher) -> AppState {
    let mut config = AppConfig::from_lookup(|_| None).unwrap();
    config.upload_dir = root.join("uploads");
    config.download_dir = root.join("downloads");

    let mut state = AppState::new(config, Box::new(fetcher));
    state.clock = fixed_today;
    state
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(Body::from(form.as_bytes().to_vec()))
        .unwrap()
}

const BOUNDARY: &str = "----listing-tracker-test";

/// `url` field plus an optional `file` part, as a browser would send them.
fn post_multipart(url: &str, file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"url\"\r\n\r\n{url}\r\n"
    )
    .into_bytes();
    if let Some((file_name, bytes)) = file {
        body.extend(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .into_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend(format!("--{BOUNDARY}--\r\n").into_bytes());

    Request::builder()
        .method(Method::POST)
        .uri("/scrape")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn newton_fetcher() -> FakeFetcher {
    FakeFetcher::default()
        .with_page(SEARCH_URL, search_page(&["/l/1"]))
        .with_page(
            "https://www.example.sg/l/1",
            listing_page("8 Newton Rd (D09)", "S$1,500,000", "01 May 2024", "R111111A"),
        )
}

fn previous_row(address: &str, links: &[&str]) -> ReconciledRow {
    ReconciledRow {
        status: ListingStatus::New,
        listing: ConsolidatedListing::seed(RawListing {
            address: address.to_string(),
            links: links.iter().map(|l| l.to_string()).collect(),
            first_listed_on: Some(date(2024, 3, 1)),
            asking_price: Some(1_600_000.0),
            ..Default::default()
        }),
    }
}

fn body_text(resp: Response) -> String {
    let mut body = String::new();
    resp.into_body().reader().read_to_string(&mut body).unwrap();
    body
}

fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(resp)).unwrap()
}

fn handle_err(req: Request<Body>, state: &AppState) -> ServerError {
    match handle(req, state) {
        Ok(resp) => panic!("expected an error, got status {}", resp.status()),
        Err(e) => e,
    }
}

fn encoded(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[test]
fn home_page_shows_scrape_form() {
    let root = temp_path("router_home");
    let state = test_state(&root, FakeFetcher::default());

    let resp = handle(get("/"), &state).expect("Failed to handle request");
    assert_eq!(resp.status(), 200);

    let body = body_text(resp);
    assert!(body.contains("<form"));
    assert!(body.contains("/scrape"));
    assert!(body.contains("multipart/form-data"));
    assert!(body.contains(r#"type="file""#));
}

#[test]
fn scrape_without_url_is_rejected() {
    let root = temp_path("router_no_url");
    let state = test_state(&root, FakeFetcher::default());

    let resp = handle(post_form("/scrape", "url=++&store="), &state).unwrap();
    assert_eq!(resp.status(), 200);

    let json = body_json(resp);
    assert_eq!(json["status"], "error");
    assert_eq!(json["message"], "Property Search URL is required.");
}

#[test]
fn scrape_then_download_workbook() {
    let root = temp_path("router_scrape");
    let state = test_state(&root, newton_fetcher());

    let form = format!("url={}", encoded(SEARCH_URL));
    let resp = handle(post_form("/scrape", &form), &state).unwrap();
    assert_eq!(resp.status(), 200);

    let json = body_json(resp);
    assert_eq!(json["status"], "success");
    assert_eq!(json["download_url"], "/download/scraped_data.xlsx");
    assert_eq!(json["summary"]["rows_saved"], 1);

    let saved = XlsxStore::new(state.config.output_workbook()).load().unwrap();
    assert_eq!(saved["8 Newton Rd (D09)"].listing.raw.days_in_market, Some(31));

    let resp = handle(get("/download/scraped_data.xlsx"), &state).unwrap();
    assert_eq!(resp.status(), 200);
    let mut bytes = Vec::new();
    resp.into_body().reader().read_to_end(&mut bytes).unwrap();
    // xlsx files are zip archives
    assert!(bytes.starts_with(b"PK"));

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn uploaded_workbook_is_reconciled_against() {
    let root = temp_path("router_upload");
    let state = test_state(&root, newton_fetcher());

    let prior_path = root.join("prior.xlsx");
    XlsxStore::new(&prior_path)
        .save(&[
            previous_row(
                "8 Newton Rd (D09)",
                &["https://www.example.sg/l/1", "https://www.example.sg/l/gone"],
            ),
            previous_row("9 Old Rd (D11)", &["https://www.example.sg/l/9"]),
        ])
        .unwrap();
    let prior_bytes = std::fs::read(&prior_path).unwrap();

    let req = post_multipart(SEARCH_URL, Some(("My Listings.xlsx", &prior_bytes)));
    let resp = handle(req, &state).unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(body_json(resp)["status"], "success");

    // stored under a sanitized name in the upload folder
    assert!(state.config.upload_dir.join("My_Listings.xlsx").is_file());

    let saved = XlsxStore::new(state.config.output_workbook()).load().unwrap();
    assert_eq!(saved.len(), 2);
    let newton = &saved["8 Newton Rd (D09)"];
    assert_eq!(newton.status, ListingStatus::Expired);
    assert_eq!(newton.listing.raw.first_listed_on, Some(date(2024, 3, 1)));
    assert_eq!(newton.listing.raw.days_in_market, Some(92));
    assert_eq!(saved["9 Old Rd (D11)"].status, ListingStatus::New);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn multipart_without_file_runs_fresh() {
    let root = temp_path("router_multipart_fresh");
    let state = test_state(&root, newton_fetcher());

    let resp = handle(post_multipart(SEARCH_URL, None), &state).unwrap();
    assert_eq!(resp.status(), 200);

    let saved = XlsxStore::new(state.config.output_workbook()).load().unwrap();
    assert_eq!(saved["8 Newton Rd (D09)"].status, ListingStatus::New);

    let _ = std::fs::remove_dir_all(root);
}

#[test]
fn named_store_must_exist() {
    let root = temp_path("router_named_store");
    let state = test_state(&root, newton_fetcher());

    let form = format!("url={}&store=typo.xlsx", encoded(SEARCH_URL));
    let err = handle_err(post_form("/scrape", &form), &state);
    assert!(matches!(err, ServerError::BadRequest(_)));
    assert!(!state.config.output_workbook().exists());
}

#[test]
fn oversized_form_is_rejected() {
    let root = temp_path("router_oversized");
    let state = test_state(&root, newton_fetcher());

    let padding = "a".repeat(MAX_FORM_BYTES as usize);
    let form = format!("url={}&note={padding}", encoded(SEARCH_URL));
    let err = handle_err(post_form("/scrape", &form), &state);
    assert!(matches!(err, ServerError::BadRequest(_)));
    assert!(!state.config.output_workbook().exists());
}

#[test]
fn unreachable_search_page_reports_error_json() {
    let root = temp_path("router_unreachable");
    let state = test_state(&root, FakeFetcher::default());

    let form = format!("url={}", encoded(SEARCH_URL));
    let resp = handle(post_form("/scrape", &form), &state).unwrap();
    assert_eq!(resp.status(), 500);

    let json = body_json(resp);
    assert_eq!(json["status"], "error");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .starts_with("An error occurred during scraping and updating"));
    assert!(!state.config.output_workbook().exists());
}

#[test]
fn store_name_outside_upload_folder_is_rejected() {
    let root = temp_path("router_store_name");
    let state = test_state(&root, FakeFetcher::default());

    let form = format!("url={}&store={}", encoded(SEARCH_URL), encoded("../secret.xlsx"));
    let err = handle_err(post_form("/scrape", &form), &state);
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn download_rejects_path_traversal() {
    let root = temp_path("router_traversal");
    let state = test_state(&root, FakeFetcher::default());

    let err = handle_err(get("/download/..%2Fsecret.xlsx"), &state);
    assert!(matches!(err, ServerError::BadRequest(_)));

    let err = handle_err(get("/download/.env"), &state);
    assert!(matches!(err, ServerError::BadRequest(_)));
}

#[test]
fn missing_workbook_and_unknown_routes_are_not_found() {
    let root = temp_path("router_missing");
    let state = test_state(&root, FakeFetcher::default());

    let err = handle_err(get("/download/scraped_data.xlsx"), &state);
    assert!(matches!(err, ServerError::NotFound));

    let err = handle_err(get("/nowhere"), &state);
    assert!(matches!(err, ServerError::NotFound));
}
