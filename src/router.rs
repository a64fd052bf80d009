use crate::config::{AppConfig, OUTPUT_WORKBOOK};
use crate::errors::ServerError;
use crate::forms::{read_form, secure_file_name, PostedForm};
use crate::responses::{html_response, json_response, xlsx_response, ResultResp};
use crate::runner::{run_scrape, RunSummary};
use crate::scraper::PageFetcher;
use crate::spreadsheets::{ListingStore, XlsxStore};
use crate::templates;
use astra::Request;
use chrono::NaiveDate;
use serde::Serialize;
use std::path::Path;
use std::sync::Mutex;

/// Everything a request handler needs. Shared by all server workers.
pub struct AppState {
    pub config: AppConfig,
    pub fetcher: Box<dyn PageFetcher + Send + Sync>,
    pub clock: fn() -> NaiveDate,
    // Held for a whole run: load -> reconcile -> save on the output workbook.
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(config: AppConfig, fetcher: Box<dyn PageFetcher + Send + Sync>) -> Self {
        Self {
            config,
            fetcher,
            clock: || chrono::Local::now().date_naive(),
            run_lock: Mutex::new(()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeReply {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<RunSummary>,
}

impl ScrapeReply {
    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
            download_url: None,
            summary: None,
        }
    }
}

pub fn handle(mut req: Request, state: &AppState) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/") => html_response(templates::pages::home_page()),
        ("POST", "/scrape") => scrape(&mut req, state),
        ("GET", p) if p.starts_with("/download/") => {
            let name = safe_file_name(&p["/download/".len()..])?;
            xlsx_response(&state.config.download_dir.join(name))
        }
        _ => Err(ServerError::NotFound),
    }
}

fn scrape(req: &mut Request, state: &AppState) -> ResultResp {
    let form = read_form(req)?;

    let Some(search_url) = form.value("url") else {
        return json_response(200, &ScrapeReply::error("Property Search URL is required."));
    };

    let _run = state
        .run_lock
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let prior = prior_store(&form, state)?;
    if let Some(store) = &prior {
        tracing::info!(store = %store.path().display(), "reconciling against previous workbook");
    }
    let output = XlsxStore::new(state.config.output_workbook());
    let today = (state.clock)();

    let result = run_scrape(
        state.fetcher.as_ref(),
        search_url,
        prior.as_ref().map(|store| store as &dyn ListingStore),
        &output,
        today,
    );

    match result {
        Ok(summary) => json_response(
            200,
            &ScrapeReply {
                status: "success",
                message: "Scraping and updating completed successfully!".to_string(),
                download_url: Some(format!("/download/{OUTPUT_WORKBOOK}")),
                summary: Some(summary),
            },
        ),
        Err(e) => {
            tracing::error!(url = search_url, "Error during scraping and updating: {e}");
            json_response(
                500,
                &ScrapeReply::error(format!(
                    "An error occurred during scraping and updating: {e}"
                )),
            )
        }
    }
}

/// The previous workbook for this run: an uploaded `file` part, saved into the
/// upload folder, or the `store` field naming a workbook already there.
fn prior_store(form: &PostedForm, state: &AppState) -> Result<Option<XlsxStore>, ServerError> {
    let upload_dir = &state.config.upload_dir;

    if let Some(upload) = form.file("file") {
        let name = secure_file_name(&upload.file_name).ok_or_else(|| {
            ServerError::BadRequest(format!("Invalid file name '{}'", upload.file_name))
        })?;
        let path = upload_dir.join(name);

        std::fs::create_dir_all(upload_dir)
            .and_then(|_| std::fs::write(&path, &upload.bytes))
            .map_err(|e| {
                tracing::error!(path = %path.display(), "❌ cannot save upload: {e}");
                ServerError::InternalError
            })?;
        tracing::info!(
            path = %path.display(),
            bytes = upload.bytes.len(),
            "saved uploaded workbook"
        );
        return Ok(Some(XlsxStore::new(path)));
    }

    match form.value("store") {
        Some(name) => {
            let path = upload_dir.join(safe_file_name(name)?);
            if !path.is_file() {
                return Err(ServerError::BadRequest(format!(
                    "Previous workbook '{name}' was not found in the upload folder"
                )));
            }
            Ok(Some(XlsxStore::new(path)))
        }
        None => Ok(None),
    }
}

/// Accepts a bare file name only; anything that could walk out of the folder is rejected.
fn safe_file_name(name: &str) -> Result<&str, ServerError> {
    let is_bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if name.is_empty() || name.starts_with('.') || !is_bare {
        return Err(ServerError::BadRequest(format!("Invalid file name '{name}'")));
    }
    Ok(name)
}
