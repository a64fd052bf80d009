use crate::config::AppConfig;
use crate::router::{handle, AppState};
use crate::scraper::HttpFetcher;
use astra::Server;

mod config;
mod domain;
mod errors;
mod forms;
mod responses;
mod router;
mod runner;
mod scraper;
mod spreadsheets;
mod telemetry;
mod templates;

#[cfg(test)]
mod tests;

fn main() {
    // A missing .env file is fine; the environment may already be set.
    let _ = dotenvy::dotenv();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = telemetry::init(&config.log_level) {
        eprintln!("❌ Logging setup failed: {e}");
        std::process::exit(1);
    }

    for dir in [&config.upload_dir, &config.download_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::error!(dir = %dir.display(), "❌ cannot create folder: {e}");
            std::process::exit(1);
        }
    }

    let fetcher = match HttpFetcher::new(config.fetch.clone()) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::error!("❌ {e}");
            std::process::exit(1);
        }
    };

    let addr = config.addr;
    let workers = config.workers;
    let state = AppState::new(config, Box::new(fetcher));

    tracing::info!("Starting server at http://{addr}");
    let server = Server::bind(&addr).max_workers(workers);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => templates::html_error_response(err),
    });

    if let Err(e) = result {
        tracing::error!("Server ended with error: {e}");
    }

    tracing::info!("Server shut down cleanly.");
}
