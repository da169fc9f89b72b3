//! # bioRxiv Crawler
//!
//! Finds out where bioRxiv preprints ended up being published. The crawler
//! walks the "recent articles" listing, visits every article and reads the
//! "Now published in ..." citation banner, then tallies the journals.
//!
//! ## Usage
//!
//! ```sh
//! biorxiv_crawler -l myCrawlerLinks.txt -o linkPublishedIn.txt
//! ```
//!
//! ## Architecture
//!
//! The crawl is strictly sequential:
//! 1. **Indexing**: collect article links from every listing page, pausing
//!    every few pages (or reuse a link file from an earlier run)
//! 2. **Extraction**: visit each article, wait for it to render, derive the
//!    journal and append a `<link>\t<journal>` record
//! 3. **Summary**: print `<journal>\t<count>` lines, most frequent first
//!
//! Logs go to stderr (`RUST_LOG` controls the level); stdout only carries the
//! summary table.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod driver;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use cli::Cli;
use config::{DriverKind, Settings};
use driver::HttpDriver;
use pipeline::RunSummary;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("biorxiv_crawler starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = match Settings::load(&args) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    let summary = match crawl(&settings).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Crawl failed");
            return Err(e.into());
        }
    };

    let stdout = std::io::stdout();
    if let Err(e) = pipeline::report(&summary, &settings, &mut stdout.lock()).await {
        error!(error = %e, "Failed to write the summary");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        processed = summary.processed,
        failed = summary.failed(),
        journals = summary.counts.len(),
        "Execution complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(driver = ?settings.driver))]
async fn crawl(settings: &Settings) -> error::Result<RunSummary> {
    match settings.driver {
        DriverKind::Http => {
            let driver = HttpDriver::new(&settings.user_agent, settings.request_timeout())?;
            pipeline::run(driver, settings).await
        }
        DriverKind::Chrome => crawl_with_chrome(settings).await,
    }
}

#[cfg(feature = "chrome")]
async fn crawl_with_chrome(settings: &Settings) -> error::Result<RunSummary> {
    let driver = driver::ChromeDriver::launch(&settings.user_agent).await?;
    pipeline::run(driver, settings).await
}

#[cfg(not(feature = "chrome"))]
async fn crawl_with_chrome(_settings: &Settings) -> error::Result<RunSummary> {
    Err(error::CrawlError::Config(
        "the chrome driver needs a build with `--features chrome`".to_string(),
    ))
}
