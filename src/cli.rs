//! Command-line interface definitions.
//!
//! Every option is optional: anything left unset falls back to the config
//! file given with `--config`, then to the built-in defaults (see
//! [`Settings`](crate::config::Settings)). Options can also be supplied via
//! `BIORXIV_*` environment variables.

use crate::config::{DriverKind, FailurePolicy, LinksMode, WaitMode};
use clap::Parser;
use std::path::PathBuf;

/// Crawl the bioRxiv recent-articles listing and tally where preprints were published.
///
/// # Examples
///
/// ```sh
/// # Crawl the listing (or reuse myCrawlerLinks.txt) and extract journals
/// biorxiv_crawler
///
/// # Reuse a link file, wait for the citation instead of sleeping, keep going on errors
/// biorxiv_crawler --links-mode reuse -l links.txt --wait-mode poll --render-wait 15
///
/// # Leave "unpublished" out of the summary and also write it as JSON
/// biorxiv_crawler --count-unpublished false --summary-json summary.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long, env = "BIORXIV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Site root the listing is crawled from
    #[arg(long, env = "BIORXIV_BASE_URL")]
    pub base_url: Option<String>,

    /// Link list file (written when collecting, read when reusing)
    #[arg(short, long, env = "BIORXIV_LINKS_FILE")]
    pub links_file: Option<PathBuf>,

    /// Record file receiving one `<link>\t<journal>` line per article
    #[arg(short, long, env = "BIORXIV_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Where links come from
    #[arg(long, value_enum, env = "BIORXIV_LINKS_MODE")]
    pub links_mode: Option<LinksMode>,

    /// Do not write collected links to the link file
    #[arg(long)]
    pub no_persist_links: bool,

    /// Pause after this many listing pages (0 disables pausing)
    #[arg(long, value_name = "PAGES")]
    pub sleep_every: Option<usize>,

    /// Length of each listing pause, in seconds
    #[arg(long, value_name = "SECS")]
    pub sleep_for: Option<f64>,

    /// Random jitter added to each listing pause, in milliseconds
    #[arg(long, value_name = "MS")]
    pub sleep_jitter_ms: Option<u64>,

    /// Time given to an article page to render its citation, in seconds
    #[arg(long, value_name = "SECS")]
    pub render_wait: Option<f64>,

    /// Sleep the whole render wait, or poll until the citation appears
    #[arg(long, value_enum)]
    pub wait_mode: Option<WaitMode>,

    /// Polling interval for `--wait-mode poll`, in seconds
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<f64>,

    /// Whether "unpublished" takes part in the summary counts
    #[arg(long, value_name = "BOOL", action = clap::ArgAction::Set)]
    pub count_unpublished: Option<bool>,

    /// What to do when an article page fails
    #[arg(long, value_enum)]
    pub on_error: Option<FailurePolicy>,

    /// Also write the summary as JSON to this path
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// User agent sent with every request
    #[arg(long, env = "BIORXIV_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Browser driver
    #[arg(long, value_enum, env = "BIORXIV_DRIVER")]
    pub driver: Option<DriverKind>,

    /// Per-request timeout for the HTTP driver, in seconds
    #[arg(long, value_name = "SECS")]
    pub request_timeout: Option<f64>,
}
