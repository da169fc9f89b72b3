//! Run settings.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. built-in defaults (the values the crawler has always used)
//! 2. an optional YAML file passed with `--config`
//! 3. command-line flags / environment variables ([`Cli`])
//!
//! ```yaml
//! base_url: http://biorxiv.org
//! links_file: myCrawlerLinks.txt
//! output: linkPublishedIn.txt
//! sleep_every: 10
//! sleep_for_secs: 10.0
//! wait_mode: poll
//! render_wait_secs: 15.0
//! count_unpublished: false
//! on_error: abort
//! ```

use crate::cli::Cli;
use crate::error::{CrawlError, Result};
use crate::models::CountPolicy;
use crate::scrapers::journal::RenderWait;
use crate::scrapers::listing::{self, ListingOptions};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where the links to extract come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LinksMode {
    /// Reuse the link file when it exists, otherwise crawl the listing.
    Auto,
    /// Always crawl the listing.
    Collect,
    /// Only read the link file.
    Reuse,
}

/// How the article page render wait is performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    /// Sleep for the whole render wait, then look once.
    Fixed,
    /// Look repeatedly until the citation appears or the render wait runs out.
    Poll,
}

/// What a failing article page does to the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run with the error.
    Abort,
    /// Write an `error` record and continue with the next link.
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Plain HTTP requests; no JavaScript.
    Http,
    /// Headless Chromium (requires the `chrome` feature).
    Chrome,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub base_url: String,
    pub links_file: PathBuf,
    pub output: PathBuf,
    pub links_mode: LinksMode,
    pub persist_links: bool,
    pub sleep_every: usize,
    pub sleep_for_secs: f64,
    pub sleep_jitter_ms: u64,
    pub render_wait_secs: f64,
    pub wait_mode: WaitMode,
    pub poll_interval_secs: f64,
    pub count_unpublished: bool,
    pub on_error: FailurePolicy,
    pub summary_json: Option<PathBuf>,
    pub user_agent: String,
    pub driver: DriverKind,
    pub request_timeout_secs: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://biorxiv.org".to_string(),
            links_file: PathBuf::from("myCrawlerLinks.txt"),
            output: PathBuf::from("linkPublishedIn.txt"),
            links_mode: LinksMode::Auto,
            persist_links: true,
            sleep_every: 10,
            sleep_for_secs: 10.0,
            sleep_jitter_ms: 0,
            render_wait_secs: 6.0,
            wait_mode: WaitMode::Fixed,
            poll_interval_secs: 0.5,
            count_unpublished: true,
            on_error: FailurePolicy::Record,
            summary_json: None,
            user_agent: concat!(
                "Mozilla/5.0 (compatible; biorxiv_crawler/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
            driver: DriverKind::Http,
            request_timeout_secs: 60.0,
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the config file (if any), overlaid with `cli`.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        settings.apply_cli(cli);
        settings.validate()?;
        debug!(?settings, "Resolved settings");
        Ok(settings)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CrawlError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let settings = Self::from_yaml(&contents)
            .map_err(|e| CrawlError::Config(format!("{}: {e}", path.display())))?;
        info!(path = %path.display(), "Loaded config file");
        Ok(settings)
    }

    pub fn from_yaml(contents: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(v) = &cli.base_url {
            self.base_url = v.clone();
        }
        if let Some(v) = &cli.links_file {
            self.links_file = v.clone();
        }
        if let Some(v) = &cli.output {
            self.output = v.clone();
        }
        if let Some(v) = cli.links_mode {
            self.links_mode = v;
        }
        if cli.no_persist_links {
            self.persist_links = false;
        }
        if let Some(v) = cli.sleep_every {
            self.sleep_every = v;
        }
        if let Some(v) = cli.sleep_for {
            self.sleep_for_secs = v;
        }
        if let Some(v) = cli.sleep_jitter_ms {
            self.sleep_jitter_ms = v;
        }
        if let Some(v) = cli.render_wait {
            self.render_wait_secs = v;
        }
        if let Some(v) = cli.wait_mode {
            self.wait_mode = v;
        }
        if let Some(v) = cli.poll_interval {
            self.poll_interval_secs = v;
        }
        if let Some(v) = cli.count_unpublished {
            self.count_unpublished = v;
        }
        if let Some(v) = cli.on_error {
            self.on_error = v;
        }
        if let Some(v) = &cli.summary_json {
            self.summary_json = Some(v.clone());
        }
        if let Some(v) = &cli.user_agent {
            self.user_agent = v.clone();
        }
        if let Some(v) = cli.driver {
            self.driver = v;
        }
        if let Some(v) = cli.request_timeout {
            self.request_timeout_secs = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        listing::listing_url(&self.base_url)
            .map_err(|e| CrawlError::Config(format!("base_url: {e}")))?;
        seconds("sleep_for_secs", self.sleep_for_secs)?;
        seconds("render_wait_secs", self.render_wait_secs)?;
        let poll_interval = seconds("poll_interval_secs", self.poll_interval_secs)?;
        if self.wait_mode == WaitMode::Poll && poll_interval.is_zero() {
            return Err(CrawlError::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if seconds("request_timeout_secs", self.request_timeout_secs)?.is_zero() {
            return Err(CrawlError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.links_mode == LinksMode::Reuse && !self.persist_links {
            debug!("persist_links has no effect when links_mode is reuse");
        }
        Ok(())
    }

    pub fn listing_options(&self) -> Result<ListingOptions> {
        Ok(ListingOptions {
            sleep_every: self.sleep_every,
            sleep_for: Duration::from_secs_f64(self.sleep_for_secs),
            jitter_ms: self.sleep_jitter_ms,
            ..ListingOptions::new(listing::listing_url(&self.base_url)?)
        })
    }

    pub fn render_wait(&self) -> RenderWait {
        let wait = Duration::from_secs_f64(self.render_wait_secs);
        match self.wait_mode {
            WaitMode::Fixed => RenderWait::Fixed(wait),
            WaitMode::Poll => RenderWait::Poll {
                timeout: wait,
                interval: Duration::from_secs_f64(self.poll_interval_secs),
            },
        }
    }

    pub fn count_policy(&self) -> CountPolicy {
        CountPolicy {
            count_unpublished: self.count_unpublished,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        CrawlError::Config(format!("{name} must be a non-negative number, got {value}"))
    })
}
