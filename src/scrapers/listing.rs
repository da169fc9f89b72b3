//! Recent-articles listing crawler.
//!
//! The listing lives at `{base}/content/early/recent` and is paginated with
//! a zero-based `page` query parameter. The `pager-last` label holds the
//! number of pages, so pages `0..last` cover the whole listing.

use crate::driver::Driver;
use crate::error::{CrawlError, Result};
use crate::models::Link;
use crate::outputs::links::LinkFileWriter;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument};
use url::Url;

pub const LISTING_PATH: &str = "/content/early/recent";
pub const LAST_PAGE_CLASS: &str = "pager-last";
pub const TITLE_LINK_CLASS: &str = "highwire-cite-linked-title";

/// Pagination and self-imposed rate limiting for the listing crawl.
#[derive(Debug, Clone)]
pub struct ListingOptions {
    /// Absolute URL of the first listing page.
    pub listing_url: String,
    /// Pause after this many pages; `0` never pauses.
    pub sleep_every: usize,
    /// Length of each pause.
    pub sleep_for: Duration,
    /// Upper bound of random jitter added to each pause, in milliseconds.
    pub jitter_ms: u64,
}

impl ListingOptions {
    pub fn new(listing_url: String) -> Self {
        Self {
            listing_url,
            sleep_every: 10,
            sleep_for: Duration::from_secs(10),
            jitter_ms: 0,
        }
    }

    /// Pause owed after `pages_done` pages, if any.
    fn pause_after(&self, pages_done: usize) -> Option<Duration> {
        if self.sleep_every == 0 || pages_done % self.sleep_every != 0 {
            return None;
        }
        let jitter = if self.jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..=self.jitter_ms))
        } else {
            Duration::ZERO
        };
        Some(self.sleep_for + jitter)
    }
}

/// Listing URL for a site root such as `http://biorxiv.org`.
pub fn listing_url(base_url: &str) -> Result<String> {
    let base = parse_url(base_url)?;
    let listing = base.join(LISTING_PATH).map_err(|source| CrawlError::Url {
        url: base_url.to_string(),
        source,
    })?;
    Ok(listing.to_string())
}

/// URL of listing page `page` (zero-based).
pub fn page_url(listing_url: &str, page: usize) -> Result<String> {
    let mut url = parse_url(listing_url)?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url.to_string())
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| CrawlError::Url {
        url: url.to_string(),
        source,
    })
}

/// Load the listing root and read the number of pages from `pager-last`.
#[instrument(level = "info", skip(driver))]
pub async fn read_page_count<D: Driver>(driver: &mut D, listing_url: &str) -> Result<usize> {
    driver.navigate(listing_url).await?;
    let text = driver
        .text_by_class(LAST_PAGE_CLASS)
        .await?
        .ok_or_else(|| CrawlError::MissingElement(LAST_PAGE_CLASS.to_string()))?;
    let trimmed = text.trim();
    let pages = trimmed.parse::<usize>().map_err(|source| CrawlError::PageCount {
        text: trimmed.to_string(),
        source,
    })?;
    info!(pages, "Read listing page count");
    Ok(pages)
}

/// Article links on a single listing page, in document order.
#[instrument(level = "debug", skip(driver))]
pub async fn extract_links<D: Driver>(driver: &mut D, page_url: &str) -> Result<Vec<Link>> {
    driver.navigate(page_url).await?;
    let links = driver.attrs_by_class(TITLE_LINK_CLASS, "href").await?;
    debug!(count = links.len(), "Extracted article links");
    Ok(links)
}

/// Crawl every listing page and return all article links in order.
///
/// Each page's links are appended to `link_file` as soon as the page is
/// read. Any driver error aborts the crawl; links already flushed to the
/// file are kept.
#[instrument(level = "info", skip_all, fields(listing_url = %opts.listing_url))]
pub async fn collect_links<D: Driver>(
    driver: &mut D,
    opts: &ListingOptions,
    mut link_file: Option<&mut LinkFileWriter>,
) -> Result<Vec<Link>> {
    let last_page = read_page_count(driver, &opts.listing_url).await?;

    let mut links = Vec::new();
    for page in 0..last_page {
        let url = page_url(&opts.listing_url, page)?;
        let page_links = extract_links(driver, &url).await?;

        if let Some(writer) = link_file.as_deref_mut() {
            writer.append_page(&page_links).await?;
        }
        links.extend(page_links);

        let pages_done = page + 1;
        if let Some(pause) = opts.pause_after(pages_done) {
            info!(
                pages = pages_done,
                of = last_page,
                links = links.len(),
                sleep_secs = pause.as_secs_f64(),
                "Pausing listing crawl"
            );
            sleep(pause).await;
        }
    }

    info!(pages = last_page, links = links.len(), "Collected article links");
    Ok(links)
}
