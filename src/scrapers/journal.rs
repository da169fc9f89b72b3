//! Journal extraction from article pages.
//!
//! Published preprints carry a banner such as
//! `Now published in Nature Biotechnology doi: 10.1038/nbt.3820`. The journal
//! name is everything between the three-word prefix and the `doi:` token.

use crate::driver::Driver;
use crate::error::Result;
use crate::models::Journal;
use crate::utils::truncate_for_log;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument};

pub const JOURNAL_CLASS: &str = "pub_jnl";
const DOI_TOKEN: &str = "doi:";
/// Fields before the journal name ("Now published in").
const JOURNAL_FIELD_OFFSET: usize = 3;

/// How long to give an article page to render its citation banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWait {
    /// Sleep for a fixed time, then look once.
    Fixed(Duration),
    /// Look every `interval` until the banner appears or `timeout` passes.
    Poll { timeout: Duration, interval: Duration },
}

impl Default for RenderWait {
    fn default() -> Self {
        RenderWait::Fixed(Duration::from_secs(6))
    }
}

/// Derive the journal from the citation banner text, if there was one.
pub fn parse_journal(text: Option<&str>) -> Journal {
    let Some(text) = text else {
        return Journal::Unpublished;
    };
    let fields: Vec<&str> = text.split_whitespace().collect();
    let Some(doi_at) = fields.iter().position(|field| *field == DOI_TOKEN) else {
        return Journal::Unpublished;
    };
    // A `doi:` inside the prefix leaves an empty name, which is never counted.
    let name = fields
        .get(JOURNAL_FIELD_OFFSET..doi_at)
        .map(|name| name.join(" "))
        .unwrap_or_default();
    Journal::Published(name)
}

/// Load `link` and derive its journal.
///
/// A missing banner yields [`Journal::Unpublished`]; navigation and lookup
/// errors are returned.
#[instrument(level = "info", skip(driver, wait))]
pub async fn extract_journal<D: Driver>(
    driver: &mut D,
    link: &str,
    wait: &RenderWait,
) -> Result<Journal> {
    driver.navigate(link).await?;

    let text = match *wait {
        RenderWait::Fixed(delay) => {
            sleep(delay).await;
            driver.text_by_class(JOURNAL_CLASS).await?
        }
        RenderWait::Poll { timeout, interval } => {
            poll_text(driver, JOURNAL_CLASS, timeout, interval).await?
        }
    };

    if let Some(text) = &text {
        debug!(citation = %truncate_for_log(text, 200), "Found citation banner");
    }
    let journal = parse_journal(text.as_deref());
    debug!(%journal, "Derived journal");
    Ok(journal)
}

async fn poll_text<D: Driver>(
    driver: &mut D,
    class: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<Option<String>> {
    let started = Instant::now();
    loop {
        if let Some(text) = driver.text_by_class(class).await? {
            return Ok(Some(text));
        }
        let waited = started.elapsed();
        if waited >= timeout {
            debug!(class, ?waited, "Element did not appear before timeout");
            return Ok(None);
        }
        sleep(interval.min(timeout - waited)).await;
    }
}
