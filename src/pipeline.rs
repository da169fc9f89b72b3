//! The crawl as a whole: pick the links, extract every journal, tally.
//!
//! 1. **Links**: read the link file or crawl the listing ([`LinkSource`])
//! 2. **Extraction**: visit each link in order, writing a record per link
//!    ([`run_extraction`])
//! 3. **Report**: print the frequency table, optionally as JSON too
//!    ([`report`])

use crate::config::{FailurePolicy, LinksMode, Settings};
use crate::driver::Driver;
use crate::error::Result;
use crate::models::{CountPolicy, Failure, JournalCounts, Link, LinkRecord, Outcome};
use crate::outputs::links::{LinkFileWriter, read_links, staging_path};
use crate::outputs::records::RecordWriter;
use crate::outputs::summary::{self, SummaryReport};
use crate::scrapers::journal::{RenderWait, extract_journal};
use crate::scrapers::listing::{ListingOptions, collect_links};
use crate::utils::ensure_parent_dir;
use std::io::Write;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Where the list of article links comes from.
#[derive(Debug, Clone)]
pub struct LinkSource {
    pub mode: LinksMode,
    pub links_file: PathBuf,
    /// Write freshly collected links to `links_file`.
    pub persist: bool,
}

impl LinkSource {
    #[instrument(
        level = "info",
        skip_all,
        fields(mode = ?self.mode, links_file = %self.links_file.display())
    )]
    pub async fn resolve<D: Driver>(
        &self,
        driver: &mut D,
        listing: &ListingOptions,
    ) -> Result<Vec<Link>> {
        let reuse = match self.mode {
            LinksMode::Reuse => true,
            LinksMode::Collect => false,
            LinksMode::Auto => tokio::fs::try_exists(&self.links_file).await?,
        };
        if reuse {
            info!("Reusing collected links");
            return read_links(&self.links_file).await;
        }

        info!("Collecting links from the listing");
        if !self.persist {
            return collect_links(driver, listing, None).await;
        }
        ensure_parent_dir(&self.links_file).await?;
        let mut writer = LinkFileWriter::create(staging_path(&self.links_file)).await?;
        let links = match collect_links(driver, listing, Some(&mut writer)).await {
            Ok(links) => links,
            Err(e) => {
                warn!(
                    partial = %writer.path().display(),
                    written = writer.written(),
                    "Link collection failed; link file left untouched"
                );
                return Err(e);
            }
        };
        writer.commit(&self.links_file).await?;
        Ok(links)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub render_wait: RenderWait,
    pub on_error: FailurePolicy,
    pub count_policy: CountPolicy,
}

impl ExtractOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            render_wait: settings.render_wait(),
            on_error: settings.on_error,
            count_policy: settings.count_policy(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub processed: usize,
    /// Links recorded as `error`, in processing order.
    pub failures: Vec<Failure>,
    pub counts: JournalCounts,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Extract the journal of every link, in order, writing one record each.
///
/// Under [`FailurePolicy::Abort`] the first failing link ends the run with
/// its error; records written so far stay on disk.
#[instrument(level = "info", skip_all, fields(links = links.len(), on_error = ?opts.on_error))]
pub async fn run_extraction<D: Driver>(
    driver: &mut D,
    links: &[Link],
    opts: &ExtractOptions,
    records: &mut RecordWriter,
) -> Result<RunSummary> {
    let total = links.len();
    let mut counts = JournalCounts::new(opts.count_policy);
    let mut failures = Vec::new();

    for (i, link) in links.iter().enumerate() {
        let outcome = match extract_journal(driver, link, &opts.render_wait).await {
            Ok(journal) => Outcome::Journal(journal),
            Err(e) => match opts.on_error {
                FailurePolicy::Abort => {
                    error!(index = i, %link, error = %e, "Extraction failed; aborting");
                    return Err(e);
                }
                FailurePolicy::Record => {
                    warn!(
                        index = i,
                        %link,
                        error = %e,
                        "Extraction failed; recording and continuing"
                    );
                    Outcome::Failed(e.to_string())
                }
            },
        };

        let record = LinkRecord {
            link: link.clone(),
            outcome,
        };
        records.write(&record).await?;
        counts.record(&record.outcome);
        if let Outcome::Failed(error) = &record.outcome {
            failures.push(Failure {
                link: link.clone(),
                error: error.clone(),
            });
        }
        info!(n = i + 1, of = total, %link, journal = record.outcome.as_str(), "Processed link");
    }

    info!(
        processed = total,
        failed = failures.len(),
        journals = counts.len(),
        records = records.written(),
        path = %records.path().display(),
        "Extraction complete"
    );
    Ok(RunSummary {
        processed: total,
        failures,
        counts,
    })
}

/// Resolve links, extract journals and return the tallies.
///
/// The driver is closed on every path out of this function.
pub async fn run<D: Driver>(mut driver: D, settings: &Settings) -> Result<RunSummary> {
    let result = crawl(&mut driver, settings).await;
    if let Err(e) = driver.close().await {
        warn!(error = %e, "Failed to close driver");
    }
    result
}

async fn crawl<D: Driver>(driver: &mut D, settings: &Settings) -> Result<RunSummary> {
    let listing = settings.listing_options()?;
    let source = LinkSource {
        mode: settings.links_mode,
        links_file: settings.links_file.clone(),
        persist: settings.persist_links,
    };
    let links = source.resolve(driver, &listing).await?;

    ensure_parent_dir(&settings.output).await?;
    let mut records = RecordWriter::create(&settings.output).await?;
    let opts = ExtractOptions::from_settings(settings);
    run_extraction(driver, &links, &opts, &mut records).await
}

/// Print the frequency table to `out` and write the JSON report if requested.
pub async fn report(summary: &RunSummary, settings: &Settings, out: &mut impl Write) -> Result<()> {
    if summary.counts.is_empty() {
        info!(processed = summary.processed, "No journals to report");
    }
    let rows = summary.counts.sorted();
    summary::print_table(&rows, out)?;

    if let Some(path) = &settings.summary_json {
        ensure_parent_dir(path).await?;
        let report = SummaryReport::new(summary.processed, &summary.failures, &rows);
        summary::write_json(&report, path).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{FakeDriver, FakePage};
    use crate::error::CrawlError;
    use crate::scrapers::journal::JOURNAL_CLASS;
    use crate::scrapers::listing::{LAST_PAGE_CLASS, TITLE_LINK_CLASS};
    use std::path::Path;

    const LISTING: &str = "http://biorxiv.org/content/early/recent";
    const CELL: &str = "http://biorxiv.org/content/1";
    const PLAIN: &str = "http://biorxiv.org/content/2";
    const BROKEN: &str = "http://biorxiv.org/content/3";

    fn site() -> FakeDriver {
        FakeDriver::new()
            .page(LISTING, FakePage::new().with_text(LAST_PAGE_CLASS, "1"))
            .page(
                &format!("{LISTING}?page=0"),
                FakePage::new().with_links(TITLE_LINK_CLASS, &[CELL, PLAIN]),
            )
            .page(
                CELL,
                FakePage::new().with_text(JOURNAL_CLASS, "Now published in Cell doi: 10.1016/x"),
            )
            .page(PLAIN, FakePage::new())
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            links_file: dir.join("links.txt"),
            output: dir.join("out/records.txt"),
            ..Settings::default()
        }
    }

    fn links(items: &[&str]) -> Vec<Link> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn table(summary: &RunSummary) -> String {
        summary::format_table(&summary.counts.sorted())
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_counts_unpublished_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());

        let summary = run(site(), &settings).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(&settings.output).unwrap(),
            format!("{CELL}\tCell\n{PLAIN}\tunpublished\n")
        );
        assert_eq!(
            std::fs::read_to_string(&settings.links_file).unwrap(),
            format!("{CELL}\n{PLAIN}\n")
        );
        assert_eq!(summary.processed, 2);
        assert!(summary.failures.is_empty());
        assert_eq!(table(&summary), "Cell\t1\nunpublished\t1\n");
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_without_unpublished_count() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            count_unpublished: false,
            ..settings(dir.path())
        };

        let summary = run(site(), &settings).await.unwrap();

        assert_eq!(table(&summary), "Cell\t1\n");
        // The record file is unaffected by the count policy.
        assert_eq!(
            std::fs::read_to_string(&settings.output).unwrap().lines().count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn auto_mode_reuses_existing_link_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::write(&settings.links_file, format!("{PLAIN}\n{CELL}\n")).unwrap();
        let mut driver = site();

        let links = LinkSource {
            mode: LinksMode::Auto,
            links_file: settings.links_file.clone(),
            persist: true,
        }
        .resolve(&mut driver, &settings.listing_options().unwrap())
        .await
        .unwrap();

        assert_eq!(links, self::links(&[PLAIN, CELL]));
        assert!(driver.visits.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn collect_mode_overwrites_link_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::write(&settings.links_file, "stale\n").unwrap();
        let mut driver = site();

        let links = LinkSource {
            mode: LinksMode::Collect,
            links_file: settings.links_file.clone(),
            persist: true,
        }
        .resolve(&mut driver, &settings.listing_options().unwrap())
        .await
        .unwrap();

        assert_eq!(links, self::links(&[CELL, PLAIN]));
        assert_eq!(read_links(&settings.links_file).await.unwrap(), links);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_collection_is_not_reused_by_the_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let source = LinkSource {
            mode: LinksMode::Auto,
            links_file: settings.links_file.clone(),
            persist: true,
        };
        let listing = settings.listing_options().unwrap();

        // Listing without a page count.
        let mut broken = FakeDriver::new().page(LISTING, FakePage::new());
        let result = source.resolve(&mut broken, &listing).await;
        assert!(matches!(result, Err(CrawlError::MissingElement(_))));
        assert!(!settings.links_file.exists());

        let mut driver = site();
        let links = source.resolve(&mut driver, &listing).await.unwrap();

        assert_eq!(links, self::links(&[CELL, PLAIN]));
        assert_eq!(driver.visited().len(), 2);
        assert_eq!(read_links(&settings.links_file).await.unwrap(), links);
        assert!(!staging_path(&settings.links_file).exists());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_collection_keeps_previous_link_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::write(&settings.links_file, format!("{CELL}\n")).unwrap();

        let mut broken = FakeDriver::new().page(LISTING, FakePage::new());
        let result = LinkSource {
            mode: LinksMode::Collect,
            links_file: settings.links_file.clone(),
            persist: true,
        }
        .resolve(&mut broken, &settings.listing_options().unwrap())
        .await;

        assert!(result.is_err());
        assert_eq!(
            std::fs::read_to_string(&settings.links_file).unwrap(),
            format!("{CELL}\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn collect_without_persistence_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let mut driver = site();

        let links = LinkSource {
            mode: LinksMode::Collect,
            links_file: settings.links_file.clone(),
            persist: false,
        }
        .resolve(&mut driver, &settings.listing_options().unwrap())
        .await
        .unwrap();

        assert_eq!(links.len(), 2);
        assert!(!settings.links_file.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn reuse_mode_requires_link_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let mut driver = site();

        let result = LinkSource {
            mode: LinksMode::Reuse,
            links_file: settings.links_file.clone(),
            persist: true,
        }
        .resolve(&mut driver, &settings.listing_options().unwrap())
        .await;

        assert!(matches!(result, Err(CrawlError::File(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn record_policy_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.txt");
        let mut records = RecordWriter::create(&path).await.unwrap();
        let opts = ExtractOptions {
            render_wait: RenderWait::default(),
            on_error: FailurePolicy::Record,
            count_policy: CountPolicy::default(),
        };
        let mut driver = site();

        let summary = run_extraction(&mut driver, &links(&[BROKEN, CELL]), &opts, &mut records)
            .await
            .unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures[0].link, BROKEN);
        assert_eq!(
            summary.failures[0].error,
            format!("browser error: navigation to {BROKEN} failed")
        );
        assert_eq!(table(&summary), "Cell\t1\n");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{BROKEN}\terror\n{CELL}\tCell\n")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn doi_inside_prefix_writes_empty_journal_and_is_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.txt");
        let mut records = RecordWriter::create(&path).await.unwrap();
        let opts = ExtractOptions {
            render_wait: RenderWait::default(),
            on_error: FailurePolicy::Record,
            count_policy: CountPolicy::default(),
        };
        let mut driver = FakeDriver::new().page(
            CELL,
            FakePage::new().with_text(JOURNAL_CLASS, "Now published in doi: 10.1/x"),
        );

        let summary = run_extraction(&mut driver, &links(&[CELL]), &opts, &mut records)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), format!("{CELL}\t\n"));
        assert!(summary.counts.is_empty());
        assert_eq!(table(&summary), "");
    }

    #[tokio::test(start_paused = true)]
    async fn abort_policy_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.txt");
        let mut records = RecordWriter::create(&path).await.unwrap();
        let opts = ExtractOptions {
            render_wait: RenderWait::default(),
            on_error: FailurePolicy::Abort,
            count_policy: CountPolicy::default(),
        };
        let mut driver = site();

        let result = run_extraction(
            &mut driver,
            &links(&[CELL, BROKEN, PLAIN]),
            &opts,
            &mut records,
        )
        .await;

        assert!(matches!(result, Err(CrawlError::Browser(_))));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format!("{CELL}\tCell\n")
        );
        assert_eq!(driver.visited(), vec![CELL, BROKEN]);
    }

    #[tokio::test(start_paused = true)]
    async fn report_prints_table_and_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            summary_json: Some(dir.path().join("reports/summary.json")),
            ..settings(dir.path())
        };
        let summary = run(site(), &settings).await.unwrap();

        let mut out = Vec::new();
        report(&summary, &settings, &mut out).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "Cell\t1\nunpublished\t1\n");
        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join("reports/summary.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(json["processed"], 2);
        assert_eq!(json["journals"][1]["journal"], "unpublished");
    }
}
