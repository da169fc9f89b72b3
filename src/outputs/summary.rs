//! Journal frequency summary: tab-separated console table and JSON report.

use crate::error::Result;
use crate::models::{Failure, JournalCount};
use chrono::Local;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// JSON form of a finished run.
#[derive(Debug, Serialize)]
pub struct SummaryReport<'a> {
    pub generated_at: String,
    pub processed: usize,
    pub failed: usize,
    pub journals: &'a [JournalCount],
    pub failures: &'a [Failure],
}

impl<'a> SummaryReport<'a> {
    pub fn new(processed: usize, failures: &'a [Failure], journals: &'a [JournalCount]) -> Self {
        Self {
            generated_at: Local::now().to_rfc3339(),
            processed,
            failed: failures.len(),
            journals,
            failures,
        }
    }
}

/// Render rows as `<journal>\t<count>` lines.
pub fn format_table(rows: &[JournalCount]) -> String {
    let mut out = String::new();
    for row in rows {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}\t{}", row.journal, row.count);
    }
    out
}

/// Print the table to `out` (stdout in the binary).
pub fn print_table(rows: &[JournalCount], out: &mut impl Write) -> io::Result<()> {
    out.write_all(format_table(rows).as_bytes())?;
    out.flush()
}

#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn write_json(report: &SummaryReport<'_>, path: impl AsRef<Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    fs::write(path.as_ref(), json).await?;
    info!(journals = report.journals.len(), "Wrote JSON summary");
    Ok(())
}
