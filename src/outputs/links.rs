//! Link list file: one article URL per line.
//!
//! Written page by page while the listing is crawled so that an interrupted
//! crawl still leaves every completed page on disk, and read back wholesale
//! when a later run reuses the collected links.
//!
//! A crawl writes to a `.partial` sibling first ([`staging_path`]); only a
//! completed crawl is moved into place with [`LinkFileWriter::commit`], so a
//! link file that exists is always a whole listing.

use crate::error::Result;
use crate::models::Link;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

#[derive(Debug)]
pub struct LinkFileWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl LinkFileWriter {
    /// Create (or truncate) the link file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        info!("Opened link file");
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Append one listing page worth of links and flush.
    pub async fn append_page(&mut self, links: &[Link]) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }
        let mut chunk = links.join("\n");
        chunk.push('\n');
        self.file.write_all(chunk.as_bytes()).await?;
        self.file.flush().await?;
        self.written += links.len();
        debug!(
            path = %self.path.display(),
            added = links.len(),
            total = self.written,
            "Appended links"
        );
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the file and move it to `dest`, replacing whatever was there.
    #[instrument(
        level = "info",
        skip_all,
        fields(from = %self.path.display(), to = %dest.as_ref().display())
    )]
    pub async fn commit(mut self, dest: impl AsRef<Path>) -> Result<PathBuf> {
        self.file.flush().await?;
        drop(self.file);
        let dest = dest.as_ref().to_path_buf();
        fs::rename(&self.path, &dest).await?;
        info!(links = self.written, "Committed link file");
        Ok(dest)
    }
}

/// Sibling path a crawl writes to before it is committed.
pub fn staging_path(path: impl AsRef<Path>) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Read a link file, skipping blank lines.
#[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
pub async fn read_links(path: impl AsRef<Path>) -> Result<Vec<Link>> {
    let contents = fs::read_to_string(path.as_ref()).await?;
    let links: Vec<Link> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!(count = links.len(), "Loaded links");
    Ok(links)
}
