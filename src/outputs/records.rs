//! Link→journal record file.
//!
//! Every processed link produces one `<link>\t<journal>` line, flushed before
//! the next link is visited, so a crash loses at most the record in flight.

use crate::error::Result;
use crate::models::LinkRecord;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

#[derive(Debug)]
pub struct RecordWriter {
    path: PathBuf,
    file: File,
    written: usize,
}

impl RecordWriter {
    /// Create (or truncate) the record file.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).await?;
        info!("Opened record file");
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    pub async fn write(&mut self, record: &LinkRecord) -> Result<()> {
        self.file.write_all(record.to_line().as_bytes()).await?;
        self.file.flush().await?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Journal, Outcome};

    #[tokio::test]
    async fn each_record_is_on_disk_after_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.txt");
        let mut writer = RecordWriter::create(&path).await.unwrap();

        writer
            .write(&LinkRecord {
                link: "http://a/1".to_string(),
                outcome: Outcome::Journal(Journal::Published("Cell".to_string())),
            })
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "http://a/1\tCell\n");

        writer
            .write(&LinkRecord {
                link: "http://a/2".to_string(),
                outcome: Outcome::Journal(Journal::Unpublished),
            })
            .await
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "http://a/1\tCell\nhttp://a/2\tunpublished\n"
        );
        assert_eq!(writer.written(), 2);
        assert_eq!(writer.path(), path.as_path());
    }
}
