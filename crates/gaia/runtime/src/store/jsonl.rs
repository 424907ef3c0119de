//! Append-only JSON-lines ledger store
//!
//! One journal entry per line. A batch is written with a single write and
//! flushed to disk before `append` returns. A batch that fails to write or
//! sync is cut back off the file, so a failed append leaves no trace.

use super::traits::{LedgerStore, StoreResult};
use async_trait::async_trait;
use gaia_types::JournalEntry;
use std::path::{Path, PathBuf};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// File-backed store
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    writer: Mutex<()>,
    #[cfg(test)]
    fail_next_sync: std::sync::atomic::AtomicBool,
}

impl JsonLinesStore {
    /// Open (creating parent directories as needed) the journal at `path`
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            writer: Mutex::new(()),
            #[cfg(test)]
            fail_next_sync: std::sync::atomic::AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_batch(&self, file: &mut File, buf: &[u8]) -> std::io::Result<()> {
        file.write_all(buf).await?;
        if let Some(e) = self.injected_sync_failure() {
            return Err(e);
        }
        file.sync_data().await
    }

    #[cfg(test)]
    fn injected_sync_failure(&self) -> Option<std::io::Error> {
        self.fail_next_sync
            .swap(false, std::sync::atomic::Ordering::SeqCst)
            .then(|| std::io::Error::other("injected sync failure"))
    }

    #[cfg(not(test))]
    fn injected_sync_failure(&self) -> Option<std::io::Error> {
        None
    }
}

#[async_trait]
impl LedgerStore for JsonLinesStore {
    async fn append(&self, entries: &[JournalEntry]) -> StoreResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        let _guard = self.writer.lock().await;
        let mut file = OpenOptions::new().append(true).open(&self.path).await?;
        let committed_len = file.metadata().await?.len();

        if let Err(e) = self.write_batch(&mut file, &buf).await {
            // Drop whatever part of the batch reached the file
            if let Err(truncate) = file.set_len(committed_len).await {
                error!(
                    path = %self.path.display(),
                    error = %truncate,
                    "Failed to roll back a partial journal write"
                );
            } else if let Err(sync) = file.sync_data().await {
                error!(path = %self.path.display(), error = %sync, "Failed to sync journal rollback");
            }
            return Err(e.into());
        }

        debug!(path = %self.path.display(), count = entries.len(), "Journal entries appended");
        Ok(())
    }

    async fn entries(&self) -> StoreResult<Vec<JournalEntry>> {
        let _guard = self.writer.lock().await;
        let contents = fs::read_to_string(&self.path).await?;
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}
