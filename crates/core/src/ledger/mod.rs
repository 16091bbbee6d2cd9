//! Persisted set of identifiers for items already fully processed.
//!
//! The ledger is the dedup boundary: source adapters check it before
//! enqueuing and the orchestrator commits to it only after publish succeeds.
//! Backing store is a flat file, one identifier per line, fully rewritten on
//! each commit via write-then-rename so a crash never corrupts the set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Errors from ledger persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to persist ledger file {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Completed-item identifier set with a single-file backing store.
///
/// Safe to share between the feed poller and the orchestrator run loop; the
/// in-memory set is lock-protected and persistence happens under the same
/// lock so concurrent commits cannot interleave rewrites.
pub struct Ledger {
    path: PathBuf,
    entries: Mutex<HashSet<String>>,
}

impl Ledger {
    /// Loads the ledger from `path`. A missing file is an empty ledger.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                return Err(LedgerError::Read {
                    path,
                    source: e,
                })
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Whether `id` has already been fully processed.
    pub async fn contains(&self, id: &str) -> bool {
        self.entries.lock().await.contains(id)
    }

    /// Number of committed identifiers.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Records `id` as fully processed and persists the set.
    ///
    /// The identifier stays in the in-memory set even when persistence fails,
    /// so the same task is not retried within this process; the caller treats
    /// the error as a non-fatal warning.
    pub async fn commit(&self, id: &str) -> Result<(), LedgerError> {
        let mut entries = self.entries.lock().await;
        if !entries.insert(id.to_string()) {
            return Ok(());
        }
        Self::persist(&self.path, &entries).await
    }

    /// Atomically rewrites the backing file: write a sibling temp file, then
    /// rename over the original.
    async fn persist(path: &Path, entries: &HashSet<String>) -> Result<(), LedgerError> {
        let wrap = |source| LedgerError::Persist {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(wrap)?;
            }
        }

        let mut lines: Vec<&str> = entries.iter().map(String::as_str).collect();
        lines.sort_unstable();
        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        let tmp_path = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp_path).await.map_err(wrap)?;
        file.write_all(contents.as_bytes()).await.map_err(wrap)?;
        file.sync_all().await.map_err(wrap)?;
        drop(file);

        tokio::fs::rename(&tmp_path, path).await.map_err(wrap)?;
        Ok(())
    }
}
