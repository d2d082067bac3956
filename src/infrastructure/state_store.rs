//! Persisted harvest state: the scraped-URL ledger and the release dataset
//!
//! Both artifacts are loaded once at run start and committed once at run end.
//! A commit either replaces both files or leaves both untouched, so the ledger
//! never claims a URL whose record was not saved.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

use crate::domain::{ReleaseDataset, ScrapedUrlLedger};
use crate::infrastructure::config::StorageConfig;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Persisted file {path:?} is malformed: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ledger and dataset as loaded at run start
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub ledger: ScrapedUrlLedger,
    pub dataset: ReleaseDataset,
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Missing or whitespace-only files load as empty; malformed content is
    /// [`StoreError::Corrupt`].
    async fn load(&self) -> StoreResult<PersistedState>;

    /// Replace both artifacts as a single logical write.
    async fn commit(&self, ledger: &ScrapedUrlLedger, dataset: &ReleaseDataset) -> StoreResult<()>;
}

/// File-backed store writing pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    ledger_path: PathBuf,
    dataset_path: PathBuf,
}

impl JsonStateStore {
    pub fn new(ledger_path: impl Into<PathBuf>, dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            ledger_path: ledger_path.into(),
            dataset_path: dataset_path.into(),
        }
    }

    pub fn from_config(storage: &StorageConfig) -> Self {
        Self::new(storage.ledger_path(), storage.dataset_path())
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    /// Swap staged files in. The dataset path exists at every instant: the
    /// previous dataset is copied to `.bak` and the staged one renamed over it.
    async fn move_into_place(&self, staged: &Staged) -> StoreResult<()> {
        let backup = sibling(&self.dataset_path, ".bak");
        let had_dataset = fs::try_exists(&self.dataset_path)
            .await
            .map_err(|e| StoreError::io(&self.dataset_path, e))?;

        if had_dataset {
            fs::copy(&self.dataset_path, &backup)
                .await
                .map_err(|e| StoreError::io(&backup, e))?;
        }

        if let Err(e) = fs::rename(&staged.dataset, &self.dataset_path).await {
            self.discard_backup(had_dataset, &backup).await;
            return Err(StoreError::io(&self.dataset_path, e));
        }

        if let Err(e) = fs::rename(&staged.ledger, &self.ledger_path).await {
            warn!("Ledger write failed, rolling back dataset: {}", e);
            self.roll_back_dataset(had_dataset, &backup).await;
            return Err(StoreError::io(&self.ledger_path, e));
        }

        self.discard_backup(had_dataset, &backup).await;
        Ok(())
    }

    async fn roll_back_dataset(&self, had_dataset: bool, backup: &Path) {
        let restored = if had_dataset {
            fs::rename(backup, &self.dataset_path).await
        } else {
            fs::remove_file(&self.dataset_path).await
        };
        if let Err(e) = restored {
            error!(
                "Failed to roll back dataset {:?} (backup {:?}): {}",
                self.dataset_path, backup, e
            );
        }
    }

    async fn discard_backup(&self, had_dataset: bool, backup: &Path) {
        if !had_dataset {
            return;
        }
        if let Err(e) = fs::remove_file(backup).await {
            warn!("Failed to remove dataset backup {:?}: {}", backup, e);
        }
    }

    /// Put a leftover `.bak` back when the dataset itself is missing.
    ///
    /// Only a commit interrupted mid-swap leaves that state; the ledger on
    /// disk still matches the backup.
    async fn recover_dataset(&self) -> StoreResult<()> {
        let backup = sibling(&self.dataset_path, ".bak");
        let dataset_exists = fs::try_exists(&self.dataset_path)
            .await
            .map_err(|e| StoreError::io(&self.dataset_path, e))?;
        if dataset_exists {
            return Ok(());
        }

        let backup_exists = fs::try_exists(&backup)
            .await
            .map_err(|e| StoreError::io(&backup, e))?;
        if backup_exists {
            warn!("⚠️ Dataset missing, restoring it from {:?}", backup);
            fs::rename(&backup, &self.dataset_path)
                .await
                .map_err(|e| StoreError::io(&self.dataset_path, e))?;
        }
        Ok(())
    }
}

/// Temp files written before anything is renamed
struct Staged {
    ledger: PathBuf,
    dataset: PathBuf,
}

impl Staged {
    async fn discard(&self) {
        for path in [&self.ledger, &self.dataset] {
            if let Err(e) = fs::remove_file(path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove temp file {:?}: {}", path, e);
                }
            }
        }
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self) -> StoreResult<PersistedState> {
        self.recover_dataset().await?;

        let ledger: Vec<String> = read_json_array(&self.ledger_path).await?;
        let dataset = read_json_array(&self.dataset_path).await?;

        let state = PersistedState {
            ledger: ScrapedUrlLedger::from(ledger),
            dataset: ReleaseDataset::from(dataset),
        };
        info!(
            "🔍 Loaded {} previously scraped URLs and {} releases",
            state.ledger.len(),
            state.dataset.len()
        );
        Ok(state)
    }

    async fn commit(&self, ledger: &ScrapedUrlLedger, dataset: &ReleaseDataset) -> StoreResult<()> {
        let dataset_bytes = to_pretty_json(dataset, "release dataset")?;
        let ledger_bytes = to_pretty_json(ledger, "scraped URL ledger")?;

        let staged = Staged {
            ledger: sibling(&self.ledger_path, ".tmp"),
            dataset: sibling(&self.dataset_path, ".tmp"),
        };

        let written = async {
            write_synced(&staged.dataset, &dataset_bytes).await?;
            write_synced(&staged.ledger, &ledger_bytes).await
        }
        .await;

        let result = match written {
            Ok(()) => self.move_into_place(&staged).await,
            Err(e) => Err(e),
        };

        if result.is_err() {
            staged.discard().await;
        } else {
            debug!(
                "Committed {} releases to {:?} and {} URLs to {:?}",
                dataset.len(),
                self.dataset_path,
                ledger.len(),
                self.ledger_path
            );
        }
        result
    }
}

/// `path` with `suffix` appended to its file name
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map_or_else(OsString::new, OsString::from);
    name.push(suffix);
    path.with_file_name(name)
}

fn to_pretty_json<T: Serialize>(value: &T, what: &'static str) -> StoreResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize { what, source })
}

async fn read_json_array<T: DeserializeOwned>(path: &Path) -> StoreResult<Vec<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(StoreError::io(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

async fn write_synced(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StoreError::io(parent, e))?;
    }

    let mut file = fs::File::create(path).await.map_err(|e| StoreError::io(path, e))?;
    file.write_all(bytes).await.map_err(|e| StoreError::io(path, e))?;
    file.sync_all().await.map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
