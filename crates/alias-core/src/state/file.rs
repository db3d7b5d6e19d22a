// # File State Store
//
// File-based implementation of StateStore with crash recovery.
//
// ## Purpose
//
// Keeps the pool and the assignment record across restarts in two plain
// files the operator can read and edit by hand.
//
// ## Crash Recovery
//
// - Atomic writes: every document is written to a `.tmp` sibling, then renamed
// - Automatic backup: the previous document is kept as a `.backup` sibling
// - Corruption detection: the assignment document is validated on load
// - Recovery: falls back to the backup, then to empty state
//
// ## File Format
//
// Pool (`gmails.txt`):
//
// ```text
// abc@gmail.com
// a.bc@gmail.com
// ab.c@gmail.com
// a.b.c@gmail.com
// ```
//
// Assignments (`services_data.json`):
//
// ```json
// {
//     "groq": [
//         "abc@gmail.com",
//         "a.bc@gmail.com"
//     ]
// }
// ```

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::assignment::{AssignmentDocument, AssignmentRecord};
use crate::pool::AliasPool;
use crate::traits::state_store::StateStore;

/// File-based state store with crash recovery
///
/// # Example
///
/// ```rust,no_run
/// use alias_core::state::FileStateStore;
/// use alias_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileStateStore::new("gmails.txt", "services_data.json").await?;
///
///     let pool = store.load_pool().await?;
///     println!("{} aliases", pool.len());
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStateStore {
    pool_path: PathBuf,
    assignments_path: PathBuf,
}

impl FileStateStore {
    /// Create a file state store
    ///
    /// Parent directories of both files are created if missing. Nothing is
    /// read until [`StateStore::load_pool`] / [`StateStore::load_assignments`].
    pub async fn new<P: AsRef<Path>, Q: AsRef<Path>>(
        pool_path: P,
        assignments_path: Q,
    ) -> Result<Self, Error> {
        let pool_path = pool_path.as_ref().to_path_buf();
        let assignments_path = assignments_path.as_ref().to_path_buf();

        for path in [&pool_path, &assignments_path] {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create state directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(Self {
            pool_path,
            assignments_path,
        })
    }

    /// Path of the pool file
    pub fn pool_path(&self) -> &Path {
        &self.pool_path
    }

    /// Path of the assignment file
    pub fn assignments_path(&self) -> &Path {
        &self.assignments_path
    }

    /// Load the assignment document with automatic recovery
    ///
    /// Recovery strategy:
    /// 1. Try to load the main file
    /// 2. If it does not parse, try the backup and restore it over the main file
    /// 3. If the backup also fails, start with an empty document
    async fn load_document_with_recovery(path: &Path) -> AssignmentDocument {
        let error = match Self::load_document(path).await {
            Ok(document) => {
                tracing::debug!("Loaded assignments: {} services", document.len());
                return document;
            }
            Err(e) => e,
        };

        tracing::warn!(
            "Assignment file appears corrupted: {}. Attempting recovery from backup.",
            error
        );

        let backup_path = backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty assignments.");
            return AssignmentDocument::new();
        }

        match Self::load_document(&backup_path).await {
            Ok(document) => {
                tracing::info!("Recovered assignments from backup: {} services", document.len());

                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(
                        "Failed to restore assignment file from backup: {}",
                        restore_err
                    );
                }

                document
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also corrupted: {}. Starting with empty assignments.",
                    backup_err
                );
                AssignmentDocument::new()
            }
        }
    }

    /// Load the assignment document from one file
    async fn load_document(path: &Path) -> Result<AssignmentDocument, Error> {
        if !path.exists() {
            tracing::debug!("Assignment file does not exist: {}", path.display());
            return Ok(AssignmentDocument::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to read assignment file {}: {}",
                path.display(),
                e
            ))
        })?;

        if content.trim().is_empty() {
            return Ok(AssignmentDocument::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            Error::state_store(format!(
                "Failed to parse assignment file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load_pool(&self) -> Result<AliasPool, Error> {
        let path = &self.pool_path;

        match fs::read_to_string(path).await {
            Ok(content) => {
                let pool = AliasPool::from_lines(&content);
                tracing::debug!("Loaded pool from {}: {} aliases", path.display(), pool.len());
                Ok(pool)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Pool file {} not found. Starting with empty pool.", path.display());
                Ok(AliasPool::new())
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read pool file {}: {}. Starting with empty pool.",
                    path.display(),
                    e
                );
                Ok(AliasPool::new())
            }
        }
    }

    async fn load_assignments(&self) -> Result<AssignmentDocument, Error> {
        Ok(Self::load_document_with_recovery(&self.assignments_path).await)
    }

    async fn save_assignments(&self, record: &AssignmentRecord) -> Result<(), Error> {
        let json = render_document(record)?;

        let temp_path = stage(&self.assignments_path, json.as_bytes()).await?;
        if let Err(e) = take_backup(&self.assignments_path).await {
            tracing::warn!("{}", e);
        }
        commit(&temp_path, &self.assignments_path).await?;

        tracing::trace!("Assignments written to file: {}", self.assignments_path.display());
        Ok(())
    }

    async fn replace_all(&self, pool: &AliasPool, record: &AssignmentRecord) -> Result<(), Error> {
        let json = render_document(record)?;

        // Stage both documents before touching either target
        let pool_temp = stage(&self.pool_path, pool.to_lines().as_bytes()).await?;
        let assignments_temp = match stage(&self.assignments_path, json.as_bytes()).await {
            Ok(temp) => temp,
            Err(e) => {
                let _ = fs::remove_file(&pool_temp).await;
                return Err(e);
            }
        };

        // Without a usable backup a failed pool rename could not be undone
        let had_assignments = match take_backup(&self.assignments_path).await {
            Ok(existed) => existed,
            Err(e) => {
                let _ = fs::remove_file(&pool_temp).await;
                let _ = fs::remove_file(&assignments_temp).await;
                return Err(e);
            }
        };
        if let Err(e) = commit(&assignments_temp, &self.assignments_path).await {
            let _ = fs::remove_file(&pool_temp).await;
            return Err(e);
        }

        if let Err(e) = take_backup(&self.pool_path).await {
            tracing::warn!("{}", e);
        }
        if let Err(e) = commit(&pool_temp, &self.pool_path).await {
            // Put the previous assignments back so the old pool stays consistent
            let rollback = if had_assignments {
                fs::copy(backup_path(&self.assignments_path), &self.assignments_path)
                    .await
                    .map(|_| ())
            } else {
                fs::remove_file(&self.assignments_path).await
            };
            if let Err(rollback_err) = rollback {
                tracing::error!("Failed to roll back assignment file: {}", rollback_err);
            }
            let _ = fs::remove_file(&pool_temp).await;
            return Err(e);
        }

        // The old backup belongs to the replaced pool; recovery must not bring it back
        refresh_backup(&self.assignments_path).await;

        tracing::trace!(
            "Pool and assignments replaced: {}, {}",
            self.pool_path.display(),
            self.assignments_path.display()
        );
        Ok(())
    }
}

/// Pretty-printed JSON for the assignment document
fn render_document(record: &AssignmentRecord) -> Result<String, Error> {
    let mut json = serde_json::to_string_pretty(&record.to_document())?;
    json.push('\n');
    Ok(json)
}

/// Write `contents` to the temporary sibling of `path`
async fn stage(path: &Path, contents: &[u8]) -> Result<PathBuf, Error> {
    let temp_path = temp_path(path);

    let mut file = fs::File::create(&temp_path).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to create temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.write_all(contents).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to write to temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.flush().await.map_err(|e| {
        Error::state_store(format!(
            "Failed to flush temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    file.sync_all().await.map_err(|e| {
        Error::state_store(format!(
            "Failed to sync temp file {}: {}",
            temp_path.display(),
            e
        ))
    })?;

    Ok(temp_path)
}

/// Copy the current file to its backup sibling
///
/// Returns `Ok(true)` once a backup of an existing file is in place and
/// `Ok(false)` when there was nothing to back up.
async fn take_backup(path: &Path) -> Result<bool, Error> {
    if !path.exists() {
        return Ok(false);
    }
    fs::copy(path, backup_path(path)).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to create backup of {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(true)
}

/// Make the backup sibling mirror the committed file, or drop it
async fn refresh_backup(path: &Path) {
    let backup = backup_path(path);
    if let Err(e) = fs::copy(path, &backup).await {
        tracing::warn!("Failed to refresh backup of {}: {}", path.display(), e);
        if let Err(remove_err) = fs::remove_file(&backup).await
            && remove_err.kind() != std::io::ErrorKind::NotFound
        {
            tracing::error!(
                "Stale backup {} could not be removed: {}",
                backup.display(),
                remove_err
            );
        }
    }
}

/// Atomically move a staged file over its target
async fn commit(temp_path: &Path, path: &Path) -> Result<(), Error> {
    fs::rename(temp_path, path).await.map_err(|e| {
        Error::state_store(format!(
            "Failed to rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        ))
    })
}

fn temp_path(path: &Path) -> PathBuf {
    with_suffix(path, ".tmp")
}

fn backup_path(path: &Path) -> PathBuf {
    with_suffix(path, ".backup")
}

/// `services_data.json` -> `services_data.json.backup`
fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
