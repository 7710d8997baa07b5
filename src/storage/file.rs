//! File-backed persistent store.
//!
//! One JSON file per entry under `<root>/cache/`, named by the SHA-256 of
//! the cache key. The file body is the serialized [`CacheEntry`].

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, warn};

use super::{PersistentStore, StoreOutcome, TABLE_NAME};
use crate::cache::{CacheEntry, InvalidatePattern};
use crate::error::{CacheError, Result};

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at the XDG cache directory (`~/.cache/fetch_cache/cache` on Linux).
    ///
    /// Returns `None` when no home directory can be determined.
    pub fn default_location() -> Option<Self> {
        let dirs = ProjectDirs::from("", "", "fetch_cache")?;
        Some(Self::with_dir(dirs.cache_dir()))
    }

    /// Store rooted at `root`; entries live in `root/cache/`.
    pub fn with_dir(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(TABLE_NAME),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    async fn read_entry(path: &Path) -> std::result::Result<CacheEntry, String> {
        let bytes = fs::read(path).await.map_err(|e| e.to_string())?;
        serde_json::from_slice(&bytes).map_err(|e| format!("corrupt entry {}: {}", path.display(), e))
    }
}

#[async_trait]
impl PersistentStore for FileStore {
    async fn get(&self, key: &str) -> StoreOutcome<CacheEntry> {
        let path = self.entry_path(key);
        match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<CacheEntry>(&bytes) {
                Ok(entry) if entry.key == key => StoreOutcome::Hit(entry),
                Ok(_) => StoreOutcome::Miss,
                Err(e) => StoreOutcome::Unavailable(format!(
                    "corrupt entry {}: {}",
                    path.display(),
                    e
                )),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => StoreOutcome::Miss,
            Err(e) => StoreOutcome::Unavailable(e.to_string()),
        }
    }

    async fn put(&self, entry: &CacheEntry) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CacheError::Storage(format!("failed to create {}: {}", self.dir.display(), e)))?;

        let json = serde_json::to_vec(entry).map_err(|e| CacheError::Storage(e.to_string()))?;
        let path = self.entry_path(&entry.key);

        // Each writer stages its own temp file so same-key puts never share one.
        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = NamedTempFile::new_in(&dir)
                .map_err(|e| CacheError::Storage(format!("failed to stage entry: {}", e)))?;
            tmp.write_all(&json)
                .map_err(|e| CacheError::Storage(format!("failed to write entry: {}", e)))?;
            tmp.persist(&target)
                .map_err(|e| CacheError::Storage(format!("failed to commit entry: {}", e.error)))?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Storage(format!("write task failed: {}", e)))??;

        debug!(path = %path.display(), "persisted entry");
        Ok(())
    }

    async fn remove_matching(&self, pattern: &InvalidatePattern) -> Result<usize> {
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(CacheError::Storage(e.to_string())),
        };

        let mut removed = 0;
        while let Some(item) = dir
            .next_entry()
            .await
            .map_err(|e| CacheError::Storage(e.to_string()))?
        {
            let path = item.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(entry) if pattern.matches(&entry.key) => {
                    fs::remove_file(&path)
                        .await
                        .map_err(|e| CacheError::Storage(e.to_string()))?;
                    removed += 1;
                }
                Ok(_) => {}
                Err(reason) => warn!(%reason, "skipping unreadable entry during invalidation"),
            }
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Storage(format!("failed to clear store: {}", e))),
        }
    }
}
