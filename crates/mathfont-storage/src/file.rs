use std::path::{Path, PathBuf};

use tokio::sync::{broadcast, Mutex};

use crate::area::{BoxFuture, StorageArea, StorageMap};
use crate::change::{self, AreaName, ChangeFeed, StorageChange};
use crate::error::StorageError;

/// A storage area persisted as one pretty-printed JSON object on disk.
///
/// Writes go to a sibling `.tmp` file and are renamed into place, so a crash
/// mid-write leaves the previous contents intact. All operations on one
/// instance are serialized; two instances on the same path don't see each
/// other's notifications.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
    feed: ChangeFeed,
}

impl FileStorage {
    /// A local area backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_area(path, AreaName::Local)
    }

    pub fn with_area(path: impl Into<PathBuf>, area: AreaName) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            feed: ChangeFeed::new(area),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<StorageMap, StorageError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no storage file, starting empty");
                return Ok(StorageMap::new());
            }
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(StorageError::NotAnObject {
                path: self.path.display().to_string(),
            }),
        }
    }

    async fn write(&self, map: &StorageMap) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(map)?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;

        tracing::debug!(path = %self.path.display(), keys = map.len(), "storage flushed to disk");
        Ok(())
    }
}

impl StorageArea for FileStorage {
    fn area(&self) -> AreaName {
        self.feed.area()
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        Box::pin(async {
            let _guard = self.lock.lock().await;
            self.read().await
        })
    }

    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut stored = self.read().await?;
            let changes = change::apply_set(&mut stored, items);
            self.write(&stored).await?;
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut stored = self.read().await?;
            let changes = change::apply_remove(&mut stored, keys);
            if changes.is_empty() {
                return Ok(());
            }
            self.write(&stored).await?;
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async {
            let _guard = self.lock.lock().await;
            let mut stored = self.read().await?;
            let changes = change::apply_clear(&mut stored);
            self.write(&stored).await?;
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
