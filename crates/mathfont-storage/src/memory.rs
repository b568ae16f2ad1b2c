use tokio::sync::{broadcast, Mutex};

use crate::area::{BoxFuture, StorageArea, StorageMap};
use crate::change::{self, AreaName, ChangeFeed, StorageChange};
use crate::error::StorageError;

/// A storage area that lives for as long as the process does.
pub struct MemoryStorage {
    items: Mutex<StorageMap>,
    feed: ChangeFeed,
}

impl MemoryStorage {
    /// An empty local area.
    pub fn new() -> Self {
        Self::with_items(AreaName::Local, StorageMap::new())
    }

    pub fn with_items(area: AreaName, items: StorageMap) -> Self {
        Self {
            items: Mutex::new(items),
            feed: ChangeFeed::new(area),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageArea for MemoryStorage {
    fn area(&self) -> AreaName {
        self.feed.area()
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        Box::pin(async { Ok(self.items.lock().await.clone()) })
    }

    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let mut stored = self.items.lock().await;
            let changes = change::apply_set(&mut stored, items);
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async move {
            let mut stored = self.items.lock().await;
            let changes = change::apply_remove(&mut stored, keys);
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async {
            let mut stored = self.items.lock().await;
            let changes = change::apply_clear(&mut stored);
            self.feed.publish(changes);
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
