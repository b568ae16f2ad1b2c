use std::sync::Arc;

use mathfont_core::{Settings, SettingsPatch};
use parking_lot::RwLock;

use crate::background::Background;
use crate::error::SyncError;
use crate::listener;

impl Background {
    /// Load the settings record once.
    ///
    /// The first caller subscribes to storage changes, reads the area, fills
    /// in defaults for missing keys and starts the change listener. Every
    /// other caller, concurrent or later, waits for that load and returns
    /// without touching storage. A failed load is returned to everyone
    /// waiting on it and leaves the record unloaded.
    pub async fn ensure_loaded(self: &Arc<Self>) -> Result<(), SyncError> {
        self.options
            .get_or_try_init(|| async {
                // Subscribe first so a write landing during the read isn't lost.
                let changes = self.storage.subscribe();
                let stored = self.storage.get_all().await?;

                let defaulted = Settings::missing_keys(&stored);
                let settings = Settings::from_storage(&stored);
                tracing::info!(
                    area = %self.storage.area(),
                    stored_keys = stored.len(),
                    defaulted = ?defaulted,
                    "settings loaded"
                );

                *self.pending_changes.lock() = Some(changes);
                Ok::<_, SyncError>(RwLock::new(settings))
            })
            .await?;

        let pending = self.pending_changes.lock().take();
        if let Some(changes) = pending {
            let handle = listener::spawn_change_listener(Arc::downgrade(self), changes);
            self.track(handle);
        }
        Ok(())
    }

    /// A copy of the cached record.
    ///
    /// Fails with [`SyncError::NotLoaded`] until `ensure_loaded` has
    /// succeeded once.
    pub fn current(&self) -> Result<Settings, SyncError> {
        self.options
            .get()
            .map(|settings| settings.read().clone())
            .ok_or(SyncError::NotLoaded)
    }

    /// Write `patch` to storage.
    ///
    /// The cached record is left alone: it only changes once the storage
    /// notification comes back through the change listener.
    pub async fn set(&self, patch: &SettingsPatch) -> Result<(), SyncError> {
        let items = patch.to_storage();
        if items.is_empty() {
            return Ok(());
        }
        tracing::debug!(keys = ?items.keys().collect::<Vec<_>>(), "writing settings");
        self.storage.set(items).await?;
        Ok(())
    }

    /// Settings-page handshake: the one message a connecting page receives.
    pub async fn handle_connect(self: &Arc<Self>) -> Result<Settings, SyncError> {
        self.ensure_loaded().await?;
        self.current()
    }
}
