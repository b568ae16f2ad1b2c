//! Background tasks following storage changes and tab updates.

use std::sync::{Arc, Weak};

use mathfont_core::{SettingKey, Settings, SettingsUpdate};
use mathfont_storage::{AreaName, StorageChange};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use crate::background::Background;
use crate::error::SyncError;
use crate::tabs::TabUpdate;

/// Follow storage notifications until the area closes its feed or the
/// background is gone.
pub(crate) fn spawn_change_listener(
    background: Weak<Background>,
    mut changes: broadcast::Receiver<StorageChange>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let received = changes.recv().await;
            let Some(background) = background.upgrade() else {
                break;
            };
            let result = match received {
                Ok(change) => background.handle_storage_change(&change).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "storage listener lagged, reloading settings");
                    background.reload().await.map(Some)
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("storage change feed closed");
                    break;
                }
            };
            match result {
                Ok(Some(update)) => {
                    // Nobody watching is the common case.
                    let _ = background.updates.send(update);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "failed to apply storage change"),
            }
        }
    })
}

/// Insert the current fragment into tabs as their pages finish loading.
pub(crate) fn spawn_tab_listener(
    background: Weak<Background>,
    mut updates: broadcast::Receiver<TabUpdate>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let update = match updates.recv().await {
                Ok(update) => update,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "tab listener lagged, some loads missed the override");
                    continue;
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("tab update feed closed");
                    break;
                }
            };
            let Some(background) = background.upgrade() else {
                break;
            };
            // Failures are logged by on_page_load_complete and stay local.
            let _ = background.on_tab_updated(&update).await;
        }
    })
}

impl Background {
    /// Apply one notification to the record and resynchronize every tab.
    ///
    /// Notifications from areas other than `local` are dropped. Returns the
    /// update that was applied, `None` for a dropped notification.
    pub async fn handle_storage_change(
        self: &Arc<Self>,
        change: &StorageChange,
    ) -> Result<Option<SettingsUpdate>, SyncError> {
        if change.area != AreaName::Local {
            tracing::trace!(area = %change.area, "ignoring change outside the local area");
            return Ok(None);
        }

        let update = self.apply_change(change)?;
        tracing::debug!(changed = ?update.changed, "settings changed");
        self.resynchronize_all().await?;
        Ok(Some(update))
    }

    fn apply_change(&self, change: &StorageChange) -> Result<SettingsUpdate, SyncError> {
        let options = self.options.get().ok_or(SyncError::NotLoaded)?;
        let mut settings = options.write();
        let previous = settings.clone();

        let mut changed = Vec::new();
        for key in SettingKey::ALL {
            let Some(value) = change.get(key.as_str()) else {
                continue;
            };
            // A removed key falls back to its default; the record stays full.
            match &value.new_value {
                Some(new_value) => settings.apply(key, new_value),
                None => settings.reset(key),
            }
            changed.push(key);
        }

        Ok(SettingsUpdate {
            previous,
            current: settings.clone(),
            changed,
        })
    }

    /// Re-read the whole area after notifications were missed.
    async fn reload(self: &Arc<Self>) -> Result<SettingsUpdate, SyncError> {
        let stored = self.storage.get_all().await?;
        let fresh = Settings::from_storage(&stored);

        let update = {
            let options = self.options.get().ok_or(SyncError::NotLoaded)?;
            let mut settings = options.write();
            let previous = std::mem::replace(&mut *settings, fresh.clone());
            SettingsUpdate {
                changed: previous.diff(&fresh),
                previous,
                current: fresh,
            }
        };

        self.resynchronize_all().await?;
        Ok(update)
    }
}
