use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mathfont_core::{Settings, SettingsUpdate, StyleFragment};
use mathfont_storage::{StorageArea, StorageChange};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, OnceCell};
use tokio::task::JoinHandle;

use crate::coordinator::ResyncSummary;
use crate::error::SyncError;
use crate::listener;
use crate::tabs::TabRuntime;

/// Settings updates buffered per watcher.
const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// The one state object of a running extension.
///
/// Owns the settings record and the fragment currently injected into tabs.
/// Shared as `Arc<Background>`; the listeners it spawns only hold weak
/// references and stop once the last `Arc` is dropped.
pub struct Background {
    pub(crate) storage: Arc<dyn StorageArea>,
    pub(crate) tabs: Arc<dyn TabRuntime>,
    pub(crate) options: OnceCell<RwLock<Settings>>,
    /// Subscription taken during the first load, handed to the change listener.
    pub(crate) pending_changes: Mutex<Option<broadcast::Receiver<StorageChange>>>,
    pub(crate) active_fragment: Mutex<Option<StyleFragment>>,
    /// Held for a whole resynchronization pass, and by page-load insertions,
    /// so neither overlaps a pass.
    pub(crate) resync_lock: tokio::sync::Mutex<()>,
    pub(crate) updates: broadcast::Sender<SettingsUpdate>,
    tab_listener_started: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Background {
    pub fn new(storage: Arc<dyn StorageArea>, tabs: Arc<dyn TabRuntime>) -> Arc<Self> {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Arc::new(Self {
            storage,
            tabs,
            options: OnceCell::new(),
            pending_changes: Mutex::new(None),
            active_fragment: Mutex::new(None),
            resync_lock: tokio::sync::Mutex::new(()),
            updates,
            tab_listener_started: AtomicBool::new(false),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Load settings, inject the override into every open tab, then follow
    /// tab updates so pages that finish loading get it too.
    pub async fn start(self: &Arc<Self>) -> Result<ResyncSummary, SyncError> {
        let summary = self.resynchronize_all().await?;

        if !self.tab_listener_started.swap(true, Ordering::SeqCst) {
            let updates = self.tabs.subscribe_updates();
            let handle = listener::spawn_tab_listener(Arc::downgrade(self), updates);
            self.track(handle);
        }

        tracing::info!(
            tabs = summary.tabs,
            failed = summary.failures.len(),
            "background started"
        );
        Ok(summary)
    }

    /// Settings updates applied by the change listener, sent once the
    /// resulting resynchronization has finished.
    pub fn watch_settings(&self) -> broadcast::Receiver<SettingsUpdate> {
        self.updates.subscribe()
    }

    pub(crate) fn track(&self, handle: JoinHandle<()>) {
        self.tasks.lock().push(handle);
    }
}

impl Drop for Background {
    fn drop(&mut self) {
        for handle in self.tasks.get_mut().drain(..) {
            handle.abort();
        }
    }
}
