use mathfont_storage::BoxFuture;
use mathfont_sync::{CssInjection, Tab, TabError, TabId, TabRuntime, TabUpdate};
use tokio::sync::broadcast;

/// Tab surface of a process running outside any browser: no tabs are open
/// and none ever finish loading.
pub struct DetachedTabs {
    updates: broadcast::Sender<TabUpdate>,
}

impl DetachedTabs {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(1);
        Self { updates }
    }
}

impl Default for DetachedTabs {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRuntime for DetachedTabs {
    fn query_tabs(&self) -> BoxFuture<'_, Result<Vec<Tab>, TabError>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn insert_css<'a>(
        &'a self,
        tab_id: TabId,
        _injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>> {
        Box::pin(async move { Err(TabError::Closed(tab_id)) })
    }

    fn remove_css<'a>(
        &'a self,
        tab_id: TabId,
        _injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>> {
        Box::pin(async move { Err(TabError::Closed(tab_id)) })
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<TabUpdate> {
        self.updates.subscribe()
    }
}
