use thiserror::Error;

use crate::tabs::TabId;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("settings have not been loaded yet")]
    NotLoaded,

    #[error("storage error: {0}")]
    Storage(#[from] mathfont_storage::StorageError),

    #[error("could not enumerate tabs: {0}")]
    TabQuery(#[source] TabError),
}

/// Failure reported by the tab runtime. Local to one tab, except when
/// returned from a tab query.
#[derive(Debug, Clone, Error)]
pub enum TabError {
    #[error("tab {0} no longer exists")]
    Closed(TabId),

    #[error("tab {tab_id} rejected style injection: {reason}")]
    Rejected { tab_id: TabId, reason: String },

    #[error("tab runtime error: {0}")]
    Runtime(String),
}
