use std::fmt;

use mathfont_core::StyleFragment;
use mathfont_storage::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::TabError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u32);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabStatus {
    Loading,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
    pub status: TabStatus,
}

/// The part of a tab that just changed. Fields not mentioned are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabChangeInfo {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<TabStatus>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabUpdate {
    pub tab_id: TabId,
    pub change: TabChangeInfo,
    pub tab: Tab,
}

/// When the injected sheet is applied relative to page load. The override
/// always goes in before any page content renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    DocumentStart,
}

/// Details handed to the runtime for one insert or remove.
///
/// Removal only succeeds with the same `code` that was inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CssInjection {
    pub code: String,
    pub all_frames: bool,
    pub run_at: RunAt,
}

impl CssInjection {
    /// Every frame of the tab, before page scripts run.
    pub fn override_fragment(fragment: &StyleFragment) -> Self {
        Self {
            code: fragment.as_str().to_string(),
            all_frames: true,
            run_at: RunAt::DocumentStart,
        }
    }
}

/// The browser's tab surface.
///
/// Methods return boxed futures for dyn compatibility.
pub trait TabRuntime: Send + Sync {
    /// Every open tab, in any window.
    fn query_tabs(&self) -> BoxFuture<'_, Result<Vec<Tab>, TabError>>;

    fn insert_css<'a>(
        &'a self,
        tab_id: TabId,
        injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>>;

    fn remove_css<'a>(
        &'a self,
        tab_id: TabId,
        injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>>;

    /// Tab update events from now on.
    fn subscribe_updates(&self) -> broadcast::Receiver<TabUpdate>;
}
