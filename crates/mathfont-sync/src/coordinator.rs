use std::sync::Arc;

use futures::future::join_all;
use mathfont_core::{synthesize, StyleFragment};

use crate::background::Background;
use crate::error::{SyncError, TabError};
use crate::tabs::{CssInjection, Tab, TabId, TabStatus, TabUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStep {
    Remove,
    Insert,
}

/// One step that failed in one tab. Other tabs are unaffected.
#[derive(Debug, Clone)]
pub struct TabFailure {
    pub tab_id: TabId,
    pub step: TabStep,
    pub error: TabError,
}

/// Outcome of a resynchronization pass.
#[derive(Debug, Clone)]
pub struct ResyncSummary {
    /// Tabs visited.
    pub tabs: usize,
    /// The fragment now considered injected.
    pub fragment: Option<StyleFragment>,
    pub failures: Vec<TabFailure>,
}

impl Background {
    /// Replace the override fragment in every open tab.
    ///
    /// The fragment recorded as injected is swapped for one synthesized from
    /// the current record, then each tab has the old one removed and the new
    /// one inserted. Tabs are processed concurrently; within a tab the
    /// removal finishes before the insertion starts, and a failed removal
    /// doesn't prevent the insertion. Per-tab failures are collected in the
    /// summary. Only a failed load or tab query fails the pass.
    ///
    /// Passes are serialized: one started while another runs waits for it,
    /// so each pass removes exactly what the previous one inserted.
    pub async fn resynchronize_all(self: &Arc<Self>) -> Result<ResyncSummary, SyncError> {
        self.ensure_loaded().await?;
        let _pass = self.resync_lock.lock().await;

        let tabs = self.tabs.query_tabs().await.map_err(SyncError::TabQuery)?;

        let fragment = synthesize(&self.current()?);
        let previous = std::mem::replace(&mut *self.active_fragment.lock(), fragment.clone());
        if previous != fragment {
            tracing::info!(
                fragment = fragment.as_ref().map(StyleFragment::as_str),
                "override fragment changed"
            );
        }

        let old = previous.as_ref().map(CssInjection::override_fragment);
        let new = fragment.as_ref().map(CssInjection::override_fragment);

        let failures: Vec<TabFailure> = join_all(
            tabs.iter()
                .map(|tab| self.update_tab(tab.id, old.as_ref(), new.as_ref())),
        )
        .await
        .into_iter()
        .flatten()
        .collect();

        tracing::debug!(
            tabs = tabs.len(),
            failed = failures.len(),
            "resynchronized tabs"
        );
        Ok(ResyncSummary {
            tabs: tabs.len(),
            fragment,
            failures,
        })
    }

    /// Give a tab that just finished loading the current fragment.
    ///
    /// Holds the pass lock through the insertion: a pass running meanwhile
    /// would otherwise remove the old fragment before this inserts it.
    pub async fn on_page_load_complete(&self, tab: &Tab) -> Result<(), TabError> {
        let _pass = self.resync_lock.lock().await;
        let fragment = self.active_fragment.lock().clone();
        let Some(fragment) = fragment else {
            return Ok(());
        };
        let injection = CssInjection::override_fragment(&fragment);
        self.tabs.insert_css(tab.id, &injection).await.inspect_err(|e| {
            tracing::debug!(tab_id = %tab.id, error = %e, "inserting override after load failed");
        })
    }

    /// React to a tab update event. Only completed loads matter.
    pub async fn on_tab_updated(&self, update: &TabUpdate) -> Result<(), TabError> {
        if update.change.status != Some(TabStatus::Complete) {
            return Ok(());
        }
        self.on_page_load_complete(&update.tab).await
    }

    /// The fragment most recently pushed to tabs.
    pub fn active_fragment(&self) -> Option<StyleFragment> {
        self.active_fragment.lock().clone()
    }

    async fn update_tab(
        &self,
        tab_id: TabId,
        old: Option<&CssInjection>,
        new: Option<&CssInjection>,
    ) -> Vec<TabFailure> {
        let mut failures = Vec::new();

        if let Some(old) = old {
            if let Err(error) = self.tabs.remove_css(tab_id, old).await {
                tracing::debug!(tab_id = %tab_id, error = %error, "removing override failed");
                failures.push(TabFailure {
                    tab_id,
                    step: TabStep::Remove,
                    error,
                });
            }
        }

        if let Some(new) = new {
            if let Err(error) = self.tabs.insert_css(tab_id, new).await {
                tracing::debug!(tab_id = %tab_id, error = %error, "inserting override failed");
                failures.push(TabFailure {
                    tab_id,
                    step: TabStep::Insert,
                    error,
                });
            }
        }

        failures
    }
}
