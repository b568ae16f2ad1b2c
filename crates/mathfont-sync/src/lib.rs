//! mathfont-sync
//!
//! Keeps the settings record, persistent storage and every open tab in step.
//!
//! Public API (all on [`Background`]):
//! - `ensure_loaded()`: load the record once and start listening for changes
//! - `current()` / `set()`: read the record, write a patch to storage
//! - `handle_connect()`: settings-page handshake
//! - `resynchronize_all()`: swap the override fragment in every tab
//! - `on_page_load_complete()` / `on_tab_updated()`: fragment for fresh pages
//! - `start()`: load, resynchronize, then follow tab updates

pub mod background;
pub mod coordinator;
pub mod error;
pub mod listener;
pub mod options;
pub mod tabs;

pub use crate::background::Background;
pub use crate::coordinator::{ResyncSummary, TabFailure, TabStep};
pub use crate::error::{SyncError, TabError};
pub use crate::tabs::{
    CssInjection, RunAt, Tab, TabChangeInfo, TabId, TabRuntime, TabStatus, TabUpdate,
};
