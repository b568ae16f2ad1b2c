//! mathfont-core
//!
//! Settings record, style synthesis and the context-menu model.
//! No I/O; this is the shared vocabulary of the other mathfont crates.

pub mod error;
pub mod menu;
pub mod settings;
pub mod style;

pub use crate::error::CoreError;
pub use crate::settings::{SettingKey, Settings, SettingsPatch, SettingsUpdate};
pub use crate::style::{synthesize, StyleFragment};
