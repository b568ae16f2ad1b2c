use std::time::Duration;

use clap::{Args, Subcommand};
use mathfont_core::menu::{build_menu, refresh_for, MenuRefresh, MenuTitle};
use mathfont_core::{synthesize, SettingKey, Settings, SettingsPatch, StyleFragment};
use mathfont_storage::StorageArea;

use crate::config::save_config;
use crate::state::HostState;

/// How long `set` waits for its write to come back as a change notification.
const UPDATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the settings record, as the settings page receives it
    Show,
    /// Print a single setting
    Get {
        /// Storage key, e.g. `mathFontScale`
        key: SettingKey,
    },
    /// Write settings and wait for them to apply
    Set(SetArgs),
    /// Print the override rule injected into pages
    Css,
    /// Print the context menu
    Menu,
    /// Clear the local storage area; defaults apply on next load
    Reset,
    /// Print the effective host config
    Config {
        /// Also write it to the config path
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SetArgs {
    /// Override family, empty for none
    #[arg(long)]
    pub family: Option<String>,
    /// Comma-separated families offered in the menu
    #[arg(long)]
    pub family_list: Option<String>,
    /// Percentage, 100 for none
    #[arg(long)]
    pub scale: Option<i64>,
    /// Whether declarations take priority over page styles
    #[arg(long)]
    pub important: Option<bool>,
}

impl SetArgs {
    fn patch(&self) -> SettingsPatch {
        SettingsPatch {
            math_font_family_list: self.family_list.clone(),
            math_font_family: self.family.clone(),
            math_font_scale: self.scale,
            math_font_important: self.important,
        }
    }
}

/// Run one command and return what it prints.
pub async fn execute(command: &Command, state: &HostState) -> eyre::Result<String> {
    match command {
        Command::Show => {
            let settings = state.background.handle_connect().await?;
            Ok(serde_json::to_string_pretty(&settings)?)
        }
        Command::Get { key } => {
            state.background.ensure_loaded().await?;
            Ok(state.background.current()?.get(*key).to_string())
        }
        Command::Set(args) => set(args, state).await,
        Command::Css => {
            state.background.ensure_loaded().await?;
            Ok(render_fragment(synthesize(&state.background.current()?).as_ref()))
        }
        Command::Menu => {
            state.background.ensure_loaded().await?;
            Ok(render_menu(&state.background.current()?))
        }
        Command::Reset => {
            state.storage.clear().await?;
            Ok(format!("cleared {}", state.storage.path().display()))
        }
        Command::Config { init } => {
            if *init {
                save_config(&state.config_path, &state.config)?;
            }
            Ok(serde_json::to_string_pretty(&state.config)?)
        }
    }
}

async fn set(args: &SetArgs, state: &HostState) -> eyre::Result<String> {
    let patch = args.patch();
    if patch.is_empty() {
        return Err(eyre::eyre!(
            "nothing to set: pass --family, --family-list, --scale or --important"
        ));
    }

    let background = &state.background;
    background.start().await?;
    let mut updates = background.watch_settings();
    background.set(&patch).await?;

    let update = tokio::time::timeout(UPDATE_TIMEOUT, updates.recv())
        .await
        .map_err(|_| eyre::eyre!("timed out waiting for the settings change to apply"))??;

    let changed: Vec<&str> = update.changed.iter().map(|key| key.as_str()).collect();
    let mut out = format!("changed: {}\n", changed.join(", "));
    out.push_str(&render_fragment(background.active_fragment().as_ref()));
    for refresh in refresh_for(&update) {
        out.push('\n');
        out.push_str(match refresh {
            MenuRefresh::RebuildFamilies { .. } => "menu: rebuild font families",
            MenuRefresh::UpdateFamilyChecks => "menu: update font family selection",
            MenuRefresh::UpdateScaleChecks => "menu: update font scale selection",
        });
    }
    Ok(out)
}

fn render_fragment(fragment: Option<&StyleFragment>) -> String {
    match fragment {
        Some(fragment) => fragment.to_string(),
        None => "(none)".to_string(),
    }
}

fn render_menu(settings: &Settings) -> String {
    build_menu(settings)
        .iter()
        .map(|item| {
            let title = match &item.title {
                MenuTitle::Message(name) => format!("[{name}]"),
                MenuTitle::Text(text) => text.clone(),
            };
            match item.parent_id {
                None => title,
                Some(_) if item.checked => format!("  (*) {title}"),
                Some(_) => format!("  ( ) {title}"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
