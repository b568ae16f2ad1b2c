use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Schema version written by [`save_config`]; [`migrate`] upgrades older files.
const CURRENT_VERSION: u32 = 1;

const APP_DIR: &str = "mathfont";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// JSON file backing the local storage area. `None` = platform data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset. Added in v1.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_json: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            config_version: CURRENT_VERSION,
            storage_path: None,
            log_filter: default_log_filter(),
            log_json: false,
        }
    }
}

impl HostConfig {
    /// Where the local storage area lives, falling back to the data dir.
    pub fn resolved_storage_path(&self) -> eyre::Result<PathBuf> {
        match &self.storage_path {
            Some(path) => Ok(path.clone()),
            None => {
                let base =
                    dirs::data_dir().ok_or_else(|| eyre::eyre!("no data directory found"))?;
                Ok(base.join(APP_DIR).join("storage-local.json"))
            }
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Default config location: `<config_dir>/mathfont/config.json`.
pub fn default_config_path() -> eyre::Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join(APP_DIR).join("config.json"))
}

/// Load the config at `path`. A missing file yields the defaults.
pub fn load_config(path: &Path) -> eyre::Result<HostConfig> {
    if !path.exists() {
        return Ok(HostConfig::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Migrations work on the raw value, before field defaults kick in.
    let json: serde_json::Value = serde_json::from_str(&raw)?;
    let version = json
        .get("config_version")
        .and_then(serde_json::Value::as_u64)
        .map_or(0, |v| u32::try_from(v).unwrap_or(u32::MAX));

    Ok(serde_json::from_value(migrate(json, version)?)?)
}

fn migrate(mut json: serde_json::Value, version: u32) -> eyre::Result<serde_json::Value> {
    if version > CURRENT_VERSION {
        eyre::bail!(
            "config_version {version} was written by a newer mathfont (this build reads up to {CURRENT_VERSION})"
        );
    }
    let Some(fields) = json.as_object_mut() else {
        eyre::bail!("config is not a JSON object");
    };

    if version < 1 {
        fields
            .entry("log_filter")
            .or_insert_with(|| default_log_filter().into());
        fields.insert("config_version".to_string(), 1.into());
        tracing::info!(from = version, to = 1, "migrated host config");
    }

    Ok(json)
}

pub fn save_config(path: &Path, config: &HostConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let current = HostConfig {
        config_version: CURRENT_VERSION,
        ..config.clone()
    };
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, serde_json::to_vec_pretty(&current)?)?;
    std::fs::rename(&tmp, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
