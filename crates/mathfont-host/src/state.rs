use std::path::PathBuf;
use std::sync::Arc;

use mathfont_storage::{FileStorage, StorageArea};
use mathfont_sync::Background;

use crate::config::HostConfig;
use crate::tabs::DetachedTabs;

/// Everything a command needs: the config, the storage area and the
/// background on top of it.
pub struct HostState {
    pub config: HostConfig,
    pub config_path: PathBuf,
    pub storage: Arc<FileStorage>,
    pub background: Arc<Background>,
}

impl HostState {
    pub fn open(config: HostConfig, config_path: PathBuf) -> eyre::Result<Self> {
        let path = config.resolved_storage_path()?;
        tracing::debug!(path = %path.display(), "opening local storage area");

        let storage = Arc::new(FileStorage::new(path));
        let area: Arc<dyn StorageArea> = storage.clone();
        let background = Background::new(area, Arc::new(DetachedTabs::new()));
        Ok(Self {
            config,
            config_path,
            storage,
            background,
        })
    }
}
