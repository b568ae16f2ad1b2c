use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::area::StorageMap;

/// Notifications buffered per subscriber before it starts lagging.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaName {
    /// Device-scoped, never synced.
    Local,
    Sync,
    Managed,
    Session,
}

impl fmt::Display for AreaName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Local => "local",
            Self::Sync => "sync",
            Self::Managed => "managed",
            Self::Session => "session",
        };
        f.write_str(name)
    }
}

/// Before/after of one key. `None` means the key was absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueChange {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub new_value: Option<Value>,
}

/// One write, as seen by listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: AreaName,
    pub changes: BTreeMap<String, ValueChange>,
}

impl StorageChange {
    pub fn get(&self, key: &str) -> Option<&ValueChange> {
        self.changes.get(key)
    }
}

/// Sending half shared by the storage implementations.
pub(crate) struct ChangeFeed {
    area: AreaName,
    tx: broadcast::Sender<StorageChange>,
}

impl ChangeFeed {
    pub(crate) fn new(area: AreaName) -> Self {
        let (tx, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { area, tx }
    }

    pub(crate) fn area(&self) -> AreaName {
        self.area
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, changes: BTreeMap<String, ValueChange>) {
        if changes.is_empty() {
            return;
        }
        let keys = changes.len();
        // No receivers is fine: nobody has loaded settings yet.
        if self
            .tx
            .send(StorageChange {
                area: self.area,
                changes,
            })
            .is_err()
        {
            tracing::trace!(area = %self.area, keys, "storage change had no listeners");
        }
    }
}

pub(crate) fn apply_set(
    map: &mut StorageMap,
    items: StorageMap,
) -> BTreeMap<String, ValueChange> {
    items
        .into_iter()
        .map(|(key, value)| {
            let old_value = map.insert(key.clone(), value.clone());
            (
                key,
                ValueChange {
                    old_value,
                    new_value: Some(value),
                },
            )
        })
        .collect()
}

pub(crate) fn apply_remove(
    map: &mut StorageMap,
    keys: Vec<String>,
) -> BTreeMap<String, ValueChange> {
    keys.into_iter()
        .filter_map(|key| {
            map.remove(&key).map(|old| {
                (
                    key,
                    ValueChange {
                        old_value: Some(old),
                        new_value: None,
                    },
                )
            })
        })
        .collect()
}

pub(crate) fn apply_clear(map: &mut StorageMap) -> BTreeMap<String, ValueChange> {
    std::mem::take(map)
        .into_iter()
        .map(|(key, old)| {
            (
                key,
                ValueChange {
                    old_value: Some(old),
                    new_value: None,
                },
            )
        })
        .collect()
}
