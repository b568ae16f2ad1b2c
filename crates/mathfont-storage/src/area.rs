use std::future::Future;
use std::pin::Pin;

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use crate::change::{AreaName, StorageChange};
use crate::error::StorageError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Raw contents of a storage area.
pub type StorageMap = Map<String, Value>;

/// A persistent key/value area.
///
/// Every successful write is announced to subscribers as one
/// [`StorageChange`] carrying the old and new value of each written key.
/// Methods return boxed futures for dyn compatibility.
pub trait StorageArea: Send + Sync {
    /// Which area this is. Listeners use it to drop notifications they don't own.
    fn area(&self) -> AreaName;

    /// Read every stored key.
    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>>;

    /// Write `items`, replacing existing values.
    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Delete `keys`. Keys that don't exist are skipped.
    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Delete everything.
    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Receive change notifications from now on.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
