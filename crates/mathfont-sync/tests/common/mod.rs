#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mathfont_storage::{
    AreaName, BoxFuture, MemoryStorage, StorageArea, StorageChange, StorageError, StorageMap,
};
use mathfont_sync::{
    CssInjection, Tab, TabChangeInfo, TabError, TabId, TabRuntime, TabStatus, TabUpdate,
};
use tokio::sync::{broadcast, watch, Notify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub tab_id: TabId,
    pub op: Op,
    pub code: String,
}

/// Tab runtime that records every call and fails on request.
pub struct FakeTabs {
    tabs: Mutex<Vec<Tab>>,
    calls: Mutex<Vec<Call>>,
    fail_remove: Mutex<HashSet<TabId>>,
    fail_insert: Mutex<HashSet<TabId>>,
    fail_query: Mutex<bool>,
    stall_insert: Mutex<Option<TabId>>,
    insert_stalled: Notify,
    insert_released: Notify,
    count: watch::Sender<usize>,
    updates: broadcast::Sender<TabUpdate>,
}

impl FakeTabs {
    pub fn with_tabs(ids: &[u32]) -> Arc<Self> {
        let (updates, _) = broadcast::channel(16);
        let (count, _) = watch::channel(0);
        Arc::new(Self {
            tabs: Mutex::new(ids.iter().map(|id| tab(*id, TabStatus::Complete)).collect()),
            calls: Mutex::new(Vec::new()),
            fail_remove: Mutex::new(HashSet::new()),
            fail_insert: Mutex::new(HashSet::new()),
            fail_query: Mutex::new(false),
            stall_insert: Mutex::new(None),
            insert_stalled: Notify::new(),
            insert_released: Notify::new(),
            count,
            updates,
        })
    }

    pub fn fail_remove_in(&self, id: u32) {
        self.fail_remove.lock().unwrap().insert(TabId(id));
    }

    pub fn fail_insert_in(&self, id: u32) {
        self.fail_insert.lock().unwrap().insert(TabId(id));
    }

    pub fn fail_queries(&self) {
        *self.fail_query.lock().unwrap() = true;
    }

    /// Hold the next insertion into `id` until [`FakeTabs::release_insert`].
    pub fn stall_next_insert_in(&self, id: u32) {
        *self.stall_insert.lock().unwrap() = Some(TabId(id));
    }

    pub async fn wait_until_insert_stalled(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.insert_stalled.notified())
            .await
            .expect("insertion never reached the runtime");
    }

    pub fn release_insert(&self) {
        self.insert_released.notify_one();
    }

    /// Rules left in tab `id` after replaying its inserts and removals.
    pub fn applied_in(&self, id: u32) -> Vec<String> {
        let mut applied: Vec<String> = Vec::new();
        for call in self.calls_for(id) {
            match call.op {
                Op::Insert => applied.push(call.code),
                Op::Remove => {
                    if let Some(pos) = applied.iter().position(|code| *code == call.code) {
                        applied.remove(pos);
                    }
                }
            }
        }
        applied
    }

    pub fn open(&self, id: u32) {
        self.tabs.lock().unwrap().push(tab(id, TabStatus::Loading));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: u32) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| call.tab_id == TabId(id))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.count.send_replace(0);
    }

    /// Emit a tab update event, as the browser does when a load finishes.
    pub fn finish_loading(&self, id: u32) {
        let tab = tab(id, TabStatus::Complete);
        let _ = self.updates.send(TabUpdate {
            tab_id: tab.id,
            change: TabChangeInfo {
                status: Some(TabStatus::Complete),
                url: None,
            },
            tab,
        });
    }

    /// Wait until at least `n` calls were recorded.
    pub async fn wait_for_calls(&self, n: usize) {
        let mut rx = self.count.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|count| *count >= n))
            .await
            .expect("timed out waiting for tab calls")
            .expect("tab runtime dropped");
    }

    fn record(&self, tab_id: TabId, op: Op, injection: &CssInjection) {
        assert!(injection.all_frames, "override must reach every frame");
        let mut calls = self.calls.lock().unwrap();
        calls.push(Call {
            tab_id,
            op,
            code: injection.code.clone(),
        });
        self.count.send_replace(calls.len());
    }
}

impl TabRuntime for FakeTabs {
    fn query_tabs(&self) -> BoxFuture<'_, Result<Vec<Tab>, TabError>> {
        Box::pin(async {
            if *self.fail_query.lock().unwrap() {
                return Err(TabError::Runtime("tabs unavailable".into()));
            }
            Ok(self.tabs.lock().unwrap().clone())
        })
    }

    fn insert_css<'a>(
        &'a self,
        tab_id: TabId,
        injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let stalled = self
                .stall_insert
                .lock()
                .unwrap()
                .take_if(|held| *held == tab_id)
                .is_some();
            if stalled {
                self.insert_stalled.notify_one();
                self.insert_released.notified().await;
            }
            self.record(tab_id, Op::Insert, injection);
            if self.fail_insert.lock().unwrap().contains(&tab_id) {
                return Err(TabError::Rejected {
                    tab_id,
                    reason: "privileged page".into(),
                });
            }
            Ok(())
        })
    }

    fn remove_css<'a>(
        &'a self,
        tab_id: TabId,
        injection: &'a CssInjection,
    ) -> BoxFuture<'a, Result<(), TabError>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.record(tab_id, Op::Remove, injection);
            if self.fail_remove.lock().unwrap().contains(&tab_id) {
                return Err(TabError::Rejected {
                    tab_id,
                    reason: "privileged page".into(),
                });
            }
            Ok(())
        })
    }

    fn subscribe_updates(&self) -> broadcast::Receiver<TabUpdate> {
        self.updates.subscribe()
    }
}

pub fn tab(id: u32, status: TabStatus) -> Tab {
    Tab {
        id: TabId(id),
        url: Some(format!("https://example.org/{id}")),
        status,
    }
}

/// Wraps a memory area and counts reads and subscriptions.
pub struct CountingStorage {
    inner: MemoryStorage,
    pub reads: AtomicUsize,
    pub subscriptions: AtomicUsize,
}

impl CountingStorage {
    pub fn new(items: StorageMap) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStorage::with_items(AreaName::Local, items),
            reads: AtomicUsize::new(0),
            subscriptions: AtomicUsize::new(0),
        })
    }
}

impl StorageArea for CountingStorage {
    fn area(&self) -> AreaName {
        self.inner.area()
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {
            tokio::task::yield_now().await;
            self.inner.get_all().await
        })
    }

    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.set(items)
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.remove(keys)
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.clear()
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.inner.subscribe()
    }
}

/// Stores writes but never announces them.
pub struct SilentStorage {
    inner: MemoryStorage,
    feed: broadcast::Sender<StorageChange>,
}

impl SilentStorage {
    pub fn new() -> Arc<Self> {
        let (feed, _) = broadcast::channel(4);
        Arc::new(Self {
            inner: MemoryStorage::new(),
            feed,
        })
    }
}

impl StorageArea for SilentStorage {
    fn area(&self) -> AreaName {
        AreaName::Local
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        self.inner.get_all()
    }

    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.set(items)
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.remove(keys)
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.clear()
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}

/// Fails every read.
pub struct BrokenStorage {
    feed: broadcast::Sender<StorageChange>,
}

impl BrokenStorage {
    pub fn new() -> Arc<Self> {
        let (feed, _) = broadcast::channel(4);
        Arc::new(Self { feed })
    }
}

impl StorageArea for BrokenStorage {
    fn area(&self) -> AreaName {
        AreaName::Local
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("disk gone".into())) })
    }

    fn set(&self, _items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("disk gone".into())) })
    }

    fn remove(&self, _keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("disk gone".into())) })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        Box::pin(async { Err(StorageError::Unavailable("disk gone".into())) })
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}

/// Memory area whose notifications are sent by hand through a one-slot feed.
pub struct LaggyStorage {
    pub inner: MemoryStorage,
    feed: broadcast::Sender<StorageChange>,
}

impl LaggyStorage {
    pub fn new() -> Arc<Self> {
        let (feed, _) = broadcast::channel(1);
        Arc::new(Self {
            inner: MemoryStorage::new(),
            feed,
        })
    }

    /// Announce a change to an unrelated key.
    pub fn announce_noise(&self) {
        let _ = self.feed.send(StorageChange {
            area: AreaName::Local,
            changes: [(
                "noise".to_string(),
                mathfont_storage::ValueChange {
                    old_value: None,
                    new_value: Some(serde_json::Value::Bool(true)),
                },
            )]
            .into_iter()
            .collect(),
        });
    }
}

impl StorageArea for LaggyStorage {
    fn area(&self) -> AreaName {
        AreaName::Local
    }

    fn get_all(&self) -> BoxFuture<'_, Result<StorageMap, StorageError>> {
        self.inner.get_all()
    }

    fn set(&self, items: StorageMap) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.set(items)
    }

    fn remove(&self, keys: Vec<String>) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.remove(keys)
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StorageError>> {
        self.inner.clear()
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.feed.subscribe()
    }
}
