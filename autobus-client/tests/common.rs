#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use autobus_client::config::DEFAULT_POLL_INTERVAL;
use autobus_client::{Clock, GameSession};
use autobus_core::{GameEvent, GameEventHandler};
use autobus_persistence::{KeyValueStore, MemoryStore, RoomStore, StoreError, StoreResult};
use autobus_types::{Category, CorrectionMark, RoomRecord};

/// Collects every published event for later inspection
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<GameEvent>>>);

impl EventLog {
    pub fn events(&self) -> Vec<GameEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }
}

impl GameEventHandler for EventLog {
    fn handle_event(&mut self, event: GameEvent) {
        self.0.lock().unwrap().push(event);
    }
}

/// A session on `store`. Sessions in one test share `clock`.
pub fn session<S>(store: &S, clock: Clock) -> GameSession
where
    S: KeyValueStore + Clone + 'static,
{
    GameSession::with_settings(Arc::new(store.clone()), DEFAULT_POLL_INTERVAL, clock)
}

pub async fn session_with_log<S>(store: &S, clock: Clock) -> (GameSession, EventLog)
where
    S: KeyValueStore + Clone + 'static,
{
    let session = session(store, clock);
    let log = EventLog::default();
    session.add_event_handler(Box::new(log.clone())).await;
    (session, log)
}

pub async fn stored_room(store: &MemoryStore, room_code: &str) -> RoomRecord {
    RoomStore::new(Arc::new(store.clone()))
        .get(room_code)
        .await
        .unwrap()
        .expect("room should exist")
}

/// Mark the first `correct` categories correct and the rest wrong
pub async fn mark_round(session: &mut GameSession, correct: usize) {
    for (index, category) in Category::ALL.into_iter().enumerate() {
        let target = if index < correct {
            CorrectionMark::Correct
        } else {
            CorrectionMark::Wrong
        };
        while session.snapshot().await.corrections[category] != target {
            session.toggle_correction(category).await.unwrap();
        }
    }
}

/// Lets background timers run without moving far in time
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

/// Memory store whose reads and writes can be switched to fail
#[derive(Clone, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_get: Arc<AtomicBool>,
    fail_set: Arc<AtomicBool>,
    gets: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sets(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    fn outage() -> StoreError {
        StoreError::unavailable(
            "simulated outage",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused"),
        )
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.get(key, shared).await
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Self::outage());
        }
        self.inner.set(key, value, shared).await
    }
}

/// Returns what it read only after a delay, so the value may be stale on arrival
#[derive(Clone, Default)]
pub struct SlowReadStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for SlowReadStore {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        let value = self.inner.get(key, shared).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        value
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        self.inner.set(key, value, shared).await
    }
}

/// Yields between reading and returning, so concurrent read-modify-writes interleave
#[derive(Clone, Default)]
pub struct InterleavingStore {
    pub inner: MemoryStore,
}

#[async_trait]
impl KeyValueStore for InterleavingStore {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        let value = self.inner.get(key, shared).await;
        tokio::task::yield_now().await;
        value
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        self.inner.set(key, value, shared).await
    }
}
