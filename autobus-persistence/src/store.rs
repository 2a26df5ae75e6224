use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::StoreResult;

/// Which half of the store a key lives in. Shared keys are visible to every
/// client; personal keys belong to a single client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Shared,
    Personal,
}

impl Namespace {
    pub fn from_shared(shared: bool) -> Self {
        if shared {
            Namespace::Shared
        } else {
            Namespace::Personal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Shared => "shared",
            Namespace::Personal => "personal",
        }
    }
}

/// The whole wire contract between clients: string values under string keys.
///
/// Writes replace the previous value outright. There is no compare-and-swap,
/// so concurrent writers race and the last one wins.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// `Ok(None)` when the key has never been written.
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        (**self).get(key, shared).await
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        (**self).set(key, value, shared).await
    }
}

/// In-process store. Clones share the same entries, which lets several
/// sessions in one process play against each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<(Namespace, String), String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str, shared: bool) -> StoreResult<Option<String>> {
        let entry = self
            .entries
            .get(&(Namespace::from_shared(shared), key.to_string()));
        Ok(entry.map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, shared: bool) -> StoreResult<()> {
        self.entries.insert(
            (Namespace::from_shared(shared), key.to_string()),
            value.to_string(),
        );
        Ok(())
    }
}
