//! In-memory cache store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{CacheStore, RemeshError};

#[derive(Default)]
struct Entries {
    values: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

/// Bounded in-memory key-value store. Clones share the same entries.
///
/// When full, the oldest inserted key is evicted first.
#[derive(Clone)]
pub struct InMemoryCacheStore {
    entries: Arc<Mutex<Entries>>,
    max_entries: usize,
}

impl InMemoryCacheStore {
    /// Create a store holding at most `max_entries` values.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries::default())),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().values.len()
    }

    /// True when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().values.contains_key(key)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemeshError> {
        Ok(self.entries.lock().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RemeshError> {
        let mut entries = self.entries.lock();
        if entries.values.insert(key.to_string(), value).is_none() {
            entries.order.push_back(key.to_string());
        }
        while entries.values.len() > self.max_entries {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.values.remove(&oldest);
        }
        Ok(())
    }
}
