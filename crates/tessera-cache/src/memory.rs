//! In-process implementation of [`CacheStore`].
//!
//! Expiry is measured on tokio's clock, so tests can pause and advance
//! time instead of sleeping. Expired entries are dropped lazily on
//! access.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tessera_core::error::TesseraResult;
use tessera_core::repository::CacheStore;
use tokio::time::Instant;
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl: Option<Duration>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Mutex-guarded map shared by every clone of the handle. The lock is
/// only held for synchronous map operations, never across an await.
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl fmt::Debug for MemoryCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCacheStore")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(map: &mut HashMap<String, Entry>, key: &str) -> Option<String> {
        let now = Instant::now();
        match map.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                map.remove(key);
                None
            }
            None => None,
        }
    }

    /// Remaining lifetime of a live key; `None` for absent keys and keys
    /// without expiry.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at - now)
    }
}

impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> TesseraResult<Option<String>> {
        let value = Self::live_value(&mut self.entries.lock(), key);
        debug!(key, hit = value.is_some(), "Cache GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> TesseraResult<()> {
        debug!(key, ?ttl, "Cache SET");
        self.entries
            .lock()
            .insert(key.to_string(), Entry::new(value, ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> TesseraResult<()> {
        debug!(key, "Cache DELETE");
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> TesseraResult<Option<String>> {
        let mut map = self.entries.lock();
        let value = Self::live_value(&mut map, key);
        map.remove(key);
        debug!(key, hit = value.is_some(), "Cache GETDEL");
        Ok(value)
    }

    async fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Option<Duration>,
    ) -> TesseraResult<bool> {
        let mut map = self.entries.lock();
        let current = Self::live_value(&mut map, key);
        if current.as_deref() != expected {
            debug!(key, "Cache CAS rejected");
            return Ok(false);
        }
        map.insert(key.to_string(), Entry::new(value, ttl));
        debug!(key, ?ttl, "Cache CAS applied");
        Ok(true)
    }
}
