//! Storage trait definitions for data access abstraction.
//!
//! All operations are async. Implementations live in `tessera-db`
//! (user directory) and `tessera-cache` (TTL key/value store).

use std::time::Duration;

use crate::error::TesseraResult;
use crate::models::user::{CreateUser, User};

// ---------------------------------------------------------------------------
// User directory
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `AlreadyExists` when the username is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = TesseraResult<User>> + Send;
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = TesseraResult<Option<User>>> + Send;
}

// ---------------------------------------------------------------------------
// Cache store
// ---------------------------------------------------------------------------

/// String key/value store with optional per-key time-to-live.
///
/// Handles are cheap to clone and safe to share across requests.
pub trait CacheStore: Clone + Send + Sync + 'static {
    fn get(&self, key: &str) -> impl Future<Output = TesseraResult<Option<String>>> + Send;

    /// Store `value`, replacing any previous entry. `None` means no expiry.
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = TesseraResult<()>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = TesseraResult<()>> + Send;

    /// Atomically fetch and remove a live entry.
    fn take(&self, key: &str) -> impl Future<Output = TesseraResult<Option<String>>> + Send;

    /// Atomically replace the entry under `key` with `value` if its
    /// current raw value equals `expected` (`None` = key absent).
    /// Returns `false` without writing when the comparison fails.
    fn compare_and_set(
        &self,
        key: &str,
        expected: Option<&str>,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl Future<Output = TesseraResult<bool>> + Send;
}
