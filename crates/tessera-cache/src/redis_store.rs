//! Redis implementation of [`CacheStore`].

use std::fmt;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};
use tessera_core::error::TesseraResult;
use tessera_core::repository::CacheStore;
use tracing::{debug, info};

use crate::error::CacheError;

/// Lua scripts for operations that must be atomic on the server.
mod scripts {
    use redis::Script;

    /// Compare-and-set on a string key.
    ///
    /// KEYS[1] = key
    /// ARGV[1] = "1" when a current value is expected, "0" when the key
    ///           must be absent
    /// ARGV[2] = expected value (ignored when ARGV[1] is "0")
    /// ARGV[3] = new value
    /// ARGV[4] = TTL in seconds, 0 for no expiry
    pub fn compare_and_set() -> Script {
        Script::new(
            r#"
            local current = redis.call('GET', KEYS[1])
            if ARGV[1] == '1' then
                if current ~= ARGV[2] then
                    return 0
                end
            elseif current then
                return 0
            end

            local ttl = tonumber(ARGV[4])
            if ttl > 0 then
                redis.call('SET', KEYS[1], ARGV[3], 'EX', ttl)
            else
                redis.call('SET', KEYS[1], ARGV[3])
            end
            return 1
            "#,
        )
    }
}

/// Configuration for connecting to Redis.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Connection URL (e.g., `redis://127.0.0.1:6379`).
    pub url: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".into(),
        }
    }
}

/// Redis-backed cache store. Requires Redis 6.2+ for `GETDEL`.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    cas: Script,
}

impl fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheStore {
    /// Connect to Redis. The returned handle reconnects transparently
    /// and may be cloned freely.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CacheError> {
        info!(url = %config.url, "Connecting to Redis");

        let client = redis::Client::open(config.url.as_str())?;
        let conn = ConnectionManager::new(client).await?;

        info!("Successfully connected to Redis");

        Ok(Self {
            conn,
            cas: scripts::compare_and_set(),
        })
    }
}

/// Whole seconds for `SET EX`, rounded up. Redis rejects a zero expiry,
/// so the result is at least 1.
fn ttl_secs(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    millis.div_ceil(1000).max(1)
}

impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> TesseraResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(CacheError::from)?;
        debug!(key, hit = value.is_some(), "Cache GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> TesseraResult<()> {
        debug!(key, ?ttl, "Cache SET");
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl_secs(ttl))
                .await
                .map_err(CacheError::from)?,
            None => conn
                .set::<_, _, ()>(key, value)
                .await
                .map_err(CacheError::from)?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> TesseraResult<()> {
        debug!(key, "Cache DELETE");
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(CacheError::from)?;
        Ok(())
    }

    async fn take(&self, key: &str) -> TesseraResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get_del(key).await.map_err(CacheError::from)?;
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
        let mut conn = self.conn.clone();
        let applied: i64 = self
            .cas
            .key(key)
            .arg(if expected.is_some() { "1" } else { "0" })
            .arg(expected.unwrap_or_default())
            .arg(value)
            .arg(ttl.map(ttl_secs).unwrap_or(0))
            .invoke_async(&mut conn)
            .await
            .map_err(CacheError::from)?;

        debug!(key, applied, "Cache CAS");
        match applied {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CacheError::Script(format!("compare_and_set returned {other}")).into()),
        }
    }
}
