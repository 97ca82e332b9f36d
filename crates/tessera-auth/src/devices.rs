//! Per-user device registry.
//!
//! Each user owns one record under `<username><suffix>` holding at most
//! [`MAX_DEVICES`] distinct fingerprints in insertion order. The record
//! never expires. Every mutation is an optimistic read-modify-write:
//! the new record is swapped in with `compare_and_set` against the raw
//! value that was read, and recomputed from scratch if another writer
//! got there first.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::device::{DeviceInfo, DeviceRegistryRecord, DeviceSelector, MAX_DEVICES};
use tessera_core::repository::CacheStore;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::token::redact;

/// Outcome of a successful [`DeviceRegistry::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Added,
    AlreadyKnown,
}

enum Change<T> {
    Unchanged(T),
    Write(Vec<DeviceInfo>, T),
}

#[derive(Debug, Clone)]
pub struct DeviceRegistry<C: CacheStore> {
    cache: C,
    suffix: String,
    max_attempts: u32,
}

impl<C: CacheStore> DeviceRegistry<C> {
    pub fn new(cache: C, config: &AuthConfig) -> Self {
        Self {
            cache,
            suffix: config.devices_key_suffix.clone(),
            max_attempts: config.registry_update_attempts.max(1),
        }
    }

    pub fn key(&self, username: &str) -> String {
        format!("{username}{}", self.suffix)
    }

    async fn load(&self, key: &str) -> TesseraResult<(Option<String>, DeviceRegistryRecord)> {
        let raw = self.cache.get(key).await?;
        let record = match raw.as_deref() {
            Some(stored) => DeviceRegistryRecord::from_stored(stored)
                .map_err(|e| TesseraError::Cache(format!("corrupt device registry {key}: {e}")))?,
            None => DeviceRegistryRecord::default(),
        };
        Ok((raw, record))
    }

    /// Registered devices in insertion order. Empty when the user has
    /// never registered one.
    pub async fn list(&self, username: &str) -> TesseraResult<Vec<DeviceInfo>> {
        let (_, record) = self.load(&self.key(username)).await?;
        Ok(record.devices)
    }

    pub async fn contains(&self, username: &str, fingerprint: &str) -> TesseraResult<bool> {
        let (_, record) = self.load(&self.key(username)).await?;
        Ok(record.contains(fingerprint))
    }

    /// Add `device` unless its fingerprint is already registered.
    ///
    /// Fails with `DeviceLimitExceeded` when the fingerprint is new and
    /// the registry is full.
    pub async fn register(&self, username: &str, device: &DeviceInfo) -> TesseraResult<Registration> {
        let registration = self
            .update(username, |record| {
                if record.contains(&device.fingerprint) {
                    return Ok(Change::Unchanged(Registration::AlreadyKnown));
                }
                if record.is_full() {
                    return Err(TesseraError::DeviceLimitExceeded);
                }
                let mut devices = record.devices.clone();
                devices.push(device.clone());
                Ok(Change::Write(devices, Registration::Added))
            })
            .await;

        match &registration {
            Ok(Registration::Added) => info!(
                username,
                fingerprint = %redact(&device.fingerprint),
                "Device registered"
            ),
            Err(TesseraError::DeviceLimitExceeded) => warn!(
                username,
                fingerprint = %redact(&device.fingerprint),
                limit = MAX_DEVICES,
                "Device limit reached"
            ),
            _ => {}
        }
        registration
    }

    /// Remove one device by fingerprint, or every device.
    ///
    /// Removing all devices leaves an empty registry behind rather than
    /// deleting the key. An unknown fingerprint is `DeviceNotFound`.
    pub async fn remove(&self, username: &str, selector: &DeviceSelector) -> TesseraResult<()> {
        self.update(username, |record| match selector {
            DeviceSelector::All => Ok(Change::Write(Vec::new(), ())),
            DeviceSelector::Fingerprint(fingerprint) => {
                if !record.contains(fingerprint) {
                    return Err(TesseraError::DeviceNotFound);
                }
                let devices = record
                    .devices
                    .iter()
                    .filter(|d| &d.fingerprint != fingerprint)
                    .cloned()
                    .collect();
                Ok(Change::Write(devices, ()))
            }
        })
        .await?;

        match selector {
            DeviceSelector::All => info!(username, "All devices removed"),
            DeviceSelector::Fingerprint(f) => {
                info!(username, fingerprint = %redact(f), "Device removed")
            }
        }
        Ok(())
    }

    async fn update<T, F>(&self, username: &str, mut apply: F) -> TesseraResult<T>
    where
        F: FnMut(&DeviceRegistryRecord) -> TesseraResult<Change<T>>,
    {
        let key = self.key(username);

        for attempt in 1..=self.max_attempts {
            let (raw, record) = self.load(&key).await?;

            let (devices, value) = match apply(&record)? {
                Change::Unchanged(value) => return Ok(value),
                Change::Write(devices, value) => (devices, value),
            };

            let stored = record
                .next(devices)
                .to_stored()
                .map_err(|e| TesseraError::Internal(format!("serialize device registry: {e}")))?;

            if self
                .cache
                .compare_and_set(&key, raw.as_deref(), &stored, None)
                .await?
            {
                return Ok(value);
            }
            debug!(username, attempt, "Device registry changed concurrently, retrying");
        }

        warn!(username, attempts = self.max_attempts, "Device registry update gave up");
        Err(TesseraError::Conflict {
            entity: "device_registry".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use tessera_cache::MemoryCacheStore;

    use super::*;

    fn registry<C: CacheStore>(cache: C) -> DeviceRegistry<C> {
        DeviceRegistry::new(cache, &AuthConfig::default())
    }

    /// Delegates to a memory store but loses the first `losses` CAS races.
    #[derive(Clone)]
    struct Contended {
        inner: MemoryCacheStore,
        losses: Arc<AtomicU32>,
    }

    impl CacheStore for Contended {
        async fn get(&self, key: &str) -> TesseraResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> TesseraResult<()> {
            self.inner.set(key, value, ttl).await
        }

        async fn delete(&self, key: &str) -> TesseraResult<()> {
            self.inner.delete(key).await
        }

        async fn take(&self, key: &str) -> TesseraResult<Option<String>> {
            self.inner.take(key).await
        }

        async fn compare_and_set(
            &self,
            key: &str,
            expected: Option<&str>,
            value: &str,
            ttl: Option<Duration>,
        ) -> TesseraResult<bool> {
            let lose = self
                .losses
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if lose {
                return Ok(false);
            }
            self.inner.compare_and_set(key, expected, value, ttl).await
        }
    }

    #[tokio::test]
    async fn fourth_device_is_rejected() {
        let devices = registry(MemoryCacheStore::new());
        for f in ["F1", "F2", "F3"] {
            let outcome = devices.register("alice", &DeviceInfo::new(f)).await.unwrap();
            assert_eq!(outcome, Registration::Added);
        }

        let err = devices
            .register("alice", &DeviceInfo::new("F4"))
            .await
            .unwrap_err();
        assert!(matches!(err, TesseraError::DeviceLimitExceeded));

        let fingerprints: Vec<_> = devices
            .list("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.fingerprint)
            .collect();
        assert_eq!(fingerprints, ["F1", "F2", "F3"]);
    }

    #[tokio::test]
    async fn known_fingerprint_is_idempotent() {
        let devices = registry(MemoryCacheStore::new());
        for f in ["F1", "F2", "F3"] {
            devices.register("alice", &DeviceInfo::new(f)).await.unwrap();
        }
        let again = devices
            .register("alice", &DeviceInfo::new("F2").with_metadata("os", "ios"))
            .await
            .unwrap();
        assert_eq!(again, Registration::AlreadyKnown);
        assert_eq!(devices.list("alice").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn registry_never_expires_and_uses_suffix() {
        let cache = MemoryCacheStore::new();
        let devices = registry(cache.clone());
        devices.register("bob", &DeviceInfo::new("F1")).await.unwrap();

        assert_eq!(devices.key("bob"), "bob_devices");
        assert!(cache.get("bob_devices").await.unwrap().is_some());
        assert_eq!(cache.ttl("bob_devices"), None);
    }

    #[tokio::test]
    async fn remove_single_and_all() {
        let cache = MemoryCacheStore::new();
        let devices = registry(cache.clone());
        for f in ["F1", "F2", "F3"] {
            devices.register("alice", &DeviceInfo::new(f)).await.unwrap();
        }

        devices
            .remove("alice", &DeviceSelector::Fingerprint("F2".into()))
            .await
            .unwrap();
        assert!(!devices.contains("alice", "F2").await.unwrap());
        assert!(devices.contains("alice", "F3").await.unwrap());

        let err = devices
            .remove("alice", &DeviceSelector::Fingerprint("F9".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, TesseraError::DeviceNotFound));

        devices.remove("alice", &DeviceSelector::All).await.unwrap();
        assert!(devices.list("alice").await.unwrap().is_empty());
        // The key stays, holding an empty registry.
        assert!(cache.get("alice_devices").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn legacy_array_is_upgraded_on_write() {
        let cache = MemoryCacheStore::new();
        cache
            .set("carol_devices", r#"[{"fingerprint":"F1","os":"ios"}]"#, None)
            .await
            .unwrap();
        let devices = registry(cache.clone());

        devices.register("carol", &DeviceInfo::new("F2")).await.unwrap();

        let raw = cache.get("carol_devices").await.unwrap().unwrap();
        let record = DeviceRegistryRecord::from_stored(&raw).unwrap();
        assert_eq!(record.version, 1);
        assert_eq!(record.devices[0].metadata["os"], "ios");
        assert!(record.contains("F2"));
    }

    #[tokio::test]
    async fn corrupt_record_is_a_cache_error() {
        let cache = MemoryCacheStore::new();
        cache.set("dave_devices", "{not json", None).await.unwrap();
        let err = registry(cache).list("dave").await.unwrap_err();
        assert!(matches!(err, TesseraError::Cache(_)));
    }

    #[tokio::test]
    async fn lost_race_is_retried() {
        let cache = Contended {
            inner: MemoryCacheStore::new(),
            losses: Arc::new(AtomicU32::new(2)),
        };
        let devices = registry(cache);
        let outcome = devices.register("erin", &DeviceInfo::new("F1")).await.unwrap();
        assert_eq!(outcome, Registration::Added);
        assert!(devices.contains("erin", "F1").await.unwrap());
    }

    #[tokio::test]
    async fn exhausted_retries_are_a_conflict() {
        let cache = Contended {
            inner: MemoryCacheStore::new(),
            losses: Arc::new(AtomicU32::new(u32::MAX)),
        };
        let err = registry(cache)
            .register("erin", &DeviceInfo::new("F1"))
            .await
            .unwrap_err();
        assert!(matches!(err, TesseraError::Conflict { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_are_not_lost() {
        let devices = Arc::new(registry(MemoryCacheStore::new()));
        let tasks: Vec<_> = ["F1", "F2", "F3"]
            .into_iter()
            .map(|f| {
                let devices = Arc::clone(&devices);
                tokio::spawn(async move { devices.register("frank", &DeviceInfo::new(f)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(devices.list("frank").await.unwrap().len(), 3);
    }
}
