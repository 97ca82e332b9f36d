//! Behavioural contract shared by every `CacheStore` implementation.
//!
//! The in-process store always runs. The Redis store runs when
//! `TESSERA_TEST_REDIS_URL` points at a disposable server.

use std::time::Duration;

use tessera_cache::{CacheConfig, MemoryCacheStore, RedisCacheStore};
use tessera_core::repository::CacheStore;

async fn contract<C: CacheStore>(cache: C, prefix: &str) {
    let key = format!("{prefix}:contract");
    cache.delete(&key).await.unwrap();

    assert_eq!(cache.get(&key).await.unwrap(), None);

    cache.set(&key, "v1", None).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v1"));

    // CAS against a stale value is refused and leaves the entry alone.
    assert!(!cache.compare_and_set(&key, Some("v0"), "v2", None).await.unwrap());
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v1"));

    assert!(cache.compare_and_set(&key, Some("v1"), "v2", None).await.unwrap());
    assert_eq!(cache.take(&key).await.unwrap().as_deref(), Some("v2"));
    assert_eq!(cache.take(&key).await.unwrap(), None);

    // Absent key: only an "expect absent" CAS may create it.
    assert!(!cache.compare_and_set(&key, Some("v2"), "v3", None).await.unwrap());
    assert!(cache.compare_and_set(&key, None, "v3", Some(Duration::from_secs(60))).await.unwrap());
    assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v3"));

    cache.delete(&key).await.unwrap();
    assert_eq!(cache.get(&key).await.unwrap(), None);
}

#[tokio::test]
async fn memory_store_honours_contract() {
    contract(MemoryCacheStore::new(), "memory").await;
}

#[tokio::test]
async fn redis_store_honours_contract() {
    let Ok(url) = std::env::var("TESSERA_TEST_REDIS_URL") else {
        return;
    };
    let store = RedisCacheStore::connect(&CacheConfig { url }).await.unwrap();
    contract(store, "tessera-test").await;
}

#[tokio::test]
async fn concurrent_cas_has_a_single_winner() {
    let cache = MemoryCacheStore::new();
    cache.set("registry", "v0", None).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache
                .compare_and_set("registry", Some("v0"), &format!("writer-{i}"), None)
                .await
                .unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);
}
