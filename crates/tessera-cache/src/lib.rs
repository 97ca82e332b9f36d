//! Tessera Cache — TTL key/value stores implementing
//! [`tessera_core::repository::CacheStore`].
//!
//! This crate provides:
//! - A Redis-backed store for multi-process deployments ([`RedisCacheStore`])
//! - An in-process store for single-node use and tests ([`MemoryCacheStore`])
//! - Error types ([`CacheError`])

mod error;
mod memory;
mod redis_store;

pub use error::CacheError;
pub use memory::MemoryCacheStore;
pub use redis_store::{CacheConfig, RedisCacheStore};
