//! Cache-specific error types and conversions.

use tessera_core::error::TesseraError;

/// Cache-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Unexpected script reply: {0}")]
    Script(String),
}

impl From<CacheError> for TesseraError {
    fn from(err: CacheError) -> Self {
        TesseraError::Cache(err.to_string())
    }
}
