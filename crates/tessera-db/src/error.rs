//! Database-specific error types and conversions.

use tessera_core::error::TesseraError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Schema initialisation failed: {0}")]
    Schema(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Malformed row: {0}")]
    Row(String),

    #[error("Record already exists: {entity}")]
    Duplicate { entity: String },

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for TesseraError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => TesseraError::NotFound { entity, id },
            DbError::Duplicate { entity } => TesseraError::AlreadyExists { entity },
            other => TesseraError::Database(other.to_string()),
        }
    }
}
