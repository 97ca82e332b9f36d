//! Error types for the Tessera system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TesseraError {
    /// Malformed user input; the message is safe to show the caller.
    #[error("{message}")]
    Validation { message: String },

    #[error("Decryption error: {0}")]
    Decryption(String),

    /// Unknown user or wrong password. Deliberately indistinguishable.
    #[error("Username or password is incorrect")]
    InvalidCredentials,

    #[error("Device limit exceeded")]
    DeviceLimitExceeded,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Invalid code or code has expired")]
    CodeInvalid,

    /// Any failure of the protected-route guard.
    #[error("Authorization required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    /// An optimistic update lost too many races in a row.
    #[error("Concurrent update conflict on {entity}")]
    Conflict { entity: String },

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TesseraError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error is a caller-correctable domain failure whose
    /// message may cross the request boundary.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Decryption(_)
                | Self::InvalidCredentials
                | Self::DeviceLimitExceeded
                | Self::DeviceNotFound
                | Self::CodeInvalid
                | Self::InvalidToken
                | Self::NotFound { .. }
                | Self::AlreadyExists { .. }
        )
    }
}

pub type TesseraResult<T> = Result<T, TesseraError>;
