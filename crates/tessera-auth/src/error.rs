//! Authentication error types.

use tessera_core::error::TesseraError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("decryption failed: {0}")]
    Decryption(String),

    #[error("invalid field encryption key: {0}")]
    InvalidKey(String),

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for TesseraError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => TesseraError::InvalidCredentials,
            AuthError::Decryption(msg) => TesseraError::Decryption(msg),
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => TesseraError::InvalidToken,
            AuthError::Hashing(msg) => TesseraError::Hashing(msg),
            AuthError::InvalidKey(msg) | AuthError::Crypto(msg) => TesseraError::Crypto(msg),
        }
    }
}
