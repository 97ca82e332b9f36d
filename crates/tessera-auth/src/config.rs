//! Authentication configuration.

use std::time::Duration;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret for HS256 session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in seconds (default: 86_400 = 24 hours).
    /// The mirrored `<username>_token` cache entry uses the same TTL.
    pub token_lifetime_secs: u64,
    /// Handoff code lifetime in seconds (default: 300 = 5 minutes).
    pub code_lifetime_secs: u64,
    /// Suffix appended to the username to form the device registry key.
    pub devices_key_suffix: String,
    /// 256-bit AES-GCM key for inbound encrypted request fields.
    /// `None` rejects every encrypted payload.
    pub field_encryption_key: Option<[u8; 32]>,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// How many times a device registry update is recomputed after
    /// losing a compare-and-set race (default: 5).
    pub registry_update_attempts: u32,
}

impl AuthConfig {
    pub fn token_lifetime(&self) -> Duration {
        Duration::from_secs(self.token_lifetime_secs)
    }

    pub fn code_lifetime(&self) -> Duration {
        Duration::from_secs(self.code_lifetime_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 86_400,
            code_lifetime_secs: 300,
            devices_key_suffix: "_devices".into(),
            field_encryption_key: None,
            pepper: None,
            registry_update_attempts: 5,
        }
    }
}
