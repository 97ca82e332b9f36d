//! Process configuration from command-line flags and environment.

use anyhow::{Context, Result};
use clap::Parser;
use tessera_auth::config::AuthConfig;
use tessera_auth::payload::parse_field_key;
use tessera_cache::CacheConfig;
use tessera_db::DbConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "tessera", version, about = "Device-bound session service")]
pub struct Args {
    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// HMAC secret for signing session tokens.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: String,

    /// AES-256 key for encrypted request fields, as 64 hex characters.
    #[arg(long, env = "ENCRYPTION_KEY_HEX", hide_env_values = true)]
    pub encryption_key_hex: String,

    /// Session token lifetime in seconds.
    #[arg(long, env = "TOKEN_EXPIRY", default_value_t = 86_400)]
    pub token_expiry: u64,

    /// Handoff code lifetime in seconds.
    #[arg(long, env = "QR_CODE_EXPIRY", default_value_t = 300)]
    pub qr_code_expiry: u64,

    /// Suffix of the per-user device registry key.
    #[arg(long, env = "DEVICES_KEY", default_value = "_devices")]
    pub devices_key: String,

    /// Optional pepper prepended to passwords before hashing.
    #[arg(long, env = "TESSERA_PASSWORD_PEPPER", hide_env_values = true)]
    pub password_pepper: Option<String>,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379")]
    pub redis_url: String,

    /// SurrealDB endpoint, e.g. `ws://127.0.0.1:8000` or `mem://`.
    #[arg(long, env = "TESSERA_DB_URL", default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "TESSERA_DB_NAMESPACE", default_value = "tessera")]
    pub db_namespace: String,

    #[arg(long, env = "TESSERA_DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "TESSERA_DB_USERNAME")]
    pub db_username: Option<String>,

    #[arg(long, env = "TESSERA_DB_PASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
}

impl Args {
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let key = parse_field_key(&self.encryption_key_hex).context("ENCRYPTION_KEY_HEX")?;
        Ok(AuthConfig {
            jwt_secret: self.jwt_secret.clone(),
            token_lifetime_secs: self.token_expiry,
            code_lifetime_secs: self.qr_code_expiry,
            devices_key_suffix: self.devices_key.clone(),
            field_encryption_key: Some(key),
            pepper: self.password_pepper.clone(),
            ..AuthConfig::default()
        })
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            url: self.redis_url.clone(),
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}
