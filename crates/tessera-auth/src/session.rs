//! Device-bound session tokens.
//!
//! Issuing a token first binds the device to the user's registry, so a
//! device over the limit never receives a signed token. Every issued
//! token is mirrored under `<username>_token` with the token's own TTL.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::device::DeviceInfo;
use tessera_core::repository::CacheStore;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::devices::{DeviceRegistry, Registration};
use crate::token::{self, SessionClaims, UserClaims, redact};

const TOKEN_KEY_SUFFIX: &str = "_token";
const BEARER_PREFIX: &str = "Bearer ";

/// A freshly signed token and what happened to the device registry.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub registration: Registration,
}

#[derive(Debug, Clone)]
pub struct SessionTokenService<C: CacheStore> {
    cache: C,
    registry: DeviceRegistry<C>,
    config: AuthConfig,
}

impl<C: CacheStore> SessionTokenService<C> {
    pub fn new(cache: C, config: AuthConfig) -> Self {
        Self {
            registry: DeviceRegistry::new(cache.clone(), &config),
            cache,
            config,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry<C> {
        &self.registry
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Cache key of the mirrored token for `username`.
    pub fn mirror_key(username: &str) -> String {
        format!("{username}{TOKEN_KEY_SUFFIX}")
    }

    /// Bind `device` to the user and sign a token for it.
    pub async fn issue(&self, user: &UserClaims, device: &DeviceInfo) -> TesseraResult<IssuedSession> {
        let registration = self.registry.register(&user.username, device).await?;

        let token = token::issue_session_token(user, &device.fingerprint, &self.config)?;

        self.cache
            .set(
                &Self::mirror_key(&user.username),
                &token,
                Some(self.config.token_lifetime()),
            )
            .await?;

        info!(
            username = %user.username,
            fingerprint = %redact(&device.fingerprint),
            ?registration,
            "Session token issued"
        );
        Ok(IssuedSession {
            token,
            registration,
        })
    }

    /// Verify signature and expiry only.
    pub fn validate(&self, token: &str) -> TesseraResult<SessionClaims> {
        Ok(token::decode_session_token(token, &self.config)?)
    }

    /// Guard for protected requests.
    ///
    /// Takes the raw `Authorization` header value. The token must be a
    /// valid bearer token naming a user, and its fingerprint must still
    /// be in that user's registry. Every failure is `Unauthorized`.
    pub async fn authorize(&self, header: Option<&str>) -> TesseraResult<(SessionClaims, String)> {
        let token = header
            .and_then(|h| h.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(TesseraError::Unauthorized)?;

        let claims = self.validate(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            TesseraError::Unauthorized
        })?;

        if claims.user.username.is_empty() {
            return Err(TesseraError::Unauthorized);
        }

        // Infrastructure errors collapse too; the caller only learns that
        // authorization failed.
        let devices = self
            .registry
            .list(&claims.user.username)
            .await
            .map_err(|e| {
                debug!(error = %e, "Device registry lookup failed during authorization");
                TesseraError::Unauthorized
            })?;

        if !devices.iter().any(|d| d.fingerprint == claims.fingerprint) {
            debug!(
                username = %claims.user.username,
                fingerprint = %redact(&claims.fingerprint),
                "Token device is not registered"
            );
            return Err(TesseraError::Unauthorized);
        }

        Ok((claims, token.to_owned()))
    }
}
