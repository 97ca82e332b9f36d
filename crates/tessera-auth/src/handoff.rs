//! Cross-device login handoff.
//!
//! A signed-in device asks for a short-lived opaque code (rendered as a
//! QR code by the client). A second device redeems the code and receives
//! its own token, bound to its own fingerprint, without re-entering
//! credentials. Codes are single-shot: redemption removes the code
//! atomically whether or not the redemption then succeeds.

use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::device::DeviceInfo;
use tessera_core::repository::CacheStore;
use tracing::{debug, info};

use crate::session::{IssuedSession, SessionTokenService};
use crate::token::{self, redact};

#[derive(Debug, Clone)]
pub struct HandoffService<C: CacheStore> {
    cache: C,
    sessions: SessionTokenService<C>,
}

impl<C: CacheStore> HandoffService<C> {
    pub fn new(cache: C, sessions: SessionTokenService<C>) -> Self {
        Self { cache, sessions }
    }

    /// Store a new code pointing at `token` and return it.
    pub async fn issue_code(&self, token: &str) -> TesseraResult<String> {
        let code = token::generate_handoff_code();
        self.cache
            .set(&code, token, Some(self.sessions.config().code_lifetime()))
            .await?;
        info!(code = %redact(&code), "Handoff code issued");
        Ok(code)
    }

    /// Exchange `code` for a fresh token bound to `device`.
    ///
    /// An unknown, expired or already redeemed code is `CodeInvalid`, as
    /// is a code whose stored token no longer verifies. The registry
    /// limit applies exactly as for a password login.
    pub async fn redeem_code(&self, code: &str, device: &DeviceInfo) -> TesseraResult<IssuedSession> {
        if code.is_empty() {
            return Err(TesseraError::CodeInvalid);
        }

        let stored = self
            .cache
            .take(code)
            .await?
            .ok_or(TesseraError::CodeInvalid)?;

        let claims = self.sessions.validate(&stored).map_err(|e| {
            debug!(code = %redact(code), error = %e, "Handoff code points at an unusable token");
            TesseraError::CodeInvalid
        })?;

        let issued = self.sessions.issue(&claims.user, device).await?;
        info!(
            code = %redact(code),
            username = %claims.user.username,
            "Handoff code redeemed"
        );
        Ok(issued)
    }
}
