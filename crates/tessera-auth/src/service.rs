//! Authentication service: account registration, password and
//! handoff-code login, and device management for signed-in users.

use serde_json::Value;
use tessera_core::error::{TesseraError, TesseraResult};
use tessera_core::models::device::{DeviceInfo, DeviceSelector};
use tessera_core::models::user::CreateUser;
use tessera_core::repository::{CacheStore, UserRepository};
use tracing::{info, instrument, warn};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::handoff::HandoffService;
use crate::password;
use crate::payload;
use crate::session::SessionTokenService;
use crate::token::{SessionClaims, UserClaims, redact};
use crate::validation::{self, RegistrationFields};

/// Encrypted fields of a self-service registration.
pub const REGISTER_FIELDS: &[&str] = &[
    "username",
    "email",
    "mobile",
    "first_name",
    "middle_name",
    "password",
    "last_name",
];
/// Encrypted fields of a password login.
pub const LOGIN_FIELDS: &[&str] = &["username", "password"];
/// Encrypted fields of an external-identity registration.
pub const EXTERNAL_FIELDS: &[&str] = &["username", "email", "first_name"];

pub const USERNAME_TAKEN: &str = "Username not available";
pub const DEVICE_INFO_REQUIRED: &str = "device_info is required";
pub const PASSWORD_REQUIRED: &str = "Password is required.";
pub const FINGERPRINT_REQUIRED: &str = "device_fingerprint is required";

/// An authenticated request: verified claims plus the bearer token they
/// came from.
#[derive(Debug, Clone)]
pub struct Principal {
    pub claims: SessionClaims,
    pub token: String,
}

impl Principal {
    pub fn username(&self) -> &str {
        &self.claims.user.username
    }
}

#[derive(Debug, Clone)]
pub struct ExternalRegistration {
    pub token: String,
    /// The identity already had an account; nothing was created.
    pub already_registered: bool,
}

fn text<'a>(payload: &'a Value, name: &str) -> &'a str {
    payload.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn optional_text(payload: &Value, name: &str) -> Option<String> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// The `device_info` object every token-issuing request must carry.
pub fn device_info(payload: &Value) -> TesseraResult<DeviceInfo> {
    payload
        .get("device_info")
        .cloned()
        .and_then(|v| serde_json::from_value::<DeviceInfo>(v).ok())
        .filter(|d| !d.fingerprint.is_empty())
        .ok_or_else(|| TesseraError::validation(DEVICE_INFO_REQUIRED))
}

/// Orchestrates the account flows.
///
/// Generic over the user directory and the cache store so the auth layer
/// has no dependency on concrete storage crates.
pub struct AuthService<U: UserRepository, C: CacheStore> {
    users: U,
    sessions: SessionTokenService<C>,
    handoff: HandoffService<C>,
    config: AuthConfig,
}

impl<U: UserRepository, C: CacheStore> AuthService<U, C> {
    pub fn new(users: U, cache: C, config: AuthConfig) -> Self {
        let sessions = SessionTokenService::new(cache.clone(), config.clone());
        Self {
            users,
            handoff: HandoffService::new(cache, sessions.clone()),
            sessions,
            config,
        }
    }

    pub fn sessions(&self) -> &SessionTokenService<C> {
        &self.sessions
    }

    fn decrypt(&self, body: Value, fields: &[&str]) -> TesseraResult<Value> {
        let key = self
            .config
            .field_encryption_key
            .as_ref()
            .ok_or_else(|| AuthError::Decryption("no field encryption key configured".into()))?;
        Ok(payload::decrypt_fields(body, fields, key)?)
    }

    async fn hash(&self, plaintext: String) -> TesseraResult<String> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext, pepper.as_deref()))
            .await
            .map_err(|e| TesseraError::Internal(format!("hashing task failed: {e}")))?
            .map_err(TesseraError::from)
    }

    async fn verify(&self, plaintext: String, hash: String) -> TesseraResult<bool> {
        let pepper = self.config.pepper.clone();
        tokio::task::spawn_blocking(move || {
            password::verify_password(&plaintext, &hash, pepper.as_deref())
        })
        .await
        .map_err(|e| TesseraError::Internal(format!("verification task failed: {e}")))?
        .map_err(TesseraError::from)
    }

    /// Create an account from an encrypted registration payload and sign
    /// the registering device in.
    #[instrument(skip_all)]
    pub async fn register(&self, payload: Value) -> TesseraResult<String> {
        // 1. Decrypt and pull out the device.
        let payload = self.decrypt(payload, REGISTER_FIELDS)?;
        let device = device_info(&payload)?;
        let username = text(&payload, "username");

        // 2. Username availability comes before format validation.
        if self.users.get_by_username(username).await?.is_some() {
            return Err(TesseraError::validation(USERNAME_TAKEN));
        }

        let middle_name = optional_text(&payload, "middle_name");
        let last_name = optional_text(&payload, "last_name");
        validation::validate_registration(&RegistrationFields {
            username,
            email: text(&payload, "email"),
            mobile: text(&payload, "mobile"),
            first_name: text(&payload, "first_name"),
            middle_name: middle_name.as_deref(),
            last_name: last_name.as_deref(),
        })?;

        let plaintext = text(&payload, "password");
        if plaintext.is_empty() {
            return Err(TesseraError::validation(PASSWORD_REQUIRED));
        }

        // 3. Hash and persist.
        let password_hash = self.hash(plaintext.to_owned()).await?;
        let user = self
            .users
            .create(CreateUser {
                username: username.to_owned(),
                email: text(&payload, "email").to_owned(),
                mobile: text(&payload, "mobile").to_owned(),
                first_name: text(&payload, "first_name").to_owned(),
                middle_name,
                last_name,
                password_hash,
                profile_photo: optional_text(&payload, "profile_photo"),
            })
            .await
            .map_err(|e| match e {
                TesseraError::AlreadyExists { .. } => TesseraError::validation(USERNAME_TAKEN),
                other => other,
            })?;
        info!(username = %user.username, user_id = %user.id, "User registered");

        // 4. Sign the device in.
        let issued = self.sessions.issue(&UserClaims::from(&user), &device).await?;
        Ok(issued.token)
    }

    /// Password login. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    #[instrument(skip_all)]
    pub async fn login(&self, payload: Value) -> TesseraResult<String> {
        let payload = self.decrypt(payload, LOGIN_FIELDS)?;
        let device = device_info(&payload)?;
        let username = text(&payload, "username");

        let Some(user) = self.users.get_by_username(username).await? else {
            warn!(username, "Login for unknown user");
            return Err(TesseraError::InvalidCredentials);
        };

        let valid = self
            .verify(text(&payload, "password").to_owned(), user.password_hash.clone())
            .await?;
        if !valid {
            warn!(username, "Login with wrong password");
            return Err(TesseraError::InvalidCredentials);
        }

        let issued = self.sessions.issue(&UserClaims::from(&user), &device).await?;
        Ok(issued.token)
    }

    /// Sign in through an external identity provider, creating a
    /// password-less account on first use.
    #[instrument(skip_all)]
    pub async fn register_external(&self, payload: Value) -> TesseraResult<ExternalRegistration> {
        let payload = self.decrypt(payload, EXTERNAL_FIELDS)?;
        let device = device_info(&payload)?;
        let username = text(&payload, "username");
        if username.is_empty() {
            return Err(TesseraError::validation(validation::INVALID_USERNAME));
        }

        let (user, already_registered) = match self.users.get_by_username(username).await? {
            Some(user) => (user, true),
            None => {
                let user = self
                    .users
                    .create(CreateUser {
                        username: username.to_owned(),
                        email: text(&payload, "email").to_owned(),
                        mobile: String::new(),
                        first_name: text(&payload, "first_name").to_owned(),
                        middle_name: None,
                        last_name: None,
                        password_hash: String::new(),
                        profile_photo: optional_text(&payload, "profile_photo"),
                    })
                    .await?;
                info!(username = %user.username, user_id = %user.id, "External user registered");
                (user, false)
            }
        };

        let issued = self.sessions.issue(&UserClaims::from(&user), &device).await?;
        Ok(ExternalRegistration {
            token: issued.token,
            already_registered,
        })
    }

    /// Guard for protected operations; see
    /// [`SessionTokenService::authorize`].
    pub async fn authorize(&self, header: Option<&str>) -> TesseraResult<Principal> {
        let (claims, token) = self.sessions.authorize(header).await?;
        Ok(Principal { claims, token })
    }

    /// Issue a handoff code for the caller's current session.
    pub async fn issue_code(&self, principal: &Principal) -> TesseraResult<String> {
        self.handoff.issue_code(&principal.token).await
    }

    /// Redeem a handoff code for the device described in `payload`.
    #[instrument(skip_all, fields(code = %redact(code)))]
    pub async fn login_with_code(&self, code: &str, payload: Value) -> TesseraResult<String> {
        let device = device_info(&payload)?;
        let issued = self.handoff.redeem_code(code, &device).await?;
        Ok(issued.token)
    }

    pub async fn list_devices(&self, principal: &Principal) -> TesseraResult<Vec<DeviceInfo>> {
        self.sessions.registry().list(principal.username()).await
    }

    /// Remove one device (`device_fingerprint`) or every device
    /// (`is_remove_all_devices: true`).
    pub async fn remove_devices(&self, principal: &Principal, payload: Value) -> TesseraResult<()> {
        let remove_all = payload
            .get("is_remove_all_devices")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let selector = if remove_all {
            DeviceSelector::All
        } else {
            let fingerprint = optional_text(&payload, "device_fingerprint")
                .ok_or_else(|| TesseraError::validation(FINGERPRINT_REQUIRED))?;
            DeviceSelector::Fingerprint(fingerprint)
        };

        self.sessions
            .registry()
            .remove(principal.username(), &selector)
            .await
    }

    pub async fn profile_photo(&self, principal: &Principal) -> TesseraResult<Option<String>> {
        let user = self
            .users
            .get_by_username(principal.username())
            .await?
            .ok_or_else(|| TesseraError::NotFound {
                entity: "user".into(),
                id: principal.username().to_owned(),
            })?;
        Ok(user.profile_photo)
    }
}
