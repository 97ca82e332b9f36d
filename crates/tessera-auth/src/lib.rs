//! Tessera Auth — field-level payload decryption, password hashing,
//! device-bound session tokens, the per-user device registry, and the
//! short-lived login handoff codes.

pub mod config;
pub mod devices;
pub mod error;
pub mod handoff;
pub mod password;
pub mod payload;
pub mod service;
pub mod session;
pub mod token;
pub mod validation;

pub use config::AuthConfig;
pub use devices::{DeviceRegistry, Registration};
pub use error::AuthError;
pub use handoff::HandoffService;
pub use service::{AuthService, ExternalRegistration, Principal};
pub use session::{IssuedSession, SessionTokenService};
pub use token::{SessionClaims, UserClaims};
