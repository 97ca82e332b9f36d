//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Empty for users registered via an external identity provider.
    pub mobile: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    /// Argon2id PHC string. Empty when the account has no password.
    pub password_hash: String,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub mobile: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    /// Already-hashed password; the directory never sees plaintext.
    pub password_hash: String,
    pub profile_photo: Option<String>,
}
