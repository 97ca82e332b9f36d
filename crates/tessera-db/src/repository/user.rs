//! SurrealDB implementation of [`UserRepository`].
//!
//! Rows are keyed by a random UUID record id; usernames are unique via
//! `idx_user_username`. Passwords arrive already hashed.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tessera_core::error::TesseraResult;
use tessera_core::models::user::{CreateUser, User};
use tessera_core::repository::UserRepository;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    username: String,
    email: String,
    mobile: String,
    first_name: String,
    middle_name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    profile_photo: Option<String>,
    created_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    username: String,
    email: String,
    mobile: String,
    first_name: String,
    middle_name: Option<String>,
    last_name: Option<String>,
    password_hash: String,
    profile_photo: Option<String>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            mobile: self.mobile,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            profile_photo: self.profile_photo,
            created_at: self.created_at,
        }
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Row(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            username: self.username,
            email: self.email,
            mobile: self.mobile,
            first_name: self.first_name,
            middle_name: self.middle_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            profile_photo: self.profile_photo,
            created_at: self.created_at,
        })
    }
}

/// Unique-index violations surface as query errors; tell them apart so
/// callers get `AlreadyExists` rather than a generic database failure.
fn classify_create_error(message: String) -> DbError {
    if message.contains("already contains") {
        DbError::Duplicate {
            entity: "user".into(),
        }
    } else {
        DbError::Query(message)
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> TesseraResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        debug!(username = %input.username, "Creating user");

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 username = $username, email = $email, \
                 mobile = $mobile, first_name = $first_name, \
                 middle_name = $middle_name, last_name = $last_name, \
                 password_hash = $password_hash, \
                 profile_photo = $profile_photo",
            )
            .bind(("id", id_str.clone()))
            .bind(("username", input.username))
            .bind(("email", input.email))
            .bind(("mobile", input.mobile))
            .bind(("first_name", input.first_name))
            .bind(("middle_name", input.middle_name))
            .bind(("last_name", input.last_name))
            .bind(("password_hash", input.password_hash))
            .bind(("profile_photo", input.profile_photo))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| classify_create_error(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id))
    }

    async fn get_by_username(&self, username: &str) -> TesseraResult<Option<User>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE username = $username",
            )
            .bind(("username", username.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_user()?)),
            None => Ok(None),
        }
    }
}
