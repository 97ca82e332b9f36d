//! Schema definition for the user directory.
//!
//! The table is SCHEMAFULL and every statement is `IF NOT EXISTS`, so
//! applying it on each start is safe.

use surrealdb::{Connection, Surreal};
use tracing::info;

use crate::error::DbError;

const SCHEMA_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS username ON TABLE user TYPE string \
    ASSERT string::len($value) > 0;
DEFINE FIELD IF NOT EXISTS email ON TABLE user TYPE string;
DEFINE FIELD IF NOT EXISTS mobile ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS first_name ON TABLE user TYPE string;
DEFINE FIELD IF NOT EXISTS middle_name ON TABLE user TYPE option<string>;
DEFINE FIELD IF NOT EXISTS last_name ON TABLE user TYPE option<string>;
DEFINE FIELD IF NOT EXISTS password_hash ON TABLE user TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS profile_photo ON TABLE user TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_user_username ON TABLE user \
    COLUMNS username UNIQUE;
";

/// Apply the user directory schema.
pub async fn init_schema<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(SCHEMA_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Schema(e.to_string()))?;

    info!("User directory schema ready");

    Ok(())
}

/// Returns the raw schema DDL.
pub fn schema_ddl() -> &'static str {
    SCHEMA_DDL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent() {
        for statement in SCHEMA_DDL.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            assert!(
                statement.contains("IF NOT EXISTS"),
                "statement is not idempotent: {statement}"
            );
        }
    }

    #[test]
    fn username_is_unique() {
        assert!(SCHEMA_DDL.contains("COLUMNS username UNIQUE"));
    }
}
