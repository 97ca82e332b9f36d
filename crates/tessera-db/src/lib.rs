//! Tessera Database — SurrealDB connection management and the user
//! directory implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Idempotent schema bootstrap ([`init_schema`])
//! - Error types ([`DbError`])
//! - The [`repository::SurrealUserRepository`] implementation of
//!   [`tessera_core::repository::UserRepository`]

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::{init_schema, schema_ddl};
