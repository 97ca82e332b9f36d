//! Tessera Core — domain models, the shared error taxonomy, and the
//! storage traits every other crate programs against.

pub mod error;
pub mod models;
pub mod repository;
