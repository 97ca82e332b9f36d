//! Domain models for Tessera.
//!
//! These are the core types shared across all crates.

pub mod device;
pub mod user;
