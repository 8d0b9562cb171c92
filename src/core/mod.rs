//! Core building blocks for convoy operations
//!
//! - **config**: convoy configuration (convoy.toml) parsing and validation
//! - **error**: error types with contextual help messages
//! - **manifest**: structured package-manifest read-modify-write
//! - **run**: per-run release state (suffix, dist-tag, dry-run)

pub mod config;
pub mod error;
pub mod manifest;
pub mod run;
