//! CLI commands for convoy
//!
//! - **init**: write a starter convoy.toml
//! - **status**: show configured packages and resolved registry endpoints
//! - **mirror**: mirror auxiliary dependencies into the publish registry
//! - **release**: run the dependency-ordered release pipeline

pub mod init;
pub mod mirror;
pub mod release;
pub mod status;

pub use init::run_init;
pub use mirror::run_mirror;
pub use release::run_release;
pub use status::run_status;
