//! convoy: dependency-ordered release orchestration for mutually pinned
//! package sets
//!
//! The library surface exists so integration tests can drive the pipeline
//! against in-memory registry and tooling fakes; the binary in `main.rs` is a
//! thin CLI over `commands`.

pub mod commands;
pub mod core;
pub mod registry;
pub mod release;
pub mod ui;
