//! Integration test suite
//!
//! Drives the release pipeline, mirroring, and the tarball audit against
//! in-memory registry/tooling fakes and real workspaces on disk.

mod helpers;
mod test_audit;
mod test_mirror;
