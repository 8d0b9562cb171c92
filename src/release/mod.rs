//! Release orchestration
//!
//! # Core Invariants
//!
//! 1. **One suffix per run, one version per package**
//!    - Every first-party package carries `{base}-{suffix}`
//!    - A name is pinned at most once per run
//!
//! 2. **Consumers install exact versions, never ranges**
//!    - The pin map overwrites the consumer's declared constraints
//!    - The packed archive is audited before the consumer publish
//!
//! 3. **Writes and reads never swap endpoints**
//!    - Publishes go to the publish endpoint only
//!    - Visibility is confirmed against the install endpoint only
//!
//! 4. **Reruns are safe**
//!    - Mirrored versions already at the destination are skipped
//!    - Fatal errors halt with no rollback; registries are append-only

pub mod audit;
pub mod engine;
pub mod mirror;
pub mod pins;
pub mod plan;
pub mod tools;
pub mod version;

pub use engine::{PublishRecord, ReleaseEngine, ReleaseOutcome};
pub use mirror::{MirrorOutcome, MirrorResolver};
pub use pins::PinMap;
pub use plan::{PackageState, PlannedPackage, ReleasePlan};
