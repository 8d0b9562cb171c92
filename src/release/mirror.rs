//! Mirroring of auxiliary dependencies into the publish registry
//!
//! Auxiliary packages are required by the first-party set but not built from
//! this source tree. Each spec is resolved to a concrete name+version from a
//! prioritized list of sources (public source-of-truth registry first, then
//! the install endpoint), checked for presence at the publish endpoint, and
//! republished byte-identically only if absent. The whole operation is
//! rerunnable: an identical immutable version at the destination is detected
//! and skipped, never re-written.

use crate::core::error::ConvoyResult;
use crate::registry::client::RegistryClient;
use crate::registry::endpoint::{RegistryEndpoint, RegistryRole};
use serde::Serialize;

/// Result of mirroring one spec
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MirrorOutcome {
  /// Nothing to do: already present at the destination, or no source could
  /// resolve the spec (the dependency may exist there from a prior run)
  Skipped { spec: String, reason: String },
  /// Fetched from the winning source and republished
  Published { name: String, version: String },
  /// Resolution succeeded but fetch or publish did not; non-fatal
  Failed { spec: String, reason: String },
}

/// Resolves and republishes auxiliary dependencies
pub struct MirrorResolver<'a> {
  client: &'a dyn RegistryClient,
  /// Public source-of-truth registry, consulted first
  source: RegistryEndpoint,
  install: &'a RegistryEndpoint,
  publish: &'a RegistryEndpoint,
  dist_tag: &'a str,
}

impl<'a> MirrorResolver<'a> {
  pub fn new(
    client: &'a dyn RegistryClient,
    source_url: &str,
    install: &'a RegistryEndpoint,
    publish: &'a RegistryEndpoint,
    dist_tag: &'a str,
  ) -> Self {
    Self {
      client,
      source: RegistryEndpoint::new(RegistryRole::Install, source_url, None),
      install,
      publish,
      dist_tag,
    }
  }

  /// Mirror one spec; never returns Err - every failure mode is an outcome
  pub fn mirror(&self, spec: &str) -> MirrorOutcome {
    // Priority order: public source of truth, then the install endpoint.
    // First responder with both a name and a version wins.
    let resolved = [&self.source, self.install]
      .into_iter()
      .find_map(|endpoint| match self.client.resolve_spec(spec, endpoint) {
        Ok(Some((name, version))) => Some((name, version, endpoint)),
        _ => None,
      });

    let Some((name, version, winning_source)) = resolved else {
      return MirrorOutcome::Skipped {
        spec: spec.to_string(),
        reason: "No source registry could resolve the spec; it may already exist at the destination".to_string(),
      };
    };

    // Idempotency: never republish an identical immutable version
    match self.client.lookup(&name, &version, self.publish) {
      Ok(true) => {
        return MirrorOutcome::Skipped {
          spec: spec.to_string(),
          reason: format!("{}@{} already present at publish registry", name, version),
        };
      }
      Ok(false) | Err(_) => {}
    }

    match self.fetch_and_publish(&name, &version, winning_source) {
      Ok(()) => MirrorOutcome::Published { name, version },
      Err(e) => MirrorOutcome::Failed {
        spec: spec.to_string(),
        reason: e.to_string(),
      },
    }
  }

  fn fetch_and_publish(&self, name: &str, version: &str, source: &RegistryEndpoint) -> ConvoyResult<()> {
    let scratch = tempfile::tempdir()?;
    let tarball = self.client.fetch_tarball(name, version, source, scratch.path())?;
    self.client.publish_tarball(&tarball, self.publish, self.dist_tag)
  }
}

impl MirrorOutcome {
  /// Status line for terminal output
  pub fn describe(&self) -> String {
    match self {
      MirrorOutcome::Skipped { spec, reason } => format!("⏭️  {} skipped: {}", spec, reason),
      MirrorOutcome::Published { name, version } => format!("📦 Mirrored {}@{}", name, version),
      MirrorOutcome::Failed { spec, reason } => format!("⚠️  {} failed: {}", spec, reason),
    }
  }
}
