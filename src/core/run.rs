//! Per-run release state
//!
//! A `ReleaseRun` is created once at startup and read-only afterwards. Every
//! component receives it by reference; nothing about a run is ambient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Run identifier (SHA256 over the ordered package set and suffix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunId(String);

impl RunId {
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for RunId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Process-scoped state for one release execution
///
/// Immutable after construction. `suffix` is appended to every first-party
/// package's base version; `dist_tag` labels every publish so installers can
/// pull the set coherently; `dry_run` gates every mutating operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRun {
  pub suffix: String,
  pub dist_tag: String,
  pub dry_run: bool,
  pub started_at: DateTime<Utc>,
}

impl ReleaseRun {
  pub fn new(suffix: impl Into<String>, dist_tag: impl Into<String>, dry_run: bool) -> Self {
    Self {
      suffix: suffix.into(),
      dist_tag: dist_tag.into(),
      dry_run,
      started_at: Utc::now(),
    }
  }

  /// Derive a suffix from the current UTC time (e.g. "rc.20250828T142311")
  pub fn default_suffix() -> String {
    format!("rc.{}", Utc::now().format("%Y%m%dT%H%M%S"))
  }

  /// Compute the run ID over the ordered package names and the suffix
  pub fn id(&self, package_names: &[String]) -> RunId {
    let mut contents = package_names.join("\n");
    contents.push('\n');
    contents.push_str(&self.suffix);
    RunId::from_contents(contents.as_bytes())
  }
}
