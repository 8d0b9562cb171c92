//! Pin accumulation and propagation
//!
//! As each first-party package is published, its name and freshly allocated
//! version land here. The complete map is injected into the consumer manifest
//! before the consumer's own release, replacing whatever ranges or tags were
//! declared with exact literal versions.

use crate::core::error::{ConvoyError, ConvoyResult};
use crate::core::manifest::PackageManifest;
use serde::Serialize;
use std::collections::BTreeMap;

/// Name → published-version map, append-only within a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PinMap {
  entries: BTreeMap<String, String>,
}

impl PinMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a freshly published package
  ///
  /// Each name may be released at most once per run; a second insert for the
  /// same name is a `DuplicatePin` error.
  pub fn record(&mut self, name: &str, version: &str) -> ConvoyResult<()> {
    if self.entries.contains_key(name) {
      return Err(ConvoyError::DuplicatePin { name: name.to_string() });
    }
    self.entries.insert(name.to_string(), version.to_string());
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.entries.get(name).map(String::as_str)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Write every pin into the consumer manifest as an exact version
  ///
  /// Previously declared ranges, tags, and absent entries are all replaced.
  /// Applying twice is the same as applying once.
  pub fn apply(&self, manifest: &mut PackageManifest) {
    for (name, version) in &self.entries {
      manifest.set_dependency(name, version);
    }
  }
}
