//! Prerelease version allocation
//!
//! Every first-party package in a run gets `{base}-{suffix}` where `base` is
//! its last stable version with any existing prerelease stripped. Same inputs
//! always produce the same output, so reruns allocate identical versions.

use crate::core::error::{ConvoyError, ConvoyResult};
use semver::{BuildMetadata, Prerelease, Version};

/// Allocate the run version for a package
///
/// Strips any prerelease segment from `base_version` before appending the
/// run suffix, so allocating on an already-suffixed version is equivalent to
/// allocating on the stable base.
pub fn allocate(base_version: &str, suffix: &str) -> ConvoyResult<Version> {
  let mut version = Version::parse(base_version)
    .map_err(|e| ConvoyError::message(format!("Invalid version '{}': {}", base_version, e)))?;

  if suffix.is_empty() {
    return Err(ConvoyError::message("Release suffix must not be empty"));
  }

  version.pre =
    Prerelease::new(suffix).map_err(|e| ConvoyError::message(format!("Invalid release suffix '{}': {}", suffix, e)))?;
  version.build = BuildMetadata::EMPTY;
  Ok(version)
}

/// Normalized base: the version with prerelease and build metadata removed
pub fn strip_prerelease(version: &Version) -> Version {
  Version::new(version.major, version.minor, version.patch)
}
