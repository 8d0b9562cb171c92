//! Tarball-level pin auditing
//!
//! Packaging tool chains have been seen to normalize, reorder, or silently
//! drop manifest fields. Before the consumer is published, the pipeline packs
//! it into its real distributable archive, extracts the manifest the archive
//! actually carries, and compares every pin. A release must never claim a pin
//! it did not ship.

use crate::core::error::{AuditError, ConvoyError, ConvoyResult, ResultExt};
use crate::core::manifest::PackageManifest;
use crate::release::pins::PinMap;
use crate::release::tools::PackageTools;
use std::path::Path;
use std::process::Command;

/// Extract the manifest embedded in a packaged archive
///
/// npm archives place the manifest at `package/package.json`; extraction
/// shells out to system tar.
pub fn read_tarball_manifest(tarball: &Path) -> ConvoyResult<PackageManifest> {
  let output = Command::new("tar")
    .args(["-xzOf"])
    .arg(tarball)
    .arg("package/package.json")
    .output()
    .with_context(|| format!("Failed to execute tar on {}", tarball.display()))?;

  if !output.status.success() {
    return Err(ConvoyError::message(format!(
      "Could not extract manifest from {}: {}",
      tarball.display(),
      String::from_utf8_lossy(&output.stderr).trim()
    )));
  }

  PackageManifest::parse(&String::from_utf8_lossy(&output.stdout))
}

/// Compare the archived manifest's dependency entries against the pins
///
/// Every pinned name must be present with the exact version recorded this
/// run; any disagreement is fatal.
pub fn verify_pins(manifest: &PackageManifest, pins: &PinMap) -> ConvoyResult<()> {
  for (name, expected) in pins.iter() {
    match manifest.dependency(name) {
      None => {
        return Err(ConvoyError::Audit(AuditError::MissingDependency {
          dependency: name.to_string(),
          expected: expected.to_string(),
        }));
      }
      Some(actual) if actual != expected => {
        return Err(ConvoyError::Audit(AuditError::PinMismatch {
          dependency: name.to_string(),
          expected: expected.to_string(),
          actual: actual.to_string(),
        }));
      }
      Some(_) => {}
    }
  }
  Ok(())
}

/// Pack the consumer directory (without publishing) and audit the archive
pub fn audit_consumer(tools: &dyn PackageTools, dir: &Path, pins: &PinMap) -> ConvoyResult<()> {
  let scratch = tempfile::tempdir()?;
  let tarball = tools.pack(dir, scratch.path())?;
  let manifest = read_tarball_manifest(&tarball)?;
  verify_pins(&manifest, pins)
}
