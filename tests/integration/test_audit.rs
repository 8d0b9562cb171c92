//! Tarball audit tests through a real gzip archive and system tar

use crate::helpers::{FakeTools, TestWorkspace};
use anyhow::Result;
use convoy::core::error::{AuditError, ConvoyError};
use convoy::release::audit::{audit_consumer, read_tarball_manifest};
use convoy::release::pins::PinMap;
use convoy::release::tools::PackageTools;
use tempfile::TempDir;

#[test]
fn test_reads_manifest_back_out_of_packed_archive() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let dir = ws.add_package("@acme/app", "3.0.0-rc1", &[("@acme/runtime", "2.0.0-rc1")])?;

  let scratch = TempDir::new()?;
  let tools = FakeTools::new();
  let tarball = tools.pack(&dir, scratch.path())?;

  let manifest = read_tarball_manifest(&tarball)?;
  assert_eq!(manifest.name()?, "@acme/app");
  assert_eq!(manifest.version()?, "3.0.0-rc1");
  assert_eq!(manifest.dependency("@acme/runtime"), Some("2.0.0-rc1"));
  Ok(())
}

#[test]
fn test_audit_passes_when_archive_carries_the_pins() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let dir = ws.add_package(
    "@acme/app",
    "3.0.0-rc1",
    &[("@acme/runtime", "2.0.0-rc1"), ("@acme/lib-a", "1.0.0-rc1")],
  )?;

  let mut pins = PinMap::new();
  pins.record("@acme/runtime", "2.0.0-rc1")?;
  pins.record("@acme/lib-a", "1.0.0-rc1")?;

  let tools = FakeTools::new();
  audit_consumer(&tools, &dir, &pins)?;
  Ok(())
}

#[test]
fn test_audit_catches_dependency_dropped_during_packing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let dir = ws.add_package("@acme/app", "3.0.0-rc1", &[("@acme/runtime", "2.0.0-rc1")])?;

  let mut pins = PinMap::new();
  pins.record("@acme/runtime", "2.0.0-rc1")?;

  let tools = FakeTools {
    drop_dependencies_on_pack: true,
    ..FakeTools::new()
  };
  let err = audit_consumer(&tools, &dir, &pins).unwrap_err();
  assert!(matches!(
    err,
    ConvoyError::Audit(AuditError::MissingDependency { .. })
  ));
  Ok(())
}

#[test]
fn test_audit_catches_unpinned_range_in_archive() -> Result<()> {
  let ws = TestWorkspace::new()?;
  // The manifest still carries the range; pinning never happened
  let dir = ws.add_package("@acme/app", "3.0.0-rc1", &[("@acme/runtime", "^1.0.0")])?;

  let mut pins = PinMap::new();
  pins.record("@acme/runtime", "2.0.0-rc1")?;

  let tools = FakeTools::new();
  let err = audit_consumer(&tools, &dir, &pins).unwrap_err();
  match err {
    ConvoyError::Audit(AuditError::PinMismatch { expected, actual, .. }) => {
      assert_eq!(expected, "2.0.0-rc1");
      assert_eq!(actual, "^1.0.0");
    }
    other => panic!("expected PinMismatch, got {:?}", other),
  }
  Ok(())
}
