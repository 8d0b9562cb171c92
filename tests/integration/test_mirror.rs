//! Mirroring tests: resolution priority, idempotent skip, non-fatal failure

use crate::helpers::{standard_config, FakeRegistry, FakeTools, TestWorkspace};
use anyhow::Result;
use convoy::core::run::ReleaseRun;
use convoy::registry::endpoint::{EndpointPair, RegistryEndpoint, RegistryRole};
use convoy::release::engine::ReleaseEngine;
use convoy::release::mirror::{MirrorOutcome, MirrorResolver};

const SOURCE: &str = "https://registry.npmjs.org";
const INSTALL: &str = "https://repo.corp/api/npm/npm-virtual";
const PUBLISH: &str = "https://repo.corp/api/npm/npm-local";

fn endpoints() -> (RegistryEndpoint, RegistryEndpoint) {
  (
    RegistryEndpoint::new(RegistryRole::Install, INSTALL, None),
    RegistryEndpoint::new(RegistryRole::Publish, PUBLISH, None),
  )
}

#[test]
fn test_mirrors_missing_dependency() {
  let registry = FakeRegistry::new();
  registry.seed_source(SOURCE, "lodash", "4.17.21");

  let (install, publish) = endpoints();
  let resolver = MirrorResolver::new(&registry, SOURCE, &install, &publish, "next");
  let outcome = resolver.mirror("lodash@^4.0.0");

  match outcome {
    MirrorOutcome::Published { name, version } => {
      assert_eq!(name, "lodash");
      assert_eq!(version, "4.17.21");
    }
    other => panic!("expected Published, got {:?}", other),
  }
  assert!(registry.has(PUBLISH, "lodash", "4.17.21"));
}

#[test]
fn test_skips_version_already_at_destination() {
  let registry = FakeRegistry::new();
  registry.seed_source(SOURCE, "left-pad", "1.3.0");
  registry.seed_published(PUBLISH, "left-pad", "1.3.0");

  let (install, publish) = endpoints();
  let resolver = MirrorResolver::new(&registry, SOURCE, &install, &publish, "next");
  let outcome = resolver.mirror("left-pad");

  assert!(matches!(outcome, MirrorOutcome::Skipped { .. }));
  // No write happened; the immutable version was never republished
  assert!(registry.publish_log.borrow().is_empty());
}

#[test]
fn test_unresolvable_spec_is_skipped_not_fatal() {
  let registry = FakeRegistry::new();
  let (install, publish) = endpoints();
  let resolver = MirrorResolver::new(&registry, SOURCE, &install, &publish, "next");

  let outcome = resolver.mirror("@acme/no-such-package");
  assert!(matches!(outcome, MirrorOutcome::Skipped { .. }));
}

#[test]
fn test_public_source_wins_over_install_endpoint() {
  let registry = FakeRegistry::new();
  registry.seed_source(SOURCE, "lodash", "4.17.21");
  registry.seed_source(INSTALL, "lodash", "1.0.0");

  let (install, publish) = endpoints();
  let resolver = MirrorResolver::new(&registry, SOURCE, &install, &publish, "next");
  let outcome = resolver.mirror("lodash");

  assert!(matches!(outcome, MirrorOutcome::Published { ref version, .. } if version == "4.17.21"));
}

#[test]
fn test_install_endpoint_is_the_fallback_source() {
  let registry = FakeRegistry::new();
  // Nothing at the public source, only the install endpoint resolves
  registry.seed_source(INSTALL, "@corp/private-tool", "2.1.0");

  let (install, publish) = endpoints();
  let resolver = MirrorResolver::new(&registry, SOURCE, &install, &publish, "next");
  let outcome = resolver.mirror("@corp/private-tool");

  assert!(matches!(outcome, MirrorOutcome::Published { ref version, .. } if version == "2.1.0"));
  assert!(registry.has(PUBLISH, "@corp/private-tool", "2.1.0"));
}

#[test]
fn test_engine_mirrors_configured_specs_before_release() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.add_package("@acme/app", "3.0.0", &[])?;
  let config = standard_config("http://npm.internal:4873");
  let pair = EndpointPair::resolve(&config.registry)?;
  let run = ReleaseRun::new("rc1", "next", false);

  let registry = FakeRegistry::new();
  registry.seed_source(SOURCE, "lodash", "4.17.21");
  registry.seed_published("http://npm.internal:4873", "left-pad", "1.3.0");
  registry.seed_source(SOURCE, "left-pad", "1.3.0");

  let tools = FakeTools::new();
  let mut engine = ReleaseEngine::new(&run, &pair, &registry, &tools);
  let outcomes = engine.mirror_auxiliaries(&["lodash".to_string(), "left-pad".to_string()], SOURCE);

  assert_eq!(outcomes.len(), 2);
  assert!(matches!(outcomes[0], MirrorOutcome::Published { .. }));
  assert!(matches!(outcomes[1], MirrorOutcome::Skipped { .. }));
  Ok(())
}
