//! The dependency-ordered release pipeline
//!
//! Strictly sequential: each package's outputs (allocated version, pin entry)
//! feed later steps, and the consumer depends on every prior package having
//! completed. Per package: build → allocate+write version → publish → record
//! pin → confirm visibility. The consumer additionally gets the pin map
//! applied to its manifest and its packed archive audited before the real
//! publish.
//!
//! Fatal errors halt the remainder of the plan with no rollback; registries
//! are append-only per version, and reruns rely on idempotent skip instead of
//! partial-resume state.

use crate::core::config::PackageKind;
use crate::core::error::ConvoyResult;
use crate::core::manifest::PackageManifest;
use crate::core::run::ReleaseRun;
use crate::registry::client::RegistryClient;
use crate::registry::endpoint::EndpointPair;
use crate::registry::visibility::{self, PollSettings};
use crate::release::audit;
use crate::release::mirror::{MirrorOutcome, MirrorResolver};
use crate::release::pins::PinMap;
use crate::release::plan::{PackageState, ReleasePlan};
use crate::release::tools::PackageTools;
use serde::Serialize;

/// Result of one publish attempt, kept for the run report only
#[derive(Debug, Clone, Serialize)]
pub struct PublishRecord {
  pub name: String,
  pub version: String,
  pub registry: String,
  pub confirmed_visible: bool,
}

/// Everything a completed run hands to downstream consumers (smoke tests,
/// archival): the full pin map and the per-publish records
#[derive(Debug, Serialize)]
pub struct ReleaseOutcome {
  pub pins: PinMap,
  pub records: Vec<PublishRecord>,
  pub warnings: Vec<String>,
}

/// Drives one release run end to end
pub struct ReleaseEngine<'a> {
  run: &'a ReleaseRun,
  endpoints: &'a EndpointPair,
  registry: &'a dyn RegistryClient,
  tools: &'a dyn PackageTools,
  poll: PollSettings,
  /// Suppress status lines (machine-readable output modes)
  quiet: bool,
  mirror_warnings: Vec<String>,
}

impl<'a> ReleaseEngine<'a> {
  pub fn new(
    run: &'a ReleaseRun,
    endpoints: &'a EndpointPair,
    registry: &'a dyn RegistryClient,
    tools: &'a dyn PackageTools,
  ) -> Self {
    Self {
      run,
      endpoints,
      registry,
      tools,
      poll: PollSettings::default(),
      quiet: false,
      mirror_warnings: Vec::new(),
    }
  }

  pub fn with_poll(mut self, poll: PollSettings) -> Self {
    self.poll = poll;
    self
  }

  pub fn with_quiet(mut self, quiet: bool) -> Self {
    self.quiet = quiet;
    self
  }

  fn status(&self, line: String) {
    if !self.quiet {
      println!("{}", line);
    }
  }

  /// Mirror the auxiliary dependencies before the first-party plan runs
  ///
  /// Every outcome is non-fatal; failed mirrors are carried into the next
  /// `execute` call's warnings.
  pub fn mirror_auxiliaries(&mut self, specs: &[String], source_url: &str) -> Vec<MirrorOutcome> {
    let resolver = MirrorResolver::new(
      self.registry,
      source_url,
      &self.endpoints.install,
      &self.endpoints.publish,
      &self.run.dist_tag,
    );

    specs
      .iter()
      .map(|spec| {
        let outcome = resolver.mirror(spec);
        self.status(outcome.describe());
        if let MirrorOutcome::Failed { spec, reason } = &outcome {
          self.mirror_warnings.push(format!("Mirror of '{}' failed: {}", spec, reason));
        }
        outcome
      })
      .collect()
  }

  /// Execute the plan in order
  pub fn execute(&mut self, plan: &mut ReleasePlan) -> ConvoyResult<ReleaseOutcome> {
    let mut pins = PinMap::new();
    let mut records = Vec::new();
    let mut warnings = std::mem::take(&mut self.mirror_warnings);
    let total = plan.packages.len();

    for idx in 0..total {
      let pkg = &mut plan.packages[idx];
      let target = pkg.target_version.to_string();
      let header = format!("🚚 {} ({}/{}): {} → {}", pkg.name, idx + 1, total, pkg.base_version, target);
      self.status(header);

      // Build (external collaborator; pass/fail only)
      if let Err(e) = self.tools.build(&pkg.name, &pkg.dir) {
        let _ = pkg.advance(PackageState::Failed);
        return Err(e);
      }
      pkg.advance(PackageState::Built)?;

      // Runtime gets its embedded sandbox libraries bundled, best-effort
      if pkg.kind == PackageKind::Runtime
        && let Err(e) = self.tools.bundle_sandbox(&pkg.name, &pkg.dir)
      {
        self.status(format!("⚠️  Sandbox bundling failed for {} (continuing): {}", pkg.name, e));
        warnings.push(format!("Sandbox bundling failed for {}: {}", pkg.name, e));
      }

      // Write the allocated version into the manifest
      if !self.run.dry_run {
        let mut manifest = PackageManifest::load(&pkg.dir)?;
        manifest.set_version(&target);
        manifest.save()?;
      }
      pkg.advance(PackageState::Versioned)?;

      // The consumer gets the complete pin map and the tarball audit before
      // its publish; by this point every upstream pin has been recorded
      if pkg.kind == PackageKind::Consumer {
        if self.run.dry_run {
          self.status(format!(
            "🔍 [dry-run] Would pin {} dependencies in {} and audit the packed archive",
            pins.len(),
            pkg.name
          ));
        } else {
          let mut manifest = PackageManifest::load(&pkg.dir)?;
          pins.apply(&mut manifest);
          manifest.save()?;

          if let Err(e) = audit::audit_consumer(self.tools, &pkg.dir, &pins) {
            let _ = pkg.advance(PackageState::Failed);
            return Err(e);
          }
          self.status(format!("🔎 Audit passed: packed archive carries all {} pins", pins.len()));
        }
      }

      // Publish to the write endpoint, never the read endpoint
      if let Err(e) = self.registry.publish_dir(&pkg.dir, &self.endpoints.publish, &self.run.dist_tag) {
        let _ = pkg.advance(PackageState::Failed);
        return Err(e);
      }
      pkg.advance(PackageState::Published)?;
      pins.record(&pkg.name, &target)?;

      // Confirm visibility on the read endpoint; timeout is a warning
      if self.run.dry_run {
        pkg.advance(PackageState::VisibilityUnknown)?;
        records.push(PublishRecord {
          name: pkg.name.clone(),
          version: target,
          registry: self.endpoints.publish.url.clone(),
          confirmed_visible: false,
        });
        continue;
      }

      let visible = visibility::await_visible(self.registry, &pkg.name, &target, &self.endpoints.install, self.poll)?;
      if visible {
        pkg.advance(PackageState::Visible)?;
        self.status(format!("✅ {}@{} visible at install registry", pkg.name, target));
      } else {
        pkg.advance(PackageState::VisibilityUnknown)?;
        self.status(format!(
          "⚠️  {}@{} not visible within {}s (write succeeded; read-side propagation pending)",
          pkg.name,
          target,
          self.poll.timeout.as_secs()
        ));
        warnings.push(format!(
          "{}@{} not confirmed visible within {}s",
          pkg.name,
          target,
          self.poll.timeout.as_secs()
        ));
      }
      records.push(PublishRecord {
        name: pkg.name.clone(),
        version: target,
        registry: self.endpoints.publish.url.clone(),
        confirmed_visible: visible,
      });
    }

    Ok(ReleaseOutcome {
      pins,
      records,
      warnings,
    })
  }
}
