//! Release planning: the curated package order and its per-package states
//!
//! The first-party set has a fixed shape: independent libraries, then one
//! runtime-support package, then exactly one consumer that (via pinning)
//! depends on everything before it. The curated order is validated against
//! the dependency edges actually declared in the manifests before anything
//! is built or published.

use crate::core::config::{ConvoyConfig, PackageKind};
use crate::core::error::{ConvoyError, ConvoyResult};
use crate::core::manifest::PackageManifest;
use crate::core::run::{ReleaseRun, RunId};
use crate::release::version;
use petgraph::graph::DiGraph;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Per-package release lifecycle
///
/// Transitions only move forward; `Failed` is terminal and reachable from a
/// build or publish attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PackageState {
  Pending,
  Built,
  Versioned,
  Published,
  Visible,
  VisibilityUnknown,
  Failed,
}

impl PackageState {
  fn rank(self) -> u8 {
    match self {
      PackageState::Pending => 0,
      PackageState::Built => 1,
      PackageState::Versioned => 2,
      PackageState::Published => 3,
      PackageState::Visible | PackageState::VisibilityUnknown => 4,
      PackageState::Failed => 5,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      PackageState::Visible | PackageState::VisibilityUnknown | PackageState::Failed
    )
  }
}

/// One first-party package with its allocated version and current state
#[derive(Debug, Clone, Serialize)]
pub struct PlannedPackage {
  pub name: String,
  pub dir: PathBuf,
  pub kind: PackageKind,
  /// Normalized (non-prerelease) base version read from the manifest
  pub base_version: semver::Version,
  /// Version this run will publish (base + run suffix)
  pub target_version: semver::Version,
  /// First-party packages this one declares a dependency on
  pub internal_dependencies: Vec<String>,
  pub state: PackageState,
}

impl PlannedPackage {
  /// Advance the lifecycle; backwards or skipping transitions are a bug
  pub fn advance(&mut self, next: PackageState) -> ConvoyResult<()> {
    let valid = if next == PackageState::Failed {
      !self.state.is_terminal()
    } else {
      next.rank() == self.state.rank() + 1
    };

    if !valid {
      return Err(ConvoyError::message(format!(
        "Invalid state transition for '{}': {:?} → {:?}",
        self.name, self.state, next
      )));
    }
    self.state = next;
    Ok(())
  }
}

/// The ordered release plan for one run
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
  pub run_id: RunId,
  pub suffix: String,
  pub dist_tag: String,
  pub dry_run: bool,
  pub packages: Vec<PlannedPackage>,
}

impl ReleasePlan {
  /// Build the plan: read every manifest, allocate every version, order the
  /// set libraries → runtime → consumer, and validate the order against the
  /// declared dependency graph
  pub fn build(workspace_root: &Path, config: &ConvoyConfig, run: &ReleaseRun) -> ConvoyResult<Self> {
    config.validate()?;

    let first_party: Vec<&str> = config.packages.iter().map(|p| p.name.as_str()).collect();
    let mut packages = Vec::with_capacity(config.packages.len());

    for kind in [PackageKind::Library, PackageKind::Runtime, PackageKind::Consumer] {
      for pkg in config.packages.iter().filter(|p| p.kind == kind) {
        let dir = workspace_root.join(&pkg.dir);
        let manifest = PackageManifest::load(&dir)?;
        let declared = manifest.version()?;

        let parsed = semver::Version::parse(declared).map_err(|_| ConvoyError::InvalidVersion {
          name: pkg.name.clone(),
          value: declared.to_string(),
        })?;
        let base_version = version::strip_prerelease(&parsed);
        let target_version =
          version::allocate(&base_version.to_string(), &run.suffix).map_err(|_| ConvoyError::InvalidVersion {
            name: pkg.name.clone(),
            value: format!("{}-{}", base_version, run.suffix),
          })?;

        let internal_dependencies: Vec<String> = manifest
          .dependencies()
          .keys()
          .filter(|d| first_party.contains(&d.as_str()))
          .cloned()
          .collect();

        packages.push(PlannedPackage {
          name: pkg.name.clone(),
          dir,
          kind: pkg.kind,
          base_version,
          target_version,
          internal_dependencies,
          state: PackageState::Pending,
        });
      }
    }

    let names: Vec<String> = packages.iter().map(|p| p.name.clone()).collect();
    let plan = Self {
      run_id: run.id(&names),
      suffix: run.suffix.clone(),
      dist_tag: run.dist_tag.clone(),
      dry_run: run.dry_run,
      packages,
    };
    plan.validate_order()?;
    Ok(plan)
  }

  /// Validate the curated order against declared dependency edges
  fn validate_order(&self) -> ConvoyResult<()> {
    // Libraries are independent by definition
    for pkg in self.packages.iter().filter(|p| p.kind == PackageKind::Library) {
      if let Some(dep) = pkg.internal_dependencies.first() {
        return Err(ConvoyError::with_help(
          format!("Library '{}' declares a first-party dependency on '{}'", pkg.name, dep),
          "Libraries must be independent; promote the package to kind = \"runtime\" or restructure",
        ));
      }
    }

    // Nothing may depend on the consumer
    if let Some(consumer) = self.packages.iter().find(|p| p.kind == PackageKind::Consumer) {
      for pkg in &self.packages {
        if pkg.name != consumer.name && pkg.internal_dependencies.contains(&consumer.name) {
          return Err(ConvoyError::message(format!(
            "Package '{}' depends on the consumer '{}'",
            pkg.name, consumer.name
          )));
        }
      }
    }

    // Dependency edges must agree with the release order (and be acyclic)
    let mut graph = DiGraph::<&str, ()>::new();
    let mut indices = BTreeMap::new();
    for pkg in &self.packages {
      indices.insert(pkg.name.as_str(), graph.add_node(pkg.name.as_str()));
    }
    for pkg in &self.packages {
      for dep in &pkg.internal_dependencies {
        graph.add_edge(indices[dep.as_str()], indices[pkg.name.as_str()], ());
      }
    }

    petgraph::algo::toposort(&graph, None)
      .map_err(|cycle| ConvoyError::message(format!("Dependency cycle involving '{}'", graph[cycle.node_id()])))?;

    let position = |name: &str| self.packages.iter().position(|p| p.name == name).unwrap_or(usize::MAX);
    for pkg in &self.packages {
      for dep in &pkg.internal_dependencies {
        if position(dep) > position(&pkg.name) {
          return Err(ConvoyError::message(format!(
            "Release order places '{}' after its dependent '{}'",
            dep, pkg.name
          )));
        }
      }
    }

    Ok(())
  }

  /// Package names in release order
  pub fn names(&self) -> Vec<String> {
    self.packages.iter().map(|p| p.name.clone()).collect()
  }

  pub fn consumer(&self) -> Option<&PlannedPackage> {
    self.packages.iter().find(|p| p.kind == PackageKind::Consumer)
  }

  /// Human-readable plan summary
  pub fn to_human_readable(&self) -> String {
    let mut output = String::new();
    output.push_str(&format!("📋 Release plan {} (tag: {})\n", self.run_id, self.dist_tag));
    output.push_str(&format!("   Suffix: {}\n\n", self.suffix));

    for (i, pkg) in self.packages.iter().enumerate() {
      let kind = match pkg.kind {
        PackageKind::Library => "library",
        PackageKind::Runtime => "runtime",
        PackageKind::Consumer => "consumer",
      };
      output.push_str(&format!(
        "   {}. {} [{}]  {} → {}\n",
        i + 1,
        pkg.name,
        kind,
        pkg.base_version,
        pkg.target_version
      ));
    }

    if self.dry_run {
      output.push_str("\n🔍 Dry-run mode (no publishes, no manifest writes)\n");
    }

    output
  }
}
