//! Test helpers for integration tests

use anyhow::Result;
use convoy::core::config::{ConvoyConfig, PackageConfig, PackageKind};
use convoy::core::error::{ConvoyError, ConvoyResult};
use convoy::registry::client::RegistryClient;
use convoy::registry::endpoint::RegistryEndpoint;
use convoy::release::tools::PackageTools;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A test workspace with package directories and manifests
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Add a package directory with a manifest
  ///
  /// The directory is `packages/<name-without-scope>`.
  pub fn add_package(&self, name: &str, version: &str, deps: &[(&str, &str)]) -> Result<PathBuf> {
    let dir = self.path.join(Self::dir_for(name));
    std::fs::create_dir_all(&dir)?;

    let mut dependencies = serde_json::Map::new();
    for (dep_name, constraint) in deps {
      dependencies.insert(
        dep_name.to_string(),
        serde_json::Value::String(constraint.to_string()),
      );
    }

    let manifest = serde_json::json!({
      "name": name,
      "version": version,
      "description": format!("{} test package", name),
      "dependencies": dependencies,
      "scripts": { "build": "true" }
    });
    std::fs::write(dir.join("package.json"), serde_json::to_string_pretty(&manifest)?)?;

    Ok(dir)
  }

  /// Relative package directory for a name (scope stripped)
  pub fn dir_for(name: &str) -> PathBuf {
    let short = name.rsplit('/').next().unwrap_or(name);
    PathBuf::from("packages").join(short)
  }

  /// Read back a package's manifest from disk
  pub fn manifest(&self, name: &str) -> Result<convoy::core::manifest::PackageManifest> {
    Ok(convoy::core::manifest::PackageManifest::load(&self.path.join(Self::dir_for(name)))?)
  }
}

/// Build the standard four-package release config: two libraries, one
/// runtime, one consumer
pub fn standard_config(registry_url: &str) -> ConvoyConfig {
  let mut config = ConvoyConfig::new(registry_url);
  for (name, kind) in [
    ("@acme/lib-a", PackageKind::Library),
    ("@acme/lib-b", PackageKind::Library),
    ("@acme/runtime", PackageKind::Runtime),
    ("@acme/app", PackageKind::Consumer),
  ] {
    config.packages.push(PackageConfig {
      name: name.to_string(),
      dir: TestWorkspace::dir_for(name),
      kind,
    });
  }
  config
}

/// In-memory registry backend keyed by registry URL
#[derive(Default)]
pub struct FakeRegistry {
  /// registry url → package name → versions present
  published: RefCell<BTreeMap<String, BTreeMap<String, Vec<String>>>>,
  /// registry url → package name → resolvable version (source-of-truth data)
  sources: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
  /// tarball path → (name, version) handed out by fetch_tarball
  fetched: RefCell<BTreeMap<PathBuf, (String, String)>>,
  /// every successful write: (registry url, name, version)
  pub publish_log: RefCell<Vec<(String, String, String)>>,
  /// Make tarball publishes fail
  pub fail_tarball_publish: Cell<bool>,
}

impl FakeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Pre-seed a version as already present at a registry
  pub fn seed_published(&self, registry_url: &str, name: &str, version: &str) {
    self
      .published
      .borrow_mut()
      .entry(registry_url.to_string())
      .or_default()
      .entry(name.to_string())
      .or_default()
      .push(version.to_string());
  }

  /// Make a spec resolvable at a source registry without marking it published
  pub fn seed_source(&self, registry_url: &str, name: &str, version: &str) {
    self
      .sources
      .borrow_mut()
      .entry(registry_url.to_string())
      .or_default()
      .insert(name.to_string(), version.to_string());
  }

  pub fn has(&self, registry_url: &str, name: &str, version: &str) -> bool {
    self
      .published
      .borrow()
      .get(registry_url)
      .and_then(|packages| packages.get(name))
      .is_some_and(|versions| versions.iter().any(|v| v == version))
  }

  /// All versions of a name at a registry, any order
  pub fn versions_of(&self, registry_url: &str, name: &str) -> Vec<String> {
    self
      .published
      .borrow()
      .get(registry_url)
      .and_then(|packages| packages.get(name))
      .cloned()
      .unwrap_or_default()
  }

  /// Split "name" / "name@range" (scoped names keep their leading @)
  fn spec_name(spec: &str) -> &str {
    match spec[1..].find('@') {
      Some(idx) => &spec[..idx + 1],
      None => spec,
    }
  }
}

impl RegistryClient for FakeRegistry {
  fn lookup(&self, name: &str, version: &str, registry: &RegistryEndpoint) -> ConvoyResult<bool> {
    Ok(self.has(&registry.url, name, version))
  }

  fn fetch_metadata(&self, name: &str, registry: &RegistryEndpoint) -> ConvoyResult<String> {
    let versions = self.versions_of(&registry.url, name);
    let entries: Vec<String> = versions.iter().map(|v| format!("\"{}\": {{}}", v)).collect();
    Ok(format!("{{\"name\": \"{}\", \"versions\": {{{}}}}}", name, entries.join(", ")))
  }

  fn resolve_spec(&self, spec: &str, registry: &RegistryEndpoint) -> ConvoyResult<Option<(String, String)>> {
    let name = Self::spec_name(spec);

    if let Some(version) = self.sources.borrow().get(&registry.url).and_then(|m| m.get(name)) {
      return Ok(Some((name.to_string(), version.clone())));
    }

    let versions = self.versions_of(&registry.url, name);
    Ok(versions.last().map(|v| (name.to_string(), v.clone())))
  }

  fn fetch_tarball(
    &self,
    name: &str,
    version: &str,
    _registry: &RegistryEndpoint,
    dest_dir: &Path,
  ) -> ConvoyResult<PathBuf> {
    let filename = format!("{}-{}.tgz", name.trim_start_matches('@').replace('/', "-"), version);
    let path = dest_dir.join(filename);
    std::fs::write(&path, b"fake tarball")?;
    self
      .fetched
      .borrow_mut()
      .insert(path.clone(), (name.to_string(), version.to_string()));
    Ok(path)
  }

  fn publish_dir(&self, dir: &Path, registry: &RegistryEndpoint, _dist_tag: &str) -> ConvoyResult<()> {
    let manifest = convoy::core::manifest::PackageManifest::load(dir)?;
    let name = manifest.name()?.to_string();
    let version = manifest.version()?.to_string();
    self.seed_published(&registry.url, &name, &version);
    self
      .publish_log
      .borrow_mut()
      .push((registry.url.clone(), name, version));
    Ok(())
  }

  fn publish_tarball(&self, tarball: &Path, registry: &RegistryEndpoint, _dist_tag: &str) -> ConvoyResult<()> {
    if self.fail_tarball_publish.get() {
      return Err(ConvoyError::message("simulated tarball publish failure"));
    }
    let (name, version) = self
      .fetched
      .borrow()
      .get(tarball)
      .cloned()
      .ok_or_else(|| ConvoyError::message(format!("Unknown tarball {}", tarball.display())))?;
    self.seed_published(&registry.url, &name, &version);
    self
      .publish_log
      .borrow_mut()
      .push((registry.url.clone(), name, version));
    Ok(())
  }
}

/// Build/pack fakes; packing produces a real gzip archive via system tar so
/// the auditor's extraction path is exercised end to end
#[derive(Default)]
pub struct FakeTools {
  pub built: RefCell<Vec<String>>,
  pub bundled: RefCell<Vec<String>>,
  /// Package name whose build fails
  pub fail_build: Option<String>,
  pub fail_bundle: bool,
  /// Simulate a packaging tool chain that drops the dependencies field
  pub drop_dependencies_on_pack: bool,
}

impl FakeTools {
  pub fn new() -> Self {
    Self::default()
  }
}

impl PackageTools for FakeTools {
  fn build(&self, name: &str, _dir: &Path) -> ConvoyResult<()> {
    if self.fail_build.as_deref() == Some(name) {
      return Err(ConvoyError::Build {
        name: name.to_string(),
        detail: "simulated build failure".to_string(),
      });
    }
    self.built.borrow_mut().push(name.to_string());
    Ok(())
  }

  fn bundle_sandbox(&self, name: &str, _dir: &Path) -> ConvoyResult<()> {
    if self.fail_bundle {
      return Err(ConvoyError::Build {
        name: name.to_string(),
        detail: "simulated bundling failure".to_string(),
      });
    }
    self.bundled.borrow_mut().push(name.to_string());
    Ok(())
  }

  fn pack(&self, dir: &Path, dest_dir: &Path) -> ConvoyResult<PathBuf> {
    let mut manifest_text = std::fs::read_to_string(dir.join("package.json"))?;

    if self.drop_dependencies_on_pack {
      let mut value: serde_json::Value = serde_json::from_str(&manifest_text)?;
      if let Some(obj) = value.as_object_mut() {
        obj.remove("dependencies");
      }
      manifest_text = serde_json::to_string_pretty(&value)?;
    }

    let staging = tempfile::tempdir_in(dest_dir)?;
    let payload = staging.path().join("package");
    std::fs::create_dir_all(&payload)?;
    std::fs::write(payload.join("package.json"), manifest_text)?;

    let tarball = dest_dir.join("packed.tgz");
    let status = Command::new("tar")
      .arg("-czf")
      .arg(&tarball)
      .arg("-C")
      .arg(staging.path())
      .arg("package")
      .status()?;
    if !status.success() {
      return Err(ConvoyError::message("tar failed in test pack"));
    }

    Ok(tarball)
  }
}
