//! Registry backend via system npm - zero protocol dependencies
//!
//! All registry reads and writes go through the npm CLI, the same way the
//! package authors themselves interact with their registries. Subprocesses
//! run with an isolated environment (PATH and HOME only, notifier and audit
//! chatter disabled).

use crate::core::error::{ConvoyResult, RegistryError, ResultExt};
use crate::registry::endpoint::RegistryEndpoint;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Read/write operations against a package registry
///
/// The trait seam exists so the pipeline can run against in-memory fakes in
/// tests and so dry-run can swap in a write-gated implementation.
pub trait RegistryClient {
  /// Structured lookup: is `name@version` present at the registry?
  ///
  /// Lookup failures read as "absent" — the caller decides whether absence
  /// matters (visibility keeps polling, mirroring republishes).
  fn lookup(&self, name: &str, version: &str, registry: &RegistryEndpoint) -> ConvoyResult<bool>;

  /// Raw metadata document for a package, for the fallback visibility path
  fn fetch_metadata(&self, name: &str, registry: &RegistryEndpoint) -> ConvoyResult<String>;

  /// Resolve a spec (name or name@range) to a concrete (name, version)
  fn resolve_spec(&self, spec: &str, registry: &RegistryEndpoint) -> ConvoyResult<Option<(String, String)>>;

  /// Download the packaged archive for `name@version` into `dest_dir`
  fn fetch_tarball(
    &self,
    name: &str,
    version: &str,
    registry: &RegistryEndpoint,
    dest_dir: &Path,
  ) -> ConvoyResult<PathBuf>;

  /// Publish a package directory under a dist-tag
  fn publish_dir(&self, dir: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()>;

  /// Publish an existing tarball byte-identically under a dist-tag
  fn publish_tarball(&self, tarball: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()>;
}

/// Registry client shelling out to the system npm CLI
pub struct NpmCli;

impl NpmCli {
  /// Create a safe npm command with isolated environment
  ///
  /// - Clears environment variables, whitelists only PATH and HOME
  /// - Disables update notifier, audit, and funding chatter
  fn npm_cmd(&self, registry: &RegistryEndpoint) -> Command {
    let mut cmd = Command::new("npm");
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.env("npm_config_update_notifier", "false");
    cmd.env("npm_config_audit", "false");
    cmd.env("npm_config_fund", "false");
    cmd.env("NO_COLOR", "1");
    cmd.arg("--registry").arg(&registry.url);
    if let Some(token) = &registry.credential {
      cmd.arg(format!("--//{}/:_authToken={}", registry.host_path(), token));
    }
    cmd
  }

  fn command_failed(command: impl Into<String>, stderr: &[u8]) -> RegistryError {
    RegistryError::CommandFailed {
      command: command.into(),
      stderr: String::from_utf8_lossy(stderr).to_string(),
    }
  }
}

impl RegistryClient for NpmCli {
  fn lookup(&self, name: &str, version: &str, registry: &RegistryEndpoint) -> ConvoyResult<bool> {
    let spec = format!("{}@{}", name, version);
    let output = self
      .npm_cmd(registry)
      .args(["view", &spec, "version", "--json"])
      .output()
      .with_context(|| format!("Failed to execute npm view {}", spec))?;

    // npm exits non-zero for unknown versions (E404); anything the registry
    // does not affirmatively report counts as absent
    Ok(output.status.success() && !String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  fn fetch_metadata(&self, name: &str, registry: &RegistryEndpoint) -> ConvoyResult<String> {
    // Raw document fetch, bypassing npm's own index handling. Aggregating
    // registries have been seen to serve stale structured lookups while the
    // raw packument already lists the version.
    let url = format!("{}/{}", registry.url.trim_end_matches('/'), name.replace('/', "%2f"));
    let output = Command::new("curl")
      .args(["-fsSL", "--max-time", "15", &url])
      .output()
      .with_context(|| format!("Failed to execute curl {}", url))?;

    if !output.status.success() {
      return Err(crate::core::error::ConvoyError::Registry(Self::command_failed(
        format!("curl {}", url),
        &output.stderr,
      )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }

  fn resolve_spec(&self, spec: &str, registry: &RegistryEndpoint) -> ConvoyResult<Option<(String, String)>> {
    let output = self
      .npm_cmd(registry)
      .args(["view", spec, "name", "version", "--json"])
      .output()
      .with_context(|| format!("Failed to execute npm view {}", spec))?;

    if !output.status.success() {
      return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let value: serde_json::Value = match serde_json::from_str(stdout.trim()) {
      Ok(v) => v,
      Err(_) => return Ok(None),
    };

    // A range matching several versions yields an array; the last entry is
    // the highest satisfying version
    let object = match &value {
      serde_json::Value::Array(items) => items.last().cloned(),
      serde_json::Value::Object(_) => Some(value.clone()),
      _ => None,
    };

    Ok(object.and_then(|obj| {
      let name = obj.get("name")?.as_str()?.to_string();
      let version = obj.get("version")?.as_str()?.to_string();
      Some((name, version))
    }))
  }

  fn fetch_tarball(
    &self,
    name: &str,
    version: &str,
    registry: &RegistryEndpoint,
    dest_dir: &Path,
  ) -> ConvoyResult<PathBuf> {
    let spec = format!("{}@{}", name, version);
    let output = self
      .npm_cmd(registry)
      .args(["pack", &spec, "--pack-destination"])
      .arg(dest_dir)
      .output()
      .with_context(|| format!("Failed to execute npm pack {}", spec))?;

    if !output.status.success() {
      return Err(crate::core::error::ConvoyError::Registry(Self::command_failed(
        format!("npm pack {}", spec),
        &output.stderr,
      )));
    }

    // npm pack prints the produced filename on the last stdout line
    let stdout = String::from_utf8_lossy(&output.stdout);
    let filename = stdout
      .lines()
      .filter(|l| !l.trim().is_empty())
      .next_back()
      .ok_or_else(|| crate::core::error::ConvoyError::message(format!("npm pack {} produced no output", spec)))?;

    Ok(dest_dir.join(filename.trim()))
  }

  fn publish_dir(&self, dir: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()> {
    let output = self
      .npm_cmd(registry)
      .current_dir(dir)
      .args(["publish", "--tag", dist_tag])
      .output()
      .with_context(|| format!("Failed to execute npm publish in {}", dir.display()))?;

    if !output.status.success() {
      let manifest = crate::core::manifest::PackageManifest::load(dir);
      let (name, version) = match &manifest {
        Ok(m) => (
          m.name().unwrap_or("<unknown>").to_string(),
          m.version().unwrap_or("<unknown>").to_string(),
        ),
        Err(_) => ("<unknown>".to_string(), "<unknown>".to_string()),
      };
      return Err(crate::core::error::ConvoyError::Registry(RegistryError::PublishFailed {
        name,
        version,
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(())
  }

  fn publish_tarball(&self, tarball: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()> {
    let output = self
      .npm_cmd(registry)
      .args(["publish", "--tag", dist_tag])
      .arg(tarball)
      .output()
      .with_context(|| format!("Failed to execute npm publish {}", tarball.display()))?;

    if !output.status.success() {
      return Err(crate::core::error::ConvoyError::Registry(RegistryError::PublishFailed {
        name: tarball.display().to_string(),
        version: String::new(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(())
  }
}

/// Write-gated client for dry runs
///
/// Selected once at startup instead of checking a dry-run flag at every call
/// site: reads delegate to the inner client so the full decision sequence
/// still executes, writes print what they would have done and succeed.
pub struct NoopWrites<'a> {
  inner: &'a dyn RegistryClient,
  quiet: bool,
}

impl<'a> NoopWrites<'a> {
  pub fn new(inner: &'a dyn RegistryClient) -> Self {
    Self { inner, quiet: false }
  }

  /// Suppress the would-publish lines (machine-readable output modes)
  pub fn with_quiet(mut self, quiet: bool) -> Self {
    self.quiet = quiet;
    self
  }
}

impl RegistryClient for NoopWrites<'_> {
  fn lookup(&self, name: &str, version: &str, registry: &RegistryEndpoint) -> ConvoyResult<bool> {
    self.inner.lookup(name, version, registry)
  }

  fn fetch_metadata(&self, name: &str, registry: &RegistryEndpoint) -> ConvoyResult<String> {
    self.inner.fetch_metadata(name, registry)
  }

  fn resolve_spec(&self, spec: &str, registry: &RegistryEndpoint) -> ConvoyResult<Option<(String, String)>> {
    self.inner.resolve_spec(spec, registry)
  }

  fn fetch_tarball(
    &self,
    name: &str,
    version: &str,
    registry: &RegistryEndpoint,
    dest_dir: &Path,
  ) -> ConvoyResult<PathBuf> {
    self.inner.fetch_tarball(name, version, registry, dest_dir)
  }

  fn publish_dir(&self, dir: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()> {
    if !self.quiet {
      println!(
        "🔍 [dry-run] Would publish {} to {} (tag: {})",
        dir.display(),
        registry.url,
        dist_tag
      );
    }
    Ok(())
  }

  fn publish_tarball(&self, tarball: &Path, registry: &RegistryEndpoint, dist_tag: &str) -> ConvoyResult<()> {
    if !self.quiet {
      println!(
        "🔍 [dry-run] Would publish {} to {} (tag: {})",
        tarball.display(),
        registry.url,
        dist_tag
      );
    }
    Ok(())
  }
}
