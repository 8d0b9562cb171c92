//! External build and packaging collaborators
//!
//! Building and packing are external tool invocations; the pipeline only
//! needs pass/fail and archive paths. The default implementation shells out
//! to npm with the same isolated-subprocess discipline as the registry
//! client.

use crate::core::error::{ConvoyError, ConvoyResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Build and packaging seam for first-party packages
pub trait PackageTools {
  /// Run the package's external build step
  fn build(&self, name: &str, dir: &Path) -> ConvoyResult<()>;

  /// Bundle the runtime package's embedded sandbox libraries
  ///
  /// Best-effort: the engine logs and continues when this fails.
  fn bundle_sandbox(&self, name: &str, dir: &Path) -> ConvoyResult<()>;

  /// Produce the distributable archive for a package directory without
  /// publishing it, returning the tarball path
  fn pack(&self, dir: &Path, dest_dir: &Path) -> ConvoyResult<PathBuf>;
}

/// npm-backed build tooling
pub struct NpmTools;

impl NpmTools {
  fn npm_cmd(&self, dir: &Path) -> Command {
    let mut cmd = Command::new("npm");
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.env("npm_config_update_notifier", "false");
    cmd.env("npm_config_fund", "false");
    cmd.env("NO_COLOR", "1");
    cmd.current_dir(dir);
    cmd
  }
}

impl PackageTools for NpmTools {
  fn build(&self, name: &str, dir: &Path) -> ConvoyResult<()> {
    let output = self
      .npm_cmd(dir)
      .args(["run", "build"])
      .output()
      .with_context(|| format!("Failed to execute npm run build for {}", name))?;

    if !output.status.success() {
      return Err(ConvoyError::Build {
        name: name.to_string(),
        detail: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  fn bundle_sandbox(&self, name: &str, dir: &Path) -> ConvoyResult<()> {
    let output = self
      .npm_cmd(dir)
      .args(["run", "--if-present", "bundle-sandbox"])
      .output()
      .with_context(|| format!("Failed to execute npm run bundle-sandbox for {}", name))?;

    if !output.status.success() {
      return Err(ConvoyError::Build {
        name: name.to_string(),
        detail: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  fn pack(&self, dir: &Path, dest_dir: &Path) -> ConvoyResult<PathBuf> {
    let output = self
      .npm_cmd(dir)
      .args(["pack", "--pack-destination"])
      .arg(dest_dir)
      .output()
      .with_context(|| format!("Failed to execute npm pack in {}", dir.display()))?;

    if !output.status.success() {
      return Err(ConvoyError::message(format!(
        "npm pack failed in {}: {}",
        dir.display(),
        String::from_utf8_lossy(&output.stderr).trim()
      )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let filename = stdout
      .lines()
      .filter(|l| !l.trim().is_empty())
      .next_back()
      .ok_or_else(|| ConvoyError::message(format!("npm pack in {} produced no output", dir.display())))?;

    Ok(dest_dir.join(filename.trim()))
  }
}
