//! Structured read-modify-write for package manifests
//!
//! Manifests are always edited as parsed documents, never as raw text. The
//! full JSON object is retained so fields convoy does not model survive a
//! rewrite untouched.

use crate::core::error::{ConvoyError, ConvoyResult, ResultExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "package.json";

/// A package manifest (package.json) held as a full JSON document
#[derive(Debug, Clone)]
pub struct PackageManifest {
  doc: Map<String, Value>,
  path: Option<PathBuf>,
}

impl PackageManifest {
  /// Load the manifest from a package directory
  pub fn load(dir: &Path) -> ConvoyResult<Self> {
    let path = dir.join(MANIFEST_FILE);
    let content =
      fs::read_to_string(&path).with_context(|| format!("Failed to read manifest from {}", path.display()))?;
    let mut manifest = Self::parse(&content)?;
    manifest.path = Some(path);
    Ok(manifest)
  }

  /// Parse a manifest from JSON text
  pub fn parse(content: &str) -> ConvoyResult<Self> {
    let value: Value = serde_json::from_str(content).context("Failed to parse package manifest")?;
    let doc = match value {
      Value::Object(map) => map,
      _ => return Err(ConvoyError::message("Package manifest is not a JSON object")),
    };
    Ok(Self { doc, path: None })
  }

  /// Package name
  pub fn name(&self) -> ConvoyResult<&str> {
    self
      .doc
      .get("name")
      .and_then(Value::as_str)
      .ok_or_else(|| ConvoyError::message("Package manifest has no 'name' field"))
  }

  /// Declared version string, verbatim
  pub fn version(&self) -> ConvoyResult<&str> {
    self
      .doc
      .get("version")
      .and_then(Value::as_str)
      .ok_or_else(|| ConvoyError::message("Package manifest has no 'version' field"))
  }

  /// Overwrite the version field
  pub fn set_version(&mut self, version: &str) {
    self.doc.insert("version".to_string(), Value::String(version.to_string()));
  }

  /// Declared dependencies as an ordered name → constraint map
  ///
  /// Absent or non-object `dependencies` reads as empty.
  pub fn dependencies(&self) -> BTreeMap<String, String> {
    let mut deps = BTreeMap::new();
    if let Some(Value::Object(map)) = self.doc.get("dependencies") {
      for (name, constraint) in map {
        if let Some(constraint) = constraint.as_str() {
          deps.insert(name.clone(), constraint.to_string());
        }
      }
    }
    deps
  }

  /// Constraint declared for one dependency, if present
  pub fn dependency(&self, name: &str) -> Option<&str> {
    self
      .doc
      .get("dependencies")
      .and_then(|deps| deps.get(name))
      .and_then(Value::as_str)
  }

  /// Overwrite (or insert) a dependency entry with an exact version
  pub fn set_dependency(&mut self, name: &str, version: &str) {
    let deps = self
      .doc
      .entry("dependencies".to_string())
      .or_insert_with(|| Value::Object(Map::new()));
    if let Value::Object(map) = deps {
      map.insert(name.to_string(), Value::String(version.to_string()));
    }
  }

  /// Write the manifest back to where it was loaded from
  pub fn save(&self) -> ConvoyResult<()> {
    let path = self
      .path
      .as_ref()
      .ok_or_else(|| ConvoyError::message("Manifest has no backing file to save to"))?;
    let content = self.to_pretty_json()?;
    fs::write(path, content).with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
  }

  /// Render as pretty-printed JSON with a trailing newline
  pub fn to_pretty_json(&self) -> ConvoyResult<String> {
    let mut content = serde_json::to_string_pretty(&Value::Object(self.doc.clone()))?;
    content.push('\n');
    Ok(content)
  }
}
