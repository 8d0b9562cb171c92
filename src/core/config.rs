#![allow(dead_code)]

use crate::core::error::{ConfigError, ConvoyError, ConvoyResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for convoy
/// Searched in order: convoy.toml, .convoy.toml, .config/convoy.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvoyConfig {
  pub registry: RegistryConfig,
  #[serde(default)]
  pub packages: Vec<PackageConfig>,
  #[serde(default)]
  pub mirrors: Vec<MirrorConfig>,
  #[serde(default)]
  pub mirror: MirrorSourceConfig,
}

/// Registry topology for one deployment
///
/// Two mutually exclusive modes, selected by `mode`:
///
/// - `single`: one self-hosted registry serves both reads and writes.
///   Requires `url`.
/// - `two-tier`: reads go through an aggregating/virtual endpoint, writes go
///   directly to the authoritative local endpoint. Requires `install_url`
///   and `publish_url`.
///
/// Even in single mode the install and publish endpoints stay logically
/// distinct values downstream; the pipeline never substitutes one role for
/// the other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
  pub mode: RegistryMode,

  /// Single mode: the one registry URL
  #[serde(default)]
  pub url: Option<String>,

  /// Two-tier mode: aggregating read endpoint (may cascade to public upstreams)
  #[serde(default)]
  pub install_url: Option<String>,

  /// Two-tier mode: authoritative local write endpoint
  #[serde(default)]
  pub publish_url: Option<String>,

  /// Auth token applied to publishes (optional)
  #[serde(default)]
  pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistryMode {
  Single,
  TwoTier,
}

/// Role of a first-party package inside the release plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
  /// Independent library, no dependencies on other first-party packages
  #[default]
  Library,
  /// Runtime-support package; depends on the libraries and gets the extra
  /// sandbox-bundle step
  Runtime,
  /// The single downstream consumer, released last with the full pin map
  Consumer,
}

/// One first-party package in the curated release order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
  /// Registry name (namespaced, e.g. "@acme/logger")
  pub name: String,

  /// Directory containing the package manifest (relative to workspace root)
  pub dir: PathBuf,

  #[serde(default)]
  pub kind: PackageKind,
}

/// An auxiliary dependency to mirror into the publish registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
  /// Package spec resolved against the source registries (name or name@range)
  pub spec: String,
}

/// Where mirror resolution looks first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorSourceConfig {
  /// Public source-of-truth registry, consulted before the install endpoint
  #[serde(default = "default_mirror_source")]
  pub source: String,
}

fn default_mirror_source() -> String {
  "https://registry.npmjs.org".to_string()
}

impl Default for MirrorSourceConfig {
  fn default() -> Self {
    Self {
      source: default_mirror_source(),
    }
  }
}

impl RegistryConfig {
  /// Validate that the fields required by the selected mode are present
  pub fn validate(&self) -> ConvoyResult<()> {
    match self.mode {
      RegistryMode::Single => {
        if self.url.is_none() {
          return Err(ConvoyError::Config(ConfigError::MissingField {
            field: "registry.url (required for mode = \"single\")".to_string(),
          }));
        }
      }
      RegistryMode::TwoTier => {
        if self.install_url.is_none() {
          return Err(ConvoyError::Config(ConfigError::MissingField {
            field: "registry.install_url (required for mode = \"two-tier\")".to_string(),
          }));
        }
        if self.publish_url.is_none() {
          return Err(ConvoyError::Config(ConfigError::MissingField {
            field: "registry.publish_url (required for mode = \"two-tier\")".to_string(),
          }));
        }
      }
    }
    Ok(())
  }
}

impl ConvoyConfig {
  /// Find config file in search order: convoy.toml, .convoy.toml, .config/convoy.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("convoy.toml"),
      path.join(".convoy.toml"),
      path.join(".config").join("convoy.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from convoy.toml (searches multiple locations)
  pub fn load(path: &Path) -> ConvoyResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      ConvoyError::Config(ConfigError::NotFound {
        workspace_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: ConvoyConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Save config to convoy.toml (default location)
  pub fn save(&self, path: &Path) -> ConvoyResult<()> {
    let config_path = path.join("convoy.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content).with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }

  /// Check if config exists at the given path
  pub fn exists(path: &Path) -> bool {
    Self::find_config_path(path).is_some()
  }

  /// Validate the whole configuration (registry mode + package set shape)
  pub fn validate(&self) -> ConvoyResult<()> {
    self.registry.validate()?;

    // Each name is released at most once per run; catch duplicates before
    // anything is built or published
    let mut seen = std::collections::BTreeSet::new();
    for pkg in &self.packages {
      if !seen.insert(pkg.name.as_str()) {
        return Err(ConvoyError::with_help(
          format!("Package '{}' is configured more than once", pkg.name),
          "Each [[packages]] entry must have a unique name",
        ));
      }
    }

    let consumers = self.packages.iter().filter(|p| p.kind == PackageKind::Consumer).count();
    if !self.packages.is_empty() && consumers != 1 {
      return Err(ConvoyError::with_help(
        format!("Release set must have exactly one consumer package (found {})", consumers),
        "Mark exactly one [[packages]] entry with kind = \"consumer\"",
      ));
    }

    let runtimes = self.packages.iter().filter(|p| p.kind == PackageKind::Runtime).count();
    if runtimes > 1 {
      return Err(ConvoyError::with_help(
        format!("Release set may have at most one runtime package (found {})", runtimes),
        "Mark at most one [[packages]] entry with kind = \"runtime\"",
      ));
    }

    Ok(())
  }

  /// Find a configured package by name
  pub fn find_package(&self, name: &str) -> Option<&PackageConfig> {
    self.packages.iter().find(|p| p.name == name)
  }

  /// Create a new empty config (single-mode placeholder registry)
  pub fn new(registry_url: impl Into<String>) -> Self {
    Self {
      registry: RegistryConfig {
        mode: RegistryMode::Single,
        url: Some(registry_url.into()),
        install_url: None,
        publish_url: None,
        token: None,
      },
      packages: Vec::new(),
      mirrors: Vec::new(),
      mirror: MirrorSourceConfig::default(),
    }
  }
}
