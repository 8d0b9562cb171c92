//! Registry role resolution
//!
//! A run always carries two endpoints: the Install endpoint (read path,
//! possibly an aggregating layer that cascades to public upstreams) and the
//! Publish endpoint (authoritative write path). They are resolved once from
//! config and never substituted for one another, even when both point at the
//! same backend.

use crate::core::config::{RegistryConfig, RegistryMode};
use crate::core::error::{ConfigError, ConvoyError, ConvoyResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryRole {
  Install,
  Publish,
}

/// One registry endpoint with its role and optional credential
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEndpoint {
  pub role: RegistryRole,
  pub url: String,
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub credential: Option<String>,
}

impl RegistryEndpoint {
  pub fn new(role: RegistryRole, url: impl Into<String>, credential: Option<String>) -> Self {
    Self {
      role,
      url: url.into(),
      credential,
    }
  }

  /// Host portion of the URL, scheme stripped, for npm auth-token scoping
  pub fn host_path(&self) -> &str {
    self
      .url
      .strip_prefix("https://")
      .or_else(|| self.url.strip_prefix("http://"))
      .unwrap_or(&self.url)
      .trim_end_matches('/')
  }
}

/// The per-run (install, publish) endpoint pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointPair {
  pub install: RegistryEndpoint,
  pub publish: RegistryEndpoint,
}

impl EndpointPair {
  /// Resolve both roles from the configured mode
  ///
  /// Single mode yields two independent endpoint values backed by the same
  /// URL. Two-tier mode routes reads through the aggregating endpoint and
  /// writes to the authoritative one.
  pub fn resolve(config: &RegistryConfig) -> ConvoyResult<Self> {
    config.validate()?;

    match config.mode {
      RegistryMode::Single => {
        let url = config.url.as_ref().ok_or_else(|| {
          ConvoyError::Config(ConfigError::MissingField {
            field: "registry.url".to_string(),
          })
        })?;
        Ok(Self {
          install: RegistryEndpoint::new(RegistryRole::Install, url, config.token.clone()),
          publish: RegistryEndpoint::new(RegistryRole::Publish, url, config.token.clone()),
        })
      }
      RegistryMode::TwoTier => {
        let install_url = config.install_url.as_ref().ok_or_else(|| {
          ConvoyError::Config(ConfigError::MissingField {
            field: "registry.install_url".to_string(),
          })
        })?;
        let publish_url = config.publish_url.as_ref().ok_or_else(|| {
          ConvoyError::Config(ConfigError::MissingField {
            field: "registry.publish_url".to_string(),
          })
        })?;
        Ok(Self {
          install: RegistryEndpoint::new(RegistryRole::Install, install_url, config.token.clone()),
          publish: RegistryEndpoint::new(RegistryRole::Publish, publish_url, config.token.clone()),
        })
      }
    }
  }
}
