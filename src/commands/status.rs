//! Status command implementation

use crate::core::config::{ConvoyConfig, PackageKind};
use crate::core::error::ConvoyResult;
use crate::core::manifest::PackageManifest;
use crate::registry::endpoint::EndpointPair;
use std::env;

/// Show configured packages, their base versions, and the resolved endpoints
pub fn run_status(json: bool) -> ConvoyResult<()> {
  let workspace_root = env::current_dir()?;
  let config = ConvoyConfig::load(&workspace_root)?;
  let endpoints = EndpointPair::resolve(&config.registry)?;

  let mut rows = Vec::new();
  for pkg in &config.packages {
    let version = PackageManifest::load(&workspace_root.join(&pkg.dir))
      .and_then(|m| m.version().map(str::to_string))
      .unwrap_or_else(|_| "<unreadable>".to_string());
    rows.push((pkg.name.clone(), pkg.kind, version));
  }

  if json {
    let value = serde_json::json!({
      "install_registry": endpoints.install.url,
      "publish_registry": endpoints.publish.url,
      "packages": rows.iter().map(|(name, kind, version)| {
        serde_json::json!({ "name": name, "kind": kind, "version": version })
      }).collect::<Vec<_>>(),
      "mirrors": config.mirrors.iter().map(|m| m.spec.clone()).collect::<Vec<_>>(),
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    return Ok(());
  }

  println!("📦 convoy status");
  println!();
  println!("   Install registry: {}", endpoints.install.url);
  println!("   Publish registry: {}", endpoints.publish.url);
  println!();

  if rows.is_empty() {
    println!("⚠️  No packages configured in convoy.toml");
    return Ok(());
  }

  for (name, kind, version) in &rows {
    let kind = match kind {
      PackageKind::Library => "library ",
      PackageKind::Runtime => "runtime ",
      PackageKind::Consumer => "consumer",
    };
    println!("   [{}] {} @ {}", kind, name, version);
  }

  if !config.mirrors.is_empty() {
    println!();
    println!("   Mirrored auxiliaries:");
    for mirror in &config.mirrors {
      println!("   - {}", mirror.spec);
    }
  }

  Ok(())
}
