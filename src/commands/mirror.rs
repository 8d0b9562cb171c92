//! Mirror command implementation
//!
//! Runs only the auxiliary-dependency mirroring stage. Safe to repeat:
//! versions already at the destination are skipped.

use crate::core::config::ConvoyConfig;
use crate::core::error::ConvoyResult;
use crate::core::run::ReleaseRun;
use crate::registry::client::{NoopWrites, NpmCli, RegistryClient};
use crate::registry::endpoint::EndpointPair;
use crate::release::tools::NpmTools;
use crate::release::ReleaseEngine;
use std::env;

/// Run the mirror stage on its own
pub fn run_mirror(tag: String, apply: bool, json: bool) -> ConvoyResult<()> {
  let workspace_root = env::current_dir()?;
  let config = ConvoyConfig::load(&workspace_root)?;
  let endpoints = EndpointPair::resolve(&config.registry)?;

  if config.mirrors.is_empty() {
    if json {
      println!("[]");
    } else {
      println!("⚠️  No [[mirrors]] configured in convoy.toml");
    }
    return Ok(());
  }

  let run = ReleaseRun::new(ReleaseRun::default_suffix(), tag, !apply);

  let npm = NpmCli;
  let gated;
  let registry: &dyn RegistryClient = if run.dry_run {
    gated = NoopWrites::new(&npm).with_quiet(json);
    &gated
  } else {
    &npm
  };
  let tools = NpmTools;

  let mut engine = ReleaseEngine::new(&run, &endpoints, registry, &tools).with_quiet(json);
  let specs: Vec<String> = config.mirrors.iter().map(|m| m.spec.clone()).collect();
  let outcomes = engine.mirror_auxiliaries(&specs, &config.mirror.source);

  if json {
    println!("{}", serde_json::to_string_pretty(&outcomes)?);
  } else if run.dry_run {
    println!();
    println!("🔍 Dry-run complete. Re-run with --apply to publish missing mirrors.");
  }

  Ok(())
}
