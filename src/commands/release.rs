//! Release command implementation
//!
//! Plan-by-default: without `--apply` the full decision sequence runs with
//! every mutating operation gated off, so the allocation, mirroring, and
//! pinning decisions can be reviewed before anything is written.

use crate::core::config::ConvoyConfig;
use crate::core::error::ConvoyResult;
use crate::core::run::ReleaseRun;
use crate::registry::client::{NoopWrites, NpmCli, RegistryClient};
use crate::registry::endpoint::EndpointPair;
use crate::registry::visibility::PollSettings;
use crate::release::plan::ReleasePlan;
use crate::release::tools::NpmTools;
use crate::release::ReleaseEngine;
use std::env;

/// Run the release pipeline
pub fn run_release(
  suffix: Option<String>,
  tag: String,
  apply: bool,
  timeout_secs: u64,
  json: bool,
) -> ConvoyResult<()> {
  let workspace_root = env::current_dir()?;
  let config = ConvoyConfig::load(&workspace_root)?;
  let endpoints = EndpointPair::resolve(&config.registry)?;

  let suffix = suffix.unwrap_or_else(ReleaseRun::default_suffix);
  let run = ReleaseRun::new(suffix, tag, !apply);

  let mut plan = ReleasePlan::build(&workspace_root, &config, &run)?;
  if !json {
    println!("{}", plan.to_human_readable());
  }

  // Write-gating strategy is selected once here, not re-checked per call site
  let npm = NpmCli;
  let gated;
  let registry: &dyn RegistryClient = if run.dry_run {
    gated = NoopWrites::new(&npm).with_quiet(json);
    &gated
  } else {
    &npm
  };
  let tools = NpmTools;

  let mut engine = ReleaseEngine::new(&run, &endpoints, registry, &tools)
    .with_poll(PollSettings::with_timeout_secs(timeout_secs))
    .with_quiet(json);

  let mirror_specs: Vec<String> = config.mirrors.iter().map(|m| m.spec.clone()).collect();
  let mut mirror_outcomes = Vec::new();
  if !mirror_specs.is_empty() {
    if !json {
      println!("🔄 Mirroring {} auxiliary package(s)", mirror_specs.len());
    }
    mirror_outcomes = engine.mirror_auxiliaries(&mirror_specs, &config.mirror.source);
    if !json {
      println!();
    }
  }

  let outcome = engine.execute(&mut plan)?;

  // Machine-readable mode emits exactly one JSON document on stdout
  if json {
    let report = serde_json::json!({
      "plan": plan,
      "mirrors": mirror_outcomes,
      "outcome": outcome,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    return Ok(());
  }

  println!();
  if run.dry_run {
    println!("🔍 Dry-run complete. Re-run with --apply to publish.");
  } else {
    println!("✅ Release {} complete (tag: {})", plan.run_id, run.dist_tag);
  }

  if !outcome.pins.is_empty() {
    println!();
    println!("   Pinned set:");
    for (name, version) in outcome.pins.iter() {
      println!("   {} = {}", name, version);
    }
  }

  if !outcome.warnings.is_empty() {
    println!();
    for warning in &outcome.warnings {
      println!("⚠️  {}", warning);
    }
  }

  Ok(())
}
