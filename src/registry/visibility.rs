//! Cross-registry visibility polling
//!
//! A publish is accepted by the write path before the read path reliably
//! reports it, especially behind aggregating layers. The verifier polls the
//! install endpoint until the version shows up or the bound elapses. Timeout
//! is reported as `false`, never as an error: the authoritative write already
//! succeeded and read-side propagation delay is operational, not correctness.

use crate::core::error::ConvoyResult;
use crate::registry::client::RegistryClient;
use crate::registry::endpoint::RegistryEndpoint;
use crate::ui::progress::PollProgress;
use std::time::{Duration, Instant};

/// Polling bounds for one visibility check
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
  pub interval: Duration,
  pub timeout: Duration,
}

impl Default for PollSettings {
  fn default() -> Self {
    Self {
      interval: Duration::from_secs(3),
      timeout: Duration::from_secs(60),
    }
  }
}

impl PollSettings {
  pub fn with_timeout_secs(timeout_secs: u64) -> Self {
    Self {
      timeout: Duration::from_secs(timeout_secs),
      ..Self::default()
    }
  }
}

/// Poll the install endpoint until `name@version` is visible or the timeout
/// elapses
///
/// Two read strategies per round:
/// 1. structured lookup (`npm view`-style)
/// 2. raw metadata fetch, scanning for the literal version string - the
///    fallback for read layers whose structured index lags the document
///
/// Individual round failures count as "not yet visible" and polling
/// continues.
pub fn await_visible(
  client: &dyn RegistryClient,
  name: &str,
  version: &str,
  registry: &RegistryEndpoint,
  settings: PollSettings,
) -> ConvoyResult<bool> {
  let deadline = Instant::now() + settings.timeout;
  let total_rounds = (settings.timeout.as_secs() / settings.interval.as_secs().max(1)).max(1) as usize;
  let mut progress = PollProgress::new(total_rounds, format!("Awaiting {}@{}", name, version));

  loop {
    if check_once(client, name, version, registry) {
      progress.finish();
      return Ok(true);
    }

    progress.inc();

    if Instant::now() + settings.interval > deadline {
      return Ok(false);
    }
    std::thread::sleep(settings.interval);
  }
}

/// One polling round: structured lookup, then raw-metadata fallback
fn check_once(client: &dyn RegistryClient, name: &str, version: &str, registry: &RegistryEndpoint) -> bool {
  if let Ok(true) = client.lookup(name, version, registry) {
    return true;
  }

  match client.fetch_metadata(name, registry) {
    Ok(document) => document.contains(&format!("\"{}\"", version)),
    Err(_) => false,
  }
}
