//! Init command implementation

use crate::core::config::ConvoyConfig;
use crate::core::error::ConvoyResult;
use std::env;

/// Write a starter convoy.toml in the current directory
pub fn run_init() -> ConvoyResult<()> {
  let workspace_root = env::current_dir()?;

  if ConvoyConfig::exists(&workspace_root) {
    println!("⚠️  convoy.toml already exists; leaving it untouched");
    return Ok(());
  }

  let config = ConvoyConfig::new("http://localhost:4873");
  config.save(&workspace_root)?;

  println!("✅ Created convoy.toml");
  println!();
  println!("Next steps:");
  println!("  1. Point [registry] at your deployment (mode = \"single\" or \"two-tier\")");
  println!("  2. Add [[packages]] entries in release order (libraries, runtime, consumer)");
  println!("  3. Add [[mirrors]] for auxiliary dependencies, if any");
  println!("  4. Review with 'convoy release', then run 'convoy release --apply'");

  Ok(())
}
