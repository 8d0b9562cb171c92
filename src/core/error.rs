//! Error types for convoy with contextual help messages
//!
//! Every fatal error names the offending package (where one exists) and the
//! step that failed. Errors that carry a `help` line print it below the
//! message so the fix is actionable from the terminal.

use std::fmt;
use std::path::PathBuf;

pub type ConvoyResult<T> = Result<T, ConvoyError>;

/// Configuration problems (pre-flight, always fatal)
#[derive(Debug)]
pub enum ConfigError {
  /// No convoy.toml found in any search location
  NotFound { workspace_root: PathBuf },
  /// A field required by the selected registry mode is missing
  MissingField { field: String },
  /// A package referenced on the command line is not configured
  PackageNotFound { name: String },
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { workspace_root } => {
        write!(f, "No convoy.toml found under {}", workspace_root.display())
      }
      ConfigError::MissingField { field } => write!(f, "Missing required config field: {}", field),
      ConfigError::PackageNotFound { name } => write!(f, "Package '{}' not found in convoy.toml", name),
    }
  }
}

/// Registry interaction failures
#[derive(Debug)]
pub enum RegistryError {
  /// An npm subprocess exited non-zero
  CommandFailed { command: String, stderr: String },
  /// The registry rejected a write
  PublishFailed { name: String, version: String, stderr: String },
}

impl fmt::Display for RegistryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegistryError::CommandFailed { command, stderr } => {
        write!(f, "Registry command failed: {}\n{}", command, stderr.trim())
      }
      RegistryError::PublishFailed { name, version, stderr } => {
        write!(f, "Publish of {}@{} rejected by registry\n{}", name, version, stderr.trim())
      }
    }
  }
}

/// Tarball audit failures (pin mismatch in the packaged consumer)
#[derive(Debug)]
pub enum AuditError {
  /// A pinned dependency carries the wrong version inside the archive
  PinMismatch {
    dependency: String,
    expected: String,
    actual: String,
  },
  /// A pinned dependency is absent from the archived manifest
  MissingDependency { dependency: String, expected: String },
}

impl fmt::Display for AuditError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AuditError::PinMismatch {
        dependency,
        expected,
        actual,
      } => write!(
        f,
        "Packaged manifest declares '{}' as '{}' but this run pinned '{}'",
        dependency, actual, expected
      ),
      AuditError::MissingDependency { dependency, expected } => write!(
        f,
        "Packaged manifest is missing dependency '{}' (expected pin '{}')",
        dependency, expected
      ),
    }
  }
}

/// Top-level convoy error
#[derive(Debug)]
pub enum ConvoyError {
  Config(ConfigError),
  Registry(RegistryError),
  Audit(AuditError),
  /// A package's base version is not parseable semver
  InvalidVersion { name: String, value: String },
  /// External build step failed for a first-party package
  Build { name: String, detail: String },
  /// The same package name was recorded twice in one run
  DuplicatePin { name: String },
  /// Catch-all with optional help text
  Message { msg: String, help: Option<String> },
}

impl ConvoyError {
  pub fn message(msg: impl Into<String>) -> Self {
    ConvoyError::Message {
      msg: msg.into(),
      help: None,
    }
  }

  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ConvoyError::Message {
      msg: msg.into(),
      help: Some(help.into()),
    }
  }

  /// Help text to print below the error, if any
  pub fn help(&self) -> Option<&str> {
    match self {
      ConvoyError::Message { help, .. } => help.as_deref(),
      ConvoyError::Config(ConfigError::NotFound { .. }) => Some("Run 'convoy init' to create a starter convoy.toml"),
      ConvoyError::Audit(_) => Some("The consumer was NOT published. Fix the pin source and rerun."),
      _ => None,
    }
  }

  pub fn exit_code(&self) -> ExitCode {
    match self {
      ConvoyError::Config(_) => ExitCode::Config,
      ConvoyError::Audit(_) => ExitCode::Audit,
      _ => ExitCode::Failure,
    }
  }
}

impl fmt::Display for ConvoyError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConvoyError::Config(e) => write!(f, "{}", e),
      ConvoyError::Registry(e) => write!(f, "{}", e),
      ConvoyError::Audit(e) => write!(f, "{}", e),
      ConvoyError::InvalidVersion { name, value } => {
        write!(f, "Package '{}' has unparseable version '{}'", name, value)
      }
      ConvoyError::Build { name, detail } => write!(f, "Build failed for '{}'\n{}", name, detail.trim()),
      ConvoyError::DuplicatePin { name } => {
        write!(f, "Package '{}' was already pinned in this run", name)
      }
      ConvoyError::Message { msg, .. } => write!(f, "{}", msg),
    }
  }
}

impl std::error::Error for ConvoyError {}

impl From<std::io::Error> for ConvoyError {
  fn from(e: std::io::Error) -> Self {
    ConvoyError::message(format!("I/O error: {}", e))
  }
}

impl From<serde_json::Error> for ConvoyError {
  fn from(e: serde_json::Error) -> Self {
    ConvoyError::message(format!("JSON error: {}", e))
  }
}

/// Process exit codes by error class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  Success,
  Failure,
  Config,
  Audit,
}

impl ExitCode {
  pub fn as_i32(self) -> i32 {
    match self {
      ExitCode::Success => 0,
      ExitCode::Failure => 1,
      ExitCode::Config => 2,
      ExitCode::Audit => 3,
    }
  }
}

/// Attach context to any displayable error
pub trait ResultExt<T> {
  fn context(self, msg: impl Into<String>) -> ConvoyResult<T>;
  fn with_context<F: FnOnce() -> String>(self, f: F) -> ConvoyResult<T>;
}

impl<T, E: fmt::Display> ResultExt<T> for Result<T, E> {
  fn context(self, msg: impl Into<String>) -> ConvoyResult<T> {
    self.map_err(|e| ConvoyError::message(format!("{}: {}", msg.into(), e)))
  }

  fn with_context<F: FnOnce() -> String>(self, f: F) -> ConvoyResult<T> {
    self.map_err(|e| ConvoyError::message(format!("{}: {}", f(), e)))
  }
}

/// Print an error (and its help line) to stderr
pub fn print_error(err: &ConvoyError) {
  eprintln!("❌ Error: {}", err);
  if let Some(help) = err.help() {
    eprintln!();
    eprintln!("💡 {}", help);
  }
}
