//! # formstate-lint
//!
//! Structural invariant checker for gameplay-ability manifests.
//!
//! This is the main facade crate that re-exports the core framework and the
//! built-in rules, and offers one-call validation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let report = formstate_lint::validate("ClaudeContext/manifest.yaml".as_ref())?;
//! if !report.passed {
//!     for finding in &report.findings {
//!         eprintln!("{finding}");
//!     }
//! }
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use formstate_lint::{Config, Validator};
//!
//! let config = Config::from_file("formstate-lint.toml".as_ref())?;
//! let validator = Validator::builder()
//!     .rules(formstate_lint::rules::all_rules())
//!     .config(config)
//!     .build()?;
//!
//! let report = validator.validate("ClaudeContext/manifest.yaml".as_ref())?;
//! ```

#![forbid(unsafe_code)]

use std::path::Path;

// Re-export core types and traits
pub use formstate_lint_core::*;

/// Built-in rules and the rule registry.
pub mod rules {
    pub use formstate_lint_rules::*;
}

/// Validates the manifest at `path` with every built-in rule and the
/// built-in form policy.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or parsed.
pub fn validate(path: &Path) -> Result<Report, ValidateError> {
    validate_with(path, &Config::default())
}

/// Validates the manifest at `path` with every built-in rule, honouring the
/// policy and rule overrides in `config`.
///
/// # Errors
///
/// Returns an error if the configured policy is invalid or the manifest
/// cannot be read or parsed.
pub fn validate_with(path: &Path, config: &Config) -> Result<Report, ValidateError> {
    Validator::builder()
        .rules(rules::all_rules())
        .config(config.clone())
        .build()?
        .validate(path)
}
