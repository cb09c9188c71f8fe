//! # formstate-lint-core
//!
//! Core framework for checking structural invariants of ability manifests.
//!
//! This crate provides the foundational traits and types for building
//! manifest linters. It includes:
//!
//! - [`manifest`] for loading a manifest into a structured tree and a raw
//!   text view
//! - [`FormPolicy`] describing which forms exist and what they grant
//! - [`Rule`] trait for manifest-wide rules
//! - [`Validator`] for orchestrating a run
//! - [`Report`] and [`Finding`] for representing results
//!
//! ## Example
//!
//! ```ignore
//! use formstate_lint_core::Validator;
//!
//! let validator = Validator::builder()
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let report = validator.validate("ClaudeContext/manifest.yaml".as_ref())?;
//! assert!(report.passed);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod context;
pub mod manifest;
pub mod policy;
mod rule;
mod types;
mod validator;

pub use config::{Config, ConfigError, GuardConfig, RuleConfig};
pub use context::{AbilityView, RuleContext};
pub use manifest::{LoadError, Manifest};
pub use policy::{FormBinding, FormPolicy, FormPolicyBuilder, GrantedTag, NodeFunctions, PolicyError, Tag};
pub use rule::{Rule, RuleBox};
pub use types::{Finding, Report, RuleInfo, Severity};
pub use validator::{ValidateError, Validator, ValidatorBuilder};
