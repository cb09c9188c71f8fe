//! # formstate-lint-rules
//!
//! Built-in form-state rules for formstate-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | L1 | `form-applies-state` | Each form ability applies its `GE_*State` effect |
//! | L2 | `form-removes-prior-state` | Each form ability removes the prior form state |
//! | L3 | `no-banned-removal-tag` | Banned tags are never wired into a removal |
//! | L4 | `required-tag-closure` | Every required form tag has a live granting form |
//!
//! ## Usage
//!
//! ```ignore
//! use formstate_lint_core::Validator;
//! use formstate_lint_rules::{FormAppliesState, RequiredTagClosure};
//!
//! let validator = Validator::builder()
//!     .rule(FormAppliesState::new())
//!     .rule(RequiredTagClosure::new())
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod form_applies_state;
pub mod form_removes_prior_state;
pub mod no_banned_removal_tag;
mod presets;
pub mod required_tag_closure;

pub use form_applies_state::FormAppliesState;
pub use form_removes_prior_state::FormRemovesPriorState;
pub use no_banned_removal_tag::NoBannedRemovalTag;
pub use presets::{all_rules, rule_by_name};
pub use required_tag_closure::RequiredTagClosure;

/// Re-export core types for convenience.
pub use formstate_lint_core::{Finding, Rule, Severity};
