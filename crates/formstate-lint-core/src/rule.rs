//! Rule trait for defining manifest lint rules.

use crate::context::RuleContext;
use crate::types::{Finding, RuleInfo, Severity};

/// A manifest-wide lint rule.
///
/// Rules read the shared [`RuleContext`] and return their findings in
/// evaluation order. A rule never fails: missing or malformed records become
/// findings.
///
/// # Example
///
/// ```ignore
/// use formstate_lint_core::{Finding, Rule, RuleContext, Severity};
///
/// pub struct RequireEffects;
///
/// impl Rule for RequireEffects {
///     fn name(&self) -> &'static str { "require-effects" }
///     fn code(&self) -> &'static str { "L9" }
///
///     fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
///         if ctx.manifest.document().effects().next().is_some() {
///             return Vec::new();
///         }
///         vec![Finding::new(
///             self.code(),
///             self.name(),
///             Severity::Warning,
///             "manifest",
///             "No gameplay effects declared",
///         )]
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "form-applies-state").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "L1").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for findings from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks the manifest and returns any findings.
    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding>;

    /// Describes this rule for reports.
    fn info(&self) -> RuleInfo {
        RuleInfo {
            code: self.code().to_string(),
            name: self.name().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
