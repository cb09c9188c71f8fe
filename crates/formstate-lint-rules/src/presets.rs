//! Rule registry.

use crate::{FormAppliesState, FormRemovesPriorState, NoBannedRemovalTag, RequiredTagClosure};
use formstate_lint_core::RuleBox;

/// Returns all built-in rules in report order (L1, L2, L3, L4).
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    vec![
        Box::new(FormAppliesState::new()),
        Box::new(FormRemovesPriorState::new()),
        Box::new(NoBannedRemovalTag::new()),
        Box::new(RequiredTagClosure::new()),
    ]
}

/// Looks up a built-in rule by name (`form-applies-state`) or code (`L1`).
/// Codes match case-insensitively.
#[must_use]
pub fn rule_by_name(key: &str) -> Option<RuleBox> {
    all_rules()
        .into_iter()
        .find(|rule| rule.name() == key || rule.code().eq_ignore_ascii_case(key))
}
