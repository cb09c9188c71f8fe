//! Rule requiring every form ability to remove the previous form's state.
//!
//! # Rationale
//!
//! Form states are mutually exclusive. Before applying its own effect, a form
//! ability has to strip every effect granting a tag under the shared parent
//! tag, which takes three nodes:
//!
//! 1. a remove-by-granted-tags call,
//! 2. a literal tag node holding exactly the parent tag,
//! 3. a tag-container node feeding the removal.
//!
//! Only the first missing piece is reported per ability.

use formstate_lint_core::{AbilityView, Finding, FormPolicy, Rule, RuleContext, Severity};

use crate::form_applies_state::NOT_FOUND;

/// Rule code for form-removes-prior-state.
pub const CODE: &str = "L2";

/// Rule name for form-removes-prior-state.
pub const NAME: &str = "form-removes-prior-state";

/// Requires each form ability to remove the prior form state.
#[derive(Debug, Clone)]
pub struct FormRemovesPriorState {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for FormRemovesPriorState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormRemovesPriorState {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Error,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// First missing removal piece, if any.
fn first_missing(view: &AbilityView<'_>, policy: &FormPolicy) -> Option<String> {
    let functions = policy.functions();
    let parent = policy.parent_tag().as_str();

    if !view.has_function(&functions.remove_by_granted_tag) {
        return Some(format!("Missing {} node", functions.remove_by_granted_tag));
    }
    if !view.has_literal_tag(policy, parent) {
        return Some(format!("Missing {} with {parent}", functions.make_literal_tag));
    }
    if !view.has_function(&functions.make_tag_container) {
        return Some(format!("Missing {} node", functions.make_tag_container));
    }
    None
}

impl Rule for FormRemovesPriorState {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Form abilities remove prior FormState"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        ctx.policy
            .forms()
            .iter()
            .filter_map(|form| match ctx.ability(&form.ability) {
                None => Some(Finding::new(CODE, NAME, self.severity, &form.ability, NOT_FOUND)),
                Some(view) => first_missing(&view, ctx.policy).map(|message| {
                    Finding::new(CODE, NAME, self.severity, &form.ability, message)
                        .at_line(view.line())
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_lint_core::manifest::parse;

    fn crawler_only() -> FormPolicy {
        FormPolicy::builder()
            .form("GA_FatherCrawler", "GE_CrawlerState")
            .granted_tag("GE_CrawlerState", "Effect.Father.FormState.Crawler")
            .build()
            .unwrap()
    }

    fn check_source(source: &str) -> Vec<Finding> {
        let manifest = parse(source).unwrap();
        let policy = crawler_only();
        FormRemovesPriorState::new().check(&RuleContext::new(&manifest, &policy))
    }

    fn crawler(nodes: &str) -> String {
        format!(
            "gameplay_abilities:\n  - name: GA_FatherCrawler\n    event_graph:\n      nodes:\n{nodes}"
        )
    }

    const REMOVE: &str = "        - id: Remove\n          properties:\n            function: RemoveGameplayEffectFromOwnerWithGrantedTags\n";
    const LITERAL: &str = "        - id: Tag\n          properties:\n            function: MakeLiteralGameplayTag\n            literal_value: Effect.Father.FormState\n";
    const CONTAINER: &str = "        - id: Container\n          properties:\n            function: MakeGameplayTagContainerFromTag\n";

    #[test]
    fn test_complete_removal_passes() {
        assert!(check_source(&crawler(&format!("{REMOVE}{LITERAL}{CONTAINER}"))).is_empty());
    }

    #[test]
    fn test_missing_remove_node() {
        let findings = check_source(&crawler(&format!("{LITERAL}{CONTAINER}")));
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Missing RemoveGameplayEffectFromOwnerWithGrantedTags node"
        );
    }

    #[test]
    fn test_reports_first_missing_only() {
        let findings = check_source(&crawler("        - id: Other\n          properties:\n            function: PrintString\n"));
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("RemoveGameplayEffectFromOwnerWithGrantedTags"));
    }

    #[test]
    fn test_child_tag_is_not_parent() {
        let child = LITERAL.replace("FormState\n", "FormState.Crawler\n");
        let findings = check_source(&crawler(&format!("{REMOVE}{child}{CONTAINER}")));
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Missing MakeLiteralGameplayTag with Effect.Father.FormState"
        );
    }

    #[test]
    fn test_missing_container() {
        let findings = check_source(&crawler(&format!("{REMOVE}{LITERAL}")));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Missing MakeGameplayTagContainerFromTag node");
    }

    #[test]
    fn test_missing_ability() {
        let findings = check_source("gameplay_abilities: []\n");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].code, CODE);
        assert_eq!(findings[0].message, NOT_FOUND);
    }

    fn lost_crawler(nodes: &str) -> String {
        format!("{}gameplay_abilities: replaced\n", crawler(nodes))
    }

    #[test]
    fn test_text_only_ability_passes() {
        let source = lost_crawler(&format!("{REMOVE}{LITERAL}{CONTAINER}"));
        assert!(check_source(&source).is_empty());
    }

    #[test]
    fn test_text_only_ability_missing_container() {
        let findings = check_source(&lost_crawler(&format!("{REMOVE}{LITERAL}")));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "Missing MakeGameplayTagContainerFromTag node");
        assert_eq!(findings[0].line, Some(2));
    }
}
