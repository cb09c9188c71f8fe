//! Rule checking that every required form tag can actually be obtained.
//!
//! For each `activation_required_tags` entry under the per-form namespace,
//! the chain tag → granting effect → applying ability must be complete.
//! Exactly one finding is produced per broken tag, for the first link that
//! fails:
//!
//! 1. no effect is known to grant the tag,
//! 2. the granting effect is not declared in the manifest,
//! 3. no ability applies the granting effect.

use formstate_lint_core::{Finding, Rule, RuleContext, Severity};

/// Rule code for required-tag-closure.
pub const CODE: &str = "L4";

/// Rule name for required-tag-closure.
pub const NAME: &str = "required-tag-closure";

/// Requires each required form tag to have a live granting form.
#[derive(Debug, Clone)]
pub struct RequiredTagClosure {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for RequiredTagClosure {
    fn default() -> Self {
        Self::new()
    }
}

impl RequiredTagClosure {
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

/// Why a required tag cannot be satisfied.
fn broken_link(ctx: &RuleContext<'_>, tag: &str) -> Option<String> {
    let Some(effect) = ctx.policy.granting_effect(tag) else {
        return Some(format!("Required tag '{tag}' has no known granting GE"));
    };
    if !ctx.effect_exists(effect) {
        return Some(format!(
            "Required tag '{tag}' granted by {effect} which doesn't exist"
        ));
    }
    if !ctx.is_applied_anywhere(effect) {
        return Some(format!(
            "Required tag '{tag}' is never applied (no ability applies {effect})"
        ));
    }
    None
}

impl Rule for RequiredTagClosure {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Required tags have granting forms"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for view in ctx.abilities() {
            for tag in view.required_tags() {
                if !ctx.policy.is_form_tag(tag) {
                    tracing::trace!("{}: {} is not a form tag", view.name(), tag);
                    continue;
                }
                if let Some(message) = broken_link(ctx, tag) {
                    findings.push(
                        Finding::new(CODE, NAME, self.severity, view.name(), message)
                            .at_line(view.line()),
                    );
                }
            }
        }

        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_lint_core::manifest::parse;
    use formstate_lint_core::FormPolicy;

    fn check_with(policy: &FormPolicy, source: &str) -> Vec<Finding> {
        let manifest = parse(source).unwrap();
        RequiredTagClosure::new().check(&RuleContext::new(&manifest, policy))
    }

    fn check_source(source: &str) -> Vec<Finding> {
        check_with(&FormPolicy::default(), source)
    }

    const SYMBIOTE_USER: &str = r"
gameplay_abilities:
  - name: GA_FatherSymbioteStrike
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Symbiote
        - State.Alive
";

    #[test]
    fn test_missing_effect() {
        let findings = check_source(SYMBIOTE_USER);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "GA_FatherSymbioteStrike");
        assert_eq!(
            findings[0].message,
            "Required tag 'Effect.Father.FormState.Symbiote' granted by GE_SymbioteState which doesn't exist"
        );
    }

    #[test]
    fn test_effect_never_applied() {
        let source = format!("{SYMBIOTE_USER}gameplay_effects:\n  - name: GE_SymbioteState\n");
        let findings = check_source(&source);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Required tag 'Effect.Father.FormState.Symbiote' is never applied (no ability applies GE_SymbioteState)"
        );
    }

    #[test]
    fn test_closed_chain_passes() {
        let source = r"
gameplay_abilities:
  - name: GA_FatherSymbiote
    event_graph:
      nodes:
        - id: Apply
          properties:
            function: ApplyGameplayEffectToSelf
            gameplay_effect_class: GE_SymbioteState
  - name: GA_FatherSymbioteStrike
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Symbiote
gameplay_effects:
  - name: GE_SymbioteState
";
        assert!(check_source(source).is_empty());
    }

    #[test]
    fn test_unknown_form_tag_reports_only_first_link() {
        let source = r"
gameplay_abilities:
  - name: GA_Glide
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Glider
";
        let findings = check_source(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Required tag 'Effect.Father.FormState.Glider' has no known granting GE"
        );
    }

    #[test]
    fn test_parent_tag_itself_is_not_a_form_tag() {
        let source = r"
gameplay_abilities:
  - name: GA_Any
    tags:
      activation_required_tags: [Effect.Father.FormState]
";
        assert!(check_source(source).is_empty());
    }

    #[test]
    fn test_custom_prefix() {
        let policy = FormPolicy::builder()
            .form("GA_Wolf", "GE_WolfState")
            .granted_tag("GE_WolfState", "Shape.Form.Wolf")
            .parent_tag("Shape.Form")
            .build()
            .unwrap();
        let findings = check_with(
            &policy,
            "gameplay_abilities:\n  - name: GA_Howl\n    tags:\n      activation_required_tags:\n        - Shape.Form.Wolf\n",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("GE_WolfState which doesn't exist"));
    }

    #[test]
    fn test_text_only_applier_closes_chain() {
        // The scalar drops the first list, so GA_FatherSymbiote survives
        // only in the text; the second list keeps the structured user.
        let source = r"
gameplay_abilities:
  - name: GA_FatherSymbiote
    event_graph:
      nodes:
        - id: Apply
          properties:
            function: ApplyGameplayEffectToSelf
            gameplay_effect_class: GE_SymbioteState
gameplay_abilities: replaced
gameplay_abilities:
  - name: GA_FatherSymbioteStrike
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Symbiote
gameplay_effects:
  - name: GE_SymbioteState
";
        assert!(check_source(source).is_empty());
    }

    #[test]
    fn test_text_only_user_is_checked() {
        let source = r"
gameplay_abilities:
  - name: GA_LostStrike
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Symbiote
gameplay_abilities: replaced
gameplay_effects:
  - name: GE_SymbioteState
";
        let findings = check_source(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "GA_LostStrike");
        assert_eq!(findings[0].line, Some(3));
        assert_eq!(
            findings[0].message,
            "Required tag 'Effect.Father.FormState.Symbiote' is never applied (no ability applies GE_SymbioteState)"
        );
    }
}
