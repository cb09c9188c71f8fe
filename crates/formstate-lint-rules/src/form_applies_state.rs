//! Rule requiring every form ability to apply its own state effect.
//!
//! # Rationale
//!
//! A form is only "active" while its `GE_*State` effect is on the owner.
//! Other abilities gate on the tag that effect grants, so a form ability
//! that forgets to apply it leaves the owner in no form at all.
//!
//! # Checked shape
//!
//! For each configured `(ability, effect)` pair, the ability's event graph
//! must contain a node calling the apply-effect function whose
//! `gameplay_effect_class` is exactly `effect`.

use formstate_lint_core::{Finding, Rule, RuleContext, Severity};

/// Rule code for form-applies-state.
pub const CODE: &str = "L1";

/// Rule name for form-applies-state.
pub const NAME: &str = "form-applies-state";

/// Message used when a configured form ability has no record.
pub(crate) const NOT_FOUND: &str = "Form ability not found in manifest";

/// Requires each form ability to apply its `GE_*State` effect.
#[derive(Debug, Clone)]
pub struct FormAppliesState {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for FormAppliesState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormAppliesState {
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

    fn finding(&self, subject: &str, message: impl Into<String>) -> Finding {
        Finding::new(CODE, NAME, self.severity, subject, message)
    }
}

impl Rule for FormAppliesState {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Form abilities apply their GE_*State"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let apply = &ctx.policy.functions().apply_effect;
        let mut findings = Vec::new();

        for form in ctx.policy.forms() {
            let Some(view) = ctx.ability(&form.ability) else {
                findings.push(self.finding(&form.ability, NOT_FOUND));
                continue;
            };

            if !view.applies_effect(ctx.policy, &form.effect) {
                findings.push(
                    self.finding(
                        &form.ability,
                        format!("Missing {apply} node with {}", form.effect),
                    )
                    .at_line(view.line())
                    .with_suggestion(format!(
                        "add a {apply} node with gameplay_effect_class: {}",
                        form.effect
                    )),
                );
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

    fn crawler_only() -> FormPolicy {
        FormPolicy::builder()
            .form("GA_FatherCrawler", "GE_CrawlerState")
            .granted_tag("GE_CrawlerState", "Effect.Father.FormState.Crawler")
            .build()
            .unwrap()
    }

    fn check_source(policy: &FormPolicy, source: &str) -> Vec<Finding> {
        let manifest = parse(source).unwrap();
        FormAppliesState::new().check(&RuleContext::new(&manifest, policy))
    }

    #[test]
    fn test_passes_when_effect_applied() {
        let findings = check_source(
            &crawler_only(),
            r"
gameplay_abilities:
  - name: GA_FatherCrawler
    event_graph:
      nodes:
        - id: ApplyCrawler
          type: CallFunction
          properties:
            function: ApplyGameplayEffectToSelf
            gameplay_effect_class: GE_CrawlerState
",
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_detects_wrong_effect() {
        let findings = check_source(
            &crawler_only(),
            r"
gameplay_abilities:
  - name: GA_FatherCrawler
    event_graph:
      nodes:
        - id: ApplyArmor
          properties:
            function: ApplyGameplayEffectToSelf
            gameplay_effect_class: GE_ArmorState
",
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "GA_FatherCrawler");
        assert_eq!(
            findings[0].message,
            "Missing ApplyGameplayEffectToSelf node with GE_CrawlerState"
        );
        assert_eq!(findings[0].line, Some(3));
    }

    #[test]
    fn test_reports_each_missing_form_once() {
        let findings = check_source(&FormPolicy::default(), "gameplay_abilities: []\n");
        assert_eq!(findings.len(), 5);
        assert!(findings.iter().all(|f| f.message == NOT_FOUND));
        assert_eq!(findings[0].subject, "GA_FatherCrawler");
        assert_eq!(findings[4].subject, "GA_FatherEngineer");
    }

    #[test]
    fn test_ability_without_graph() {
        let findings = check_source(
            &crawler_only(),
            "gameplay_abilities:\n  - name: GA_FatherCrawler\n",
        );
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.starts_with("Missing ApplyGameplayEffectToSelf"));
    }

    #[test]
    fn test_custom_severity() {
        let rule = FormAppliesState::new().severity(Severity::Warning);
        assert_eq!(rule.default_severity(), Severity::Warning);
        let manifest = parse("gameplay_abilities: []\n").unwrap();
        let policy = crawler_only();
        let findings = rule.check(&RuleContext::new(&manifest, &policy));
        assert_eq!(findings[0].severity, Severity::Warning);
    }

    // A later scalar drops the list, leaving the ability only in the text.
    const LOST_CRAWLER: &str = r"
gameplay_abilities:
  - name: GA_FatherCrawler
    event_graph:
      nodes:
        - id: Apply
          properties:
            gameplay_effect_class: GE_CrawlerState
            function: ApplyGameplayEffectToSelf
gameplay_abilities: replaced
";

    #[test]
    fn test_text_only_ability_judged_from_its_block() {
        assert!(check_source(&crawler_only(), LOST_CRAWLER).is_empty());

        let wrong = LOST_CRAWLER.replace("GE_CrawlerState", "GE_ArmorState");
        let findings = check_source(&crawler_only(), &wrong);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Missing ApplyGameplayEffectToSelf node with GE_CrawlerState"
        );
        assert_eq!(findings[0].line, Some(3));
    }
}
