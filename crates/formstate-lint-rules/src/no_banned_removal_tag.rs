//! Rule forbidding banned tags from driving an effect removal.
//!
//! # Rationale
//!
//! Removing effects by a tag such as `Narrative.State.Invulnerable` strips
//! state that other systems own. The banned set is configurable.
//!
//! # Detection
//!
//! A literal-tag node holding a banned tag is flagged when it is the source
//! of at least one connection. Reachability is one hop: an unwired literal
//! is harmless, a wired one is reported.
//!
//! Abilities that exist only in the raw text fall back to a textual check:
//! any `literal_value: <banned>` line in the ability's block.

use formstate_lint_core::{AbilityView, Finding, Rule, RuleContext, Severity};

/// Rule code for no-banned-removal-tag.
pub const CODE: &str = "L3";

/// Rule name for no-banned-removal-tag.
pub const NAME: &str = "no-banned-removal-tag";

/// Forbids banned tags from being wired into a removal.
#[derive(Debug, Clone)]
pub struct NoBannedRemovalTag {
    /// Custom severity.
    pub severity: Severity,
}

impl Default for NoBannedRemovalTag {
    fn default() -> Self {
        Self::new()
    }
}

impl NoBannedRemovalTag {
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

    fn check_ability(&self, ctx: &RuleContext<'_>, view: &AbilityView<'_>) -> Vec<Finding> {
        let banned = ctx.policy.banned_removal_tags();
        let line = view.line();

        match view {
            AbilityView::Graph { ability, .. } => {
                let Some(graph) = ability.event_graph() else {
                    return Vec::new();
                };
                graph
                    .nodes_with_function(&ctx.policy.functions().make_literal_tag)
                    .into_iter()
                    .filter_map(|node| {
                        let value = node.property("literal_value")?;
                        let id = node.id()?;
                        let tag = banned.iter().find(|t| t.as_str() == value)?;
                        (!graph.outgoing(id).is_empty()).then(|| {
                            Finding::new(
                                CODE,
                                NAME,
                                self.severity,
                                view.name(),
                                format!("Uses banned tag '{tag}' in {id}"),
                            )
                            .at_line(line)
                        })
                    })
                    .collect()
            }
            AbilityView::Raw { block, .. } => {
                tracing::debug!("{} has no structured record, scanning its text", view.name());
                banned
                    .iter()
                    .filter(|tag| block.has_literal_value(tag.as_str()))
                    .map(|tag| {
                        Finding::new(
                            CODE,
                            NAME,
                            self.severity,
                            view.name(),
                            format!("Uses banned tag '{tag}' for removal"),
                        )
                        .at_line(line)
                    })
                    .collect()
            }
        }
    }
}

impl Rule for NoBannedRemovalTag {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "No banned Narrative.State.Invulnerable removal"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Finding> {
        ctx.abilities()
            .iter()
            .flat_map(|view| self.check_ability(ctx, view))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstate_lint_core::manifest::parse;
    use formstate_lint_core::FormPolicy;

    fn check_source(source: &str) -> Vec<Finding> {
        let manifest = parse(source).unwrap();
        let policy = FormPolicy::default();
        NoBannedRemovalTag::new().check(&RuleContext::new(&manifest, &policy))
    }

    const BANNED_NODE: &str = r"
gameplay_abilities:
  - name: GA_Death
    event_graph:
      nodes:
        - id: BadTag
          properties:
            function: MakeLiteralGameplayTag
            literal_value: Narrative.State.Invulnerable
        - id: Remove
          properties:
            function: RemoveGameplayEffectFromOwnerWithGrantedTags
";

    #[test]
    fn test_unwired_banned_literal_is_ignored() {
        assert!(check_source(BANNED_NODE).is_empty());
    }

    #[test]
    fn test_wired_banned_literal_is_reported() {
        let source = format!(
            "{BANNED_NODE}      connections:\n        - from: [BadTag, ReturnValue]\n          to: [Remove, Tags]\n"
        );
        let findings = check_source(&source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "GA_Death");
        assert_eq!(
            findings[0].message,
            "Uses banned tag 'Narrative.State.Invulnerable' in BadTag"
        );
    }

    #[test]
    fn test_incoming_edge_alone_is_not_reachability() {
        let source = format!(
            "{BANNED_NODE}      connections:\n        - from: [Remove, Out]\n          to: [BadTag, In]\n"
        );
        assert!(check_source(&source).is_empty());
    }

    #[test]
    fn test_allowed_literal_is_ignored() {
        let source = BANNED_NODE.replace("Narrative.State.Invulnerable", "Effect.Father.FormState");
        let source = format!("{source}      connections:\n        - from: BadTag\n          to: Remove\n");
        assert!(check_source(&source).is_empty());
    }

    #[test]
    fn test_raw_only_ability_uses_text_check() {
        // The later scalar replaces the list; GA_Lost survives only as text.
        let source = r"
gameplay_abilities:
  - name: GA_Lost
    event_graph:
      nodes:
        - id: T
          properties:
            literal_value: Narrative.State.Invulnerable
gameplay_abilities: replaced
";
        let findings = check_source(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].subject, "GA_Lost");
        assert_eq!(
            findings[0].message,
            "Uses banned tag 'Narrative.State.Invulnerable' for removal"
        );
    }

    #[test]
    fn test_numeric_node_ids_are_linked() {
        let source = r"
gameplay_abilities:
  - name: GA_Death
    event_graph:
      nodes:
        - id: 1
          properties:
            function: MakeLiteralGameplayTag
            literal_value: Narrative.State.Invulnerable
        - id: 2
          properties:
            function: RemoveGameplayEffectFromOwnerWithGrantedTags
      connections:
        - from: [1, ReturnValue]
          to: [2, Tags]
";
        let findings = check_source(source);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Uses banned tag 'Narrative.State.Invulnerable' in 1"
        );
    }
}
