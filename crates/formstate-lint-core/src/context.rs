//! Context types for rule execution.

use std::collections::{HashMap, HashSet};

use crate::manifest::{Ability, AbilityBlock, Manifest};
use crate::policy::FormPolicy;

/// Context provided to rules.
///
/// Holds the immutable manifest snapshot and the policy. All rules of a run
/// share one context; ability views and effect lookups are computed once,
/// when the context is built.
#[derive(Debug, Clone)]
pub struct RuleContext<'a> {
    /// The manifest under validation.
    pub manifest: &'a Manifest,
    /// The policy being enforced.
    pub policy: &'a FormPolicy,
    abilities: Vec<AbilityView<'a>>,
    by_name: HashMap<&'a str, usize>,
    effects: HashSet<&'a str>,
    applied: HashSet<&'a str>,
}

impl<'a> RuleContext<'a> {
    /// Creates a new rule context.
    #[must_use]
    pub fn new(manifest: &'a Manifest, policy: &'a FormPolicy) -> Self {
        let abilities = collect_abilities(manifest);

        let mut by_name = HashMap::with_capacity(abilities.len());
        for (idx, view) in abilities.iter().enumerate() {
            by_name.entry(view.name()).or_insert(idx);
        }

        let effects = manifest
            .document()
            .effects()
            .map(|effect| effect.name())
            .chain(manifest.raw().effect_names().into_iter().map(|d| d.name))
            .collect();

        let applied = abilities
            .iter()
            .flat_map(|view| view.applied_effects(policy))
            .collect();

        Self {
            manifest,
            policy,
            abilities,
            by_name,
            effects,
            applied,
        }
    }

    /// Resolves an ability by name.
    ///
    /// The structured record is authoritative; the raw block is used only
    /// when the tree has no record but the text declares one.
    #[must_use]
    pub fn ability(&self, name: &str) -> Option<AbilityView<'a>> {
        if let Some(&idx) = self.by_name.get(name) {
            return self.abilities.get(idx).cloned();
        }
        self.manifest
            .raw()
            .extract_ability_block(name)
            .map(|block| AbilityView::Raw {
                name: block.name(),
                block,
            })
    }

    /// Every ability in the manifest: structured records in document order,
    /// then abilities declared only in the raw text, in text order.
    #[must_use]
    pub fn abilities(&self) -> &[AbilityView<'a>] {
        &self.abilities
    }

    /// Whether an effect named `name` exists in the manifest.
    #[must_use]
    pub fn effect_exists(&self, name: &str) -> bool {
        self.effects.contains(name)
    }

    /// Whether some ability anywhere in the manifest applies `effect`.
    #[must_use]
    pub fn is_applied_anywhere(&self, effect: &str) -> bool {
        self.applied.contains(effect)
    }
}

fn collect_abilities(manifest: &Manifest) -> Vec<AbilityView<'_>> {
    let document = manifest.document();
    let raw = manifest.raw();

    let mut views: Vec<AbilityView<'_>> = document
        .abilities()
        .map(|ability| AbilityView::Graph {
            ability,
            block: raw.extract_ability_block(ability.name()),
        })
        .collect();
    let mut seen: HashSet<&str> = views.iter().map(AbilityView::name).collect();

    for decl in raw.ability_names() {
        if !seen.insert(decl.name) {
            continue;
        }
        if let Some(block) = raw.extract_ability_block(decl.name) {
            views.push(AbilityView::Raw {
                name: decl.name,
                block,
            });
        }
    }

    views
}

/// An ability as seen by the rules: either its structured record or, when
/// the tree lost it, its raw-text block.
#[derive(Debug, Clone)]
pub enum AbilityView<'a> {
    /// Found in the structured tree.
    Graph {
        /// The structured record.
        ability: Ability<'a>,
        /// The matching raw block, used only for line numbers.
        block: Option<AbilityBlock<'a>>,
    },
    /// Declared in the text but missing from the tree.
    Raw {
        /// Declared name.
        name: &'a str,
        /// The ability's text block.
        block: AbilityBlock<'a>,
    },
}

impl<'a> AbilityView<'a> {
    /// The ability's name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::Graph { ability, .. } => ability.name(),
            Self::Raw { name, .. } => *name,
        }
    }

    /// 1-indexed manifest line of the declaration, when known.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Graph { block, .. } => block.as_ref().map(AbilityBlock::line),
            Self::Raw { block, .. } => Some(block.line()),
        }
    }

    /// Whether the ability has a node with `function`.
    #[must_use]
    pub fn has_function(&self, function: &str) -> bool {
        match self {
            Self::Graph { ability, .. } => ability
                .event_graph()
                .is_some_and(|g| !g.nodes_with_function(function).is_empty()),
            Self::Raw { block, .. } => block.has_function(function),
        }
    }

    /// Whether the ability has a literal-tag node whose value is exactly `tag`.
    #[must_use]
    pub fn has_literal_tag(&self, policy: &FormPolicy, tag: &str) -> bool {
        match self {
            Self::Graph { ability, .. } => ability.event_graph().is_some_and(|g| {
                g.nodes_with_function(&policy.functions().make_literal_tag)
                    .iter()
                    .any(|n| n.property("literal_value") == Some(tag))
            }),
            Self::Raw { block, .. } => block.has_literal_value(tag),
        }
    }

    /// Whether the ability has an apply-effect node targeting `effect`.
    #[must_use]
    pub fn applies_effect(&self, policy: &FormPolicy, effect: &str) -> bool {
        let apply = &policy.functions().apply_effect;
        match self {
            Self::Graph { ability, .. } => ability.event_graph().is_some_and(|g| {
                g.nodes_with_function(apply)
                    .iter()
                    .any(|n| n.property("gameplay_effect_class") == Some(effect))
            }),
            Self::Raw { block, .. } => block.applies_effect(apply, effect),
        }
    }

    /// Effects applied by the ability's apply-effect nodes.
    #[must_use]
    pub fn applied_effects(&self, policy: &FormPolicy) -> Vec<&'a str> {
        let apply = &policy.functions().apply_effect;
        match self {
            Self::Graph { ability, .. } => ability
                .event_graph()
                .map(|g| {
                    g.nodes_with_function(apply)
                        .iter()
                        .filter_map(|n| n.property("gameplay_effect_class"))
                        .collect()
                })
                .unwrap_or_default(),
            Self::Raw { block, .. } => block.applied_effects(apply),
        }
    }

    /// Declared `activation_required_tags`, in order.
    #[must_use]
    pub fn required_tags(&self) -> Vec<&'a str> {
        match self {
            Self::Graph { ability, .. } => ability.required_tags(),
            Self::Raw { block, .. } => raw_required_tags(block.as_str()),
        }
    }
}

/// Collects list items under an `activation_required_tags:` key in a raw
/// block, or its inline `[a, b]` form.
fn raw_required_tags(block: &str) -> Vec<&str> {
    let mut tags = Vec::new();
    let mut key_indent: Option<usize> = None;

    for line in block.lines() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(rest) = trimmed.strip_prefix("activation_required_tags:") {
            let rest = rest.trim();
            if let Some(inline) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
                tags.extend(inline.split(',').map(clean_item).filter(|t| !t.is_empty()));
            } else {
                key_indent = Some(indent);
            }
            continue;
        }

        let Some(base) = key_indent else { continue };
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if indent < base || (indent == base && !trimmed.starts_with("- ")) {
            key_indent = None;
            continue;
        }
        if let Some(item) = trimmed.strip_prefix("- ") {
            let item = clean_item(item);
            if !item.is_empty() {
                tags.push(item);
            }
        }
    }

    tags
}

fn clean_item(item: &str) -> &str {
    let item = item.split(" #").next().unwrap_or(item).trim();
    item.trim_matches(|c| c == '"' || c == '\'')
}
