//! Form-state policy: the domain knowledge the rules enforce.
//!
//! The policy holds the Ability → Effect and Effect → Tag tables, the shared
//! parent tag, the banned removal tags, and the node-function vocabulary. It
//! is plain data injected into the validator, so the same rules can be
//! pointed at a different form vocabulary without code changes.
//!
//! All invariants are checked when the policy is built.

use miette::Diagnostic;
use std::fmt;

/// Built-in forms as `(ability, effect, granted tag)`.
const FATHER_FORMS: &[(&str, &str, &str)] = &[
    ("GA_FatherCrawler", "GE_CrawlerState", "Effect.Father.FormState.Crawler"),
    ("GA_FatherArmor", "GE_ArmorState", "Effect.Father.FormState.Armor"),
    ("GA_FatherExoskeleton", "GE_ExoskeletonState", "Effect.Father.FormState.Exoskeleton"),
    ("GA_FatherSymbiote", "GE_SymbioteState", "Effect.Father.FormState.Symbiote"),
    ("GA_FatherEngineer", "GE_EngineerState", "Effect.Father.FormState.Engineer"),
];

/// Common ancestor of every per-form tag.
pub const DEFAULT_PARENT_TAG: &str = "Effect.Father.FormState";

/// Tag that must never drive a removal.
pub const DEFAULT_BANNED_REMOVAL_TAG: &str = "Narrative.State.Invulnerable";

/// Policy validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
pub enum PolicyError {
    /// A required name is empty.
    #[error("{field} must not be empty")]
    #[diagnostic(code(formstate_lint::policy::empty_name))]
    EmptyName {
        /// Which field was empty (e.g., "forms[2].ability").
        field: String,
    },

    /// A tag is not a dotted identifier.
    #[error("invalid tag `{tag}`: expected dot-separated identifiers")]
    #[diagnostic(
        code(formstate_lint::policy::invalid_tag),
        help("tags look like `Effect.Father.FormState.Crawler`")
    )]
    InvalidTag {
        /// The offending tag.
        tag: String,
    },

    /// The same ability is mapped twice.
    #[error("form ability `{ability}` is declared more than once")]
    #[diagnostic(code(formstate_lint::policy::duplicate_form))]
    DuplicateForm {
        /// Repeated ability name.
        ability: String,
    },

    /// The same effect is given two granted tags.
    #[error("effect `{effect}` is given more than one granted tag")]
    #[diagnostic(code(formstate_lint::policy::duplicate_granted_tag))]
    DuplicateGrantedTag {
        /// Repeated effect name.
        effect: String,
    },

    /// The per-form namespace is not under the parent tag.
    #[error("form tag prefix `{prefix}` is not under parent tag `{parent}`")]
    #[diagnostic(
        code(formstate_lint::policy::prefix_outside_parent),
        help("use `<parent_tag>.` or a deeper namespace")
    )]
    PrefixOutsideParent {
        /// Configured prefix.
        prefix: String,
        /// Configured parent tag.
        parent: String,
    },
}

/// A validated gameplay tag (`A.B.C`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(String);

impl Tag {
    /// Creates a tag.
    ///
    /// # Errors
    ///
    /// Returns error unless every dot-separated segment is a non-empty run of
    /// ASCII letters, digits, or underscores.
    pub fn new(tag: &str) -> Result<Self, PolicyError> {
        let valid = !tag.is_empty()
            && tag.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
        if valid {
            Ok(Self(tag.to_string()))
        } else {
            Err(PolicyError::InvalidTag {
                tag: tag.to_string(),
            })
        }
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ability that must apply a specific effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormBinding {
    /// Form ability name.
    pub ability: String,
    /// Effect the ability must apply.
    pub effect: String,
}

/// An effect and the tag it grants once applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedTag {
    /// Effect name.
    pub effect: String,
    /// Tag granted by the effect.
    pub tag: Tag,
}

/// Node `function` values the rules recognise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFunctions {
    /// Applies an effect to the owner.
    pub apply_effect: String,
    /// Removes effects whose granted tags match a container.
    pub remove_by_granted_tag: String,
    /// Builds a literal tag.
    pub make_literal_tag: String,
    /// Wraps a tag in a container.
    pub make_tag_container: String,
}

impl Default for NodeFunctions {
    fn default() -> Self {
        Self {
            apply_effect: "ApplyGameplayEffectToSelf".to_string(),
            remove_by_granted_tag: "RemoveGameplayEffectFromOwnerWithGrantedTags".to_string(),
            make_literal_tag: "MakeLiteralGameplayTag".to_string(),
            make_tag_container: "MakeGameplayTagContainerFromTag".to_string(),
        }
    }
}

/// The validated form-state policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPolicy {
    forms: Vec<FormBinding>,
    granted_tags: Vec<GrantedTag>,
    parent_tag: Tag,
    form_tag_prefix: String,
    banned_removal_tags: Vec<Tag>,
    functions: NodeFunctions,
}

impl Default for FormPolicy {
    /// The five Father forms.
    fn default() -> Self {
        Self {
            forms: FATHER_FORMS
                .iter()
                .map(|(ability, effect, _)| FormBinding {
                    ability: (*ability).to_string(),
                    effect: (*effect).to_string(),
                })
                .collect(),
            granted_tags: FATHER_FORMS
                .iter()
                .map(|(_, effect, tag)| GrantedTag {
                    effect: (*effect).to_string(),
                    tag: Tag((*tag).to_string()),
                })
                .collect(),
            parent_tag: Tag(DEFAULT_PARENT_TAG.to_string()),
            form_tag_prefix: format!("{DEFAULT_PARENT_TAG}."),
            banned_removal_tags: vec![Tag(DEFAULT_BANNED_REMOVAL_TAG.to_string())],
            functions: NodeFunctions::default(),
        }
    }
}

impl FormPolicy {
    /// Creates a builder starting from an empty policy.
    #[must_use]
    pub fn builder() -> FormPolicyBuilder {
        FormPolicyBuilder::default()
    }

    /// Ability → Effect bindings, in declaration order.
    #[must_use]
    pub fn forms(&self) -> &[FormBinding] {
        &self.forms
    }

    /// Effect → Tag bindings, in declaration order.
    #[must_use]
    pub fn granted_tags(&self) -> &[GrantedTag] {
        &self.granted_tags
    }

    /// The effect that grants `tag`, if any.
    #[must_use]
    pub fn granting_effect(&self, tag: &str) -> Option<&str> {
        self.granted_tags
            .iter()
            .find(|g| g.tag.as_str() == tag)
            .map(|g| g.effect.as_str())
    }

    /// Common ancestor of the per-form tags.
    #[must_use]
    pub fn parent_tag(&self) -> &Tag {
        &self.parent_tag
    }

    /// Whether `tag` lies in the per-form namespace.
    #[must_use]
    pub fn is_form_tag(&self, tag: &str) -> bool {
        tag.starts_with(&self.form_tag_prefix)
    }

    /// Tags that must never be wired into a removal.
    #[must_use]
    pub fn banned_removal_tags(&self) -> &[Tag] {
        &self.banned_removal_tags
    }

    /// Recognised node functions.
    #[must_use]
    pub fn functions(&self) -> &NodeFunctions {
        &self.functions
    }
}

/// Builder for [`FormPolicy`].
#[derive(Debug, Clone, Default)]
pub struct FormPolicyBuilder {
    forms: Vec<(String, String)>,
    granted_tags: Vec<(String, String)>,
    parent_tag: Option<String>,
    form_tag_prefix: Option<String>,
    banned_removal_tags: Option<Vec<String>>,
    functions: NodeFunctions,
}

impl FormPolicyBuilder {
    /// Adds an Ability → Effect binding.
    #[must_use]
    pub fn form(mut self, ability: impl Into<String>, effect: impl Into<String>) -> Self {
        self.forms.push((ability.into(), effect.into()));
        self
    }

    /// Adds an Effect → Tag binding.
    #[must_use]
    pub fn granted_tag(mut self, effect: impl Into<String>, tag: impl Into<String>) -> Self {
        self.granted_tags.push((effect.into(), tag.into()));
        self
    }

    /// Sets the parent tag (default: `Effect.Father.FormState`).
    #[must_use]
    pub fn parent_tag(mut self, tag: impl Into<String>) -> Self {
        self.parent_tag = Some(tag.into());
        self
    }

    /// Sets the per-form namespace prefix (default: `<parent_tag>.`).
    #[must_use]
    pub fn form_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.form_tag_prefix = Some(prefix.into());
        self
    }

    /// Replaces the banned removal tags (default: `Narrative.State.Invulnerable`).
    #[must_use]
    pub fn banned_removal_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.banned_removal_tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Replaces the node-function vocabulary.
    #[must_use]
    pub fn functions(mut self, functions: NodeFunctions) -> Self {
        self.functions = functions;
        self
    }

    /// Validates and builds the policy.
    ///
    /// # Errors
    ///
    /// Returns the first invariant violation found.
    pub fn build(self) -> Result<FormPolicy, PolicyError> {
        let mut forms: Vec<FormBinding> = Vec::with_capacity(self.forms.len());
        for (i, (ability, effect)) in self.forms.into_iter().enumerate() {
            non_empty(&ability, || format!("forms[{i}].ability"))?;
            non_empty(&effect, || format!("forms[{i}].effect"))?;
            if forms.iter().any(|f| f.ability == ability) {
                return Err(PolicyError::DuplicateForm { ability });
            }
            forms.push(FormBinding { ability, effect });
        }

        let mut granted_tags: Vec<GrantedTag> = Vec::with_capacity(self.granted_tags.len());
        for (i, (effect, tag)) in self.granted_tags.into_iter().enumerate() {
            non_empty(&effect, || format!("granted-tags[{i}].effect"))?;
            let tag = Tag::new(&tag)?;
            if granted_tags.iter().any(|g| g.effect == effect) {
                return Err(PolicyError::DuplicateGrantedTag { effect });
            }
            granted_tags.push(GrantedTag { effect, tag });
        }

        let parent_tag = Tag::new(self.parent_tag.as_deref().unwrap_or(DEFAULT_PARENT_TAG))?;
        let form_tag_prefix = self
            .form_tag_prefix
            .unwrap_or_else(|| format!("{parent_tag}."));
        if !form_tag_prefix.starts_with(&format!("{parent_tag}.")) {
            return Err(PolicyError::PrefixOutsideParent {
                prefix: form_tag_prefix,
                parent: parent_tag.0,
            });
        }

        let banned_removal_tags = self
            .banned_removal_tags
            .unwrap_or_else(|| vec![DEFAULT_BANNED_REMOVAL_TAG.to_string()])
            .iter()
            .map(|t| Tag::new(t))
            .collect::<Result<Vec<_>, _>>()?;

        let functions = self.functions;
        for (field, value) in [
            ("functions.apply_effect", &functions.apply_effect),
            ("functions.remove_by_granted_tag", &functions.remove_by_granted_tag),
            ("functions.make_literal_tag", &functions.make_literal_tag),
            ("functions.make_tag_container", &functions.make_tag_container),
        ] {
            non_empty(value, || field.to_string())?;
        }

        Ok(FormPolicy {
            forms,
            granted_tags,
            parent_tag,
            form_tag_prefix,
            banned_removal_tags,
            functions,
        })
    }
}

fn non_empty(value: &str, field: impl FnOnce() -> String) -> Result<(), PolicyError> {
    if value.trim().is_empty() {
        Err(PolicyError::EmptyName { field: field() })
    } else {
        Ok(())
    }
}
