//! Configuration types for formstate-lint.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::policy::{FormPolicy, NodeFunctions, PolicyError};

/// Default manifest location, relative to the working directory.
pub const DEFAULT_MANIFEST: &str = "ClaudeContext/manifest.yaml";

/// Default document referenced by failing reports.
pub const DEFAULT_DOCS: &str = "ClaudeContext/Handoffs/Form_State_Architecture_Fix_v4.13.2.md";

/// Default commit-message token that unlocks locked files.
pub const DEFAULT_BYPASS_TOKEN: &str = "[LOCKED-CHANGE-APPROVED]";

/// Top-level configuration for formstate-lint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Manifest to validate when no path is given.
    #[serde(default)]
    pub manifest: Option<PathBuf>,

    /// Document shown after a failing report.
    #[serde(default)]
    pub docs: Option<String>,

    /// Tag policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Ability → Effect bindings.
    ///
    /// The built-in forms and tags are used only when both this and
    /// `granted_tags` are empty; otherwise both tables are taken as written.
    #[serde(default)]
    pub forms: Vec<FormEntry>,

    /// Effect → Tag bindings. See [`Config::forms`] for the fallback.
    #[serde(default)]
    pub granted_tags: Vec<GrantedTagEntry>,

    /// Node-function vocabulary overrides.
    #[serde(default)]
    pub functions: FunctionsConfig,

    /// Per-rule configurations.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,

    /// Commit guard configuration.
    #[serde(default)]
    pub guard: GuardConfig,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Manifest path to use, falling back to [`DEFAULT_MANIFEST`].
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.manifest
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST))
    }

    /// Document to point at after a failing report, falling back to
    /// [`DEFAULT_DOCS`].
    #[must_use]
    pub fn docs(&self) -> &str {
        self.docs.as_deref().unwrap_or(DEFAULT_DOCS)
    }

    /// Checks if a rule is enabled. Rules are looked up by name or code.
    #[must_use]
    pub fn is_rule_enabled(&self, name: &str, code: &str) -> bool {
        self.rule_config(name, code)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, name: &str, code: &str) -> Option<crate::Severity> {
        self.rule_config(name, code).and_then(|c| c.severity)
    }

    fn rule_config(&self, name: &str, code: &str) -> Option<&RuleConfig> {
        self.rules.get(name).or_else(|| self.rules.get(code))
    }

    /// Builds the validated [`FormPolicy`] this configuration describes.
    ///
    /// Without any `[[forms]]` or `[[granted-tags]]` entry the built-in forms
    /// and tags are used. Once either table has an entry, neither falls back,
    /// so a config with only `[[forms]]` grants no tags. The `[policy]` and
    /// `[functions]` sections apply either way.
    ///
    /// # Errors
    ///
    /// Returns an error if any policy invariant is violated.
    pub fn to_policy(&self) -> Result<FormPolicy, PolicyError> {
        let defaults = FormPolicy::default();
        let mut builder = FormPolicy::builder();

        if self.forms.is_empty() && self.granted_tags.is_empty() {
            for form in defaults.forms() {
                builder = builder.form(&form.ability, &form.effect);
            }
            for granted in defaults.granted_tags() {
                builder = builder.granted_tag(&granted.effect, granted.tag.as_str());
            }
        } else {
            for form in &self.forms {
                builder = builder.form(&form.ability, &form.effect);
            }
            for granted in &self.granted_tags {
                builder = builder.granted_tag(&granted.effect, &granted.tag);
            }
        }

        if let Some(parent) = &self.policy.parent_tag {
            builder = builder.parent_tag(parent);
        }
        if let Some(prefix) = &self.policy.form_tag_prefix {
            builder = builder.form_tag_prefix(prefix);
        }
        if let Some(banned) = &self.policy.banned_removal_tags {
            builder = builder.banned_removal_tags(banned.iter().cloned());
        }

        builder.functions(self.functions.resolve()).build()
    }
}

/// `[policy]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Common ancestor of all per-form tags.
    #[serde(default)]
    pub parent_tag: Option<String>,

    /// Namespace that marks a required tag as a form tag.
    #[serde(default)]
    pub form_tag_prefix: Option<String>,

    /// Tags that must never be wired into a removal.
    #[serde(default)]
    pub banned_removal_tags: Option<Vec<String>>,
}

/// `[[forms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormEntry {
    /// Form ability name.
    pub ability: String,
    /// Effect the ability must apply.
    pub effect: String,
}

/// `[[granted-tags]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantedTagEntry {
    /// Effect name.
    pub effect: String,
    /// Tag granted by the effect.
    pub tag: String,
}

/// `[functions]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionsConfig {
    /// Override for the apply-effect function.
    #[serde(default)]
    pub apply_effect: Option<String>,
    /// Override for the remove-by-granted-tag function.
    #[serde(default)]
    pub remove_by_granted_tag: Option<String>,
    /// Override for the literal-tag function.
    #[serde(default)]
    pub make_literal_tag: Option<String>,
    /// Override for the tag-container function.
    #[serde(default)]
    pub make_tag_container: Option<String>,
}

impl FunctionsConfig {
    fn resolve(&self) -> NodeFunctions {
        let defaults = NodeFunctions::default();
        NodeFunctions {
            apply_effect: self.apply_effect.clone().unwrap_or(defaults.apply_effect),
            remove_by_granted_tag: self
                .remove_by_granted_tag
                .clone()
                .unwrap_or(defaults.remove_by_granted_tag),
            make_literal_tag: self
                .make_literal_tag
                .clone()
                .unwrap_or(defaults.make_literal_tag),
            make_tag_container: self
                .make_tag_container
                .clone()
                .unwrap_or(defaults.make_tag_container),
        }
    }
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<crate::Severity>,
}

/// `[guard]` section for the commit guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Exact token that lets a commit touch locked files.
    #[serde(default = "default_bypass_token")]
    pub bypass_token: String,

    /// Glob patterns of locked paths, relative to the repository root.
    #[serde(default = "default_locked")]
    pub locked: Vec<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            bypass_token: default_bypass_token(),
            locked: default_locked(),
        }
    }
}

fn default_bypass_token() -> String {
    DEFAULT_BYPASS_TOKEN.to_string()
}

fn default_locked() -> Vec<String> {
    [
        "ClaudeContext/Handoffs/LOCKED_CONTRACTS.md",
        "ClaudeContext/Handoffs/LOCKED_SYSTEMS.md",
        "Source/GasAbilityGenerator/Public/Locked/GasAbilityGeneratorMetadata.h",
        "Source/GasAbilityGenerator/Private/Locked/GasAbilityGeneratorMetadata.cpp",
        "Source/GasAbilityGenerator/Public/Locked/GasAbilityGeneratorTypes.h",
        "Source/GasAbilityGenerator/Private/GasAbilityGeneratorGenerators.cpp",
        "Source/GasAbilityGenerator/Public/GasAbilityGeneratorGenerators.h",
        "Source/GasAbilityGenerator/Private/XLSXSupport/*",
        "Source/GasAbilityGenerator/Public/XLSXSupport/*",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(formstate_lint::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(formstate_lint::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.rules.is_empty());
        assert_eq!(config.manifest_path(), PathBuf::from(DEFAULT_MANIFEST));
        assert_eq!(config.guard.bypass_token, DEFAULT_BYPASS_TOKEN);
        assert_eq!(config.docs(), DEFAULT_DOCS);
        assert_eq!(config.to_policy().unwrap(), FormPolicy::default());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
manifest = "data/manifest.yaml"
docs = "docs/forms.md"

[policy]
banned_removal_tags = ["Narrative.State.Invulnerable", "State.Dead"]

[[forms]]
ability = "GA_FatherCrawler"
effect = "GE_CrawlerState"

[[granted-tags]]
effect = "GE_CrawlerState"
tag = "Effect.Father.FormState.Crawler"

[functions]
apply_effect = "ApplyEffectToOwner"

[rules.required-tag-closure]
severity = "warning"

[rules.L3]
enabled = false

[guard]
locked = ["Source/**/Locked/*"]
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.manifest_path(), PathBuf::from("data/manifest.yaml"));
        assert_eq!(config.docs(), "docs/forms.md");
        assert_eq!(
            config.rule_severity("required-tag-closure", "L4"),
            Some(Severity::Warning)
        );
        assert!(!config.is_rule_enabled("no-banned-removal-tag", "L3"));
        assert!(config.is_rule_enabled("form-applies-state", "L1"));
        assert_eq!(config.guard.bypass_token, DEFAULT_BYPASS_TOKEN);

        let policy = config.to_policy().unwrap();
        assert_eq!(policy.forms().len(), 1);
        assert_eq!(policy.banned_removal_tags().len(), 2);
        assert_eq!(policy.functions().apply_effect, "ApplyEffectToOwner");
        assert_eq!(
            policy.functions().make_literal_tag,
            "MakeLiteralGameplayTag"
        );
    }

    #[test]
    fn test_invalid_policy_surfaces() {
        let config = Config::parse(
            r#"
[[granted-tags]]
effect = "GE_X"
tag = "not a tag"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.to_policy(),
            Err(PolicyError::InvalidTag { .. })
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::parse("forms = 3"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_forms_alone_disable_default_tags() {
        let config = Config::parse(
            r#"
[[forms]]
ability = "GA_FatherCrawler"
effect = "GE_CrawlerState"
"#,
        )
        .unwrap();
        let policy = config.to_policy().unwrap();
        assert_eq!(policy.forms().len(), 1);
        assert!(policy.granted_tags().is_empty());
        assert_eq!(policy.granting_effect("Effect.Father.FormState.Crawler"), None);
    }
}
