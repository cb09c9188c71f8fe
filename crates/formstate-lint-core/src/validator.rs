//! Validator orchestrating a lint run over one manifest.

use crate::config::{Config, ConfigError};
use crate::context::RuleContext;
use crate::manifest::{self, LoadError, Manifest};
use crate::policy::{FormPolicy, PolicyError};
use crate::rule::{Rule, RuleBox};
use crate::types::{Finding, Report, RuleInfo};

use miette::Diagnostic;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a run before any rule executes.
#[derive(Debug, Error, Diagnostic)]
pub enum ValidateError {
    /// The manifest could not be loaded.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Load(#[from] LoadError),

    /// The configuration could not be read.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// The configured policy is inconsistent.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Policy(#[from] PolicyError),
}

/// Builder for configuring a [`Validator`].
#[derive(Default)]
pub struct ValidatorBuilder {
    rules: Vec<RuleBox>,
    config: Option<Config>,
    policy: Option<FormPolicy>,
}

impl ValidatorBuilder {
    /// Creates a new builder with no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to the validator.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the validator.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds several boxed rules, keeping their order.
    #[must_use]
    pub fn rules<I>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = RuleBox>,
    {
        self.rules.extend(rules);
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the policy explicitly, overriding the one derived from config.
    #[must_use]
    pub fn policy(mut self, policy: FormPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Builds the validator.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured policy is invalid.
    pub fn build(self) -> Result<Validator, ValidateError> {
        let config = self.config.unwrap_or_default();
        let policy = match self.policy {
            Some(policy) => policy,
            None => config.to_policy()?,
        };

        for key in config.rules.keys() {
            if !self.rules.iter().any(|r| r.name() == key || r.code() == key) {
                warn!("Configuration names unknown rule: {}", key);
            }
        }

        let rules: Vec<RuleBox> = self
            .rules
            .into_iter()
            .filter(|rule| {
                let enabled = config.is_rule_enabled(rule.name(), rule.code());
                if !enabled {
                    debug!("Skipping disabled rule: {} ({})", rule.name(), rule.code());
                }
                enabled
            })
            .collect();

        Ok(Validator {
            rules,
            config,
            policy,
        })
    }
}

/// Runs an ordered rule set against a manifest and assembles the [`Report`].
///
/// Use [`Validator::builder()`] to construct an instance.
pub struct Validator {
    rules: Vec<RuleBox>,
    config: Config,
    policy: FormPolicy,
}

impl Validator {
    /// Creates a new builder for configuring a validator.
    #[must_use]
    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    /// Returns the number of enabled rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Descriptors of the enabled rules, in run order.
    #[must_use]
    pub fn rules(&self) -> Vec<RuleInfo> {
        self.rules.iter().map(|r| r.info()).collect()
    }

    /// The policy this validator enforces.
    #[must_use]
    pub fn policy(&self) -> &FormPolicy {
        &self.policy
    }

    /// Loads the manifest at `path` and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed.
    pub fn validate(&self, path: &Path) -> Result<Report, ValidateError> {
        info!("Validating manifest {}", path.display());
        let manifest = manifest::load(path)?;
        Ok(self.validate_manifest(&manifest))
    }

    /// Validates manifest text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a YAML mapping.
    pub fn validate_source(&self, source: &str) -> Result<Report, ValidateError> {
        let manifest = manifest::parse(source)?;
        Ok(self.validate_manifest(&manifest))
    }

    /// Runs every enabled rule against an already loaded manifest.
    #[must_use]
    pub fn validate_manifest(&self, manifest: &Manifest) -> Report {
        let ctx = RuleContext::new(manifest, &self.policy);
        let mut findings = Vec::new();

        for rule in &self.rules {
            let rule_findings = rule.check(&ctx);
            debug!(
                "{} ({}) produced {} finding(s)",
                rule.code(),
                rule.name(),
                rule_findings.len()
            );
            findings.extend(self.apply_severity_override(rule.as_ref(), rule_findings));
        }

        let report = Report::build(self.rules(), findings);
        info!(
            "Validation complete: {} finding(s) from {} rule(s)",
            report.findings.len(),
            report.rules.len()
        );
        report
    }

    fn apply_severity_override(&self, rule: &dyn Rule, mut findings: Vec<Finding>) -> Vec<Finding> {
        if let Some(severity) = self.config.rule_severity(rule.name(), rule.code()) {
            for f in &mut findings {
                f.severity = severity;
            }
        }
        findings
    }
}
