//! Check command implementation.

use anyhow::{Context, Result};
use formstate_lint::rules::{all_rules, rule_by_name};
use formstate_lint::{RuleBox, ValidateError, Validator};
use std::path::Path;
use std::process::ExitCode;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Runs the check command.
pub fn run(
    manifest: Option<&Path>,
    format: OutputFormat,
    rules_filter: Option<&str>,
    source: &ConfigSource,
) -> Result<ExitCode> {
    let config = source.load().with_context(|| match source.path() {
        Some(p) => format!("Failed to load config: {}", p.display()),
        None => "Failed to load default config".to_string(),
    })?;

    let manifest_path = manifest.map_or_else(|| config.manifest_path(), Path::to_path_buf);
    if !manifest_path.exists() {
        eprintln!("ERROR: Manifest not found at {}", manifest_path.display());
        return Ok(ExitCode::FAILURE);
    }

    let rules = rules_filter.map_or_else(all_rules, select_rules);
    let docs = config.docs().to_string();

    let validator = match Validator::builder().rules(rules).config(config).build() {
        Ok(validator) => validator,
        Err(e) => return Ok(fatal(e)),
    };

    tracing::info!(
        "Checking {} with {} rules",
        manifest_path.display(),
        validator.rule_count()
    );

    let report = match validator.validate(&manifest_path) {
        Ok(report) => report,
        Err(e) => return Ok(fatal(e)),
    };

    super::output::print(&report, format, &docs)?;

    Ok(if report.passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Renders a precondition failure through miette.
fn fatal(error: ValidateError) -> ExitCode {
    eprintln!("{:?}", miette::Report::new(error));
    ExitCode::FAILURE
}

/// Picks rules by name or code, keeping registry order.
fn select_rules(filter: &str) -> Vec<RuleBox> {
    let mut wanted: Vec<RuleBox> = Vec::new();

    for key in filter.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        match rule_by_name(key) {
            Some(rule) if wanted.iter().any(|r| r.code() == rule.code()) => {}
            Some(rule) => wanted.push(rule),
            None => tracing::warn!("Unknown rule: {}", key),
        }
    }

    wanted.sort_by_key(|r| {
        all_rules()
            .iter()
            .position(|a| a.code() == r.code())
            .unwrap_or(usize::MAX)
    });
    wanted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(rules: &[RuleBox]) -> Vec<&'static str> {
        rules.iter().map(|r| r.code()).collect()
    }

    #[test]
    fn select_rules_keeps_registry_order() {
        let rules = select_rules("required-tag-closure, L1 ,l1,bogus");
        assert_eq!(codes(&rules), vec!["L1", "L4"]);
    }

    #[test]
    fn select_rules_empty_filter() {
        assert!(select_rules(" , ").is_empty());
    }
}
