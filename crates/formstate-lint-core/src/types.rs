//! Core types for lint findings and reports.

use serde::{Deserialize, Serialize};

/// Severity level for lint findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "warning" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "unknown severity `{other}`, expected: error, warning, info"
            )),
        }
    }
}

/// A single rule violation found in the manifest.
///
/// Findings are immutable once built; rules only ever append them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Rule code (e.g., "L1").
    pub code: String,
    /// Rule name (e.g., "form-applies-state").
    pub rule: String,
    /// Severity of this finding.
    pub severity: Severity,
    /// Ability (or other record) the finding is about.
    pub subject: String,
    /// Human-readable message.
    pub message: String,
    /// 1-indexed manifest line of the subject's declaration, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Optional hint on how to fix the finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Creates a new finding.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            subject: subject.into(),
            message: message.into(),
            line: None,
            suggestion: None,
        }
    }

    /// Attaches the manifest line of the subject's declaration.
    #[must_use]
    pub fn at_line(mut self, line: Option<usize>) -> Self {
        self.line = line;
        self
    }

    /// Adds a suggestion to this finding.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Formats the finding for multi-line terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("  [{}] {}: {}\n", self.code, self.subject, self.message);
        if let Some(line) = self.line {
            let _ = writeln!(output, "    = at: manifest line {line}");
        }
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "    = help: {suggestion}");
        }
        output
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.subject, self.message)
    }
}

/// Descriptor of a rule that took part in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleInfo {
    /// Rule code (e.g., "L3").
    pub code: String,
    /// Rule name (e.g., "no-banned-removal-tag").
    pub name: String,
    /// One-line description.
    pub description: String,
}

/// Result of validating a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// True iff no findings were produced.
    pub passed: bool,
    /// All findings, grouped by rule in run order.
    pub findings: Vec<Finding>,
    /// Rules that were evaluated, in run order.
    pub rules: Vec<RuleInfo>,
}

impl Report {
    /// Builds a report from the rules that ran and the findings they produced.
    ///
    /// Findings are grouped by rule in the order of `rules`; findings of the
    /// same rule keep their evaluation order. Findings whose code matches no
    /// listed rule sort last.
    #[must_use]
    pub fn build(rules: Vec<RuleInfo>, mut findings: Vec<Finding>) -> Self {
        let rank = |code: &str| {
            rules
                .iter()
                .position(|r| r.code == code)
                .unwrap_or(rules.len())
        };
        findings.sort_by_key(|f| rank(&f.code));

        Self {
            passed: findings.is_empty(),
            findings,
            rules,
        }
    }

    /// Counts findings by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |s: Severity| self.findings.iter().filter(|f| f.severity == s).count();
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Returns findings produced by the rule with the given code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.code == code).collect()
    }

    /// Checks if any findings meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_findings_at(&self, severity: Severity) -> bool {
        self.findings.iter().any(|f| f.severity >= severity)
    }
}
