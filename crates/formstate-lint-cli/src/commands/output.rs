//! Shared output formatting for lint reports.

use anyhow::Result;
use formstate_lint::Report;
use std::fmt::Write;

use crate::OutputFormat;

/// Print a report in the specified format.
pub fn print(report: &Report, format: OutputFormat, docs: &str) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(report, docs),
        OutputFormat::Json => render_json(report)?,
        OutputFormat::Compact => render_compact(report),
    };
    print!("{rendered}");
    Ok(())
}

fn render_text(report: &Report, docs: &str) -> String {
    let mut out = String::new();

    if report.passed {
        out.push_str("PASS: All lint rules passed\n\nChecked:\n");
        for rule in &report.rules {
            let _ = writeln!(out, "  {}: {}", rule.code, rule.description);
        }
        return out;
    }

    let _ = writeln!(out, "FAIL: {} error(s) found\n", report.findings.len());
    for finding in &report.findings {
        out.push_str(&finding.format());
    }
    let _ = writeln!(out, "\nSee {docs} for details");
    out
}

fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)? + "\n")
}

fn render_compact(report: &Report) -> String {
    report
        .findings
        .iter()
        .map(|finding| format!("{finding}\n"))
        .collect()
}
