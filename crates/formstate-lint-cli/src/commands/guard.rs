//! Guard command: blocks commits that touch locked files.
//!
//! Meant to run from a `commit-msg` hook. Locked paths are glob patterns
//! relative to the repository root, matched fnmatch-style (`*` also matches
//! `/`). A commit touching any of them passes only when its message contains
//! the bypass token.

use anyhow::{bail, Context, Result};
use formstate_lint::GuardConfig;
use glob::Pattern;
use std::fmt::Write;
use std::path::Path;
use std::process::{Command, ExitCode};

use crate::config_resolver::ConfigSource;

/// Outcome of checking one commit.
#[derive(Debug, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// No locked file is staged.
    Clean,
    /// Locked files are staged and the message carries the token.
    Bypassed,
    /// Locked files are staged without the token.
    Blocked(Vec<&'a str>),
}

/// Compiled locked-path patterns plus the bypass token.
#[derive(Debug)]
pub struct LockedGuard {
    patterns: Vec<Pattern>,
    bypass_token: String,
}

impl LockedGuard {
    /// Compiles the configured patterns.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not a valid glob.
    pub fn new(config: &GuardConfig) -> Result<Self> {
        let patterns = config
            .locked
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("Invalid locked pattern `{p}`")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            patterns,
            bypass_token: config.bypass_token.clone(),
        })
    }

    /// Staged paths that match a locked pattern, in input order.
    #[must_use]
    pub fn locked_paths<'a>(&self, staged: &'a [String]) -> Vec<&'a str> {
        staged
            .iter()
            .map(String::as_str)
            .filter(|path| self.patterns.iter().any(|p| p.matches(path)))
            .collect()
    }

    /// Whether the commit message at `path` carries the bypass token.
    /// An unreadable message never bypasses.
    #[must_use]
    pub fn has_bypass(&self, path: &Path) -> bool {
        match std::fs::read_to_string(path) {
            Ok(message) => message.contains(&self.bypass_token),
            Err(e) => {
                tracing::debug!("Cannot read commit message {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Decides whether a commit of `staged` with the message at
    /// `commit_msg` may proceed.
    #[must_use]
    pub fn evaluate<'a>(&self, commit_msg: &Path, staged: &'a [String]) -> Verdict<'a> {
        let locked = self.locked_paths(staged);
        if locked.is_empty() {
            Verdict::Clean
        } else if self.has_bypass(commit_msg) {
            Verdict::Bypassed
        } else {
            Verdict::Blocked(locked)
        }
    }
}

/// Runs the guard command.
pub fn run(commit_msg: Option<&Path>, staged: Vec<String>, source: &ConfigSource) -> Result<ExitCode> {
    let Some(commit_msg) = commit_msg else {
        eprintln!("formstate-lint guard: missing commit message path");
        eprintln!("Usage: formstate-lint guard <COMMIT_MSG_FILE> [--staged <PATH>...]");
        return Ok(ExitCode::FAILURE);
    };

    let config = source.load().context("Failed to load config")?;
    let guard = LockedGuard::new(&config.guard)?;

    let staged = if staged.is_empty() {
        staged_files()?
    } else {
        staged
    };

    match guard.evaluate(commit_msg, &staged) {
        Verdict::Clean => {
            tracing::debug!("No locked files among {} staged path(s)", staged.len());
            Ok(ExitCode::SUCCESS)
        }
        Verdict::Bypassed => {
            println!("LOCKED GUARD: bypass token present; allowing locked changes.");
            Ok(ExitCode::SUCCESS)
        }
        Verdict::Blocked(locked) => {
            print!("{}", blocked_message(&locked, &guard.bypass_token));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Paths staged in the current git index.
fn staged_files() -> Result<Vec<String>> {
    let output = Command::new("git")
        .args(["diff", "--cached", "--name-only"])
        .output()
        .context("Failed to run git")?;

    if !output.status.success() {
        bail!(
            "git diff --cached failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(parse_name_only(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_name_only(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn blocked_message(locked: &[&str], token: &str) -> String {
    let rule = "=".repeat(60);
    let mut out = format!("\n{rule}\nLOCKED GUARD: COMMIT BLOCKED\n{rule}\n");
    out.push_str("\nYou have staged changes to LOCKED files:\n");
    for path in locked {
        let _ = writeln!(out, "  - {path}");
    }
    out.push_str("\nThese files implement safety-critical invariants.\n");
    out.push_str("See: ClaudeContext/Handoffs/LOCKED_CONTRACTS.md\n");
    out.push_str("\nIf this change is intentional and reviewed, add this token\n");
    out.push_str("to your commit message:\n");
    let _ = writeln!(out, "\n  {token}\n\n{rule}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> LockedGuard {
        LockedGuard::new(&GuardConfig::default()).unwrap()
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn matches_exact_and_folder_globs() {
        let staged = paths(&[
            "README.md",
            "Source/GasAbilityGenerator/Public/GasAbilityGeneratorGenerators.h",
            "Source/GasAbilityGenerator/Private/XLSXSupport/Sync/Merge.cpp",
            "Source/GasAbilityGenerator/Private/Other.cpp",
        ]);
        assert_eq!(
            guard().locked_paths(&staged),
            vec![
                "Source/GasAbilityGenerator/Public/GasAbilityGeneratorGenerators.h",
                "Source/GasAbilityGenerator/Private/XLSXSupport/Sync/Merge.cpp",
            ]
        );
    }

    #[test]
    fn bypass_requires_exact_token() {
        let dir = tempfile::tempdir().unwrap();
        let msg = dir.path().join("COMMIT_EDITMSG");
        let guard = guard();

        std::fs::write(&msg, "Fix merge\n\n[LOCKED-CHANGE-APPROVED]\n").unwrap();
        assert!(guard.has_bypass(&msg));

        std::fs::write(&msg, "Fix merge [locked-change-approved]\n").unwrap();
        assert!(!guard.has_bypass(&msg));

        assert!(!guard.has_bypass(&dir.path().join("missing")));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let config = GuardConfig {
            bypass_token: "[OK]".to_string(),
            locked: vec!["Source/[".to_string()],
        };
        assert!(LockedGuard::new(&config).is_err());
    }

    #[test]
    fn parses_git_name_only_output() {
        assert_eq!(
            parse_name_only("a.txt\n\n  b/c.h  \n"),
            vec!["a.txt".to_string(), "b/c.h".to_string()]
        );
    }

    #[test]
    fn blocked_message_lists_files_and_token() {
        let message = blocked_message(&["Locked/A.h"], "[OK]");
        assert!(message.contains("COMMIT BLOCKED"));
        assert!(message.contains("  - Locked/A.h\n"));
        assert!(message.contains("\n  [OK]\n"));
    }

    #[test]
    fn evaluate_orders_clean_bypass_blocked() {
        let dir = tempfile::tempdir().unwrap();
        let msg = dir.path().join("msg");
        std::fs::write(&msg, "Touch docs\n").unwrap();
        let guard = guard();

        let clean = paths(&["README.md"]);
        assert_eq!(guard.evaluate(&msg, &clean), Verdict::Clean);

        let locked = paths(&["README.md", "ClaudeContext/Handoffs/LOCKED_SYSTEMS.md"]);
        assert_eq!(
            guard.evaluate(&msg, &locked),
            Verdict::Blocked(vec!["ClaudeContext/Handoffs/LOCKED_SYSTEMS.md"])
        );

        std::fs::write(&msg, "Touch docs [LOCKED-CHANGE-APPROVED]\n").unwrap();
        assert_eq!(guard.evaluate(&msg, &locked), Verdict::Bypassed);
    }
}
