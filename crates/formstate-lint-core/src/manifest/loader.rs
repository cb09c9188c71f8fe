//! Manifest loading and fragment merging.
//!
//! A manifest may hold several `---` separated documents, and a single
//! document may repeat a top-level key (which strict YAML rejects). Both are
//! treated as fragments and merged left to right: sequences concatenate,
//! anything else is replaced by the later value.

use miette::Diagnostic;
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::model::Document;
use super::raw::RawText;
use super::Manifest;

/// Errors that make a manifest unusable. These are preconditions of a run,
/// not lint findings.
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum LoadError {
    /// The manifest could not be read.
    #[error("Failed to read manifest {path}: {source}")]
    #[diagnostic(
        code(formstate_lint::load::io),
        help("check the path or pass --manifest <PATH>")
    )]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The manifest is not well-formed YAML.
    #[error("Failed to parse manifest{}: {message}", .line.map(|l| format!(" at line {l}")).unwrap_or_default())]
    #[diagnostic(code(formstate_lint::load::parse))]
    Parse {
        /// Parser message.
        message: String,
        /// 1-indexed line in the full manifest, when the parser reports one.
        line: Option<usize>,
    },

    /// A document's root is not a mapping.
    #[error("Manifest document {index} is not a mapping")]
    #[diagnostic(
        code(formstate_lint::load::not_a_mapping),
        help("the manifest must be a mapping with gameplay_abilities / gameplay_effects keys")
    )]
    NotAMapping {
        /// 1-indexed document number.
        index: usize,
    },
}

/// Reads and parses the manifest at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, or a parse error if
/// the content is not a YAML mapping.
pub fn load(path: &Path) -> Result<Manifest, LoadError> {
    debug!("Loading manifest: {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(text)
}

/// Parses manifest text into both the merged tree and the raw view.
///
/// # Errors
///
/// Returns a parse error if neither a document nor its top-level sections
/// parse as YAML, or if a document's root is not a mapping.
pub fn parse(text: impl Into<String>) -> Result<Manifest, LoadError> {
    let text = text.into();
    let mut root = Mapping::new();
    let mut fragments = 0;

    for (index, chunk) in split_documents(&text).into_iter().enumerate() {
        for fragment in parse_document(chunk, index + 1)? {
            merge_into(&mut root, fragment);
            fragments += 1;
        }
    }

    debug!("Merged {} manifest fragment(s)", fragments);

    Ok(Manifest {
        document: Document::new(root),
        raw: RawText::new(text),
    })
}

/// Merges `fragment` into `target`: for each key, two sequences concatenate
/// in order; otherwise the fragment's value wins.
pub fn merge_into(target: &mut Mapping, fragment: Mapping) {
    for (key, value) in fragment {
        match (target.get_mut(&key), value) {
            (Some(Value::Sequence(existing)), Value::Sequence(more)) => existing.extend(more),
            (Some(slot), value) => *slot = value,
            (None, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// A slice of the manifest text plus the line it starts on.
#[derive(Debug, Clone, Copy)]
struct Chunk<'a> {
    text: &'a str,
    first_line: usize,
}

/// Splits on `---` / `...` marker lines.
fn split_documents(text: &str) -> Vec<Chunk<'_>> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut first_line = 1;
    let mut offset = 0;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        let marker = line.trim_end();
        if marker == "---" || marker.starts_with("--- ") || marker == "..." {
            chunks.push(Chunk {
                text: &text[start..offset],
                first_line,
            });
            start = offset + line.len();
            first_line = idx + 2;
        }
        offset += line.len();
    }
    chunks.push(Chunk {
        text: &text[start..],
        first_line,
    });

    chunks
}

/// Parses one document into merge-ready fragments. Empty documents yield
/// none.
fn parse_document(chunk: Chunk<'_>, index: usize) -> Result<Vec<Mapping>, LoadError> {
    if chunk.text.lines().all(is_blank_or_comment) {
        return Ok(Vec::new());
    }

    let sections = split_sections(chunk);

    if has_duplicate_keys(&sections) {
        debug!("Document {} repeats top-level keys, parsing per section", index);
        return parse_sections(&sections, index);
    }

    match serde_yaml::from_str::<Value>(chunk.text) {
        Ok(value) => Ok(as_root(value, index)?.into_iter().collect()),
        Err(e) if sections.len() > 1 => {
            debug!("Document {} failed as a whole ({}), parsing per section", index, e);
            parse_sections(&sections, index).map_err(|_| parse_error(&e, chunk.first_line))
        }
        Err(e) => Err(parse_error(&e, chunk.first_line)),
    }
}

fn parse_sections(sections: &[Section<'_>], index: usize) -> Result<Vec<Mapping>, LoadError> {
    let mut fragments = Vec::new();
    for section in sections {
        let value = serde_yaml::from_str::<Value>(section.chunk.text)
            .map_err(|e| parse_error(&e, section.chunk.first_line))?;
        fragments.extend(as_root(value, index)?);
    }
    Ok(fragments)
}

fn as_root(value: Value, index: usize) -> Result<Option<Mapping>, LoadError> {
    match value {
        Value::Null => Ok(None),
        Value::Mapping(map) => Ok(Some(map)),
        _ => Err(LoadError::NotAMapping { index }),
    }
}

fn parse_error(e: &serde_yaml::Error, first_line: usize) -> LoadError {
    LoadError::Parse {
        message: e.to_string(),
        line: e.location().map(|loc| loc.line() + first_line - 1),
    }
}

/// A top-level key and the text that belongs to it.
#[derive(Debug, Clone, Copy)]
struct Section<'a> {
    key: &'a str,
    chunk: Chunk<'a>,
}

/// Splits a document at column-0 key lines. Text before the first key
/// (comments, blank lines) is dropped.
fn split_sections(chunk: Chunk<'_>) -> Vec<Section<'_>> {
    let text = chunk.text;
    let mut starts: Vec<(usize, usize, &str)> = Vec::new();
    let mut offset = 0;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if let Some(key) = top_level_key(line) {
            starts.push((offset, chunk.first_line + idx, key));
        }
        offset += line.len();
    }

    let ends: Vec<usize> = starts
        .iter()
        .skip(1)
        .map(|(start, _, _)| *start)
        .chain([text.len()])
        .collect();

    starts
        .into_iter()
        .zip(ends)
        .map(|((start, first_line, key), end)| Section {
            key,
            chunk: Chunk {
                text: &text[start..end],
                first_line,
            },
        })
        .collect()
}

fn top_level_key(line: &str) -> Option<&str> {
    let first = line.chars().next()?;
    if first.is_whitespace() || matches!(first, '-' | '#' | ']' | '}' | ',' | '%') {
        return None;
    }
    let (key, _) = line.split_once(':')?;
    Some(key.trim().trim_matches(|c| c == '"' || c == '\''))
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn has_duplicate_keys(sections: &[Section<'_>]) -> bool {
    let mut seen = HashSet::new();
    sections.iter().any(|s| !seen.insert(s.key))
}
