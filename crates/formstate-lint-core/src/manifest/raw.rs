//! Raw-text view of the manifest.
//!
//! Some properties span several lines in ways the structured tree collapses,
//! and some records are lost entirely when the tree is ambiguous. The raw view
//! finds an ability's declaration by text and hands rules the substring that
//! belongs to it, independent of exact tree shape.

use std::collections::{HashMap, HashSet};

/// Top-level key under which abilities are declared.
pub const ABILITIES_SECTION: &str = "gameplay_abilities";

/// Top-level key under which effects are declared.
pub const EFFECTS_SECTION: &str = "gameplay_effects";

/// The manifest text, indexed by `- name: X` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawText {
    text: String,
    blocks: HashMap<String, Span>,
}

/// Byte range and first line of a declaration block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start: usize,
    end: usize,
    line: usize,
}

impl RawText {
    /// Wraps manifest text and indexes its declarations in one pass.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let blocks = index_blocks(&text);
        Self { text, blocks }
    }

    /// Returns the full text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Extracts the block declaring `name`. Same result as
    /// [`extract_ability_block`], served from the index.
    #[must_use]
    pub fn extract_ability_block(&self, name: &str) -> Option<AbilityBlock<'_>> {
        let (name, span) = self.blocks.get_key_value(name)?;
        Some(AbilityBlock {
            name: name.as_str(),
            text: &self.text[span.start..span.end],
            line: span.line,
        })
    }

    /// Names declared as abilities, in text order.
    #[must_use]
    pub fn ability_names(&self) -> Vec<Declaration<'_>> {
        declared_names(&self.text, ABILITIES_SECTION)
    }

    /// Names declared as effects, in text order.
    #[must_use]
    pub fn effect_names(&self) -> Vec<Declaration<'_>> {
        declared_names(&self.text, EFFECTS_SECTION)
    }
}

/// A `- name: X` declaration found in the raw text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    /// Declared name.
    pub name: &'a str,
    /// 1-indexed line of the declaration.
    pub line: usize,
}

/// The slice of raw text belonging to one ability declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbilityBlock<'a> {
    name: &'a str,
    text: &'a str,
    line: usize,
}

impl<'a> AbilityBlock<'a> {
    /// The declared name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the block text, starting at the declaration line.
    #[must_use]
    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// 1-indexed line of the declaration.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Whether any line of the block reads `function: <function>`.
    #[must_use]
    pub fn has_function(&self, function: &str) -> bool {
        has_key_value(self.text, "function", function)
    }

    /// Whether any line of the block reads `literal_value: <value>` exactly.
    #[must_use]
    pub fn has_literal_value(&self, value: &str) -> bool {
        has_key_value(self.text, "literal_value", value)
    }

    /// Whether a single node item in the block carries both
    /// `function: <apply_function>` and `gameplay_effect_class: <effect>`.
    ///
    /// Node items are delimited by list-item lines (`- ...`), so the two
    /// properties may appear in either order but must belong to one node.
    #[must_use]
    pub fn applies_effect(&self, apply_function: &str, effect: &str) -> bool {
        self.applied_effects(apply_function)
            .iter()
            .any(|applied| *applied == effect)
    }

    /// Every `gameplay_effect_class` of a node item whose function is
    /// `apply_function`, in text order.
    #[must_use]
    pub fn applied_effects(&self, apply_function: &str) -> Vec<&'a str> {
        list_items(self.text)
            .filter(|item| has_key_value(item, "function", apply_function))
            .flat_map(|item| values(item, "gameplay_effect_class"))
            .collect()
    }
}

/// Finds the first declaration line of `name` and returns the text from that
/// line up to, but excluding, the next non-blank, non-comment line indented
/// at or left of the declaration (the next sibling or the end of the
/// enclosing section). Runs to end of text when nothing follows.
#[must_use]
pub fn extract_ability_block<'a>(raw: &'a str, name: &str) -> Option<AbilityBlock<'a>> {
    let mut offset = 0;
    let mut found = None;
    for (idx, line) in raw.split_inclusive('\n').enumerate() {
        match declaration(line) {
            Some((indent, declared)) if declared == name => {
                found = Some((offset, idx + 1, indent, declared));
                break;
            }
            _ => offset += line.len(),
        }
    }
    let (start, line, indent, name) = found?;

    let mut end = raw.len();
    let mut offset = line_end(raw, start);
    while offset < raw.len() {
        let next = line_end(raw, offset);
        let current = &raw[offset..next];
        if !is_blank_or_comment(current) && indent_of(current) <= indent {
            end = offset;
            break;
        }
        offset = next;
    }

    Some(AbilityBlock {
        name,
        text: &raw[start..end],
        line,
    })
}

/// A declaration whose block is still open while indexing.
struct OpenBlock<'t> {
    name: &'t str,
    indent: usize,
    start: usize,
    line: usize,
}

/// Indexes the first declaration of every name, at any depth.
///
/// A block closes at the first later non-blank, non-comment line indented at
/// or left of its declaration, so the open blocks form a stack with strictly
/// increasing indents.
fn index_blocks(text: &str) -> HashMap<String, Span> {
    let mut blocks = HashMap::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut open: Vec<OpenBlock<'_>> = Vec::new();
    let mut offset = 0;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if !is_blank_or_comment(line) {
            let indent = indent_of(line);
            while let Some(block) = open.pop() {
                if block.indent < indent {
                    open.push(block);
                    break;
                }
                close(&mut blocks, &block, offset);
            }
            if let Some((indent, name)) = declaration(line) {
                if seen.insert(name) {
                    open.push(OpenBlock {
                        name,
                        indent,
                        start: offset,
                        line: idx + 1,
                    });
                }
            }
        }
        offset += line.len();
    }

    for block in open.drain(..) {
        close(&mut blocks, &block, text.len());
    }
    blocks
}

fn close(blocks: &mut HashMap<String, Span>, block: &OpenBlock<'_>, end: usize) {
    blocks.insert(
        block.name.to_string(),
        Span {
            start: block.start,
            end,
            line: block.line,
        },
    );
}

/// Collects `- name: X` declarations that are direct items of every
/// top-level `section:` in `raw`.
fn declared_names<'a>(raw: &'a str, section: &str) -> Vec<Declaration<'a>> {
    let mut names = Vec::new();
    let header = format!("{section}:");
    let mut in_section = false;
    let mut item_indent: Option<usize> = None;

    for (idx, line) in raw.lines().enumerate() {
        if is_blank_or_comment(line) {
            continue;
        }
        if line.starts_with("---") || line.starts_with("...") {
            in_section = false;
            continue;
        }
        if is_top_level_key(line) {
            in_section = strip_comment(line).trim_end() == header;
            item_indent = None;
            continue;
        }
        if !in_section {
            continue;
        }

        let indent = indent_of(line);
        let trimmed = line.trim_start();
        if !trimmed.starts_with('-') {
            continue;
        }
        let expected = *item_indent.get_or_insert(indent);
        if indent != expected {
            continue;
        }
        if let Some((_, name)) = declaration(line) {
            names.push(Declaration {
                name,
                line: idx + 1,
            });
        }
    }

    names
}

/// Parses a `- name: X` list-item line into its indent and `X`.
///
/// The name may be quoted and followed by a `#` comment.
fn declaration(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let indent = indent_of(line);
    let rest = line[indent..].strip_prefix('-')?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let value = rest
        .trim_start_matches([' ', '\t'])
        .strip_prefix("name:")?;
    let value = value.split('#').next().unwrap_or(value);
    let value = value.trim_matches([' ', '\t']);
    let value = value.strip_prefix(['"', '\'']).unwrap_or(value);
    let value = value.strip_suffix(['"', '\'']).unwrap_or(value);
    (!value.is_empty()).then_some((indent, value))
}

/// Values of every `key: value` line in `text`, optionally as a list item,
/// quoted, or followed by a comment.
fn values<'t>(text: &'t str, key: &'t str) -> impl Iterator<Item = &'t str> + 't {
    text.lines().filter_map(move |line| {
        let mut trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix("- ") {
            trimmed = rest.trim_start();
        }
        let rest = trimmed.strip_prefix(key)?.strip_prefix(':')?;
        Some(unquote(strip_comment(rest).trim()))
    })
}

fn has_key_value(text: &str, key: &str, value: &str) -> bool {
    values(text, key).any(|v| v == value)
}

/// Splits `text` into chunks that each start at a list-item line.
fn list_items(text: &str) -> impl Iterator<Item = &str> {
    let mut starts: Vec<usize> = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with("- ") {
            starts.push(offset);
        }
        offset += line.len();
    }
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    let ends: Vec<usize> = starts.iter().skip(1).copied().chain([text.len()]).collect();
    starts
        .into_iter()
        .zip(ends)
        .map(move |(start, end)| &text[start..end])
}

fn is_top_level_key(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| !c.is_whitespace() && !matches!(c, '-' | '#' | ']' | '}' | ','))
}

fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

fn strip_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(idx) => &value[..idx],
        None => value,
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && ((bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Byte offset just past the line containing `offset`.
fn line_end(raw: &str, offset: usize) -> usize {
    raw[offset..]
        .find('\n')
        .map_or(raw.len(), |idx| offset + idx + 1)
}
