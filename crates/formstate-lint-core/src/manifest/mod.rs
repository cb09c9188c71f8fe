//! Manifest access: loading, the structured graph view, and the raw-text view.
//!
//! ```text
//! manifest.yaml
//!   ↓ loader (split documents/sections, merge fragments)
//! Manifest
//!   ├─ Document  (structured: abilities, effects, event graphs)
//!   └─ RawText   (text: ability blocks, declarations)
//! ```

pub mod loader;
pub mod model;
pub mod raw;

pub use loader::{load, parse, LoadError};
pub use model::{Ability, Connection, Document, Effect, EventGraph, Node, NodeId};
pub use raw::{extract_ability_block, AbilityBlock, Declaration, RawText};

/// An immutable snapshot of one manifest: the merged tree and the text it
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub(crate) document: Document,
    pub(crate) raw: RawText,
}

impl Manifest {
    /// The merged structured tree.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The manifest text as read.
    #[must_use]
    pub fn raw(&self) -> &RawText {
        &self.raw
    }
}
