#![forbid(unsafe_code)]

//! CSS plumbing for `fontless` (headless, position-preserving).
//!
//! Tokens come from `cssparser`; the syntax tree keeps the byte range of every node.
//!
//! - [`tokenizer::tokenize`] flattens CSS into offset-carrying tokens
//! - [`parse`] builds a [`StyleSheet`] where every node keeps its byte range in the input
//! - [`walk`] visits declarations and raw fragments together with their enclosing at-rule
//! - [`families`] pulls family names, generic keywords and splice offsets out of declarations
//! - [`SourceEditor`] applies insert-only edits and emits a v3 [`SourceMap`]

pub mod ast;
pub mod error;
pub mod families;
mod parser;
mod sourcemap;
mod splice;
pub mod tokenizer;
pub mod walk;

pub use ast::{
    AtRule, Block, Declaration, Node, Raw, Rule, StyleSheet, Value, ValueKind, ValueList,
    ValueNode,
};
pub use error::{Error, Result};
pub use families::{
    GenericFamily, extract_end_of_first_child, extract_font_families, extract_generic,
};
pub use parser::parse;
pub use sourcemap::SourceMap;
pub use splice::{SourceEditor, SourceMapOptions};
pub use walk::{WalkContext, walk_declarations, walk_raws};

/// A half-open byte range into parsed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shifts the span by `offset`, e.g. to map a re-parsed fragment back into its document.
    pub fn offset(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }
}

#[cfg(test)]
mod tests;
