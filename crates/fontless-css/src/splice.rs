//! Insert-only text editing with source map generation.
//!
//! The injector never deletes or rewrites authored CSS; it only prepends generated rules and
//! inserts fallback family names at recorded offsets. [`SourceEditor`] models exactly that and
//! can describe the result as a v3 source map.

use crate::sourcemap::{MappingsBuilder, SourceMap};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct SourceEditor<'a> {
    original: &'a str,
    intro: String,
    /// Text inserted before the original character at each offset.
    inserts: BTreeMap<usize, String>,
}

#[derive(Debug, Clone, Default)]
pub struct SourceMapOptions {
    /// Name recorded in `sources`.
    pub source: Option<String>,
    pub file: Option<String>,
    pub include_content: bool,
    /// Map every character instead of only chunk and line starts.
    pub hires: bool,
}

impl<'a> SourceEditor<'a> {
    pub fn new(original: &'a str) -> Self {
        Self {
            original,
            intro: String::new(),
            inserts: BTreeMap::new(),
        }
    }

    pub fn original(&self) -> &'a str {
        self.original
    }

    /// Adds text at the very start of the output, before anything prepended earlier.
    pub fn prepend(&mut self, text: &str) -> &mut Self {
        self.intro.insert_str(0, text);
        self
    }

    /// Inserts text at `index`, before anything previously inserted at the same index.
    ///
    /// Offsets past the end are clamped; offsets inside a multi-byte character move back to the
    /// character's start.
    pub fn prepend_left(&mut self, index: usize, text: &str) -> &mut Self {
        let mut index = index.min(self.original.len());
        while !self.original.is_char_boundary(index) {
            index -= 1;
        }
        self.inserts.entry(index).or_default().insert_str(0, text);
        self
    }

    /// Inserts text at `index`, after anything previously inserted at the same index.
    pub fn append_left(&mut self, index: usize, text: &str) -> &mut Self {
        let mut index = index.min(self.original.len());
        while !self.original.is_char_boundary(index) {
            index -= 1;
        }
        self.inserts.entry(index).or_default().push_str(text);
        self
    }

    pub fn has_changed(&self) -> bool {
        !self.intro.is_empty() || self.inserts.values().any(|s| !s.is_empty())
    }

    /// Iterates output pieces as `(text, original offset or None for inserted text)`.
    fn pieces(&self) -> Vec<(&str, Option<usize>)> {
        let mut out = Vec::with_capacity(self.inserts.len() * 2 + 2);
        if !self.intro.is_empty() {
            out.push((self.intro.as_str(), None));
        }
        let mut last = 0;
        for (&at, text) in &self.inserts {
            if at > last {
                out.push((&self.original[last..at], Some(last)));
            }
            if !text.is_empty() {
                out.push((text.as_str(), None));
            }
            last = at;
        }
        if last < self.original.len() {
            out.push((&self.original[last..], Some(last)));
        }
        out
    }

    pub fn generate_map(&self, options: &SourceMapOptions) -> SourceMap {
        let mut builder = MappingsBuilder::new(self.original);
        for (text, origin) in self.pieces() {
            match origin {
                None => builder.advance_unmapped(text),
                Some(start) => builder.advance_mapped(text, start, options.hires),
            }
        }
        SourceMap {
            version: 3,
            file: options.file.clone(),
            sources: vec![options.source.clone().unwrap_or_default()],
            sources_content: vec![
                options
                    .include_content
                    .then(|| self.original.to_string()),
            ],
            names: Vec::new(),
            mappings: builder.finish(),
        }
    }
}

impl std::fmt::Display for SourceEditor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (text, _) in self.pieces() {
            f.write_str(text)?;
        }
        Ok(())
    }
}
