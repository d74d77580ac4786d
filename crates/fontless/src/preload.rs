//! Tracking which font URLs each module wants preloaded.

use crate::font::FontFaceDescriptor;
use indexmap::{IndexMap, IndexSet};
use std::sync::{Arc, Mutex, PoisonError};

/// Host predicate deciding whether the primary face of a family should be preloaded.
pub type ShouldPreload = Arc<dyn Fn(&str, &FontFaceDescriptor) -> bool + Send + Sync>;

/// Module id -> ordered set of URLs to preload.
///
/// Entries only grow: URLs are never removed and chunk merges are additive.
#[derive(Debug, Default)]
pub struct PreloadRegistry {
    entries: Mutex<IndexMap<String, IndexSet<String>>>,
}

impl PreloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, id: &str, url: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.to_string())
            .or_default()
            .insert(url.to_string());
    }

    pub fn get(&self, id: &str) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .map(|urls| urls.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Folds the preload sets of a chunk's modules into the chunk's entry module.
    pub fn merge_chunk<'a>(&self, entry_id: &str, module_ids: impl IntoIterator<Item = &'a str>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut merged: IndexSet<String> = IndexSet::new();
        for id in module_ids {
            if id == entry_id {
                continue;
            }
            if let Some(urls) = entries.get(id) {
                merged.extend(urls.iter().cloned());
            }
        }
        if merged.is_empty() {
            return;
        }
        entries
            .entry(entry_id.to_string())
            .or_default()
            .extend(merged);
    }

    pub fn snapshot(&self) -> IndexMap<String, Vec<String>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, urls)| (id.clone(), urls.iter().cloned().collect()))
            .collect()
    }
}
