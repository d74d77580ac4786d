//! Persistent key/value storage for fetched font bytes and provider metadata.
//!
//! Keys are `:`-separated (`data:fonts:roboto-abc123.woff2`). Entries are never invalidated by the
//! engine; clearing the store is left to the host.

use crate::{Error, Result};
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Default on-disk location, relative to the project root.
pub const DEFAULT_CACHE_BASE: &str = "node_modules/.cache/fontless";

pub trait CacheStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set_raw(&self, key: &str, value: &[u8]) -> Result<()>;
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).set_raw(key, value)
    }
}

/// JSON helpers on top of the raw byte interface.
pub trait CacheStoreExt: CacheStore {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set_raw(key, &bytes)
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

/// Filesystem store: each key segment becomes a path component under `base`.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    base: PathBuf,
}

impl Default for FsCacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_BASE)
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl FsCacheStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The file backing `key`. Segments that could escape `base` are dropped.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let mut path = self.base.clone();
        for segment in key.split([':', '/', '\\']) {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            path.push(segment);
        }
        path
    }

    fn write_atomic(path: &Path, value: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(
            ".{name}.tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&tmp, value)?;
        if let Err(err) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(err);
        }
        Ok(())
    }
}

impl CacheStore for FsCacheStore {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(Error::Cache {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        Self::write_atomic(&self.path_for(key), value).map_err(|source| Error::Cache {
            key: key.to_string(),
            source,
        })
    }
}

/// In-process store, mainly for tests and one-shot builds.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<FxHashMap<String, Vec<u8>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl CacheStore for MemoryCacheStore {
    fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    fn set_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}
