//! Rewriting remote font URLs to locally served assets.

use crate::cache::CacheStore;
use crate::fetch::FontFetcher;
use crate::font::{FontFaceDescriptor, RemoteSource, SourceRef, extension_for_format, has_protocol};
use crate::hash::content_hash;
use crate::{Error, Result};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Cache key of a downloaded font file.
pub fn font_cache_key(filename: &str) -> String {
    format!("data:fonts:{filename}")
}

/// Stable local filename for a remote source: `<basename>-<hash><ext>`.
///
/// The basename is the percent-decoded last URL path segment without its extension and leading
/// dashes; the extension comes from the path, else from the declared format.
pub fn asset_filename(source: &RemoteSource) -> String {
    let path = url_path(&source.url);
    let encoded = path.rsplit('/').next().unwrap_or_default();
    let last = percent_decode_str(encoded)
        .decode_utf8_lossy()
        .replace(['/', '\\'], "-");
    let (stem, ext) = match last.rfind('.') {
        Some(dot) if dot > 0 => (&last[..dot], Some(&last[dot..])),
        _ => (last.as_str(), None),
    };
    let ext = ext
        .or_else(|| source.format.as_deref().and_then(extension_for_format))
        .unwrap_or_default();
    let stem = stem.trim_start_matches('-');
    let hashed = format!("{}{ext}", content_hash(source));
    if stem.is_empty() {
        hashed
    } else {
        format!("{stem}-{hashed}")
    }
}

fn url_path(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
    }
}

/// Joins URL segments with single slashes, keeping a leading slash on `base`.
pub fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    match (base.is_empty(), path.is_empty()) {
        (true, _) => format!("/{path}"),
        (_, true) => base.to_string(),
        _ => format!("{base}/{path}"),
    }
}

/// Like [`join_url`], resolving `.` and `..` segments (relative bases stay relative).
pub fn join_relative_url(base: &str, path: &str) -> String {
    let absolute = base.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(path.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// A font file ready to be written to the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedAsset {
    pub filename: String,
    /// The remote URL the bytes came from.
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Registry of rewritten font URLs (`filename -> original URL`) for one build.
#[derive(Debug)]
pub struct AssetRegistry {
    prefix: String,
    dev: bool,
    rendered: Mutex<IndexMap<String, String>>,
}

impl AssetRegistry {
    pub fn new(prefix: impl Into<String>, dev: bool) -> Self {
        Self {
            prefix: prefix.into(),
            dev,
            rendered: Mutex::new(IndexMap::new()),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Snapshot of `filename -> original URL` in registration order.
    pub fn rendered_urls(&self) -> Vec<(String, String)> {
        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(file, url)| (file.clone(), url.clone()))
            .collect()
    }

    /// Normalizes faces: single values become lists and remote sources are rewritten to
    /// `<prefix>/<filename>`, remembering their original URL.
    pub fn normalize(&self, faces: &[FontFaceDescriptor]) -> Vec<FontFaceDescriptor> {
        faces
            .iter()
            .map(|face| {
                let mut face = face.clone();
                face.src = face
                    .src
                    .into_iter()
                    .map(|source| self.normalize_source(source))
                    .collect();
                face
            })
            .collect()
    }

    pub fn normalize_source(&self, source: SourceRef) -> SourceRef {
        let mut remote = match source {
            SourceRef::Remote(remote) => remote,
            local => return local,
        };
        if !has_protocol(&remote.url, true) {
            return SourceRef::Remote(remote);
        }
        if let Some(rest) = remote.url.strip_prefix("//") {
            remote.url = format!("https://{rest}");
        }
        // The hash covers the source as resolved, before any rewrite bookkeeping.
        remote.original_url = None;
        let file = asset_filename(&remote);

        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.clone(), remote.url.clone());
        remote.original_url = Some(remote.url.clone());
        remote.url = if self.dev {
            join_relative_url(&self.prefix, &file)
        } else {
            join_url(&self.prefix, &file)
        };
        SourceRef::Remote(remote)
    }

    /// Loads every registered font from the cache, fetching and caching the missing ones.
    ///
    /// All entries are returned, cache hits included. A failed fetch aborts the whole step.
    pub async fn materialize(
        &self,
        cache: &dyn CacheStore,
        fetcher: Option<&dyn FontFetcher>,
    ) -> Result<Vec<EmittedAsset>> {
        let mut assets = Vec::new();
        for (filename, url) in self.rendered_urls() {
            let key = font_cache_key(&filename);
            let bytes = match cache.get_raw(&key)? {
                Some(bytes) => {
                    tracing::debug!(key = key.as_str(), "font cache hit");
                    bytes
                }
                None => {
                    let Some(fetcher) = fetcher else {
                        return Err(Error::Fetch {
                            url,
                            message: "no font fetcher configured".to_string(),
                        });
                    };
                    tracing::debug!(url = url.as_str(), "fetching font");
                    let bytes = fetcher.fetch(&url).await?;
                    cache.set_raw(&key, &bytes)?;
                    bytes
                }
            };
            assets.push(EmittedAsset {
                filename,
                url,
                bytes,
            });
        }
        Ok(assets)
    }

    /// The directory under `out_dir` that assets are written to.
    pub fn output_dir(&self, out_dir: &Path) -> PathBuf {
        let mut dir = out_dir.to_path_buf();
        for segment in self.prefix.split('/').filter(|s| !s.is_empty() && *s != "..") {
            dir.push(segment);
        }
        dir
    }

    pub fn write_assets(&self, out_dir: &Path, assets: &[EmittedAsset]) -> Result<()> {
        let dir = self.output_dir(out_dir);
        std::fs::create_dir_all(&dir).map_err(|source| Error::WriteAsset {
            path: dir.clone(),
            source,
        })?;
        for asset in assets {
            let path = dir.join(&asset.filename);
            std::fs::write(&path, &asset.bytes)
                .map_err(|source| Error::WriteAsset { path, source })?;
        }
        Ok(())
    }
}
