//! Font providers and the dispatch between them.

use crate::cache::{CacheStore, CacheStoreExt};
use crate::font::FontFaceDescriptor;
use crate::hash::content_hash;
use crate::Result;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Constraints passed to a provider lookup.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveFontOptions {
    pub weights: Vec<String>,
    pub styles: Vec<String>,
    pub subsets: Vec<String>,
    pub fallbacks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderResult {
    pub fonts: Vec<FontFaceDescriptor>,
    /// Fallback font names suggested by the provider; the configured defaults apply when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<Vec<String>>,
}

impl ProviderResult {
    pub fn new(fonts: Vec<FontFaceDescriptor>) -> Self {
        Self {
            fonts,
            fallbacks: None,
        }
    }

    pub fn with_fallbacks(mut self, fallbacks: Vec<String>) -> Self {
        self.fallbacks = Some(fallbacks);
        self
    }
}

/// A source of font metadata, e.g. a hosted font catalog.
///
/// `Ok(None)` (or a result without fonts) means the provider does not know the family.
pub trait FontProvider: Send + Sync {
    fn name(&self) -> &str;

    fn resolve_font<'a>(
        &'a self,
        family: &'a str,
        options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>>;
}

impl<T: FontProvider + ?Sized> FontProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resolve_font<'a>(
        &'a self,
        family: &'a str,
        options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>> {
        (**self).resolve_font(family, options)
    }
}

/// Instantiated providers in registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn FontProvider>>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider; a provider with the same name is replaced in place.
    pub fn register(&mut self, provider: Arc<dyn FontProvider>) {
        match self
            .providers
            .iter_mut()
            .find(|p| p.name() == provider.name())
        {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn FontProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.providers.iter().map(|p| p.name())
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Queries the named providers in order and returns the first result with at least one font.
    ///
    /// Providers after the first hit are not queried. Provider errors are logged and treated as
    /// a miss; unknown names are skipped.
    pub async fn resolve_font(
        &self,
        family: &str,
        options: &ResolveFontOptions,
        order: &[String],
    ) -> Option<(String, ProviderResult)> {
        for name in order {
            let Some(provider) = self.get(name) else {
                continue;
            };
            match provider.resolve_font(family, options).await {
                Ok(Some(result)) if !result.fonts.is_empty() => {
                    tracing::debug!(provider = name.as_str(), family, "resolved font family");
                    return Some((name.clone(), result));
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(
                        provider = name.as_str(),
                        family,
                        error = %err,
                        "font provider failed"
                    );
                }
            }
        }
        None
    }
}

/// A provider backed by a fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    name: String,
    families: IndexMap<String, ProviderResult>,
}

impl StaticProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            families: IndexMap::new(),
        }
    }

    pub fn with_family(mut self, family: impl Into<String>, result: ProviderResult) -> Self {
        self.families.insert(family.into(), result);
        self
    }

    /// Loads a catalog from JSON: an object mapping family names to `{ fonts, fallbacks? }`.
    pub fn from_json_str(name: impl Into<String>, text: &str) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            families: serde_json::from_str(text)?,
        })
    }
}

impl FontProvider for StaticProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn resolve_font<'a>(
        &'a self,
        family: &'a str,
        _options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>> {
        Box::pin(async move { Ok(self.families.get(family).cloned()) })
    }
}

/// Persists another provider's results in a [`CacheStore`].
///
/// Entries are keyed by provider name plus a hash of the family and lookup options, so a
/// repeated build answers from the cache without querying the inner provider.
pub struct CachingProvider {
    inner: Arc<dyn FontProvider>,
    cache: Arc<dyn CacheStore>,
}

impl CachingProvider {
    pub fn new(inner: Arc<dyn FontProvider>, cache: Arc<dyn CacheStore>) -> Self {
        Self { inner, cache }
    }

    pub fn cache_key(&self, family: &str, options: &ResolveFontOptions) -> String {
        format!(
            "data:providers:{}:{}.json",
            self.inner.name(),
            content_hash(&(family, options))
        )
    }
}

impl FontProvider for CachingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve_font<'a>(
        &'a self,
        family: &'a str,
        options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>> {
        Box::pin(async move {
            let key = self.cache_key(family, options);
            match self.cache.get_json::<ProviderResult>(&key) {
                Ok(Some(hit)) => {
                    tracing::debug!(key = key.as_str(), "provider cache hit");
                    return Ok(Some(hit));
                }
                Ok(None) => {}
                Err(err) => tracing::warn!(
                    key = key.as_str(),
                    error = %err,
                    "unreadable provider cache entry"
                ),
            }

            let result = self.inner.resolve_font(family, options).await?;
            if let Some(result) = result.as_ref().filter(|r| !r.fonts.is_empty()) {
                if let Err(err) = self.cache.set_json(&key, result) {
                    tracing::warn!(
                        key = key.as_str(),
                        error = %err,
                        "failed to cache provider result"
                    );
                }
            }
            Ok(result)
        })
    }
}
