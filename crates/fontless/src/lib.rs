#![forbid(unsafe_code)]

//! Web font resolution and `@font-face` injection (headless).
//!
//! Design goals:
//! - CSS is only ever added to: generated rules are prepended and fallback names are spliced in
//! - deterministic output (asset filenames are content hashes, rules are emitted in source order)
//! - runtime-agnostic async APIs (no specific executor required)
//!
//! [`Fontless`] owns the per-build state: configuration, registered providers, the rewritten
//! asset URLs and the preload sets. Build-tool integrations call [`Fontless::transform`] for each
//! stylesheet and [`Fontless::materialize_assets`] once at the end of a build.

pub mod assets;
pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod fetch;
pub mod font;
mod hash;
pub mod metrics;
pub mod minify;
pub mod preload;
pub mod provider;
pub mod render;
mod resolver;
mod transform;

pub use assets::{AssetRegistry, EmittedAsset};
pub use cache::{CacheStore, CacheStoreExt, FsCacheStore, MemoryCacheStore};
pub use config::{FamilyOverride, FontlessConfig, ResolutionDefaults};
pub use error::{Error, Result};
pub use fetch::FontFetcher;
pub use font::{FontFaceDescriptor, FontWeight, LocalSource, RemoteSource, SourceRef};
pub use fontless_css::{GenericFamily, SourceMap};
pub use metrics::{FontMetrics, MetricsRegistry};
pub use minify::{CssMinifier, WhitespaceMinifier};
pub use preload::{PreloadRegistry, ShouldPreload};
pub use provider::{FontProvider, ProviderRegistry, ProviderResult, ResolveFontOptions};
pub use resolver::{FontFaceResolution, NO_PROVIDER};
pub use transform::{
    FallbackSplice, FontFamilyUse, TransformOptions, TransformResult, is_css_request,
    scan_font_families,
};

use fallback::FallbackSynthesizer;
use std::path::Path;
use std::sync::Arc;

/// The font injection engine for one build.
#[derive(Clone)]
pub struct Fontless {
    config: FontlessConfig,
    defaults: ResolutionDefaults,
    providers: ProviderRegistry,
    assets: Arc<AssetRegistry>,
    preload: Arc<PreloadRegistry>,
    cache: Arc<dyn CacheStore>,
    fetcher: Option<Arc<dyn FontFetcher>>,
    metrics: Arc<MetricsRegistry>,
    minifier: Arc<dyn CssMinifier>,
    should_preload: ShouldPreload,
}

impl std::fmt::Debug for Fontless {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fontless")
            .field("config", &self.config)
            .field("providers", &self.providers)
            .field("assets", &self.assets)
            .field("preload", &self.preload)
            .field("has_fetcher", &self.fetcher.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Fontless {
    fn default() -> Self {
        Self::new(FontlessConfig::default())
    }
}

impl Fontless {
    /// Creates an engine with an in-memory cache, no providers, no fetcher and preloading off.
    pub fn new(config: FontlessConfig) -> Self {
        let defaults = ResolutionDefaults::from_config(&config.defaults);
        let assets = Arc::new(AssetRegistry::new(config.assets.prefix.clone(), config.dev));
        Self {
            config,
            defaults,
            providers: ProviderRegistry::default(),
            assets,
            preload: Arc::new(PreloadRegistry::new()),
            cache: Arc::new(MemoryCacheStore::new()),
            fetcher: None,
            metrics: Arc::new(MetricsRegistry::new()),
            minifier: Arc::new(WhitespaceMinifier),
            should_preload: Arc::new(|_, _| false),
        }
    }

    /// Registers a provider; a provider with the same name is replaced in place.
    pub fn with_provider(mut self, provider: impl FontProvider + 'static) -> Self {
        self.providers.register(Arc::new(provider));
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn FontFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_minifier(mut self, minifier: Arc<dyn CssMinifier>) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn with_should_preload(
        mut self,
        should_preload: impl Fn(&str, &FontFaceDescriptor) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.should_preload = Arc::new(should_preload);
        self
    }

    /// Shares the preload sets with another engine (e.g. a client and an SSR build).
    pub fn with_preload_registry(mut self, preload: Arc<PreloadRegistry>) -> Self {
        self.preload = preload;
        self
    }

    /// Shares rewritten asset URLs with another engine.
    pub fn with_asset_registry(mut self, assets: Arc<AssetRegistry>) -> Self {
        self.assets = assets;
        self
    }

    pub fn config(&self) -> &FontlessConfig {
        &self.config
    }

    pub fn defaults(&self) -> &ResolutionDefaults {
        &self.defaults
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn assets(&self) -> &Arc<AssetRegistry> {
        &self.assets
    }

    pub fn preload(&self) -> &Arc<PreloadRegistry> {
        &self.preload
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// URLs to preload for a module (or a chunk entry after [`Fontless::render_chunk`]).
    pub fn preload_urls(&self, id: &str) -> Vec<String> {
        self.preload.get(id)
    }

    /// Records that `module_ids` were bundled into the chunk whose entry module is `entry_id`.
    pub fn render_chunk<'a>(&self, entry_id: &str, module_ids: impl IntoIterator<Item = &'a str>) {
        self.preload.merge_chunk(entry_id, module_ids);
    }

    /// Loads the bytes of every rewritten font, fetching (and caching) the ones not cached yet.
    pub async fn materialize_assets(&self) -> Result<Vec<EmittedAsset>> {
        self.assets
            .materialize(self.cache.as_ref(), self.fetcher.as_deref())
            .await
    }

    /// Materializes the fonts and writes them under `<out_dir>/<assets prefix>/`.
    pub async fn write_assets(&self, out_dir: &Path) -> Result<Vec<EmittedAsset>> {
        let assets = self.materialize_assets().await?;
        self.assets.write_assets(out_dir, &assets)?;
        tracing::debug!(
            count = assets.len(),
            dir = %self.assets.output_dir(out_dir).display(),
            "wrote font assets"
        );
        Ok(assets)
    }

    fn fallback_synthesizer(&self) -> FallbackSynthesizer {
        FallbackSynthesizer::new(
            self.metrics.clone(),
            self.cache.clone(),
            self.fetcher.clone(),
        )
    }
}

#[cfg(test)]
mod tests;
