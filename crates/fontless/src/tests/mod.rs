mod assets;
mod config;
mod metrics;

use crate::provider::{FontProvider, ProviderResult, ResolveFontOptions, StaticProvider};
use crate::*;
use futures::future::BoxFuture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Wraps a provider and counts lookups.
pub(crate) struct CountingProvider {
    inner: StaticProvider,
    calls: AtomicUsize,
}

impl CountingProvider {
    pub(crate) fn new(inner: StaticProvider) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FontProvider for CountingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve_font<'a>(
        &'a self,
        family: &'a str,
        options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_font(family, options)
    }
}

/// Always fails.
pub(crate) struct FailingProvider(pub(crate) &'static str);

impl FontProvider for FailingProvider {
    fn name(&self) -> &str {
        self.0
    }

    fn resolve_font<'a>(
        &'a self,
        _family: &'a str,
        _options: &'a ResolveFontOptions,
    ) -> BoxFuture<'a, Result<Option<ProviderResult>>> {
        let failure: Result<Option<ProviderResult>> = Err(Error::Provider {
            provider: self.0.to_string(),
            message: "offline".to_string(),
        });
        Box::pin(async move { failure })
    }
}

pub(crate) fn remote_face(url: &str) -> FontFaceDescriptor {
    FontFaceDescriptor::new([SourceRef::Remote(
        RemoteSource::new(url).with_format("woff2"),
    )])
    .with_weight(FontWeight::fixed(400))
    .with_style("normal")
}

pub(crate) fn single_face(url: &str) -> ProviderResult {
    ProviderResult::new(vec![remote_face(url)])
}

pub(crate) fn brand_metrics() -> FontMetrics {
    FontMetrics::new(1000.0, 900.0, -250.0, 0.0, 500.0)
}

/// An engine that knows `Brand` (with metrics) and `X` (without) through a `static` provider.
pub(crate) fn brand_engine(config: FontlessConfig) -> Fontless {
    let provider = StaticProvider::new("static")
        .with_family("Brand", single_face("https://fonts.example/brand.woff2"))
        .with_family("X", single_face("https://fonts.example/x.woff2"));
    let metrics = Arc::new(MetricsRegistry::new());
    metrics.register("Brand", brand_metrics());
    Fontless::new(config)
        .with_provider(provider)
        .with_metrics(metrics)
}

pub(crate) fn dev_config() -> FontlessConfig {
    FontlessConfig {
        dev: true,
        ..Default::default()
    }
}
