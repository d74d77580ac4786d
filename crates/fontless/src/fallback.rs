//! Local and metric-adjusted fallback faces.

use crate::assets::font_cache_key;
use crate::cache::CacheStore;
use crate::fetch::FontFetcher;
use crate::font::{FontFaceDescriptor, FontWeight, SourceRef};
use crate::metrics::{FontMetrics, MetricsRegistry};
use crate::render::generate_fallback_font_face;
use std::sync::Arc;

fn weight_name(weight: &str) -> Option<&'static str> {
    Some(match weight {
        "100" => "Thin",
        "200" => "ExtraLight",
        "300" => "Light",
        "400" => "Regular",
        "500" => "Medium",
        "600" => "SemiBold",
        "700" => "Bold",
        "800" => "ExtraBold",
        "900" => "Black",
        _ => return None,
    })
}

fn style_name(style: Option<&str>) -> &'static str {
    match style {
        Some("italic") => "Italic",
        Some("oblique") => "Oblique",
        _ => "",
    }
}

fn local_name(parts: &[&str]) -> SourceRef {
    SourceRef::local(parts.join(" ").trim())
}

/// Prefers installed copies of a font over downloading it.
///
/// Variable faces get `local("<Family> Variable <Style>")` in front of their sources; static faces
/// served remotely get `local("<Family> <Weight> <Style>")` (plus `local("<Family> <Style>")` for
/// the regular weight). The input is left untouched.
pub fn add_local_fallbacks(family: &str, faces: &[FontFaceDescriptor]) -> Vec<FontFaceDescriptor> {
    faces
        .iter()
        .map(|face| {
            let mut face = face.clone();
            let style = style_name(face.style.as_deref());
            match &face.weight {
                Some(FontWeight::Range(..)) => {
                    face.src.insert(0, local_name(&[family, "Variable", style]));
                }
                weight => {
                    let remote_first = face.src.first().is_some_and(|s| !s.is_local());
                    let named = match weight {
                        Some(FontWeight::Fixed(w)) => weight_name(w),
                        _ => None,
                    };
                    if let (true, Some(name)) = (remote_first, named) {
                        if name == "Regular" {
                            face.src.insert(0, local_name(&[family, style]));
                        }
                        face.src.insert(0, local_name(&[family, name, style]));
                    }
                }
            }
            face
        })
        .collect()
}

/// A generated fallback family: `<Family> Fallback: <font>` backed by the installed `font`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackFamily {
    pub font: String,
    pub name: String,
}

impl FallbackFamily {
    pub fn new(family: &str, font: &str) -> Self {
        Self {
            font: font.to_string(),
            name: format!("{family} Fallback: {font}"),
        }
    }

    pub fn for_fonts(family: &str, fonts: &[String]) -> Vec<Self> {
        fonts.iter().map(|font| Self::new(family, font)).collect()
    }
}

/// Generates metric-adjusted fallback `@font-face` rules.
///
/// Metrics for the primary family come from the [`MetricsRegistry`]; failing that, the face's
/// downloaded font file is read (from the cache, or fetched and cached when a fetcher is set).
#[derive(Clone)]
pub struct FallbackSynthesizer {
    metrics: Arc<MetricsRegistry>,
    cache: Arc<dyn CacheStore>,
    fetcher: Option<Arc<dyn FontFetcher>>,
}

impl FallbackSynthesizer {
    pub fn new(
        metrics: Arc<MetricsRegistry>,
        cache: Arc<dyn CacheStore>,
        fetcher: Option<Arc<dyn FontFetcher>>,
    ) -> Self {
        Self {
            metrics,
            cache,
            fetcher,
        }
    }

    /// One rule per fallback family, or nothing when the primary metrics are unknown.
    pub async fn font_fallbacks(
        &self,
        family: &str,
        face: &FontFaceDescriptor,
        fallbacks: &[FallbackFamily],
    ) -> Vec<String> {
        if fallbacks.is_empty() {
            return Vec::new();
        }
        let Some(metrics) = self.primary_metrics(family, face).await else {
            tracing::debug!(family, "no metrics for font family, skipping fallback faces");
            return Vec::new();
        };
        fallbacks
            .iter()
            .map(|fallback| {
                let fallback_metrics = self.metrics.for_family(&fallback.font);
                generate_fallback_font_face(
                    &metrics,
                    &fallback.name,
                    &fallback.font,
                    fallback_metrics.as_ref(),
                )
            })
            .collect()
    }

    async fn primary_metrics(
        &self,
        family: &str,
        face: &FontFaceDescriptor,
    ) -> Option<FontMetrics> {
        if let Some(metrics) = self.metrics.for_family(family) {
            return Some(metrics);
        }
        let remote = face.first_remote()?;
        let original = remote.original_url.as_deref()?;
        if let Some(known) = self.metrics.for_url(original) {
            return known;
        }

        let filename = remote.url.rsplit('/').next()?;
        let key = font_cache_key(filename);
        let cached = match self.cache.get_raw(&key) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::debug!(key = key.as_str(), error = %err, "font cache read failed");
                None
            }
        };
        let bytes = match (cached, &self.fetcher) {
            (Some(bytes), _) => bytes,
            (None, Some(fetcher)) => match fetcher.fetch(original).await {
                Ok(bytes) => {
                    if let Err(err) = self.cache.set_raw(&key, &bytes) {
                        tracing::debug!(
                            key = key.as_str(),
                            error = %err,
                            "font cache write failed"
                        );
                    }
                    bytes
                }
                Err(err) => {
                    tracing::debug!(
                        url = original,
                        error = %err,
                        "could not fetch font for metrics"
                    );
                    return None;
                }
            },
            (None, None) => return None,
        };
        self.metrics.read_for_url(original, &bytes)
    }
}
