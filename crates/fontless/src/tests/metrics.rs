use super::fonts::TestFont;
use super::*;
use crate::assets::font_cache_key;
use crate::fallback::{FallbackFamily, FallbackSynthesizer};
use futures::executor::block_on;
use std::sync::Mutex;

fn assert_brand_metrics(metrics: Option<FontMetrics>) {
    let metrics = metrics.expect("readable metrics");
    let expected = brand_metrics();
    assert_eq!(metrics.units_per_em, expected.units_per_em);
    assert_eq!(metrics.ascent, expected.ascent);
    assert_eq!(metrics.descent, expected.descent);
    assert_eq!(metrics.line_gap, expected.line_gap);
    assert!((metrics.x_width_avg - expected.x_width_avg).abs() < 1e-9);
}

#[test]
fn truetype_woff_and_woff2_yield_the_same_metrics() {
    let font = TestFont::brand();
    assert_brand_metrics(FontMetrics::from_font_data(&font.to_ttf()));
    assert_brand_metrics(FontMetrics::from_font_data(&font.to_woff()));
    assert_brand_metrics(FontMetrics::from_font_data(&font.to_woff2()));
}

#[test]
fn unreadable_font_data_has_no_metrics() {
    assert!(FontMetrics::from_font_data(b"wOF2 not a font").is_none());
    assert!(FontMetrics::from_font_data(b"wOFF").is_none());
    let mut truncated = TestFont::brand().to_woff2();
    truncated.truncate(60);
    assert!(FontMetrics::from_font_data(&truncated).is_none());
}

#[test]
fn builtin_table_covers_common_web_fonts() {
    for family in ["Open Sans", "Inter", "Lato", "Montserrat", "Roboto Mono", "Georgia"] {
        let metrics = crate::metrics::builtin_metrics(family)
            .unwrap_or_else(|| panic!("no builtin metrics for {family}"));
        assert!(metrics.units_per_em > 0.0);
        assert!(metrics.ascent > 0.0 && metrics.descent < 0.0);
    }
    assert_eq!(
        crate::metrics::builtin_metrics("open sans").map(|m| m.units_per_em),
        Some(2048.0)
    );
}

/// Serves one font file and counts requests.
struct FontFileFetcher {
    bytes: Vec<u8>,
    requests: Mutex<Vec<String>>,
}

impl FontFetcher for FontFileFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.requests.lock().unwrap().push(url.to_string());
        let bytes: Result<Vec<u8>> = Ok(self.bytes.clone());
        Box::pin(async move { bytes })
    }
}

#[test]
fn downloaded_woff2_sizes_the_fallback_faces() {
    let fetcher = Arc::new(FontFileFetcher {
        bytes: TestFont::brand().to_woff2(),
        requests: Mutex::new(Vec::new()),
    });
    let cache = Arc::new(MemoryCacheStore::new());
    let synthesizer = FallbackSynthesizer::new(
        Arc::new(MetricsRegistry::new()),
        cache.clone(),
        Some(fetcher.clone()),
    );
    let face = FontFaceDescriptor::new([SourceRef::Remote(RemoteSource {
        url: "/_fonts/brand-9gD3ZBGRxw.woff2".to_string(),
        format: Some("woff2".to_string()),
        tech: None,
        original_url: Some("https://fonts.example/brand.woff2".to_string()),
    })]);
    let fallbacks = FallbackFamily::for_fonts("Brand", &["Arial".to_string()]);

    let faces = block_on(synthesizer.font_fallbacks("Brand", &face, &fallbacks));
    assert_eq!(faces.len(), 1);
    for line in [
        "  font-family: \"Brand Fallback: Arial\";\n",
        "  size-adjust: 113.2743%;\n",
        "  ascent-override: 79.4531%;\n",
        "  descent-override: 22.0703%;\n",
        "  line-gap-override: 0%;\n",
    ] {
        assert!(faces[0].contains(line), "missing {line:?} in {}", faces[0]);
    }
    assert!(
        cache
            .get_raw(&font_cache_key("brand-9gD3ZBGRxw.woff2"))
            .unwrap()
            .is_some()
    );

    // The metrics read from the file are remembered per URL.
    let again = block_on(synthesizer.font_fallbacks("Brand", &face, &fallbacks));
    assert_eq!(again, faces);
    assert_eq!(
        *fetcher.requests.lock().unwrap(),
        vec!["https://fonts.example/brand.woff2".to_string()]
    );
}
