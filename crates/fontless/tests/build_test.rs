use fontless::provider::StaticProvider;
use fontless::{
    Error, FontFetcher, FontMetrics, Fontless, FontlessConfig, FsCacheStore, MetricsRegistry,
    Result,
};
use futures::executor::block_on;
use futures::future::BoxFuture;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("build")
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixtures_root().join(name)).unwrap()
}

/// Serves `<url>` as the bytes of the URL itself.
#[derive(Default)]
struct EchoFetcher {
    requests: Mutex<Vec<String>>,
}

impl FontFetcher for EchoFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.requests.lock().unwrap().push(url.to_string());
        let bytes: Result<Vec<u8>> = Ok(url.as_bytes().to_vec());
        Box::pin(async move { bytes })
    }
}

fn engine(cache_dir: &Path) -> Fontless {
    let config = FontlessConfig::from_json_str(&read_fixture("config.json")).unwrap();
    let catalog = StaticProvider::from_json_str("catalog", &read_fixture("catalog.json")).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());
    metrics.register("Brand", FontMetrics::new(1000.0, 900.0, -250.0, 0.0, 500.0));
    Fontless::new(config)
        .with_provider(catalog)
        .with_metrics(metrics)
        .with_cache(Arc::new(FsCacheStore::new(cache_dir)))
        .with_should_preload(|_, _| true)
}

#[test]
fn stylesheet_build_end_to_end() {
    let cache_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(EchoFetcher::default());
    let engine = engine(cache_dir.path()).with_fetcher(fetcher.clone());

    let css = read_fixture("app.css");
    let result = block_on(engine.transform(&css, "/src/app.css"))
        .unwrap()
        .expect("fonts are injected");
    let code = result.code();

    assert_eq!(code.matches(r#"@font-face{font-family:"Brand";"#).count(), 2);
    assert_eq!(
        code.matches(r#"@font-face{font-family:"Brand Fallback: Arial";"#)
            .count(),
        1
    );
    assert_eq!(
        code.matches(r#"font-family: "Brand", "Brand Fallback: Arial", sans-serif;"#)
            .count(),
        2
    );
    assert!(code.contains(
        r#"src:local("Brand Regular Italic"),local("Brand Italic"),url("/_fonts/brand-italic-N1QD0jJF1S.woff2") format("woff2")"#
    ));
    assert!(code.contains(
        r#"src:local("Mono Sans Variable"),url("/_fonts/mono-sans-mCv5tqC7pN.woff2") format("woff2");font-display:swap;font-weight:100 900}"#
    ));
    assert!(code.contains(r#"font-family: "Mono Sans", monospace;"#));
    assert!(code.contains(
        r#"@font-face{font-family:"Icons";src:url("/icons/icons.woff2") format("woff2");font-display:block}"#
    ));
    assert!(!code.contains(r#""Legacy""#));
    assert!(code.contains(".legacy {\n  font-family: Legacy, serif;\n}"));
    assert!(code.ends_with(&css.replace(
        r#""Brand", sans-serif"#,
        r#""Brand", "Brand Fallback: Arial", sans-serif"#
    )));

    let map = result.map().unwrap().to_json().unwrap();
    assert!(map.contains(r#""sources":["/src/app.css"]"#));

    assert_eq!(
        engine.preload_urls("/src/app.css"),
        vec![
            "/_fonts/brand-9gD3ZBGRxw.woff2".to_string(),
            "/_fonts/mono-sans-mCv5tqC7pN.woff2".to_string(),
            "/icons/icons.woff2".to_string(),
        ]
    );

    let written = block_on(engine.write_assets(out_dir.path())).unwrap();
    let mut names: Vec<&str> = written.iter().map(|a| a.filename.as_str()).collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            "brand-9gD3ZBGRxw.woff2",
            "brand-italic-N1QD0jJF1S.woff2",
            "mono-sans-mCv5tqC7pN.woff2",
        ]
    );
    let font = out_dir.path().join("_fonts").join("brand-9gD3ZBGRxw.woff2");
    assert_eq!(
        std::fs::read(font).unwrap(),
        b"https://fonts.example/brand.woff2"
    );
    assert!(
        cache_dir
            .path()
            .join("data")
            .join("fonts")
            .join("mono-sans-mCv5tqC7pN.woff2")
            .is_file()
    );
    assert_eq!(fetcher.requests.lock().unwrap().len(), 3);
}

#[test]
fn second_build_is_served_from_the_cache() {
    let cache_dir = tempfile::tempdir().unwrap();
    let css = read_fixture("app.css");

    let first = engine(cache_dir.path()).with_fetcher(Arc::new(EchoFetcher::default()));
    block_on(first.transform(&css, "/src/app.css")).unwrap();
    block_on(first.materialize_assets()).unwrap();

    // No fetcher: every font must come from the cache.
    let second = engine(cache_dir.path());
    block_on(second.transform(&css, "/src/app.css")).unwrap();
    let assets = block_on(second.materialize_assets()).unwrap();
    assert_eq!(assets.len(), 3);
}

#[test]
fn missing_fonts_fail_the_build() {
    let cache_dir = tempfile::tempdir().unwrap();
    let engine = engine(cache_dir.path());
    block_on(engine.transform(&read_fixture("app.css"), "/src/app.css")).unwrap();
    let err = block_on(engine.materialize_assets()).unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}
