use super::*;
use crate::assets::{asset_filename, font_cache_key, join_relative_url, join_url};
use crate::font::has_protocol;
use futures::executor::block_on;
use std::sync::Mutex;

/// Serves fixed bytes for known URLs and records every request.
#[derive(Default)]
struct MockFetcher {
    files: Vec<(&'static str, &'static [u8])>,
    requests: Mutex<Vec<String>>,
}

impl FontFetcher for MockFetcher {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        self.requests.lock().unwrap().push(url.to_string());
        let found = self.files.iter().find(|(known, _)| *known == url);
        let result: Result<Vec<u8>> = match found {
            Some((_, bytes)) => Ok(bytes.to_vec()),
            None => Err(Error::Fetch {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            }),
        };
        Box::pin(async move { result })
    }
}

#[test]
fn filenames_are_deterministic_content_hashes() {
    let source = RemoteSource::new("https://fonts.example/a.woff2").with_format("woff2");
    assert_eq!(asset_filename(&source), "a-avTJoQ0QyY.woff2");
    assert_eq!(asset_filename(&source), asset_filename(&source.clone()));

    let bare = RemoteSource::new("https://fonts.example/a.woff2");
    assert_eq!(asset_filename(&bare), "a-iGFsIF7GYP.woff2");
}

#[test]
fn filename_extension_falls_back_to_the_format() {
    let source = RemoteSource::new("https://cdn.example/css?family=Brand").with_format("woff2");
    assert_eq!(asset_filename(&source), "css-nz8viPO60R.woff2");
}

#[test]
fn filename_strips_leading_dashes() {
    let source = RemoteSource::new("https://fonts.example/--brand.ttf");
    assert_eq!(asset_filename(&source), "brand-y9tq3BtZkk.ttf");
}

#[test]
fn filename_stems_are_percent_decoded() {
    let source = RemoteSource::new("https://fonts.example/My%20Font.woff2").with_format("woff2");
    assert_eq!(asset_filename(&source), "My Font-pdkCWkFkxD.woff2");
}

#[test]
fn protocol_detection() {
    assert!(has_protocol("https://fonts.example/a.woff2", false));
    assert!(has_protocol("file:///tmp/a.ttf", false));
    assert!(!has_protocol("//fonts.example/a.woff2", false));
    assert!(has_protocol("//fonts.example/a.woff2", true));
    assert!(!has_protocol("/fonts/a.woff2", true));
}

#[test]
fn url_joining() {
    assert_eq!(join_url("/_fonts/", "/a.woff2"), "/_fonts/a.woff2");
    assert_eq!(join_url("", "a.woff2"), "/a.woff2");
    assert_eq!(join_relative_url("/_fonts", "a.woff2"), "/_fonts/a.woff2");
    assert_eq!(join_relative_url("./assets/../fonts", "a.woff2"), "fonts/a.woff2");
    assert_eq!(join_relative_url("../fonts", "a.woff2"), "../fonts/a.woff2");
}

#[test]
fn normalize_rewrites_remote_sources_only() {
    let registry = AssetRegistry::new("/_fonts", false);
    let face = FontFaceDescriptor::new([
        SourceRef::local("Brand"),
        SourceRef::Remote(RemoteSource::new("/static/brand.woff2")),
        SourceRef::Remote(RemoteSource::new("//fonts.example/a.woff2")),
    ]);
    let normalized = registry.normalize(&[face]);
    let src = &normalized[0].src;
    assert_eq!(src[0], SourceRef::local("Brand"));
    assert_eq!(src[1], SourceRef::Remote(RemoteSource::new("/static/brand.woff2")));
    let SourceRef::Remote(rewritten) = &src[2] else {
        panic!("expected a remote source");
    };
    assert_eq!(rewritten.url, "/_fonts/a-iGFsIF7GYP.woff2");
    assert_eq!(
        rewritten.original_url.as_deref(),
        Some("https://fonts.example/a.woff2")
    );
    assert_eq!(
        registry.rendered_urls(),
        vec![(
            "a-iGFsIF7GYP.woff2".to_string(),
            "https://fonts.example/a.woff2".to_string()
        )]
    );
}

#[test]
fn normalizing_twice_yields_the_same_url() {
    let registry = AssetRegistry::new("/_fonts", false);
    let face = remote_face("https://fonts.example/a.woff2");
    let once = registry.normalize(std::slice::from_ref(&face));
    let again = registry.normalize(&[face]);
    assert_eq!(once, again);
    assert_eq!(registry.rendered_urls().len(), 1);
}

#[test]
fn materialize_reads_the_cache_before_fetching() {
    let registry = AssetRegistry::new("/_fonts", false);
    registry.normalize(&[
        remote_face("https://fonts.example/a.woff2"),
        remote_face("https://fonts.example/x.woff2"),
    ]);
    let cache = MemoryCacheStore::new();
    cache
        .set_raw(&font_cache_key("a-avTJoQ0QyY.woff2"), b"cached")
        .unwrap();
    let fetcher = MockFetcher {
        files: vec![("https://fonts.example/x.woff2", &b"fetched"[..])],
        ..Default::default()
    };

    let assets = block_on(registry.materialize(&cache, Some(&fetcher))).unwrap();
    assert_eq!(
        assets,
        vec![
            EmittedAsset {
                filename: "a-avTJoQ0QyY.woff2".to_string(),
                url: "https://fonts.example/a.woff2".to_string(),
                bytes: b"cached".to_vec(),
            },
            EmittedAsset {
                filename: "x-mf1RcZ8srE.woff2".to_string(),
                url: "https://fonts.example/x.woff2".to_string(),
                bytes: b"fetched".to_vec(),
            },
        ]
    );
    assert_eq!(
        *fetcher.requests.lock().unwrap(),
        vec!["https://fonts.example/x.woff2".to_string()]
    );
    assert!(cache.contains_key("data:fonts:x-mf1RcZ8srE.woff2"));

    block_on(registry.materialize(&cache, Some(&fetcher))).unwrap();
    assert_eq!(fetcher.requests.lock().unwrap().len(), 1);
}

#[test]
fn fetch_failures_abort_materialization() {
    let registry = AssetRegistry::new("/_fonts", false);
    registry.normalize(&[remote_face("https://fonts.example/missing.woff2")]);
    let cache = MemoryCacheStore::new();

    let err = block_on(registry.materialize(&cache, Some(&MockFetcher::default()))).unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
    assert!(cache.is_empty());

    let err = block_on(registry.materialize(&cache, None)).unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}

#[test]
fn engine_writes_assets_under_the_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = Arc::new(MockFetcher {
        files: vec![("https://fonts.example/brand.woff2", &b"brand"[..])],
        ..Default::default()
    });
    let engine = brand_engine(FontlessConfig::default()).with_fetcher(fetcher);
    block_on(engine.transform_css(
        r#"a { font-family: "Brand"; }"#,
        "/src/app.css",
        &TransformOptions::default(),
    ))
    .unwrap();

    let written = block_on(engine.write_assets(dir.path())).unwrap();
    assert_eq!(written.len(), 1);
    let path = dir.path().join("_fonts").join("brand-9gD3ZBGRxw.woff2");
    assert_eq!(std::fs::read(path).unwrap(), b"brand");
}
