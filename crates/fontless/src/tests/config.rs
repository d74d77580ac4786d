use super::*;
use crate::config::{DefaultsConfig, FallbacksConfig, OverrideKind};

const CONFIG: &str = r#"{
  "families": [
    { "name": "Brand", "src": "/fonts/brand.woff2", "weight": 700 },
    { "name": "Inter", "provider": "google", "weights": [400, "700"] },
    { "name": "Global", "global": true },
    { "name": "Skip", "provider": "none" }
  ],
  "defaults": {
    "weights": [300],
    "fallbacks": { "serif": ["Georgia"], "nonsense": ["X"] }
  },
  "providers": { "adobe": false },
  "priority": ["google"],
  "assets": { "prefix": "/fonts" },
  "experimental": { "processCSSVariables": true }
}"#;

#[test]
fn parses_camel_case_json() {
    let config = FontlessConfig::from_json_str(CONFIG).unwrap();
    assert_eq!(config.families.len(), 4);
    assert_eq!(config.priority, vec!["google".to_string()]);
    assert_eq!(config.assets.prefix, "/fonts");
    assert!(config.experimental.process_css_variables);
    assert!(!config.experimental.disable_local_fallbacks);
    assert!(!config.dev);

    let OverrideKind::Manual(manual) = &config.family_override("Brand").unwrap().kind else {
        panic!("expected a manual override");
    };
    let face = manual.to_descriptor();
    assert_eq!(
        face.src,
        vec![SourceRef::Remote(
            RemoteSource::new("/fonts/brand.woff2").with_format("woff2")
        )]
    );
    assert_eq!(face.weight, Some(FontWeight::fixed(700)));

    let inter = config.family_override("Inter").unwrap().as_provider().unwrap();
    assert_eq!(inter.provider.as_deref(), Some("google"));
    assert_eq!(
        inter.weights,
        Some(vec!["400".to_string(), "700".to_string()])
    );

    let global = config.family_override("Global").unwrap();
    assert!(global.global);
    assert_eq!(global.as_provider().unwrap().provider, None);

    assert!(config.family_override("Missing").is_none());
}

#[test]
fn provider_toggles_and_pins() {
    let mut config = FontlessConfig::from_json_str(CONFIG).unwrap();
    assert!(!config.provider_enabled("adobe"));
    assert!(config.provider_enabled("google"));

    config.provider = Some("google".to_string());
    assert!(config.provider_enabled("google"));
    assert!(!config.provider_enabled("bunny"));
}

#[test]
fn defaults_merge_over_builtins() {
    let config = FontlessConfig::from_json_str(CONFIG).unwrap();
    let defaults = ResolutionDefaults::from_config(&config.defaults);
    assert_eq!(defaults.weights, vec!["300".to_string()]);
    assert_eq!(defaults.styles, vec!["normal".to_string(), "italic".to_string()]);
    assert_eq!(defaults.subsets.last().map(String::as_str), Some("latin"));
    assert_eq!(defaults.fallbacks_for(Some(GenericFamily::Serif)), ["Georgia"]);
    assert_eq!(defaults.fallbacks_for(None), ["Arial"]);
    assert_eq!(
        defaults.fallbacks_for(Some(GenericFamily::SystemUi)),
        ["BlinkMacSystemFont", "Segoe UI", "Roboto", "Helvetica Neue", "Arial"]
    );
    assert!(defaults.fallbacks_for(Some(GenericFamily::Cursive)).is_empty());
}

#[test]
fn a_single_fallback_list_applies_to_every_generic() {
    let defaults = ResolutionDefaults::from_config(&DefaultsConfig {
        fallbacks: Some(FallbacksConfig::All(vec!["Verdana".to_string()])),
        ..Default::default()
    });
    assert_eq!(defaults.fallbacks_for(Some(GenericFamily::Monospace)), ["Verdana"]);
    assert_eq!(defaults.fallbacks_for(None), ["Verdana"]);
}

#[test]
fn empty_config_uses_defaults() {
    let config = FontlessConfig::from_json_str("{}").unwrap();
    assert_eq!(config.assets.prefix, "/_fonts");
    assert!(config.families.is_empty());
    assert_eq!(
        ResolutionDefaults::from_config(&config.defaults),
        ResolutionDefaults::default()
    );
}

#[test]
fn invalid_config_is_reported() {
    let err = FontlessConfig::from_json_str(r#"{ "families": 3 }"#).unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}
