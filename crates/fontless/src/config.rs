//! User-facing configuration.
//!
//! The shape mirrors the JSON options accepted by build-tool integrations (camelCase keys); it is
//! deserialized as-is and interpreted by the resolver. No schema validation happens beyond what
//! serde enforces.

use crate::font::{FontFaceDescriptor, FontWeight, OneOrMany, RawSource, Scalar};
use crate::{Error, Result};
use fontless_css::GenericFamily;
use indexmap::IndexMap;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ASSETS_PREFIX: &str = "/_fonts";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FontlessConfig {
    /// Per-family overrides, matched by exact family name.
    pub families: Vec<FamilyOverride>,
    pub defaults: DefaultsConfig,
    /// Provider toggles keyed by provider name; `false` disables a registered provider.
    pub providers: IndexMap<String, bool>,
    /// Pins resolution to a single provider.
    pub provider: Option<String>,
    /// Providers to query first, in order. Unlisted providers follow in registration order.
    pub priority: Vec<String>,
    pub assets: AssetsConfig,
    pub experimental: ExperimentalConfig,
    /// Development mode: relative asset URLs and unminified output.
    pub dev: bool,
}

impl FontlessConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| Error::Config {
            message: err.to_string(),
        })
    }

    pub fn family_override(&self, family: &str) -> Option<&FamilyOverride> {
        self.families.iter().find(|f| f.name == family)
    }

    /// Whether the provider may be used at all (not disabled and not excluded by a pin).
    pub fn provider_enabled(&self, name: &str) -> bool {
        if self.providers.get(name) == Some(&false) {
            return false;
        }
        self.provider.as_deref().is_none_or(|pinned| pinned == name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsConfig {
    /// URL prefix under which rewritten font files are served.
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

fn default_prefix() -> String {
    DEFAULT_ASSETS_PREFIX.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperimentalConfig {
    /// Also resolve families assigned to custom properties (`--brand-font: Inter`).
    #[serde(rename = "processCSSVariables", alias = "processCssVariables")]
    pub process_css_variables: bool,
    pub disable_local_fallbacks: bool,
}

/// Overrides for one family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyOverride {
    pub name: String,
    /// The family is injected globally by the host; transforms leave it alone.
    #[serde(default)]
    pub global: bool,
    #[serde(flatten)]
    pub kind: OverrideKind,
}

impl FamilyOverride {
    pub fn manual(name: impl Into<String>, src: Vec<RawSource>) -> Self {
        Self {
            name: name.into(),
            global: false,
            kind: OverrideKind::Manual(ManualOverride {
                src: OneOrMany::Many(src),
                display: None,
                weight: None,
                style: None,
                unicode_range: None,
            }),
        }
    }

    pub fn provider(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            global: false,
            kind: OverrideKind::Provider(ProviderOverride {
                provider: Some(provider.into()),
                ..Default::default()
            }),
        }
    }

    pub fn as_provider(&self) -> Option<&ProviderOverride> {
        match &self.kind {
            OverrideKind::Provider(p) => Some(p),
            OverrideKind::Manual(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideKind {
    /// Explicit sources; providers are never consulted.
    Manual(ManualOverride),
    Provider(ProviderOverride),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOverride {
    pub src: OneOrMany<RawSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_range: Option<OneOrMany<String>>,
}

impl ManualOverride {
    /// The override as a face with parsed (but not yet rewritten) sources.
    pub fn to_descriptor(&self) -> FontFaceDescriptor {
        FontFaceDescriptor {
            family: None,
            src: self
                .src
                .clone()
                .into_vec()
                .into_iter()
                .map(RawSource::into_source)
                .collect(),
            unicode_range: self.unicode_range.clone().map(OneOrMany::into_vec),
            weight: self.weight.clone(),
            style: self.style.clone(),
            display: self.display.clone(),
            feature_settings: None,
            variation_settings: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderOverride {
    /// Provider to query exclusively, or `"none"` to skip the family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(
        default,
        deserialize_with = "string_list",
        skip_serializing_if = "Option::is_none"
    )]
    pub weights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsets: Option<Vec<String>>,
}

/// Partial defaults as configured; missing keys keep the built-in values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DefaultsConfig {
    #[serde(deserialize_with = "string_list", skip_serializing_if = "Option::is_none")]
    pub weights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub styles: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsets: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallbacks: Option<FallbacksConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FallbacksConfig {
    /// One list used for every generic family.
    All(Vec<String>),
    /// Lists keyed by generic family keyword.
    PerGeneric(IndexMap<String, Vec<String>>),
}

fn string_list<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Scalar>> = Option::deserialize(deserializer)?;
    Ok(values.map(|v| v.into_iter().map(Scalar::into_string).collect()))
}

/// Effective resolution defaults: built-in policy with configured keys applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionDefaults {
    pub weights: Vec<String>,
    pub styles: Vec<String>,
    pub subsets: Vec<String>,
    pub fallbacks: IndexMap<GenericFamily, Vec<String>>,
}

impl Default for ResolutionDefaults {
    fn default() -> Self {
        Self {
            weights: vec!["400".to_string()],
            styles: strings(&["normal", "italic"]),
            subsets: strings(&[
                "cyrillic-ext",
                "cyrillic",
                "greek-ext",
                "greek",
                "vietnamese",
                "latin-ext",
                "latin",
            ]),
            fallbacks: GenericFamily::ALL
                .into_iter()
                .map(|generic| (generic, strings(default_fallbacks(generic))))
                .collect(),
        }
    }
}

impl ResolutionDefaults {
    pub fn from_config(config: &DefaultsConfig) -> Self {
        let mut defaults = Self::default();
        if let Some(weights) = &config.weights {
            defaults.weights = weights.clone();
        }
        if let Some(styles) = &config.styles {
            defaults.styles = styles.clone();
        }
        if let Some(subsets) = &config.subsets {
            defaults.subsets = subsets.clone();
        }
        match &config.fallbacks {
            Some(FallbacksConfig::All(list)) => {
                for value in defaults.fallbacks.values_mut() {
                    *value = list.clone();
                }
            }
            Some(FallbacksConfig::PerGeneric(map)) => {
                for (key, list) in map {
                    match GenericFamily::from_keyword(key) {
                        Some(generic) => {
                            defaults.fallbacks.insert(generic, list.clone());
                        }
                        None => tracing::warn!(
                            key = key.as_str(),
                            "ignoring fallbacks for unknown generic family"
                        ),
                    }
                }
            }
            None => {}
        }
        defaults
    }

    /// Fallback font names for a generic family (`sans-serif` when unknown).
    pub fn fallbacks_for(&self, generic: Option<GenericFamily>) -> &[String] {
        self.fallbacks
            .get(&generic.unwrap_or(GenericFamily::SansSerif))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

fn default_fallbacks(generic: GenericFamily) -> &'static [&'static str] {
    match generic {
        GenericFamily::Serif | GenericFamily::UiSerif => &["Times New Roman"],
        GenericFamily::SansSerif | GenericFamily::UiSansSerif => &["Arial"],
        GenericFamily::Monospace | GenericFamily::UiMonospace => &["Courier New"],
        GenericFamily::SystemUi => &[
            "BlinkMacSystemFont",
            "Segoe UI",
            "Roboto",
            "Helvetica Neue",
            "Arial",
        ],
        GenericFamily::Cursive
        | GenericFamily::Fantasy
        | GenericFamily::UiRounded
        | GenericFamily::Emoji
        | GenericFamily::Math
        | GenericFamily::Fangsong => &[],
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
