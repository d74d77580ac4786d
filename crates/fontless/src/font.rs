//! Font face data model shared by providers, the resolver and the renderer.

use serde::de::Deserializer;
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single loadable font resource and its style metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontFaceDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Ordered sources, first preferred.
    pub src: Vec<SourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unicode_range: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_settings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_settings: Option<String>,
}

impl FontFaceDescriptor {
    pub fn new(src: impl IntoIterator<Item = SourceRef>) -> Self {
        Self {
            src: src.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// The URL of the first remote source, if any.
    pub fn first_remote_url(&self) -> Option<&str> {
        self.src.iter().find_map(|s| match s {
            SourceRef::Remote(remote) => Some(remote.url.as_str()),
            SourceRef::Local(_) => None,
        })
    }

    pub fn first_remote(&self) -> Option<&RemoteSource> {
        self.src.iter().find_map(|s| match s {
            SourceRef::Remote(remote) => Some(remote),
            SourceRef::Local(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSource {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech: Option<String>,
    /// The URL before it was rewritten to a local asset path.
    #[serde(
        default,
        rename = "originalURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_url: Option<String>,
}

impl RemoteSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format: None,
            tech: None,
            original_url: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalSource {
    pub name: String,
}

/// A font source: a URL to download or the name of an installed font.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Remote(RemoteSource),
    Local(LocalSource),
}

impl SourceRef {
    pub fn remote(url: impl Into<String>) -> Self {
        SourceRef::Remote(RemoteSource::new(url))
    }

    pub fn local(name: impl Into<String>) -> Self {
        SourceRef::Local(LocalSource { name: name.into() })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SourceRef::Local(_))
    }
}

/// A source as written in configuration: either shorthand text or a structured source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    Text(String),
    Source(SourceRef),
}

impl RawSource {
    pub fn into_source(self) -> SourceRef {
        match self {
            RawSource::Text(text) => parse_font(&text),
            RawSource::Source(source) => source,
        }
    }
}

/// `font-weight` of a face: a single value or a variable range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FontWeight {
    Fixed(String),
    Range(String, String),
}

impl FontWeight {
    pub fn fixed(weight: impl ToString) -> Self {
        FontWeight::Fixed(weight.to_string())
    }

    pub fn range(min: impl ToString, max: impl ToString) -> Self {
        FontWeight::Range(min.to_string(), max.to_string())
    }

    pub fn is_range(&self) -> bool {
        matches!(self, FontWeight::Range(..))
    }

    /// The value as written in a `font-weight` descriptor, e.g. `400` or `100 900`.
    pub fn to_css(&self) -> String {
        match self {
            FontWeight::Fixed(w) => w.clone(),
            FontWeight::Range(min, max) => format!("{min} {max}"),
        }
    }
}

impl Serialize for FontWeight {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FontWeight::Fixed(w) => serializer.serialize_str(w),
            FontWeight::Range(min, max) => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(min)?;
                tuple.serialize_element(max)?;
                tuple.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            One(Scalar),
            Pair([Scalar; 2]),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::One(w) => FontWeight::Fixed(w.into_string()),
            Repr::Pair([min, max]) => FontWeight::Range(min.into_string(), max.into_string()),
        })
    }
}

/// A string or number in JSON input; numbers are kept in their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub(crate) fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// One value or a list of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(v) => vec![v],
            OneOrMany::Many(v) => v,
        }
    }
}

fn protocol_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[\s\w\x00+.-]{2,}:[/\\]{1,2}").expect("valid regex"))
}

/// Whether `url` starts with a scheme (`https://`, `file:///`...), or is protocol-relative (`//`)
/// when `accept_relative` is set.
pub fn has_protocol(url: &str, accept_relative: bool) -> bool {
    if accept_relative {
        let mut slashes = url.chars().take_while(|c| matches!(c, '/' | '\\'));
        if slashes.next().is_some() && slashes.next().is_some() {
            let rest = url.trim_start_matches(['/', '\\']);
            if !rest.is_empty() {
                return true;
            }
        }
    }
    protocol_re().is_match(url)
}

/// Parses shorthand source text.
///
/// Absolute paths and URLs become remote sources with a `format` inferred from the extension;
/// anything else names an installed font.
pub fn parse_font(text: &str) -> SourceRef {
    if text.starts_with('/') || has_protocol(text, false) {
        let path = text.split(['?', '#']).next().unwrap_or(text);
        let format = path
            .rsplit_once('.')
            .filter(|(_, ext)| !ext.contains('/'))
            .and_then(|(_, ext)| format_for_extension(ext));
        return SourceRef::Remote(RemoteSource {
            url: text.to_string(),
            format: format.map(str::to_string),
            tech: None,
            original_url: None,
        });
    }
    SourceRef::local(text)
}

pub fn format_for_extension(extension: &str) -> Option<&'static str> {
    Some(match extension.to_ascii_lowercase().as_str() {
        "woff2" => "woff2",
        "woff" => "woff",
        "otf" => "opentype",
        "ttf" => "truetype",
        "eot" => "embedded-opentype",
        "svg" => "svg",
        _ => return None,
    })
}

/// File extension (with the leading dot) for a declared font format.
pub fn extension_for_format(format: &str) -> Option<&'static str> {
    Some(match format {
        "woff2" => ".woff2",
        "woff" => ".woff",
        "opentype" => ".otf",
        "truetype" => ".ttf",
        "embedded-opentype" => ".eot",
        "svg" => ".svg",
        _ => return None,
    })
}
