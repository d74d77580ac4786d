//! Vertical and horizontal font metrics used to size fallback faces.

use allsorts::binary::read::ReadScope;
use allsorts::font_data::FontData;
use allsorts::tables::FontTableProvider;
use allsorts::tag;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, OnceLock, PoisonError};

/// Metrics in font design units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub units_per_em: f64,
    pub ascent: f64,
    /// Negative below the baseline.
    pub descent: f64,
    pub line_gap: f64,
    /// Average advance width of lowercase latin text, weighted by letter frequency.
    pub x_width_avg: f64,
}

impl FontMetrics {
    pub const fn new(
        units_per_em: f64,
        ascent: f64,
        descent: f64,
        line_gap: f64,
        x_width_avg: f64,
    ) -> Self {
        Self {
            units_per_em,
            ascent,
            descent,
            line_gap,
            x_width_avg,
        }
    }

    /// Reads metrics from a font binary: OpenType/TrueType (first face of a collection), WOFF or
    /// WOFF2.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        match ttf_parser::Face::parse(data, 0) {
            Ok(face) => Self::from_face(&face),
            Err(_) => Self::from_web_font(data),
        }
    }

    /// Unpacks the tables of a WOFF or WOFF2 container and reads them like an sfnt.
    fn from_web_font(data: &[u8]) -> Option<Self> {
        let font = ReadScope::new(data).read::<FontData<'_>>().ok()?;
        let provider = font.table_provider(0).ok()?;
        let table = |tag: u32| provider.table_data(tag).ok().flatten();
        let (head, hhea, maxp) = (table(tag::HEAD)?, table(tag::HHEA)?, table(tag::MAXP)?);
        let (hmtx, cmap, os2) = (table(tag::HMTX), table(tag::CMAP), table(tag::OS_2));
        let tables = ttf_parser::RawFaceTables {
            head: &head,
            hhea: &hhea,
            maxp: &maxp,
            hmtx: hmtx.as_deref(),
            cmap: cmap.as_deref(),
            os2: os2.as_deref(),
            ..Default::default()
        };
        let face = ttf_parser::Face::from_raw_tables(tables).ok()?;
        Self::from_face(&face)
    }

    pub fn from_face(face: &ttf_parser::Face<'_>) -> Option<Self> {
        let units_per_em = face.units_per_em();
        if units_per_em == 0 {
            return None;
        }
        Some(Self {
            units_per_em: f64::from(units_per_em),
            ascent: f64::from(face.ascender()),
            descent: f64::from(face.descender()),
            line_gap: f64::from(face.line_gap()),
            x_width_avg: x_width_avg(face)?,
        })
    }
}

/// Relative frequency of characters in English text.
const CHAR_WEIGHTS: &[(char, f64)] = &[
    ('a', 0.0668),
    ('b', 0.0122),
    ('c', 0.0228),
    ('d', 0.0348),
    ('e', 0.1039),
    ('f', 0.0182),
    ('g', 0.0165),
    ('h', 0.0499),
    ('i', 0.0570),
    ('j', 0.0013),
    ('k', 0.0063),
    ('l', 0.0329),
    ('m', 0.0197),
    ('n', 0.0552),
    ('o', 0.0614),
    ('p', 0.0158),
    ('q', 0.0008),
    ('r', 0.0490),
    ('s', 0.0518),
    ('t', 0.0741),
    ('u', 0.0225),
    ('v', 0.0080),
    ('w', 0.0193),
    ('x', 0.0012),
    ('y', 0.0162),
    ('z', 0.0006),
    (' ', 0.1818),
];

fn x_width_avg(face: &ttf_parser::Face<'_>) -> Option<f64> {
    let mut total = 0.0;
    let mut weight_sum = 0.0;
    for &(ch, weight) in CHAR_WEIGHTS {
        let Some(advance) = face
            .glyph_index(ch)
            .and_then(|glyph| face.glyph_hor_advance(glyph))
        else {
            continue;
        };
        total += f64::from(advance) * weight;
        weight_sum += weight;
    }
    // Renormalize when some glyphs are missing.
    (weight_sum > 0.0).then(|| total / weight_sum)
}

static BUILTIN_METRICS: OnceLock<FxHashMap<String, FontMetrics>> = OnceLock::new();

fn builtin_table() -> &'static FxHashMap<String, FontMetrics> {
    BUILTIN_METRICS.get_or_init(|| {
        let json_text = include_str!("generated/font_metrics.json");
        serde_json::from_str(json_text).expect("generated font metrics JSON is valid")
    })
}

/// Metrics of common system and web fonts, keyed by family name ignoring case and whitespace.
pub fn builtin_metrics(family: &str) -> Option<FontMetrics> {
    let key: String = family
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();
    builtin_table().get(&key).copied()
}

/// Metrics lookups: registered families first, then the built-in table.
///
/// Metrics read from downloaded font files are remembered per URL.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    families: Mutex<FxHashMap<String, FontMetrics>>,
    by_url: Mutex<FxHashMap<String, Option<FontMetrics>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, family: impl Into<String>, metrics: FontMetrics) {
        self.families
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(family.into(), metrics);
    }

    pub fn for_family(&self, family: &str) -> Option<FontMetrics> {
        let registered = self
            .families
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(family)
            .copied();
        registered.or_else(|| builtin_metrics(family))
    }

    /// Previously read metrics for `url`; the outer `None` means the URL was never read.
    pub fn for_url(&self, url: &str) -> Option<Option<FontMetrics>> {
        self.by_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(url)
            .copied()
    }

    /// Parses `data` and remembers the outcome for `url`.
    pub fn read_for_url(&self, url: &str, data: &[u8]) -> Option<FontMetrics> {
        let metrics = FontMetrics::from_font_data(data);
        if metrics.is_none() {
            tracing::debug!(url, "font data has no readable metrics");
        }
        self.by_url
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), metrics);
        metrics
    }
}
