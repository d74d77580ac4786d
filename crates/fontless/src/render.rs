//! Text generation for `@font-face` rules.

use crate::font::{FontFaceDescriptor, SourceRef};
use crate::metrics::FontMetrics;

/// A CSS string literal (double quoted, JSON escaping).
pub fn css_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{value}\""))
}

pub fn render_font_src(sources: &[SourceRef]) -> String {
    sources
        .iter()
        .map(|source| match source {
            SourceRef::Remote(remote) => {
                let mut rendered = format!("url({})", css_string(&remote.url));
                if let Some(format) = &remote.format {
                    rendered.push_str(&format!(" format({})", css_string(format)));
                }
                if let Some(tech) = &remote.tech {
                    rendered.push_str(&format!(" tech({tech})"));
                }
                rendered
            }
            SourceRef::Local(local) => format!("local({})", css_string(&local.name)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders one face as an `@font-face` rule (no trailing newline).
pub fn generate_font_face(family: &str, face: &FontFaceDescriptor) -> String {
    let mut lines = vec![
        "@font-face {".to_string(),
        format!("  font-family: {};", css_string(family)),
        format!("  src: {};", render_font_src(&face.src)),
        format!(
            "  font-display: {};",
            face.display.as_deref().unwrap_or("swap")
        ),
    ];
    if let Some(range) = face.unicode_range.as_ref().filter(|r| !r.is_empty()) {
        lines.push(format!("  unicode-range: {};", range.join(", ")));
    }
    if let Some(weight) = &face.weight {
        lines.push(format!("  font-weight: {};", weight.to_css()));
    }
    if let Some(style) = &face.style {
        lines.push(format!("  font-style: {style};"));
    }
    if let Some(settings) = &face.feature_settings {
        lines.push(format!("  font-feature-settings: {settings};"));
    }
    if let Some(settings) = &face.variation_settings {
        lines.push(format!("  font-variation-settings: {settings};"));
    }
    lines.push("}".to_string());
    lines.join("\n")
}

/// `value` as a percentage with at most four fractional digits (`1.0` -> `100%`).
pub fn to_percentage(value: f64) -> String {
    let fixed = format!("{:.4}", value * 100.0);
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    let trimmed = if trimmed == "-0" { "0" } else { trimmed };
    format!("{trimmed}%")
}

/// Renders a metric-adjusted face that maps `fallback_name` onto the installed `local_font`.
///
/// `fallback_metrics` (the metrics of `local_font`) scales the face to the primary font's average
/// character width; without them no size adjustment is applied.
pub fn generate_fallback_font_face(
    metrics: &FontMetrics,
    fallback_name: &str,
    local_font: &str,
    fallback_metrics: Option<&FontMetrics>,
) -> String {
    let preferred_ratio = metrics.x_width_avg / metrics.units_per_em;
    let size_adjust = match fallback_metrics {
        Some(fallback) => {
            let fallback_ratio = fallback.x_width_avg / fallback.units_per_em;
            if preferred_ratio > 0.0 && fallback_ratio > 0.0 {
                preferred_ratio / fallback_ratio
            } else {
                1.0
            }
        }
        None => 1.0,
    };
    let adjusted_em = metrics.units_per_em * size_adjust;
    let declarations = [
        ("font-family", css_string(fallback_name)),
        ("src", format!("local({})", css_string(local_font))),
        ("size-adjust", to_percentage(size_adjust)),
        ("ascent-override", to_percentage(metrics.ascent / adjusted_em)),
        (
            "descent-override",
            to_percentage(metrics.descent.abs() / adjusted_em),
        ),
        (
            "line-gap-override",
            to_percentage(metrics.line_gap / adjusted_em),
        ),
    ];
    let body = declarations
        .iter()
        .map(|(property, value)| format!("  {property}: {value};"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("@font-face {{\n{body}\n}}\n")
}

/// Rewrites root-relative source URLs to be relative to `relative_to` (a `/`-rooted directory).
pub fn relativise_font_sources(face: &FontFaceDescriptor, relative_to: &str) -> FontFaceDescriptor {
    let mut face = face.clone();
    for source in &mut face.src {
        if let SourceRef::Remote(remote) = source {
            if remote.url.starts_with('/') && !remote.url.starts_with("//") {
                remote.url = relative_path(relative_to, &remote.url);
            }
        }
    }
    face
}

/// Path from directory `from` to `to`; both are `/`-rooted.
pub fn relative_path(from: &str, to: &str) -> String {
    let from: Vec<&str> = from.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = to.split('/').filter(|s| !s.is_empty()).collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = std::iter::repeat_n("..", from.len() - common).collect();
    parts.extend(&to[common..]);
    parts.join("/")
}
