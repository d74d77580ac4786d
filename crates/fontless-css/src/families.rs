//! Font-family value helpers.

use crate::ast::{Declaration, Value, ValueKind, ValueNode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The CSS generic font family keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenericFamily {
    Serif,
    SansSerif,
    Monospace,
    Cursive,
    Fantasy,
    SystemUi,
    UiSerif,
    UiSansSerif,
    UiMonospace,
    UiRounded,
    Emoji,
    Math,
    Fangsong,
}

impl GenericFamily {
    pub const ALL: [GenericFamily; 13] = [
        GenericFamily::Serif,
        GenericFamily::SansSerif,
        GenericFamily::Monospace,
        GenericFamily::Cursive,
        GenericFamily::Fantasy,
        GenericFamily::SystemUi,
        GenericFamily::UiSerif,
        GenericFamily::UiSansSerif,
        GenericFamily::UiMonospace,
        GenericFamily::UiRounded,
        GenericFamily::Emoji,
        GenericFamily::Math,
        GenericFamily::Fangsong,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GenericFamily::Serif => "serif",
            GenericFamily::SansSerif => "sans-serif",
            GenericFamily::Monospace => "monospace",
            GenericFamily::Cursive => "cursive",
            GenericFamily::Fantasy => "fantasy",
            GenericFamily::SystemUi => "system-ui",
            GenericFamily::UiSerif => "ui-serif",
            GenericFamily::UiSansSerif => "ui-sans-serif",
            GenericFamily::UiMonospace => "ui-monospace",
            GenericFamily::UiRounded => "ui-rounded",
            GenericFamily::Emoji => "emoji",
            GenericFamily::Math => "math",
            GenericFamily::Fangsong => "fangsong",
        }
    }

    /// Matches a keyword exactly (CSS keywords are case-insensitive, family names are not
    /// normalized anywhere else either).
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == keyword)
    }
}

impl fmt::Display for GenericFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const GLOBAL_CSS_VALUES: &[&str] = &["inherit", "initial", "revert", "revert-layer", "unset"];

fn is_keyword(name: &str) -> bool {
    GenericFamily::from_keyword(name).is_some() || GLOBAL_CSS_VALUES.contains(&name)
}

/// The value components that make up the family list.
///
/// For the `font` shorthand the family list follows `<font-size>[/<line-height>]`; style,
/// variant, weight and stretch keywords before the size are not family names. A shorthand with
/// no size (a system font keyword such as `caption`) has no family list.
fn family_nodes(decl: &Declaration) -> Option<&[ValueNode]> {
    let Value::List(list) = &decl.value else {
        return None;
    };
    let children = list.children.as_slice();
    if !decl.property.eq_ignore_ascii_case("font") {
        return Some(children);
    }
    let size = children.iter().position(|c| {
        matches!(
            c.kind,
            ValueKind::Dimension { .. } | ValueKind::Percentage(_) | ValueKind::Function { .. }
        ) || matches!(&c.kind, ValueKind::Identifier(name) if is_absolute_size_keyword(name))
    })?;
    let mut rest = &children[size + 1..];
    if rest
        .first()
        .is_some_and(|c| matches!(c.kind, ValueKind::Operator('/')))
    {
        rest = rest.get(2..).unwrap_or(&[]);
    }
    Some(rest)
}

fn is_absolute_size_keyword(name: &str) -> bool {
    matches!(
        name,
        "xx-small"
            | "x-small"
            | "small"
            | "medium"
            | "large"
            | "x-large"
            | "xx-large"
            | "xxx-large"
            | "smaller"
            | "larger"
    )
}

/// Extracts the family names from a `font-family`/`font` (or custom property) declaration.
///
/// Unquoted multi-word names are joined with single spaces, generic keywords and CSS-wide
/// keywords are dropped, quoted names are kept verbatim.
pub fn extract_font_families(decl: &Declaration) -> Vec<String> {
    if let Value::Raw(raw) = &decl.value {
        return split_raw_families(&raw.value);
    }
    let Some(nodes) = family_nodes(decl) else {
        return Vec::new();
    };

    let mut families = Vec::new();
    let mut buffer = String::new();
    for child in nodes {
        match &child.kind {
            ValueKind::Identifier(name) if !is_keyword(name) => {
                if !buffer.is_empty() {
                    buffer.push(' ');
                }
                buffer.push_str(name);
            }
            ValueKind::Operator(',') if !buffer.is_empty() => {
                families.push(buffer.replace('\\', ""));
                buffer.clear();
            }
            ValueKind::Dimension { value, unit } if !buffer.is_empty() => {
                buffer = format!("{buffer} {value}{unit}").trim().to_string();
            }
            ValueKind::String(value) => families.push(value.clone()),
            _ => {}
        }
    }
    if !buffer.is_empty() {
        families.push(buffer.replace('\\', ""));
    }
    families
}

fn split_raw_families(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quote: Option<char> = None;
    let flush = |cur: &mut String, out: &mut Vec<String>| {
        let part = cur.trim();
        let unquoted = part
            .strip_prefix('"')
            .and_then(|p| p.strip_suffix('"'))
            .or_else(|| part.strip_prefix('\'').and_then(|p| p.strip_suffix('\'')));
        match unquoted {
            Some(name) if !name.is_empty() => out.push(name.to_string()),
            Some(_) => {}
            None => {
                let name = part.split_whitespace().collect::<Vec<_>>().join(" ");
                if !name.is_empty() && !is_keyword(&name) {
                    out.push(name);
                }
            }
        }
        cur.clear();
    };
    for ch in raw.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                cur.push(c);
            }
            (None, '"' | '\'') => {
                quote = Some(ch);
                cur.push(ch);
            }
            (None, ',') => flush(&mut cur, &mut out),
            _ => cur.push(ch),
        }
    }
    flush(&mut cur, &mut out);
    out
}

/// Returns the first generic family keyword in a structured value.
pub fn extract_generic(decl: &Declaration) -> Option<GenericFamily> {
    family_nodes(decl)?.iter().find_map(|child| match &child.kind {
        ValueKind::Identifier(name) => GenericFamily::from_keyword(name),
        _ => None,
    })
}

/// Byte offset just after the first family in a structured value: the end of the first quoted
/// name, or the start of the first comma, or the end of the value.
pub fn extract_end_of_first_child(decl: &Declaration) -> Option<usize> {
    let nodes = family_nodes(decl)?;
    for child in nodes {
        match child.kind {
            ValueKind::String(_) => return Some(child.span.end),
            ValueKind::Operator(',') => return Some(child.span.start),
            _ => {}
        }
    }
    nodes.last().map(|c| c.span.end)
}
