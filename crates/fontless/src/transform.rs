//! Stylesheet transformation: finding font families and injecting their `@font-face` rules.

use crate::fallback::FallbackFamily;
use crate::render::{generate_font_face, relativise_font_sources};
use crate::resolver::FontFaceResolution;
use crate::{Fontless, Result};
use fontless_css::{
    GenericFamily, Node, SourceEditor, SourceMap, SourceMapOptions, StyleSheet, Value,
    extract_end_of_first_child, extract_font_families, extract_generic, walk_declarations,
    walk_raws,
};
use futures::future::join_all;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, Default)]
pub struct TransformOptions {
    /// Rewrite root-relative font URLs relative to the stylesheet's directory.
    pub relative: bool,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    code: String,
    map: Option<SourceMap>,
}

impl TransformResult {
    fn unchanged(code: &str) -> Self {
        Self {
            code: code.to_string(),
            map: None,
        }
    }

    /// Whether anything was injected. Unchanged results carry the input verbatim and no map.
    pub fn has_changed(&self) -> bool {
        self.map.is_some()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn into_code(self) -> String {
        self.code
    }

    pub fn map(&self) -> Option<&SourceMap> {
        self.map.as_ref()
    }
}

/// Where the generated fallback names of a family go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackSplice {
    /// Byte offset in the transformed input, just after the first family.
    pub index: usize,
    pub generic: Option<GenericFamily>,
    /// The families the author listed after the first one.
    pub author_fallbacks: Vec<String>,
}

/// A declaration whose first family needs resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFamilyUse {
    pub family: String,
    /// `None` for unstructured values (custom properties), which are never spliced into.
    pub splice: Option<FallbackSplice>,
}

/// Finds the declarations whose first family should be resolved, in document order.
///
/// Families already declared by an authored `@font-face` are skipped. Block fragments kept as
/// raw text (nested rules) are parsed again and scanned with their offsets mapped back to `code`.
pub fn scan_font_families(code: &str, process_css_variables: bool) -> Result<Vec<FontFamilyUse>> {
    let sheet = fontless_css::parse(code)?;
    let mut existing = FxHashSet::default();
    let mut uses = Vec::new();
    scan_sheet(&sheet, 0, process_css_variables, &mut existing, &mut uses);
    Ok(uses)
}

fn is_font_property(property: &str, process_css_variables: bool) -> bool {
    property.eq_ignore_ascii_case("font-family")
        || property.eq_ignore_ascii_case("font")
        || (process_css_variables && property.starts_with("--"))
}

fn scan_sheet(
    sheet: &StyleSheet,
    offset: usize,
    process_css_variables: bool,
    existing: &mut FxHashSet<String>,
    uses: &mut Vec<FontFamilyUse>,
) {
    walk_declarations(sheet, |decl, cx| {
        if cx.in_atrule("font-face") && decl.property.eq_ignore_ascii_case("font-family") {
            existing.extend(extract_font_families(decl));
        }
    });

    walk_declarations(sheet, |decl, cx| {
        if cx.in_atrule("font-face") || !is_font_property(&decl.property, process_css_variables)
        {
            return;
        }
        let mut families = extract_font_families(decl).into_iter();
        let Some(family) = families.next() else {
            return;
        };
        if family.is_empty() || existing.contains(&family) {
            return;
        }
        let splice = match &decl.value {
            Value::List(_) => extract_end_of_first_child(decl).map(|index| FallbackSplice {
                index: index + offset,
                generic: extract_generic(decl),
                author_fallbacks: families.collect(),
            }),
            Value::Raw(_) => None,
        };
        uses.push(FontFamilyUse { family, splice });
    });

    walk_raws(sheet, |raw, _| match fontless_css::parse(&raw.value) {
        Ok(nested) if nested.children.iter().any(|n| matches!(n, Node::Rule(_))) => scan_sheet(
            &nested,
            offset + raw.span.start,
            process_css_variables,
            existing,
            uses,
        ),
        Ok(_) => {}
        Err(err) => tracing::debug!(error = %err, "skipping unparsable nested block"),
    });
}

fn css_request_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"\.(css|less|sass|scss|styl|stylus|pcss|postcss|sss)(?:$|\?)")
            .expect("valid regex")
    })
}

/// Modules that must never be transformed even though they look like stylesheets.
const SKIPPED_MODULES: &[&str] = &["/node_modules/vite-plugin-vue-inspector/"];

/// Whether a module id names a stylesheet (any preprocessor language, query strings allowed).
pub fn is_css_request(id: &str) -> bool {
    css_request_re().is_match(id) && !SKIPPED_MODULES.iter().any(|skip| id.contains(skip))
}

/// Directory of a module id as a `/`-rooted path (query string dropped).
fn module_dir(id: &str) -> String {
    let path = id.split('?').next().unwrap_or(id);
    let dir = path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if dir.starts_with('/') {
        dir.to_string()
    } else {
        format!("/{dir}")
    }
}

/// The rendered rules of one family and the fallback names to splice next to it.
#[derive(Debug, Default)]
struct FamilyOutput {
    declarations: Vec<String>,
    fallback_names: Vec<String>,
    /// Fallback names are only spliced when metric-adjusted faces exist for them.
    has_fallback_faces: bool,
}

impl FamilyOutput {
    fn splice_text(&self) -> String {
        let names: Vec<String> = self
            .fallback_names
            .iter()
            .map(|name| crate::render::css_string(name))
            .collect();
        format!(", {}", names.join(", "))
    }
}

type FamilyKey = (String, Option<GenericFamily>);

impl Fontless {
    /// Host entry point: transforms `code` if `id` is a stylesheet that may declare fonts.
    ///
    /// Returns `Ok(None)` when the module is skipped or nothing was injected.
    pub async fn transform(&self, code: &str, id: &str) -> Result<Option<TransformResult>> {
        if !is_css_request(id) {
            return Ok(None);
        }
        if !self.config.experimental.process_css_variables && !code.contains("font") {
            return Ok(None);
        }
        let result = self
            .transform_css(code, id, &TransformOptions::default())
            .await?;
        Ok(result.has_changed().then_some(result))
    }

    /// Injects `@font-face` rules for every resolvable family used in `code`.
    ///
    /// Generated rules are prepended (deduplicated by text) and generated fallback family names
    /// are inserted after the first family of each declaration. Unparsable CSS is an error.
    pub async fn transform_css(
        &self,
        code: &str,
        id: &str,
        options: &TransformOptions,
    ) -> Result<TransformResult> {
        let uses = scan_font_families(code, self.config.experimental.process_css_variables)?;
        if uses.is_empty() {
            return Ok(TransformResult::unchanged(code));
        }

        let keys: IndexSet<FamilyKey> = uses
            .iter()
            .map(|u| (u.family.clone(), u.splice.as_ref().and_then(|s| s.generic)))
            .collect();
        let outputs: Vec<Option<FamilyOutput>> = join_all(
            keys.iter()
                .map(|(family, generic)| self.render_family(family, *generic, id, options)),
        )
        .await;

        let mut editor = SourceEditor::new(code);
        let mut injected: FxHashSet<&str> = FxHashSet::default();
        let mut prefaces = String::new();
        for declaration in outputs.iter().flatten().flat_map(|o| &o.declarations) {
            if injected.insert(declaration.as_str()) {
                prefaces.push_str(&self.finish_declaration(declaration));
            }
        }
        for u in &uses {
            let Some(splice) = &u.splice else {
                continue;
            };
            let output = keys
                .get_index_of(&(u.family.clone(), splice.generic))
                .and_then(|i| outputs[i].as_ref());
            if let Some(output) = output.filter(|o| o.has_fallback_faces) {
                editor.prepend_left(splice.index, &output.splice_text());
            }
        }
        if !prefaces.is_empty() {
            editor.prepend(&prefaces);
        }
        if !editor.has_changed() {
            return Ok(TransformResult::unchanged(code));
        }

        let map = editor.generate_map(&SourceMapOptions {
            source: Some(id.to_string()),
            file: Some(id.to_string()),
            include_content: true,
            hires: true,
        });
        tracing::debug!(id, families = keys.len(), "injected font faces");
        Ok(TransformResult {
            code: editor.to_string(),
            map: Some(map),
        })
    }

    /// Rules for every family configured as global, for injection into a shared entry stylesheet.
    pub async fn global_css(&self) -> String {
        let mut injected = FxHashSet::default();
        let mut css = String::new();
        for family_override in self.config.families.iter().filter(|f| f.global) {
            let Some(resolution) = self
                .resolve_with_override(&family_override.name, Some(family_override), None)
                .await
            else {
                continue;
            };
            let output = self
                .render_resolution(&family_override.name, &resolution, None)
                .await;
            for declaration in output.declarations {
                if injected.insert(declaration.clone()) {
                    css.push_str(&self.finish_declaration(&declaration));
                }
            }
        }
        css
    }

    async fn render_family(
        &self,
        family: &str,
        generic: Option<GenericFamily>,
        id: &str,
        options: &TransformOptions,
    ) -> Option<FamilyOutput> {
        let resolution = self.resolve(family, generic).await?;
        let primary = resolution.fonts.first()?;
        if (self.should_preload)(family, primary) {
            if let Some(url) = primary.first_remote_url() {
                self.preload.add(id, url);
            }
        }
        let relative_to = options.relative.then(|| module_dir(id));
        Some(
            self.render_resolution(family, &resolution, relative_to.as_deref())
                .await,
        )
    }

    async fn render_resolution(
        &self,
        family: &str,
        resolution: &FontFaceResolution,
        relative_to: Option<&str>,
    ) -> FamilyOutput {
        let fallbacks = FallbackFamily::for_fonts(family, &resolution.fallbacks);
        let synthesizer = self.fallback_synthesizer();
        let mut output = FamilyOutput::default();
        for font in &resolution.fonts {
            let fallback_faces = synthesizer.font_fallbacks(family, font, &fallbacks).await;
            let face = match relative_to {
                Some(dir) => relativise_font_sources(font, dir),
                None => font.clone(),
            };
            output.declarations.push(generate_font_face(family, &face));
            output.has_fallback_faces |= !fallback_faces.is_empty();
            output.declarations.extend(fallback_faces);
        }
        output.fallback_names = fallbacks.into_iter().map(|f| f.name).collect();
        output
    }

    /// Minified outside dev mode; a rule the minifier rejects is kept as is.
    fn finish_declaration(&self, declaration: &str) -> String {
        if self.config.dev {
            return format!("{declaration}\n");
        }
        match self.minifier.minify(declaration) {
            Ok(minified) => minified,
            Err(err) => {
                tracing::debug!(error = %err, "keeping unminified font face");
                declaration.to_string()
            }
        }
    }
}
