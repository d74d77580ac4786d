use crate::Fontless;
use crate::config::{FamilyOverride, OverrideKind, ProviderOverride};
use crate::fallback::add_local_fallbacks;
use crate::font::FontFaceDescriptor;
use crate::provider::{ProviderResult, ResolveFontOptions};
use fontless_css::GenericFamily;
use indexmap::IndexSet;

/// Provider name that opts a family out of resolution.
pub const NO_PROVIDER: &str = "none";

/// Concrete faces for a family plus the names of the local fonts to synthesize fallbacks from.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FontFaceResolution {
    pub fonts: Vec<FontFaceDescriptor>,
    pub fallbacks: Vec<String>,
}

impl Fontless {
    /// Resolves a family to font faces.
    ///
    /// `generic` is the generic family keyword found next to the family (it selects the default
    /// fallback fonts). Returns `None` when the family is global, opted out, or unknown to every
    /// active provider.
    pub async fn resolve(
        &self,
        family: &str,
        generic: Option<GenericFamily>,
    ) -> Option<FontFaceResolution> {
        let family_override = self.config.family_override(family);
        if family_override.is_some_and(|o| o.global) {
            tracing::debug!(family, "font family is injected globally, skipping");
            return None;
        }
        self.resolve_with_override(family, family_override, generic)
            .await
    }

    pub(crate) async fn resolve_with_override(
        &self,
        family: &str,
        family_override: Option<&FamilyOverride>,
        generic: Option<GenericFamily>,
    ) -> Option<FontFaceResolution> {
        let fallbacks = self.defaults.fallbacks_for(generic).to_vec();

        let provider_override = match family_override.map(|o| &o.kind) {
            Some(OverrideKind::Manual(manual)) => {
                let fonts = self.assets.normalize(&[manual.to_descriptor()]);
                return Some(FontFaceResolution {
                    fonts: self.add_fallbacks(family, fonts),
                    fallbacks,
                });
            }
            Some(OverrideKind::Provider(provider)) => Some(provider),
            None => None,
        };
        let explicit = provider_override.and_then(|o| o.provider.as_deref());
        if explicit == Some(NO_PROVIDER) {
            tracing::debug!(family, "font family opted out of resolution");
            return None;
        }

        let options = self.lookup_options(provider_override, fallbacks);
        let order = self.provider_order();

        if let Some(explicit) = explicit.filter(|name| order.iter().any(|n| n == name)) {
            let result = self
                .providers
                .resolve_font(family, &options, &[explicit.to_string()])
                .await;
            let resolution = result.and_then(|(_, result)| self.finish(family, result, &options));
            if resolution.is_none() {
                tracing::warn!(
                    provider = explicit,
                    family,
                    "could not produce font face declaration from provider"
                );
            }
            return resolution;
        }

        let resolution = self
            .providers
            .resolve_font(family, &options, &order)
            .await
            .and_then(|(_, result)| self.finish(family, result, &options));
        if resolution.is_none() {
            if family_override.is_some() {
                tracing::warn!(family, "could not produce font face declaration with override");
            } else {
                tracing::warn!(family, "no provider could resolve font family");
            }
        }
        resolution
    }

    fn lookup_options(
        &self,
        provider_override: Option<&ProviderOverride>,
        fallbacks: Vec<String>,
    ) -> ResolveFontOptions {
        let pick = |value: Option<&Vec<String>>, default: &Vec<String>| {
            value.cloned().unwrap_or_else(|| default.clone())
        };
        ResolveFontOptions {
            weights: pick(
                provider_override.and_then(|o| o.weights.as_ref()),
                &self.defaults.weights,
            ),
            styles: pick(
                provider_override.and_then(|o| o.styles.as_ref()),
                &self.defaults.styles,
            ),
            subsets: pick(
                provider_override.and_then(|o| o.subsets.as_ref()),
                &self.defaults.subsets,
            ),
            fallbacks,
        }
    }

    /// Active providers: priority entries first, then the rest in registration order.
    pub fn provider_order(&self) -> Vec<String> {
        let active: Vec<&str> = self
            .providers
            .names()
            .filter(|name| self.config.provider_enabled(name))
            .collect();
        let mut order: IndexSet<&str> = self
            .config
            .priority
            .iter()
            .map(String::as_str)
            .filter(|name| active.contains(name))
            .collect();
        order.extend(active.iter().copied());
        order.into_iter().map(str::to_string).collect()
    }

    fn finish(
        &self,
        family: &str,
        result: ProviderResult,
        options: &ResolveFontOptions,
    ) -> Option<FontFaceResolution> {
        let fonts = self.assets.normalize(&result.fonts);
        if fonts.is_empty() {
            return None;
        }
        Some(FontFaceResolution {
            fonts: self.add_fallbacks(family, fonts),
            fallbacks: result
                .fallbacks
                .unwrap_or_else(|| options.fallbacks.clone()),
        })
    }

    fn add_fallbacks(&self, family: &str, fonts: Vec<FontFaceDescriptor>) -> Vec<FontFaceDescriptor> {
        if self.config.experimental.disable_local_fallbacks {
            return fonts;
        }
        add_local_fallbacks(family, &fonts)
    }
}
