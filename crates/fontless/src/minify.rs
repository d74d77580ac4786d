//! Minification of generated CSS.

use crate::{Error, Result};
use fontless_css::tokenizer::{TokenKind, tokenize};

/// Minifies one generated rule. Failures are tolerated by the caller, which then keeps the
/// unminified text.
pub trait CssMinifier: Send + Sync {
    fn minify(&self, css: &str) -> Result<String>;
}

impl<F> CssMinifier for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn minify(&self, css: &str) -> Result<String> {
        self(css)
    }
}

/// Drops comments and insignificant whitespace, and the last `;` of each block.
///
/// Tokens come from `cssparser` through [`fontless_css::tokenizer`] and are written back as they
/// appear in the input, so strings and escapes survive byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceMinifier;

impl CssMinifier for WhitespaceMinifier {
    fn minify(&self, css: &str) -> Result<String> {
        let tokens = tokenize(css).map_err(|err| Error::Minify {
            message: err.to_string(),
        })?;
        let significant: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Comment)
            .collect();

        let mut out = String::with_capacity(css.len());
        for (i, token) in significant.iter().enumerate() {
            match token.kind {
                TokenKind::Whitespace => {
                    let prev = out.chars().last();
                    let next = significant.get(i + 1).map(|t| t.kind);
                    let tight_before = matches!(prev, None | Some('{' | '}' | ';' | ',' | ':'));
                    let tight_after = matches!(
                        next,
                        None | Some(
                            TokenKind::LeftBrace
                                | TokenKind::RightBrace
                                | TokenKind::Semicolon
                                | TokenKind::Comma
                                | TokenKind::Whitespace
                        )
                    );
                    if !tight_before && !tight_after {
                        out.push(' ');
                    }
                }
                TokenKind::Semicolon => {
                    let next = significant[i + 1..]
                        .iter()
                        .find(|t| t.kind != TokenKind::Whitespace)
                        .map(|t| t.kind);
                    if next != Some(TokenKind::RightBrace) {
                        out.push(';');
                    }
                }
                _ => out.push_str(token.text(css)),
            }
        }
        Ok(out)
    }
}
