//! Byte-offset preserving CSS tokens, read with `cssparser`.
//!
//! `cssparser` recovers from malformed input the way browsers do. Splicing into such input is
//! not safe, so [`next_component`] rejects unterminated strings and comments, and callers reject
//! curly blocks that reach the end of the input without their `}`.

use crate::{Error, Result, Span};
use cssparser::{ParseError, ParseErrorKind, Parser, ParserInput, Token as CssToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Whitespace,
    Comment,
    Ident,
    /// An identifier immediately followed by `(`. The span includes the parenthesis.
    Function,
    /// Unquoted `url(...)`, including the closing parenthesis.
    Url,
    AtKeyword,
    Hash,
    String,
    Number,
    Percentage,
    Dimension,
    Colon,
    Semicolon,
    Comma,
    LeftBrace,
    RightBrace,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Delim,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.span.start..self.span.end).unwrap_or_default()
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, TokenKind::Whitespace | TokenKind::Comment)
    }
}

/// Flattens `source` into tokens, nested blocks included, in source order.
///
/// Blocks contribute their opening token, their contents and (when present) their closing
/// token, so concatenating every token's text reproduces the input.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let mut tokens = Vec::new();
    flatten(&mut parser, &mut tokens)?;
    Ok(tokens)
}

fn flatten(parser: &mut Parser<'_, '_>, out: &mut Vec<Token>) -> Result<()> {
    while let Some(component) = next_component(parser)? {
        out.push(Token {
            kind: token_kind(&component.token),
            span: component.span,
        });
        let Some(close) = closing_kind(&component.token) else {
            continue;
        };
        let ((), closed) = in_block(parser, |nested| flatten(nested, out))?;
        let end = parser.position().byte_index();
        if closed {
            out.push(Token {
                kind: close,
                span: Span::new(end - 1, end),
            });
        } else if close == TokenKind::RightBrace {
            return Err(Error::UnclosedBlock {
                offset: component.span.start,
            });
        }
    }
    Ok(())
}

fn token_kind(token: &CssToken<'_>) -> TokenKind {
    match token {
        CssToken::WhiteSpace(_) => TokenKind::Whitespace,
        CssToken::Comment(_) => TokenKind::Comment,
        CssToken::Ident(_) => TokenKind::Ident,
        CssToken::Function(_) => TokenKind::Function,
        CssToken::UnquotedUrl(_) | CssToken::BadUrl(_) => TokenKind::Url,
        CssToken::AtKeyword(_) => TokenKind::AtKeyword,
        CssToken::Hash(_) | CssToken::IDHash(_) => TokenKind::Hash,
        CssToken::QuotedString(_) | CssToken::BadString(_) => TokenKind::String,
        CssToken::Number { .. } => TokenKind::Number,
        CssToken::Percentage { .. } => TokenKind::Percentage,
        CssToken::Dimension { .. } => TokenKind::Dimension,
        CssToken::Colon => TokenKind::Colon,
        CssToken::Semicolon => TokenKind::Semicolon,
        CssToken::Comma => TokenKind::Comma,
        CssToken::CurlyBracketBlock => TokenKind::LeftBrace,
        CssToken::CloseCurlyBracket => TokenKind::RightBrace,
        CssToken::ParenthesisBlock => TokenKind::LeftParen,
        CssToken::CloseParenthesis => TokenKind::RightParen,
        CssToken::SquareBracketBlock => TokenKind::LeftBracket,
        CssToken::CloseSquareBracket => TokenKind::RightBracket,
        _ => TokenKind::Delim,
    }
}

fn closing_kind(token: &CssToken<'_>) -> Option<TokenKind> {
    match token {
        CssToken::CurlyBracketBlock => Some(TokenKind::RightBrace),
        CssToken::ParenthesisBlock | CssToken::Function(_) => Some(TokenKind::RightParen),
        CssToken::SquareBracketBlock => Some(TokenKind::RightBracket),
        _ => None,
    }
}

/// A `cssparser` token and the bytes it covers.
///
/// For block openers the span covers the opener alone until the block is consumed.
#[derive(Debug, Clone)]
pub(crate) struct Component<'i> {
    pub token: CssToken<'i>,
    pub span: Span,
}

impl Component<'_> {
    pub(crate) fn opens_block(&self) -> bool {
        closing_kind(&self.token).is_some()
    }
}

/// The next token including whitespace and comments, or `None` at the end of the input or of
/// the enclosing block.
pub(crate) fn next_component<'i>(
    parser: &mut Parser<'i, '_>,
) -> Result<Option<Component<'i>>> {
    let start = parser.position();
    let token = match parser.next_including_whitespace_and_comments() {
        Ok(token) => token.clone(),
        Err(_) => return Ok(None),
    };
    let offset = start.byte_index();
    let text = parser.slice_from(start);
    match &token {
        CssToken::BadString(_) => return Err(Error::UnterminatedString { offset }),
        CssToken::QuotedString(_) if !is_closed_string(text) => {
            return Err(Error::UnterminatedString { offset });
        }
        CssToken::Comment(_) if text.len() < 4 || !text.ends_with("*/") => {
            return Err(Error::UnterminatedComment { offset });
        }
        _ => {}
    }
    Ok(Some(Component {
        token,
        span: Span::new(offset, offset + text.len()),
    }))
}

/// `cssparser` ends a string at EOF without complaint; a closed one ends with its own quote
/// that is not itself escaped.
fn is_closed_string(text: &str) -> bool {
    let bytes = text.as_bytes();
    let (Some(&open), Some(&close)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    if bytes.len() < 2 || open != close {
        return false;
    }
    let escapes = bytes[1..bytes.len() - 1]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    escapes % 2 == 0
}

/// Runs `parse` over the block whose opening token was just returned.
///
/// Also reports whether the block was closed before the end of the input.
pub(crate) fn in_block<'i, T>(
    parser: &mut Parser<'i, '_>,
    parse: impl FnOnce(&mut Parser<'i, '_>) -> Result<T>,
) -> Result<(T, bool)> {
    let (value, inner_end) = parser
        .parse_nested_block(|nested| {
            let value = parse(nested);
            let end = nested.position().byte_index();
            match value {
                Ok(value) => Ok((value, end)),
                Err(err) => Err(nested.new_custom_error::<Error, Error>(err)),
            }
        })
        .map_err(|err: ParseError<'i, Error>| match err.kind {
            ParseErrorKind::Custom(err) => err,
            ParseErrorKind::Basic(_) => Error::Syntax {
                line: err.location.line,
                column: err.location.column,
            },
        })?;
    Ok((value, parser.position().byte_index() > inner_end))
}

/// Consumes the block opened by `opener`, checking the tokens inside it, and returns the
/// offset just past it.
pub(crate) fn skip_block(parser: &mut Parser<'_, '_>, opener: &Component<'_>) -> Result<usize> {
    let ((), closed) = in_block(parser, |nested| {
        while let Some(component) = next_component(nested)? {
            if component.opens_block() {
                skip_block(nested, &component)?;
            }
        }
        Ok(())
    })?;
    if !closed && matches!(opener.token, CssToken::CurlyBracketBlock) {
        return Err(Error::UnclosedBlock {
            offset: opener.span.start,
        });
    }
    Ok(parser.position().byte_index())
}
