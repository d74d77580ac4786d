use crate::ast::{
    AtRule, Block, Declaration, Node, Raw, Rule, StyleSheet, Value, ValueKind, ValueList,
    ValueNode,
};
use crate::tokenizer::{Component, in_block, next_component, skip_block};
use crate::{Error, Result, Span};
use cssparser::{Parser, ParserInput, Token};

/// At-rules whose block holds declarations rather than rules.
const DECLARATION_AT_RULES: &[&str] = &[
    "font-face",
    "page",
    "counter-style",
    "property",
    "font-palette-values",
    "viewport",
    "-ms-viewport",
];

/// Parses CSS text into a [`StyleSheet`] with byte offsets retained on every node.
///
/// Style rules nested inside declaration blocks are not parsed structurally; they surface as
/// [`Node::Raw`] children whose text can be parsed again with [`parse`].
pub fn parse(source: &str) -> Result<StyleSheet> {
    let mut input = ParserInput::new(source);
    let mut parser = Parser::new(&mut input);
    let children = rule_list(&mut parser, source, true)?;
    Ok(StyleSheet {
        children,
        span: Span::new(0, source.len()),
    })
}

/// Where a run of component values ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// A `;` at the given offset, consumed.
    Semicolon(usize),
    /// A `{` at the given offset. Its block has not been consumed.
    Block(usize),
    /// The end of the input, or a `}` closing the enclosing block.
    End(usize),
}

impl Stop {
    fn offset(self) -> usize {
        match self {
            Stop::Semicolon(at) | Stop::Block(at) | Stop::End(at) => at,
        }
    }
}

/// The non-trivia component values before a [`Stop`].
struct Run<'i> {
    components: Vec<Component<'i>>,
    stop: Stop,
}

impl Run<'_> {
    fn span(&self) -> Option<Span> {
        let first = self.components.first()?;
        let last = self.components.last()?;
        Some(Span::new(first.span.start, last.span.end))
    }

    fn span_or_empty(&self) -> Span {
        self.span().unwrap_or_else(|| {
            let at = self.stop.offset();
            Span::new(at, at)
        })
    }
}

/// Reads component values up to a `;`, an optional `{`, or the end of the enclosing block.
///
/// Nested `()`, `[]` and function blocks are consumed whole; their component span runs through
/// the closing delimiter.
fn run<'i>(parser: &mut Parser<'i, '_>, stop_at_block: bool) -> Result<Run<'i>> {
    let mut components = Vec::new();
    loop {
        let state = parser.state();
        let Some(mut component) = next_component(parser)? else {
            let end = parser.position().byte_index();
            return Ok(Run {
                components,
                stop: Stop::End(end),
            });
        };
        let stop = match component.token {
            Token::WhiteSpace(_) | Token::Comment(_) => continue,
            Token::Semicolon => Stop::Semicolon(component.span.start),
            Token::CurlyBracketBlock if stop_at_block => Stop::Block(component.span.start),
            Token::CloseCurlyBracket => {
                parser.reset(&state);
                Stop::End(component.span.start)
            }
            _ => {
                if component.opens_block() {
                    component.span.end = skip_block(parser, &component)?;
                }
                components.push(component);
                continue;
            }
        };
        return Ok(Run { components, stop });
    }
}

fn source_text(source: &str, span: Span) -> &str {
    source.get(span.start..span.end).unwrap_or_default()
}

fn raw(source: &str, span: Span) -> Raw {
    Raw {
        value: source_text(source, span).to_string(),
        span,
    }
}

fn rule_list(parser: &mut Parser<'_, '_>, source: &str, top_level: bool) -> Result<Vec<Node>> {
    let mut out = Vec::new();
    loop {
        let state = parser.state();
        let Some(component) = next_component(parser)? else {
            break;
        };
        match &component.token {
            Token::WhiteSpace(_)
            | Token::Comment(_)
            | Token::Semicolon
            | Token::CDO
            | Token::CDC => {}
            Token::CloseCurlyBracket if top_level => {
                return Err(Error::UnexpectedCloseBrace {
                    offset: component.span.start,
                });
            }
            Token::AtKeyword(name) => {
                let name = name.to_ascii_lowercase();
                out.push(Node::AtRule(at_rule(
                    parser,
                    source,
                    name,
                    component.span,
                    false,
                )?));
            }
            _ => {
                parser.reset(&state);
                out.push(qualified_rule_or_raw(parser, source)?);
            }
        }
    }
    Ok(out)
}

fn qualified_rule_or_raw(parser: &mut Parser<'_, '_>, source: &str) -> Result<Node> {
    let run = run(parser, true)?;
    let prelude = run.span_or_empty();
    match run.stop {
        Stop::Block(open) => {
            let block = block(parser, source, open, true)?;
            Ok(Node::Rule(Rule {
                prelude,
                span: Span::new(prelude.start, block.span.end),
                block,
            }))
        }
        Stop::Semicolon(_) | Stop::End(_) => Ok(Node::Raw(raw(source, prelude))),
    }
}

/// Parses the contents of the `{` block at `open`, which was just returned by the parser.
fn block(
    parser: &mut Parser<'_, '_>,
    source: &str,
    open: usize,
    declarations: bool,
) -> Result<Block> {
    let (children, closed) = in_block(parser, |nested| {
        if declarations {
            declaration_list(nested, source)
        } else {
            rule_list(nested, source, false)
        }
    })?;
    if !closed {
        return Err(Error::UnclosedBlock { offset: open });
    }
    Ok(Block {
        children,
        span: Span::new(open, parser.position().byte_index()),
    })
}

fn at_rule(
    parser: &mut Parser<'_, '_>,
    source: &str,
    name: String,
    keyword: Span,
    in_declarations: bool,
) -> Result<AtRule> {
    let run = run(parser, true)?;
    let prelude = run.span_or_empty();
    match run.stop {
        Stop::Block(open) => {
            let declarations = in_declarations || DECLARATION_AT_RULES.contains(&name.as_str());
            let block = block(parser, source, open, declarations)?;
            let span = Span::new(keyword.start, block.span.end);
            Ok(AtRule {
                name,
                prelude,
                block: Some(block),
                span,
            })
        }
        Stop::Semicolon(at) => Ok(AtRule {
            name,
            prelude,
            block: None,
            span: Span::new(keyword.start, at + 1),
        }),
        Stop::End(_) => Ok(AtRule {
            name,
            block: None,
            span: Span::new(keyword.start, prelude.end.max(keyword.end)),
            prelude,
        }),
    }
}

fn declaration_list(parser: &mut Parser<'_, '_>, source: &str) -> Result<Vec<Node>> {
    let mut out = Vec::new();
    loop {
        let state = parser.state();
        let Some(component) = next_component(parser)? else {
            break;
        };
        match &component.token {
            Token::WhiteSpace(_) | Token::Comment(_) | Token::Semicolon => {}
            Token::AtKeyword(name) => {
                let name = name.to_ascii_lowercase();
                out.push(Node::AtRule(at_rule(
                    parser,
                    source,
                    name,
                    component.span,
                    true,
                )?));
            }
            Token::Ident(_) => {
                if let Some(decl) = declaration(parser, source, component.span)? {
                    out.push(Node::Declaration(decl));
                    continue;
                }
                parser.reset(&state);
                out.push(Node::Raw(raw_in_declarations(parser, source)?));
            }
            _ => {
                parser.reset(&state);
                out.push(Node::Raw(raw_in_declarations(parser, source)?));
            }
        }
    }
    Ok(out)
}

/// Anything in a declaration block that is not a declaration, up to the next top-level `;`
/// or the end of the block.
fn raw_in_declarations(parser: &mut Parser<'_, '_>, source: &str) -> Result<Raw> {
    let run = run(parser, false)?;
    Ok(raw(source, run.span_or_empty()))
}

/// Parses `name: value` after the property identifier at `name`.
///
/// Returns `None` when the tokens after the name do not form a declaration; the caller rewinds.
fn declaration(
    parser: &mut Parser<'_, '_>,
    source: &str,
    name: Span,
) -> Result<Option<Declaration>> {
    let colon_end = loop {
        let Some(component) = next_component(parser)? else {
            return Ok(None);
        };
        match component.token {
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            Token::Colon => break component.span.end,
            _ => return Ok(None),
        }
    };

    let mut run = run(parser, true)?;
    if matches!(run.stop, Stop::Block(_)) {
        // `a:hover { ... }` inside a block is a nested rule, not a declaration.
        return Ok(None);
    }
    let end = run.span().map_or(colon_end, |span| span.end.max(colon_end));
    let important = strip_important(&mut run.components);
    let value_span = run.span().unwrap_or(Span::new(colon_end, colon_end));

    let property = source_text(source, name).to_string();
    let value = if property.starts_with("--") {
        Value::Raw(raw(source, value_span))
    } else {
        Value::List(ValueList {
            children: run
                .components
                .iter()
                .map(|component| value_node(component, source))
                .collect(),
            span: value_span,
        })
    };
    Ok(Some(Declaration {
        property,
        value,
        important,
        span: Span::new(name.start, end),
    }))
}

fn strip_important(components: &mut Vec<Component<'_>>) -> bool {
    let [.., bang, last] = components.as_slice() else {
        return false;
    };
    let important = matches!(bang.token, Token::Delim('!'))
        && matches!(&last.token, Token::Ident(name) if name.eq_ignore_ascii_case("important"));
    if important {
        components.truncate(components.len() - 2);
    }
    important
}

/// Splits a numeric token's text into its number and unit parts.
fn split_dimension(text: &str) -> (String, String) {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    (text[..i].to_string(), text[i..].to_string())
}

/// Identifiers, numbers, hashes and urls keep their text as written; quoted strings are
/// decoded.
fn value_node(component: &Component<'_>, source: &str) -> ValueNode {
    let text = source_text(source, component.span);
    let kind = match &component.token {
        Token::Ident(_) => ValueKind::Identifier(text.to_string()),
        Token::QuotedString(value) => ValueKind::String(value.to_string()),
        Token::Number { .. } => ValueKind::Number(text.to_string()),
        Token::Percentage { .. } => ValueKind::Percentage(text.trim_end_matches('%').to_string()),
        Token::Dimension { .. } => {
            let (value, unit) = split_dimension(text);
            ValueKind::Dimension { value, unit }
        }
        Token::Comma => ValueKind::Operator(','),
        Token::Delim('/') => ValueKind::Operator('/'),
        Token::Hash(_) | Token::IDHash(_) => {
            ValueKind::Hash(text.trim_start_matches('#').to_string())
        }
        Token::UnquotedUrl(_) => {
            let inner = text.get(4..text.len().saturating_sub(1)).unwrap_or("");
            ValueKind::Url(inner.trim().to_string())
        }
        Token::Function(name) => ValueKind::Function {
            name: name.to_string(),
        },
        _ => ValueKind::Other(text.to_string()),
    };
    ValueNode {
        kind,
        span: component.span,
    }
}
