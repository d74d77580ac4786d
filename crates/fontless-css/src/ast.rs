use crate::Span;

/// A parsed stylesheet (or a re-parsed raw fragment).
///
/// All spans are byte offsets into the text that was parsed. Fragments parsed out of a [`Raw`]
/// node are relative to the start of that raw node; callers add the raw node's start offset.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub children: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Rule(Rule),
    AtRule(AtRule),
    Declaration(Declaration),
    /// Content that could not be parsed as a declaration or rule in its context, e.g. a nested
    /// style rule inside a declaration block.
    Raw(Raw),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub prelude: Span,
    pub block: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Lowercased name without the leading `@`.
    pub name: String,
    pub prelude: Span,
    pub block: Option<Block>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub children: Vec<Node>,
    /// Covers the braces.
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Property name as written (custom properties keep their case).
    pub property: String,
    pub value: Value,
    pub important: bool,
    pub span: Span,
}

impl Declaration {
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    List(ValueList),
    /// Unparsed value text (custom properties).
    Raw(Raw),
}

impl Value {
    pub fn span(&self) -> Span {
        match self {
            Value::List(list) => list.span,
            Value::Raw(raw) => raw.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueList {
    pub children: Vec<ValueNode>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueNode {
    pub kind: ValueKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Identifier text as written (escapes are kept).
    Identifier(String),
    /// Decoded string contents.
    String(String),
    Number(String),
    Percentage(String),
    Dimension { value: String, unit: String },
    /// `,` or `/`.
    Operator(char),
    Function { name: String },
    Url(String),
    Hash(String),
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
    pub value: String,
    pub span: Span,
}
