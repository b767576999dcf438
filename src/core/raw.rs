//! Raw syntax tree handed to the normalizer by a source parser.
//!
//! The normalizer never looks at parser-specific node types. A `SourceParser`
//! (see `crate::core::parsers`) lowers whatever its backend produces into
//! `RawNode`s: one variant per node kind the normalizer dispatches on, plus
//! `RawKind::Other` for everything else.

use std::sync::Arc;

use anyhow::Result;

/// Position of a node in its source text.
///
/// Lines are 1-indexed, columns are 0-indexed byte offsets within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
    pub start_byte: usize,
    pub end_byte: usize,
}

impl SourceLocation {
    /// Location spanning a single line, used mostly by tests and synthetic nodes.
    pub fn line(line: usize) -> Self {
        Self {
            start_line: line,
            end_line: line,
            ..Default::default()
        }
    }

    /// Smallest location covering both `self` and `other`.
    pub fn cover(&self, other: &SourceLocation) -> SourceLocation {
        let (start, end) = if self.start_byte <= other.start_byte {
            (self, other)
        } else {
            (other, self)
        };
        SourceLocation {
            start_line: start.start_line,
            start_column: start.start_column,
            end_line: end.end_line,
            end_column: end.end_column,
            start_byte: start.start_byte,
            end_byte: end.end_byte,
        }
    }

    /// Source text covered by this location, if the byte range is valid for `source`.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start_byte..self.end_byte)
    }
}

/// A comment token as reported by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentToken {
    /// Full comment text including its marker (e.g. `# i18n-tasks-use t('a')`).
    pub text: String,
    /// 1-indexed line the comment starts on.
    pub line: usize,
}

impl CommentToken {
    pub fn new(text: impl Into<String>, line: usize) -> Self {
        Self {
            text: text.into(),
            line,
        }
    }
}

/// A raw syntax node.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub kind: RawKind,
    pub location: SourceLocation,
}

/// Method call site: `receiver.name(arguments) { block }`.
///
/// The subtrees are shared so a normalized call can keep them without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct CallSite {
    pub name: String,
    pub receiver: Option<Arc<RawNode>>,
    /// `RawKind::Arguments` node, absent for calls without an argument list.
    pub arguments: Option<Arc<RawNode>>,
    /// `RawKind::Block` node attached with `{ }` or `do ... end`.
    pub block: Option<Arc<RawNode>>,
}

/// Node kinds understood by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKind {
    /// Whole file.
    Program(Vec<RawNode>),
    /// Statement sequence (`begin ... end`, parenthesized statements, `then` bodies).
    Statements(Vec<RawNode>),
    /// `#{...}` inside an interpolated string.
    EmbeddedStatements(Vec<RawNode>),
    Module {
        name: String,
        body: Vec<RawNode>,
    },
    Class {
        name: String,
        body: Vec<RawNode>,
    },
    /// `name = value`, including operator assignments such as `||=`.
    VariableWrite {
        name: String,
        value: Box<RawNode>,
    },
    /// `a, b = value`.
    MultiWrite {
        targets: Vec<RawNode>,
        value: Box<RawNode>,
    },
    /// One target on the left-hand side of a multi-write.
    VariableTarget {
        name: String,
    },
    /// Method definition. An empty body is an empty vector.
    Def {
        name: String,
        body: Vec<RawNode>,
    },
    /// `if`, `elsif`, `unless`, modifier forms and the ternary operator.
    If {
        condition: Box<RawNode>,
        consequence: Option<Box<RawNode>>,
        alternative: Option<Box<RawNode>>,
    },
    /// `else` branch of a conditional.
    Else(Vec<RawNode>),
    And {
        left: Box<RawNode>,
        right: Box<RawNode>,
    },
    Or {
        left: Box<RawNode>,
        right: Box<RawNode>,
    },
    /// `-> { ... }` literal.
    Lambda {
        body: Vec<RawNode>,
    },
    /// Block attached to a call.
    Block {
        body: Vec<RawNode>,
    },
    Call(CallSite),
    /// `key => value` or `key: value`.
    Assoc {
        key: Box<RawNode>,
        value: Box<RawNode>,
    },
    Symbol(String),
    String(String),
    /// String with `#{}` parts: `String` fragments and `EmbeddedStatements`.
    InterpolatedString(Vec<RawNode>),
    Integer(String),
    Decimal(String),
    /// Constant reference, possibly scoped (`I18n`, `Foo::Bar`).
    Constant(String),
    /// Call argument list.
    Arguments(Vec<RawNode>),
    Array(Vec<RawNode>),
    /// Trailing keyword arguments of a call (`t(:a, scope: 'b')`).
    KeywordHash(Vec<RawNode>),
    /// `{ ... }` hash literal.
    Hash(Vec<RawNode>),
    /// Anything the normalizer has no dedicated behaviour for.
    Other {
        kind: String,
        children: Vec<RawNode>,
    },
}

impl RawNode {
    pub fn new(kind: RawKind, location: SourceLocation) -> Self {
        Self { kind, location }
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &str {
        match &self.kind {
            RawKind::Program(_) => "program",
            RawKind::Statements(_) => "statements",
            RawKind::EmbeddedStatements(_) => "embedded_statements",
            RawKind::Module { .. } => "module",
            RawKind::Class { .. } => "class",
            RawKind::VariableWrite { .. } => "variable_write",
            RawKind::MultiWrite { .. } => "multi_write",
            RawKind::VariableTarget { .. } => "variable_target",
            RawKind::Def { .. } => "def",
            RawKind::If { .. } => "if",
            RawKind::Else(_) => "else",
            RawKind::And { .. } => "and",
            RawKind::Or { .. } => "or",
            RawKind::Lambda { .. } => "lambda",
            RawKind::Block { .. } => "block",
            RawKind::Call(_) => "call",
            RawKind::Assoc { .. } => "assoc",
            RawKind::Symbol(_) => "symbol",
            RawKind::String(_) => "string",
            RawKind::InterpolatedString(_) => "interpolated_string",
            RawKind::Integer(_) => "integer",
            RawKind::Decimal(_) => "decimal",
            RawKind::Constant(_) => "constant",
            RawKind::Arguments(_) => "arguments",
            RawKind::Array(_) => "array",
            RawKind::KeywordHash(_) => "keyword_hash",
            RawKind::Hash(_) => "hash",
            RawKind::Other { kind, .. } => kind.as_str(),
        }
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&RawNode> {
        match &self.kind {
            RawKind::Program(nodes)
            | RawKind::Statements(nodes)
            | RawKind::EmbeddedStatements(nodes)
            | RawKind::Else(nodes)
            | RawKind::InterpolatedString(nodes)
            | RawKind::Arguments(nodes)
            | RawKind::Array(nodes)
            | RawKind::KeywordHash(nodes)
            | RawKind::Hash(nodes) => nodes.iter().collect(),
            RawKind::Module { body, .. }
            | RawKind::Class { body, .. }
            | RawKind::Def { body, .. }
            | RawKind::Lambda { body }
            | RawKind::Block { body } => body.iter().collect(),
            RawKind::VariableWrite { value, .. } => vec![value.as_ref()],
            RawKind::MultiWrite { targets, value } => {
                targets.iter().chain(std::iter::once(value.as_ref())).collect()
            }
            RawKind::If {
                condition,
                consequence,
                alternative,
            } => std::iter::once(condition.as_ref())
                .chain(consequence.as_deref())
                .chain(alternative.as_deref())
                .collect(),
            RawKind::And { left, right } | RawKind::Or { left, right } => {
                vec![left.as_ref(), right.as_ref()]
            }
            RawKind::Call(call) => call
                .receiver
                .as_deref()
                .into_iter()
                .chain(call.arguments.as_deref())
                .chain(call.block.as_deref())
                .collect(),
            RawKind::Assoc { key, value } => vec![key.as_ref(), value.as_ref()],
            RawKind::Other { children, .. } => children.iter().collect(),
            RawKind::VariableTarget { .. }
            | RawKind::Symbol(_)
            | RawKind::String(_)
            | RawKind::Integer(_)
            | RawKind::Decimal(_)
            | RawKind::Constant(_) => Vec::new(),
        }
    }
}

/// A parsed source file: its text, raw tree and comments.
#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub source: Arc<str>,
    pub root: RawNode,
    pub comments: Vec<CommentToken>,
}

/// Turns source text into a raw tree.
///
/// The magic comment index re-enters the parser for every embedded snippet, so
/// implementations must be callable repeatedly through a shared reference.
pub trait SourceParser: Send + Sync {
    fn parse(&self, source: &str) -> Result<ParsedSource>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn leaf(kind: RawKind, line: usize) -> RawNode {
        RawNode::new(kind, SourceLocation::line(line))
    }

    #[test]
    fn test_slice_returns_covered_text() {
        let location = SourceLocation {
            start_byte: 4,
            end_byte: 10,
            ..SourceLocation::line(1)
        };
        assert_eq!(location.slice("foo t('a') bar"), Some("t('a')"));
    }

    #[test]
    fn test_slice_out_of_range() {
        let location = SourceLocation {
            start_byte: 4,
            end_byte: 90,
            ..SourceLocation::line(1)
        };
        assert_eq!(location.slice("short"), None);
    }

    #[test]
    fn test_cover_orders_by_start() {
        let first = SourceLocation {
            start_line: 1,
            start_column: 2,
            end_line: 1,
            end_column: 5,
            start_byte: 2,
            end_byte: 5,
        };
        let second = SourceLocation {
            start_line: 2,
            start_column: 0,
            end_line: 2,
            end_column: 3,
            start_byte: 10,
            end_byte: 13,
        };
        let covered = second.cover(&first);
        assert_eq!(covered.start_byte, 2);
        assert_eq!(covered.end_byte, 13);
        assert_eq!(covered.start_line, 1);
        assert_eq!(covered.end_line, 2);
    }

    #[test]
    fn test_children_of_call_in_source_order() {
        let call = leaf(
            RawKind::Call(CallSite {
                name: "t".to_string(),
                receiver: Some(Arc::new(leaf(RawKind::Constant("I18n".into()), 1))),
                arguments: Some(Arc::new(leaf(
                    RawKind::Arguments(vec![leaf(RawKind::String("a".into()), 1)]),
                    1,
                ))),
                block: None,
            }),
            1,
        );
        let kinds: Vec<_> = call.children().iter().map(|c| c.kind_name()).collect();
        assert_eq!(kinds, vec!["constant", "arguments"]);
    }

    #[test]
    fn test_children_of_if_skip_missing_branches() {
        let node = leaf(
            RawKind::If {
                condition: Box::new(leaf(RawKind::Constant("A".into()), 1)),
                consequence: None,
                alternative: Some(Box::new(leaf(RawKind::Else(vec![]), 2))),
            },
            1,
        );
        let kinds: Vec<_> = node.children().iter().map(|c| c.kind_name()).collect();
        assert_eq!(kinds, vec!["constant", "else"]);
    }

    #[test]
    fn test_other_kind_name() {
        let node = leaf(
            RawKind::Other {
                kind: "return".into(),
                children: vec![],
            },
            1,
        );
        assert_eq!(node.kind_name(), "return");
    }
}
