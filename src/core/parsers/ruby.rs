//! Ruby source parser backed by tree-sitter.
//!
//! Lowers the tree-sitter-ruby concrete syntax tree into `RawNode`s. Only the
//! node kinds the normalizer dispatches on get a dedicated `RawKind`;
//! everything else is kept as `RawKind::Other` with its named children so
//! calls nested in it are still reachable.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tree_sitter::{Node, Parser};

use crate::core::raw::{
    CallSite, CommentToken, ParsedSource, RawKind, RawNode, SourceLocation, SourceParser,
};

/// Node kinds that hold parameters rather than statements.
const PARAMETER_KINDS: &[&str] = &[
    "method_parameters",
    "parameters",
    "block_parameters",
    "lambda_parameters",
    "superclass",
];

/// Kinds that wrap a statement list and are spliced into their parent's body.
const BODY_KINDS: &[&str] = &["body_statement", "block_body"];

/// Ruby parser for files and magic comment snippets.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyParser;

impl SourceParser for RubyParser {
    fn parse(&self, source: &str) -> Result<ParsedSource> {
        parse_ruby_source(source)
    }
}

/// Parse Ruby source into a raw tree plus its comments.
///
/// Fails when the source has syntax errors; the raw tree is never built from a
/// partially recovered parse.
pub fn parse_ruby_source(source: &str) -> Result<ParsedSource> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_ruby::LANGUAGE.into())
        .map_err(|e| anyhow!("Failed to load Ruby grammar: {}", e))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| anyhow!("Failed to parse ruby source"))?;
    let root = tree.root_node();

    if root.has_error() {
        match first_error(root) {
            Some(node) => bail!(
                "Syntax error at line {}, column {}",
                node.start_position().row + 1,
                node.start_position().column + 1
            ),
            None => bail!("Syntax error"),
        }
    }

    let source: Arc<str> = Arc::from(source);
    let lowering = Lowering { source: &source };
    let raw = lowering.lower(root);

    let mut comments = Vec::new();
    lowering.collect_comments(root, &mut comments);

    Ok(ParsedSource {
        source,
        root: raw,
        comments,
    })
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

fn location(node: Node<'_>) -> SourceLocation {
    let start = node.start_position();
    let end = node.end_position();
    SourceLocation {
        start_line: start.row + 1,
        start_column: start.column,
        end_line: end.row + 1,
        end_column: end.column,
        start_byte: node.start_byte(),
        end_byte: node.end_byte(),
    }
}

/// Named, non-comment children with the field each one is stored under.
fn named_children<'t>(node: Node<'t>) -> Vec<(Option<&'static str>, Node<'t>)> {
    let mut out = Vec::new();
    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = cursor.node();
            if child.is_named() && !child.is_extra() && child.kind() != "comment" {
                out.push((cursor.field_name(), child));
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    out
}

struct Lowering<'s> {
    source: &'s str,
}

impl Lowering<'_> {
    fn text(&self, node: Node<'_>) -> String {
        node.utf8_text(self.source.as_bytes())
            .unwrap_or_default()
            .to_string()
    }

    fn field_text(&self, node: Node<'_>, field: &str) -> String {
        node.child_by_field_name(field)
            .map(|child| self.text(child))
            .unwrap_or_default()
    }

    fn field(&self, node: Node<'_>, field: &str) -> Option<Box<RawNode>> {
        node.child_by_field_name(field)
            .map(|child| Box::new(self.lower(child)))
    }

    fn shared_field(&self, node: Node<'_>, field: &str) -> Option<Arc<RawNode>> {
        node.child_by_field_name(field)
            .map(|child| Arc::new(self.lower(child)))
    }

    fn collect_comments(&self, node: Node<'_>, out: &mut Vec<CommentToken>) {
        if node.kind() == "comment" {
            out.push(CommentToken::new(
                self.text(node),
                node.start_position().row + 1,
            ));
            return;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect_comments(child, out);
        }
    }

    fn lower(&self, node: Node<'_>) -> RawNode {
        let kind = match node.kind() {
            "program" => RawKind::Program(self.statements(node)),
            "body_statement" | "block_body" | "begin" | "parenthesized_statements" | "then"
            | "ensure" => RawKind::Statements(self.statements(node)),
            "else" => RawKind::Else(self.statements(node)),
            "interpolation" => RawKind::EmbeddedStatements(self.statements(node)),
            "module" => RawKind::Module {
                name: self.field_text(node, "name"),
                body: self.body(node, &["name"]),
            },
            "class" => RawKind::Class {
                name: self.field_text(node, "name"),
                body: self.body(node, &["name", "superclass"]),
            },
            "singleton_class" => RawKind::Class {
                name: format!("<< {}", self.field_text(node, "value")),
                body: self.body(node, &["value"]),
            },
            "method" => RawKind::Def {
                name: self.field_text(node, "name"),
                body: self.body(node, &["name", "parameters"]),
            },
            "singleton_method" => RawKind::Def {
                name: format!(
                    "{}.{}",
                    self.field_text(node, "object"),
                    self.field_text(node, "name")
                ),
                body: self.body(node, &["object", "name", "parameters"]),
            },
            "assignment" | "operator_assignment" => self.assignment(node),
            "if" | "unless" | "elsif" | "conditional" => self.conditional(node, "consequence"),
            "if_modifier" | "unless_modifier" => self.conditional(node, "body"),
            "binary" => self.binary(node),
            "lambda" => RawKind::Lambda {
                body: node
                    .child_by_field_name("body")
                    .map(|body| self.block_statements(body))
                    .unwrap_or_default(),
            },
            "block" | "do_block" => RawKind::Block {
                body: self.block_statements(node),
            },
            "call" => RawKind::Call(CallSite {
                name: node
                    .child_by_field_name("method")
                    .map(|method| self.text(method))
                    .unwrap_or_else(|| "call".to_string()),
                receiver: self.shared_field(node, "receiver"),
                arguments: self.shared_field(node, "arguments"),
                block: self.shared_field(node, "block"),
            }),
            // A bare identifier statement is a receiverless call without arguments
            // (`private`, or a local variable read we can't tell apart).
            "identifier" => RawKind::Call(CallSite {
                name: self.text(node),
                receiver: None,
                arguments: None,
                block: None,
            }),
            "argument_list" => RawKind::Arguments(self.arguments(node)),
            "pair" => self.pair(node),
            "simple_symbol" => RawKind::Symbol(self.text(node).trim_start_matches(':').to_string()),
            "hash_key_symbol" => RawKind::Symbol(self.text(node)),
            "delimited_symbol" => match self.string_parts(node) {
                StringParts::Plain(text) => RawKind::Symbol(text),
                StringParts::Interpolated(parts) => RawKind::InterpolatedString(parts),
            },
            "string" => match self.string_parts(node) {
                StringParts::Plain(text) => RawKind::String(text),
                StringParts::Interpolated(parts) => RawKind::InterpolatedString(parts),
            },
            "integer" => RawKind::Integer(self.text(node)),
            "float" => RawKind::Decimal(self.text(node)),
            "constant" | "scope_resolution" => RawKind::Constant(self.text(node)),
            "array" => RawKind::Array(self.statements(node)),
            "hash" => RawKind::Hash(self.statements(node)),
            other => RawKind::Other {
                kind: other.to_string(),
                children: self.statements(node),
            },
        };
        RawNode::new(kind, location(node))
    }

    fn statements(&self, node: Node<'_>) -> Vec<RawNode> {
        named_children(node)
            .into_iter()
            .map(|(_, child)| self.lower(child))
            .collect()
    }

    /// Body of a module, class or method: every named child except the
    /// `skip` fields and parameter lists, with `body_statement` spliced in.
    fn body(&self, node: Node<'_>, skip: &[&str]) -> Vec<RawNode> {
        let mut out = Vec::new();
        for (field, child) in named_children(node) {
            if field.is_some_and(|field| skip.contains(&field))
                || PARAMETER_KINDS.contains(&child.kind())
            {
                continue;
            }
            if BODY_KINDS.contains(&child.kind()) {
                out.extend(self.statements(child));
            } else {
                out.push(self.lower(child));
            }
        }
        out
    }

    fn block_statements(&self, node: Node<'_>) -> Vec<RawNode> {
        self.body(node, &["parameters"])
    }

    fn assignment(&self, node: Node<'_>) -> RawKind {
        let (Some(left), Some(right)) = (
            node.child_by_field_name("left"),
            node.child_by_field_name("right"),
        ) else {
            return RawKind::Other {
                kind: node.kind().to_string(),
                children: self.statements(node),
            };
        };

        let value = Box::new(self.lower(right));
        if left.kind() == "left_assignment_list" {
            let targets = named_children(left)
                .into_iter()
                .map(|(_, target)| {
                    RawNode::new(
                        RawKind::VariableTarget {
                            name: self.text(target),
                        },
                        location(target),
                    )
                })
                .collect();
            RawKind::MultiWrite { targets, value }
        } else {
            RawKind::VariableWrite {
                name: self.text(left),
                value,
            }
        }
    }

    fn conditional(&self, node: Node<'_>, consequence_field: &str) -> RawKind {
        let Some(condition) = self.field(node, "condition") else {
            return RawKind::Other {
                kind: node.kind().to_string(),
                children: self.statements(node),
            };
        };
        RawKind::If {
            condition,
            consequence: self.field(node, consequence_field),
            alternative: self.field(node, "alternative"),
        }
    }

    fn binary(&self, node: Node<'_>) -> RawKind {
        let operator = node
            .child_by_field_name("operator")
            .map(|op| op.kind())
            .unwrap_or_default();
        let (Some(left), Some(right)) = (self.field(node, "left"), self.field(node, "right"))
        else {
            return RawKind::Other {
                kind: node.kind().to_string(),
                children: self.statements(node),
            };
        };
        match operator {
            "and" | "&&" => RawKind::And { left, right },
            "or" | "||" => RawKind::Or { left, right },
            _ => RawKind::Other {
                kind: format!("binary({})", operator),
                children: vec![*left, *right],
            },
        }
    }

    /// Call arguments. Trailing `key: value` pairs and `**splat`s are grouped
    /// into one keyword hash placed where the first of them appeared.
    fn arguments(&self, node: Node<'_>) -> Vec<RawNode> {
        let mut items = Vec::new();
        let mut keywords: Vec<RawNode> = Vec::new();
        let mut keyword_slot = None;

        for (_, child) in named_children(node) {
            match child.kind() {
                "pair" | "hash_splat_argument" => {
                    keyword_slot.get_or_insert(items.len());
                    keywords.push(self.lower(child));
                }
                _ => items.push(self.lower(child)),
            }
        }

        if let Some(slot) = keyword_slot {
            let location = match (keywords.first(), keywords.last()) {
                (Some(first), Some(last)) => first.location.cover(&last.location),
                _ => SourceLocation::default(),
            };
            items.insert(slot, RawNode::new(RawKind::KeywordHash(keywords), location));
        }
        items
    }

    fn pair(&self, node: Node<'_>) -> RawKind {
        let Some(key_node) = node.child_by_field_name("key") else {
            return RawKind::Other {
                kind: "pair".to_string(),
                children: self.statements(node),
            };
        };
        let key = Box::new(self.lower(key_node));
        // `{ name: }` shorthand reads the local of the same name.
        let value = self.field(node, "value").unwrap_or_else(|| {
            Box::new(RawNode::new(
                RawKind::Call(CallSite {
                    name: self.text(key_node).trim_end_matches(':').to_string(),
                    receiver: None,
                    arguments: None,
                    block: None,
                }),
                location(key_node),
            ))
        });
        RawKind::Assoc { key, value }
    }

    fn string_parts(&self, node: Node<'_>) -> StringParts {
        let mut parts = Vec::new();
        let mut fragment: Option<(String, SourceLocation)> = None;
        let mut interpolated = false;

        for (_, child) in named_children(node) {
            let text = match child.kind() {
                "string_content" => self.text(child),
                "escape_sequence" => unescape(&self.text(child)),
                "interpolation" => {
                    interpolated = true;
                    if let Some((text, location)) = fragment.take() {
                        parts.push(RawNode::new(RawKind::String(text), location));
                    }
                    parts.push(self.lower(child));
                    continue;
                }
                _ => continue,
            };
            match fragment.as_mut() {
                Some((buffer, span)) => {
                    buffer.push_str(&text);
                    *span = span.cover(&location(child));
                }
                None => fragment = Some((text, location(child))),
            }
        }

        if !interpolated {
            return StringParts::Plain(fragment.map(|(text, _)| text).unwrap_or_default());
        }
        if let Some((text, location)) = fragment {
            parts.push(RawNode::new(RawKind::String(text), location));
        }
        StringParts::Interpolated(parts)
    }
}

enum StringParts {
    Plain(String),
    Interpolated(Vec<RawNode>),
}

fn unescape(sequence: &str) -> String {
    match sequence {
        "\\n" => "\n".to_string(),
        "\\t" => "\t".to_string(),
        "\\r" => "\r".to_string(),
        "\\s" => " ".to_string(),
        "\\0" => "\0".to_string(),
        "\\e" => "\u{1b}".to_string(),
        _ => match sequence.strip_prefix('\\') {
            Some(rest) if rest.chars().count() == 1 => rest.to_string(),
            _ => sequence.to_string(),
        },
    }
}
