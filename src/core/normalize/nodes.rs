//! Normalized node model.
//!
//! The normalizer reduces a raw Ruby tree to the handful of shapes a key audit
//! cares about: scopes (module, class, def, block, lambda), calls, translation
//! calls and the literal values that can appear as keys or options.
//!
//! Every structural node keeps an [`Origin`] so the caller can still point at
//! (or slice) the source it came from. Nodes built from a magic comment snippet
//! point into the snippet, not into the enclosing file.

use std::sync::Arc;

use enum_dispatch::enum_dispatch;

use crate::core::raw::{RawNode, SourceLocation};

/// Where a normalized node came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    source: Arc<str>,
    location: SourceLocation,
}

impl Origin {
    pub fn new(source: Arc<str>, location: SourceLocation) -> Self {
        Self { source, location }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Full text the node was parsed from.
    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    /// 1-indexed start line.
    pub fn line(&self) -> usize {
        self.location.start_line
    }

    /// Source text of the originating raw node.
    pub fn slice(&self) -> &str {
        self.location.slice(&self.source).unwrap_or_default()
    }
}

/// Result of normalizing one raw node.
///
/// The shape depends on the raw kind: scopes and calls become a [`Node`],
/// statement sequences become a [`Normalized::List`], literals become a
/// [`Primitive`]. An empty list means "nothing to contribute".
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Node(Node),
    List(Vec<Normalized>),
    Primitive(Primitive),
}

impl Normalized {
    pub fn empty() -> Self {
        Normalized::List(Vec::new())
    }

    /// True for an empty list, the normalizer's "null".
    pub fn is_empty(&self) -> bool {
        matches!(self, Normalized::List(items) if items.is_empty())
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Normalized::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<&Primitive> {
        match self {
            Normalized::Primitive(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_translation_call(&self) -> Option<&TranslationCall> {
        match self {
            Normalized::Node(Node::TranslationCall(call)) => Some(call),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Normalized::Primitive(Primitive::Mapping(mapping)) => Some(mapping),
            _ => None,
        }
    }

    pub fn is_interpolated_string(&self) -> bool {
        matches!(self, Normalized::Node(Node::InterpolatedString(_)))
    }

    /// Items of a list, or the value itself as a one-element slice.
    pub fn items(&self) -> &[Normalized] {
        match self {
            Normalized::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }
}

impl From<Node> for Normalized {
    fn from(node: Node) -> Self {
        Normalized::Node(node)
    }
}

impl From<Primitive> for Normalized {
    fn from(value: Primitive) -> Self {
        Normalized::Primitive(value)
    }
}

/// Append `result` to `out`, splicing one level of list nesting.
pub fn flatten_into(out: &mut Vec<Normalized>, result: Normalized) {
    match result {
        Normalized::List(items) => out.extend(items),
        other => out.push(other),
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    String(String),
    Symbol(String),
    /// Integer literal as written, minus `_` separators.
    Integer(String),
    Decimal(String),
    Constant(String),
    Mapping(Mapping),
    Sequence(Vec<Normalized>),
}

impl Primitive {
    /// Text of a string or symbol literal.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Primitive::String(text) | Primitive::Symbol(text) => Some(text),
            _ => None,
        }
    }
}

/// Ordered key/value mapping built from `key: value` pairs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mapping {
    entries: Vec<(Normalized, Normalized)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Normalized, value: Normalized) {
        self.entries.push((key, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Normalized, Normalized)> {
        self.entries.iter()
    }

    /// Value of the first entry whose string or symbol key equals `key`.
    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&Normalized> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_primitive().and_then(Primitive::as_text) == Some(key))
            .map(|(_, v)| v)
    }

    /// String or symbol keys, in insertion order.
    pub fn key_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|(k, _)| k.as_primitive().and_then(Primitive::as_text))
            .collect()
    }
}

impl FromIterator<(Normalized, Normalized)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (Normalized, Normalized)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Access to the origin of any structural node.
#[enum_dispatch]
pub trait Located {
    fn origin(&self) -> &Origin;
}

/// Structural nodes.
#[enum_dispatch(Located)]
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Module(ModuleNode),
    Class(ClassNode),
    Def(DefNode),
    Block(BlockNode),
    Lambda(LambdaNode),
    Call(CallNode),
    TranslationCall(TranslationCall),
    InterpolatedString(InterpolatedString),
}

/// `module Name ... end`. One child per body statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    pub origin: Origin,
    pub name: String,
    pub children: Vec<Normalized>,
}

/// `class Name ... end`. Children are appended one statement at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassNode {
    pub origin: Origin,
    pub name: String,
    pub children: Vec<Normalized>,
}

impl ClassNode {
    pub fn new(origin: Origin, name: impl Into<String>) -> Self {
        Self {
            origin,
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn add_child(&mut self, child: Normalized) {
        self.children.push(child);
    }
}

/// Method definition with the calls found in its body.
#[derive(Debug, Clone, PartialEq)]
pub struct DefNode {
    pub origin: Origin,
    pub name: String,
    pub calls: Vec<Normalized>,
    /// Whether a `private` toggle was seen before this definition.
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockNode {
    pub origin: Origin,
    pub calls: Vec<Normalized>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaNode {
    pub origin: Origin,
    pub calls: Vec<Normalized>,
}

/// Any call that is not a translation call.
///
/// The normalizer does not descend into it. Its raw receiver, arguments and
/// block are kept so a consumer can normalize them on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct CallNode {
    pub origin: Origin,
    pub name: String,
    /// Translation calls declared by a magic comment on the line above.
    pub comment_translations: Vec<TranslationCall>,
    pub receiver: Option<Arc<RawNode>>,
    pub arguments: Option<Arc<RawNode>>,
    pub block: Option<Arc<RawNode>>,
}

/// A recognized translation call such as `t('welcome.title')`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationCall {
    pub origin: Origin,
    /// Method name as written (`t`, `translate!`, ...).
    pub name: String,
    /// First positional argument when it is a literal; absent otherwise.
    pub key: Option<Primitive>,
    pub receiver: Option<Box<Normalized>>,
    pub options: Mapping,
    /// Translation calls declared by a magic comment on the line above.
    pub comment_translations: Vec<TranslationCall>,
}

impl TranslationCall {
    /// Key text for string and symbol keys.
    pub fn key_text(&self) -> Option<&str> {
        self.key.as_ref().and_then(Primitive::as_text)
    }
}

/// String literal with `#{}` parts.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolatedString {
    pub origin: Origin,
    pub parts: Vec<Normalized>,
}

macro_rules! impl_located {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Located for $ty {
                fn origin(&self) -> &Origin {
                    &self.origin
                }
            }
        )*
    };
}

impl_located!(
    ModuleNode,
    ClassNode,
    DefNode,
    BlockNode,
    LambdaNode,
    CallNode,
    TranslationCall,
    InterpolatedString,
);
