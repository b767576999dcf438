//! Recursive-descent transform from raw nodes to normalized nodes.
//!
//! One `Normalizer` handles one tree. It owns the traversal context (the
//! private-visibility flag) and the file's comment translation index, so two
//! files, or a file and one of its magic comment snippets, never share state.

use std::sync::Arc;

use super::arguments::{ClassifiedArguments, classify};
use super::call_shapes::CallShapes;
use super::error::NormalizeError;
use super::nodes::{
    BlockNode, CallNode, ClassNode, DefNode, InterpolatedString, LambdaNode, Mapping, ModuleNode,
    Node, Normalized, Origin, Primitive, TranslationCall, flatten_into,
};
use crate::core::collect::comments::CommentTranslationIndex;
use crate::core::raw::{CallSite, RawKind, RawNode};

/// State that lives for exactly one traversal.
#[derive(Debug, Clone, Copy, Default)]
struct TraversalContext {
    /// Set by a `private` toggle; every `def` after it is recorded as private.
    private_methods: bool,
}

pub struct Normalizer<'a> {
    shapes: &'a CallShapes,
    source: Arc<str>,
    comment_translations: Option<&'a CommentTranslationIndex>,
    context: TraversalContext,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer for a tree parsed from `source`, with no magic comments.
    pub fn new(shapes: &'a CallShapes, source: Arc<str>) -> Self {
        Self {
            shapes,
            source,
            comment_translations: None,
            context: TraversalContext::default(),
        }
    }

    /// Attach the file's magic comment index.
    pub fn with_comment_translations(mut self, index: &'a CommentTranslationIndex) -> Self {
        self.comment_translations = Some(index);
        self
    }

    pub fn normalize(&mut self, node: &RawNode) -> Result<Normalized, NormalizeError> {
        match &node.kind {
            RawKind::Program(statements)
            | RawKind::Statements(statements)
            | RawKind::EmbeddedStatements(statements) => {
                Ok(Normalized::List(self.normalize_flat(statements)?))
            }
            RawKind::Module { name, body } => {
                let children = body
                    .iter()
                    .map(|statement| self.normalize(statement))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::Module(ModuleNode {
                    origin: self.origin(node),
                    name: name.clone(),
                    children,
                })
                .into())
            }
            RawKind::Class { name, body } => {
                let mut class = ClassNode::new(self.origin(node), name.as_str());
                for statement in body {
                    class.add_child(self.normalize(statement)?);
                }
                Ok(Node::Class(class).into())
            }
            RawKind::VariableWrite { .. }
            | RawKind::MultiWrite { .. }
            | RawKind::VariableTarget { .. }
            | RawKind::If { .. }
            | RawKind::Else(_)
            | RawKind::Other { .. } => Ok(Normalized::List(self.normalize_flat(node.children())?)),
            RawKind::Def { name, body } => {
                let private = self.context.private_methods;
                let calls = self.normalize_flat_non_empty(body)?;
                Ok(Node::Def(DefNode {
                    origin: self.origin(node),
                    name: name.clone(),
                    calls,
                    private,
                })
                .into())
            }
            RawKind::And { left, right } | RawKind::Or { left, right } => {
                let left = self.normalize(left)?;
                let right = self.normalize(right)?;
                Ok(Normalized::List(vec![left, right]))
            }
            RawKind::Lambda { body } => {
                let calls = self.normalize_flat(body)?;
                Ok(Node::Lambda(LambdaNode {
                    origin: self.origin(node),
                    calls,
                })
                .into())
            }
            RawKind::Block { body } => {
                let calls = self.normalize_flat_non_empty(body)?;
                Ok(Node::Block(BlockNode {
                    origin: self.origin(node),
                    calls,
                })
                .into())
            }
            RawKind::Call(call) => self.normalize_call(node, call),
            RawKind::Assoc { key, value } => {
                let key = self.normalize(key)?;
                let value = self.normalize(value)?;
                Ok(Normalized::List(vec![key, value]))
            }
            RawKind::Symbol(text) => Ok(Primitive::Symbol(text.clone()).into()),
            RawKind::String(text) => Ok(Primitive::String(text.clone()).into()),
            RawKind::InterpolatedString(parts) => {
                let parts = self.normalize_flat(parts)?;
                Ok(Node::InterpolatedString(InterpolatedString {
                    origin: self.origin(node),
                    parts,
                })
                .into())
            }
            RawKind::Integer(literal) => Ok(Primitive::Integer(literal.replace('_', "")).into()),
            RawKind::Decimal(literal) => Ok(Primitive::Decimal(literal.replace('_', "")).into()),
            RawKind::Constant(name) => Ok(Primitive::Constant(name.clone()).into()),
            RawKind::Arguments(arguments) => self.normalize_argument_list(arguments),
            RawKind::Array(elements) => {
                Ok(Primitive::Sequence(self.normalize_flat(elements)?).into())
            }
            RawKind::KeywordHash(entries) => {
                Ok(Primitive::Mapping(self.options_mapping(entries)?).into())
            }
            RawKind::Hash(entries) => Ok(Primitive::Mapping(self.hash_literal(entries)?).into()),
        }
    }

    fn origin(&self, node: &RawNode) -> Origin {
        Origin::new(Arc::clone(&self.source), node.location)
    }

    /// Normalize each node in order, splicing list results one level deep.
    fn normalize_flat<'n, I>(&mut self, nodes: I) -> Result<Vec<Normalized>, NormalizeError>
    where
        I: IntoIterator<Item = &'n RawNode>,
    {
        let mut out = Vec::new();
        for node in nodes {
            flatten_into(&mut out, self.normalize(node)?);
        }
        Ok(out)
    }

    fn normalize_flat_non_empty<'n, I>(
        &mut self,
        nodes: I,
    ) -> Result<Vec<Normalized>, NormalizeError>
    where
        I: IntoIterator<Item = &'n RawNode>,
    {
        let mut out = Vec::new();
        for node in nodes {
            let result = self.normalize(node)?;
            if !result.is_empty() {
                flatten_into(&mut out, result);
            }
        }
        Ok(out)
    }

    /// Positional values in order, then exactly one options mapping.
    fn normalize_argument_list(
        &mut self,
        arguments: &[RawNode],
    ) -> Result<Normalized, NormalizeError> {
        let (keywords, rest): (Vec<&RawNode>, Vec<&RawNode>) = arguments
            .iter()
            .partition(|argument| matches!(argument.kind, RawKind::KeywordHash(_)));

        let mut out = self.normalize_flat(rest)?;
        let options = match keywords.first() {
            Some(keyword_hash) => self.normalize(keyword_hash)?,
            None => Primitive::Mapping(Mapping::new()).into(),
        };
        out.push(options);
        Ok(Normalized::List(out))
    }

    /// Keyword arguments: only `key: value` entries are allowed.
    fn options_mapping(&mut self, entries: &[RawNode]) -> Result<Mapping, NormalizeError> {
        let mut mapping = Mapping::new();
        for entry in entries {
            let RawKind::Assoc { key, value } = &entry.kind else {
                return Err(NormalizeError::UnsupportedOptionsEntry {
                    kind: entry.kind_name().to_string(),
                    line: entry.location.start_line,
                });
            };
            let key = self.normalize(key)?;
            let value = self.normalize(value)?;
            mapping.insert(key, value);
        }
        Ok(mapping)
    }

    /// `{ ... }` literal. Splat entries carry no static keys and are skipped.
    fn hash_literal(&mut self, entries: &[RawNode]) -> Result<Mapping, NormalizeError> {
        let mut mapping = Mapping::new();
        for entry in entries {
            if let RawKind::Assoc { key, value } = &entry.kind {
                let key = self.normalize(key)?;
                let value = self.normalize(value)?;
                mapping.insert(key, value);
            }
        }
        Ok(mapping)
    }

    fn normalize_call(
        &mut self,
        node: &RawNode,
        call: &CallSite,
    ) -> Result<Normalized, NormalizeError> {
        // A magic comment documents the call on the following line.
        let previous_line = node.location.start_line.checked_sub(1);
        let comment_translations = match (previous_line, self.comment_translations) {
            (Some(line), Some(index)) => index.get(line).to_vec(),
            _ => Vec::new(),
        };

        if call.receiver.is_none() && self.shapes.is_visibility_toggle(&call.name) {
            return self.visibility_toggle(call);
        }

        if self.shapes.is_translation_method(&call.name) {
            return self.translation_call(node, call, comment_translations);
        }

        Ok(self.generic_call(node, call, comment_translations))
    }

    /// A bare `private` makes every following `def` private. With arguments
    /// (`private def foo ... end`, `private :foo`) only the arguments are
    /// affected; the flag is restored afterwards.
    fn visibility_toggle(&mut self, call: &CallSite) -> Result<Normalized, NormalizeError> {
        let arguments = call
            .arguments
            .as_deref()
            .map(RawNode::children)
            .unwrap_or_default();

        if arguments.is_empty() {
            self.context.private_methods = true;
            return match &call.block {
                Some(block) => self.normalize(block),
                None => Ok(Normalized::empty()),
            };
        }

        let outer = std::mem::replace(&mut self.context.private_methods, true);
        let result = self.normalize_flat_non_empty(arguments);
        self.context.private_methods = outer;
        Ok(Normalized::List(result?))
    }

    fn translation_call(
        &mut self,
        node: &RawNode,
        call: &CallSite,
        comment_translations: Vec<TranslationCall>,
    ) -> Result<Normalized, NormalizeError> {
        let ClassifiedArguments {
            positional,
            options,
        } = classify(self, call.arguments.as_deref())?;
        let key = positional.into_iter().next();

        // `t("#{prefix}.title")` can't be resolved statically.
        if key
            .as_ref()
            .is_some_and(Normalized::is_interpolated_string)
        {
            return Ok(self.generic_call(node, call, comment_translations));
        }

        let receiver = match &call.receiver {
            Some(receiver) => Some(Box::new(self.normalize(receiver)?)),
            None => None,
        };
        let key = match key {
            Some(Normalized::Primitive(value)) => Some(value),
            _ => None,
        };

        Ok(Node::TranslationCall(TranslationCall {
            origin: self.origin(node),
            name: call.name.clone(),
            key,
            receiver,
            options,
            comment_translations,
        })
        .into())
    }

    fn generic_call(
        &self,
        node: &RawNode,
        call: &CallSite,
        comment_translations: Vec<TranslationCall>,
    ) -> Normalized {
        Node::Call(CallNode {
            origin: self.origin(node),
            name: call.name.clone(),
            comment_translations,
            receiver: call.receiver.clone(),
            arguments: call.arguments.clone(),
            block: call.block.clone(),
        })
        .into()
    }
}
