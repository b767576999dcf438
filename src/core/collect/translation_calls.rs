//! Flattens a normalized tree into a list of translation key usages.
//!
//! This is the reporting view of the tree: each `TranslationCall`, including the
//! ones declared by magic comments, becomes one [`KeyUsage`] carrying the scope
//! it was found in.
//!
//! Ordinary calls are opaque to the normalizer. The collector normalizes their
//! receiver, arguments and block with a fresh [`Normalizer`] when it reaches
//! them, so `redirect_to root_path, notice: t('.saved')` and
//! `items.each { t('item') }` are still reported.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use super::comments::CommentTranslationIndex;
use crate::core::normalize::{
    CallNode, CallShapes, Located, Node, NormalizeError, Normalized, Normalizer, Primitive,
    TranslationCall,
};
use crate::core::raw::RawKind;

/// One translation call found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyUsage {
    /// Literal key, or `None` when the key is dynamic (`t(key_var)`) or missing.
    pub key: Option<String>,
    /// Method name as written (`t`, `translate!`, ...).
    pub method: String,
    /// 1-indexed line. For magic comments, the comment's line.
    pub line: usize,
    /// 1-indexed column.
    pub column: usize,
    /// Receiver source text, e.g. `I18n`.
    pub receiver: Option<String>,
    /// Names of the options passed (`scope`, `default`, `count`, ...).
    pub options: Vec<String>,
    /// Enclosing module and class names, outermost first.
    pub scope: Vec<String>,
    /// Name of the enclosing method definition.
    pub definition: Option<String>,
    /// Inside a method defined after `private`.
    pub private: bool,
    /// Declared by an `i18n-tasks-use` magic comment.
    pub from_comment: bool,
}

/// Collect every translation call in `tree`, in traversal order.
///
/// `shapes` and `comments` must be the ones `tree` was normalized with; they
/// are reused for the contents of ordinary calls. A magic comment is reported
/// once, even when several calls sit on the line below it.
pub fn collect_translation_calls(
    tree: &Normalized,
    shapes: &CallShapes,
    comments: &CommentTranslationIndex,
) -> Result<Vec<KeyUsage>, NormalizeError> {
    let mut collector = Collector {
        shapes,
        comments,
        scope: Vec::new(),
        definition: None,
        private: false,
        comment_lines: HashSet::new(),
        usages: Vec::new(),
    };
    collector.visit(tree)?;
    Ok(collector.usages)
}

struct Collector<'a> {
    shapes: &'a CallShapes,
    comments: &'a CommentTranslationIndex,
    scope: Vec<String>,
    definition: Option<String>,
    private: bool,
    /// Magic comment lines already reported.
    comment_lines: HashSet<usize>,
    usages: Vec<KeyUsage>,
}

impl Collector<'_> {
    fn visit(&mut self, tree: &Normalized) -> Result<(), NormalizeError> {
        match tree {
            Normalized::Node(node) => self.visit_node(node),
            Normalized::List(items) => self.visit_all(items),
            Normalized::Primitive(primitive) => self.visit_primitive(primitive),
        }
    }

    fn visit_all(&mut self, items: &[Normalized]) -> Result<(), NormalizeError> {
        for item in items {
            self.visit(item)?;
        }
        Ok(())
    }

    fn visit_primitive(&mut self, primitive: &Primitive) -> Result<(), NormalizeError> {
        match primitive {
            Primitive::Mapping(mapping) => {
                for (key, value) in mapping.iter() {
                    self.visit(key)?;
                    self.visit(value)?;
                }
                Ok(())
            }
            Primitive::Sequence(items) => self.visit_all(items),
            _ => Ok(()),
        }
    }

    fn visit_node(&mut self, node: &Node) -> Result<(), NormalizeError> {
        match node {
            Node::Module(module) => self.scoped(&module.name, |c| c.visit_all(&module.children)),
            Node::Class(class) => self.scoped(&class.name, |c| c.visit_all(&class.children)),
            Node::Def(def) => {
                let outer_private = std::mem::replace(&mut self.private, def.private);
                let outer_definition = self.definition.replace(def.name.clone());
                let result = self.visit_all(&def.calls);
                self.definition = outer_definition;
                self.private = outer_private;
                result
            }
            Node::Block(block) => self.visit_all(&block.calls),
            Node::Lambda(lambda) => self.visit_all(&lambda.calls),
            Node::Call(call) => {
                self.record_comment_translations(call.origin.line(), &call.comment_translations);
                let contents = self.call_contents(call)?;
                self.visit_all(&contents)
            }
            Node::TranslationCall(call) => {
                self.record_comment_translations(call.origin.line(), &call.comment_translations);
                self.record(call, false, None);
                if let Some(receiver) = &call.receiver {
                    self.visit(receiver)?;
                }
                for (_, value) in call.options.iter() {
                    self.visit(value)?;
                }
                Ok(())
            }
            Node::InterpolatedString(string) => self.visit_all(&string.parts),
        }
    }

    fn scoped(
        &mut self,
        name: &str,
        visit: impl FnOnce(&mut Self) -> Result<(), NormalizeError>,
    ) -> Result<(), NormalizeError> {
        self.scope.push(name.to_string());
        let result = visit(self);
        self.scope.pop();
        result
    }

    /// Receiver, argument values and block of an ordinary call.
    ///
    /// Keyword arguments are taken one value at a time, so a double splat
    /// passed to an ordinary call (`render partial: 'row', **locals`) is
    /// skipped rather than rejected.
    fn call_contents(&self, call: &CallNode) -> Result<Vec<Normalized>, NormalizeError> {
        let mut normalizer = Normalizer::new(self.shapes, Arc::clone(call.origin.source()))
            .with_comment_translations(self.comments);
        let mut contents = Vec::new();

        if let Some(receiver) = &call.receiver {
            contents.push(normalizer.normalize(receiver)?);
        }
        if let Some(arguments) = &call.arguments {
            for argument in arguments.children() {
                match &argument.kind {
                    RawKind::KeywordHash(entries) => {
                        for entry in entries {
                            if let RawKind::Assoc { value, .. } = &entry.kind {
                                contents.push(normalizer.normalize(value)?);
                            }
                        }
                    }
                    _ => contents.push(normalizer.normalize(argument)?),
                }
            }
        }
        if let Some(block) = &call.block {
            contents.push(normalizer.normalize(block)?);
        }
        Ok(contents)
    }

    /// Magic comment calls sit on the line above the call they're attached to.
    fn record_comment_translations(&mut self, anchor_line: usize, calls: &[TranslationCall]) {
        let comment_line = anchor_line.saturating_sub(1).max(1);
        if calls.is_empty() || !self.comment_lines.insert(comment_line) {
            return;
        }
        for call in calls {
            self.record(call, true, Some(comment_line));
        }
    }

    fn record(&mut self, call: &TranslationCall, from_comment: bool, line: Option<usize>) {
        let location = call.origin.location();
        self.usages.push(KeyUsage {
            key: call.key.as_ref().and_then(key_text),
            method: call.name.clone(),
            line: line.unwrap_or(location.start_line),
            column: if from_comment {
                1
            } else {
                location.start_column + 1
            },
            receiver: call.receiver.as_deref().and_then(receiver_text),
            options: call
                .options
                .key_names()
                .into_iter()
                .map(String::from)
                .collect(),
            scope: self.scope.clone(),
            definition: self.definition.clone(),
            private: self.private,
            from_comment,
        });
    }
}

fn key_text(key: &Primitive) -> Option<String> {
    match key {
        Primitive::String(text)
        | Primitive::Symbol(text)
        | Primitive::Integer(text)
        | Primitive::Decimal(text)
        | Primitive::Constant(text) => Some(text.clone()),
        Primitive::Mapping(_) | Primitive::Sequence(_) => None,
    }
}

fn receiver_text(receiver: &Normalized) -> Option<String> {
    match receiver {
        Normalized::Primitive(Primitive::Constant(name)) => Some(name.clone()),
        Normalized::Node(node) => Some(node.origin().slice().to_string()),
        _ => None,
    }
}
