//! Magic comments: `# i18n-tasks-use t('some.key')`.
//!
//! A magic comment documents a translation key that is used dynamically on the
//! next line, e.g.
//!
//! ```ruby
//! # i18n-tasks-use t('activerecord.models.user')
//! model.model_name.human
//! ```
//!
//! The snippet after the prefix is parsed and normalized like real source,
//! with a fresh normalizer, and the resulting translation calls are attached
//! to whatever call sits on the line below the comment.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::core::normalize::{CallShapes, Normalized, Normalizer, TranslationCall};
use crate::core::raw::{CommentToken, SourceParser};

/// Comment marker, optional whitespace, the tag, at least one space.
static MAGIC_COMMENT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.\s*i18n-tasks-use\s+").expect("valid regex"));

/// Snippet embedded in a magic comment, or `None` for ordinary comments.
pub fn magic_comment_snippet(text: &str) -> Option<&str> {
    MAGIC_COMMENT_PREFIX
        .find(text)
        .map(|prefix| &text[prefix.end()..])
}

/// Translation calls declared by magic comments, keyed by comment line.
///
/// Built once per file and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentTranslationIndex {
    by_line: HashMap<usize, Vec<TranslationCall>>,
}

impl CommentTranslationIndex {
    /// Build the index from a file's comments.
    ///
    /// Comments that are not magic, don't parse, or contain no translation call
    /// are skipped. If two magic comments start on the same line the later one
    /// wins.
    pub fn build(
        comments: Option<&[CommentToken]>,
        parser: &dyn SourceParser,
        shapes: &CallShapes,
    ) -> Self {
        let mut by_line = HashMap::new();
        for comment in comments.unwrap_or_default() {
            let Some(snippet) = magic_comment_snippet(&comment.text) else {
                continue;
            };
            if let Some(calls) = translation_calls_in_snippet(snippet, parser, shapes) {
                by_line.insert(comment.line, calls);
            }
        }
        Self { by_line }
    }

    /// Calls declared by the magic comment on `line`.
    pub fn get(&self, line: usize) -> &[TranslationCall] {
        self.by_line.get(&line).map(Vec::as_slice).unwrap_or_default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.by_line.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    /// Lines that carry at least one declared call, ascending.
    #[cfg(test)]
    pub fn lines(&self) -> Vec<usize> {
        let mut lines: Vec<_> = self.by_line.keys().copied().collect();
        lines.sort_unstable();
        lines
    }
}

/// Top-level translation calls in a source snippet.
///
/// Runs a disposable normalizer with no comment index of its own, so the
/// snippet's `private` toggles and comments never leak into the caller.
/// Returns `None` when the snippet doesn't parse, fails to normalize, or has
/// no translation call.
pub fn translation_calls_in_snippet(
    snippet: &str,
    parser: &dyn SourceParser,
    shapes: &CallShapes,
) -> Option<Vec<TranslationCall>> {
    let parsed = parser.parse(snippet).ok()?;
    let mut normalizer = Normalizer::new(shapes, Arc::clone(&parsed.source));
    let result = normalizer.normalize(&parsed.root).ok()?;

    let calls: Vec<TranslationCall> = result
        .items()
        .iter()
        .filter_map(Normalized::as_translation_call)
        .cloned()
        .collect();

    (!calls.is_empty()).then_some(calls)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::parsers::RubyParser;

    fn build(comments: &[CommentToken]) -> CommentTranslationIndex {
        CommentTranslationIndex::build(Some(comments), &RubyParser, &CallShapes::default())
    }

    fn keys(calls: &[TranslationCall]) -> Vec<&str> {
        calls.iter().filter_map(TranslationCall::key_text).collect()
    }

    // ============================================================
    // Prefix matching
    // ============================================================

    #[test]
    fn test_snippet_after_prefix() {
        assert_eq!(
            magic_comment_snippet("# i18n-tasks-use t('a.b')"),
            Some("t('a.b')")
        );
        assert_eq!(
            magic_comment_snippet("#i18n-tasks-use   t(:x)"),
            Some("t(:x)")
        );
    }

    #[test]
    fn test_prefix_requires_tag_at_start() {
        assert_eq!(magic_comment_snippet("# see i18n-tasks-use t('a')"), None);
        assert_eq!(magic_comment_snippet("# just a comment"), None);
        assert_eq!(magic_comment_snippet("# i18n-tasks-use"), None);
        assert_eq!(magic_comment_snippet(""), None);
    }

    // ============================================================
    // Index building
    // ============================================================

    #[test]
    fn test_absent_comments_give_empty_index() {
        let index =
            CommentTranslationIndex::build(None, &RubyParser, &CallShapes::default());
        assert!(index.is_empty());
        assert!(index.get(1).is_empty());
    }

    #[test]
    fn test_magic_comment_indexed_by_its_line() {
        let index = build(&[CommentToken::new("# i18n-tasks-use t('x.y')", 4)]);

        assert_eq!(index.lines(), vec![4]);
        assert_eq!(keys(index.get(4)), vec!["x.y"]);
        assert!(index.get(5).is_empty());
    }

    #[test]
    fn test_several_calls_in_one_snippet() {
        let index = build(&[CommentToken::new(
            "# i18n-tasks-use t('a'); t(:b, scope: 'c')",
            2,
        )]);

        let calls = index.get(2);
        assert_eq!(keys(calls), vec!["a", "b"]);
        assert_eq!(calls[1].options.key_names(), vec!["scope"]);
    }

    #[test]
    fn test_ordinary_comments_skipped() {
        let index = build(&[
            CommentToken::new("# frozen_string_literal: true", 1),
            CommentToken::new("# TODO: translate this", 3),
        ]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_unparsable_snippet_skipped() {
        let index = build(&[CommentToken::new("# i18n-tasks-use t('unterminated", 1)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_snippet_without_translation_calls_skipped() {
        let index = build(&[CommentToken::new("# i18n-tasks-use render :show", 1)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_snippet_with_unsupported_options_skipped() {
        let index = build(&[CommentToken::new("# i18n-tasks-use t('a', **opts)", 1)]);
        assert!(index.is_empty());
    }

    #[test]
    fn test_later_comment_on_same_line_wins() {
        let index = build(&[
            CommentToken::new("# i18n-tasks-use t('first')", 6),
            CommentToken::new("# i18n-tasks-use t('second')", 6),
        ]);
        assert_eq!(index.len(), 1);
        assert_eq!(keys(index.get(6)), vec!["second"]);
    }

    #[test]
    fn test_snippet_origin_points_into_snippet() {
        let calls = translation_calls_in_snippet(
            "t('models.user')",
            &RubyParser,
            &CallShapes::default(),
        )
        .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].origin.slice(), "t('models.user')");
        assert_eq!(calls[0].origin.line(), 1);
    }

    #[test]
    fn test_snippet_uses_extra_translation_methods() {
        let shapes = CallShapes::default().with_translation_methods(["tt"]);
        let calls = translation_calls_in_snippet("tt('custom.key')", &RubyParser, &shapes);
        assert_eq!(calls.map(|c| keys(&c).join(",")), Some("custom.key".to_string()));
    }
}
