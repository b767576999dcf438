//! Comment collection.
//!
//! Ruby comments are collected by the parser as flat tokens (text + line).
//! Only magic comments (`# i18n-tasks-use ...`) matter here; they are turned
//! into a [`CommentTranslationIndex`] before the main traversal starts.

mod magic;

pub use magic::{CommentTranslationIndex, magic_comment_snippet, translation_calls_in_snippet};
