//! Collection over source files and normalized trees.
//!
//! - `comments`: magic comment index, built before a file is normalized
//! - `translation_calls`: flattens a normalized tree into key usages

pub mod comments;
pub mod translation_calls;

pub use comments::CommentTranslationIndex;
pub use translation_calls::{KeyUsage, collect_translation_calls};
