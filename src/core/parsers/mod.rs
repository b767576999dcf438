//! Source parsers.
//!
//! - `ruby`: Ruby source parser (uses tree-sitter-ruby, lowers to `RawNode`)

pub mod ruby;

pub use ruby::{RubyParser, parse_ruby_source};
