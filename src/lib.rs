//! glot-rb - translation call finder for Ruby
//!
//! Parses Ruby sources, normalizes them into a tree of scopes and
//! translation calls (`t`, `t!`, `translate`, `translate!`), and reports every
//! key in use, including keys declared by `# i18n-tasks-use` magic comments.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (`scan`, `init`)
//! - `config`: Configuration file loading and parsing
//! - `core`: Parsing, normalization and collection pipeline

pub mod cli;
pub mod config;
pub mod core;
