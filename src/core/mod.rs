//! Core analysis engine.
//!
//! - `raw`: parser-independent syntax tree handed to the normalizer
//! - `parsers`: Ruby source parser producing raw trees
//! - `normalize`: raw tree → normalized tree of scopes and translation calls
//! - `collect`: magic comment index and translation-call collection
//! - `pipeline`: per-file analysis, parallel over files
//! - `file_scanner`: Ruby file discovery

pub mod collect;
pub mod file_scanner;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod raw;
