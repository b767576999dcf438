use thiserror::Error;

/// Errors that abort normalization of a file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// Keyword arguments contained something other than `key: value` pairs,
    /// e.g. a double splat: `t(:key, **options)`.
    #[error("unsupported `{kind}` entry in keyword arguments at line {line}")]
    UnsupportedOptionsEntry { kind: String, line: usize },
}
