//! Per-file analysis: parse, index magic comments, normalize, collect.
//!
//! Files are processed in parallel. Each file gets its own comment index and
//! normalizer, so nothing mutable is shared between threads; a file that fails
//! to read, parse or normalize is reported as a [`FileFailure`] and the rest of
//! the scan carries on.

use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;

use crate::core::{
    collect::{CommentTranslationIndex, KeyUsage, collect_translation_calls},
    normalize::{CallShapes, Normalized, Normalizer},
    raw::{ParsedSource, SourceParser},
};

/// Translation calls found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: String,
    pub usages: Vec<KeyUsage>,
}

/// A file that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub file_path: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl ScanResult {
    pub fn usage_count(&self) -> usize {
        self.files.iter().map(|file| file.usages.len()).sum()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Settings shared by every file of a scan.
pub struct AnalyzeOptions<'a> {
    pub parser: &'a dyn SourceParser,
    pub shapes: &'a CallShapes,
    pub magic_comments: bool,
    pub verbose: bool,
}

/// Parse and normalize one source text.
///
/// With `magic_comments` off, `i18n-tasks-use` comments are ignored.
pub fn normalize_source(
    source: &str,
    parser: &dyn SourceParser,
    shapes: &CallShapes,
    magic_comments: bool,
) -> Result<Normalized> {
    let (parsed, index) = parse_with_comments(source, parser, shapes, magic_comments)?;
    let mut normalizer =
        Normalizer::new(shapes, Arc::clone(&parsed.source)).with_comment_translations(&index);
    Ok(normalizer.normalize(&parsed.root)?)
}

/// Translation calls in one source text.
pub fn analyze_source(
    source: &str,
    parser: &dyn SourceParser,
    shapes: &CallShapes,
    magic_comments: bool,
) -> Result<Vec<KeyUsage>> {
    let (parsed, index) = parse_with_comments(source, parser, shapes, magic_comments)?;
    let mut normalizer =
        Normalizer::new(shapes, Arc::clone(&parsed.source)).with_comment_translations(&index);
    let tree = normalizer.normalize(&parsed.root)?;
    Ok(collect_translation_calls(&tree, shapes, &index)?)
}

fn parse_with_comments(
    source: &str,
    parser: &dyn SourceParser,
    shapes: &CallShapes,
    magic_comments: bool,
) -> Result<(ParsedSource, CommentTranslationIndex)> {
    let parsed = parser.parse(source)?;
    let comments = magic_comments.then_some(parsed.comments.as_slice());
    let index = CommentTranslationIndex::build(comments, parser, shapes);
    Ok((parsed, index))
}

pub fn analyze_file(path: &Path, options: &AnalyzeOptions<'_>) -> Result<Vec<KeyUsage>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    analyze_source(
        &source,
        options.parser,
        options.shapes,
        options.magic_comments,
    )
    .with_context(|| format!("Failed to analyze {}", path.display()))
}

/// Analyze `files` in parallel. Paths in the result are relative to `base_dir`.
pub fn analyze_files<'f, I>(files: I, base_dir: &str, options: &AnalyzeOptions<'_>) -> ScanResult
where
    I: IntoIterator<Item = &'f String>,
{
    let files: Vec<&String> = files.into_iter().collect();
    let results: Vec<_> = files
        .par_iter()
        .map(|file_path| {
            let path = Path::new(file_path.as_str());
            (display_path(path, base_dir), analyze_file(path, options))
        })
        .collect();

    let mut scan = ScanResult::default();
    for (file_path, result) in results {
        match result {
            Ok(usages) => scan.files.push(FileReport { file_path, usages }),
            Err(e) => {
                if options.verbose {
                    eprintln!("{} {} - {:#}", "warning:".bold().yellow(), file_path, e);
                }
                scan.failures.push(FileFailure {
                    file_path,
                    error: format!("{:#}", e),
                });
            }
        }
    }
    scan.files.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    scan.failures.sort_by(|a, b| a.file_path.cmp(&b.file_path));
    scan
}

fn display_path(path: &Path, base_dir: &str) -> String {
    path.strip_prefix(base_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .into_owned()
}
