//! Report formatting and printing.
//!
//! Text output groups translation calls by file with aligned columns; JSON
//! output serializes the whole scan result. Separate from the pipeline so the
//! crate can be used as a library.

use std::io::{self, Write};

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::core::{
    collect::KeyUsage,
    pipeline::{FileFailure, FileReport, ScanResult},
};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Print the scan result as text to stdout, plus a failure hint on stderr.
pub fn print_text(result: &ScanResult, verbose: bool) {
    print_text_to(result, &mut io::stdout().lock());
    print_failure_warning_to(result.failures.len(), verbose, &mut io::stderr().lock());
}

/// Print the scan result as text to a custom writer.
pub fn print_text_to<W: Write>(result: &ScanResult, writer: &mut W) {
    for file in result.files.iter().filter(|file| !file.usages.is_empty()) {
        print_file(file, writer);
    }
    print_summary(result, writer);
}

/// Print a one-line hint about failed files; details are only shown with `-v`.
pub fn print_failure_warning_to<W: Write>(count: usize, verbose: bool, writer: &mut W) {
    if count > 0 && !verbose {
        let _ = writeln!(
            writer,
            "{} {} file(s) could not be analyzed (use {} for details)",
            "warning:".bold().yellow(),
            count,
            "-v".cyan()
        );
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    files: &'a [FileReport],
    failures: &'a [FileFailure],
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files_scanned: usize,
    translation_calls: usize,
    failed_files: usize,
}

/// Print the scan result as pretty JSON to stdout.
pub fn print_json(result: &ScanResult) -> Result<()> {
    let json = to_json(result)?;
    println!("{}", json);
    Ok(())
}

pub fn to_json(result: &ScanResult) -> Result<String> {
    let report = JsonReport {
        files: &result.files,
        failures: &result.failures,
        summary: JsonSummary {
            files_scanned: files_scanned(result),
            translation_calls: result.usage_count(),
            failed_files: result.failures.len(),
        },
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize scan result")
}

// ============================================================
// Internal Functions
// ============================================================

fn files_scanned(result: &ScanResult) -> usize {
    result.files.len() + result.failures.len()
}

fn print_file<W: Write>(file: &FileReport, writer: &mut W) {
    let _ = writeln!(writer, "{}", file.file_path.bold());

    let rows: Vec<[String; 3]> = file
        .usages
        .iter()
        .map(|usage| {
            [
                format!("{}:{}", usage.line, usage.column),
                call_display(usage),
                key_display(usage),
            ]
        })
        .collect();

    let mut widths = [0usize; 3];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    for (row, usage) in rows.iter().zip(&file.usages) {
        let line = format!(
            "  {}  {}  {}  {}",
            pad(&row[0], widths[0]).dimmed(),
            pad(&row[1], widths[1]).cyan(),
            pad(&row[2], widths[2]),
            context_display(usage)
        );
        let _ = writeln!(writer, "{}", line.trim_end());
    }
    let _ = writeln!(writer);
}

fn print_summary<W: Write>(result: &ScanResult, writer: &mut W) {
    let files = files_scanned(result);
    let calls = result.usage_count();
    let msg = format!(
        "Scanned {} {}, found {} translation {}",
        files,
        if files == 1 { "file" } else { "files" },
        calls,
        if calls == 1 { "call" } else { "calls" }
    );
    let _ = writeln!(writer, "{} {}", SUCCESS_MARK.green(), msg.green());
}

/// Pad `text` with spaces to `width` display columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

fn call_display(usage: &KeyUsage) -> String {
    match &usage.receiver {
        Some(receiver) => format!("{}.{}", receiver, usage.method),
        None => usage.method.clone(),
    }
}

fn key_display(usage: &KeyUsage) -> String {
    match &usage.key {
        Some(key) => format!("\"{}\"", key),
        None => "(dynamic)".to_string(),
    }
}

fn context_display(usage: &KeyUsage) -> String {
    let mut context = usage.scope.join("::");
    if let Some(definition) = &usage.definition {
        context.push('#');
        context.push_str(definition);
    }

    let mut flags = Vec::new();
    if usage.private {
        flags.push("private");
    }
    if usage.from_comment {
        flags.push("magic comment");
    }
    if !flags.is_empty() {
        if !context.is_empty() {
            context.push(' ');
        }
        context.push_str(&format!("({})", flags.join(", ")));
    }
    context
}
