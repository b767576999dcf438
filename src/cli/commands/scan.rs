use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use super::super::args::ScanCommand;
use super::super::exit_status::ExitStatus;
use super::super::report;
use crate::config::{CONFIG_FILE_NAME, ConfigLoadResult, load_config};
use crate::core::{
    file_scanner::scan_files,
    parsers::RubyParser,
    pipeline::{AnalyzeOptions, analyze_files},
};

pub fn scan(cmd: ScanCommand) -> Result<ExitStatus> {
    let project_dir = cmd.path.unwrap_or_else(|| PathBuf::from("."));
    let project_dir = fs::canonicalize(&project_dir)
        .with_context(|| format!("Cannot access project directory: {}", project_dir.display()))?;

    let ConfigLoadResult { config, from_file } = load_config(&project_dir)?;
    if !from_file && cmd.verbose {
        eprintln!(
            "{} No {} found, using default configuration",
            "note:".bold().cyan(),
            CONFIG_FILE_NAME
        );
    }

    // Collecting components drops the `.` of the default `./` source root.
    let source_root: PathBuf = project_dir
        .join(&config.source_root)
        .components()
        .collect();
    let base_dir = source_root.to_string_lossy();

    let scanned = scan_files(
        &base_dir,
        &config.includes,
        &config.ignores,
        config.ignore_test_files,
        cmd.verbose,
    );
    if scanned.skipped_count > 0 && !cmd.verbose {
        eprintln!(
            "{} {} path(s) could not be accessed (use {} for details)",
            "warning:".bold().yellow(),
            scanned.skipped_count,
            "-v".cyan()
        );
    }

    let shapes = config.call_shapes();
    let options = AnalyzeOptions {
        parser: &RubyParser,
        shapes: &shapes,
        magic_comments: config.magic_comments,
        verbose: cmd.verbose,
    };
    let result = analyze_files(&scanned.files, &base_dir, &options);

    if cmd.json {
        report::print_json(&result)?;
    } else {
        report::print_text(&result, cmd.verbose);
    }

    Ok(if result.has_failures() {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    })
}
