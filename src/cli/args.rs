//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `scan`: List translation calls in Ruby sources
//! - `init`: Initialize glot-rb configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Project directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List translation calls (t, translate, ...) found in Ruby files
    Scan(ScanCommand),
    /// Initialize a new .glotrc.json configuration file
    Init,
}
