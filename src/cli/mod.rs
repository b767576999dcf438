use std::process::ExitCode;

use anyhow::Result;

mod args;
mod commands;
mod exit_status;
pub mod report;

pub use args::{Arguments, Command, ScanCommand};
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(Arguments { command }) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };

    let status = match command {
        Some(Command::Scan(cmd)) => commands::scan::scan(cmd)?,
        Some(Command::Init) => commands::init::init()?,
        None => ExitStatus::Success,
    };

    Ok(status.into())
}
