//! Command line interface for kodegen_ghr.
//!
//! Parses arguments with clap, discovers repository settings and drives the
//! release pipeline, reporting results with colored output.

mod args;
pub mod commands;
mod output;

pub use args::{Args, RuntimeConfig};
pub use commands::execute_command;
pub use output::OutputManager;

use clap::Parser;
use clap::error::ErrorKind;

use crate::ExitCode;

/// Parse process arguments
///
/// On failure clap's message is printed and the exit code is returned:
/// `Ok` for `--help`/`--version`, `ParseFlagsError` otherwise.
pub fn parse_args() -> std::result::Result<Args, i32> {
    Args::try_parse().map_err(|e| {
        let code = match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::Ok,
            _ => ExitCode::ParseFlagsError,
        };
        let _ = e.print();
        code.code()
    })
}

/// Main CLI entry point
pub async fn run(args: Args) -> i32 {
    execute_command(args).await
}
