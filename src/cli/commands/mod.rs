//! Command execution: validate arguments, run release or stat, map errors to exit codes.

mod helpers;
mod release;
mod stat;

use crate::cli::{Args, RuntimeConfig};
use crate::error::ReleaseError;

use release::execute_release;
use stat::execute_stat;

/// Execute the command selected by the parsed arguments and return the exit code
pub async fn execute_command(args: Args) -> i32 {
    let config = RuntimeConfig::from(&args);

    if let Err(e) = args.validate() {
        config.error_println(&e.to_string());
        config.println("Run with --help for usage.");
        return e.exit_code().code();
    }

    let result = if args.stat {
        execute_stat(&args, &config).await
    } else {
        execute_release(&args, &config).await
    };

    match result {
        Ok(exit_code) => exit_code,
        Err(e) => {
            report_error(&e, &config);
            e.exit_code().code()
        }
    }
}

fn report_error(e: &ReleaseError, config: &RuntimeConfig) {
    config.error_println(&e.to_string());

    let suggestions = e.recovery_suggestions();
    if !suggestions.is_empty() {
        config.println("\n💡 Recovery suggestions:");
        for suggestion in suggestions {
            config.indent(&format!("• {}", suggestion));
        }
    }
}
