//! kodegen_ghr - create a GitHub release and upload artifacts to it in parallel.

use kodegen_ghr::cli;
use std::process;

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(exit_code) => process::exit(exit_code),
    };

    let level = if args.debug_enabled() { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    process::exit(cli::run(args).await);
}
