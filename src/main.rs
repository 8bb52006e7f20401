use std::process::ExitCode;

use clap::Parser;
use takehome::api::{Cli, run_cli};

#[tokio::main]
async fn main() -> ExitCode {
    takehome::logging::init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run_cli(cli).await {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
