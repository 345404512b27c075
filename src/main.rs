//! htmlsuite - run HTML browser test suites as a build step
//!
//! Resolves placeholders in a step description, stages the suite into the
//! workspace and launches the htmlSuite runner.

use clap::Parser;
use htmlsuite::{cli, commands, common::logging};
use commands::Commands;

#[derive(Parser)]
#[command(name = "htmlsuite", about = "htmlSuite build-step executor")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
