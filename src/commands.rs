//! CLI command definitions
//!
//! Defines the clap commands for the htmlsuite CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run an htmlSuite step
    Run {
        /// Step description (TOML, or YAML with a .yaml/.yml extension)
        step: PathBuf,

        /// Workspace directory; its contents are deleted before the run
        #[arg(long, short, default_value = "workspace")]
        workspace: PathBuf,

        /// Build variable, may be repeated: --var mySite=example
        #[arg(long = "var", short = 'v', value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Runner archive, overrides runner.path from the config file
        #[arg(long)]
        runner: Option<PathBuf>,

        /// Interpreter, overrides runner.interpreter from the config file
        #[arg(long)]
        interpreter: Option<String>,

        /// Configuration file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// Substitute ${name} placeholders in a string
    Resolve {
        /// Template to resolve
        template: String,

        /// Variable, may be repeated: --var mySite=example
        #[arg(long = "var", short = 'v', value_name = "NAME=VALUE")]
        vars: Vec<String>,

        /// Also resolve against the process environment
        #[arg(long)]
        env: bool,
    },

    /// Show how extra runner arguments are split into tokens
    Tokenize {
        /// Raw argument string
        args: String,
    },

    /// Show the configuration file location and runner settings
    Config {
        /// Verify that the configured runner exists
        #[arg(long)]
        check: bool,

        /// Configuration file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}
