//! CLI command handling
//!
//! Dispatches CLI commands to the step executor and formats output.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tokio_util::sync::CancellationToken;

use crate::commands::Commands;
use crate::common::config::{Config, RunnerCheck};
use crate::common::{paths, Error, Result};
use crate::sink::{ConsoleSink, MemorySink};
use crate::step::{self, Outcome, StepConfig, StepExecutor};
use crate::store::Workspace;
use crate::vars::BuildVariables;

/// Dispatch a CLI command
///
/// Returns whether the command succeeded; `run` reports a failed step here
/// rather than as an error.
pub async fn dispatch(command: Commands) -> Result<bool> {
    match command {
        Commands::Run {
            step,
            workspace,
            vars,
            runner,
            interpreter,
            config,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(runner) = runner {
                config.runner.path = Some(runner);
            }
            if let Some(interpreter) = interpreter {
                config.runner.interpreter = interpreter;
            }

            let step = StepConfig::load(&step)?;
            let mut variables = BuildVariables::from_env();
            for var in &vars {
                variables.set_param(var)?;
            }

            let workspace = absolute(&workspace)?;
            let cancel = CancellationToken::new();
            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, stopping the wait for the runner");
                    ctrl_c.cancel();
                }
            });

            let executor = StepExecutor::from_config(&config, Workspace::local(workspace))
                .with_cancellation(cancel);

            let outcome = executor.perform(&step, &variables, &ConsoleSink).await;
            report(&outcome, json)?;
            Ok(outcome.is_success())
        }

        Commands::Resolve {
            template,
            vars,
            env,
        } => {
            let mut variables = if env {
                BuildVariables::from_env()
            } else {
                BuildVariables::new()
            };
            for var in &vars {
                variables.set_param(var)?;
            }

            let sink = MemorySink::new();
            match step::resolve(&template, &variables, &sink) {
                Ok(resolved) => {
                    println!("{}", resolved);
                    Ok(true)
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".red().bold(), e);
                    Ok(false)
                }
            }
        }

        Commands::Tokenize { args } => {
            for token in step::tokenize(&args) {
                println!("{}", token);
            }
            Ok(true)
        }

        Commands::Config { check, config } => {
            let path = config.clone().or_else(paths::config_path);
            let config = load_config(config.as_deref())?;

            match &path {
                Some(path) if path.exists() => println!("Config file: {}", path.display()),
                Some(path) => println!("Config file: {} (not found, using defaults)", path.display()),
                None => println!("Config file: (no config directory on this platform)"),
            }
            match &config.runner.path {
                Some(runner) => println!("Runner:      {}", runner.display()),
                None => println!("Runner:      {}", "not configured".yellow()),
            }
            println!("Interpreter: {}", config.runner.interpreter);
            println!("Staging dir: {}", config.staging.dir().display());

            if !check {
                return Ok(true);
            }
            match config.check_runner() {
                RunnerCheck::Ok(path) => {
                    println!("{} runner found at {}", "✓".green(), path.display());
                    Ok(true)
                }
                RunnerCheck::Unconfigured => {
                    println!("{} no runner configured", "✗".red());
                    Ok(false)
                }
                RunnerCheck::Missing(path) => {
                    println!("{} runner not found: {}", "✗".red(), path.display());
                    Ok(false)
                }
                RunnerCheck::NotAFile(path) => {
                    println!("{} runner is a directory: {}", "✗".red(), path.display());
                    Ok(false)
                }
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| Error::Internal(format!("Failed to get current directory: {}", e)))?;
    Ok(cwd.join(path))
}

fn report(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match outcome {
        Outcome::Success => println!("{}", "Step succeeded".green().bold()),
        Outcome::Failure(reason) => {
            println!("{} {:?}", "Step failed:".red().bold(), reason)
        }
    }
    Ok(())
}
