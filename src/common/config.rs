//! Configuration file handling
//!
//! The global runner settings are loaded once at process start and handed to
//! the executor by value; nothing here is mutated during an execution.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::{config_path, staging_dir};
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// htmlSuite runner settings
    #[serde(default)]
    pub runner: RunnerSettings,

    /// Download staging settings
    #[serde(default)]
    pub staging: StagingConfig,
}

/// Settings for the external runner invocation
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerSettings {
    /// Path to the runner archive passed after `-jar`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Interpreter used to launch the runner
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            path: None,
            interpreter: default_interpreter(),
        }
    }
}

fn default_interpreter() -> String {
    "java".to_string()
}

impl RunnerSettings {
    /// Build settings for an explicit runner path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Whether a non-empty runner path has been configured
    pub fn is_configured(&self) -> bool {
        self.path
            .as_ref()
            .is_some_and(|path| !path.as_os_str().is_empty())
    }

    /// Absolute form of the runner path
    ///
    /// An existing path is canonicalized, otherwise `PATH` is searched; the
    /// configured value is returned verbatim when neither succeeds.
    pub fn absolute_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref().filter(|_| self.is_configured())?;
        if path.exists() {
            return Some(path.canonicalize().unwrap_or_else(|_| path.clone()));
        }
        Some(which::which(path).unwrap_or_else(|_| path.clone()))
    }
}

/// Where downloaded suites are staged before transfer into the workspace
#[derive(Debug, Deserialize, Clone, Default)]
pub struct StagingConfig {
    /// Staging directory (defaults to the platform data directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl StagingConfig {
    /// Effective staging directory
    pub fn dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(staging_dir)
    }
}

/// Result of checking the configured runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCheck {
    /// No runner path configured
    Unconfigured,
    /// The configured path does not exist
    Missing(PathBuf),
    /// The configured path is a directory
    NotAFile(PathBuf),
    /// The configured path is usable
    Ok(PathBuf),
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }

    /// Check that the configured runner exists and is a regular file
    pub fn check_runner(&self) -> RunnerCheck {
        let Some(path) = self.runner.absolute_path() else {
            return RunnerCheck::Unconfigured;
        };
        if !path.exists() {
            RunnerCheck::Missing(path)
        } else if path.is_dir() {
            RunnerCheck::NotAFile(path)
        } else {
            RunnerCheck::Ok(path)
        }
    }
}
