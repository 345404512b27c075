//! htmlSuite build step
//!
//! Turns a declarative step description into one runner invocation:
//! validate, locate the suite, resolve placeholders, build the command line,
//! run it and report an [`Outcome`].

pub mod command;
pub mod executor;
pub mod placeholder;
pub mod suite;
pub mod tokenize;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

pub use command::CommandLine;
pub use executor::StepExecutor;
pub use placeholder::resolve;
pub use suite::{locate, stage, SuiteReference, StagedSuite};
pub use tokenize::tokenize;

/// Step description as written by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepConfig {
    /// Browser identifier, e.g. `*firefox`
    #[serde(default)]
    pub browser: String,
    /// Base URL of the application under test
    #[serde(default, alias = "startURL")]
    pub start_url: String,
    /// Suite location: a file path or a URL
    #[serde(default, alias = "suiteFile")]
    pub suite_file: String,
    /// Result file, relative to the workspace
    #[serde(default, alias = "resultFile")]
    pub result_file: String,
    /// Extra runner arguments
    #[serde(default)]
    pub other: String,
}

impl StepConfig {
    pub fn new(
        browser: impl Into<String>,
        start_url: impl Into<String>,
        suite_file: impl Into<String>,
        result_file: impl Into<String>,
        other: impl Into<String>,
    ) -> Self {
        Self {
            browser: browser.into(),
            start_url: start_url.into(),
            suite_file: suite_file.into(),
            result_file: result_file.into(),
            other: other.into(),
        }
    }

    /// Load a step from a TOML file, or YAML for `.yaml`/`.yml`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| Error::ConfigParse(format!("{}: {}", path.display(), e))),
            _ => toml::from_str(&content)
                .map_err(|e| Error::ConfigParse(format!("{}: {}", path.display(), e))),
        }
    }

    /// Check the mandatory fields in declaration order
    pub fn validate(&self) -> Result<()> {
        let mandatory = [
            ("browser", &self.browser),
            ("startURL", &self.start_url),
            ("suiteFile", &self.suite_file),
            ("resultFile", &self.result_file),
        ];
        match mandatory.into_iter().find(|(_, value)| value.is_empty()) {
            Some((field, _)) => Err(Error::MissingField(field)),
            None => Ok(()),
        }
    }
}

/// Step description with every placeholder substituted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub browser: String,
    pub start_url: String,
    pub suite_file: String,
    pub result_file: String,
    pub other: String,
}

/// Why an execution failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// A mandatory field is empty
    ConfigInvalid { field: &'static str },
    /// No runner path configured
    RunnerUnconfigured,
    /// The suite is neither an existing file nor a URL
    UnsupportedSuiteReference,
    /// Fetching or transferring a remote suite failed
    DownloadFailed,
    /// A placeholder could not be resolved
    PlaceholderUnresolved,
    /// The runner could not be launched
    ProcessIoError,
    /// The wait for the runner was cancelled
    ProcessInterrupted,
    /// The runner exited unsuccessfully
    ProcessFailed { code: Option<i32> },
}

/// Final result of one execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failure", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(FailureReason),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}
