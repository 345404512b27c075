//! Error types for the htmlsuite runner
//!
//! Every error raised inside a step execution is reported on the build log
//! and collapsed into a [`FailureReason`] at the executor boundary.

use std::io;
use thiserror::Error;

use crate::step::FailureReason;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the htmlsuite runner
#[derive(Error, Debug)]
pub enum Error {
    // === Step Configuration Errors ===
    #[error("Build config : {0} field is mandatory")]
    MissingField(&'static str),

    #[error("Please configure the htmlSuite runner (runner.path in the configuration file)")]
    RunnerUnconfigured,

    // === Suite Errors ===
    #[error("The suiteFile '{0}' is not a file or an url ! Check your build configuration.")]
    UnsupportedSuiteReference(String),

    #[error("Downloading suite file from url {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    // === Placeholder Errors ===
    #[error("Failed to resolve ${{{0}}}")]
    UnresolvedVariable(String),

    #[error("Unable to find closing bracket after {offset}")]
    UnterminatedPlaceholder { offset: usize },

    // === Process Errors ===
    #[error("Failed to launch '{program}': {source}")]
    ProcessIo {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Execution interrupted while waiting for the runner")]
    ProcessInterrupted,

    #[error("Runner exited with {}", exit_description(.code))]
    ProcessFailed { code: Option<i32> },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Create a download failed error
    pub fn download_failed(url: &str, reason: impl std::fmt::Display) -> Self {
        Self::DownloadFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a process launch error
    pub fn process_io(program: &str, source: io::Error) -> Self {
        Self::ProcessIo {
            program: program.to_string(),
            source,
        }
    }

    /// Map this error to the coarse reason reported to the caller
    pub fn failure_reason(&self) -> FailureReason {
        match self {
            Error::MissingField(field) => FailureReason::ConfigInvalid { field: *field },
            Error::RunnerUnconfigured => FailureReason::RunnerUnconfigured,
            Error::UnsupportedSuiteReference(_) => FailureReason::UnsupportedSuiteReference,
            Error::DownloadFailed { .. } => FailureReason::DownloadFailed,
            Error::UnresolvedVariable(_) | Error::UnterminatedPlaceholder { .. } => {
                FailureReason::PlaceholderUnresolved
            }
            Error::ProcessInterrupted => FailureReason::ProcessInterrupted,
            Error::ProcessFailed { code } => FailureReason::ProcessFailed { code: *code },
            Error::ProcessIo { .. }
            | Error::Io(_)
            | Error::FileRead { .. }
            | Error::Json(_)
            | Error::Config(_)
            | Error::ConfigParse(_)
            | Error::Internal(_) => FailureReason::ProcessIoError,
        }
    }
}
