//! htmlsuite - build-step executor for HTML browser test suites
//!
//! Resolves `${name}` placeholders against a build's variables, stages the
//! suite file (local path or URL) into the workspace and runs the htmlSuite
//! runner with a correctly assembled command line.

pub mod cli;
pub mod commands;
pub mod common;
pub mod sink;
pub mod step;
pub mod store;
pub mod vars;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use sink::{ConsoleSink, LogSink, MemorySink};
pub use step::{FailureReason, Outcome, StepConfig, StepExecutor};
pub use store::{FileStore, LocalStore, Workspace};
pub use vars::{BuildVariables, VariableResolver};
