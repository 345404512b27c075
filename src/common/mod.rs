//! Common utilities shared between the CLI and the step executor

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, Result};
