//! Build variables
//!
//! The variable set of a build is used twice: as the lookup table for
//! `${name}` placeholders and as the environment of the runner process.

use std::collections::{BTreeMap, HashMap};

use crate::common::{Error, Result};

/// Name to value lookup; `None` means the variable does not exist
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl VariableResolver for HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl VariableResolver for BTreeMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Variable set of one build
#[derive(Debug, Clone, Default)]
pub struct BuildVariables {
    vars: BTreeMap<String, String>,
}

impl BuildVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the current process environment
    pub fn from_env() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Set a variable, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Builder form of [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Parse and apply a `NAME=VALUE` parameter
    ///
    /// The value may be empty; the name may not.
    pub fn set_param(&mut self, param: &str) -> Result<()> {
        let (name, value) = param.split_once('=').ok_or_else(|| {
            Error::Config(format!("Invalid variable '{}', expected NAME=VALUE", param))
        })?;
        if name.is_empty() {
            return Err(Error::Config(format!(
                "Invalid variable '{}', name is empty",
                param
            )));
        }
        self.set(name, value);
        Ok(())
    }

    /// Variables as a process environment
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.vars
    }
}

impl VariableResolver for BuildVariables {
    fn resolve(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl FromIterator<(String, String)> for BuildVariables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}
