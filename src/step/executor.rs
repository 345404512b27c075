//! Step execution state machine
//!
//! validate → runner check → locate/stage suite → clean workspace →
//! resolve placeholders → build and run → release staged suite.
//!
//! Errors never leave [`StepExecutor::perform`]: they are written to the sink
//! and folded into the returned [`Outcome`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::command::{self, CommandLine};
use super::placeholder::resolve;
use super::suite::{self, StagedSuite, SuiteReference};
use super::tokenize::tokenize;
use super::{Outcome, ResolvedConfig, StepConfig};
use crate::common::config::{Config, RunnerSettings};
use crate::common::{Error, Result};
use crate::sink::LogSink;
use crate::store::{self, FileStore, LocalStore, Workspace};
use crate::vars::BuildVariables;

/// Executes htmlSuite steps against one workspace
pub struct StepExecutor {
    runner: RunnerSettings,
    workspace: Workspace,
    node: Arc<dyn FileStore>,
    staging_dir: PathBuf,
    cancel: CancellationToken,
}

impl StepExecutor {
    pub fn new(runner: RunnerSettings, workspace: Workspace) -> Self {
        Self {
            runner,
            workspace,
            node: Arc::new(LocalStore),
            staging_dir: crate::common::paths::staging_dir(),
            cancel: CancellationToken::new(),
        }
    }

    /// Executor using the runner and staging settings of `config`
    pub fn from_config(config: &Config, workspace: Workspace) -> Self {
        Self::new(config.runner.clone(), workspace).with_staging_dir(config.staging.dir())
    }

    /// Store of the node the runner executes on
    pub fn with_node(mut self, node: Arc<dyn FileStore>) -> Self {
        self.node = node;
        self
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    /// Token that interrupts the wait for the runner when cancelled
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run one step and report its outcome
    pub async fn perform(
        &self,
        step: &StepConfig,
        vars: &BuildVariables,
        sink: &dyn LogSink,
    ) -> Outcome {
        match self.execute(step, vars, sink).await {
            Ok(()) => {
                tracing::info!(workspace = %self.workspace.root().display(), "Step succeeded");
                Outcome::Success
            }
            Err(e) => {
                sink.error(&e.to_string());
                let reason = e.failure_reason();
                tracing::warn!(?reason, "Step failed: {}", e);
                Outcome::Failure(reason)
            }
        }
    }

    async fn execute(
        &self,
        step: &StepConfig,
        vars: &BuildVariables,
        sink: &dyn LogSink,
    ) -> Result<()> {
        step.validate()?;

        let runner_path = self
            .runner
            .absolute_path()
            .ok_or(Error::RunnerUnconfigured)?;

        let store = self.workspace.store();
        let root = self.workspace.root().to_path_buf();
        store::blocking(store, move |store| store.create_dir_all(&root)).await?;

        let (suite_path, staged) = self.prepare_suite(&step.suite_file, sink).await?;

        sink.info(&format!("Start URL = {}", step.start_url));
        sink.info(&format!(
            "Cleaning workspace : {}",
            self.workspace.base_name()
        ));
        let (root, keep) = (self.workspace.root().to_path_buf(), vec![suite_path.clone()]);
        store::blocking(store, move |store| store.delete_contents(&root, &keep)).await?;

        let result = self
            .launch(step, &suite_path, &runner_path, vars, sink)
            .await;

        if let Some(staged) = staged {
            let path = staged.path().display().to_string();
            if let Err(e) = staged.cleanup() {
                sink.error(&format!("Failed to delete temporary suite {}: {}", path, e));
            }
        }

        result
    }

    /// Locate the suite and stage it when it is remote
    async fn prepare_suite(
        &self,
        reference: &str,
        sink: &dyn LogSink,
    ) -> Result<(PathBuf, Option<StagedSuite>)> {
        match suite::locate(reference, &self.workspace, self.node.as_ref())? {
            SuiteReference::LocalPath(path) => {
                tracing::debug!(path = %path.display(), "Suite is a file");
                Ok((path, None))
            }
            SuiteReference::RemoteUrl(url) => {
                tracing::debug!(%url, "Suite is a url");
                let staged = suite::stage(&url, &self.workspace, &self.staging_dir, sink).await?;
                Ok((staged.path().to_path_buf(), Some(staged)))
            }
        }
    }

    async fn launch(
        &self,
        step: &StepConfig,
        suite_path: &std::path::Path,
        runner_path: &std::path::Path,
        vars: &BuildVariables,
        sink: &dyn LogSink,
    ) -> Result<()> {
        let resolved = ResolvedConfig {
            start_url: resolve(&step.start_url, vars, sink)?,
            suite_file: resolve(&suite_path.to_string_lossy(), vars, sink)?,
            result_file: resolve(&step.result_file, vars, sink)?,
            browser: resolve(&step.browser, vars, sink)?,
            other: resolve(&step.other, vars, sink)?,
        };

        let result_path = self.workspace.child(&resolved.result_file);
        if let Some(parent) = result_path.parent() {
            let parent = parent.to_path_buf();
            store::blocking(self.workspace.store(), move |store| store.create_dir_all(&parent))
                .await?;
        }

        let cmd = CommandLine::build(
            &self.runner.interpreter,
            &runner_path.to_string_lossy(),
            tokenize(&resolved.other),
            &resolved,
        );
        sink.info(&cmd.to_string());

        command::run(&cmd, self.workspace.root(), vars.env(), sink, &self.cancel).await
    }
}
