//! Runner command line construction and execution

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::ResolvedConfig;
use crate::common::{Error, Result};
use crate::sink::LogSink;

/// Flag introducing the fixed positional arguments
pub const HTML_SUITE_FLAG: &str = "-htmlSuite";

/// Full runner invocation
///
/// Shape: `interpreter -jar runner [extra...] -htmlSuite browser startURL suite result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    argv: Vec<String>,
}

impl CommandLine {
    pub fn build(
        interpreter: &str,
        runner_path: &str,
        extra_tokens: Vec<String>,
        config: &ResolvedConfig,
    ) -> Self {
        let mut argv = Vec::with_capacity(extra_tokens.len() + 8);
        argv.push(interpreter.to_string());
        argv.push("-jar".to_string());
        argv.push(runner_path.to_string());
        argv.extend(extra_tokens);
        argv.push(HTML_SUITE_FLAG.to_string());
        argv.push(config.browser.clone());
        argv.push(config.start_url.clone());
        argv.push(config.suite_file.clone());
        argv.push(config.result_file.clone());
        Self { argv }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.argv.join(" "))
    }
}

/// Run `cmd` in `cwd` and forward its combined output to `sink`
///
/// Blocks the calling task until the process exits or `cancel` fires. On
/// cancellation the child is left running; stopping it is up to the caller's
/// environment.
pub async fn run(
    cmd: &CommandLine,
    cwd: &Path,
    env: &BTreeMap<String, String>,
    sink: &dyn LogSink,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut child = Command::new(cmd.program())
        .args(cmd.args())
        .current_dir(cwd)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::process_io(cmd.program(), e))?;

    tracing::debug!(pid = child.id(), "Runner started");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let finished = async {
        if let (Some(stdout), Some(stderr)) = (stdout, stderr) {
            tokio::join!(pump(stdout, sink), pump(stderr, sink));
        }
        child.wait().await
    };

    let status = tokio::select! {
        status = finished => status.map_err(|e| Error::process_io(cmd.program(), e))?,
        _ = cancel.cancelled() => return Err(Error::ProcessInterrupted),
    };

    tracing::debug!(?status, "Runner exited");
    if status.success() {
        Ok(())
    } else {
        Err(Error::ProcessFailed {
            code: status.code(),
        })
    }
}

/// Forward every line of `stream` to `sink` until end of file
///
/// Lines are decoded lossily; the runner's output encoding follows the
/// platform locale. The stream is dropped on return, so a read error closes
/// the pipe instead of leaving the child blocked on a full buffer.
async fn pump<R: AsyncRead + Unpin>(stream: R, sink: &dyn LogSink) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => sink.info(String::from_utf8_lossy(&line).trim_end_matches(['\r', '\n'])),
            Err(e) => {
                tracing::warn!("Failed to read runner output: {}", e);
                break;
            }
        }
    }
}
