//! End-to-end tests for the htmlSuite step executor
//!
//! These tests run complete executions against a temporary workspace:
//! 1. Configuration and runner checks
//! 2. Suite location, download and staging
//! 3. Placeholder resolution and command line assembly
//! 4. Process outcome mapping and staged file cleanup
//!
//! The runner is replaced by a shell script acting as the interpreter, so the
//! process tests only run on Unix.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use htmlsuite::common::config::RunnerSettings;
use htmlsuite::step::resolve;
use htmlsuite::{
    BuildVariables, FailureReason, FileStore, LocalStore, MemorySink, Outcome, StepConfig,
    StepExecutor, Workspace,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Test context with a workspace, a staging directory and a runner archive
struct TestContext {
    _temp: tempfile::TempDir,
    root: PathBuf,
    workspace: PathBuf,
    staging: PathBuf,
    runner_jar: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let root = temp.path().to_path_buf();
        let workspace = root.join("workspace");
        let staging = root.join("staging");
        std::fs::create_dir_all(&workspace).expect("Failed to create workspace");

        let runner_jar = root.join("selenium-server.jar");
        std::fs::write(&runner_jar, b"PK").expect("Failed to write runner");

        Self {
            _temp: temp,
            root,
            workspace,
            staging,
            runner_jar,
        }
    }

    /// Write a fake interpreter that prints its cwd and arguments
    #[cfg(unix)]
    fn fake_interpreter(&self) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root.join("fake-java");
        std::fs::write(
            &path,
            "#!/bin/sh\n\
             echo \"cwd=$(pwd)\"\n\
             for arg in \"$@\"; do echo \"arg=$arg\"; done\n\
             echo \"stderr line\" >&2\n\
             if [ -n \"$FAKE_SLEEP\" ]; then sleep \"$FAKE_SLEEP\"; fi\n\
             exit ${FAKE_EXIT:-0}\n",
        )
        .expect("Failed to write fake interpreter");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to chmod fake interpreter");
        path.to_string_lossy().into_owned()
    }

    fn runner(&self, interpreter: &str) -> RunnerSettings {
        RunnerSettings {
            path: Some(self.runner_jar.clone()),
            interpreter: interpreter.to_string(),
        }
    }

    fn executor(&self, runner: RunnerSettings, store: Arc<dyn FileStore>) -> StepExecutor {
        StepExecutor::new(runner, Workspace::new(&self.workspace, store))
            .with_staging_dir(&self.staging)
    }

    fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(&self.workspace)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.path())
                    .filter(|p| {
                        p.file_name()
                            .is_some_and(|n| n.to_string_lossy().starts_with("tempHtmlSuite"))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Local store that records every delete
#[derive(Default)]
struct CountingStore {
    deletes: Mutex<Vec<PathBuf>>,
}

impl CountingStore {
    fn deletes(&self) -> Vec<PathBuf> {
        self.deletes.lock().unwrap().clone()
    }
}

impl FileStore for CountingStore {
    fn exists(&self, path: &Path) -> bool {
        LocalStore.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalStore.is_dir(path)
    }

    fn create_temp_file(&self, dir: &Path, prefix: &str, suffix: &str) -> io::Result<PathBuf> {
        LocalStore.create_temp_file(dir, prefix, suffix)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        self.deletes.lock().unwrap().push(path.to_path_buf());
        LocalStore.delete(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        LocalStore.create_dir_all(path)
    }

    fn upload(&self, local: &Path, dest: &Path) -> io::Result<u64> {
        LocalStore.upload(local, dest)
    }

    fn delete_contents(&self, dir: &Path, keep: &[PathBuf]) -> io::Result<()> {
        LocalStore.delete_contents(dir, keep)
    }
}

/// Serve a single HTTP response on localhost and return the suite URL
async fn serve_once(status: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let mut read = 0;
            while read < buf.len() {
                let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                if n == 0 {
                    break;
                }
                read += n;
                if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}/suite.html", addr)
}

fn arg_lines(sink: &MemorySink) -> Vec<String> {
    sink.lines()
        .into_iter()
        .filter_map(|line| line.text.strip_prefix("arg=").map(str::to_string))
        .collect()
}

// === Configuration checks ===

#[tokio::test]
async fn test_all_fields_empty_reports_browser() {
    let ctx = TestContext::new();
    let exec = ctx.executor(ctx.runner("java"), Arc::new(LocalStore));
    let sink = MemorySink::new();

    let outcome = exec
        .perform(&StepConfig::default(), &BuildVariables::new(), &sink)
        .await;

    assert_eq!(
        outcome,
        Outcome::Failure(FailureReason::ConfigInvalid { field: "browser" })
    );
    assert!(sink.has_errors());
    assert!(sink
        .contents()
        .contains("ERROR: Build config : browser field is mandatory"));
}

#[tokio::test]
async fn test_missing_fields_in_declared_order() {
    let ctx = TestContext::new();
    let exec = ctx.executor(ctx.runner("java"), Arc::new(LocalStore));

    let cases = [
        (StepConfig::new("*iexplore", "", "", "", ""), "startURL"),
        (
            StepConfig::new("*iexplore", "http://www.google.com", "", "", ""),
            "suiteFile",
        ),
        (
            StepConfig::new("*iexplore", "http://www.google.com", "TestSuites", "", ""),
            "resultFile",
        ),
    ];

    for (step, field) in cases {
        let sink = MemorySink::new();
        let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;
        assert_eq!(outcome, Outcome::Failure(FailureReason::ConfigInvalid { field }));
        assert!(sink
            .contents()
            .contains(&format!("Build config : {} field is mandatory", field)));
    }
}

#[tokio::test]
async fn test_unconfigured_runner_fails_before_classification() {
    let ctx = TestContext::new();
    let store = Arc::new(CountingStore::default());
    let exec = ctx.executor(RunnerSettings::default(), store.clone());
    let sink = MemorySink::new();
    let step = StepConfig::new(
        "*firefox",
        "http://www.google.com",
        "http://127.0.0.1:9/suite.html",
        "index.html",
        "",
    );

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(outcome, Outcome::Failure(FailureReason::RunnerUnconfigured));
    assert!(sink.contents().contains("Please configure the htmlSuite runner"));
    assert!(!ctx.staging.exists());
    assert!(ctx.staged_files().is_empty());
    assert!(store.deletes().is_empty());
}

#[tokio::test]
async fn test_directory_suite_is_unsupported() {
    let ctx = TestContext::new();
    std::fs::create_dir_all(ctx.workspace.join("TestSuites")).unwrap();
    let exec = ctx.executor(ctx.runner("java"), Arc::new(LocalStore));
    let sink = MemorySink::new();
    let step = StepConfig::new(
        "*iexplore",
        "http://www.google.com",
        "TestSuites",
        "index.html",
        "",
    );

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(
        outcome,
        Outcome::Failure(FailureReason::UnsupportedSuiteReference)
    );
    assert!(sink
        .contents()
        .contains("is not a file or an url ! Check your build configuration."));
}

// === Placeholders ===

#[test]
fn test_start_url_resolution() {
    let vars = BuildVariables::new()
        .with("mySite", "xxx")
        .with("myPath", "path")
        .with("resultFile", "index.html")
        .with("browser", "*iexplore");
    let sink = MemorySink::new();

    assert_eq!(
        resolve("http://www.${mySite}.com/${myPath}", &vars, &sink).unwrap(),
        "http://www.xxx.com/path"
    );
    assert_eq!(resolve("${browser}", &vars, &sink).unwrap(), "*iexplore");
    assert_eq!(resolve("${resultFile}", &vars, &sink).unwrap(), "index.html");
}

#[test]
fn test_resolution_with_hash_map() {
    let mut vars = HashMap::new();
    vars.insert("host".to_string(), "localhost:8080".to_string());
    let sink = MemorySink::new();

    assert_eq!(
        resolve("http://${host}/app", &vars, &sink).unwrap(),
        "http://localhost:8080/app"
    );
}

// === Staging and process execution ===

#[tokio::test]
async fn test_launch_failure_still_deletes_staged_suite() {
    let ctx = TestContext::new();
    let url = serve_once("200 OK", "<table>suite</table>").await;
    let store = Arc::new(CountingStore::default());
    let runner = RunnerSettings {
        path: Some(PathBuf::from("rtyrturturtur")),
        interpreter: ctx.root.join("no-such-java").to_string_lossy().into_owned(),
    };
    let exec = ctx.executor(runner, store.clone());
    let sink = MemorySink::new();
    let step = StepConfig::new("*iexplore", "http://www.google.com", url, "index.html", "");

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(outcome, Outcome::Failure(FailureReason::ProcessIoError));
    assert!(sink.contents().contains("Try downloading suite file"));
    assert!(ctx.staged_files().is_empty());

    let staged_deletes: Vec<_> = store
        .deletes()
        .into_iter()
        .filter(|p| p.to_string_lossy().contains("tempHtmlSuite"))
        .collect();
    assert_eq!(staged_deletes.len(), 1);
}

#[tokio::test]
async fn test_download_failure() {
    let ctx = TestContext::new();
    let url = serve_once("404 Not Found", "missing").await;
    let exec = ctx.executor(ctx.runner("java"), Arc::new(LocalStore));
    let sink = MemorySink::new();
    let step = StepConfig::new("*firefox", "http://localhost", url, "index.html", "");

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(outcome, Outcome::Failure(FailureReason::DownloadFailed));
    assert!(sink.contents().contains("Downloading suite file from url"));
    assert!(ctx.staged_files().is_empty());
    let leftovers = std::fs::read_dir(&ctx.staging)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_successful_run_with_remote_suite() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    let url = serve_once("200 OK", "<table>suite</table>").await;
    let store = Arc::new(CountingStore::default());
    let exec = ctx.executor(ctx.runner(&interpreter), store.clone());
    let sink = MemorySink::new();

    std::fs::write(ctx.workspace.join("stale.html"), "old result").unwrap();

    let step = StepConfig::new(
        "${browser}",
        "http://www.${mySite}.com/${myPath}",
        url,
        "reports/${build}/index.html",
        "-port 4445 -userExtensions \"user extensions.js\"",
    );
    let vars = BuildVariables::new()
        .with("browser", "*firefox")
        .with("mySite", "xxx")
        .with("myPath", "path")
        .with("build", "42");

    let outcome = exec.perform(&step, &vars, &sink).await;
    assert_eq!(outcome, Outcome::Success, "log:\n{}", sink.contents());

    let args = arg_lines(&sink);
    assert_eq!(args[0], "-jar");
    assert!(args[1].ends_with("selenium-server.jar"));
    assert_eq!(
        &args[2..6],
        ["-port", "4445", "-userExtensions", "\"user extensions.js\""]
    );
    assert_eq!(args[6], "-htmlSuite");
    assert_eq!(args[7], "*firefox");
    assert_eq!(args[8], "http://www.xxx.com/path");
    assert!(args[9].contains("tempHtmlSuite"));
    assert_eq!(args[10], "reports/42/index.html");
    assert_eq!(args.len(), 11);

    let log = sink.contents();
    assert!(log.contains("stderr line"));
    assert!(log.contains(&format!("cwd={}", ctx.workspace.display())));
    assert!(log.contains("Cleaning workspace : workspace"));

    assert!(ctx.workspace.join("reports/42").is_dir());
    assert!(!ctx.workspace.join("stale.html").exists());
    assert!(ctx.staged_files().is_empty());
    assert_eq!(
        store
            .deletes()
            .iter()
            .filter(|p| p.to_string_lossy().contains("tempHtmlSuite"))
            .count(),
        1
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_local_suite_survives_workspace_cleaning() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    std::fs::create_dir_all(ctx.workspace.join("suites")).unwrap();
    std::fs::write(ctx.workspace.join("suites/smoke.html"), "<table/>").unwrap();
    std::fs::write(ctx.workspace.join("suites/old.html"), "<table/>").unwrap();
    let exec = ctx.executor(ctx.runner(&interpreter), Arc::new(LocalStore));
    let sink = MemorySink::new();
    let step = StepConfig::new(
        "*firefox",
        "http://localhost",
        "suites/smoke.html",
        "index.html",
        "",
    );

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(outcome, Outcome::Success, "log:\n{}", sink.contents());
    assert!(ctx.workspace.join("suites/smoke.html").exists());
    assert!(!ctx.workspace.join("suites/old.html").exists());
    let args = arg_lines(&sink);
    assert_eq!(
        args[args.len() - 2],
        ctx.workspace.join("suites/smoke.html").to_string_lossy()
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_nonzero_exit_is_failure() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    let url = serve_once("200 OK", "<table/>").await;
    let exec = ctx.executor(ctx.runner(&interpreter), Arc::new(LocalStore));
    let sink = MemorySink::new();
    let step = StepConfig::new("*firefox", "http://localhost", url, "index.html", "");
    let vars = BuildVariables::new().with("FAKE_EXIT", "3");

    let outcome = exec.perform(&step, &vars, &sink).await;

    assert_eq!(
        outcome,
        Outcome::Failure(FailureReason::ProcessFailed { code: Some(3) })
    );
    assert!(sink.contents().contains("Runner exited with exit code 3"));
    assert!(ctx.staged_files().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_unresolved_placeholder_cleans_up() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    let url = serve_once("200 OK", "<table/>").await;
    let exec = ctx.executor(ctx.runner(&interpreter), Arc::new(LocalStore));
    let sink = MemorySink::new();
    let step = StepConfig::new("*firefox", "http://www.${mySite}.com", url, "index.html", "");

    let outcome = exec.perform(&step, &BuildVariables::new(), &sink).await;

    assert_eq!(
        outcome,
        Outcome::Failure(FailureReason::PlaceholderUnresolved)
    );
    assert!(sink.contents().contains("${mySite} not found"));
    assert!(arg_lines(&sink).is_empty());
    assert!(ctx.staged_files().is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_interrupts_wait() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    std::fs::write(ctx.workspace.join("suite.html"), "<table/>").unwrap();
    let cancel = tokio_util::sync::CancellationToken::new();
    let exec = ctx
        .executor(ctx.runner(&interpreter), Arc::new(LocalStore))
        .with_cancellation(cancel.clone());
    let sink = MemorySink::new();
    let step = StepConfig::new("*firefox", "http://localhost", "suite.html", "index.html", "");
    let vars = BuildVariables::new().with("FAKE_SLEEP", "30");

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = exec.perform(&step, &vars, &sink).await;

    assert_eq!(outcome, Outcome::Failure(FailureReason::ProcessInterrupted));
    assert!(started.elapsed() < std::time::Duration::from_secs(20));
}

#[cfg(unix)]
#[tokio::test]
async fn test_cancellation_deletes_staged_suite_once() {
    let ctx = TestContext::new();
    let interpreter = ctx.fake_interpreter();
    let url = serve_once("200 OK", "<table>suite</table>").await;
    let store = Arc::new(CountingStore::default());
    let cancel = tokio_util::sync::CancellationToken::new();
    let exec = ctx
        .executor(ctx.runner(&interpreter), store.clone())
        .with_cancellation(cancel.clone());
    let sink = MemorySink::new();
    let step = StepConfig::new("*firefox", "http://localhost", url, "index.html", "");
    let vars = BuildVariables::new().with("FAKE_SLEEP", "30");

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let outcome = exec.perform(&step, &vars, &sink).await;

    assert_eq!(outcome, Outcome::Failure(FailureReason::ProcessInterrupted));
    assert!(sink.contents().contains("-htmlSuite"));
    assert!(ctx.staged_files().is_empty());
    assert_eq!(
        store
            .deletes()
            .iter()
            .filter(|p| p.to_string_lossy().contains("tempHtmlSuite"))
            .count(),
        1
    );
}
