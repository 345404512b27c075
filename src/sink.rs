//! Build log sinks
//!
//! A step writes its progress and the runner's output to an append-only
//! sink. Error lines carry their own severity so a host can decide that an
//! execution failed from the sink content alone.

use std::sync::Mutex;

use colored::Colorize;

/// Append-only text sink for one execution
pub trait LogSink: Send + Sync {
    /// Append a progress or output line
    fn info(&self, line: &str);

    /// Append an error line
    fn error(&self, line: &str);
}

/// Sink writing to the terminal: info to stdout, errors to stderr
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn info(&self, line: &str) {
        println!("{}", line);
    }

    fn error(&self, line: &str) {
        eprintln!("{} {}", "ERROR:".red().bold(), line);
    }
}

/// Severity of a captured line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A captured sink line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkLine {
    pub severity: Severity,
    pub text: String,
}

/// Sink keeping every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<SinkLine>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured lines
    pub fn lines(&self) -> Vec<SinkLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// The whole log as text, error lines prefixed with `ERROR: `
    pub fn contents(&self) -> String {
        self.lines()
            .iter()
            .map(|line| match line.severity {
                Severity::Info => format!("{}\n", line.text),
                Severity::Error => format!("ERROR: {}\n", line.text),
            })
            .collect()
    }

    /// Whether any error line was written
    pub fn has_errors(&self) -> bool {
        self.lines()
            .iter()
            .any(|line| line.severity == Severity::Error)
    }

    fn push(&self, severity: Severity, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(SinkLine {
                severity,
                text: line.to_string(),
            });
        }
    }
}

impl LogSink for MemorySink {
    fn info(&self, line: &str) {
        self.push(Severity::Info, line);
    }

    fn error(&self, line: &str) {
        self.push(Severity::Error, line);
    }
}
