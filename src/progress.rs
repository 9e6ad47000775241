//! Progress display for long external invocations

use indicatif::{ProgressBar, ProgressStyle};
use log::{Log, Metadata, Record};
use std::sync::RwLock;
use std::time::Duration;
use stmdeploy_core::{CommandRunner, Invocation, RunError, ToolOutput};

/// Spinner currently on screen, if any
static PROGRESS_BAR: RwLock<Option<ProgressBar>> = RwLock::new(None);

fn set_progress_bar(pb: Option<ProgressBar>) {
    let mut guard = PROGRESS_BAR.write().unwrap_or_else(|e| e.into_inner());
    *guard = pb;
}

fn current_progress_bar() -> Option<ProgressBar> {
    PROGRESS_BAR
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .clone()
}

/// Logger that hides the active spinner while a record is written
///
/// Without this the spinner redraw and the log line share one terminal row.
pub struct SuspendingLogger {
    inner: env_logger::Logger,
}

impl SuspendingLogger {
    pub fn new(inner: env_logger::Logger) -> Self {
        Self { inner }
    }
}

impl Log for SuspendingLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record<'_>) {
        if !self.inner.matches(record) {
            return;
        }
        match current_progress_bar() {
            Some(pb) => pb.suspend(|| self.inner.log(record)),
            None => self.inner.log(record),
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Runner that shows a spinner while the wrapped runner is busy
///
/// `--version` checks from tool discovery are passed through silently.
pub struct SpinnerRunner<R> {
    inner: R,
}

impl<R: CommandRunner> SpinnerRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: CommandRunner> CommandRunner for SpinnerRunner<R> {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, RunError> {
        if invocation.has_arg("--version") {
            return self.inner.run(invocation);
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            pb.set_style(style);
        }
        pb.set_message(format!("Running {}", invocation.program_name()));
        set_progress_bar(Some(pb.clone()));
        pb.enable_steady_tick(Duration::from_millis(100));

        let result = self.inner.run(invocation);
        set_progress_bar(None);
        pb.finish_and_clear();
        result
    }
}
