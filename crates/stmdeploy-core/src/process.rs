//! External process invocation
//!
//! Commands are described as an [`Invocation`]: a program plus a vector of
//! discrete arguments. They are never joined into a shell string, so
//! quoting is a non-issue and tests can compare argument vectors exactly.
//!
//! [`SystemRunner`] logs the full argument vector before spawning. There is
//! no dry-run mode, so that log line is the operator's audit trail.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::{runtime, time};

/// A single external command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program path or bare command name
    pub program: PathBuf,
    /// Arguments, one element per argv entry
    pub args: Vec<String>,
    /// Working directory
    pub cwd: Option<PathBuf>,
    /// Wall-clock limit
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Create an invocation with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set the wall-clock limit
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program name as shown in diagnostics
    pub fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// True if `needle` appears as a whole argument
    pub fn has_arg(&self, needle: &str) -> bool {
        self.args.iter().any(|a| a == needle)
    }

    /// True if `window` appears as a contiguous run of arguments
    pub fn has_args(&self, window: &[&str]) -> bool {
        self.args
            .windows(window.len())
            .any(|w| w.iter().zip(window).all(|(a, b)| a == b))
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.display().to_string()))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

// Display-only quoting; the argv itself is never re-parsed.
fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(char::is_whitespace) {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl ToolOutput {
    /// A successful run with the given standard output
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and standard error
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// True if the process exited with status 0
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Process-level failures
#[derive(Debug, Error)]
pub enum RunError {
    /// The program does not exist
    #[error("{0}: command not found")]
    NotFound(String),

    /// The program exceeded its time budget and was killed
    #[error("{program} timed out after {after:?}")]
    Timeout {
        /// Program that was killed
        program: String,
        /// Budget that was exceeded
        after: Duration,
    },

    /// Spawning or waiting failed
    #[error("{program}: {source}")]
    Io {
        /// Program involved
        program: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

/// Something that can run an [`Invocation`] to completion
///
/// Implementations block until the process exits or its timeout expires.
pub trait CommandRunner: Send + Sync {
    /// Run the invocation and capture its output
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, RunError>;
}

/// Runs invocations as real child processes
///
/// Each call drives the child on a current-thread tokio runtime. A child
/// that outlives its timeout is killed when its future is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ToolOutput, RunError> {
        log::info!("Executing: {}", invocation);

        let program = invocation.program_name();
        let rt = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|source| RunError::Io {
                program: program.clone(),
                source,
            })?;
        rt.block_on(run_child(invocation, program))
    }
}

async fn run_child(invocation: &Invocation, program: String) -> Result<ToolOutput, RunError> {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(dir) = &invocation.cwd {
        cmd.current_dir(dir);
    }

    let result = match invocation.timeout {
        Some(limit) => match time::timeout(limit, cmd.output()).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("{} exceeded {:?}, killing it", program, limit);
                return Err(RunError::Timeout {
                    program,
                    after: limit,
                });
            }
        },
        None => cmd.output().await,
    };

    let output = match result {
        Ok(output) => output,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(RunError::NotFound(program)),
        Err(source) => return Err(RunError::Io { program, source }),
    };

    let output = ToolOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    log::debug!("{} exited with {:?}", program, output.code);
    Ok(output)
}

/// Resolve `path` against the current directory for display and tool arguments
pub fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Instant;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new("make")
            .arg("-j4")
            .args(["-C", "/tmp/project"])
            .timeout(Some(Duration::from_secs(300)));
        assert_eq!(inv.program, PathBuf::from("make"));
        assert_eq!(inv.args, vec!["-j4", "-C", "/tmp/project"]);
        assert_eq!(inv.timeout, Some(Duration::from_secs(300)));
        assert!(inv.has_arg("-C"));
        assert!(inv.has_args(&["-C", "/tmp/project"]));
        assert!(!inv.has_args(&["-j4", "/tmp/project"]));
    }

    #[test]
    fn test_display_quotes_spaces() {
        let inv = Invocation::new("openocd")
            .args(["-c", "program fw.bin 0x8000000 verify", "-c", "exit"]);
        assert_eq!(
            inv.to_string(),
            "openocd -c \"program fw.bin 0x8000000 verify\" -c exit"
        );
    }

    #[test]
    fn test_tool_output_success() {
        assert!(ToolOutput::success("ok").is_success());
        assert!(!ToolOutput::failure(1, "boom").is_success());
        assert!(!ToolOutput::default().is_success());
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let result = SystemRunner::new().run(&Invocation::new("stmdeploy-no-such-tool-xyz"));
        assert!(matches!(result, Err(RunError::NotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_output_and_status() {
        let inv = Invocation::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = SystemRunner::new().run(&inv).unwrap();
        assert_eq!(output.code, Some(3));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    struct Capture(Mutex<Vec<(log::Level, String)>>);

    impl log::Log for Capture {
        fn enabled(&self, _metadata: &log::Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &log::Record<'_>) {
            if let Ok(mut records) = self.0.lock() {
                records.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: Capture = Capture(Mutex::new(Vec::new()));

    #[test]
    fn test_argv_logged_before_spawn() {
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Info);

        let inv = Invocation::new("stmdeploy-audit-missing-tool")
            .args(["-c", "port=SWD", "-c", "program fw.bin 0x8000000"]);
        let result = SystemRunner::new().run(&inv);
        assert!(matches!(result, Err(RunError::NotFound(_))));

        let expected =
            "Executing: stmdeploy-audit-missing-tool -c port=SWD -c \"program fw.bin 0x8000000\"";
        let records = CAPTURE.0.lock().unwrap();
        assert!(records
            .iter()
            .any(|(level, msg)| *level == log::Level::Info && msg == expected));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let inv = Invocation::new("sh")
            .args(["-c", "sleep 5"])
            .timeout(Some(Duration::from_millis(200)));
        let start = Instant::now();
        let result = SystemRunner::new().run(&inv);
        assert!(matches!(result, Err(RunError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
