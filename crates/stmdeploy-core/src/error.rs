//! Error types for stmdeploy
//!
//! Every failure that crosses a component boundary is one of these variants.
//! Variants that come from a tool that actually ran carry its captured
//! output verbatim so the operator sees exactly what the tool said.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::locate::ToolKind;
use crate::process::RunError;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum Error {
    /// A required external tool could not be located
    #[error("{0} not found")]
    ToolNotFound(ToolKind),

    /// Neither the primary nor the alternate programmer is installed
    #[error("no programmer available (install STM32CubeProgrammer or OpenOCD)")]
    NoProgrammerAvailable,

    /// The build tool itself is missing
    #[error("build tool '{0}' is not installed")]
    BuildToolNotInstalled(String),

    /// The build tool ran and reported failure
    #[error("compilation failed\n{stdout}{stderr}")]
    CompileFailed {
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// Neither a `.project` marker nor a Makefile was found
    #[error("no supported build system found in {} (.project or Makefile)", .0.display())]
    NoBuildSystemDetected(PathBuf),

    /// Project directory does not exist
    #[error("project directory not found: {}", .0.display())]
    ProjectNotFound(PathBuf),

    /// No firmware artifact to flash
    #[error("binary file not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// A device-facing tool exited with a nonzero status
    #[error("{operation} failed\n{stderr}")]
    DeviceCommunicationFailed {
        /// Operation that was attempted (flash, erase, ...)
        operation: &'static str,
        /// Captured standard error
        stderr: String,
    },

    /// An invocation exceeded its wall-clock budget
    #[error("{program} timed out after {seconds} seconds")]
    Timeout {
        /// Program that was killed
        program: String,
        /// Budget that was exceeded
        seconds: u64,
    },

    /// The active backend does not implement this operation
    #[error("{operation} is not supported by {backend}")]
    UnsupportedOperation {
        /// Operation that was requested
        operation: &'static str,
        /// Backend that lacks it
        backend: &'static str,
    },

    /// The program could not be started
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<RunError> for Error {
    fn from(e: RunError) -> Self {
        match e {
            RunError::NotFound(program) => Error::Spawn {
                program,
                source: io::ErrorKind::NotFound.into(),
            },
            RunError::Timeout { program, after } => Error::Timeout {
                program,
                seconds: after.as_secs(),
            },
            RunError::Io { program, source } => Error::Spawn { program, source },
        }
    }
}

/// Result type for stmdeploy operations
pub type Result<T> = std::result::Result<T, Error>;
