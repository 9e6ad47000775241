//! stmdeploy-core - Shared plumbing for the stmdeploy tool-chain orchestrator
//!
//! Nothing in this workspace talks to hardware directly. Every build and
//! device operation is delegated to an external executable, so this crate
//! provides the pieces the higher layers share:
//!
//! - [`config::ProgrammingConfig`] - how to reach and address a device
//! - [`process`] - structured argument vectors and the [`process::CommandRunner`]
//!   seam that spawns them
//! - [`locate`] - discovery of installed tools from data-driven candidate lists
//! - `dummy` (feature `dummy`) - a recording runner for tests that must not
//!   spawn processes
//! - [`error::Error`] - the error taxonomy surfaced to callers

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
#[cfg(any(test, feature = "dummy"))]
pub mod dummy;
pub mod error;
pub mod locate;
pub mod process;

pub use config::ProgrammingConfig;
pub use error::{Error, Result};
pub use locate::{ToolHandle, ToolKind, ToolLocator, ToolSource};
pub use process::{CommandRunner, Invocation, RunError, SystemRunner, ToolOutput};

/// Format an address or size the way the external tools expect it
///
/// Lower-case hexadecimal with a `0x` prefix and no zero padding, so
/// `0x0800_0000` becomes `0x8000000`.
pub fn hex(value: u32) -> String {
    format!("{:#x}", value)
}
