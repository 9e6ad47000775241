use std::fmt;

use stmdeploy_core::Error;
use thiserror::Error;

/// Pipeline state
///
/// ```text
/// Idle -> Building -> Locating -> Flashing -> Done
///            |            |           |
///       BuildFailed  BinaryMissing  FlashFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployState {
    /// Nothing has run yet
    #[default]
    Idle,
    /// Build step in progress
    Building,
    /// Looking for the firmware image
    Locating,
    /// Programming the device
    Flashing,
    /// Image written
    Done,
    /// The build step failed
    BuildFailed,
    /// No firmware image was found
    BinaryMissing,
    /// The programmer failed
    FlashFailed,
}

impl DeployState {
    /// True for `Done` and the failure states
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeployState::Done
                | DeployState::BuildFailed
                | DeployState::BinaryMissing
                | DeployState::FlashFailed
        )
    }

    /// True for the failure states
    pub fn is_failure(self) -> bool {
        self.is_terminal() && self != DeployState::Done
    }

    /// Failure state a step running in `self` ends in
    pub(crate) fn failed(self) -> DeployState {
        match self {
            DeployState::Locating => DeployState::BinaryMissing,
            DeployState::Flashing => DeployState::FlashFailed,
            _ => DeployState::BuildFailed,
        }
    }
}

impl fmt::Display for DeployState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeployState::Idle => "idle",
            DeployState::Building => "building",
            DeployState::Locating => "locating binary",
            DeployState::Flashing => "flashing",
            DeployState::Done => "done",
            DeployState::BuildFailed => "build failed",
            DeployState::BinaryMissing => "binary missing",
            DeployState::FlashFailed => "flash failed",
        };
        f.write_str(name)
    }
}

/// A deployment that stopped in a failure state
#[derive(Debug, Error)]
#[error("deployment stopped ({state})")]
pub struct DeployError {
    /// Failure state the pipeline ended in
    pub state: DeployState,
    /// What went wrong
    #[source]
    pub source: Error,
}
