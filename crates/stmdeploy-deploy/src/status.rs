use std::fmt;

use stmdeploy_build::BuildInfo;
use stmdeploy_flash::{DeviceInfo, ProgrammerSummary};

/// Whether a device answered the query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    /// The programmer reached the device
    Connected(DeviceInfo),
    /// No answer, or no programmer able to ask
    NotConnected,
}

impl From<Option<DeviceInfo>> for DeviceState {
    fn from(info: Option<DeviceInfo>) -> Self {
        info.map_or(DeviceState::NotConnected, DeviceState::Connected)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceState::Connected(info) => f.write_str(info.status),
            DeviceState::NotConnected => f.write_str("not connected"),
        }
    }
}

/// Aggregate status of a project and its target
#[derive(Debug, Clone)]
pub struct DeploymentStatus {
    /// Build state of the project
    pub build: BuildInfo,
    /// Device state
    pub device: DeviceState,
    /// Programmer identity
    pub programmer: ProgrammerSummary,
}
