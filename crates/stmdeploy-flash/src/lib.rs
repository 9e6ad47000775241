//! Device programming through external tools
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Programmer                   │
//! │  flash / erase / read_memory / device_info   │
//! └──────────────────────────────────────────────┘
//!                       │ one backend, fixed at construction
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//! ┌──────────────────────┐  ┌──────────────────────┐
//! │  cubeprog (primary)  │  │  openocd (alternate) │
//! │  STM32_Programmer_CLI│  │  flash only          │
//! └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! The argument builders in [`cubeprog`] and [`openocd`] are pure functions
//! so the exact command lines can be tested without a device.

pub mod cubeprog;
pub mod openocd;
mod programmer;
mod registry;

pub use programmer::{DeviceInfo, FlashReport, Programmer, ProgrammerSummary, DEVICE_CONNECTED};
pub use registry::{resolve, Backend, ProgrammerTool, RESOLUTION_ORDER};
