//! Firmware artifact resolution

use std::path::{Path, PathBuf};

use stmdeploy_core::locate::first_match;

/// Artifact extensions, most preferred first
pub const BINARY_EXTENSIONS: [&str; 3] = ["bin", "hex", "elf"];

/// Find the firmware image in `dir`
///
/// For each extension in [`BINARY_EXTENSIONS`] order, `<project_name>.<ext>`
/// is tried before any other file with that extension. Among several other
/// files the alphabetically first wins.
pub fn find_binary(dir: &Path, project_name: &str) -> Option<PathBuf> {
    for ext in BINARY_EXTENSIONS {
        let exact = dir.join(format!("{}.{}", project_name, ext));
        if exact.is_file() {
            return Some(exact);
        }

        if let Some(path) = first_match(&extension_pattern(dir, ext)) {
            return Some(path);
        }
    }
    None
}

/// Glob pattern for files directly in `dir` ending in `.ext`
pub(crate) fn extension_pattern(dir: &Path, ext: &str) -> String {
    format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.display().to_string()),
        ext
    )
}

/// Details of a located firmware image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryInfo {
    /// Image path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Extension including the dot (`.bin`)
    pub extension: String,
}

impl BinaryInfo {
    /// Stat `path`; `None` if it vanished in the meantime
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let size = path.metadata().ok()?.len();
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Some(Self {
            path,
            size,
            extension,
        })
    }
}

/// Read-only snapshot of a project's build state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    /// Project name
    pub project_name: String,
    /// Project root
    pub project_root: PathBuf,
    /// Canonical build directory
    pub build_dir: PathBuf,
    /// Located firmware image, if any
    pub binary: Option<BinaryInfo>,
}

impl BuildInfo {
    /// True if a firmware image was found
    pub fn binary_found(&self) -> bool {
        self.binary.is_some()
    }
}
