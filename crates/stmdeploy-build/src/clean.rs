//! Removal of build artifacts

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use stmdeploy_core::{Error, Result};

use crate::artifact::{extension_pattern, BINARY_EXTENSIONS};

/// Intermediate file extensions removed anywhere under the build directory
pub const INTERMEDIATE_EXTENSIONS: [&str; 5] = ["o", "d", "su", "map", "list"];

/// Outcome of a clean
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Files that were deleted
    pub removed: Vec<PathBuf>,
    /// Files that could not be deleted
    pub failed: Vec<(PathBuf, io::Error)>,
}

impl CleanReport {
    /// True if every matching file was removed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Clean `build_dir`
///
/// Intermediates are removed recursively, output images only directly in
/// `build_dir`. A missing directory is not an error, so cleaning twice is
/// fine. A directory that cannot be listed aborts the clean.
pub fn clean_dir(build_dir: &Path) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    if !build_dir.is_dir() {
        log::debug!("Nothing to clean in {}", build_dir.display());
        return Ok(report);
    }

    let escaped = glob::Pattern::escape(&build_dir.display().to_string());
    let intermediates = INTERMEDIATE_EXTENSIONS
        .iter()
        .map(|ext| format!("{}/**/*.{}", escaped, ext));
    let outputs = BINARY_EXTENSIONS
        .iter()
        .map(|ext| extension_pattern(build_dir, ext));

    for pattern in intermediates.chain(outputs) {
        let entries = glob::glob(&pattern)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidInput, e)))?;
        for entry in entries {
            let path = entry.map_err(|e| Error::Io(io::Error::from(e)))?;
            if !path.is_file() {
                continue;
            }
            remove(path, &mut report);
        }
    }

    Ok(report)
}

fn remove(path: PathBuf, report: &mut CleanReport) {
    match fs::remove_file(&path) {
        Ok(()) => {
            log::info!(
                "  Removed: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            report.removed.push(path);
        }
        Err(e) => {
            log::warn!("  Could not remove {}: {}", path.display(), e);
            report.failed.push((path, e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let build = dir.path().join("Debug");
        fs::create_dir_all(build.join("Core/Src")).unwrap();
        for name in ["proj.bin", "proj.elf", "proj.hex", "proj.map", "proj.list"] {
            fs::write(build.join(name), b"x").unwrap();
        }
        for name in ["main.o", "main.d", "main.su"] {
            fs::write(build.join("Core/Src").join(name), b"x").unwrap();
        }
        fs::write(build.join("Makefile"), b"all:\n").unwrap();
        fs::write(build.join("Core/Src/main.c"), b"int main(void){}").unwrap();

        let report = clean_dir(&build).unwrap();
        assert!(report.is_complete());
        assert_eq!(report.removed.len(), 8);
        assert!(build.join("Makefile").exists());
        assert!(build.join("Core/Src/main.c").exists());
        assert!(!build.join("Core/Src/main.o").exists());
        assert!(!build.join("proj.bin").exists());
    }

    #[test]
    fn test_nested_outputs_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("bootloader")).unwrap();
        fs::write(dir.path().join("bootloader/boot.bin"), b"x").unwrap();

        clean_dir(dir.path()).unwrap();
        assert!(dir.path().join("bootloader/boot.bin").exists());
    }

    #[test]
    fn test_clean_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fw.bin"), b"x").unwrap();

        assert_eq!(clean_dir(dir.path()).unwrap().removed.len(), 1);
        assert!(clean_dir(dir.path()).unwrap().removed.is_empty());
        assert!(clean_dir(&dir.path().join("missing")).unwrap().removed.is_empty());
    }
}
