//! Project layout and build-system detection

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use stmdeploy_core::process::absolute;
use stmdeploy_core::{Error, Result};

/// Marker file of an Eclipse/STM32CubeIDE project
pub const PROJECT_MARKER: &str = ".project";

/// Makefile name looked for in the root and build directory
pub const MAKEFILE: &str = "Makefile";

/// Build directory used when no configuration-specific one exists
pub const CANONICAL_BUILD_DIR: &str = "Debug";

/// Build configuration
///
/// The names double as output directory names, so `Display` yields exactly
/// `Debug` or `Release`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildConfig {
    /// Debug configuration
    #[default]
    Debug,
    /// Release configuration
    Release,
}

impl BuildConfig {
    /// Canonical name
    pub fn as_str(self) -> &'static str {
        match self {
            BuildConfig::Debug => "Debug",
            BuildConfig::Release => "Release",
        }
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildConfig {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("debug") {
            Ok(BuildConfig::Debug)
        } else if s.eq_ignore_ascii_case("release") {
            Ok(BuildConfig::Release)
        } else {
            Err(format!(
                "Invalid build configuration '{}' (expected Debug or Release)",
                s
            ))
        }
    }
}

/// Detected build system
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildSystem {
    /// STM32CubeIDE project built in headless mode
    IdeHeadless,
    /// Plain Makefile project
    Make,
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildSystem::IdeHeadless => f.write_str("STM32CubeIDE (headless)"),
            BuildSystem::Make => f.write_str("Make"),
        }
    }
}

/// Where a project lives and where its outputs go
///
/// Names and directories are fixed when the descriptor is created. Build
/// system detection looks at the disk on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    project_name: String,
    project_root: PathBuf,
    build_dir: PathBuf,
}

impl BuildDescriptor {
    /// Describe the project rooted at `project_root`
    ///
    /// The root is canonicalized, so `.` or `sub/..` resolve to a real
    /// directory name.
    pub fn new(project_root: &Path) -> Result<Self> {
        let project_root = match dunce::canonicalize(project_root) {
            Ok(root) if root.is_dir() => root,
            _ => return Err(Error::ProjectNotFound(absolute(project_root))),
        };

        let project_name = match project_root.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(Error::ProjectNotFound(project_root)),
        };
        let build_dir = project_root.join(CANONICAL_BUILD_DIR);

        Ok(Self {
            project_name,
            project_root,
            build_dir,
        })
    }

    /// Project name (root directory basename)
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Canonical build directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Detect the build system: `.project` first, then a Makefile
    pub fn detect(&self) -> Option<BuildSystem> {
        if self.project_root.join(PROJECT_MARKER).exists() {
            Some(BuildSystem::IdeHeadless)
        } else if self.makefile_dir().is_some() {
            Some(BuildSystem::Make)
        } else {
            None
        }
    }

    /// Directory holding the Makefile, build directory preferred
    pub fn makefile_dir(&self) -> Option<&Path> {
        [self.build_dir.as_path(), self.project_root.as_path()]
            .into_iter()
            .find(|dir| dir.join(MAKEFILE).is_file())
    }

    /// Output directory for `config`, falling back to the build directory
    pub fn output_dir(&self, config: BuildConfig) -> PathBuf {
        let dir = self.project_root.join(config.as_str());
        if dir.is_dir() {
            dir
        } else {
            self.build_dir.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_build_config_parse() {
        assert_eq!("Debug".parse::<BuildConfig>().unwrap(), BuildConfig::Debug);
        assert_eq!("release".parse::<BuildConfig>().unwrap(), BuildConfig::Release);
        assert!("MinSizeRel".parse::<BuildConfig>().is_err());
        assert_eq!(BuildConfig::Release.to_string(), "Release");
        assert_eq!(BuildConfig::default(), BuildConfig::Debug);
    }

    #[test]
    fn test_missing_project() {
        let dir = tempfile::tempdir().unwrap();
        let result = BuildDescriptor::new(&dir.path().join("gone"));
        assert!(matches!(result, Err(Error::ProjectNotFound(_))));
    }

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let base = dunce::canonicalize(dir.path()).unwrap();
        (dir, base)
    }

    #[test]
    fn test_parent_reference_resolves_name() {
        let (_dir, base) = scratch();
        let root = base.join("blinky");
        fs::create_dir_all(root.join("sub")).unwrap();

        let desc = BuildDescriptor::new(&root.join("sub").join("..")).unwrap();
        assert_eq!(desc.project_name(), "blinky");
        assert_eq!(desc.project_root(), root);
        assert_eq!(desc.build_dir(), root.join("Debug"));
    }

    #[test]
    fn test_file_is_not_a_project() {
        let (_dir, base) = scratch();
        fs::write(base.join("Makefile"), "all:\n").unwrap();
        assert!(matches!(
            BuildDescriptor::new(&base.join("Makefile")),
            Err(Error::ProjectNotFound(_))
        ));
    }

    #[test]
    fn test_name_and_dirs() {
        let (_dir, base) = scratch();
        let root = base.join("gateway");
        fs::create_dir(&root).unwrap();

        let desc = BuildDescriptor::new(&root).unwrap();
        assert_eq!(desc.project_name(), "gateway");
        assert_eq!(desc.build_dir(), root.join("Debug"));
        assert_eq!(desc.output_dir(BuildConfig::Release), root.join("Debug"));

        fs::create_dir(root.join("Release")).unwrap();
        assert_eq!(desc.output_dir(BuildConfig::Release), root.join("Release"));
    }

    #[test]
    fn test_detection_order() {
        let (dir, base) = scratch();
        let desc = BuildDescriptor::new(dir.path()).unwrap();
        assert_eq!(desc.detect(), None);

        fs::create_dir(dir.path().join("Debug")).unwrap();
        fs::write(dir.path().join("Debug/Makefile"), "all:\n").unwrap();
        assert_eq!(desc.detect(), Some(BuildSystem::Make));
        assert_eq!(desc.makefile_dir(), Some(base.join("Debug").as_path()));

        fs::write(dir.path().join(".project"), "<projectDescription/>").unwrap();
        assert_eq!(desc.detect(), Some(BuildSystem::IdeHeadless));
    }

    #[test]
    fn test_root_makefile_used_when_build_dir_has_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("Debug")).unwrap();
        fs::write(dir.path().join("Makefile"), "all:\n").unwrap();

        let desc = BuildDescriptor::new(dir.path()).unwrap();
        assert_eq!(desc.makefile_dir(), Some(desc.project_root()));
    }
}
