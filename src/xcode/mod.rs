//! Build orchestration: project discovery, scheme listing, per-platform
//! builds, and binary merging.
//!
//! The orchestrator never parses native project files. It locates workspace
//! and project bundles on disk, asks `xcodebuild` what schemes and settings
//! they expose, and drives builds from the parsed answers.

pub mod builder;
pub mod platform;
pub mod settings;

pub use builder::{BuildOptions, build_working_directory};
pub use platform::{Platform, Sdk};
pub use settings::BuildSettings;

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::constants::OUTPUT_DIR;
use crate::core::{CartelError, Result};
use crate::shell::ShellCommand;
use crate::utils::platform::XCODEBUILD_COMMAND;

/// A buildable project container on disk.
///
/// Workspaces sort before standalone project files, then shallower paths
/// first, then lexicographically; the first locator found is authoritative
/// for a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectLocator {
    /// An `.xcworkspace` bundle.
    Workspace(PathBuf),
    /// An `.xcodeproj` bundle.
    ProjectFile(PathBuf),
}

impl ProjectLocator {
    /// The bundle path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Workspace(path) | Self::ProjectFile(path) => path,
        }
    }

    /// The `xcodebuild` flag and value selecting this container.
    #[must_use]
    pub fn build_arguments(&self) -> [String; 2] {
        match self {
            Self::Workspace(path) => {
                ["-workspace".to_string(), path.display().to_string()]
            }
            Self::ProjectFile(path) => {
                ["-project".to_string(), path.display().to_string()]
            }
        }
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Workspace(_) => 0,
            Self::ProjectFile(_) => 1,
        }
    }

    /// List the schemes the container exposes.
    pub async fn schemes(&self) -> Result<Vec<String>> {
        let output = ShellCommand::new("list-schemes", XCODEBUILD_COMMAND)
            .args(self.build_arguments())
            .arg("-list")
            .execute()
            .await?;
        let schemes = parse_scheme_listing(&output.stdout);
        if schemes.is_empty() {
            return Err(CartelError::ParseError {
                description: format!(
                    "no schemes listed for {}",
                    self.path().display()
                ),
            });
        }
        Ok(schemes)
    }
}

impl PartialOrd for ProjectLocator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProjectLocator {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind_rank()
            .cmp(&other.kind_rank())
            .then_with(|| {
                self.path().components().count().cmp(&other.path().components().count())
            })
            .then_with(|| self.path().cmp(other.path()))
    }
}

/// Locate every workspace and project bundle under `directory`, in
/// authoritative order.
///
/// Bundles nested inside other bundles (every `.xcodeproj` contains an
/// internal workspace) and anything under the Cartel output tree or hidden
/// directories are skipped.
pub fn locate_projects(directory: &Path) -> Result<Vec<ProjectLocator>> {
    let mut locators = Vec::new();

    let walker = WalkDir::new(directory).into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        if entry.depth() > 0 && name.starts_with('.') {
            return false;
        }
        if name == OUTPUT_DIR && entry.file_type().is_dir() {
            return false;
        }
        // Do not descend into bundles; their contents are not containers of
        // their own.
        let parent_is_bundle = entry
            .path()
            .parent()
            .and_then(Path::extension)
            .is_some_and(|ext| ext == "xcodeproj" || ext == "xcworkspace");
        !parent_is_bundle
    });

    for entry in walker {
        let entry = entry.map_err(|e| CartelError::ReadFailed {
            path: directory.to_path_buf(),
            reason: e.to_string(),
        })?;
        let path = entry.path();
        match path.extension().and_then(|e| e.to_str()) {
            Some("xcworkspace") => locators.push(ProjectLocator::Workspace(path.to_path_buf())),
            Some("xcodeproj") => {
                locators.push(ProjectLocator::ProjectFile(path.to_path_buf()));
            }
            _ => {}
        }
    }

    locators.sort();
    Ok(locators)
}

/// Parse the `Schemes:` block of `xcodebuild -list` output.
///
/// The block starts after the header line and runs until the first blank
/// line; each entry is trimmed.
#[must_use]
pub fn parse_scheme_listing(stdout: &str) -> Vec<String> {
    let mut schemes = Vec::new();
    let mut in_block = false;
    for line in stdout.lines() {
        if in_block {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                break;
            }
            schemes.push(trimmed.to_string());
        } else if line.trim() == "Schemes:" {
            in_block = true;
        }
    }
    schemes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_listing_parses_the_delimited_block() {
        let output = r#"Information about project "Widget":
    Targets:
        Widget
        WidgetTests

    Build Configurations:
        Debug
        Release

    Schemes:
        Widget
        Widget-Extension

"#;
        assert_eq!(parse_scheme_listing(output), vec!["Widget", "Widget-Extension"]);
    }

    #[test]
    fn scheme_listing_without_header_is_empty() {
        assert!(parse_scheme_listing("no schemes here\n").is_empty());
    }

    #[test]
    fn workspaces_sort_before_projects_then_by_depth() {
        let mut locators = vec![
            ProjectLocator::ProjectFile(PathBuf::from("a/Widget.xcodeproj")),
            ProjectLocator::Workspace(PathBuf::from("deep/nested/Widget.xcworkspace")),
            ProjectLocator::Workspace(PathBuf::from("Widget.xcworkspace")),
            ProjectLocator::ProjectFile(PathBuf::from("Alpha.xcodeproj")),
        ];
        locators.sort();
        assert_eq!(
            locators,
            vec![
                ProjectLocator::Workspace(PathBuf::from("Widget.xcworkspace")),
                ProjectLocator::Workspace(PathBuf::from("deep/nested/Widget.xcworkspace")),
                ProjectLocator::ProjectFile(PathBuf::from("Alpha.xcodeproj")),
                ProjectLocator::ProjectFile(PathBuf::from("a/Widget.xcodeproj")),
            ]
        );
    }

    #[test]
    fn discovery_skips_nested_bundles_and_output_tree() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("Widget.xcodeproj/project.xcworkspace")).unwrap();
        std::fs::create_dir_all(root.join("App.xcworkspace")).unwrap();
        std::fs::create_dir_all(root.join("Cartel/Checkouts/Dep/Dep.xcodeproj")).unwrap();
        std::fs::create_dir_all(root.join(".hidden/Secret.xcodeproj")).unwrap();

        let found = locate_projects(root).unwrap();
        assert_eq!(
            found,
            vec![
                ProjectLocator::Workspace(root.join("App.xcworkspace")),
                ProjectLocator::ProjectFile(root.join("Widget.xcodeproj")),
            ]
        );
    }
}
