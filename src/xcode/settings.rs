//! Parsing of `xcodebuild -showBuildSettings` output.
//!
//! The tool prints one block per target, headed by a line of the form
//! `Build settings for action build and target "SomeTarget":`, followed by
//! indented `KEY = value` pairs. Blocks are bucketed by target; lookups for
//! absent keys surface [`CartelError::MissingBuildSetting`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;

use crate::constants::{FRAMEWORK_PRODUCT_TYPE, STATIC_MACH_O_TYPE};
use crate::core::{CartelError, Result};

use super::platform::Platform;

static TARGET_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Build settings for action \S+ and target "?([^":]+)"?:$"#)
        .expect("static regex is valid")
});

/// The build settings of one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    /// Target name from the block header.
    pub target: String,
    settings: HashMap<String, String>,
}

impl BuildSettings {
    /// Parse every target block out of `-showBuildSettings` output.
    #[must_use]
    pub fn parse(output: &str) -> Vec<Self> {
        let mut blocks = Vec::new();
        let mut current: Option<Self> = None;

        for line in output.lines() {
            if let Some(captures) = TARGET_HEADER.captures(line.trim_end()) {
                if let Some(block) = current.take() {
                    blocks.push(block);
                }
                current = Some(Self {
                    target: captures[1].to_string(),
                    settings: HashMap::new(),
                });
                continue;
            }
            let Some(block) = current.as_mut() else { continue };
            if let Some((key, value)) = line.split_once(" = ") {
                let key = key.trim();
                if !key.is_empty() && !key.contains(char::is_whitespace) {
                    block.settings.insert(key.to_string(), value.trim().to_string());
                }
            }
        }
        if let Some(block) = current.take() {
            blocks.push(block);
        }
        blocks
    }

    /// Look up a setting, failing with the key name when absent.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.settings
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| CartelError::MissingBuildSetting { key: key.to_string() })
    }

    /// Whether the target produces a dynamically linked framework.
    ///
    /// Static libraries, test bundles, and statically linked frameworks are
    /// skipped by the build orchestrator.
    #[must_use]
    pub fn is_dynamic_framework(&self) -> bool {
        self.settings.get("PRODUCT_TYPE").map(String::as_str) == Some(FRAMEWORK_PRODUCT_TYPE)
            && self.settings.get("MACH_O_TYPE").map(String::as_str)
                != Some(STATIC_MACH_O_TYPE)
    }

    /// The target's default platform, from `PLATFORM_NAME`.
    pub fn platform(&self) -> Result<Platform> {
        Platform::from_platform_name(self.get("PLATFORM_NAME")?)
    }

    /// Directory the built products land in.
    pub fn built_products_dir(&self) -> Result<PathBuf> {
        self.get("BUILT_PRODUCTS_DIR").map(PathBuf::from)
    }

    /// The product bundle name, e.g. `Widget.framework`.
    pub fn wrapper_name(&self) -> Result<&str> {
        self.get("WRAPPER_NAME")
    }

    /// Absolute path of the built product bundle.
    pub fn wrapper_path(&self) -> Result<PathBuf> {
        Ok(self.built_products_dir()?.join(self.wrapper_name()?))
    }

    /// Absolute path of the built executable.
    pub fn executable_path(&self) -> Result<PathBuf> {
        Ok(self.built_products_dir()?.join(self.get("EXECUTABLE_PATH")?))
    }

    /// Path of the executable relative to the product bundle.
    pub fn executable_path_in_wrapper(&self) -> Result<PathBuf> {
        let executable = PathBuf::from(self.get("EXECUTABLE_PATH")?);
        executable
            .strip_prefix(self.wrapper_name()?)
            .map(PathBuf::from)
            .map_err(|_| CartelError::ParseError {
                description: format!(
                    "EXECUTABLE_PATH '{}' is not inside wrapper '{}'",
                    executable.display(),
                    self.settings.get("WRAPPER_NAME").cloned().unwrap_or_default()
                ),
            })
    }

    /// The language-module directory inside the product bundle, relative to
    /// the bundle root, when the target emits one.
    ///
    /// Derived from `CONTENTS_FOLDER_PATH` (which is relative to the build
    /// products directory and starts with the wrapper name) and
    /// `PRODUCT_MODULE_NAME`.
    #[must_use]
    pub fn module_path_in_wrapper(&self) -> Option<PathBuf> {
        let module_name = self.settings.get("PRODUCT_MODULE_NAME")?;
        let contents = PathBuf::from(self.settings.get("CONTENTS_FOLDER_PATH")?);
        let inside_wrapper: PathBuf = contents.components().skip(1).collect();
        Some(
            inside_wrapper
                .join("Modules")
                .join(format!("{module_name}.swiftmodule")),
        )
    }

    /// Absolute path of the module directory in the built products.
    #[must_use]
    pub fn module_path(&self) -> Option<PathBuf> {
        let built = self.built_products_dir().ok()?;
        let wrapper = self.wrapper_name().ok()?;
        Some(built.join(wrapper).join(self.module_path_in_wrapper()?))
    }
}
