//! Per-scheme builds, universal-binary merging, and artifact placement.
//!
//! Projects build serially in resolver order, and schemes within a project
//! build serially too: inter-target dependencies inside a project are
//! implicit, so no parallelism is attempted across them. Before a dependency
//! builds, its local build folder is symlinked to the root project's shared
//! folder so transitive dependencies link against one another and new
//! artifacts land directly in the root tree.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::constants::{BUILD_SUBDIR, DEFAULT_CONFIGURATION, OUTPUT_DIR};
use crate::core::{CartelError, Result};
use crate::shell::ShellCommand;
use crate::utils::fs::{copy_dir_recursive, ensure_dir, remove_if_exists, replace_symlink};
use crate::utils::platform::{XCODEBUILD_COMMAND, XCRUN_COMMAND};

use super::platform::{Platform, Sdk};
use super::settings::BuildSettings;
use super::{ProjectLocator, locate_projects};

/// Options controlling what gets built and how.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build configuration, `Release` by default.
    pub configuration: String,
    /// Platforms to build; `None` builds every platform a scheme supports.
    pub platforms: Option<Vec<Platform>>,
    /// Scheme names to build; `None` builds every buildable scheme.
    pub schemes: Option<Vec<String>>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            configuration: DEFAULT_CONFIGURATION.to_string(),
            platforms: None,
            schemes: None,
        }
    }
}

/// The root project's shared build products folder.
#[must_use]
pub fn build_products_dir(root_dir: &Path) -> PathBuf {
    root_dir.join(OUTPUT_DIR).join(BUILD_SUBDIR)
}

/// Link `working_dir`'s local build folder to the root project's shared one.
///
/// Creates the shared folder first; an existing folder or link at the
/// dependency side is removed. Write failures are fatal since a missing
/// link would break transitive linking silently.
pub fn surface_dependencies(root_dir: &Path, working_dir: &Path) -> Result<()> {
    let shared = build_products_dir(root_dir);
    ensure_dir(&shared)?;
    if working_dir == root_dir {
        return Ok(());
    }
    let local = build_products_dir(working_dir);
    replace_symlink(&shared, &local)
}

/// Build every applicable scheme of the project in `working_dir`, placing
/// products under the root project's shared build folder.
///
/// `log` receives the build tool's stdout lines as they arrive.
pub async fn build_working_directory(
    root_dir: &Path,
    working_dir: &Path,
    options: &BuildOptions,
    log: &mut dyn FnMut(&str),
) -> Result<()> {
    if !crate::utils::platform::command_available(XCODEBUILD_COMMAND) {
        return Err(CartelError::InvalidArgument {
            description: "xcodebuild is not installed or not found in PATH".to_string(),
        });
    }
    surface_dependencies(root_dir, working_dir)?;

    let locators = locate_projects(working_dir)?;
    let Some(locator) = locators.into_iter().next() else {
        return Err(CartelError::InvalidArgument {
            description: format!(
                "no Xcode workspace or project found under {}",
                working_dir.display()
            ),
        });
    };
    tracing::debug!(target: "build", "building {}", locator.path().display());

    let mut schemes = locator.schemes().await?;
    if let Some(wanted) = &options.schemes {
        schemes.retain(|scheme| wanted.iter().any(|w| w == scheme));
    }

    for scheme in schemes {
        build_scheme(root_dir, working_dir, &locator, &scheme, options, log).await?;
    }
    Ok(())
}

/// Build one scheme for every applicable platform SDK and merge the results.
async fn build_scheme(
    root_dir: &Path,
    working_dir: &Path,
    locator: &ProjectLocator,
    scheme: &str,
    options: &BuildOptions,
    log: &mut dyn FnMut(&str),
) -> Result<()> {
    let settings =
        show_build_settings(locator, scheme, &options.configuration, None, working_dir).await?;
    let frameworks: Vec<&BuildSettings> =
        settings.iter().filter(|s| s.is_dynamic_framework()).collect();
    let Some(first) = frameworks.first() else {
        tracing::debug!(target: "build", "skipping scheme '{scheme}': no dynamic framework");
        return Ok(());
    };

    let platform = first.platform()?;
    if let Some(wanted) = &options.platforms {
        if !wanted.contains(&platform) {
            tracing::debug!(target: "build", "skipping scheme '{scheme}': {platform} filtered out");
            return Ok(());
        }
    }

    tracing::info!(target: "build", "building scheme '{scheme}' for {platform}");
    let mut per_sdk: Vec<HashMap<String, BuildSettings>> = Vec::new();
    for &sdk in platform.sdks() {
        run_build(locator, scheme, &options.configuration, sdk, working_dir, log).await?;
        let reloaded =
            show_build_settings(locator, scheme, &options.configuration, Some(sdk), working_dir)
                .await?;
        per_sdk.push(
            reloaded
                .into_iter()
                .filter(BuildSettings::is_dynamic_framework)
                .map(|s| (s.target.clone(), s))
                .collect(),
        );
    }

    let output_dir = build_products_dir(root_dir).join(platform.folder_name());
    ensure_dir(&output_dir)?;

    match per_sdk.as_slice() {
        [single] => {
            for settings in single.values() {
                copy_wrapper(settings, &output_dir)?;
            }
        }
        [device, simulator] => {
            for target in targets_in_both(device, simulator) {
                merge_universal(&output_dir, &device[&target], &simulator[&target]).await?;
            }
        }
        _ => unreachable!("platforms build one or two SDKs"),
    }
    Ok(())
}

/// Targets present in both the device and simulator builds, in stable order.
fn targets_in_both(
    device: &HashMap<String, BuildSettings>,
    simulator: &HashMap<String, BuildSettings>,
) -> Vec<String> {
    let mut targets: Vec<String> =
        device.keys().filter(|t| simulator.contains_key(*t)).cloned().collect();
    targets.sort();
    targets
}

/// Copy a built product bundle into the output tree, replacing any
/// existing copy. Returns the copied bundle's path.
fn copy_wrapper(settings: &BuildSettings, output_dir: &Path) -> Result<PathBuf> {
    let source = settings.wrapper_path()?;
    let destination = output_dir.join(settings.wrapper_name()?);
    remove_if_exists(&destination)?;
    copy_dir_recursive(&source, &destination)?;
    Ok(destination)
}

/// Produce a universal framework from a device and a simulator build.
///
/// The device bundle is copied into the output tree, the two executables
/// are merged into a fat binary at the copied executable path, and
/// simulator module files are added alongside the device ones.
async fn merge_universal(
    output_dir: &Path,
    device: &BuildSettings,
    simulator: &BuildSettings,
) -> Result<()> {
    let destination = copy_wrapper(device, output_dir)?;

    let merged_executable = destination.join(device.executable_path_in_wrapper()?);
    ShellCommand::new("merge-binaries", XCRUN_COMMAND)
        .args([
            "lipo".to_string(),
            "-create".to_string(),
            device.executable_path()?.display().to_string(),
            simulator.executable_path()?.display().to_string(),
            "-output".to_string(),
            merged_executable.display().to_string(),
        ])
        .execute()
        .await?;

    if let (Some(simulator_modules), Some(relative)) =
        (simulator.module_path(), device.module_path_in_wrapper())
    {
        if simulator_modules.is_dir() {
            merge_module_directory(&simulator_modules, &destination.join(relative))?;
        }
    }
    Ok(())
}

/// Copy every file from `source` into `destination`, keeping files that are
/// already present: the device build's files win, simulator-specific files
/// are added alongside.
fn merge_module_directory(source: &Path, destination: &Path) -> Result<()> {
    ensure_dir(destination)?;
    let entries = std::fs::read_dir(source).map_err(|e| CartelError::read(source, &e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CartelError::read(source, &e))?;
        let target = destination.join(entry.file_name());
        if target.exists() {
            continue;
        }
        if entry.path().is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)
                .map_err(|e| CartelError::write(&target, &e))?;
        }
    }
    Ok(())
}

async fn show_build_settings(
    locator: &ProjectLocator,
    scheme: &str,
    configuration: &str,
    sdk: Option<Sdk>,
    working_dir: &Path,
) -> Result<Vec<BuildSettings>> {
    let mut command = ShellCommand::new("show-settings", XCODEBUILD_COMMAND)
        .args(locator.build_arguments())
        .args(["-scheme", scheme, "-configuration", configuration])
        .current_dir(working_dir);
    if let Some(sdk) = sdk {
        command = command.args(["-sdk", sdk.name()]);
    }
    let output = command.arg("-showBuildSettings").execute().await?;
    Ok(BuildSettings::parse(&output.stdout))
}

async fn run_build(
    locator: &ProjectLocator,
    scheme: &str,
    configuration: &str,
    sdk: Sdk,
    working_dir: &Path,
    log: &mut dyn FnMut(&str),
) -> Result<()> {
    ShellCommand::new("build-scheme", XCODEBUILD_COMMAND)
        .args(locator.build_arguments())
        .args(["-scheme", scheme, "-configuration", configuration, "-sdk", sdk.name()])
        .args([
            "ONLY_ACTIVE_ARCH=NO",
            "CODE_SIGNING_REQUIRED=NO",
            "CODE_SIGN_IDENTITY=",
            "build",
        ])
        .current_dir(working_dir)
        .stream_stdout(log)
        .await
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(built_products: &Path, wrapper: &str, module: &str) -> BuildSettings {
        let output = format!(
            "Build settings for action build and target \"{module}\":\n    \
             BUILT_PRODUCTS_DIR = {}\n    \
             CONTENTS_FOLDER_PATH = {wrapper}\n    \
             EXECUTABLE_PATH = {wrapper}/{module}\n    \
             PRODUCT_MODULE_NAME = {module}\n    \
             PRODUCT_TYPE = com.apple.product-type.framework\n    \
             WRAPPER_NAME = {wrapper}\n",
            built_products.display()
        );
        BuildSettings::parse(&output).into_iter().next().unwrap()
    }

    fn write_bundle(products: &Path, wrapper: &str, module: &str, arch: &str) {
        let bundle = products.join(wrapper);
        let modules = bundle.join("Modules").join(format!("{module}.swiftmodule"));
        std::fs::create_dir_all(&modules).unwrap();
        std::fs::write(bundle.join(module), format!("binary-{arch}")).unwrap();
        std::fs::write(modules.join(format!("{arch}.swiftmodule")), arch).unwrap();
    }

    #[test]
    fn copy_wrapper_replaces_an_existing_bundle() {
        let temp = tempfile::tempdir().unwrap();
        let products = temp.path().join("products");
        write_bundle(&products, "Widget.framework", "Widget", "arm64");
        let settings = settings_for(&products, "Widget.framework", "Widget");

        let output = temp.path().join("out");
        ensure_dir(&output).unwrap();
        std::fs::create_dir_all(output.join("Widget.framework").join("stale")).unwrap();

        let copied = copy_wrapper(&settings, &output).unwrap();
        assert_eq!(copied, output.join("Widget.framework"));
        assert!(copied.join("Widget").is_file());
        assert!(!copied.join("stale").exists(), "old copy is replaced");
    }

    #[test]
    fn module_merge_keeps_device_files_and_adds_simulator_ones() {
        let temp = tempfile::tempdir().unwrap();
        let device = temp.path().join("device-mod");
        let simulator = temp.path().join("sim-mod");
        std::fs::create_dir_all(&device).unwrap();
        std::fs::create_dir_all(&simulator).unwrap();
        std::fs::write(device.join("arm64.swiftmodule"), "device").unwrap();
        std::fs::write(simulator.join("arm64.swiftmodule"), "simulator").unwrap();
        std::fs::write(simulator.join("x86_64.swiftmodule"), "simulator").unwrap();

        merge_module_directory(&simulator, &device).unwrap();

        assert_eq!(
            std::fs::read_to_string(device.join("arm64.swiftmodule")).unwrap(),
            "device",
            "device files remain"
        );
        assert_eq!(
            std::fs::read_to_string(device.join("x86_64.swiftmodule")).unwrap(),
            "simulator",
            "simulator-only files are added"
        );
    }

    #[test]
    fn target_intersection_is_sorted() {
        let temp = tempfile::tempdir().unwrap();
        let products = temp.path().join("products");
        let make = |name: &str| {
            (name.to_string(), settings_for(&products, &format!("{name}.framework"), name))
        };
        let device: HashMap<_, _> = [make("Zeta"), make("Alpha"), make("DeviceOnly")].into();
        let simulator: HashMap<_, _> = [make("Zeta"), make("Alpha"), make("SimOnly")].into();
        assert_eq!(targets_in_both(&device, &simulator), vec!["Alpha", "Zeta"]);
    }

    #[cfg(unix)]
    #[test]
    fn surfacing_links_the_dependency_build_folder_to_the_root() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        let checkout = root.join(OUTPUT_DIR).join("Checkouts").join("Dep");
        std::fs::create_dir_all(&checkout).unwrap();

        surface_dependencies(&root, &checkout).unwrap();

        let shared = build_products_dir(&root);
        assert!(shared.is_dir());
        let local = build_products_dir(&checkout);
        assert!(std::fs::symlink_metadata(&local).unwrap().file_type().is_symlink());
        // Files placed through the link land in the shared tree.
        std::fs::write(local.join("marker"), "built").unwrap();
        assert!(shared.join("marker").is_file());
    }

    #[test]
    fn surfacing_the_root_itself_only_creates_the_folder() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("root");
        std::fs::create_dir_all(&root).unwrap();
        surface_dependencies(&root, &root).unwrap();
        assert!(build_products_dir(&root).is_dir());
        assert!(!std::fs::symlink_metadata(build_products_dir(&root))
            .unwrap()
            .file_type()
            .is_symlink());
    }
}
