//! Global constants used throughout the Cartel codebase.
//!
//! Filenames, directory layout, environment variables, and build defaults are
//! defined centrally so the CLI, coordinator, and build orchestrator agree on
//! the on-disk surface.

/// The human-authored manifest listing direct dependencies.
pub const MANIFEST_FILENAME: &str = "Cartelfile";

/// Companion manifest for dependencies that should not be shared.
pub const PRIVATE_MANIFEST_FILENAME: &str = "Cartelfile.private";

/// The machine-written lockfile recording pinned revisions in build order.
pub const LOCKFILE_FILENAME: &str = "Cartelfile.resolved";

/// Directory under the root project that holds all Cartel state.
pub const OUTPUT_DIR: &str = "Cartel";

/// Subdirectory of [`OUTPUT_DIR`] holding built frameworks, one folder per platform.
pub const BUILD_SUBDIR: &str = "Build";

/// Subdirectory of [`OUTPUT_DIR`] holding per-project working checkouts.
pub const CHECKOUTS_SUBDIR: &str = "Checkouts";

/// Environment variable overriding the repository cache location.
pub const CACHE_DIR_ENV: &str = "CARTEL_CACHE_DIR";

/// Build configuration used when none is given on the command line.
pub const DEFAULT_CONFIGURATION: &str = "Release";

/// Product type emitted by xcodebuild for dynamic frameworks.
pub const FRAMEWORK_PRODUCT_TYPE: &str = "com.apple.product-type.framework";

/// Mach-O type that marks a framework target as statically linked.
pub const STATIC_MACH_O_TYPE: &str = "staticlib";
