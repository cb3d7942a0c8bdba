//! Platform-specific command names and checks.

use crate::core::{CartelError, Result};

/// The git executable name for the current platform.
#[must_use]
pub const fn git_command() -> &'static str {
    if cfg!(windows) { "git.exe" } else { "git" }
}

/// The Xcode build tool executable.
pub const XCODEBUILD_COMMAND: &str = "xcodebuild";

/// The Xcode tool-runner used for `lipo`.
pub const XCRUN_COMMAND: &str = "xcrun";

/// Verify that git is installed and reachable on `PATH`.
pub fn ensure_git_available() -> Result<()> {
    which::which(git_command()).map(|_| ()).map_err(|_| CartelError::InvalidArgument {
        description: "git is not installed or not found in PATH".to_string(),
    })
}

/// Whether a command is reachable on `PATH`.
#[must_use]
pub fn command_available(command: &str) -> bool {
    which::which(command).is_ok()
}
