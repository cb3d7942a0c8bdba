//! Shared plumbing for CLI commands.

use std::path::PathBuf;

use colored::Colorize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::config;
use crate::coordinator::ProjectCoordinator;
use crate::core::{CartelError, Result};
use crate::project::ProjectEvent;
use crate::xcode::{BuildOptions, Platform};

/// Resolved directories and output settings shared by every command.
pub struct CommandContext {
    root_dir: PathBuf,
    cache_dir: PathBuf,
    /// Suppress progress output.
    pub quiet: bool,
}

impl CommandContext {
    /// Resolve the project and cache directories from CLI flags.
    pub fn new(
        project_dir: Option<PathBuf>,
        cache_dir: Option<PathBuf>,
        quiet: bool,
    ) -> Result<Self> {
        let root_dir = match project_dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| CartelError::ReadFailed {
                path: PathBuf::from("."),
                reason: e.to_string(),
            })?,
        };
        Ok(Self {
            cache_dir: config::cache_dir(cache_dir.as_ref())?,
            root_dir,
            quiet,
        })
    }

    /// Build a coordinator for this invocation.
    #[must_use]
    pub fn coordinator(&self, use_submodules: bool) -> ProjectCoordinator {
        ProjectCoordinator::new(self.root_dir.clone(), self.cache_dir.clone(), use_submodules)
    }

    /// Print progress events until the coordinator is dropped.
    ///
    /// Events are informational; a lagging or detached printer never blocks
    /// the pipeline.
    pub fn spawn_event_printer(
        &self,
        coordinator: &ProjectCoordinator,
    ) -> JoinHandle<()> {
        let mut events = coordinator.subscribe();
        let quiet = self.quiet;
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) if !quiet => print_event(&event),
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    /// A sink for streamed build-tool output lines.
    pub fn build_log(&self) -> impl FnMut(&str) {
        |line: &str| tracing::debug!(target: "xcodebuild", "{line}")
    }
}

fn print_event(event: &ProjectEvent) {
    let line = match event {
        ProjectEvent::Cloning(project) => format!("Cloning {project}"),
        ProjectEvent::Fetching(project) => format!("Fetching {project}"),
        ProjectEvent::CheckingOut(project, revision) => {
            format!("Checking out {project} at \"{revision}\"")
        }
    };
    eprintln!("{} {line}", "***".bold());
}

/// Parse repeated `--platform` flags into build options.
pub fn build_options(
    configuration: String,
    platforms: &[String],
    schemes: Vec<String>,
) -> Result<BuildOptions> {
    let platforms = if platforms.is_empty() {
        None
    } else {
        Some(
            platforms
                .iter()
                .map(|flag| Platform::from_flag(flag))
                .collect::<Result<Vec<_>>>()?,
        )
    };
    Ok(BuildOptions {
        configuration,
        platforms,
        schemes: if schemes.is_empty() { None } else { Some(schemes) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_parse_platform_flags() {
        let options =
            build_options("Release".into(), &["iOS".into(), "Mac".into()], vec![]).unwrap();
        assert_eq!(options.platforms, Some(vec![Platform::Ios, Platform::MacOS]));
        assert!(options.schemes.is_none());
        assert!(build_options("Release".into(), &["beos".into()], vec![]).is_err());
    }

    #[test]
    fn explicit_dirs_are_used_verbatim() {
        let context = CommandContext::new(
            Some(PathBuf::from("/tmp/app")),
            Some(PathBuf::from("/tmp/cache")),
            false,
        )
        .unwrap();
        let coordinator = context.coordinator(false);
        assert_eq!(coordinator.root_dir(), PathBuf::from("/tmp/app"));
    }
}
