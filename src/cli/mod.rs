//! Command-line interface.
//!
//! Four commands cover the workflow:
//! - `update` - resolve the manifest, write the lockfile, check out, build
//! - `bootstrap` - check out and build the versions the lockfile records
//! - `checkout` - check dependencies out without building
//! - `build` - build already checked-out dependencies
//!
//! Global flags select the project and cache directories and control
//! verbosity. The process exits 0 on success and 1 on any reported error.

mod bootstrap;
mod build;
mod checkout;
pub mod common;
mod update;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Result;

pub use bootstrap::BootstrapCommand;
pub use build::BuildCommand;
pub use checkout::CheckoutCommand;
pub use update::UpdateCommand;

/// A decentralized dependency manager for Xcode framework projects.
#[derive(Parser)]
#[command(
    name = "cartel",
    version,
    about = "A decentralized dependency manager for Xcode framework projects",
    long_about = "Cartel reads a Cartelfile listing source repositories and version \
                  constraints, chooses a compatible set of tagged versions, checks them \
                  out, and builds binary frameworks with xcodebuild."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress progress output; errors are still printed.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Directory containing the Cartelfile (defaults to the current
    /// directory).
    #[arg(long, global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Repository cache directory (defaults to CARTEL_CACHE_DIR or the
    /// platform cache location).
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Update dependencies to the latest admissible versions and rebuild.
    Update(UpdateCommand),
    /// Check out and build the exact versions recorded in the lockfile.
    Bootstrap(BootstrapCommand),
    /// Check dependencies out at their locked revisions without building.
    Checkout(CheckoutCommand),
    /// Build dependencies that are already checked out.
    Build(BuildCommand),
}

impl Cli {
    /// Whether debug logging was requested.
    #[must_use]
    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    /// Execute the selected command.
    pub async fn execute(self) -> Result<()> {
        let context = common::CommandContext::new(
            self.project_dir.clone(),
            self.cache_dir.clone(),
            self.quiet,
        )?;
        match self.command {
            Commands::Update(cmd) => cmd.execute(context).await,
            Commands::Bootstrap(cmd) => cmd.execute(context).await,
            Commands::Checkout(cmd) => cmd.execute(context).await,
            Commands::Build(cmd) => cmd.execute(context).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command() {
        Cli::try_parse_from(["cartel", "update", "--no-build"]).unwrap();
        Cli::try_parse_from(["cartel", "bootstrap", "--platform", "iOS"]).unwrap();
        Cli::try_parse_from(["cartel", "checkout", "--use-submodules"]).unwrap();
        Cli::try_parse_from([
            "cartel",
            "build",
            "--configuration",
            "Debug",
            "--scheme",
            "Widget",
        ])
        .unwrap();
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["cartel", "--verbose", "--quiet", "update"]).is_err());
    }

    #[test]
    fn global_flags_apply_after_the_subcommand() {
        let cli =
            Cli::try_parse_from(["cartel", "update", "--project-dir", "/tmp/app"]).unwrap();
        assert_eq!(cli.project_dir, Some(PathBuf::from("/tmp/app")));
    }
}
