//! The `bootstrap` command: reproduce the lockfile's exact versions.

use clap::Args;

use crate::core::Result;

use super::common::{CommandContext, build_options};

/// Check out and build the versions recorded in the lockfile. When no
/// lockfile exists yet, a full update runs first.
#[derive(Args)]
pub struct BootstrapCommand {
    /// Build configuration to use.
    #[arg(long, default_value = crate::constants::DEFAULT_CONFIGURATION)]
    configuration: String,

    /// Platform(s) to build (macOS, iOS, tvOS, watchOS); repeatable.
    #[arg(long = "platform", value_name = "PLATFORM")]
    platforms: Vec<String>,

    /// Check out without building.
    #[arg(long)]
    no_build: bool,

    /// Initialize submodules recursively when checking out.
    #[arg(long)]
    use_submodules: bool,
}

impl BootstrapCommand {
    /// Run the command.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let coordinator = context.coordinator(self.use_submodules);
        let printer = context.spawn_event_printer(&coordinator);

        let lockfile = coordinator.load_or_update_lockfile().await?;
        coordinator.checkout_dependencies(&lockfile).await?;

        if !self.no_build {
            let options = build_options(self.configuration, &self.platforms, Vec::new())?;
            let mut log = context.build_log();
            coordinator.build_dependencies(&lockfile, &options, &mut log).await?;
        }

        drop(coordinator);
        let _ = printer.await;
        Ok(())
    }
}
