//! The `update` command: resolve, lock, check out, build.

use clap::Args;

use crate::core::Result;
use crate::utils::progress::PhaseSpinner;

use super::common::{CommandContext, build_options};

/// Update dependencies to the latest versions the manifest admits.
#[derive(Args)]
pub struct UpdateCommand {
    /// Build configuration to use.
    #[arg(long, default_value = crate::constants::DEFAULT_CONFIGURATION)]
    configuration: String,

    /// Platform(s) to build (macOS, iOS, tvOS, watchOS); repeatable.
    #[arg(long = "platform", value_name = "PLATFORM")]
    platforms: Vec<String>,

    /// Resolve and write the lockfile, then check out without building.
    #[arg(long)]
    no_build: bool,

    /// Resolve and write the lockfile only.
    #[arg(long)]
    no_checkout: bool,

    /// Initialize submodules recursively when checking out.
    #[arg(long)]
    use_submodules: bool,
}

impl UpdateCommand {
    /// Run the command.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let coordinator = context.coordinator(self.use_submodules);
        let printer = context.spawn_event_printer(&coordinator);

        let spinner = PhaseSpinner::start("Resolving dependencies", !context.quiet);
        let lockfile = match coordinator.update_lockfile().await {
            Ok(lockfile) => {
                spinner.finish(format!(
                    "Resolved {} dependencies",
                    lockfile.dependencies.len()
                ));
                lockfile
            }
            Err(e) => {
                spinner.clear();
                return Err(e);
            }
        };

        if !self.no_checkout {
            coordinator.checkout_dependencies(&lockfile).await?;

            if !self.no_build {
                let options =
                    build_options(self.configuration, &self.platforms, Vec::new())?;
                let mut log = context.build_log();
                coordinator.build_dependencies(&lockfile, &options, &mut log).await?;
            }
        }

        drop(coordinator);
        let _ = printer.await;
        Ok(())
    }
}
