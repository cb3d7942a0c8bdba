//! The `build` command: build dependencies that are already checked out.

use clap::Args;

use crate::core::{CartelError, Result};

use super::common::{CommandContext, build_options};

/// Build checked-out dependencies in lockfile order.
#[derive(Args)]
pub struct BuildCommand {
    /// Build configuration to use.
    #[arg(long, default_value = crate::constants::DEFAULT_CONFIGURATION)]
    configuration: String,

    /// Platform(s) to build (macOS, iOS, tvOS, watchOS); repeatable.
    #[arg(long = "platform", value_name = "PLATFORM")]
    platforms: Vec<String>,

    /// Scheme(s) to build; repeatable. All buildable schemes by default.
    #[arg(long = "scheme", value_name = "SCHEME")]
    schemes: Vec<String>,
}

impl BuildCommand {
    /// Run the command.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let coordinator = context.coordinator(false);
        let printer = context.spawn_event_printer(&coordinator);

        let lockfile = coordinator.load_lockfile()?.ok_or_else(|| {
            CartelError::InvalidArgument {
                description: format!(
                    "no {} found; run `cartel update` first",
                    crate::constants::LOCKFILE_FILENAME
                ),
            }
        })?;

        let options = build_options(self.configuration, &self.platforms, self.schemes)?;
        let mut log = context.build_log();
        coordinator.build_dependencies(&lockfile, &options, &mut log).await?;

        drop(coordinator);
        let _ = printer.await;
        Ok(())
    }
}
