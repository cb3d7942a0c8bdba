//! The `checkout` command: materialize locked revisions without building.

use clap::Args;

use crate::core::{CartelError, Result};

use super::common::CommandContext;

/// Check dependencies out at the revisions the lockfile records.
#[derive(Args)]
pub struct CheckoutCommand {
    /// Initialize submodules recursively when checking out.
    #[arg(long)]
    use_submodules: bool,
}

impl CheckoutCommand {
    /// Run the command.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let coordinator = context.coordinator(self.use_submodules);
        let printer = context.spawn_event_printer(&coordinator);

        let lockfile = coordinator.load_lockfile()?.ok_or_else(|| {
            CartelError::InvalidArgument {
                description: format!(
                    "no {} found; run `cartel update` first",
                    crate::constants::LOCKFILE_FILENAME
                ),
            }
        })?;
        coordinator.checkout_dependencies(&lockfile).await?;

        drop(coordinator);
        let _ = printer.await;
        Ok(())
    }
}
