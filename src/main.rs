//! Cartel CLI entry point.
//!
//! Parses arguments, initializes logging, runs the selected command, and
//! maps failures to a one-line summary with exit code 1.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cartel::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins when set; --verbose maps to debug; silence otherwise.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    } else if cli.verbose() {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("off")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(error) = cli.execute().await {
        tracing::debug!("command failed with error code {}", error.code());
        error.display();
        std::process::exit(1);
    }
}
