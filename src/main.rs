//! moodle-plugin-install - main entry point

use anyhow::Context;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use moodle_plugin_install::cli::{Cli, Commands};
use moodle_plugin_install::{Environment, InstallCommand};

/// Initialize the logger with appropriate settings
fn init_logger() {
    // RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application entry point
fn main() -> anyhow::Result<()> {
    init_logger();
    info!("moodle-plugin-install starting up");

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Install(args) => {
            let base_dir = std::env::current_dir().context("Failed to read working directory")?;
            let command = InstallCommand::new(args.env_file.clone(), Environment::from_process(), base_dir);
            let status = command.execute(&args);
            if status != 0 {
                std::process::exit(status);
            }
            println!("✓ Install completed successfully");
        }
    }

    Ok(())
}
