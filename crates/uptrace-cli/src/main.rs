//! uptrace-monitor - Declarative Uptrace monitor management
//!
//! Keeps monitors described in plan files in sync with an Uptrace project.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod cli;
mod commands;
mod config;
mod error;
mod plan;
mod state;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive("uptrace_monitor=info".parse()?)
                .add_directive("uptrace_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::load(cli.config.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Validate { plan } => commands::monitor::validate(&plan, &config).await,
        Commands::Apply { plan } => commands::monitor::apply(&plan, &config).await,
        Commands::Refresh { address } => commands::monitor::refresh(&address, &config).await,
        Commands::Destroy { address } => commands::monitor::destroy(&address, &config).await,
        Commands::Import { address, id } => {
            commands::monitor::import(&address, &id, &config).await
        }
        Commands::Show { id, json } => commands::monitor::show(&id, json, &config).await,
        Commands::List => commands::monitor::list(&config).await,
        Commands::Doctor => {
            let config_path = config::Config::resolve_path(cli.config.as_deref());
            commands::doctor::execute(&config, &config_path).await
        }
        Commands::Version => {
            println!("uptrace-monitor {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
