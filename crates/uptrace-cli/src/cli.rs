//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Declarative Uptrace monitor management
///
/// Plans are JSON or TOML files describing one monitor each. State for every
/// applied plan is kept locally and refreshed from Uptrace on demand.
#[derive(Parser, Debug)]
#[command(name = "uptrace-monitor")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to $UPTRACE_CONFIG or the platform config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a plan without talking to Uptrace
    Validate {
        /// Plan file (.json or .toml)
        plan: PathBuf,
    },

    /// Create or update the monitor described by a plan
    Apply {
        /// Plan file (.json or .toml)
        plan: PathBuf,
    },

    /// Refresh stored state from Uptrace
    Refresh {
        /// Monitor address (plan `address` or file stem)
        address: String,
    },

    /// Delete a monitor and forget its state
    Destroy {
        /// Monitor address
        address: String,
    },

    /// Adopt an existing monitor under an address
    Import {
        /// Address to store the monitor under
        address: String,
        /// Uptrace monitor id
        id: String,
    },

    /// Show a monitor as Uptrace has it
    Show {
        /// Uptrace monitor id
        id: String,

        /// Print the declarative model as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the project's monitors
    List,

    /// Run diagnostics
    Doctor,

    /// Show version information
    Version,
}
