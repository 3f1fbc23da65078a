//! Keystone CLI - operator tooling for component definitions
//!
//! - Validate a definition bundle offline before submitting it
//! - Derive operation selectors and role ids
//! - Print the Controlled Factory's built-in definitions

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;

pub use crate::config::{KeystoneConfig, LoggingConfig};
pub use crate::error::{CliError, CliResult};

/// Keystone CLI application
#[derive(Parser)]
#[command(name = "keystone")]
#[command(about = "Keystone - component definition and factory tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "KEYSTONE_CONFIG")]
    config: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON definition bundle against an empty component
    CheckBundle {
        /// Bundle file
        file: PathBuf,

        /// Additional role names the bundle may grant to
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Accept protected schemas (system installation)
        #[arg(long)]
        allow_protected: bool,
    },

    /// Derive the selector of a canonical signature
    Selector {
        /// e.g. "transfer(address,uint256)"
        signature: String,

        /// Derive a role id from a role name instead
        #[arg(long)]
        role: bool,
    },

    /// Print the factory's built-in definitions
    FactoryDefinitions,
}

/// Run using the current process arguments.
pub fn run() -> CliResult<()> {
    let stdout = std::io::stdout();
    run_with_args(std::env::args_os(), &mut stdout.lock())
}

/// Run using the provided argument iterator, writing command output to `out`.
pub fn run_with_args<I, T>(args: I, out: &mut dyn Write) -> CliResult<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let config = KeystoneConfig::load(cli.config.as_deref())?;
    init_tracing(&config.logging, cli.verbose);

    match cli.command {
        Commands::CheckBundle {
            file,
            roles,
            allow_protected,
        } => commands::bundle::execute(&file, &roles, allow_protected, config.limits, out),
        Commands::Selector { signature, role } => {
            commands::selector::execute(&signature, role, out)
        }
        Commands::FactoryDefinitions => commands::factory::execute(out),
    }
}

/// Logs go to stderr so command output stays machine-readable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        "debug".to_string()
    } else {
        logging.level.clone()
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // A subscriber may already be installed when running in-process.
    let _ = if logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
}
