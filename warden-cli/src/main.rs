//! Warden — drive long-running daemons over their stdin/stdout.
//!
//! # Usage
//!
//! ```text
//! warden run --daemon <cmd> [--user <name>] [--id <id>] [--timeout <secs>] [--json] <command>...
//! warden config show [--config <path>]
//! warden config path
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "warden",
    version,
    about = "Send commands to a supervised daemon and wait for its sentinel lines",
    long_about = None,
)]
struct Cli {
    /// Log daemon traffic (stdout, stderr and sent commands) to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a daemon and run commands through it, one sync per command.
    Run(RunArgs),

    /// Inspect supervisor configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    warden_daemon::init_tracing(if cli.verbose { "debug" } else { "warn" });

    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}
