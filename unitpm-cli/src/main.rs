//! unitpm: PM2-style process management on top of systemd units.
//!
//! # Usage
//!
//! ```text
//! unitpm start <script|ecosystem.{json,yaml,yml}> [--name N] [--env K=V]… [--cwd DIR] [--interpreter I] [-- args…]
//! unitpm stop <name|id>
//! unitpm restart <name|id|all>
//! unitpm delete <name|id|all>
//! unitpm list | jlist
//! unitpm describe|env <name|id>
//! unitpm logs [name|id] [--lines N] [--follow]
//! unitpm flush [name|id]
//! unitpm startup
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    control::{DeleteArgs, TargetArgs},
    logs::{FlushArgs, LogsArgs},
    start::StartArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "unitpm",
    version,
    about = "PM2-style process manager backed by systemd units",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Define an app as a unit and start it, or start every app in an ecosystem file.
    Start(StartArgs),

    /// Stop an app.
    Stop(TargetArgs),

    /// Restart an app. `all` restarts every app.
    Restart(TargetArgs),

    /// Stop an app and remove its unit. `all` removes every app.
    #[command(alias = "del")]
    Delete(DeleteArgs),

    /// Show every app in a table.
    #[command(aliases = ["ls", "l"])]
    List,

    /// Print every app as PM2-compatible JSON.
    Jlist,

    /// Show details of one app.
    #[command(aliases = ["desc", "show"])]
    Describe(TargetArgs),

    /// Show the environment of one app.
    Env(TargetArgs),

    /// Tail app log files.
    Logs(LogsArgs),

    /// Empty app log files.
    Flush(FlushArgs),

    /// Make user units start at boot (lingering + user manager).
    Startup,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => args.run(),
        Commands::Stop(args) => commands::control::stop(args),
        Commands::Restart(args) => commands::control::restart(args),
        Commands::Delete(args) => args.run(),
        Commands::List => commands::list::table(),
        Commands::Jlist => commands::list::jlist(),
        Commands::Describe(args) => commands::describe::describe(args),
        Commands::Env(args) => commands::describe::env(args),
        Commands::Logs(args) => args.run(),
        Commands::Flush(args) => args.run(),
        Commands::Startup => commands::startup::run(),
    }
}

/// Library diagnostics go to stderr so `jlist` output stays parseable.
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
