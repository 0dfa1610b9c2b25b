//! `unitpm logs` and `unitpm flush`.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use unitpm_core::Identifier;

use super::open_manager;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// App name or id. Every app when omitted.
    pub target: Option<String>,

    /// Number of trailing lines to show per file.
    #[arg(long, short = 'l', default_value_t = 15)]
    pub lines: usize,

    /// Keep streaming new lines until interrupted.
    #[arg(long, short = 'f')]
    pub follow: bool,
}

#[derive(Args, Debug)]
pub struct FlushArgs {
    /// App name or id. Every app when omitted.
    pub target: Option<String>,
}

impl LogsArgs {
    pub fn run(self) -> Result<()> {
        let (_, manager) = open_manager()?;
        let identifier = self.target.as_deref().map(Identifier::parse);
        let files = manager
            .logs(identifier.as_ref(), self.lines, self.follow)
            .context("failed to read logs")?;
        if files.is_empty() {
            println!("No log files.");
        }
        Ok(())
    }
}

impl FlushArgs {
    pub fn run(self) -> Result<()> {
        let (_, manager) = open_manager()?;
        let identifier = self.target.as_deref().map(Identifier::parse);
        let flushed = manager
            .flush(identifier.as_ref())
            .context("failed to flush logs")?;
        if flushed.is_empty() {
            println!("No log files to flush.");
        }
        for path in flushed {
            println!("{} Flushed {}", "✓".green(), path.display());
        }
        Ok(())
    }
}
