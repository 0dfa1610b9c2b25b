//! `unitpm stop`, `unitpm restart` and `unitpm delete`.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use unitpm_core::Identifier;
use unitpm_manager::Manager;
use unitpm_systemd::Systemctl;

use super::open_manager;

/// A single app, by name or numeric id.
#[derive(Args, Debug)]
pub struct TargetArgs {
    /// App name or id.
    pub target: String,
}

impl TargetArgs {
    pub fn identifier(&self) -> Identifier {
        Identifier::parse(&self.target)
    }
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// App name or id, or `all`.
    pub target: String,
}

pub fn stop(args: TargetArgs) -> Result<()> {
    let (_, manager) = open_manager()?;
    let entry = manager
        .stop(&args.identifier())
        .with_context(|| format!("failed to stop '{}'", args.target))?;
    println!("{} Stopped {} (id {})", "✓".green(), entry.name, entry.id);
    Ok(())
}

pub fn restart(args: TargetArgs) -> Result<()> {
    let (_, manager) = open_manager()?;
    if args.target == "all" {
        return restart_all(&manager);
    }
    let entry = manager
        .restart(&args.identifier())
        .with_context(|| format!("failed to restart '{}'", args.target))?;
    println!("{} Restarted {} (id {})", "✓".green(), entry.name, entry.id);
    Ok(())
}

fn restart_all(manager: &Manager<Systemctl>) -> Result<()> {
    let outcomes = manager.restart_all().context("failed to restart apps")?;
    if outcomes.is_empty() {
        println!("No apps defined.");
        return Ok(());
    }

    let total = outcomes.len();
    let mut failed = 0;
    for (entry, outcome) in outcomes {
        match outcome {
            Ok(()) => println!("{} Restarted {} (id {})", "✓".green(), entry.name, entry.id),
            Err(err) => {
                failed += 1;
                eprintln!("{} {} (id {}): {}", "✗".red(), entry.name, entry.id, err);
            }
        }
    }
    println!("Restart summary: {} successful, {} failed", total - failed, failed);
    if failed > 0 {
        bail!("{failed} of {total} apps failed to restart");
    }
    Ok(())
}

impl DeleteArgs {
    pub fn run(self) -> Result<()> {
        let (_, manager) = open_manager()?;
        if self.target == "all" {
            let removed = manager.delete_all().context("failed to delete apps")?;
            if removed.is_empty() {
                println!("No apps defined.");
            }
            for entry in removed {
                println!("{} Deleted {} (id {})", "✓".green(), entry.name, entry.id);
            }
            return Ok(());
        }

        let entry = manager
            .delete(&Identifier::parse(&self.target))
            .with_context(|| format!("failed to delete '{}'", self.target))?;
        println!("{} Deleted {} (id {})", "✓".green(), entry.name, entry.id);
        Ok(())
    }
}
