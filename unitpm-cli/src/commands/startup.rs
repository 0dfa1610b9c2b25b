//! `unitpm startup`: boot persistence for user-scope apps.

use anyhow::{Context, Result};
use colored::Colorize;

use unitpm_systemd::{startup, Layout, Scope};

pub fn run() -> Result<()> {
    let layout = Layout::detect().context("failed to resolve unit and log directories")?;
    if layout.scope == Scope::System {
        println!("Running with system scope: units in {} already start at boot.", layout.unit_dir.display());
        return Ok(());
    }

    let status = startup::status();
    if status.is_configured() {
        println!("{} Startup is already configured.", "✓".green());
        println!("  lingering enabled:    yes");
        println!("  user service enabled: {}", status.user_service);
        return Ok(());
    }

    let commands = startup::manual_commands(&status.user, status.uid);
    println!("Configuring systemd for user {} (uid {})", status.user.bold(), status.uid);
    println!("The following commands will be run:");
    for cmd in &commands {
        println!("  {cmd}");
    }

    if let Err(err) = startup::configure(layout.scope) {
        eprintln!("{} Startup configuration failed: {err}", "✗".red());
        eprintln!("Run these commands manually:");
        for cmd in &commands {
            eprintln!("  {cmd}");
        }
        return Err(err).context("startup configuration failed");
    }

    println!("{} Apps will now start at boot and keep running after logout.", "✓".green());
    Ok(())
}
