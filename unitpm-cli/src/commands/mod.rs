//! Subcommand implementations. Each opens its own [`Manager`] from the
//! detected layout.

pub mod control;
pub mod describe;
pub mod list;
pub mod logs;
pub mod start;
pub mod startup;

use anyhow::{Context, Result};

use unitpm_manager::Manager;
use unitpm_systemd::{Layout, Systemctl};

pub(crate) fn open_manager() -> Result<(Layout, Manager<Systemctl>)> {
    let layout = Layout::detect().context("failed to resolve unit and log directories")?;
    tracing::debug!(?layout, "resolved layout");
    let manager = Manager::new(&layout, Systemctl::new(layout.scope))
        .context("failed to initialise unit renderer")?;
    Ok((layout, manager))
}
