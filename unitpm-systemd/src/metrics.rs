//! Per-process resource sampling from procfs.
//!
//! Readings are best effort: a process that exited between listing and
//! sampling, or a pid of 0, reads as zero rather than failing.

use std::fs;
use std::path::PathBuf;

/// Fallback when `sysconf(_SC_CLK_TCK)` is unavailable.
pub const DEFAULT_CLOCK_TICKS: u64 = 100;

// Field offsets counted from the first field after the `(comm)` entry.
const STAT_UTIME: usize = 11;
const STAT_STIME: usize = 12;
const STAT_STARTTIME: usize = 19;

/// Reads memory and CPU figures under a procfs root.
#[derive(Debug, Clone)]
pub struct ProcReader {
    root: PathBuf,
    clock_ticks: u64,
}

impl Default for ProcReader {
    fn default() -> Self {
        Self::system()
    }
}

impl ProcReader {
    /// The live `/proc` with the kernel's clock tick rate.
    pub fn system() -> Self {
        Self::at("/proc", clock_ticks())
    }

    /// A procfs tree rooted elsewhere, e.g. a fixture directory.
    pub fn at(root: impl Into<PathBuf>, clock_ticks: u64) -> Self {
        Self {
            root: root.into(),
            clock_ticks: clock_ticks.max(1),
        }
    }

    /// Resident set size in bytes (`VmRSS` × 1024).
    pub fn memory(&self, pid: u32) -> u64 {
        if pid == 0 {
            return 0;
        }
        let Ok(status) = fs::read_to_string(self.root.join(pid.to_string()).join("status")) else {
            return 0;
        };
        status
            .lines()
            .find_map(|line| line.strip_prefix("VmRSS:"))
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|kb| kb.parse::<u64>().ok())
            .map(|kb| kb.saturating_mul(1024))
            .unwrap_or(0)
    }

    /// Lifetime-average CPU usage, 0–100.
    ///
    /// Total CPU seconds divided by seconds since the process started.
    pub fn cpu_percent(&self, pid: u32) -> u8 {
        if pid == 0 {
            return 0;
        }
        let Some((utime, stime, start)) = self.read_stat(pid) else {
            return 0;
        };
        let Some(uptime) = self.system_uptime() else {
            return 0;
        };

        let hz = self.clock_ticks as f64;
        let cpu_secs = (utime + stime) as f64 / hz;
        let age = uptime - start as f64 / hz;
        if age <= 0.0 {
            return 0;
        }
        (100.0 * cpu_secs / age).clamp(0.0, 100.0).round() as u8
    }

    fn read_stat(&self, pid: u32) -> Option<(u64, u64, u64)> {
        let stat = fs::read_to_string(self.root.join(pid.to_string()).join("stat")).ok()?;
        // comm may contain spaces and parens; fields resume after the last ')'.
        let rest = &stat[stat.rfind(')')? + 1..];
        let fields: Vec<&str> = rest.split_whitespace().collect();
        let field = |idx: usize| fields.get(idx)?.parse::<u64>().ok();
        Some((field(STAT_UTIME)?, field(STAT_STIME)?, field(STAT_STARTTIME)?))
    }

    fn system_uptime(&self) -> Option<f64> {
        let raw = fs::read_to_string(self.root.join("uptime")).ok()?;
        raw.split_whitespace().next()?.parse().ok()
    }
}

/// Kernel clock ticks per second.
pub fn clock_ticks() -> u64 {
    // SAFETY: sysconf only reads a configuration value.
    let hz = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if hz > 0 {
        hz as u64
    } else {
        DEFAULT_CLOCK_TICKS
    }
}
