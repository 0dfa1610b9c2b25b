//! Host-side plumbing: systemctl gateway, layout, procfs metrics, log files
//! and boot persistence.

mod error;
pub mod gateway;
pub mod logs;
pub mod metrics;
pub mod paths;
pub mod startup;

pub use error::SystemdError;
pub use gateway::{parse_timestamp, InitSystem, Systemctl, UnitAction};
pub use metrics::ProcReader;
pub use paths::{Layout, Scope};
pub use startup::StartupStatus;
