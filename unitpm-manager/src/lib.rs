//! # unitpm-manager
//!
//! App registry backed by a unit directory and an [`InitSystem`].
//!
//! [`Manager`] is generic over the init system so tests can drive it with a
//! recording fake; production code uses [`unitpm_systemd::Systemctl`].
//!
//! [`InitSystem`]: unitpm_systemd::InitSystem

pub mod error;
pub mod manager;
pub mod store;

pub use error::ManagerError;
pub use manager::{next_id, AppEntry, Manager};
pub use store::UnitStore;
