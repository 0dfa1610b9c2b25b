//! unitpm core library: domain types, unit naming, ecosystem loading, errors.
//!
//! Public API surface:
//! - [`types`]: desired state ([`AppConfig`]), unit schema ([`UnitDescriptor`])
//!   and observed state ([`ProcessInfo`])
//! - [`naming`]: `{prefix}{id}-{name}` unit identifiers
//! - [`ecosystem`]: multi-app descriptor files
//! - [`error`]: [`CoreError`]

pub mod ecosystem;
pub mod error;
pub mod naming;
pub mod types;

pub use error::CoreError;
pub use naming::{Identifier, UnitNaming, DEFAULT_PREFIX};
pub use types::{
    AppConfig, AppStatus, EcosystemConfig, ProcessInfo, ServiceConfig, UnitDescriptor,
};
