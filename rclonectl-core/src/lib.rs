//! rclonectl core library — domain types, the configuration source, errors.
//!
//! - [`types`] — newtypes and typed configuration views
//! - [`config`] — INI loading, defaults, interpolation, [`Diagnostics`]
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use crate::config::{Config, ConfigSource, Diagnostics};
pub use error::ConfigError;
pub use types::{DaemonConfig, Protocol, RemoteEndpoint, UnitConfig, UnitName};
