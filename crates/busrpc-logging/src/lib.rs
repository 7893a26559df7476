//! busrpc-logging - Tracing subscriber setup
//!
//! This crate provides:
//! - [`init_logging`] installing a formatted subscriber with a reloadable level filter
//! - [`ReloadHandle`] for changing the level at runtime
//! - [`level_filter`] mapping configuration levels onto tracing filters

mod init;
mod reload;

pub use busrpc_core::LogLevel;
pub use init::{init_logging, init_logging_from_config, level_filter};
pub use reload::ReloadHandle;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LogLevel, ReloadHandle, init_logging, init_logging_from_config};
}
