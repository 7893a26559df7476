//! Global subscriber installation

use crate::ReloadHandle;
use busrpc_core::{LogLevel, RpcConfig, RpcResult};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::reload;

/// Map a configured level onto a tracing filter
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Trace => LevelFilter::TRACE,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Off => LevelFilter::OFF,
    }
}

/// Install the global subscriber
///
/// Events pass a reloadable level filter, then `RUST_LOG` directives when
/// that variable is set, and are written to stderr. Returns `false` if a
/// global subscriber was already installed, in which case nothing changes.
pub fn init_logging(level: LogLevel) -> bool {
    let (filter, handle) = reload::Layer::new(level_filter(level));
    let env_filter = EnvFilter::try_from_default_env().ok();

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .is_ok();

    if installed {
        ReloadHandle::global().set_handle(handle, level);
    }
    installed
}

/// Install the global subscriber at the level named in `config`
pub fn init_logging_from_config(config: &RpcConfig) -> RpcResult<bool> {
    Ok(init_logging(config.log_level()?))
}
