//! Dynamic log level reloading support

use crate::level_filter;
use busrpc_core::{LogLevel, RpcError, RpcResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::reload;

type FilterHandle = reload::Handle<LevelFilter, tracing_subscriber::Registry>;

/// Handle for dynamically reloading the log level filter
pub struct ReloadHandle {
    handle: Mutex<Option<(FilterHandle, LogLevel)>>,
}

impl ReloadHandle {
    /// Create a new, unbound reload handle
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Get the global reload handle
    pub fn global() -> &'static ReloadHandle {
        static INSTANCE: OnceCell<ReloadHandle> = OnceCell::new();
        INSTANCE.get_or_init(ReloadHandle::new)
    }

    /// Bind the handle to an installed filter (called during initialization)
    pub(crate) fn set_handle(&self, handle: FilterHandle, level: LogLevel) {
        *self.handle.lock() = Some((handle, level));
    }

    /// Whether a subscriber has been bound
    pub fn is_initialized(&self) -> bool {
        self.handle.lock().is_some()
    }

    /// Level currently in effect, if bound
    pub fn current_level(&self) -> Option<LogLevel> {
        self.handle.lock().as_ref().map(|(_, level)| *level)
    }

    /// Reload the filter to use a new log level
    pub fn reload_level(&self, level: LogLevel) -> RpcResult<()> {
        let mut guard = self.handle.lock();
        let Some((handle, current)) = guard.as_mut() else {
            return Err(RpcError::InvalidState {
                expected: "logging initialized".to_string(),
                actual: "no subscriber installed".to_string(),
            });
        };
        handle
            .reload(level_filter(level))
            .map_err(|e| RpcError::Internal(format!("Failed to reload filter: {}", e)))?;
        *current = level;
        Ok(())
    }
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}
