//! Caller and server configuration

use crate::{LogLevel, RpcError, RpcResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Well-known shared request address
pub const DEFAULT_REQUEST_QUEUE: &str = "rpc_queue";

/// Unacknowledged deliveries allowed per server loop instance
pub const SERVER_PREFETCH: u16 = 1;

/// Configuration shared by callers and server loops
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Shared address that requests are published to and server loops consume from
    #[serde(default = "default_request_queue")]
    pub request_queue: String,

    /// Caller deadline in milliseconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,

    /// Number of competing server loop instances started by `serve`
    #[serde(default = "default_instances")]
    pub instances: usize,

    /// Delivery attempts allowed when publishing a response keeps failing
    ///
    /// Once a delivery reaches this many attempts it is rejected instead of requeued.
    #[serde(default = "default_max_delivery_attempts")]
    pub max_delivery_attempts: u32,

    /// Address receiving rejected deliveries
    #[serde(default)]
    pub dead_letter_queue: Option<String>,

    /// Initial log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Number of async worker threads (default: number of CPU cores)
    #[serde(default)]
    pub worker_threads: Option<usize>,

    /// Shutdown timeout in milliseconds
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_ms: u64,
}

fn default_request_queue() -> String {
    DEFAULT_REQUEST_QUEUE.to_string()
}

fn default_call_timeout() -> u64 {
    30_000
}

fn default_instances() -> usize {
    1
}

fn default_max_delivery_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_shutdown_timeout() -> u64 {
    5000
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            request_queue: default_request_queue(),
            call_timeout_ms: default_call_timeout(),
            instances: default_instances(),
            max_delivery_attempts: default_max_delivery_attempts(),
            dead_letter_queue: None,
            log_level: default_log_level(),
            worker_threads: None,
            shutdown_timeout_ms: default_shutdown_timeout(),
        }
    }
}

impl RpcConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Create configuration from JSON bytes
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }

    /// Create configuration from a TOML document
    pub fn from_toml_str(source: &str) -> RpcResult<Self> {
        toml::from_str(source).map_err(|e| RpcError::ConfigError(e.to_string()))
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> RpcResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            RpcError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&source)
    }

    /// Check the configuration for values the runtime cannot honor
    pub fn validate(&self) -> RpcResult<()> {
        if self.request_queue.trim().is_empty() {
            return Err(RpcError::ConfigError("request_queue must not be empty".into()));
        }
        if self.call_timeout_ms == 0 {
            return Err(RpcError::ConfigError("call_timeout_ms must be positive".into()));
        }
        if self.instances == 0 {
            return Err(RpcError::ConfigError("instances must be at least 1".into()));
        }
        if self.max_delivery_attempts == 0 {
            return Err(RpcError::ConfigError(
                "max_delivery_attempts must be at least 1".into(),
            ));
        }
        if let Some(dlq) = &self.dead_letter_queue {
            if dlq == &self.request_queue {
                return Err(RpcError::ConfigError(
                    "dead_letter_queue must differ from request_queue".into(),
                ));
            }
        }
        self.log_level()?;
        Ok(())
    }

    /// Caller deadline
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    /// Shutdown grace period
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    /// Parsed log level
    pub fn log_level(&self) -> RpcResult<LogLevel> {
        self.log_level.parse()
    }

    /// Set the request address
    pub fn with_request_queue(mut self, queue: impl Into<String>) -> Self {
        self.request_queue = queue.into();
        self
    }

    /// Set the caller deadline
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the number of server loop instances
    pub fn with_instances(mut self, instances: usize) -> Self {
        self.instances = instances;
        self
    }

    /// Set the dead-letter address
    pub fn with_dead_letter_queue(mut self, queue: impl Into<String>) -> Self {
        self.dead_letter_queue = Some(queue.into());
        self
    }
}
