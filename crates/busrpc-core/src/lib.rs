//! busrpc-core - Core types, handler trait, and error taxonomy
//!
//! This crate provides the foundational types shared by the caller and server sides:
//! - [`Method`] and the [`StructuredRequest`] / [`StructuredResponse`] pair
//! - [`Handler`] trait for the request-handling pipeline
//! - [`DeliveryState`] for the per-message server state machine
//! - [`RpcError`] for error handling
//! - [`RpcConfig`] for caller and server configuration

mod config;
mod error;
mod handler;
mod lifecycle;
mod method;
mod request;

pub use config::{DEFAULT_REQUEST_QUEUE, RpcConfig, SERVER_PREFETCH};
pub use error::{RpcError, RpcResult};
pub use handler::{Handler, HandlerFn, handler_fn};
pub use lifecycle::DeliveryState;
pub use method::Method;
pub use request::{
    CONTENT_TYPE_JSON, Headers, ResponseBuilder, ResponseError, StructuredRequest,
    StructuredResponse,
};

/// Log levels accepted in configuration
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

impl LogLevel {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Trace,
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            3 => LogLevel::Warn,
            4 => LogLevel::Error,
            _ => LogLevel::Off,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = RpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" => Ok(LogLevel::Off),
            other => Err(RpcError::ConfigError(format!("unknown log level: {other}"))),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Off => write!(f, "OFF"),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DeliveryState, Handler, LogLevel, Method, ResponseBuilder, RpcConfig, RpcError, RpcResult,
        StructuredRequest, StructuredResponse, handler_fn,
    };
}
