//! # busrpc
//!
//! Request/response RPC over an asynchronous message bus.
//!
//! A caller publishes a call (method, path, parameters) to a shared request
//! queue and awaits the matching response on its private reply queue. Server
//! loops consume the request queue one delivery at a time, rebuild a
//! structured request, run it through a [`Handler`], publish the response to
//! the caller and only then acknowledge the delivery.
//!
//! ## Serving
//!
//! ```ignore
//! use busrpc::prelude::*;
//!
//! struct Users;
//!
//! #[async_trait]
//! impl Handler for Users {
//!     async fn handle(&self, request: StructuredRequest) -> RpcResult<StructuredResponse> {
//!         match request.segments().collect::<Vec<_>>().as_slice() {
//!             ["users", id] => StructuredResponse::json(200, &serde_json::json!({ "id": id })),
//!             _ => Err(RpcError::handler(404, "not found")),
//!         }
//!     }
//! }
//!
//! let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
//! let shutdown = ShutdownHandle::new();
//! shutdown.trigger_on_ctrl_c();
//! serve(bus, Arc::new(Users), &RpcConfig::default(), shutdown.signal()).await?;
//! ```
//!
//! ## Calling
//!
//! ```ignore
//! let client = RpcClient::connect(bus, &RpcConfig::default()).await?;
//! let body = client.get("/users/1", Parameters::new()).await?;
//! assert_eq!(body, br#"{"id":"1"}"#);
//! ```
//!
//! ## Crate Structure
//!
//! This is a facade crate that re-exports from:
//! - [`busrpc_core`] - Requests, responses, the handler trait and errors
//! - [`busrpc_transport`] - Envelopes and their wire encoding
//! - [`busrpc_bus`] - Message bus boundary and the in-memory broker
//! - [`busrpc_runtime`] - Runtime ownership and shutdown signalling
//! - [`busrpc_logging`] - Subscriber setup and runtime level changes
//! - [`busrpc_client`] - Correlated caller
//! - [`busrpc_server`] - Server loop and the `serve` entry point

// Re-export core types
pub use busrpc_core::{
    DEFAULT_REQUEST_QUEUE, DeliveryState, Handler, LogLevel, Method, ResponseBuilder, RpcConfig,
    RpcError, RpcResult, SERVER_PREFETCH, StructuredRequest, StructuredResponse, handler_fn,
};

// Re-export transport types
pub use busrpc_transport::{
    CallEnvelope, EnvelopeCodec, JsonCodec, Parameters, ResponseEnvelope, WireMessage,
};

// Re-export bus types
pub use busrpc_bus::{BusError, Consumer, Delivery, InMemoryBus, MessageBus, QueueOptions};

// Re-export runtime and logging
pub use busrpc_logging::{ReloadHandle, init_logging, init_logging_from_config};
pub use busrpc_runtime::{AsyncRuntime, ShutdownHandle, ShutdownSignal};

// Re-export caller and server
pub use busrpc_client::{BlockingRpcClient, RpcClient, RpcReply};
pub use busrpc_server::{LoopStats, ServerLoop, serve};

// Re-export common dependencies that handler authors need
pub use async_trait::async_trait;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// Prelude module for convenient imports.
///
/// Use `use busrpc::prelude::*;` to import commonly used types.
pub mod prelude {
    pub use crate::{
        Handler, InMemoryBus, LogLevel, MessageBus, Method, Parameters, RpcClient, RpcConfig,
        RpcError, RpcReply, RpcResult, ShutdownHandle, StructuredRequest, StructuredResponse,
        async_trait, handler_fn, serve,
    };

    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
