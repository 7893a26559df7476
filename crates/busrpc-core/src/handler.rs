//! Handler trait for the request-handling pipeline

use crate::{RpcResult, StructuredRequest, StructuredResponse};
use async_trait::async_trait;
use std::future::Future;

/// Request-handling pipeline invoked by the server's dispatcher
///
/// Implementations own all routing and business logic. Returning an error
/// (or panicking) never stops the server loop: the dispatcher turns the
/// failure into an error response.
///
/// # Example
///
/// ```ignore
/// use busrpc_core::prelude::*;
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Handler for Echo {
///     async fn handle(&self, request: StructuredRequest) -> RpcResult<StructuredResponse> {
///         match request.segments().next() {
///             Some("echo") => Ok(StructuredResponse::ok(request.body)),
///             _ => Err(RpcError::handler(404, format!("no route for {}", request.uri()))),
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handle one structured request
    async fn handle(&self, request: StructuredRequest) -> RpcResult<StructuredResponse>;

    /// Name used in log output
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Handler backed by an async closure
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`]
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(StructuredRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<StructuredResponse>> + Send + 'static,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(StructuredRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<StructuredResponse>> + Send + 'static,
{
    async fn handle(&self, request: StructuredRequest) -> RpcResult<StructuredResponse> {
        (self.f)(request).await
    }

    fn name(&self) -> &str {
        "handler_fn"
    }
}
