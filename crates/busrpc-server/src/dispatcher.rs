//! Handler invocation with failure isolation

use busrpc_core::{Handler, RpcError, StructuredRequest, StructuredResponse};
use std::sync::Arc;
use tracing::{error, warn};

/// Runs the handler pipeline for one request
///
/// Every outcome becomes a response: handler errors map to their status,
/// and a panicking handler yields a 500 without taking the loop down.
#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn Handler>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self { handler }
    }

    /// Name of the wrapped handler
    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    /// Dispatch a request and return the response to publish
    pub async fn dispatch(&self, request: StructuredRequest) -> StructuredResponse {
        let method = request.method;
        let uri = request.uri();
        let handler = self.handler.clone();

        // The handler runs as its own task so a panic surfaces as a JoinError
        let outcome = tokio::spawn(async move { handler.handle(request).await }).await;

        match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(
                    handler = self.handler.name(),
                    %method,
                    %uri,
                    status = err.status(),
                    error = %err,
                    "Handler returned an error"
                );
                StructuredResponse::from_error(&err)
            }
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    "handler panicked"
                } else {
                    "handler task cancelled"
                };
                error!(handler = self.handler.name(), %method, %uri, "{}", reason);
                StructuredResponse::from_error(&RpcError::Internal(reason.to_string()))
            }
        }
    }
}
