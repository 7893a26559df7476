//! Async correlated caller

use crate::{PendingCalls, RpcReply};
use busrpc_bus::{Consumer, MessageBus};
use busrpc_core::{Method, RpcConfig, RpcError, RpcResult};
use busrpc_transport::{CallEnvelope, EnvelopeCodec, Parameters};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, trace, warn};

/// Issues calls over a [`MessageBus`] and awaits their correlated responses
///
/// The client owns a private reply queue for its whole lifetime. Dropping the
/// client stops the reply drain; [`close`](Self::close) also deletes the queue.
pub struct RpcClient {
    bus: Arc<dyn MessageBus>,
    codec: EnvelopeCodec,
    request_queue: String,
    reply_to: String,
    timeout: Duration,
    pending: Arc<PendingCalls>,
    nonce: String,
    counter: AtomicU64,
    failed: Arc<AtomicBool>,
    closed: AtomicBool,
    drain: Mutex<Option<JoinHandle<()>>>,
}

impl RpcClient {
    /// Create a client: declares a private reply queue and starts draining it
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn connect(bus: Arc<dyn MessageBus>, config: &RpcConfig) -> RpcResult<Self> {
        config.validate()?;
        let reply_to = bus.declare_private_queue().await?;
        let consumer = bus.consume(&reply_to, 0).await?;

        let pending = Arc::new(PendingCalls::new());
        let failed = Arc::new(AtomicBool::new(false));
        let codec = EnvelopeCodec::new();
        let drain = tokio::spawn(drain_replies(
            consumer,
            pending.clone(),
            codec.clone(),
            failed.clone(),
        ));

        debug!(reply_to = %reply_to, request_queue = %config.request_queue, "RPC client connected");

        Ok(Self {
            bus,
            codec,
            request_queue: config.request_queue.clone(),
            reply_to,
            timeout: config.call_timeout(),
            pending,
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            counter: AtomicU64::new(0),
            failed,
            closed: AtomicBool::new(false),
            drain: Mutex::new(Some(drain)),
        })
    }

    /// Override the per-call deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-call deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// This client's private reply address
    pub fn reply_to(&self) -> &str {
        &self.reply_to
    }

    /// Address requests are published to
    pub fn request_queue(&self) -> &str {
        &self.request_queue
    }

    /// Number of calls awaiting a response
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Whether the reply drain has stopped because of a bus failure
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::Acquire)
    }

    fn next_correlation_id(&self) -> String {
        let sequence = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.nonce, sequence)
    }

    /// Issue a call and return the response body
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        parameters: Parameters,
    ) -> RpcResult<Vec<u8>> {
        Ok(self.call_reply(method, path, parameters).await?.body)
    }

    /// Issue a call whose raw content differs from its parameters
    pub async fn call_with_content(
        &self,
        method: Method,
        path: &str,
        parameters: Parameters,
        content: impl Into<String>,
    ) -> RpcResult<Vec<u8>> {
        let call = CallEnvelope::new(method, path, parameters).with_content(content);
        Ok(self.send(call).await?.body)
    }

    /// Issue a call and return status and body
    ///
    /// The content sent is the JSON encoding of `parameters`.
    pub async fn call_reply(
        &self,
        method: Method,
        path: &str,
        parameters: Parameters,
    ) -> RpcResult<RpcReply> {
        let content = serde_json::to_string(&parameters)?;
        let call = CallEnvelope::new(method, path, parameters).with_content(content);
        self.send(call).await
    }

    /// Publish a prepared envelope and await its response
    ///
    /// Correlation ID and reply address are assigned here; any values
    /// already on `call` are replaced.
    pub async fn send(&self, call: CallEnvelope) -> RpcResult<RpcReply> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RpcError::InvalidState {
                expected: "open".to_string(),
                actual: "closed".to_string(),
            });
        }
        if self.is_failed() {
            return Err(RpcError::TransportError(
                "reply queue consumer has stopped".to_string(),
            ));
        }

        let correlation_id = self.next_correlation_id();
        let call = call
            .with_correlation_id(correlation_id.clone())
            .with_reply_to(self.reply_to.clone());
        let message = self.codec.encode_call(&call)?;

        // Registered before publishing so a fast response always finds its slot
        let (_guard, receiver) = self
            .pending
            .register(correlation_id.clone(), Instant::now() + self.timeout)?;

        self.bus.publish(&self.request_queue, message).await?;
        trace!(
            correlation_id = %correlation_id,
            method = %call.method,
            path = %call.path,
            "Published call"
        );

        match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(response)) => Ok(RpcReply {
                status: response.status.unwrap_or(200),
                body: response.body,
            }),
            Ok(Err(_)) if self.is_failed() || self.closed.load(Ordering::Acquire) => Err(
                RpcError::TransportError(
                    "reply queue consumer stopped before the response arrived".to_string(),
                ),
            ),
            // Slot purged by the drain task after its deadline passed
            Ok(Err(_)) => Err(RpcError::Timeout),
            Err(_) => {
                debug!(correlation_id = %correlation_id, timeout = ?self.timeout, "Call timed out");
                Err(RpcError::Timeout)
            }
        }
    }

    /// `GET path`
    pub async fn get(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Get, path, parameters).await
    }

    /// `POST path`
    pub async fn post(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Post, path, parameters).await
    }

    /// `PUT path`
    pub async fn put(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Put, path, parameters).await
    }

    /// `DELETE path`
    pub async fn delete(&self, path: &str, parameters: Parameters) -> RpcResult<Vec<u8>> {
        self.call(Method::Delete, path, parameters).await
    }

    /// Stop draining replies, fail outstanding calls, and delete the reply queue
    pub async fn close(&self) -> RpcResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if let Some(drain) = self.drain.lock().take() {
            drain.abort();
        }
        let abandoned = self.pending.fail_all();
        debug!(reply_to = %self.reply_to, abandoned, "Closing RPC client");
        self.bus.delete_queue(&self.reply_to).await?;
        Ok(())
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        if let Some(drain) = self.drain.lock().take() {
            drain.abort();
        }
    }
}

async fn drain_replies(
    mut consumer: Box<dyn Consumer>,
    pending: Arc<PendingCalls>,
    codec: EnvelopeCodec,
    failed: Arc<AtomicBool>,
) {
    loop {
        let delivery = match consumer.next_delivery().await {
            Ok(Some(delivery)) => delivery,
            Ok(None) => {
                debug!("Reply queue consumer ended");
                break;
            }
            Err(e) => {
                error!(error = %e, "Reply queue consumer failed");
                break;
            }
        };

        match codec.decode_response(&delivery.message) {
            Ok(response) => {
                let correlation_id = response.correlation_id.clone();
                if pending.fulfill(response) {
                    trace!(correlation_id = %correlation_id, "Routed response");
                } else {
                    debug!(correlation_id = %correlation_id, "Discarding response with no pending call");
                }
            }
            Err(e) => warn!(error = %e, "Discarding undecodable response"),
        }

        if let Err(e) = delivery.ack().await {
            error!(error = %e, "Failed to acknowledge response");
            break;
        }
        pending.purge_expired(Instant::now());
    }

    failed.store(true, Ordering::Release);
    let abandoned = pending.fail_all();
    if abandoned > 0 {
        warn!(abandoned, "Failing outstanding calls");
    }
}
