//! Consume loop binding translator, dispatcher and publisher to the request queue

use crate::{Dispatcher, RequestTranslator, ResponsePublisher};
use busrpc_bus::{Delivery, MessageBus, QueueOptions};
use busrpc_core::{
    DeliveryState, Handler, RpcConfig, RpcError, RpcResult, SERVER_PREFETCH, StructuredResponse,
};
use busrpc_runtime::ShutdownSignal;
use busrpc_transport::EnvelopeCodec;
use std::ops::AddAssign;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Counters reported by a loop instance when it stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    /// Deliveries taken from the request queue
    pub received: u64,
    /// Deliveries answered and acknowledged
    pub acknowledged: u64,
    /// Deliveries rejected (malformed, or publish attempts exhausted)
    pub rejected: u64,
    /// Deliveries handed back after a failed publish
    pub requeued: u64,
    /// Acknowledged deliveries whose response carried an error status
    pub error_responses: u64,
}

impl LoopStats {
    fn record(&mut self, state: DeliveryState) {
        match state {
            DeliveryState::Acknowledged => self.acknowledged += 1,
            DeliveryState::Rejected => self.rejected += 1,
            DeliveryState::Requeued => self.requeued += 1,
            _ => {}
        }
    }
}

impl AddAssign for LoopStats {
    fn add_assign(&mut self, other: Self) {
        self.received += other.received;
        self.acknowledged += other.acknowledged;
        self.rejected += other.rejected;
        self.requeued += other.requeued;
        self.error_responses += other.error_responses;
    }
}

/// One server loop instance
///
/// Consumes the shared request queue with a prefetch of one, so a delivery
/// is always settled before the next one is taken. Several instances on the
/// same queue compete for deliveries.
pub struct ServerLoop {
    instance: usize,
    bus: Arc<dyn MessageBus>,
    request_queue: String,
    dead_letter_queue: Option<String>,
    codec: EnvelopeCodec,
    translator: RequestTranslator,
    dispatcher: Dispatcher,
    publisher: ResponsePublisher,
}

impl ServerLoop {
    pub fn new(bus: Arc<dyn MessageBus>, handler: Arc<dyn Handler>, config: &RpcConfig) -> Self {
        Self {
            instance: 0,
            publisher: ResponsePublisher::new(bus.clone(), config.max_delivery_attempts),
            bus,
            request_queue: config.request_queue.clone(),
            dead_letter_queue: config.dead_letter_queue.clone(),
            codec: EnvelopeCodec::new(),
            translator: RequestTranslator::new(),
            dispatcher: Dispatcher::new(handler),
        }
    }

    /// Set the instance number used in log fields
    pub fn with_instance(mut self, instance: usize) -> Self {
        self.instance = instance;
        self
    }

    pub fn instance(&self) -> usize {
        self.instance
    }

    /// Declare the request queue and its dead-letter queue
    pub async fn declare(&self) -> RpcResult<()> {
        let mut options = QueueOptions::default();
        if let Some(dead_letter) = &self.dead_letter_queue {
            self.bus
                .declare_queue(dead_letter, QueueOptions::default())
                .await?;
            options = options.with_dead_letter(dead_letter.clone());
        }
        self.bus.declare_queue(&self.request_queue, options).await?;
        Ok(())
    }

    /// Serve requests until shutdown is signalled or the transport fails
    ///
    /// Shutdown is only observed between deliveries; a delivery in progress
    /// is always driven to a terminal state first.
    pub async fn run(self, mut shutdown: ShutdownSignal) -> RpcResult<LoopStats> {
        self.declare().await?;
        let mut consumer = self
            .bus
            .consume(&self.request_queue, SERVER_PREFETCH)
            .await?;

        info!(
            instance = self.instance,
            queue = %self.request_queue,
            handler = self.dispatcher.handler_name(),
            "Awaiting RPC requests"
        );

        let mut stats = LoopStats::default();
        loop {
            let next = tokio::select! {
                biased;
                _ = shutdown.notified() => {
                    info!(instance = self.instance, ?stats, "Server loop stopping");
                    return Ok(stats);
                }
                next = consumer.next_delivery() => next,
            };

            match next {
                Ok(Some(delivery)) => {
                    stats.received += 1;
                    let state = self.process(delivery, &mut stats).await?;
                    stats.record(state);
                }
                Ok(None) => {
                    warn!(instance = self.instance, queue = %self.request_queue, "Request queue consumer ended");
                    return Err(RpcError::TransportError(format!(
                        "consumer on {} ended",
                        self.request_queue
                    )));
                }
                Err(err) => {
                    warn!(instance = self.instance, error = %err, "Request queue consumer failed");
                    return Err(err.into());
                }
            }
        }
    }

    /// Drive one delivery to a terminal state
    ///
    /// Only transport failures are returned as errors; everything else ends
    /// in `Acknowledged`, `Rejected` or `Requeued`.
    pub async fn process(
        &self,
        delivery: Delivery,
        stats: &mut LoopStats,
    ) -> RpcResult<DeliveryState> {
        let delivery_tag = delivery.delivery_tag;
        let state = DeliveryState::Received;

        let call = match self.codec.decode_call(&delivery.message) {
            Ok(call) => call,
            Err(err) => {
                warn!(
                    instance = self.instance,
                    delivery_tag,
                    error = %err,
                    "Rejecting malformed delivery"
                );
                delivery.reject().await?;
                return Ok(advance(delivery_tag, state, DeliveryState::Rejected));
            }
        };
        let state = advance(delivery_tag, state, DeliveryState::Decoded);

        let (state, response) = match self.translator.translate(&call) {
            Ok(request) => {
                let state = advance(delivery_tag, state, DeliveryState::Translated);
                let response = self.dispatcher.dispatch(request).await;
                (advance(delivery_tag, state, DeliveryState::Dispatched), response)
            }
            Err(err) => {
                warn!(
                    instance = self.instance,
                    delivery_tag,
                    correlation_id = %call.correlation_id,
                    error = %err,
                    "Failed to build request, answering with an error"
                );
                let response = StructuredResponse::from_error(&err);
                (advance(delivery_tag, state, DeliveryState::Dispatched), response)
            }
        };

        debug!(
            instance = self.instance,
            delivery_tag,
            correlation_id = %call.correlation_id,
            method = %call.method,
            path = %call.path,
            status = response.status,
            "Request dispatched"
        );

        let outcome = self
            .publisher
            .complete(delivery, &response, &call.correlation_id, &call.reply_to)
            .await?;
        if outcome == DeliveryState::Acknowledged {
            let state = advance(delivery_tag, state, DeliveryState::Published);
            advance(delivery_tag, state, outcome);
            if !response.is_success() {
                stats.error_responses += 1;
            }
        } else {
            advance(delivery_tag, state, outcome);
        }
        Ok(outcome)
    }
}

fn advance(delivery_tag: u64, from: DeliveryState, to: DeliveryState) -> DeliveryState {
    debug_assert!(from.can_transition_to(to), "invalid transition {from} -> {to}");
    trace!(delivery_tag, %from, %to, "Delivery state transition");
    to
}
