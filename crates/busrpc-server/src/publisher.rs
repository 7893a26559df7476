//! Response publishing and delivery settlement

use busrpc_bus::{Delivery, MessageBus};
use busrpc_core::{DeliveryState, RpcResult, StructuredResponse};
use busrpc_transport::{EnvelopeCodec, ResponseEnvelope};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Publishes responses to reply addresses and settles the inbound delivery
///
/// The delivery is acknowledged only after the publish succeeded. A failed
/// publish hands the delivery back for redelivery until it has been tried
/// `max_delivery_attempts` times, after which it is rejected.
#[derive(Clone)]
pub struct ResponsePublisher {
    bus: Arc<dyn MessageBus>,
    codec: EnvelopeCodec,
    max_delivery_attempts: u32,
}

impl ResponsePublisher {
    pub fn new(bus: Arc<dyn MessageBus>, max_delivery_attempts: u32) -> Self {
        Self {
            bus,
            codec: EnvelopeCodec::new(),
            max_delivery_attempts: max_delivery_attempts.max(1),
        }
    }

    /// Publish `response` to `reply_to`, tagged with `correlation_id`
    pub async fn publish(
        &self,
        response: &StructuredResponse,
        correlation_id: &str,
        reply_to: &str,
    ) -> RpcResult<()> {
        let envelope =
            ResponseEnvelope::new(correlation_id, response.body.clone()).with_status(response.status);
        let message = self.codec.encode_response(&envelope)?;
        self.bus.publish(reply_to, message).await?;
        Ok(())
    }

    /// Publish the response, then settle the delivery accordingly
    ///
    /// Returns the terminal state reached. Errors are transport failures,
    /// which end the calling loop; the unsettled delivery is then redelivered
    /// by the bus.
    pub async fn complete(
        &self,
        delivery: Delivery,
        response: &StructuredResponse,
        correlation_id: &str,
        reply_to: &str,
    ) -> RpcResult<DeliveryState> {
        let delivery_tag = delivery.delivery_tag;
        let attempt = delivery.attempt;

        match self.publish(response, correlation_id, reply_to).await {
            Ok(()) => {
                delivery.ack().await?;
                debug!(delivery_tag, correlation_id, "Response published and delivery acknowledged");
                Ok(DeliveryState::Acknowledged)
            }
            Err(err) if err.is_fatal() => {
                error!(delivery_tag, correlation_id, error = %err, "Transport failure while publishing response");
                Err(err)
            }
            Err(err) if attempt >= self.max_delivery_attempts => {
                error!(
                    delivery_tag,
                    correlation_id,
                    attempt,
                    reply_to,
                    error = %err,
                    "Publish failed on final attempt, rejecting delivery"
                );
                delivery.reject().await?;
                Ok(DeliveryState::Rejected)
            }
            Err(err) => {
                warn!(
                    delivery_tag,
                    correlation_id,
                    attempt,
                    reply_to,
                    error = %err,
                    "Publish failed, requeueing delivery"
                );
                delivery.requeue().await?;
                Ok(DeliveryState::Requeued)
            }
        }
    }
}
