//! Message bus traits and the delivery handle

use crate::BusError;
use async_trait::async_trait;
use busrpc_transport::WireMessage;
use std::fmt;
use std::sync::Arc;

/// Options applied when a queue is declared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueOptions {
    /// Queue that receives rejected deliveries
    pub dead_letter: Option<String>,
}

impl QueueOptions {
    /// Route rejected deliveries to `queue`
    pub fn with_dead_letter(mut self, queue: impl Into<String>) -> Self {
        self.dead_letter = Some(queue.into());
        self
    }
}

/// Connection to a message bus
///
/// Publishing is mandatory: a message sent to an address with no queue
/// behind it fails with [`BusError::NoRoute`] instead of being dropped.
#[async_trait]
pub trait MessageBus: Send + Sync + 'static {
    /// Declare a durable named queue. Declaring an existing queue is a no-op.
    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), BusError>;

    /// Declare a queue with a broker-generated name, private to the caller
    async fn declare_private_queue(&self) -> Result<String, BusError>;

    /// Delete a queue, ending its consumers
    async fn delete_queue(&self, name: &str) -> Result<(), BusError>;

    /// Publish a message to an address
    async fn publish(&self, address: &str, message: WireMessage) -> Result<(), BusError>;

    /// Start consuming from a queue with at most `prefetch` unacknowledged
    /// deliveries outstanding (0 means unlimited)
    async fn consume(&self, queue: &str, prefetch: u16) -> Result<Box<dyn Consumer>, BusError>;
}

/// Stream of deliveries from one queue
#[async_trait]
pub trait Consumer: Send {
    /// Wait for the next delivery
    ///
    /// Returns `Ok(None)` once the consumer has ended (queue deleted).
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BusError>;
}

/// Settles deliveries on behalf of a consumer
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Remove the delivery from the queue
    async fn ack(&self, delivery_tag: u64) -> Result<(), BusError>;

    /// Return the delivery to the queue for redelivery
    async fn requeue(&self, delivery_tag: u64) -> Result<(), BusError>;

    /// Remove the delivery, dead-lettering it if the queue has a dead-letter address
    async fn reject(&self, delivery_tag: u64) -> Result<(), BusError>;
}

/// One message handed to a consumer, pending settlement
///
/// A delivery that is dropped without being settled stays unacknowledged
/// until its consumer goes away, at which point the bus redelivers it.
pub struct Delivery {
    /// The delivered message
    pub message: WireMessage,
    /// Consumer-scoped settlement token
    pub delivery_tag: u64,
    /// Whether this message was delivered before
    pub redelivered: bool,
    /// Delivery attempt, starting at 1
    pub attempt: u32,
    acker: Arc<dyn Acknowledger>,
}

impl Delivery {
    /// Create a delivery settled through `acker`
    pub fn new(
        message: WireMessage,
        delivery_tag: u64,
        attempt: u32,
        acker: Arc<dyn Acknowledger>,
    ) -> Self {
        Self {
            message,
            delivery_tag,
            redelivered: attempt > 1,
            attempt,
            acker,
        }
    }

    /// Acknowledge the delivery
    pub async fn ack(self) -> Result<(), BusError> {
        self.acker.ack(self.delivery_tag).await
    }

    /// Hand the delivery back for redelivery
    pub async fn requeue(self) -> Result<(), BusError> {
        self.acker.requeue(self.delivery_tag).await
    }

    /// Reject the delivery
    pub async fn reject(self) -> Result<(), BusError> {
        self.acker.reject(self.delivery_tag).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("delivery_tag", &self.delivery_tag)
            .field("redelivered", &self.redelivered)
            .field("attempt", &self.attempt)
            .field("correlation_id", &self.message.correlation_id())
            .field("body_len", &self.message.body.len())
            .finish()
    }
}
