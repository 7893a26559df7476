//! busrpc-bus - Message bus boundary and in-memory broker
//!
//! The RPC layers never talk to a broker directly. They go through
//! [`MessageBus`], which offers named queues, publishing with correlation
//! metadata, and consumers with bounded unacknowledged deliveries that are
//! settled explicitly via [`Delivery::ack`], [`Delivery::requeue`] or
//! [`Delivery::reject`].
//!
//! [`InMemoryBus`] is a complete single-process broker with queue semantics
//! close to AMQP 0-9-1: FIFO queues, competing consumers, per-consumer
//! prefetch, redelivery of unsettled messages, and dead-lettering.

mod bus;
mod error;
mod memory;

pub use bus::{Acknowledger, Consumer, Delivery, MessageBus, QueueOptions};
pub use error::BusError;
pub use memory::{InMemoryBus, QueueStats};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BusError, Consumer, Delivery, InMemoryBus, MessageBus, QueueOptions};
}
