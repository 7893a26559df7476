//! Single-process broker implementing [`MessageBus`]

use crate::{Acknowledger, BusError, Consumer, Delivery, MessageBus, QueueOptions};
use async_trait::async_trait;
use busrpc_transport::WireMessage;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;
use tracing::{debug, trace, warn};

/// Header naming the queue a dead-lettered message was rejected from
pub(crate) const DEATH_QUEUE_HEADER: &str = "x-first-death-queue";

/// Snapshot of one queue's contents and counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Messages waiting for a consumer
    pub ready: usize,
    /// Messages delivered but not yet settled
    pub unacked: usize,
    /// Attached consumers
    pub consumers: usize,
    /// Messages published to the queue
    pub published: u64,
    /// Deliveries handed to consumers, including redeliveries
    pub delivered: u64,
    /// Deliveries acknowledged
    pub acked: u64,
    /// Deliveries returned to the queue
    pub requeued: u64,
    /// Deliveries rejected
    pub rejected: u64,
}

struct Pending {
    message: WireMessage,
    deliveries: u32,
}

struct Outstanding {
    consumer_id: u64,
    pending: Pending,
}

struct ConsumerSlot {
    prefetch: u16,
    in_flight: usize,
}

impl ConsumerSlot {
    fn has_capacity(&self) -> bool {
        self.prefetch == 0 || self.in_flight < usize::from(self.prefetch)
    }
}

struct Queue {
    options: QueueOptions,
    ready: VecDeque<Pending>,
    unacked: HashMap<u64, Outstanding>,
    consumers: HashMap<u64, ConsumerSlot>,
    notify: Arc<Notify>,
    stats: QueueStats,
}

impl Queue {
    fn new(options: QueueOptions) -> Self {
        Self {
            options,
            ready: VecDeque::new(),
            unacked: HashMap::new(),
            consumers: HashMap::new(),
            notify: Arc::new(Notify::new()),
            stats: QueueStats::default(),
        }
    }

    /// Put every outstanding delivery matching `owned` back at the head of
    /// the queue, keeping original order
    fn return_unacked(&mut self, owned: impl Fn(&Outstanding) -> bool) -> usize {
        let mut tags: Vec<u64> = self
            .unacked
            .iter()
            .filter(|(_, outstanding)| owned(outstanding))
            .map(|(tag, _)| *tag)
            .collect();
        tags.sort_unstable();
        for tag in tags.iter().rev() {
            if let Some(outstanding) = self.unacked.remove(tag) {
                if let Some(slot) = self.consumers.get_mut(&outstanding.consumer_id) {
                    slot.in_flight = slot.in_flight.saturating_sub(1);
                }
                self.ready.push_front(outstanding.pending);
            }
        }
        self.stats.requeued += tags.len() as u64;
        tags.len()
    }
}

enum Poll {
    Ready {
        message: WireMessage,
        delivery_tag: u64,
        attempt: u32,
    },
    Empty,
    Ended,
}

enum Settle {
    Ack,
    Requeue,
    Reject,
}

struct Broker {
    queues: Mutex<HashMap<String, Queue>>,
    closed: AtomicBool,
    next_tag: AtomicU64,
    next_consumer: AtomicU64,
}

impl Broker {
    fn ensure_open(&self) -> Result<(), BusError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(BusError::ConnectionClosed);
        }
        Ok(())
    }

    fn declare(&self, name: &str, options: QueueOptions) -> Result<(), BusError> {
        self.ensure_open()?;
        let mut queues = self.queues.lock();
        if !queues.contains_key(name) {
            debug!(queue = name, dead_letter = ?options.dead_letter, "Declared queue");
            queues.insert(name.to_string(), Queue::new(options));
        }
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), BusError> {
        self.ensure_open()?;
        let queue = self
            .queues
            .lock()
            .remove(name)
            .ok_or_else(|| BusError::QueueNotFound(name.to_string()))?;
        debug!(
            queue = name,
            dropped = queue.ready.len() + queue.unacked.len(),
            "Deleted queue"
        );
        queue.notify.notify_waiters();
        Ok(())
    }

    fn publish(&self, address: &str, message: WireMessage) -> Result<(), BusError> {
        self.ensure_open()?;
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(address)
            .ok_or_else(|| BusError::NoRoute(address.to_string()))?;
        queue.ready.push_back(Pending {
            message,
            deliveries: 0,
        });
        queue.stats.published += 1;
        queue.notify.notify_waiters();
        trace!(queue = address, ready = queue.ready.len(), "Published message");
        Ok(())
    }

    fn attach(&self, name: &str, prefetch: u16) -> Result<(u64, Arc<Notify>), BusError> {
        self.ensure_open()?;
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(name)
            .ok_or_else(|| BusError::QueueNotFound(name.to_string()))?;
        let consumer_id = self.next_consumer.fetch_add(1, Ordering::Relaxed);
        queue.consumers.insert(
            consumer_id,
            ConsumerSlot {
                prefetch,
                in_flight: 0,
            },
        );
        debug!(queue = name, consumer_id, prefetch, "Consumer attached");
        Ok((consumer_id, queue.notify.clone()))
    }

    fn detach(&self, name: &str, consumer_id: u64) {
        let mut queues = self.queues.lock();
        let Some(queue) = queues.get_mut(name) else {
            return;
        };
        let returned = queue.return_unacked(|o| o.consumer_id == consumer_id);
        queue.consumers.remove(&consumer_id);
        if returned > 0 {
            queue.notify.notify_waiters();
        }
        debug!(queue = name, consumer_id, returned, "Consumer detached");
    }

    fn poll(&self, name: &str, consumer_id: u64) -> Result<Poll, BusError> {
        self.ensure_open()?;
        let mut queues = self.queues.lock();
        let Some(queue) = queues.get_mut(name) else {
            return Ok(Poll::Ended);
        };
        let Some(slot) = queue.consumers.get_mut(&consumer_id) else {
            return Ok(Poll::Ended);
        };
        if !slot.has_capacity() {
            return Ok(Poll::Empty);
        }
        let Some(mut pending) = queue.ready.pop_front() else {
            return Ok(Poll::Empty);
        };
        slot.in_flight += 1;
        pending.deliveries += 1;
        let delivery_tag = self.next_tag.fetch_add(1, Ordering::Relaxed);
        let message = pending.message.clone();
        let attempt = pending.deliveries;
        queue.unacked.insert(
            delivery_tag,
            Outstanding {
                consumer_id,
                pending,
            },
        );
        queue.stats.delivered += 1;
        Ok(Poll::Ready {
            message,
            delivery_tag,
            attempt,
        })
    }

    fn settle(&self, name: &str, delivery_tag: u64, settle: Settle) -> Result<(), BusError> {
        self.ensure_open()?;
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(name)
            .ok_or(BusError::UnknownDeliveryTag(delivery_tag))?;
        let outstanding = queue
            .unacked
            .remove(&delivery_tag)
            .ok_or(BusError::UnknownDeliveryTag(delivery_tag))?;
        if let Some(slot) = queue.consumers.get_mut(&outstanding.consumer_id) {
            slot.in_flight = slot.in_flight.saturating_sub(1);
        }
        queue.notify.notify_waiters();

        let dead_letter = match settle {
            Settle::Ack => {
                queue.stats.acked += 1;
                None
            }
            Settle::Requeue => {
                queue.stats.requeued += 1;
                queue.ready.push_front(outstanding.pending);
                None
            }
            Settle::Reject => {
                queue.stats.rejected += 1;
                Some((queue.options.dead_letter.clone(), outstanding.pending.message))
            }
        };

        match dead_letter {
            Some((Some(dlq), message)) => match queues.get_mut(&dlq) {
                Some(target) => {
                    target.ready.push_back(Pending {
                        message: message.with_header(DEATH_QUEUE_HEADER, name),
                        deliveries: 0,
                    });
                    target.stats.published += 1;
                    target.notify.notify_waiters();
                    debug!(queue = name, dead_letter = %dlq, delivery_tag, "Dead-lettered delivery");
                }
                None => {
                    warn!(queue = name, dead_letter = %dlq, delivery_tag, "Dead-letter queue missing, dropping delivery");
                }
            },
            Some((None, _)) => {
                debug!(queue = name, delivery_tag, "Rejected delivery dropped");
            }
            None => {}
        }
        Ok(())
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut queues = self.queues.lock();
        for queue in queues.values_mut() {
            queue.return_unacked(|_| true);
            queue.notify.notify_waiters();
        }
        warn!("Bus connection closed");
    }
}

/// In-process message broker
///
/// Clones share the same broker, so a clone handed to a server and another
/// handed to a caller talk to the same queues.
#[derive(Clone)]
pub struct InMemoryBus {
    broker: Arc<Broker>,
}

impl InMemoryBus {
    /// Create an empty broker
    pub fn new() -> Self {
        Self {
            broker: Arc::new(Broker {
                queues: Mutex::new(HashMap::new()),
                closed: AtomicBool::new(false),
                next_tag: AtomicU64::new(1),
                next_consumer: AtomicU64::new(1),
            }),
        }
    }

    /// Drop the connection: consumers and publishers fail with
    /// [`BusError::ConnectionClosed`] and unsettled deliveries return to
    /// their queues
    pub fn close(&self) {
        self.broker.close();
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.broker.closed.load(Ordering::Acquire)
    }

    /// Statistics for a queue, if it exists
    pub fn queue_stats(&self, name: &str) -> Option<QueueStats> {
        let queues = self.broker.queues.lock();
        queues.get(name).map(|queue| QueueStats {
            ready: queue.ready.len(),
            unacked: queue.unacked.len(),
            consumers: queue.consumers.len(),
            ..queue.stats
        })
    }

    /// Whether a queue exists
    pub fn has_queue(&self, name: &str) -> bool {
        self.broker.queues.lock().contains_key(name)
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn declare_queue(&self, name: &str, options: QueueOptions) -> Result<(), BusError> {
        self.broker.declare(name, options)
    }

    async fn declare_private_queue(&self) -> Result<String, BusError> {
        let name = format!("amq.gen-{}", uuid::Uuid::new_v4().simple());
        self.broker.declare(&name, QueueOptions::default())?;
        Ok(name)
    }

    async fn delete_queue(&self, name: &str) -> Result<(), BusError> {
        self.broker.delete(name)
    }

    async fn publish(&self, address: &str, message: WireMessage) -> Result<(), BusError> {
        self.broker.publish(address, message)
    }

    async fn consume(&self, queue: &str, prefetch: u16) -> Result<Box<dyn Consumer>, BusError> {
        let (consumer_id, notify) = self.broker.attach(queue, prefetch)?;
        Ok(Box::new(MemoryConsumer {
            broker: self.broker.clone(),
            queue: queue.to_string(),
            consumer_id,
            notify,
            acker: Arc::new(MemoryAcker {
                broker: self.broker.clone(),
                queue: queue.to_string(),
            }),
        }))
    }
}

struct MemoryConsumer {
    broker: Arc<Broker>,
    queue: String,
    consumer_id: u64,
    notify: Arc<Notify>,
    acker: Arc<dyn Acknowledger>,
}

#[async_trait]
impl Consumer for MemoryConsumer {
    async fn next_delivery(&mut self) -> Result<Option<Delivery>, BusError> {
        loop {
            let mut notified = std::pin::pin!(self.notify.notified());
            notified.as_mut().enable();

            match self.broker.poll(&self.queue, self.consumer_id)? {
                Poll::Ready {
                    message,
                    delivery_tag,
                    attempt,
                } => {
                    return Ok(Some(Delivery::new(
                        message,
                        delivery_tag,
                        attempt,
                        self.acker.clone(),
                    )));
                }
                Poll::Ended => return Ok(None),
                Poll::Empty => notified.await,
            }
        }
    }
}

impl Drop for MemoryConsumer {
    fn drop(&mut self) {
        self.broker.detach(&self.queue, self.consumer_id);
    }
}

struct MemoryAcker {
    broker: Arc<Broker>,
    queue: String,
}

#[async_trait]
impl Acknowledger for MemoryAcker {
    async fn ack(&self, delivery_tag: u64) -> Result<(), BusError> {
        self.broker.settle(&self.queue, delivery_tag, Settle::Ack)
    }

    async fn requeue(&self, delivery_tag: u64) -> Result<(), BusError> {
        self.broker.settle(&self.queue, delivery_tag, Settle::Requeue)
    }

    async fn reject(&self, delivery_tag: u64) -> Result<(), BusError> {
        self.broker.settle(&self.queue, delivery_tag, Settle::Reject)
    }
}

#[cfg(test)]
#[path = "memory/memory_tests.rs"]
mod memory_tests;
