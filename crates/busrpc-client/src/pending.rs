//! Outstanding-call bookkeeping

use busrpc_core::{RpcError, RpcResult};
use busrpc_transport::ResponseEnvelope;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::Instant;

struct PendingCall {
    sender: oneshot::Sender<ResponseEnvelope>,
    deadline: Instant,
}

/// Concurrent map from correlation ID to the slot awaiting its response
///
/// Every way out of the map goes through [`DashMap::remove`], so fulfillment
/// and cleanup race safely: whichever removes the entry first wins and the
/// other becomes a no-op.
#[derive(Default)]
pub struct PendingCalls {
    calls: DashMap<String, PendingCall>,
}

impl PendingCalls {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call before its request is published
    ///
    /// The returned guard removes the entry when dropped, so an abandoned or
    /// timed-out call never leaks its slot.
    pub fn register(
        self: &Arc<Self>,
        correlation_id: impl Into<String>,
        deadline: Instant,
    ) -> RpcResult<(PendingGuard, oneshot::Receiver<ResponseEnvelope>)> {
        let correlation_id = correlation_id.into();
        let (sender, receiver) = oneshot::channel();
        match self.calls.entry(correlation_id.clone()) {
            Entry::Occupied(_) => {
                return Err(RpcError::InvalidState {
                    expected: "unique correlation id".to_string(),
                    actual: format!("{} already outstanding", correlation_id),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(PendingCall { sender, deadline });
            }
        }
        Ok((
            PendingGuard {
                calls: self.clone(),
                correlation_id,
            },
            receiver,
        ))
    }

    /// Hand a response to the call waiting for it
    ///
    /// Returns `false` when no call is waiting (late or foreign response) or
    /// the caller has already given up.
    pub fn fulfill(&self, response: ResponseEnvelope) -> bool {
        match self.calls.remove(&response.correlation_id) {
            Some((_, call)) => call.sender.send(response).is_ok(),
            None => false,
        }
    }

    /// Forget a call; returns whether it was still outstanding
    pub fn remove(&self, correlation_id: &str) -> bool {
        self.calls.remove(correlation_id).is_some()
    }

    /// Drop every outstanding call, waking each waiter with a closed channel
    pub fn fail_all(&self) -> usize {
        let ids: Vec<String> = self.calls.iter().map(|e| e.key().clone()).collect();
        ids.iter().filter(|id| self.remove(id)).count()
    }

    /// Drop calls whose deadline has passed
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.calls.len();
        self.calls.retain(|_, call| call.deadline > now);
        before.saturating_sub(self.calls.len())
    }

    /// Deadline of an outstanding call
    pub fn deadline(&self, correlation_id: &str) -> Option<Instant> {
        self.calls.get(correlation_id).map(|call| call.deadline)
    }

    /// Whether a call is outstanding
    pub fn contains(&self, correlation_id: &str) -> bool {
        self.calls.contains_key(correlation_id)
    }

    /// Number of outstanding calls
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no call is outstanding
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Removes its call from [`PendingCalls`] when dropped
pub struct PendingGuard {
    calls: Arc<PendingCalls>,
    correlation_id: String,
}

impl PendingGuard {
    /// Correlation ID of the guarded call
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.calls.remove(&self.correlation_id);
    }
}
