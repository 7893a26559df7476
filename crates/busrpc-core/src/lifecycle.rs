//! Per-delivery state machine followed by the server loop

use serde::{Deserialize, Serialize};

/// Processing states of one inbound delivery
///
/// State transitions:
/// ```text
/// Received → Decoded → Translated → Dispatched → Published → Acknowledged
///     │         │                    ▲   │
///     │         └────────────────────┘   │ (request not built, error response)
///     └──→ Rejected ←────────────────────┤ (publish failed, attempts exhausted)
///                                        └──→ Requeued (publish failed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Delivery taken from the request address
    #[default]
    Received,
    /// Envelope decoded and validated
    Decoded,
    /// Structured request built
    Translated,
    /// Handler pipeline produced a response (success or error)
    Dispatched,
    /// Response published to the reply address
    Published,
    /// Inbound delivery acknowledged
    Acknowledged,
    /// Delivery rejected or dead-lettered
    Rejected,
    /// Delivery left unacknowledged and handed back for redelivery
    Requeued,
}

impl DeliveryState {
    /// Check if this state can transition to the target state
    pub fn can_transition_to(&self, target: DeliveryState) -> bool {
        use DeliveryState::*;
        matches!(
            (self, target),
            (Received, Decoded)
                | (Decoded, Translated)
                | (Translated, Dispatched)
                | (Dispatched, Published)
                | (Published, Acknowledged)
                // Request could not be built; an error response stands in
                | (Decoded, Dispatched)
                // Malformed envelope
                | (Received, Rejected)
                // Publish failure
                | (Dispatched, Requeued)
                | (Dispatched, Rejected)
        )
    }

    /// Check if processing of the delivery is finished
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliveryState::Acknowledged | DeliveryState::Rejected | DeliveryState::Requeued
        )
    }

    /// Check if the delivery completed the full protocol
    pub fn is_completed(&self) -> bool {
        matches!(self, DeliveryState::Acknowledged)
    }

    /// Get a human-readable description of this state
    pub fn description(&self) -> &'static str {
        match self {
            DeliveryState::Received => "Delivery received from the request address",
            DeliveryState::Decoded => "Envelope decoded",
            DeliveryState::Translated => "Structured request built",
            DeliveryState::Dispatched => "Handler produced a response",
            DeliveryState::Published => "Response published to the caller",
            DeliveryState::Acknowledged => "Delivery acknowledged",
            DeliveryState::Rejected => "Delivery rejected",
            DeliveryState::Requeued => "Delivery released for redelivery",
        }
    }
}

impl std::fmt::Display for DeliveryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryState::Received => write!(f, "Received"),
            DeliveryState::Decoded => write!(f, "Decoded"),
            DeliveryState::Translated => write!(f, "Translated"),
            DeliveryState::Dispatched => write!(f, "Dispatched"),
            DeliveryState::Published => write!(f, "Published"),
            DeliveryState::Acknowledged => write!(f, "Acknowledged"),
            DeliveryState::Rejected => write!(f, "Rejected"),
            DeliveryState::Requeued => write!(f, "Requeued"),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle/lifecycle_tests.rs"]
mod lifecycle_tests;
