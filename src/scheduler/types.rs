//! Scheduled actions and their ordering.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::types::{ClientIndex, ContentId, NodeId, SimTime};

/// Submission sequence number; breaks ties between same-time events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub u64);

/// Payloads the timeline can submit to the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Ask a client application to flood a request for `content`
    FloodRequest {
        client: ClientIndex,
        /// Access node hosting the client application
        node: NodeId,
        content: ContentId,
        hop_limit: u8,
    },
    /// Withdraw a forwarding entry, optionally only the face toward `face`
    RemoveRoute {
        node: NodeId,
        prefix: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        face: Option<NodeId>,
    },
    /// Take the link between two nodes down
    FailLink { a: NodeId, b: NodeId },
}

impl Action {
    /// Short label used in logs and reports
    pub fn kind(&self) -> &'static str {
        match self {
            Action::FloodRequest { .. } => "flood_request",
            Action::RemoveRoute { .. } => "remove_route",
            Action::FailLink { .. } => "fail_link",
        }
    }
}

/// An action bound to the instant it fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub time: SimTime,
    pub id: EventId,
    pub action: Action,
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed so that BinaryHeap (a max-heap) pops the earliest event first,
// and the first submitted among events sharing a timestamp.
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.time.cmp(&self.time) {
            Ordering::Equal => other.id.cmp(&self.id),
            ord => ord,
        }
    }
}
