//! Network collaborators.
//!
//! The timeline never touches the network directly: it submits actions,
//! and the scheduler later dispatches them into implementations of the
//! traits in [`traits`]. [`SimulatedNetwork`] is the in-memory substrate
//! used by the binary and the tests.

pub mod app;
pub mod simulated;
pub mod traits;

pub use app::{content_name, ConsumerApp, IssuedRequest};
pub use simulated::{DispatchStats, SimulatedNetwork};
pub use traits::{LinkControl, RouteMutation, RoutingCollaborator, StackInstaller, SupportsFloodRequest};

use crate::types::{ClientIndex, NodeId};

/// Collaborator failures; all are fatal to the run
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    #[error("No application installed for client {0}")]
    UnknownClient(ClientIndex),
    #[error("No route for {prefix} at node {node} (face {face:?})")]
    RouteNotFound {
        node: NodeId,
        prefix: String,
        face: Option<NodeId>,
    },
    #[error("No link between {a} and {b}")]
    LinkNotFound { a: NodeId, b: NodeId },
    #[error("Invalid hop limit {0}")]
    InvalidHopLimit(u8),
    #[error("Network setup failed: {0}")]
    Setup(String),
}
