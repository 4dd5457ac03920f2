//! Collaborator contracts consumed by the orchestrator and the dispatcher.

use super::NetworkError;
use crate::types::{ContentId, NodeId};

/// Installs the forwarding stack and a content store on nodes
pub trait StackInstaller {
    fn install(&mut self, nodes: &[NodeId], cache_capacity: u32) -> Result<(), NetworkError>;
}

/// Route computation, called once during setup
pub trait RoutingCollaborator {
    fn install_default_strategy(&mut self, name: &str);
    fn add_origin(&mut self, prefix: &str, node: NodeId) -> Result<(), NetworkError>;
    /// Returns the number of forwarding entries installed
    fn compute_routes(&mut self) -> Result<usize, NetworkError>;
}

/// Forwarding entry withdrawal; only ever invoked from a dispatched action
pub trait RouteMutation {
    /// Remove the entry for `prefix` at `node`, or only its face toward
    /// `face` when one is given
    fn remove_route(&mut self, node: NodeId, prefix: &str, face: Option<NodeId>) -> Result<(), NetworkError>;
}

/// Link state control; only ever invoked from a dispatched action
pub trait LinkControl {
    fn fail_link(&mut self, a: NodeId, b: NodeId) -> Result<(), NetworkError>;
    fn restore_link(&mut self, a: NodeId, b: NodeId) -> Result<(), NetworkError>;
}

/// Capability of a client application to flood a request
pub trait SupportsFloodRequest {
    fn flood_request(&mut self, content: ContentId, hop_limit: u8) -> Result<(), NetworkError>;
}
