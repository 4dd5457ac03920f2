//! Access node attachment.
//!
//! Every infrastructure router `i` gets one access node `i + n`, where `n`
//! is the number of routers. The access nodes of routers `0..n-1` host
//! the client applications; the access node of the last router hosts the
//! producer.

use std::collections::BTreeMap;

use super::TopologyError;
use crate::types::{ClientIndex, NodeId};

/// Bijection between applications, access nodes and upstream routers
#[derive(Debug, Clone, PartialEq)]
pub struct AccessMap {
    num_infrastructure: usize,
    app_to_node: BTreeMap<usize, NodeId>,
    access_to_router: BTreeMap<NodeId, NodeId>,
}

impl AccessMap {
    /// Attach one access node per infrastructure router.
    ///
    /// At least two routers are needed: one for the producer and one for a
    /// client.
    pub fn attach(num_infrastructure: usize) -> Result<Self, TopologyError> {
        if num_infrastructure < 2 {
            return Err(TopologyError::Invalid(format!(
                "need at least 2 infrastructure nodes to attach a producer and a client, got {}",
                num_infrastructure
            )));
        }

        let mut app_to_node = BTreeMap::new();
        let mut access_to_router = BTreeMap::new();
        for i in 0..num_infrastructure {
            app_to_node.insert(i, NodeId(i + num_infrastructure));
            access_to_router.insert(NodeId(i + num_infrastructure), NodeId(i));
        }

        Ok(Self {
            num_infrastructure,
            app_to_node,
            access_to_router,
        })
    }

    pub fn num_infrastructure(&self) -> usize {
        self.num_infrastructure
    }

    /// Infrastructure plus access nodes
    pub fn total_nodes(&self) -> usize {
        2 * self.num_infrastructure
    }

    /// Number of request-issuing clients (every app but the producer)
    pub fn num_clients(&self) -> usize {
        self.num_infrastructure - 1
    }

    pub fn infrastructure_nodes(&self) -> impl Iterator<Item = NodeId> {
        (0..self.num_infrastructure).map(NodeId)
    }

    pub fn client_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.num_clients()).map(move |i| self.app_to_node[&i])
    }

    /// Access node hosting an application
    pub fn app_node(&self, app: usize) -> Option<NodeId> {
        self.app_to_node.get(&app).copied()
    }

    /// Router an access node hangs off
    pub fn router_of(&self, access: NodeId) -> Option<NodeId> {
        self.access_to_router.get(&access).copied()
    }

    /// Access node of a client
    pub fn client_node(&self, client: ClientIndex) -> NodeId {
        assert!(client.0 < self.num_clients(), "client {} out of range", client);
        self.app_to_node[&client.0]
    }

    /// Upstream router of a client
    pub fn client_router(&self, client: ClientIndex) -> NodeId {
        self.access_to_router[&self.client_node(client)]
    }

    pub fn producer_node(&self) -> NodeId {
        self.app_to_node[&(self.num_infrastructure - 1)]
    }

    pub fn producer_router(&self) -> NodeId {
        self.access_to_router[&self.producer_node()]
    }

    /// Point-to-point links between each router and its access node
    pub fn access_links(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.access_to_router.iter().map(|(access, router)| (*router, *access))
    }
}
