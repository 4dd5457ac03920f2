//! In-memory network substrate.
//!
//! Keeps just enough state to make the timeline's actions observable:
//! link up/down flags, per-node content store capacity, and a forwarding
//! table of `prefix -> next-hop faces` per node. A dispatched flood request
//! teaches the client's upstream router a per-content route toward the
//! requesting access node; scoped withdrawals later remove that face.

use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::app::content_name;
use super::traits::{LinkControl, RouteMutation, RoutingCollaborator, StackInstaller, SupportsFloodRequest};
use super::NetworkError;
use crate::scheduler::{Action, ActionDispatcher};
use crate::topology::{AccessMap, NodeSet};
use crate::types::{ClientIndex, ContentId, NodeId, SimTime};

/// Counters of dispatched actions
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DispatchStats {
    pub flood_requests: u64,
    pub routes_removed: u64,
    pub links_failed: u64,
    pub requests_per_client: Vec<u64>,
}

/// Network substrate implementing every collaborator trait
pub struct SimulatedNetwork {
    access: AccessMap,
    prefix: String,
    /// Keyed by endpoints in ascending order; value is the up flag
    links: BTreeMap<(NodeId, NodeId), bool>,
    cache_capacity: BTreeMap<NodeId, u32>,
    strategy: Option<String>,
    origins: BTreeMap<String, BTreeSet<NodeId>>,
    fib: BTreeMap<NodeId, BTreeMap<String, BTreeSet<NodeId>>>,
    apps: Vec<Option<Box<dyn SupportsFloodRequest>>>,
    stats: DispatchStats,
}

fn link_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl SimulatedNetwork {
    /// Wire the infrastructure links plus one link per access node
    pub fn build(topology: &NodeSet, access: AccessMap, prefix: impl Into<String>) -> Result<Self, NetworkError> {
        if topology.len() != access.num_infrastructure() {
            return Err(NetworkError::Setup(format!(
                "access map built for {} routers but topology has {}",
                access.num_infrastructure(),
                topology.len()
            )));
        }

        let mut links = BTreeMap::new();
        for link in &topology.links {
            links.insert(link_key(link.source, link.target), true);
        }
        for (router, node) in access.access_links() {
            links.insert(link_key(router, node), true);
        }
        let num_clients = access.num_clients();

        Ok(Self {
            access,
            prefix: prefix.into(),
            links,
            cache_capacity: BTreeMap::new(),
            strategy: None,
            origins: BTreeMap::new(),
            fib: BTreeMap::new(),
            apps: (0..num_clients).map(|_| None).collect(),
            stats: DispatchStats {
                requests_per_client: vec![0; num_clients],
                ..Default::default()
            },
        })
    }

    pub fn access(&self) -> &AccessMap {
        &self.access
    }

    /// Install the application of a client
    pub fn install_app(&mut self, client: ClientIndex, app: Box<dyn SupportsFloodRequest>) -> Result<(), NetworkError> {
        let slot = self.apps.get_mut(client.0).ok_or(NetworkError::UnknownClient(client))?;
        *slot = Some(app);
        Ok(())
    }

    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    pub fn strategy(&self) -> Option<&str> {
        self.strategy.as_deref()
    }

    pub fn cache_capacity(&self, node: NodeId) -> Option<u32> {
        self.cache_capacity.get(&node).copied()
    }

    pub fn is_link_up(&self, a: NodeId, b: NodeId) -> Option<bool> {
        self.links.get(&link_key(a, b)).copied()
    }

    /// Next-hop faces of `prefix` at `node`
    pub fn next_hops(&self, node: NodeId, prefix: &str) -> Option<&BTreeSet<NodeId>> {
        self.fib.get(&node).and_then(|table| table.get(prefix))
    }

    pub fn has_route(&self, node: NodeId, prefix: &str) -> bool {
        self.next_hops(node, prefix).is_some()
    }

    fn check_node(&self, node: NodeId) -> Result<(), NetworkError> {
        if node.0 < self.access.total_nodes() {
            Ok(())
        } else {
            Err(NetworkError::UnknownNode(node))
        }
    }

    fn up_neighbors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.links.iter().filter_map(move |(&(a, b), &up)| match (up, a == node, b == node) {
            (true, true, _) => Some(b),
            (true, _, true) => Some(a),
            _ => None,
        })
    }

    fn flood(&mut self, client: ClientIndex, node: NodeId, content: ContentId, hop_limit: u8) -> Result<(), NetworkError> {
        if client.0 >= self.access.num_clients() {
            return Err(NetworkError::UnknownClient(client));
        }
        if self.access.client_node(client) != node {
            return Err(NetworkError::Setup(format!(
                "client {} is not hosted on node {}",
                client, node
            )));
        }
        let app = self
            .apps
            .get_mut(client.0)
            .and_then(Option::as_mut)
            .ok_or(NetworkError::UnknownClient(client))?;
        app.flood_request(content, hop_limit)?;

        // The upstream router learns where this content is being consumed.
        let router = self.access.client_router(client);
        self.fib
            .entry(router)
            .or_default()
            .entry(content_name(&self.prefix, content))
            .or_default()
            .insert(node);

        self.stats.flood_requests += 1;
        self.stats.requests_per_client[client.0] += 1;
        Ok(())
    }
}

impl StackInstaller for SimulatedNetwork {
    fn install(&mut self, nodes: &[NodeId], cache_capacity: u32) -> Result<(), NetworkError> {
        for &node in nodes {
            self.check_node(node)?;
            self.cache_capacity.insert(node, cache_capacity);
        }
        debug!("Installed stack on {} nodes with cache capacity {}", nodes.len(), cache_capacity);
        Ok(())
    }
}

impl RoutingCollaborator for SimulatedNetwork {
    fn install_default_strategy(&mut self, name: &str) {
        info!("Installing forwarding strategy {}", name);
        self.strategy = Some(name.to_string());
    }

    fn add_origin(&mut self, prefix: &str, node: NodeId) -> Result<(), NetworkError> {
        self.check_node(node)?;
        self.origins.entry(prefix.to_string()).or_default().insert(node);
        Ok(())
    }

    fn compute_routes(&mut self) -> Result<usize, NetworkError> {
        let mut installed = 0;
        let origins = self.origins.clone();

        for (prefix, sources) in &origins {
            for table in self.fib.values_mut() {
                table.remove(prefix);
            }

            // Multi-source BFS; each reached node points at its BFS parent.
            let mut visited: BTreeSet<NodeId> = sources.clone();
            let mut frontier: VecDeque<NodeId> = sources.iter().copied().collect();
            while let Some(node) = frontier.pop_front() {
                let neighbors: Vec<NodeId> = self.up_neighbors(node).collect();
                for next in neighbors {
                    if visited.insert(next) {
                        self.fib
                            .entry(next)
                            .or_default()
                            .entry(prefix.clone())
                            .or_default()
                            .insert(node);
                        installed += 1;
                        frontier.push_back(next);
                    }
                }
            }

            let unreachable = self.access.total_nodes() - visited.len();
            if unreachable > 0 {
                warn!("{} nodes cannot reach an origin of {}", unreachable, prefix);
            }
        }

        info!("Installed {} forwarding entries", installed);
        Ok(installed)
    }
}

impl RouteMutation for SimulatedNetwork {
    fn remove_route(&mut self, node: NodeId, prefix: &str, face: Option<NodeId>) -> Result<(), NetworkError> {
        self.check_node(node)?;
        let not_found = || NetworkError::RouteNotFound {
            node,
            prefix: prefix.to_string(),
            face,
        };
        let table = self.fib.get_mut(&node).ok_or_else(not_found)?;

        match face {
            None => {
                table.remove(prefix).ok_or_else(not_found)?;
            }
            Some(face) => {
                let faces = table.get_mut(prefix).ok_or_else(not_found)?;
                if !faces.remove(&face) {
                    return Err(not_found());
                }
                if faces.is_empty() {
                    table.remove(prefix);
                }
            }
        }

        self.stats.routes_removed += 1;
        Ok(())
    }
}

impl LinkControl for SimulatedNetwork {
    fn fail_link(&mut self, a: NodeId, b: NodeId) -> Result<(), NetworkError> {
        let up = self.links.get_mut(&link_key(a, b)).ok_or(NetworkError::LinkNotFound { a, b })?;
        if !*up {
            warn!("Link {} - {} is already down", a, b);
        }
        *up = false;
        self.stats.links_failed += 1;
        Ok(())
    }

    fn restore_link(&mut self, a: NodeId, b: NodeId) -> Result<(), NetworkError> {
        let up = self.links.get_mut(&link_key(a, b)).ok_or(NetworkError::LinkNotFound { a, b })?;
        *up = true;
        Ok(())
    }
}

impl ActionDispatcher for SimulatedNetwork {
    fn dispatch(
        &mut self,
        at: SimTime,
        action: &Action,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        match action {
            Action::FloodRequest { client, node, content, hop_limit } => {
                self.flood(*client, *node, *content, *hop_limit)?;
            }
            Action::RemoveRoute { node, prefix, face } => {
                debug!("t={} remove {} at node {} (face {:?})", at, prefix, node, face);
                self.remove_route(*node, prefix, *face)?;
            }
            Action::FailLink { a, b } => {
                info!("t={} failing link {} - {}", at, a, b);
                self.fail_link(*a, *b)?;
            }
        }
        Ok(())
    }
}
