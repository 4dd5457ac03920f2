//! Topology type definitions.
//!
//! A [`NodeSet`] is the infrastructure graph handed over by a topology
//! provider: named router nodes and the point-to-point links between them.

use std::collections::{HashMap, HashSet};

use crate::types::NodeId;

/// Represents a router in the infrastructure topology
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyNode {
    pub name: String,
    /// Free-form annotation (city or region column)
    pub comment: Option<String>,
    /// Layout coordinates, kept for visualisation tools
    pub position: Option<(f64, f64)>,
}

/// Represents a point-to-point link between two routers
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyLink {
    pub source: NodeId,
    pub target: NodeId,
    /// Capacity in bits per second
    pub bandwidth_bps: Option<u64>,
    /// Routing metric
    pub metric: Option<u32>,
    /// Propagation delay in seconds
    pub delay_secs: Option<f64>,
    /// Queue size in packets
    pub queue: Option<u32>,
}

impl TopologyLink {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            bandwidth_bps: None,
            metric: None,
            delay_secs: None,
            queue: None,
        }
    }

    /// Link endpoints in ascending order
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }
}

/// Infrastructure nodes and their interconnection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeSet {
    pub nodes: Vec<TopologyNode>,
    pub links: Vec<TopologyLink>,
}

impl NodeSet {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Index of a node by name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    /// Structural checks run after every read
    pub fn validate(&self) -> Result<(), String> {
        let mut names = HashSet::new();
        for node in &self.nodes {
            if !names.insert(node.name.as_str()) {
                return Err(format!("Duplicate node name: {}", node.name));
            }
        }

        let mut seen = HashSet::new();
        for link in &self.links {
            for end in [link.source, link.target] {
                if end.0 >= self.nodes.len() {
                    return Err(format!("Link references non-existent node index {}", end));
                }
            }
            if link.source == link.target {
                return Err(format!("Self-loop on node {}", self.nodes[link.source.0].name));
            }
            if !seen.insert(link.endpoints()) {
                let (a, b) = link.endpoints();
                return Err(format!(
                    "Duplicate link between {} and {}",
                    self.nodes[a.0].name, self.nodes[b.0].name
                ));
            }
        }

        if self.nodes.len() > 1 && self.links.is_empty() {
            return Err("Topology has multiple nodes but no links - network is disconnected".to_string());
        }

        let unreachable: Vec<&str> = self
            .unreachable_from(NodeId(0))
            .into_iter()
            .map(|id| self.nodes[id.0].name.as_str())
            .collect();
        if !unreachable.is_empty() {
            return Err(format!(
                "Topology is disconnected: {} cannot reach {}",
                unreachable.join(", "),
                self.nodes[0].name
            ));
        }

        Ok(())
    }

    /// Nodes with no path to `start`, in index order
    fn unreachable_from(&self, start: NodeId) -> Vec<NodeId> {
        if start.0 >= self.nodes.len() {
            return Vec::new();
        }
        let adjacency = self.adjacency();
        let mut reached = HashSet::from([start]);
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            for next in adjacency.get(&node).into_iter().flatten() {
                if reached.insert(*next) {
                    stack.push(*next);
                }
            }
        }
        (0..self.nodes.len()).map(NodeId).filter(|id| !reached.contains(id)).collect()
    }

    /// Adjacency lists, one per node
    pub fn adjacency(&self) -> HashMap<NodeId, Vec<NodeId>> {
        let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for link in &self.links {
            adjacency.entry(link.source).or_default().push(link.target);
            adjacency.entry(link.target).or_default().push(link.source);
        }
        adjacency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> TopologyNode {
        TopologyNode {
            name: name.to_string(),
            comment: None,
            position: None,
        }
    }

    #[test]
    fn test_validate_detects_duplicate_links() {
        let set = NodeSet {
            nodes: vec![node("A"), node("B")],
            links: vec![
                TopologyLink::new(NodeId(0), NodeId(1)),
                TopologyLink::new(NodeId(1), NodeId(0)),
            ],
        };
        assert!(set.validate().unwrap_err().contains("Duplicate link"));
    }

    #[test]
    fn test_validate_detects_disconnected_graph() {
        let set = NodeSet {
            nodes: vec![node("A"), node("B")],
            links: vec![],
        };
        assert!(set.validate().is_err());
    }

    #[test]
    fn test_validate_detects_isolated_island() {
        // A-B and C-D are linked, but nothing joins the two pairs.
        let set = NodeSet {
            nodes: vec![node("A"), node("B"), node("C"), node("D")],
            links: vec![
                TopologyLink::new(NodeId(0), NodeId(1)),
                TopologyLink::new(NodeId(2), NodeId(3)),
            ],
        };
        let err = set.validate().unwrap_err();
        assert!(err.contains("disconnected"), "{}", err);
        assert!(err.contains("C, D"), "{}", err);
    }

    #[test]
    fn test_node_lookup_and_adjacency() {
        let set = NodeSet {
            nodes: vec![node("A"), node("B"), node("C")],
            links: vec![
                TopologyLink::new(NodeId(0), NodeId(1)),
                TopologyLink::new(NodeId(1), NodeId(2)),
            ],
        };
        assert!(set.validate().is_ok());
        assert_eq!(set.node_id("C"), Some(NodeId(2)));
        assert_eq!(set.node_id("D"), None);
        assert_eq!(set.adjacency()[&NodeId(1)], vec![NodeId(0), NodeId(2)]);
    }
}
