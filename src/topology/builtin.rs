//! Built-in grid topology.
//!
//! A 3x3 router grid with one extra gateway router hanging off the corner
//! node. The gateway is the last infrastructure node, so the producer's
//! access node attaches behind it.

use log::warn;

use super::reader::parse_annotated;
use super::types::NodeSet;
use super::{TopologyError, TopologyProvider};

pub const GRID_3X3_PRODUCER_ATTACHED: &str = r#"
router
# node   comment   yPos   xPos
Node0    NA        3      1
Node1    NA        3      2
Node2    NA        3      3
Node3    NA        2      1
Node4    NA        2      2
Node5    NA        2      3
Node6    NA        1      1
Node7    NA        1      2
Node8    NA        1      3
Node9    NA        0      4

link
# srcNode  dstNode  bandwidth  metric  delay  queue
Node0      Node1    1Mbps      1       10ms   10
Node0      Node3    1Mbps      1       10ms   10
Node1      Node2    1Mbps      1       10ms   10
Node1      Node4    1Mbps      1       10ms   10
Node2      Node5    1Mbps      1       10ms   10
Node3      Node4    1Mbps      1       10ms   10
Node3      Node6    1Mbps      1       10ms   10
Node4      Node5    1Mbps      1       10ms   10
Node4      Node7    1Mbps      1       10ms   10
Node5      Node8    1Mbps      1       10ms   10
Node6      Node7    1Mbps      1       10ms   10
Node7      Node8    1Mbps      1       10ms   10
Node8      Node9    1Mbps      1       10ms   10
"#;

/// [`TopologyProvider`] for the fixed grid
#[derive(Debug, Clone, Default)]
pub struct BuiltinTopology {
    ignored_file: Option<String>,
}

impl BuiltinTopology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the legacy behaviour of accepting a topology file argument
    /// while reading the built-in grid regardless
    pub fn ignoring(topology_file: impl Into<String>) -> Self {
        Self {
            ignored_file: Some(topology_file.into()),
        }
    }
}

impl TopologyProvider for BuiltinTopology {
    fn read(&self) -> Result<NodeSet, TopologyError> {
        if let Some(file) = &self.ignored_file {
            warn!("Built-in topology selected, ignoring topology_file '{}'", file);
        }
        parse_annotated(GRID_3X3_PRODUCER_ATTACHED)
    }
}
