//! Network topology module.
//!
//! This module contains the topology providers (annotated file reader and
//! the built-in grid), the infrastructure graph types, and the attachment
//! of access nodes for clients and the producer.

pub mod access;
pub mod builtin;
pub mod reader;
pub mod types;

use std::path::PathBuf;

// Re-export key types and functions for easier access
pub use access::AccessMap;
pub use builtin::BuiltinTopology;
pub use reader::{parse_annotated, AnnotatedTopologyReader};
pub use types::{NodeSet, TopologyLink, TopologyNode};

/// Source of the infrastructure graph
pub trait TopologyProvider {
    fn read(&self) -> Result<NodeSet, TopologyError>;
}

/// Errors raised while reading or attaching a topology; all are fatal
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("Failed to read topology file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Topology parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("Line {line} references unknown node '{name}'")]
    UnknownNode { line: usize, name: String },
    #[error("Topology contains no routers")]
    Empty,
    #[error("Invalid topology: {0}")]
    Invalid(String),
}
