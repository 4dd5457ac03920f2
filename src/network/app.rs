//! Consumer application installed on client access nodes.

use log::debug;

use super::traits::SupportsFloodRequest;
use super::NetworkError;
use crate::types::{ContentId, NodeId};

/// One flood request as seen by the application
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedRequest {
    pub name: String,
    pub hop_limit: u8,
}

/// Client application that floods requests under a prefix
#[derive(Debug, Clone)]
pub struct ConsumerApp {
    node: NodeId,
    prefix: String,
    issued: Vec<IssuedRequest>,
}

impl ConsumerApp {
    pub fn new(node: NodeId, prefix: impl Into<String>) -> Self {
        Self {
            node,
            prefix: prefix.into(),
            issued: Vec::new(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn issued(&self) -> &[IssuedRequest] {
        &self.issued
    }
}

impl SupportsFloodRequest for ConsumerApp {
    fn flood_request(&mut self, content: ContentId, hop_limit: u8) -> Result<(), NetworkError> {
        if hop_limit == 0 {
            return Err(NetworkError::InvalidHopLimit(hop_limit));
        }
        let name = content_name(&self.prefix, content);
        debug!("node {} floods {} with hop limit {}", self.node, name, hop_limit);
        self.issued.push(IssuedRequest { name, hop_limit });
        Ok(())
    }
}

/// Name of a catalog item under the shared prefix
pub fn content_name(prefix: &str, content: ContentId) -> String {
    format!("{}/{}", prefix.trim_end_matches('/'), content.0)
}
