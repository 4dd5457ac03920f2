//! Annotated topology reader.
//!
//! Reads the plain-text format used by the simulator's example topologies:
//!
//! ```text
//! router
//! # name   comment   y   x
//! Node0    NA        3   1
//! Node1    NA        3   2
//!
//! link
//! # src    dst       bandwidth  metric  delay  queue
//! Node0    Node1     1Mbps      1       10ms   20
//! ```
//!
//! Section headers are case-insensitive, `#` starts a comment, and every
//! column after the node name(s) is optional.

use log::{debug, info};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::types::{NodeSet, TopologyLink, TopologyNode};
use super::{TopologyError, TopologyProvider};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Routers,
    Links,
}

fn bandwidth_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)([KMG]?)bps$").expect("valid bandwidth regex"))
}

fn delay_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)(us|ms|s)$").expect("valid delay regex"))
}

/// Parse a bandwidth such as `10Mbps` into bits per second
pub fn parse_bandwidth(value: &str) -> Option<u64> {
    let caps = bandwidth_regex().captures(value.trim())?;
    let number: f64 = caps[1].parse().ok()?;
    let scale = match &caps[2] {
        "K" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        _ => 1.0,
    };
    Some((number * scale).round() as u64)
}

/// Parse a delay such as `10ms` into seconds
pub fn parse_delay(value: &str) -> Option<f64> {
    let caps = delay_regex().captures(value.trim())?;
    let number: f64 = caps[1].parse().ok()?;
    let scale = match &caps[2] {
        "us" => 1e-6,
        "ms" => 1e-3,
        _ => 1.0,
    };
    Some(number * scale)
}

/// Parse annotated topology text
pub fn parse_annotated(content: &str) -> Result<NodeSet, TopologyError> {
    let mut set = NodeSet::default();
    let mut section = Section::Preamble;

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        match line.to_ascii_lowercase().as_str() {
            "router" => {
                section = Section::Routers;
                continue;
            }
            "link" => {
                section = Section::Links;
                continue;
            }
            _ => {}
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        match section {
            Section::Preamble => {
                return Err(TopologyError::Parse {
                    line: line_no,
                    message: format!("entry '{}' before any 'router' or 'link' section", line),
                });
            }
            Section::Routers => set.nodes.push(parse_router(&fields, line_no)?),
            Section::Links => {
                let link = parse_link(&set, &fields, line_no)?;
                set.links.push(link);
            }
        }
    }

    if set.is_empty() {
        return Err(TopologyError::Empty);
    }
    set.validate().map_err(TopologyError::Invalid)?;

    debug!("Parsed topology with {} routers and {} links", set.nodes.len(), set.links.len());
    Ok(set)
}

fn parse_router(fields: &[&str], line: usize) -> Result<TopologyNode, TopologyError> {
    let position = match (fields.get(2), fields.get(3)) {
        (Some(y), Some(x)) => {
            let y: f64 = y.parse().map_err(|_| number_error(line, "y coordinate", y))?;
            let x: f64 = x.parse().map_err(|_| number_error(line, "x coordinate", x))?;
            Some((x, y))
        }
        _ => None,
    };

    Ok(TopologyNode {
        name: fields[0].to_string(),
        comment: fields.get(1).map(|c| c.to_string()),
        position,
    })
}

fn parse_link(set: &NodeSet, fields: &[&str], line: usize) -> Result<TopologyLink, TopologyError> {
    if fields.len() < 2 {
        return Err(TopologyError::Parse {
            line,
            message: "a link needs a source and a destination node".to_string(),
        });
    }
    let lookup = |name: &str| {
        set.node_id(name).ok_or_else(|| TopologyError::UnknownNode {
            line,
            name: name.to_string(),
        })
    };

    let mut link = TopologyLink::new(lookup(fields[0])?, lookup(fields[1])?);
    if let Some(value) = fields.get(2) {
        link.bandwidth_bps = Some(parse_bandwidth(value).ok_or_else(|| number_error(line, "bandwidth", value))?);
    }
    if let Some(value) = fields.get(3) {
        link.metric = Some(value.parse().map_err(|_| number_error(line, "metric", value))?);
    }
    if let Some(value) = fields.get(4) {
        link.delay_secs = Some(parse_delay(value).ok_or_else(|| number_error(line, "delay", value))?);
    }
    if let Some(value) = fields.get(5) {
        link.queue = Some(value.parse().map_err(|_| number_error(line, "queue size", value))?);
    }
    Ok(link)
}

fn number_error(line: usize, what: &str, value: &str) -> TopologyError {
    TopologyError::Parse {
        line,
        message: format!("invalid {} '{}'", what, value),
    }
}

/// File-backed [`TopologyProvider`]
#[derive(Debug, Clone)]
pub struct AnnotatedTopologyReader {
    path: PathBuf,
}

impl AnnotatedTopologyReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TopologyProvider for AnnotatedTopologyReader {
    fn read(&self) -> Result<NodeSet, TopologyError> {
        info!("Reading topology from {:?}", self.path);
        let content = fs::read_to_string(&self.path).map_err(|source| TopologyError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_annotated(&content)
    }
}
