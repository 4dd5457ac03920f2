//! Core identifiers and the simulated time type shared by every module.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Catalog item identifier in `[0, num_contents)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentId(pub u32);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a request-issuing client application.
///
/// The producer application is never a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClientIndex(pub usize);

impl fmt::Display for ClientIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a node in the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulated time in seconds.
///
/// Always finite, so the type carries a total order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Returns `None` for NaN and infinities
    pub fn from_secs(secs: f64) -> Option<Self> {
        if secs.is_finite() {
            Some(Self(secs))
        } else {
            None
        }
    }

    pub fn as_secs(&self) -> f64 {
        self.0
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_time_rejects_non_finite() {
        assert!(SimTime::from_secs(f64::NAN).is_none());
        assert!(SimTime::from_secs(f64::INFINITY).is_none());
        assert_eq!(SimTime::from_secs(1.5).map(|t| t.as_secs()), Some(1.5));
    }

    #[test]
    fn test_sim_time_ordering() {
        let a = SimTime::from_secs(0.2).unwrap();
        let b = SimTime::from_secs(2.0).unwrap();
        assert!(a < b);
        assert_eq!(a.max(b), b);
    }

    #[test]
    fn test_display_matches_plain_numbers() {
        assert_eq!(ContentId(3).to_string(), "3");
        assert_eq!(NodeId(12).to_string(), "12");
        assert_eq!(SimTime::from_secs(0.2).unwrap().to_string(), "0.2");
    }
}
