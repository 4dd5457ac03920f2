//! Active-content bookkeeping.
//!
//! Tracks, for every client, how many outstanding connections exist for each
//! content identifier. An identifier is present in a client's map iff its
//! count is at least one; the entry is removed exactly when the count drops
//! to zero.

use rand::Rng;
use std::collections::BTreeMap;

use crate::types::{ClientIndex, ContentId};

/// Outcome of a single disconnection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawal {
    /// Last reference released; the entry is gone
    FullyWithdrawn,
    /// Other connections to the same content remain
    StillActive { remaining: u32 },
}

/// Bookkeeping errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChurnError {
    #[error("no active content for client {0}")]
    NoActiveContent(ClientIndex),
    #[error("content {content} is not active for client {client}")]
    NotActive { client: ClientIndex, content: ContentId },
    #[error("client {client} out of range ({num_clients} clients)")]
    UnknownClient { client: ClientIndex, num_clients: usize },
}

/// Per-client map from content identifier to active reference count
#[derive(Debug, Clone, Default)]
pub struct ChurnBookkeeper {
    active: Vec<BTreeMap<ContentId, u32>>,
    total: u64,
}

impl ChurnBookkeeper {
    /// One empty map per client
    pub fn new(num_clients: usize) -> Self {
        Self {
            active: vec![BTreeMap::new(); num_clients],
            total: 0,
        }
    }

    pub fn num_clients(&self) -> usize {
        self.active.len()
    }

    /// Record a connection, creating the entry at one if absent
    pub fn connect(&mut self, client: ClientIndex, content: ContentId) -> Result<u32, ChurnError> {
        let entries = self.entries_mut(client)?;
        let count = entries.entry(content).or_insert(0);
        *count += 1;
        let count = *count;
        self.total += 1;
        Ok(count)
    }

    /// Uniformly pick one of the client's currently active identifiers
    pub fn pick_random_active<R: Rng + ?Sized>(
        &self,
        client: ClientIndex,
        rng: &mut R,
    ) -> Result<ContentId, ChurnError> {
        let entries = self.entries(client)?;
        if entries.is_empty() {
            return Err(ChurnError::NoActiveContent(client));
        }
        let offset = rng.gen_range(0..entries.len());
        entries
            .keys()
            .nth(offset)
            .copied()
            .ok_or(ChurnError::NoActiveContent(client))
    }

    /// Release one connection to `content`
    pub fn disconnect_one(
        &mut self,
        client: ClientIndex,
        content: ContentId,
    ) -> Result<Withdrawal, ChurnError> {
        let entries = self.entries_mut(client)?;
        let count = entries
            .get_mut(&content)
            .ok_or(ChurnError::NotActive { client, content })?;
        *count -= 1;
        let remaining = *count;
        if remaining == 0 {
            entries.remove(&content);
        }
        self.total -= 1;

        Ok(match remaining {
            0 => Withdrawal::FullyWithdrawn,
            remaining => Withdrawal::StillActive { remaining },
        })
    }

    /// Reference count of `content` at `client`; zero when absent
    pub fn active_count(&self, client: ClientIndex, content: ContentId) -> u32 {
        self.active
            .get(client.0)
            .and_then(|entries| entries.get(&content))
            .copied()
            .unwrap_or(0)
    }

    /// Sum of every reference count across all clients
    pub fn total_active(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self, client: ClientIndex) -> bool {
        self.active.get(client.0).map_or(true, BTreeMap::is_empty)
    }

    /// Clients that currently hold at least one active content
    pub fn clients_with_content(&self) -> impl Iterator<Item = ClientIndex> + '_ {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(i, _)| ClientIndex(i))
    }

    /// Active identifiers of a client with their counts
    pub fn active_contents(&self, client: ClientIndex) -> impl Iterator<Item = (ContentId, u32)> + '_ {
        self.active
            .get(client.0)
            .into_iter()
            .flat_map(|entries| entries.iter().map(|(c, n)| (*c, *n)))
    }

    fn entries(&self, client: ClientIndex) -> Result<&BTreeMap<ContentId, u32>, ChurnError> {
        let num_clients = self.active.len();
        self.active
            .get(client.0)
            .ok_or(ChurnError::UnknownClient { client, num_clients })
    }

    fn entries_mut(&mut self, client: ClientIndex) -> Result<&mut BTreeMap<ContentId, u32>, ChurnError> {
        let num_clients = self.active.len();
        self.active
            .get_mut(client.0)
            .ok_or(ChurnError::UnknownClient { client, num_clients })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workload::seeded_rng;
    use proptest::prelude::*;

    #[test]
    fn test_connect_increments() {
        let mut book = ChurnBookkeeper::new(2);
        assert_eq!(book.connect(ClientIndex(0), ContentId(4)), Ok(1));
        assert_eq!(book.connect(ClientIndex(0), ContentId(4)), Ok(2));
        assert_eq!(book.active_count(ClientIndex(0), ContentId(4)), 2);
        assert_eq!(book.active_count(ClientIndex(1), ContentId(4)), 0);
        assert_eq!(book.total_active(), 2);
    }

    #[test]
    fn test_disconnect_reports_full_withdrawal() {
        let mut book = ChurnBookkeeper::new(1);
        let client = ClientIndex(0);
        book.connect(client, ContentId(1)).unwrap();
        book.connect(client, ContentId(1)).unwrap();

        assert_eq!(
            book.disconnect_one(client, ContentId(1)),
            Ok(Withdrawal::StillActive { remaining: 1 })
        );
        assert_eq!(book.disconnect_one(client, ContentId(1)), Ok(Withdrawal::FullyWithdrawn));
        assert!(book.is_empty(client));
        assert_eq!(book.total_active(), 0);
        assert_eq!(
            book.disconnect_one(client, ContentId(1)),
            Err(ChurnError::NotActive { client, content: ContentId(1) })
        );
    }

    #[test]
    fn test_pick_random_active_requires_content() {
        let book = ChurnBookkeeper::new(3);
        let mut rng = seeded_rng(1);
        assert_eq!(
            book.pick_random_active(ClientIndex(2), &mut rng),
            Err(ChurnError::NoActiveContent(ClientIndex(2)))
        );
    }

    #[test]
    fn test_pick_random_active_covers_all_entries() {
        let mut book = ChurnBookkeeper::new(1);
        let client = ClientIndex(0);
        for c in [2, 5, 9] {
            book.connect(client, ContentId(c)).unwrap();
        }
        // Heavy counts must not bias the pick.
        for _ in 0..50 {
            book.connect(client, ContentId(2)).unwrap();
        }

        let mut rng = seeded_rng(8);
        let mut seen = BTreeMap::new();
        for _ in 0..3_000 {
            let picked = book.pick_random_active(client, &mut rng).unwrap();
            *seen.entry(picked).or_insert(0usize) += 1;
        }
        assert_eq!(seen.len(), 3);
        for count in seen.values() {
            assert!(*count > 800, "pick is not uniform: {:?}", seen);
        }
    }

    #[test]
    fn test_unknown_client() {
        let mut book = ChurnBookkeeper::new(1);
        assert!(matches!(
            book.connect(ClientIndex(1), ContentId(0)),
            Err(ChurnError::UnknownClient { .. })
        ));
    }

    #[test]
    fn test_clients_with_content() {
        let mut book = ChurnBookkeeper::new(4);
        book.connect(ClientIndex(1), ContentId(0)).unwrap();
        book.connect(ClientIndex(3), ContentId(0)).unwrap();
        let clients: Vec<_> = book.clients_with_content().collect();
        assert_eq!(clients, vec![ClientIndex(1), ClientIndex(3)]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Connect(usize, u32),
        Disconnect(usize, u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4, 0u32..6).prop_map(|(c, k)| Op::Connect(c, k)),
            (0usize..4, 0u32..6).prop_map(|(c, k)| Op::Disconnect(c, k)),
        ]
    }

    proptest! {
        /// Property: present iff count >= 1, and the total matches a reference model
        #[test]
        fn prop_presence_matches_reference_count(ops in proptest::collection::vec(op_strategy(), 0..200)) {
            let mut book = ChurnBookkeeper::new(4);
            let mut model: BTreeMap<(usize, u32), u32> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Connect(c, k) => {
                        book.connect(ClientIndex(c), ContentId(k)).unwrap();
                        *model.entry((c, k)).or_insert(0) += 1;
                    }
                    Op::Disconnect(c, k) => {
                        let result = book.disconnect_one(ClientIndex(c), ContentId(k));
                        match model.get_mut(&(c, k)) {
                            Some(n) => {
                                *n -= 1;
                                let expected = if *n == 0 {
                                    Withdrawal::FullyWithdrawn
                                } else {
                                    Withdrawal::StillActive { remaining: *n }
                                };
                                prop_assert_eq!(result, Ok(expected));
                                if *n == 0 {
                                    model.remove(&(c, k));
                                }
                            }
                            None => prop_assert!(result.is_err()),
                        }
                    }
                }

                for c in 0..4 {
                    let tracked: Vec<_> = book.active_contents(ClientIndex(c)).collect();
                    for (content, count) in &tracked {
                        prop_assert!(*count >= 1);
                        prop_assert_eq!(model.get(&(c, content.0)).copied(), Some(*count));
                    }
                    let expected_len = model.keys().filter(|(mc, _)| *mc == c).count();
                    prop_assert_eq!(tracked.len(), expected_len);
                }
                prop_assert_eq!(book.total_active(), model.values().map(|n| *n as u64).sum::<u64>());
            }
        }
    }
}
