//! Routing table mapping participant ids to reachable addresses

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use router_api::Address;
use std::fmt::Write;
use std::sync::Arc;
use tracing::{debug, enabled, trace, Level};

/// RoutingTable maintains the process-wide participant id to address registry.
///
/// Writes are insert-if-absent: the first address registered for a participant
/// stays in place until it is removed explicitly. Clones share the same table.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    entries: Arc<DashMap<String, Address>>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table seeded with well-known participants
    /// (capabilities directory, access controller, discovery provider, ...)
    pub fn with_entries<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Address)>,
        K: Into<String>,
    {
        let table = Self::new();
        for (participant_id, address) in entries {
            table.put(participant_id, address);
        }
        table
    }

    /// Look up the address of a participant
    pub fn get(&self, participant_id: &str) -> Option<Address> {
        debug!("lookup participant: {}", participant_id);
        let result = self.entries.get(participant_id).map(|entry| entry.value().clone());
        if result.is_none() {
            self.dump_entries();
        }
        debug!("Returning: {:?}", result);
        result
    }

    /// Register an address unless the participant is already known.
    ///
    /// Returns the address already registered, in which case the table is unchanged.
    pub fn put(&self, participant_id: impl Into<String>, address: Address) -> Option<Address> {
        let participant_id = participant_id.into();
        debug!(
            "adding endpoint address: {} for participant with ID {}",
            address, participant_id
        );
        let result = match self.entries.entry(participant_id) {
            Entry::Occupied(existing) => Some(existing.get().clone()),
            Entry::Vacant(vacant) => {
                vacant.insert(address);
                None
            }
        };
        debug!("Returning: {:?}", result);
        result
    }

    /// Check whether a participant is registered
    pub fn contains_key(&self, participant_id: &str) -> bool {
        let contains_key = self.entries.contains_key(participant_id);
        debug!(
            "checking for participant: {} success: {}",
            participant_id, contains_key
        );
        if !contains_key {
            self.dump_entries();
        }
        contains_key
    }

    /// Remove a participant, e.g. once it is known to be unreachable
    pub fn remove(&self, participant_id: &str) -> Option<Address> {
        let removed = self.entries.remove(participant_id).map(|(_, address)| address);
        debug!("Removed participant {}: {:?}", participant_id, removed);
        removed
    }

    /// Number of registered participants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all registered participants
    pub fn participant_ids(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    // Must not be called while holding a reference into the map.
    fn dump_entries(&self) {
        if !enabled!(Level::TRACE) {
            return;
        }
        let mut message = String::from("Routing table entries:\n");
        for entry in self.entries.iter() {
            let _ = writeln!(message, "\t> {}\t-\t{}", entry.key(), entry.value());
        }
        trace!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_get_unknown_participant() {
        let table = RoutingTable::new();
        assert_eq!(table.get("unknown"), None);
        assert!(!table.contains_key("unknown"));
    }

    #[test]
    fn test_first_put_wins() {
        let table = RoutingTable::new();
        let a1 = Address::channel("first");
        let a2 = Address::channel("second");

        assert_eq!(table.put("participant", a1.clone()), None);
        assert_eq!(table.put("participant", a2), Some(a1.clone()));
        assert_eq!(table.get("participant"), Some(a1));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_remove() {
        let table = RoutingTable::new();
        table.put("participant", Address::InProcess);
        assert!(table.contains_key("participant"));

        assert_eq!(table.remove("participant"), Some(Address::InProcess));
        assert_eq!(table.get("participant"), None);
        assert_eq!(table.remove("participant"), None);
    }

    #[test]
    fn test_put_after_remove_registers_new_address() {
        let table = RoutingTable::new();
        table.put("participant", Address::channel("old"));
        table.remove("participant");
        assert_eq!(table.put("participant", Address::channel("new")), None);
        assert_eq!(table.get("participant"), Some(Address::channel("new")));
    }

    #[test]
    fn test_with_entries() {
        let table = RoutingTable::with_entries(vec![
            ("capabilitiesDirectory", Address::channel("discovery")),
            ("domainAccessController", Address::channel("acl")),
            ("capabilitiesDirectory", Address::channel("ignored")),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get("capabilitiesDirectory"),
            Some(Address::channel("discovery"))
        );
        let mut ids = table.participant_ids();
        ids.sort();
        assert_eq!(ids, vec!["capabilitiesDirectory", "domainAccessController"]);
    }

    #[test]
    fn test_clones_share_entries() {
        let table = RoutingTable::new();
        let clone = table.clone();
        clone.put("p", Address::InProcess);
        assert!(table.contains_key("p"));
    }

    #[test]
    fn test_concurrent_puts_single_winner() {
        let table = RoutingTable::new();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let table = table.clone();
                thread::spawn(move || {
                    let address = Address::channel(format!("channel-{}", i));
                    (address.clone(), table.put("contended", address))
                })
            })
            .collect();

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = outcomes
            .iter()
            .filter(|(_, previous)| previous.is_none())
            .map(|(address, _)| address.clone())
            .collect();

        assert_eq!(winners.len(), 1);
        let winner = winners[0].clone();
        for (_, previous) in outcomes.iter().filter(|(_, p)| p.is_some()) {
            assert_eq!(previous.as_ref(), Some(&winner));
        }
        assert_eq!(table.get("contended"), Some(winner));
    }
}
