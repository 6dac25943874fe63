//! Learned IPv4 → hardware address table

use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::debug;
use vnet_core::MacAddr;

/// Concurrent IP → MAC table, learned passively from physical-side traffic.
///
/// One table-wide reader/writer lock; the table is bounded by the number of
/// hosts on the segment. Entries never expire: a host that changes its
/// hardware address keeps the stale mapping until it is seen again.
#[derive(Debug, Default)]
pub struct AddressCache {
    table: RwLock<HashMap<Ipv4Addr, MacAddr>>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a mapping, last write wins.
    ///
    /// Returns `true` if the mapping was added or changed.
    pub fn store(&self, ip: Ipv4Addr, mac: MacAddr) -> bool {
        if self.table.read().get(&ip) == Some(&mac) {
            return false;
        }

        let previous = self.table.write().insert(ip, mac);
        match previous {
            Some(old) if old == mac => false,
            Some(old) => {
                debug!(ip = %ip, old = %old, mac = %mac, "updated address mapping");
                true
            }
            None => {
                debug!(ip = %ip, mac = %mac, "learned address mapping");
                true
            }
        }
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.table.read().get(&ip).copied()
    }

    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Copy of all mappings, ordered by address
    pub fn snapshot(&self) -> Vec<(Ipv4Addr, MacAddr)> {
        let mut entries: Vec<_> = self
            .table
            .read()
            .iter()
            .map(|(ip, mac)| (*ip, *mac))
            .collect();
        entries.sort_by_key(|(ip, _)| *ip);
        entries
    }
}
