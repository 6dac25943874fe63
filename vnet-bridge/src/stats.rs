//! Bridge forwarding statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Why a frame was not forwarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Neither ARP nor IPv4
    UnsupportedEtherType,
    /// IPv4 source outside the physical subnet
    OutsideSubnet,
    /// Frame the bridge injected itself, seen again by its capture
    OwnFrame,
    /// Truncated or undecodable headers
    Malformed,
    /// Destination never observed on the physical segment
    Unresolved,
    /// Injection on the outgoing endpoint failed
    WriteFailed,
}

/// Snapshot of bridge counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// IPv4 datagrams forwarded from the physical side into the tunnel
    pub physical_to_tunnel: u64,
    /// IPv4 datagrams forwarded from the tunnel onto the physical side
    pub tunnel_to_physical: u64,
    /// Proxy ARP replies injected
    pub arp_replies: u64,
    /// New or changed address mappings
    pub addresses_learned: u64,
    pub dropped_unsupported: u64,
    pub dropped_outside_subnet: u64,
    pub dropped_own: u64,
    pub dropped_malformed: u64,
    pub dropped_unresolved: u64,
    pub write_failures: u64,
}

impl BridgeStats {
    pub fn dropped(&self) -> u64 {
        self.dropped_unsupported
            + self.dropped_outside_subnet
            + self.dropped_own
            + self.dropped_malformed
            + self.dropped_unresolved
            + self.write_failures
    }
}

/// Thread-safe counters shared by both loops and the ARP proxy
#[derive(Debug, Default)]
pub struct BridgeCounters {
    physical_to_tunnel: AtomicU64,
    tunnel_to_physical: AtomicU64,
    arp_replies: AtomicU64,
    addresses_learned: AtomicU64,
    dropped_unsupported: AtomicU64,
    dropped_outside_subnet: AtomicU64,
    dropped_own: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_unresolved: AtomicU64,
    write_failures: AtomicU64,
}

impl BridgeCounters {
    pub fn record_physical_to_tunnel(&self) {
        self.physical_to_tunnel.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_tunnel_to_physical(&self) {
        self.tunnel_to_physical.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_arp_reply(&self) {
        self.arp_replies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_learned(&self) {
        self.addresses_learned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::UnsupportedEtherType => &self.dropped_unsupported,
            DropReason::OutsideSubnet => &self.dropped_outside_subnet,
            DropReason::OwnFrame => &self.dropped_own,
            DropReason::Malformed => &self.dropped_malformed,
            DropReason::Unresolved => &self.dropped_unresolved,
            DropReason::WriteFailed => &self.write_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BridgeStats {
        BridgeStats {
            physical_to_tunnel: self.physical_to_tunnel.load(Ordering::Relaxed),
            tunnel_to_physical: self.tunnel_to_physical.load(Ordering::Relaxed),
            arp_replies: self.arp_replies.load(Ordering::Relaxed),
            addresses_learned: self.addresses_learned.load(Ordering::Relaxed),
            dropped_unsupported: self.dropped_unsupported.load(Ordering::Relaxed),
            dropped_outside_subnet: self.dropped_outside_subnet.load(Ordering::Relaxed),
            dropped_own: self.dropped_own.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_unresolved: self.dropped_unresolved.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
