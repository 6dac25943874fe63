//! ARP-proxying bridge between an Ethernet segment and a tunnel interface
//!
//! The bridge makes one virtual IPv4 subnet reachable from both sides:
//!
//! - On the physical side it answers every ARP request from a subnet host
//!   with its own hardware address and learns the host's mapping.
//! - IPv4 frames from the segment have their Ethernet header swapped for the
//!   4-byte tunnel marker and are injected into the tunnel.
//! - Datagrams from the tunnel are given an Ethernet header addressed to the
//!   learned hardware address of their destination. Unknown destinations are
//!   dropped.
//!
//! ## Example
//!
//! ```no_run
//! use vnet_bridge::start;
//! use vnet_core::{BridgeConfig, InterfaceConfig, Shutdown};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = BridgeConfig::new(
//!     InterfaceConfig::new("en0", "172.24.0.0/16", "172.24.0.1"),
//!     InterfaceConfig::new("utun4", "172.24.0.0/16", "172.24.0.1"),
//! );
//!
//! let shutdown = Shutdown::new();
//! let bridge = start(&shutdown, &config)?;
//! // ...
//! bridge.stop();
//! # Ok(())
//! # }
//! ```

pub mod arp_proxy;
pub mod cache;
pub mod controller;
pub mod forward;
pub mod stats;

#[cfg(test)]
mod testing;

pub use arp_proxy::{ArpOutcome, ArpProxy};
pub use cache::AddressCache;
pub use controller::{start, Bridge, BridgeHandle, BridgeState};
pub use forward::{Direction, Disposition, PhysicalToTunnel, TunnelToPhysical};
pub use stats::{BridgeCounters, BridgeStats, DropReason};
