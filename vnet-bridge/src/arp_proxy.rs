//! Proxy ARP on the physical segment
//!
//! The bridge answers every ARP request from a host inside the virtual
//! subnet with its own hardware address, so that host sends all subnet
//! traffic through the bridge. Requests double as a learning source for the
//! address cache.

use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vnet_capture::EndpointWriter;
use vnet_core::{MacAddr, Result};
use vnet_packet::arp::{self, ArpPacket};

use crate::cache::AddressCache;
use crate::stats::BridgeCounters;

/// What `handle_request` did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOutcome {
    /// A reply was injected and the sender learned
    Replied { sender: Ipv4Addr, requested: Ipv4Addr },
    /// The sender was learned but no reply was sent
    Learned { sender: Ipv4Addr },
    /// Not a request, sender outside the subnet, or undecodable
    Ignored,
}

/// Stateless proxy logic bound to the physical endpoint and the cache
#[derive(Clone)]
pub struct ArpProxy {
    physical: EndpointWriter,
    cache: Arc<AddressCache>,
    counters: Arc<BridgeCounters>,
}

impl ArpProxy {
    pub fn new(
        physical: EndpointWriter,
        cache: Arc<AddressCache>,
        counters: Arc<BridgeCounters>,
    ) -> Self {
        Self {
            physical,
            cache,
            counters,
        }
    }

    fn local(&self) -> (Ipv4Addr, MacAddr) {
        let info = self.physical.info();
        (info.local_ip, info.mac)
    }

    /// Broadcast a gratuitous ARP reply claiming the local address
    pub fn announce(&self) -> Result<()> {
        let (local_ip, local_mac) = self.local();
        let frame = arp::build_gratuitous(local_ip, local_mac)?;
        self.physical.write(&frame)?;

        info!(
            interface = %self.physical.info().name,
            ip = %local_ip,
            mac = %local_mac,
            "Sent gratuitous ARP"
        );
        Ok(())
    }

    /// Answer an ARP request captured on the physical side.
    ///
    /// Per-frame faults are logged and reported as [`ArpOutcome::Ignored`]
    /// or [`ArpOutcome::Learned`]; they never propagate.
    pub fn handle_request(&self, frame: &[u8]) -> ArpOutcome {
        let request = match ArpPacket::from_frame(frame) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "ignoring malformed ARP frame");
                return ArpOutcome::Ignored;
            }
        };

        if !request.is_request() {
            return ArpOutcome::Ignored;
        }

        let sender = request.sender_proto_addr;
        if !self.physical.info().contains(sender) {
            debug!(sender = %sender, "ignoring ARP request from outside the subnet");
            return ArpOutcome::Ignored;
        }

        let (local_ip, local_mac) = self.local();
        let outcome = match arp::build_reply(&request, local_ip, local_mac) {
            Ok(reply) => {
                match self.physical.write(&reply) {
                    Ok(()) => self.counters.record_arp_reply(),
                    Err(e) => warn!(error = %e, "send arp reply error"),
                }
                ArpOutcome::Replied {
                    sender,
                    requested: request.target_proto_addr,
                }
            }
            Err(e) => {
                debug!(sender = %sender, error = %e, "not answering ARP request");
                ArpOutcome::Learned { sender }
            }
        };

        if self.cache.store(sender, request.sender_hw_addr) {
            self.counters.record_learned();
            info!(ip = %sender, mac = %request.sender_hw_addr, "stored arp mapping");
        }

        outcome
    }
}
