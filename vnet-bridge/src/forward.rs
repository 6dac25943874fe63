//! The two forwarding directions
//!
//! Each direction owns the read half of its source endpoint and shares the
//! write half of its destination. Frames are translated by allocate-and-copy;
//! the captured view is never retained past one iteration.

use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use vnet_capture::{EndpointInfo, EndpointReader, EndpointWriter, KernelStats};
use vnet_core::Shutdown;
use vnet_packet::{decapsulate_ipv4, encapsulate_ipv4, EtherType, EthernetHeader, Ipv4Header};

use crate::arp_proxy::{ArpOutcome, ArpProxy};
use crate::cache::AddressCache;
use crate::stats::{BridgeCounters, DropReason};

/// Result of processing one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Forwarded,
    Arp(ArpOutcome),
    Dropped(DropReason),
}

/// One direction of the bridge
pub trait Direction: Send {
    /// Label used in logs and thread names
    fn name(&self) -> &'static str;

    /// Translate and forward a single captured frame
    fn process(&self, frame: &[u8]) -> Disposition;
}

/// Physical (L2) → tunnel (L3)
pub struct PhysicalToTunnel {
    physical: EndpointInfo,
    tunnel: EndpointWriter,
    proxy: ArpProxy,
    cache: Arc<AddressCache>,
    counters: Arc<BridgeCounters>,
}

impl PhysicalToTunnel {
    pub fn new(
        physical: EndpointInfo,
        tunnel: EndpointWriter,
        proxy: ArpProxy,
        cache: Arc<AddressCache>,
        counters: Arc<BridgeCounters>,
    ) -> Self {
        Self {
            physical,
            tunnel,
            proxy,
            cache,
            counters,
        }
    }

    fn forward_ipv4(&self, eth: &EthernetHeader, frame: &[u8]) -> Disposition {
        let datagram = EthernetHeader::payload(frame);
        let ip = match Ipv4Header::parse(datagram) {
            Ok(ip) => ip,
            Err(e) => {
                debug!(error = %e, "dropping malformed IPv4 frame");
                return Disposition::Dropped(DropReason::Malformed);
            }
        };

        if !self.physical.contains(ip.source) {
            return Disposition::Dropped(DropReason::OutsideSubnet);
        }

        // Replies to this host come back through the tunnel and need its MAC
        if self.cache.store(ip.source, eth.source) {
            self.counters.record_learned();
        }

        trace!(src = %ip.source, dst = %ip.destination, len = datagram.len(), "L2 -> L3");

        match self.tunnel.write(&encapsulate_ipv4(datagram)) {
            Ok(()) => {
                self.counters.record_physical_to_tunnel();
                Disposition::Forwarded
            }
            Err(e) => {
                warn!(interface = %self.tunnel.info().name, error = %e, "forward to tunnel failed");
                Disposition::Dropped(DropReason::WriteFailed)
            }
        }
    }
}

impl Direction for PhysicalToTunnel {
    fn name(&self) -> &'static str {
        "l2-to-l3"
    }

    fn process(&self, frame: &[u8]) -> Disposition {
        let Some(eth) = EthernetHeader::parse(frame) else {
            self.counters.record_drop(DropReason::Malformed);
            return Disposition::Dropped(DropReason::Malformed);
        };

        let disposition = if eth.source == self.physical.mac {
            Disposition::Dropped(DropReason::OwnFrame)
        } else {
            match eth.ethertype {
                EtherType::ARP => Disposition::Arp(self.proxy.handle_request(frame)),
                EtherType::IPv4 => self.forward_ipv4(&eth, frame),
                EtherType::Other(_) => Disposition::Dropped(DropReason::UnsupportedEtherType),
            }
        };

        if let Disposition::Dropped(reason) = disposition {
            self.counters.record_drop(reason);
        }
        disposition
    }
}

/// Tunnel (L3) → physical (L2)
pub struct TunnelToPhysical {
    physical: EndpointWriter,
    cache: Arc<AddressCache>,
    counters: Arc<BridgeCounters>,
}

impl TunnelToPhysical {
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

    fn forward(&self, frame: &[u8]) -> Disposition {
        let datagram = match decapsulate_ipv4(frame) {
            Ok(datagram) => datagram,
            Err(e) => {
                debug!(error = %e, "dropping tunnel frame");
                return Disposition::Dropped(DropReason::Malformed);
            }
        };

        let ip = match Ipv4Header::parse(datagram) {
            Ok(ip) => ip,
            Err(e) => {
                debug!(error = %e, "dropping malformed tunnel datagram");
                return Disposition::Dropped(DropReason::Malformed);
            }
        };

        // Never seen on the segment: nothing safe to address the frame to
        let Some(dst_mac) = self.cache.lookup(ip.destination) else {
            trace!(dst = %ip.destination, "no mapping for destination");
            return Disposition::Dropped(DropReason::Unresolved);
        };

        let out = EthernetHeader::new(dst_mac, self.physical.info().mac, EtherType::IPv4)
            .encapsulate(datagram);

        trace!(src = %ip.source, dst = %ip.destination, mac = %dst_mac, len = datagram.len(), "L3 -> L2");

        match self.physical.write(&out) {
            Ok(()) => {
                self.counters.record_tunnel_to_physical();
                Disposition::Forwarded
            }
            Err(e) => {
                warn!(interface = %self.physical.info().name, error = %e, "forward to physical failed");
                Disposition::Dropped(DropReason::WriteFailed)
            }
        }
    }
}

impl Direction for TunnelToPhysical {
    fn name(&self) -> &'static str {
        "l3-to-l2"
    }

    fn process(&self, frame: &[u8]) -> Disposition {
        let disposition = self.forward(frame);
        if let Disposition::Dropped(reason) = disposition {
            self.counters.record_drop(reason);
        }
        disposition
    }
}

/// Run one direction until `shutdown` is triggered, then close the reader.
///
/// The token is checked once per iteration, after the bounded read, so exit
/// latency is at most one read timeout.
pub fn run<D: Direction>(
    direction: D,
    mut reader: EndpointReader,
    shutdown: Shutdown,
) -> Option<KernelStats> {
    info!(
        direction = direction.name(),
        interface = %reader.info().name,
        "Forwarding loop started"
    );

    while !shutdown.is_triggered() {
        let Some(frame) = reader.read() else {
            continue;
        };
        if shutdown.is_triggered() {
            break;
        }
        direction.process(frame);
    }

    let kernel = reader.kernel_stats();
    reader.close();

    info!(direction = direction.name(), "Forwarding loop stopped");
    kernel
}
