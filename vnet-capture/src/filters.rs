//! BPF (Berkeley Packet Filter) filter builders

use ipnetwork::Ipv4Network;

/// Filter installed on every bridge endpoint.
///
/// Keeps ARP plus any IPv4 traffic sourced from or destined to the virtual
/// subnet, so unrelated traffic on a shared segment never reaches the
/// forwarding loops.
pub fn bridge_filter(subnet: &Ipv4Network) -> String {
    format!("arp or (src net {0} or dst net {0})", subnet)
}

/// Filter for an injection-only session: matches no real frame
pub fn inject_only_filter() -> String {
    "less 1".to_string()
}
