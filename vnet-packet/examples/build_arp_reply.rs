//! Example: build the frames the ARP proxy injects
//!
//! Run with: cargo run --example build_arp_reply

use std::net::Ipv4Addr;
use vnet_core::MacAddr;
use vnet_packet::{build_gratuitous, build_reply, ArpPacket, EthernetHeader};

fn hex(frame: &[u8]) -> String {
    frame
        .chunks(16)
        .map(|line| line.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bridge_mac: MacAddr = "02:42:ac:18:00:01".parse()?;
    let bridge_ip = Ipv4Addr::new(172, 24, 0, 1);

    let announce = build_gratuitous(bridge_ip, bridge_mac)?;
    println!("Gratuitous ARP ({} bytes):\n{}\n", announce.len(), hex(&announce));

    let host_mac: MacAddr = "3c:22:fb:10:20:30".parse()?;
    let request = ArpPacket::new_request(host_mac, Ipv4Addr::new(172, 24, 0, 50), Ipv4Addr::new(172, 24, 9, 9));

    let reply = build_reply(&request, bridge_ip, bridge_mac)?;
    let header = EthernetHeader::parse(&reply).ok_or("short frame")?;
    println!(
        "Proxy reply {} -> {} ({} bytes):\n{}",
        header.source,
        header.destination,
        reply.len(),
        hex(&reply)
    );

    Ok(())
}
