//! ARP packet structure, parsing, and reply construction
//!
//! ## ARP Packet Format
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Hardware Type (HTYPE)    |       Protocol Type (PTYPE)   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  HW Addr Len  |Proto Addr Len |         Operation (OPER)      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Sender Hardware Address (SHA)               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       SHA (cont.)             |  Sender Protocol Address (SPA)|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       SPA (cont.)             |  Target Hardware Address (THA)|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        THA (cont.)                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Target Protocol Address (TPA)               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use crate::ethernet::{EtherType, EthernetHeader};
use bytes::{BufMut, BytesMut};
use std::net::Ipv4Addr;
use vnet_core::{Error, MacAddr, Result};

/// Hardware types
pub const HTYPE_ETHERNET: u16 = 1;

/// Protocol types
pub const PTYPE_IPV4: u16 = 0x0800;

/// Size of an Ethernet/IPv4 ARP body
pub const ARP_PACKET_SIZE: usize = 28;

/// ARP Operation Codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request = 1,
    Reply = 2,
}

impl ArpOpcode {
    pub fn from_u16(val: u16) -> Option<Self> {
        match val {
            1 => Some(Self::Request),
            2 => Some(Self::Reply),
            _ => None,
        }
    }
}

/// ARP Packet (Ethernet hardware, IPv4 protocol)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    /// Operation
    pub operation: ArpOpcode,
    /// Sender hardware address (MAC)
    pub sender_hw_addr: MacAddr,
    /// Sender protocol address (IP)
    pub sender_proto_addr: Ipv4Addr,
    /// Target hardware address (MAC)
    pub target_hw_addr: MacAddr,
    /// Target protocol address (IP)
    pub target_proto_addr: Ipv4Addr,
}

impl ArpPacket {
    /// Create new ARP request
    pub fn new_request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            operation: ArpOpcode::Request,
            sender_hw_addr: sender_mac,
            sender_proto_addr: sender_ip,
            target_hw_addr: MacAddr::zero(), // Unknown in request
            target_proto_addr: target_ip,
        }
    }

    /// Create new ARP reply
    pub fn new_reply(
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            operation: ArpOpcode::Reply,
            sender_hw_addr: sender_mac,
            sender_proto_addr: sender_ip,
            target_hw_addr: target_mac,
            target_proto_addr: target_ip,
        }
    }

    /// Parse ARP body from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_PACKET_SIZE {
            return Err(Error::parsing("ARP packet too short"));
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        let hlen = data[4];
        let plen = data[5];
        if htype != HTYPE_ETHERNET || ptype != PTYPE_IPV4 || hlen != 6 || plen != 4 {
            return Err(Error::parsing(format!(
                "unsupported ARP format htype={} ptype=0x{:04x} hlen={} plen={}",
                htype, ptype, hlen, plen
            )));
        }

        let op_val = u16::from_be_bytes([data[6], data[7]]);
        let operation =
            ArpOpcode::from_u16(op_val).ok_or_else(|| Error::parsing("Invalid ARP opcode"))?;

        Ok(Self {
            operation,
            sender_hw_addr: MacAddr::from_slice(&data[8..14])
                .ok_or_else(|| Error::parsing("bad sender hardware address"))?,
            sender_proto_addr: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_hw_addr: MacAddr::from_slice(&data[18..24])
                .ok_or_else(|| Error::parsing("bad target hardware address"))?,
            target_proto_addr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    /// Parse an Ethernet frame carrying ARP
    pub fn from_frame(frame: &[u8]) -> Result<Self> {
        let header =
            EthernetHeader::parse(frame).ok_or_else(|| Error::parsing("frame too short"))?;
        if header.ethertype != EtherType::ARP {
            return Err(Error::parsing(format!(
                "not an ARP frame (ethertype {})",
                header.ethertype
            )));
        }
        Self::parse(EthernetHeader::payload(frame))
    }

    /// Serialize ARP body to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ARP_PACKET_SIZE);

        buf.put_u16(HTYPE_ETHERNET);
        buf.put_u16(PTYPE_IPV4);
        buf.put_u8(6);
        buf.put_u8(4);
        buf.put_u16(self.operation as u16);
        buf.put_slice(self.sender_hw_addr.as_bytes());
        buf.put_slice(&self.sender_proto_addr.octets());
        buf.put_slice(self.target_hw_addr.as_bytes());
        buf.put_slice(&self.target_proto_addr.octets());

        buf.to_vec()
    }

    /// Wrap in an Ethernet frame
    pub fn to_frame(&self, destination: MacAddr, source: MacAddr) -> Vec<u8> {
        EthernetHeader::new(destination, source, EtherType::ARP).encapsulate(&self.serialize())
    }

    /// Check if this is a request
    pub fn is_request(&self) -> bool {
        self.operation == ArpOpcode::Request
    }

    /// Check if this is a reply
    pub fn is_reply(&self) -> bool {
        self.operation == ArpOpcode::Reply
    }

    /// Check if this is gratuitous ARP
    pub fn is_gratuitous(&self) -> bool {
        self.sender_proto_addr == self.target_proto_addr
    }
}

/// Build a unicast reply to `request` that claims `local_mac` for the
/// requested address.
///
/// Refuses requests that are not answerable by proxy: replies, gratuitous
/// announcements, and requests whose sender is the bridge itself.
pub fn build_reply(request: &ArpPacket, local_ip: Ipv4Addr, local_mac: MacAddr) -> Result<Vec<u8>> {
    if !request.is_request() {
        return Err(Error::construction("can only reply to an ARP request"));
    }
    if request.is_gratuitous() {
        return Err(Error::construction(format!(
            "not answering gratuitous ARP for {}",
            request.target_proto_addr
        )));
    }
    if request.sender_proto_addr == local_ip {
        return Err(Error::construction(format!(
            "request sender {} is the local address",
            local_ip
        )));
    }
    if local_mac.is_zero() {
        return Err(Error::construction("local hardware address is unset"));
    }

    let reply = ArpPacket::new_reply(
        local_mac,
        request.target_proto_addr,
        request.sender_hw_addr,
        request.sender_proto_addr,
    );

    Ok(reply.to_frame(request.sender_hw_addr, local_mac))
}

/// Build a broadcast gratuitous ARP reply announcing `local_ip` at
/// `local_mac`
pub fn build_gratuitous(local_ip: Ipv4Addr, local_mac: MacAddr) -> Result<Vec<u8>> {
    if local_mac.is_zero() {
        return Err(Error::construction("local hardware address is unset"));
    }
    if local_ip.is_unspecified() {
        return Err(Error::construction("local address is unspecified"));
    }

    let announcement =
        ArpPacket::new_reply(local_mac, local_ip, MacAddr::broadcast(), local_ip);

    Ok(announcement.to_frame(MacAddr::broadcast(), local_mac))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST_MAC: MacAddr = MacAddr::new([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);
    const LOCAL_MAC: MacAddr = MacAddr::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);

    fn host_ip() -> Ipv4Addr {
        Ipv4Addr::new(172, 24, 0, 20)
    }

    fn local_ip() -> Ipv4Addr {
        Ipv4Addr::new(172, 24, 0, 1)
    }

    #[test]
    fn test_arp_request_creation() {
        let target_ip = Ipv4Addr::new(172, 24, 3, 3);
        let packet = ArpPacket::new_request(HOST_MAC, host_ip(), target_ip);

        assert_eq!(packet.operation, ArpOpcode::Request);
        assert_eq!(packet.sender_hw_addr, HOST_MAC);
        assert_eq!(packet.target_proto_addr, target_ip);
        assert!(packet.is_request());
        assert!(!packet.is_gratuitous());
    }

    #[test]
    fn test_arp_serialize_parse() {
        let packet = ArpPacket::new_request(HOST_MAC, host_ip(), local_ip());
        let bytes = packet.serialize();

        assert_eq!(bytes.len(), ARP_PACKET_SIZE);
        assert_eq!(ArpPacket::parse(&bytes).unwrap(), packet);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ArpPacket::parse(&[0u8; 27]).is_err());

        let mut bytes = ArpPacket::new_request(HOST_MAC, host_ip(), local_ip()).serialize();
        bytes[7] = 9; // opcode
        assert!(ArpPacket::parse(&bytes).is_err());

        let mut bytes = ArpPacket::new_request(HOST_MAC, host_ip(), local_ip()).serialize();
        bytes[2] = 0x86; // ptype IPv6
        bytes[3] = 0xdd;
        assert!(ArpPacket::parse(&bytes).is_err());
    }

    #[test]
    fn test_from_frame_requires_arp_ethertype() {
        let arp = ArpPacket::new_request(HOST_MAC, host_ip(), local_ip());
        let frame = arp.to_frame(MacAddr::broadcast(), HOST_MAC);
        assert_eq!(ArpPacket::from_frame(&frame).unwrap(), arp);

        let mut ipv4 = frame.clone();
        ipv4[12] = 0x08;
        ipv4[13] = 0x00;
        assert!(ArpPacket::from_frame(&ipv4).is_err());
    }

    #[test]
    fn test_build_reply_claims_requested_ip() {
        let requested = Ipv4Addr::new(172, 24, 9, 9);
        let request = ArpPacket::new_request(HOST_MAC, host_ip(), requested);

        let frame = build_reply(&request, local_ip(), LOCAL_MAC).unwrap();
        let header = EthernetHeader::parse(&frame).unwrap();
        assert_eq!(header.destination, HOST_MAC);
        assert_eq!(header.source, LOCAL_MAC);
        assert_eq!(header.ethertype, EtherType::ARP);

        let reply = ArpPacket::from_frame(&frame).unwrap();
        assert!(reply.is_reply());
        assert_eq!(reply.sender_hw_addr, LOCAL_MAC);
        assert_eq!(reply.sender_proto_addr, requested);
        assert_eq!(reply.target_hw_addr, HOST_MAC);
        assert_eq!(reply.target_proto_addr, host_ip());
    }

    #[test]
    fn test_build_reply_refusals() {
        let reply = ArpPacket::new_reply(HOST_MAC, host_ip(), LOCAL_MAC, local_ip());
        assert!(build_reply(&reply, local_ip(), LOCAL_MAC).is_err());

        let announce = ArpPacket::new_request(HOST_MAC, host_ip(), host_ip());
        assert!(build_reply(&announce, local_ip(), LOCAL_MAC).is_err());

        let echo = ArpPacket::new_request(LOCAL_MAC, local_ip(), host_ip());
        assert!(build_reply(&echo, local_ip(), LOCAL_MAC).is_err());

        let request = ArpPacket::new_request(HOST_MAC, host_ip(), local_ip());
        assert!(matches!(
            build_reply(&request, local_ip(), MacAddr::zero()),
            Err(Error::PacketConstruction(_))
        ));
    }

    #[test]
    fn test_build_gratuitous() {
        let frame = build_gratuitous(local_ip(), LOCAL_MAC).unwrap();
        let header = EthernetHeader::parse(&frame).unwrap();
        assert!(header.destination.is_broadcast());
        assert_eq!(header.source, LOCAL_MAC);

        let arp = ArpPacket::from_frame(&frame).unwrap();
        assert!(arp.is_reply());
        assert!(arp.is_gratuitous());
        assert_eq!(arp.sender_hw_addr, LOCAL_MAC);
        assert_eq!(arp.sender_proto_addr, local_ip());
    }

    #[test]
    fn test_build_gratuitous_needs_addresses() {
        assert!(build_gratuitous(local_ip(), MacAddr::zero()).is_err());
        assert!(build_gratuitous(Ipv4Addr::UNSPECIFIED, LOCAL_MAC).is_err());
    }
}
