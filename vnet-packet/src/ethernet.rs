//! Ethernet II header parsing and frame construction

use bytes::{BufMut, BytesMut};
use std::fmt;
use vnet_core::{ethertypes, MacAddr};

/// EtherType values the bridge distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// Anything else, carried through untouched
    Other(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => ethertypes::IPV4,
            EtherType::ARP => ethertypes::ARP,
            EtherType::Other(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::IPV4 => EtherType::IPv4,
            ethertypes::ARP => EtherType::ARP,
            val => EtherType::Other(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::Other(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: EtherType,
}

impl EthernetHeader {
    /// Ethernet header size (dst + src + type)
    pub const SIZE: usize = 14;

    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Maximum Ethernet frame size (without FCS)
    pub const MAX_FRAME_SIZE: usize = 1514;

    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType) -> Self {
        Self {
            destination,
            source,
            ethertype,
        }
    }

    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }

        Some(Self {
            destination: MacAddr::from_slice(&data[0..6])?,
            source: MacAddr::from_slice(&data[6..12])?,
            ethertype: EtherType::from_u16(u16::from_be_bytes([data[12], data[13]])),
        })
    }

    /// Bytes following the header, empty if `data` is too short
    pub fn payload(data: &[u8]) -> &[u8] {
        data.get(Self::SIZE..).unwrap_or(&[])
    }

    /// Build a frame carrying `payload` behind this header.
    ///
    /// The payload is copied verbatim; frames under the Ethernet minimum are
    /// zero-padded at the end.
    pub fn encapsulate(&self, payload: &[u8]) -> Vec<u8> {
        let len = (Self::SIZE + payload.len()).max(Self::MIN_FRAME_SIZE);
        let mut buffer = BytesMut::with_capacity(len);

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(payload);

        if buffer.len() < Self::MIN_FRAME_SIZE {
            buffer.resize(Self::MIN_FRAME_SIZE, 0);
        }

        buffer.to_vec()
    }
}
