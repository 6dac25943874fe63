//! Read-only IPv4 header view
//!
//! The bridge never rewrites IP datagrams; it only needs the addresses to
//! decide where a datagram goes.

use std::net::Ipv4Addr;
use vnet_core::{Error, Result};

/// Fields of an IPv4 header the bridge routes on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header {
    /// Header length in bytes
    pub header_len: usize,
    /// Total length from the header
    pub total_length: u16,
    /// IP protocol number
    pub protocol: u8,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
}

impl Ipv4Header {
    /// Minimum IPv4 header size
    pub const MIN_SIZE: usize = 20;

    /// Parse the header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::MIN_SIZE {
            return Err(Error::parsing(format!(
                "IPv4 header too short: {} bytes",
                data.len()
            )));
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(Error::parsing(format!("not an IPv4 datagram (version {})", version)));
        }

        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if header_len < Self::MIN_SIZE || header_len > data.len() {
            return Err(Error::parsing(format!(
                "invalid IPv4 header length {}",
                header_len
            )));
        }

        Ok(Self {
            header_len,
            total_length: u16::from_be_bytes([data[2], data[3]]),
            protocol: data[9],
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
        })
    }
}
