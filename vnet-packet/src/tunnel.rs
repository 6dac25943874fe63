//! Point-to-point tunnel framing
//!
//! Every payload on the tunnel interface is prefixed by a 4-byte family
//! marker. Only the IPv4 marker is understood.

use vnet_core::{Error, Result};

/// Framing header size
pub const TUN_HEADER_SIZE: usize = 4;

/// Marker identifying an IPv4 payload
pub const TUN_HEADER_IPV4: [u8; TUN_HEADER_SIZE] = [0x02, 0x00, 0x00, 0x00];

/// Prefix an IPv4 datagram with the tunnel marker
pub fn encapsulate_ipv4(datagram: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(TUN_HEADER_SIZE + datagram.len());
    frame.extend_from_slice(&TUN_HEADER_IPV4);
    frame.extend_from_slice(datagram);
    frame
}

/// Return the IPv4 datagram carried by a tunnel frame
pub fn decapsulate_ipv4(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < TUN_HEADER_SIZE {
        return Err(Error::parsing(format!(
            "tunnel frame too short: {} bytes",
            frame.len()
        )));
    }

    let (marker, datagram) = frame.split_at(TUN_HEADER_SIZE);
    if marker != TUN_HEADER_IPV4.as_slice() {
        return Err(Error::parsing(format!(
            "unsupported tunnel marker {:02x?}",
            marker
        )));
    }

    Ok(datagram)
}
