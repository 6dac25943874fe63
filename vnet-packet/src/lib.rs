//! Frame codecs for the vnet bridge
//!
//! This crate provides the byte-level pieces the bridge splices together:
//!
//! - [`ethernet`] - Ethernet II header parsing and frame construction
//! - [`ip`] - read-only IPv4 header view
//! - [`tunnel`] - 4-byte tunnel framing marker
//! - [`arp`] - ARP parsing, proxy replies and gratuitous announcements
//!
//! # Example
//!
//! ```rust
//! use vnet_core::MacAddr;
//! use vnet_packet::ethernet::{EtherType, EthernetHeader};
//!
//! let src = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
//! let dst = MacAddr::broadcast();
//!
//! let frame = EthernetHeader::new(dst, src, EtherType::IPv4).encapsulate(&[0x45, 0x00]);
//! assert_eq!(frame.len(), EthernetHeader::MIN_FRAME_SIZE);
//! ```

pub mod arp;
pub mod ethernet;
pub mod ip;
pub mod tunnel;

// Re-export commonly used types for convenience
pub use arp::{build_gratuitous, build_reply, ArpOpcode, ArpPacket};
pub use ethernet::{EtherType, EthernetHeader};
pub use ip::Ipv4Header;
pub use tunnel::{decapsulate_ipv4, encapsulate_ipv4, TUN_HEADER_IPV4, TUN_HEADER_SIZE};
