//! Frame endpoints for the vnet bridge
//!
//! This crate wraps pcap into the two primitives the bridge needs on each
//! interface: a filtered, blocking frame source and a thread-safe injector.
//!
//! ## Features
//!
//! - **Interface Resolution**: match an OS interface and a capture device by name
//! - **Endpoint Sessions**: promiscuous, immediate-mode capture with a bounded read timeout
//! - **Split Halves**: an exclusively owned reader and a cloneable writer per endpoint
//! - **Statistics**: per-endpoint frame counters plus kernel drop counters
//!
//! ## Example
//!
//! ```no_run
//! use vnet_capture::Endpoint;
//! use vnet_core::{CaptureConfig, InterfaceConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = InterfaceConfig::new("en0", "172.24.0.0/16", "172.24.0.1");
//! let mut endpoint = Endpoint::open(&config, &CaptureConfig::default())?;
//!
//! if let Some(frame) = endpoint.read() {
//!     println!("Got frame: {} bytes", frame.len());
//! }
//!
//! endpoint.close();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod endpoint;
pub mod filters;
pub mod interface;
pub mod stats;

// Re-export main types
pub use capture::{PcapReader, PcapWriter};
pub use endpoint::{Endpoint, EndpointInfo, EndpointReader, EndpointWriter, FrameReader, FrameWriter};
pub use interface::{list_interfaces, resolve, InterfaceInfo};
pub use stats::{EndpointStats, KernelStats, StatsAccumulator};
