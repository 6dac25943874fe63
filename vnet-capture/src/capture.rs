//! pcap-backed endpoint sessions

use parking_lot::Mutex;
use pcap::{Active, Capture, Device};
use std::sync::Arc;
use tracing::{debug, error, info};
use vnet_core::{CaptureConfig, Error, InterfaceConfig, MacAddr, Result};

use crate::endpoint::{Endpoint, EndpointInfo, FrameReader, FrameWriter};
use crate::filters;
use crate::interface;
use crate::stats::KernelStats;

/// Open a pcap session on `device` with the bridge's capture parameters
fn open_session(device: Device, config: &CaptureConfig) -> Result<Capture<Active>> {
    let name = device.name.clone();

    Capture::from_device(device)
        .map_err(|e| Error::activation(format!("Failed to create capture on {}: {}", name, e)))?
        .promisc(config.promiscuous)
        .snaplen(config.snaplen)
        .timeout(config.timeout_ms)
        .immediate_mode(config.immediate_mode)
        .buffer_size(config.buffer_size)
        .open()
        .map_err(|e| Error::activation(format!("Failed to open capture on {}: {}", name, e)))
}

fn install_filter(capture: &mut Capture<Active>, name: &str, filter: &str) -> Result<()> {
    capture
        .filter(filter, true)
        .map_err(|e| Error::activation(format!("Failed to set filter on {}: {}", name, e)))?;
    debug!(interface = %name, filter = %filter, "Applied filter");
    Ok(())
}

/// Capture side of a pcap endpoint
pub struct PcapReader {
    interface: String,
    capture: Option<Capture<Active>>,
}

impl FrameReader for PcapReader {
    fn read(&mut self) -> Option<&[u8]> {
        let capture = self.capture.as_mut()?;
        match capture.next_packet() {
            Ok(packet) => Some(packet.data),
            Err(pcap::Error::TimeoutExpired) => None,
            Err(e) => {
                error!(interface = %self.interface, error = %e, "read packet error");
                None
            }
        }
    }

    fn close(&mut self) {
        // Dropping the capture closes the pcap handle
        self.capture.take();
    }

    fn kernel_stats(&mut self) -> Option<KernelStats> {
        let capture = self.capture.as_mut()?;
        match capture.stats() {
            Ok(stats) => Some(KernelStats::from_pcap_stats(stats)),
            Err(e) => {
                debug!(interface = %self.interface, error = %e, "Failed to get capture stats");
                None
            }
        }
    }
}

/// Injection side of a pcap endpoint.
///
/// Uses its own session so a reader blocked in `next_packet` never delays a
/// write. The session's filter matches nothing.
pub struct PcapWriter {
    interface: String,
    capture: Mutex<Option<Capture<Active>>>,
}

impl FrameWriter for PcapWriter {
    fn write(&self, frame: &[u8]) -> Result<()> {
        let mut guard = self.capture.lock();
        let capture = guard
            .as_mut()
            .ok_or_else(|| Error::write(format!("endpoint {} is closed", self.interface)))?;

        capture
            .sendpacket(frame)
            .map_err(|e| Error::write(format!("write packet error: {}", e)))
    }

    fn close(&self) {
        self.capture.lock().take();
    }

    fn is_closed(&self) -> bool {
        self.capture.lock().is_none()
    }
}

impl Endpoint {
    /// Bind `config` to live capture and injection sessions.
    ///
    /// Fails with `InterfaceNotFound`/`DeviceNotFound` if the name does not
    /// resolve, `InvalidConfig` for bad addressing, and `Activation` if a
    /// session cannot be opened or filtered. Nothing stays open on failure.
    pub fn open(config: &InterfaceConfig, capture: &CaptureConfig) -> Result<Self> {
        let (iface, device) = interface::resolve(&config.name)?;
        let (subnet, local_ip) = config.addressing()?;
        capture.validate()?;

        info!(
            name = %iface.name,
            device = %device.name,
            mac = %iface.mac.unwrap_or_default(),
            "Using interface"
        );

        let filter = filters::bridge_filter(&subnet);

        let mut read_session = open_session(device.clone(), capture)?;
        install_filter(&mut read_session, &config.name, &filter)?;

        let mut write_session = open_session(device, capture)?;
        install_filter(&mut write_session, &config.name, &filters::inject_only_filter())?;

        let info = EndpointInfo {
            name: config.name.clone(),
            mac: iface.mac.unwrap_or(MacAddr::zero()),
            local_ip,
            subnet,
            filter,
        };

        let reader = PcapReader {
            interface: config.name.clone(),
            capture: Some(read_session),
        };
        let writer = PcapWriter {
            interface: config.name.clone(),
            capture: Mutex::new(Some(write_session)),
        };

        info!(
            interface = %info.name,
            local_ip = %info.local_ip,
            subnet = %info.subnet,
            "Endpoint opened"
        );

        Ok(Endpoint::from_parts(info, Box::new(reader), Arc::new(writer)))
    }
}
