//! Network interface and capture device resolution

use pcap::Device;
use pnet_datalink::{self, NetworkInterface};
use std::net::{IpAddr, Ipv4Addr};
use tracing::{debug, error};
use vnet_core::{Error, MacAddr, Result};

/// Information about a network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "en0", "utun128")
    pub name: String,
    /// Hardware address, absent on point-to-point interfaces
    pub mac: Option<MacAddr>,
    /// IPv4 addresses assigned to this interface
    pub ipv4: Vec<Ipv4Addr>,
    /// Whether the interface is up
    pub is_up: bool,
    /// Whether the interface is a loopback
    pub is_loopback: bool,
    /// Whether a capture device with the same name exists
    pub has_capture_device: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let mac = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
            .filter(|mac| !mac.is_zero());

        let ipv4 = iface
            .ips
            .iter()
            .filter_map(|network| match network.ip() {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
            .collect();

        InterfaceInfo {
            name: iface.name.clone(),
            mac,
            ipv4,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
            has_capture_device: false,
        }
    }
}

fn capture_devices() -> Vec<Device> {
    match Device::list() {
        Ok(devices) => devices,
        Err(e) => {
            error!(error = %e, "Failed to get pcap devices");
            Vec::new()
        }
    }
}

/// List all network interfaces, marking those usable for capture
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces = pnet_datalink::interfaces();

    if interfaces.is_empty() {
        return Err(Error::InterfaceNotFound(
            "no network interfaces found".to_string(),
        ));
    }

    let devices = capture_devices();

    Ok(interfaces
        .iter()
        .map(|iface| {
            let mut info = InterfaceInfo::from(iface);
            info.has_capture_device = devices.iter().any(|dev| dev.name == info.name);
            info
        })
        .collect())
}

/// Find the OS interface and the capture device sharing `name`
pub fn resolve(name: &str) -> Result<(InterfaceInfo, Device)> {
    let interfaces = pnet_datalink::interfaces();
    for iface in &interfaces {
        debug!(name = %iface.name, mac = ?iface.mac, "net interface");
    }

    let iface = interfaces
        .iter()
        .find(|iface| iface.name == name)
        .map(InterfaceInfo::from)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))?;

    let devices = capture_devices();
    for dev in &devices {
        debug!(name = %dev.name, description = ?dev.desc, "pcap device");
    }

    let device = devices
        .into_iter()
        .find(|dev| dev.name == name)
        .ok_or_else(|| Error::DeviceNotFound(name.to_string()))?;

    let info = InterfaceInfo {
        has_capture_device: true,
        ..iface
    };

    debug!(
        name = %info.name,
        mac = ?info.mac,
        "Found interface and capture device"
    );

    Ok((info, device))
}
