//! Bridge and capture configuration

use crate::{Error, Result};
use ipnetwork::Ipv4Network;
use std::net::{IpAddr, Ipv4Addr};

/// Default snapshot length, a full Ethernet frame plus headroom
pub const DEFAULT_SNAPLEN: i32 = 1600;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: i32 = 250;

/// Default kernel receive buffer (512 KiB)
pub const DEFAULT_BUFFER_SIZE: i32 = 512 * 1024;

/// One side of the bridge, as supplied by the surrounding process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Interface name (e.g., "en0", "utun128")
    pub name: String,
    /// Virtual subnet in CIDR notation (e.g., "172.24.0.0/16")
    pub subnet: String,
    /// Local IPv4 address inside the subnet
    pub local_ip: String,
}

impl InterfaceConfig {
    pub fn new(
        name: impl Into<String>,
        subnet: impl Into<String>,
        local_ip: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            subnet: subnet.into(),
            local_ip: local_ip.into(),
        }
    }

    /// Parse the subnet, normalized to its network address
    pub fn parse_subnet(&self) -> Result<Ipv4Network> {
        if !self.subnet.contains('/') {
            return Err(Error::invalid_config(format!(
                "subnet '{}' is missing a prefix length",
                self.subnet
            )));
        }

        let parsed: Ipv4Network = self.subnet.trim().parse().map_err(|e| {
            Error::invalid_config(format!("invalid subnet '{}': {}", self.subnet, e))
        })?;

        Ipv4Network::new(parsed.network(), parsed.prefix())
            .map_err(|e| Error::invalid_config(format!("invalid subnet '{}': {}", self.subnet, e)))
    }

    /// Parse the local address and check it lies inside `subnet`
    pub fn parse_local_ip(&self, subnet: &Ipv4Network) -> Result<Ipv4Addr> {
        let ip: IpAddr = self.local_ip.trim().parse().map_err(|_| {
            Error::invalid_config(format!("invalid local IP '{}'", self.local_ip))
        })?;

        let ip = match ip {
            IpAddr::V4(ip) => ip,
            IpAddr::V6(_) => {
                return Err(Error::invalid_config(format!(
                    "local IP '{}' is not IPv4",
                    self.local_ip
                )))
            }
        };

        if !subnet.contains(ip) {
            return Err(Error::invalid_config(format!(
                "local ip ({}) not in network ({})",
                ip, subnet
            )));
        }

        Ok(ip)
    }

    /// Parse and validate both the subnet and the local address
    pub fn addressing(&self) -> Result<(Ipv4Network, Ipv4Addr)> {
        let subnet = self.parse_subnet()?;
        let local_ip = self.parse_local_ip(&subnet)?;
        Ok((subnet, local_ip))
    }
}

/// Configuration for a capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Kernel buffer size in bytes
    pub buffer_size: i32,
    /// Enable immediate mode (deliver packets immediately)
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
            immediate_mode: true,
        }
    }
}

impl CaptureConfig {
    /// Reject parameters below what a full Ethernet frame needs
    pub fn validate(&self) -> Result<()> {
        if self.snaplen < DEFAULT_SNAPLEN {
            return Err(Error::invalid_config(format!(
                "snaplen {} is below {}",
                self.snaplen, DEFAULT_SNAPLEN
            )));
        }
        if self.timeout_ms <= 0 {
            return Err(Error::invalid_config("read timeout must be positive"));
        }
        if self.buffer_size < DEFAULT_BUFFER_SIZE {
            return Err(Error::invalid_config(format!(
                "buffer size {} is below {}",
                self.buffer_size, DEFAULT_BUFFER_SIZE
            )));
        }
        Ok(())
    }
}

/// Both sides of the bridge plus capture parameters
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Ethernet-capable interface on the shared LAN segment
    pub physical: InterfaceConfig,
    /// Point-to-point tunnel interface
    pub tunnel: InterfaceConfig,
    pub capture: CaptureConfig,
}

impl BridgeConfig {
    pub fn new(physical: InterfaceConfig, tunnel: InterfaceConfig) -> Self {
        Self {
            physical,
            tunnel,
            capture: CaptureConfig::default(),
        }
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }
}
