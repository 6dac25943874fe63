//! CLI argument parsing

use clap::{Parser, Subcommand};
use vnet_core::config::{DEFAULT_BUFFER_SIZE, DEFAULT_TIMEOUT_MS};
use vnet_core::{BridgeConfig, CaptureConfig, InterfaceConfig};

#[derive(Parser, Debug)]
#[command(name = "vnet")]
#[command(version, about = "Bridge a virtual subnet between an Ethernet segment and a tunnel", long_about = None)]
pub struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces,

    /// Run the bridge until interrupted
    Run(RunArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Ethernet interface on the shared segment
    #[arg(short = 'p', long, value_name = "IFACE")]
    pub physical: String,

    /// Tunnel interface (must already be up)
    #[arg(short = 't', long, value_name = "IFACE")]
    pub tunnel: String,

    /// Virtual subnet, used for both sides unless overridden
    #[arg(short = 's', long, value_name = "CIDR", default_value = "172.24.0.0/16")]
    pub subnet: String,

    /// Subnet for the physical side
    #[arg(long, value_name = "CIDR")]
    pub physical_subnet: Option<String>,

    /// Subnet for the tunnel side
    #[arg(long, value_name = "CIDR")]
    pub tunnel_subnet: Option<String>,

    /// Address the bridge claims on both sides
    #[arg(short = 'l', long, value_name = "IP", default_value = "172.24.0.1")]
    pub local_ip: String,

    /// Capture read timeout; bounds shutdown latency
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub read_timeout_ms: i32,

    /// Kernel capture buffer size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_SIZE)]
    pub buffer_size: i32,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log directive for the verbosity count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

impl RunArgs {
    pub fn bridge_config(&self) -> BridgeConfig {
        let physical_subnet = self.physical_subnet.as_deref().unwrap_or(&self.subnet);
        let tunnel_subnet = self.tunnel_subnet.as_deref().unwrap_or(&self.subnet);

        let capture = CaptureConfig {
            timeout_ms: self.read_timeout_ms,
            buffer_size: self.buffer_size,
            ..CaptureConfig::default()
        };

        BridgeConfig::new(
            InterfaceConfig::new(&self.physical, physical_subnet, &self.local_ip),
            InterfaceConfig::new(&self.tunnel, tunnel_subnet, &self.local_ip),
        )
        .with_capture(capture)
    }
}
