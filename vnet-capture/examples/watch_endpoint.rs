//! Example: watch the traffic a bridge endpoint would see
//!
//! Opens one endpoint with the bridge filter and prints every frame for ten
//! seconds. Requires capture privileges.
//!
//! Run with: sudo cargo run --example watch_endpoint -- en0 172.24.0.0/16 172.24.0.1

use std::env;
use std::time::{Duration, Instant};
use vnet_capture::Endpoint;
use vnet_core::{CaptureConfig, InterfaceConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let name = args.next().unwrap_or_else(|| "en0".to_string());
    let subnet = args.next().unwrap_or_else(|| "172.24.0.0/16".to_string());
    let local_ip = args.next().unwrap_or_else(|| "172.24.0.1".to_string());

    let config = InterfaceConfig::new(name, subnet, local_ip);
    let mut endpoint = Endpoint::open(&config, &CaptureConfig::default())?;

    let info = endpoint.info().clone();
    println!("Watching {} ({}) with filter: {}", info.name, info.mac, info.filter);
    println!();

    let start = Instant::now();
    let mut count = 0usize;
    while start.elapsed() < Duration::from_secs(10) {
        if let Some(frame) = endpoint.read() {
            count += 1;
            let preview: Vec<String> = frame.iter().take(16).map(|b| format!("{:02x}", b)).collect();
            println!("[{}] {} bytes: {}", count, frame.len(), preview.join(" "));
        }
    }

    println!("\n=== Final Statistics ===");
    println!("{}", endpoint.stats().format());

    endpoint.close();
    Ok(())
}
