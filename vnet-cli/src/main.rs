use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use vnet_capture::list_interfaces;
use vnet_cli::{BridgeSlot, Cli, Commands, RunArgs};
use vnet_core::Shutdown;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Interfaces => print_interfaces(),
        Commands::Run(args) => run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "vnet failed");
            ExitCode::FAILURE
        }
    }
}

fn print_interfaces() -> vnet_core::Result<()> {
    let interfaces = list_interfaces()?;

    println!("{:<16} {:<18} {:<5} {:<5} ADDRESSES", "NAME", "MAC", "UP", "PCAP");
    for iface in interfaces.iter().filter(|iface| !iface.is_loopback) {
        let mac = iface
            .mac
            .map(|mac| mac.to_string())
            .unwrap_or_else(|| "-".to_string());
        let addresses: Vec<String> = iface.ipv4.iter().map(|ip| ip.to_string()).collect();
        println!(
            "{:<16} {:<18} {:<5} {:<5} {}",
            iface.name,
            mac,
            if iface.is_up { "yes" } else { "no" },
            if iface.has_capture_device { "yes" } else { "no" },
            addresses.join(", ")
        );
    }

    Ok(())
}

async fn run(args: RunArgs) -> vnet_core::Result<()> {
    let config = args.bridge_config();
    let shutdown = Shutdown::new();
    let slot = Arc::new(BridgeSlot::new());

    // Endpoint setup blocks on pcap
    let starter = {
        let slot = Arc::clone(&slot);
        let shutdown = shutdown.clone();
        tokio::task::spawn_blocking(move || slot.start(|| vnet_bridge::start(&shutdown, &config)))
    };
    starter
        .await
        .map_err(|e| vnet_core::Error::InvalidState(e.to_string()))??;

    info!("Bridge running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Interrupt received");
    shutdown.trigger();
    tokio::task::spawn_blocking(move || slot.stop())
        .await
        .map_err(|e| vnet_core::Error::InvalidState(e.to_string()))?;

    Ok(())
}
