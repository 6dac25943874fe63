//! Bridge lifecycle: open, announce, forward, stop

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info, warn};
use vnet_capture::{Endpoint, EndpointWriter, KernelStats};
use vnet_core::{BridgeConfig, Error, Result, Shutdown};

use crate::arp_proxy::ArpProxy;
use crate::cache::AddressCache;
use crate::forward::{self, PhysicalToTunnel, TunnelToPhysical};
use crate::stats::{BridgeCounters, BridgeStats};

/// Lifecycle of a bridge. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Created,
    Running,
    Stopped,
}

impl fmt::Display for BridgeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeState::Created => write!(f, "created"),
            BridgeState::Running => write!(f, "running"),
            BridgeState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Open both endpoints named by `config` and start bridging.
///
/// Any failure tears down whatever was already opened.
pub fn start(shutdown: &Shutdown, config: &BridgeConfig) -> Result<BridgeHandle> {
    let mut physical = Endpoint::open(&config.physical, &config.capture)?;

    let tunnel = match Endpoint::open(&config.tunnel, &config.capture) {
        Ok(tunnel) => tunnel,
        Err(e) => {
            physical.close();
            return Err(e);
        }
    };

    Bridge::new(physical, tunnel).start(shutdown)
}

/// A bridge over two opened endpoints, not yet running
pub struct Bridge {
    physical: Endpoint,
    tunnel: Endpoint,
    cache: Arc<AddressCache>,
    counters: Arc<BridgeCounters>,
}

impl Bridge {
    pub fn new(physical: Endpoint, tunnel: Endpoint) -> Self {
        Self {
            physical,
            tunnel,
            cache: Arc::new(AddressCache::new()),
            counters: Arc::new(BridgeCounters::default()),
        }
    }

    pub fn state(&self) -> BridgeState {
        BridgeState::Created
    }

    /// Announce on the physical side, then launch both forwarding loops.
    ///
    /// The loops run on a child of `shutdown`: triggering `shutdown` stops
    /// them, but only [`BridgeHandle::stop`] closes the endpoints.
    pub fn start(mut self, shutdown: &Shutdown) -> Result<BridgeHandle> {
        if self.physical.info().mac.is_zero() {
            let name = self.physical.info().name.clone();
            self.physical.close();
            self.tunnel.close();
            return Err(Error::invalid_config(format!(
                "interface '{}' has no hardware address",
                name
            )));
        }

        let (mut physical_rx, physical_tx) = self.physical.split();
        let (mut tunnel_rx, tunnel_tx) = self.tunnel.split();
        let shutdown = shutdown.child();

        let proxy = ArpProxy::new(
            physical_tx.clone(),
            Arc::clone(&self.cache),
            Arc::clone(&self.counters),
        );

        let mut handle = BridgeHandle {
            shutdown: shutdown.clone(),
            threads: Mutex::new(Vec::new()),
            physical: physical_tx.clone(),
            tunnel: tunnel_tx.clone(),
            cache: Arc::clone(&self.cache),
            counters: Arc::clone(&self.counters),
            state: Mutex::new(BridgeState::Running),
        };

        // Must precede the first forwarded frame
        if let Err(e) = proxy.announce() {
            error!(error = %e, "Gratuitous ARP failed");
            physical_rx.close();
            tunnel_rx.close();
            handle.teardown();
            return Err(e);
        }

        let l2_to_l3 = PhysicalToTunnel::new(
            physical_rx.info().clone(),
            tunnel_tx,
            proxy,
            Arc::clone(&self.cache),
            Arc::clone(&self.counters),
        );
        let l3_to_l2 = TunnelToPhysical::new(
            physical_tx,
            Arc::clone(&self.cache),
            Arc::clone(&self.counters),
        );

        let token = shutdown.clone();
        let spawned = thread::Builder::new()
            .name("vnet-l2-l3".to_string())
            .spawn(move || forward::run(l2_to_l3, physical_rx, token));
        match spawned {
            Ok(thread) => handle.threads.get_mut().push(thread),
            Err(e) => {
                tunnel_rx.close();
                handle.teardown();
                return Err(e.into());
            }
        }

        let token = shutdown.clone();
        let spawned = thread::Builder::new()
            .name("vnet-l3-l2".to_string())
            .spawn(move || forward::run(l3_to_l2, tunnel_rx, token));
        match spawned {
            Ok(thread) => handle.threads.get_mut().push(thread),
            Err(e) => {
                handle.teardown();
                return Err(e.into());
            }
        }

        info!(
            physical = %handle.physical.info().name,
            tunnel = %handle.tunnel.info().name,
            subnet = %handle.physical.info().subnet,
            "Bridge started"
        );

        Ok(handle)
    }
}

/// A running bridge. Dropping the handle stops it.
pub struct BridgeHandle {
    shutdown: Shutdown,
    threads: Mutex<Vec<JoinHandle<Option<KernelStats>>>>,
    physical: EndpointWriter,
    tunnel: EndpointWriter,
    cache: Arc<AddressCache>,
    counters: Arc<BridgeCounters>,
    state: Mutex<BridgeState>,
}

impl BridgeHandle {
    /// Stop both loops, wait for them, then close both endpoints.
    ///
    /// Idempotent; concurrent callers return once the bridge is stopped.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if *state == BridgeState::Stopped {
            return;
        }

        info!("Stopping bridge");
        self.shutdown.trigger();

        let threads: Vec<_> = self.threads.lock().drain(..).collect();
        for thread in threads {
            let name = thread.thread().name().unwrap_or("forward").to_string();
            match thread.join() {
                Ok(Some(kernel)) => info!(
                    thread = %name,
                    received = kernel.received,
                    dropped = kernel.dropped,
                    if_dropped = kernel.if_dropped,
                    "Capture statistics"
                ),
                Ok(None) => {}
                Err(_) => error!(thread = %name, "Forwarding thread panicked"),
            }
        }

        self.physical.close();
        self.tunnel.close();
        *state = BridgeState::Stopped;

        let stats = self.stats();
        info!(
            to_tunnel = stats.physical_to_tunnel,
            to_physical = stats.tunnel_to_physical,
            arp_replies = stats.arp_replies,
            learned = self.cache.len(),
            dropped = stats.dropped(),
            "Bridge stopped"
        );
    }

    /// Same as [`BridgeHandle::stop`]
    pub fn close(&self) {
        self.stop();
    }

    pub fn state(&self) -> BridgeState {
        *self.state.lock()
    }

    pub fn stats(&self) -> BridgeStats {
        self.counters.snapshot()
    }

    pub fn cache(&self) -> &AddressCache {
        &self.cache
    }

    pub fn physical(&self) -> &EndpointWriter {
        &self.physical
    }

    pub fn tunnel(&self) -> &EndpointWriter {
        &self.tunnel
    }

    /// Whether both endpoints have released their sessions
    pub fn is_closed(&self) -> bool {
        self.physical.is_closed() && self.tunnel.is_closed()
    }

    /// Abort a partially started bridge
    fn teardown(&mut self) {
        warn!("Bridge startup aborted");
        self.shutdown.trigger();
        for thread in self.threads.get_mut().drain(..) {
            let _ = thread.join();
        }
        self.physical.close();
        self.tunnel.close();
        *self.state.get_mut() = BridgeState::Stopped;
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
