//! The one bridge this process may run at a time

use parking_lot::Mutex;
use tracing::info;
use vnet_bridge::{BridgeHandle, BridgeState};
use vnet_core::{Error, Result};

#[derive(Default)]
pub struct BridgeSlot {
    active: Mutex<Option<BridgeHandle>>,
}

impl BridgeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a bridge with `start` unless one is already running
    pub fn start<F>(&self, start: F) -> Result<()>
    where
        F: FnOnce() -> Result<BridgeHandle>,
    {
        let mut active = self.active.lock();
        if let Some(bridge) = active.as_ref() {
            if bridge.state() == BridgeState::Running {
                return Err(Error::InvalidState("a bridge is already running".to_string()));
            }
        }
        *active = Some(start()?);
        Ok(())
    }

    /// Stop and release the running bridge, if any
    pub fn stop(&self) {
        let bridge = self.active.lock().take();
        if let Some(bridge) = bridge {
            bridge.stop();
            info!(learned = bridge.cache().len(), "Bridge released");
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .map(|bridge| bridge.state() == BridgeState::Running)
            .unwrap_or(false)
    }
}
