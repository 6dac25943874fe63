//! Cooperative cancellation shared between the bridge and its caller

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable cancellation flag.
///
/// A token created with [`Shutdown::child`] reports triggered when either it
/// or any of its ancestors has been triggered. Triggering a child never
/// affects the parent.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<Shutdown>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a token that is also triggered by this one
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::new(self.clone())),
        }
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .map(|parent| parent.is_triggered())
                .unwrap_or(false)
    }
}
