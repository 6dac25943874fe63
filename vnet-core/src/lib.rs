//! vnet core library
//!
//! This crate provides the shared types, configuration and error handling
//! for the vnet bridge.

pub mod config;
pub mod error;
pub mod shutdown;
pub mod types;

// Re-export commonly used types
pub use config::{BridgeConfig, CaptureConfig, InterfaceConfig};
pub use error::{Error, Result};
pub use shutdown::Shutdown;
pub use types::*;
