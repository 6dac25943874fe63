//! Command-line front end for the vnet bridge
//!
//! Argument parsing and the process-wide bridge slot live here so they can
//! be tested without the binary.

pub mod args;
pub mod slot;

pub use args::{Cli, Commands, RunArgs};
pub use slot::BridgeSlot;
