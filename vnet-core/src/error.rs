//! Error types for the vnet bridge

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the vnet bridge
#[derive(Error, Debug)]
pub enum Error {
    /// Network I/O error
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed subnet or address, or an address outside its subnet
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// OS network interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Capture-capable device not found
    #[error("Capture device '{0}' not found")]
    DeviceNotFound(String),

    /// Capture session could not be opened, activated or filtered
    #[error("Capture activation error: {0}")]
    Activation(String),

    /// Frame injection failed
    #[error("Write error: {0}")]
    Write(String),

    /// Packet construction error
    #[error("Packet construction error: {0}")]
    PacketConstruction(String),

    /// Packet parsing error
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),

    /// Operation not valid in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfig(msg.into())
    }

    /// Create an activation error with a custom message
    pub fn activation<S: Into<String>>(msg: S) -> Self {
        Error::Activation(msg.into())
    }

    /// Create a write error with a custom message
    pub fn write<S: Into<String>>(msg: S) -> Self {
        Error::Write(msg.into())
    }

    /// Create a packet parsing error
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Error::PacketParsing(msg.into())
    }

    /// Create a packet construction error
    pub fn construction<S: Into<String>>(msg: S) -> Self {
        Error::PacketConstruction(msg.into())
    }

    /// Whether this error aborts bridge startup rather than a single frame
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_)
                | Error::InterfaceNotFound(_)
                | Error::DeviceNotFound(_)
                | Error::Activation(_)
                | Error::InvalidState(_)
                | Error::Io(_)
        )
    }
}
