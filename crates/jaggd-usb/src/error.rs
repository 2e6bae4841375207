//! Error types for the GameDrive USB transport

use thiserror::Error;

/// Result type for GameDrive USB operations
pub type Result<T> = std::result::Result<T, GameDriveError>;

/// Errors that can occur when talking to a GameDrive over USB
#[derive(Debug, Error)]
pub enum GameDriveError {
    /// No matching device on the bus
    #[error("GameDrive not found (VID:{vid:04X} PID:{pid:04X})")]
    DeviceNotFound { vid: u16, pid: u16 },

    /// Failed to enumerate or open the device
    #[error("Failed to open GameDrive: {0}")]
    OpenFailed(String),

    /// Failed to claim the interface or its endpoint
    #[error("Failed to claim interface: {0}")]
    ClaimFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// Bad `key=value` option
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl From<GameDriveError> for jaggd_core::Error {
    fn from(e: GameDriveError) -> Self {
        jaggd_core::Error::Transport(e.to_string())
    }
}
