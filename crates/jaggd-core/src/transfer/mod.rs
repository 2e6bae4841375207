//! Sending commands and payloads to the GameDrive
//!
//! A [`Plan`] is built from an [`Operation`](crate::Operation) up front: the
//! file is loaded and detected, addresses are checked against
//! [`RAM_WINDOW`](crate::RAM_WINDOW) and every packet is encoded. Only a
//! complete plan is handed to the [`Orchestrator`], so a bad address or an
//! oversized name never results in a half-sent operation.

mod orchestrator;
mod plan;

use std::time::Duration;

use crate::error::Result;

pub use orchestrator::Orchestrator;
pub use plan::{Plan, Step};

/// Largest bulk transfer the GameDrive accepts in one go
pub const MAX_CHUNK_SIZE: usize = 16 * 1024;

/// The USB link to a GameDrive
///
/// Both calls block until the transfer completes or `timeout` expires, and
/// return the number of bytes the device actually took.
pub trait Transport {
    /// Send a command packet as the data stage of a vendor control transfer
    fn control_transfer(&mut self, packet: &[u8], timeout: Duration) -> Result<usize>;

    /// Send payload bytes to the bulk OUT endpoint
    fn bulk_transfer(&mut self, data: &[u8], timeout: Duration) -> Result<usize>;
}

/// Timing and chunking parameters
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Timeout for each command packet
    pub control_timeout: Duration,
    /// Timeout for each bulk transfer of an upload
    pub upload_timeout: Duration,
    /// Timeout for each bulk transfer of a memory card write
    pub write_file_timeout: Duration,
    /// Bytes per bulk transfer, capped at [`MAX_CHUNK_SIZE`]
    pub chunk_size: usize,
    /// Time the firmware needs after a reset before it takes commands again
    pub settle_delay: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            control_timeout: Duration::from_secs(2),
            upload_timeout: Duration::from_secs(2 * 60),
            write_file_timeout: Duration::from_secs(5 * 60),
            chunk_size: MAX_CHUNK_SIZE,
            settle_delay: Duration::from_secs(1),
        }
    }
}

impl TransferConfig {
    /// Effective bulk chunk size
    pub fn chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, MAX_CHUNK_SIZE)
    }
}

/// Which bulk payload is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPhase {
    /// Payload of an upload/execute command
    Upload,
    /// Contents of a file written to the memory card
    WriteFile,
}

impl std::fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferPhase::Upload => write!(f, "Uploading"),
            TransferPhase::WriteFile => write!(f, "Writing"),
        }
    }
}

/// Progress callbacks for bulk payloads
pub trait TransferProgress {
    /// A payload of `total` bytes is about to be sent
    fn started(&mut self, phase: TransferPhase, total: u64);

    /// `sent` bytes are through, `percent` of the total
    fn progress(&mut self, sent: u64, percent: u32);

    /// The payload is complete
    fn finished(&mut self, phase: TransferPhase);
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl TransferProgress for NoProgress {
    fn started(&mut self, _phase: TransferPhase, _total: u64) {}
    fn progress(&mut self, _sent: u64, _percent: u32) {}
    fn finished(&mut self, _phase: TransferPhase) {}
}

/// Whole percent of `total` covered by `sent`, rounded down
pub fn percent(sent: u64, total: u64) -> u32 {
    if total == 0 {
        return 100;
    }
    (sent.min(total) * 100 / total) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(percent(0, 300), 0);
        assert_eq!(percent(2, 300), 0);
        assert_eq!(percent(3, 300), 1);
        assert_eq!(percent(299, 300), 99);
        assert_eq!(percent(300, 300), 100);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn test_chunk_size_clamped() {
        let mut config = TransferConfig::default();
        assert_eq!(config.chunk_size(), 16 * 1024);
        config.chunk_size = 1024 * 1024;
        assert_eq!(config.chunk_size(), 16 * 1024);
        config.chunk_size = 0;
        assert_eq!(config.chunk_size(), 1);
    }
}
