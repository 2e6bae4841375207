//! Error types for jaggd-core

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a GameDrive operation
#[derive(Debug, Error)]
pub enum Error {
    /// Opening, sizing or reading a local file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Local file is larger than anything the Jaguar can hold
    #[error("Refusing to load file of size {size} (limit {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    /// Address is outside the RAM window the GameDrive stub accepts
    #[error("{field} address 0x{addr:08X} is outside 0x{start:06X}-0x{end:06X}")]
    AddressOutOfRange {
        field: &'static str,
        addr: u64,
        start: u32,
        end: u32,
    },

    /// Payload window does not lie inside the loaded file
    #[error("Payload window 0x{offset:X}+0x{size:X} exceeds file length 0x{length:X}")]
    PayloadOutOfBounds {
        offset: usize,
        size: usize,
        length: usize,
    },

    /// A name or number does not fit its packet field
    #[error("{field} does not fit its packet field ({len} > {max})")]
    FieldOverflow {
        field: &'static str,
        len: u64,
        max: u64,
    },

    /// Execute-only was requested without an entry address
    #[error("No execution address given")]
    MissingExecAddress,

    /// The operation asks for nothing to be sent
    #[error("Nothing to do: no reset, upload, execute, EEPROM or write requested")]
    NothingToDo,

    /// USB transfer failed; the operation cannot be resumed
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for jaggd-core operations
pub type Result<T> = std::result::Result<T, Error>;
