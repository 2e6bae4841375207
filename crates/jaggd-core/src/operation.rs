//! Resolved operation parameters
//!
//! The CLI turns its arguments into an [`Operation`]; everything past that
//! point works on these already-validated values and never sees argument
//! syntax.

use std::path::PathBuf;

use crate::protocol::{EepromType, ResetMode};

/// Explicit user overrides of a detected layout; `None` keeps the detected
/// value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Jaguar load address
    pub base: Option<u32>,
    /// Number of bytes to send
    pub size: Option<u32>,
    /// File offset of the first byte to send
    pub offset: Option<u32>,
    /// Jaguar entry point
    pub exec: Option<u32>,
}

impl Overrides {
    /// True if no override is set
    pub fn is_empty(&self) -> bool {
        *self == Overrides::default()
    }
}

/// Upload a local file to Jaguar memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Local file to upload
    pub path: PathBuf,
    /// Layout overrides
    pub overrides: Overrides,
}

/// How to start code once it is in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecuteMode {
    /// Jump to an entry point. `None` uses the uploaded file's entry point.
    Jump(Option<u32>),
    /// Reboot and let the console boot the ROM now in memory
    ViaReboot,
}

/// Back the cartridge EEPROM with a file on the memory card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EepromRequest {
    /// File name on the memory card
    pub name: String,
    /// EEPROM size class
    pub eeprom: EepromType,
}

/// Copy a local file onto the memory card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFileRequest {
    /// Local file to send
    pub source: PathBuf,
    /// File name on the memory card
    pub dest_name: String,
}

/// Everything one jaggd invocation asks the GameDrive to do
///
/// Steps run in a fixed order: reset, EEPROM, write file, upload/execute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    /// Reset first
    pub reset: Option<ResetMode>,
    /// Enable an EEPROM file
    pub eeprom: Option<EepromRequest>,
    /// Write a file to the memory card
    pub write_file: Option<WriteFileRequest>,
    /// Upload a file to memory
    pub upload: Option<UploadRequest>,
    /// Start code after the upload, or on its own
    pub execute: Option<ExecuteMode>,
}

impl Operation {
    /// True if nothing would be sent to the device
    pub fn is_empty(&self) -> bool {
        self.reset.is_none()
            && self.eeprom.is_none()
            && self.write_file.is_none()
            && self.upload.is_none()
            && self.execute.is_none()
    }
}
