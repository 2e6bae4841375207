//! Loaded images and their Jaguar-side layout
//!
//! A [`LayoutDescriptor`] owns the bytes of one local file together with the
//! window of those bytes that gets sent to the GameDrive and the addresses it
//! is loaded to and started from. [`detect`] builds one by running the file
//! through an ordered chain of format rules.

mod detect;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::operation::Overrides;

pub use detect::detect;

/// Refuse to load files > 17 MiB in size
pub const MAX_FILE_SIZE: u64 = 17 * 1024 * 1024;

/// Load address used when no format rule recognises the file
pub const DEFAULT_BASE_ADDR: u32 = 0x4000;

/// Which detection rule produced a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Cartridge ROM with its header at offset 0
    RomHeader,
    /// Cartridge ROM behind a 0x200 byte copier header
    RomHeaderPadded,
    /// Alcyon/GNU COFF executable
    Coff,
    /// ELF executable (recognised, not supported)
    Elf,
    /// Jaguar server executable tagged `JAGR`
    JagServer,
    /// DRI absolute binary
    Abs,
    /// Headerless ROM with a uniform 8 KiB filler in front
    PaddedRom,
    /// Headerless ROM assumed from a `.rom` file name
    RomExtension,
    /// Nothing matched; default layout applied
    Unknown,
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::RomHeader => write!(f, "ROM (header at 0x0)"),
            ImageFormat::RomHeaderPadded => write!(f, "ROM (header at 0x200)"),
            ImageFormat::Coff => write!(f, "COFF executable"),
            ImageFormat::Elf => write!(f, "ELF executable (unsupported)"),
            ImageFormat::JagServer => write!(f, "JAGR server executable"),
            ImageFormat::Abs => write!(f, "DRI ABS executable"),
            ImageFormat::PaddedRom => write!(f, "headerless ROM (padded)"),
            ImageFormat::RomExtension => write!(f, "headerless ROM (.rom)"),
            ImageFormat::Unknown => write!(f, "unknown"),
        }
    }
}

/// Where a file's payload goes in Jaguar memory
#[derive(Debug, Clone)]
pub struct LayoutDescriptor {
    buffer: Vec<u8>,
    /// Offset into the file where transferable data begins
    pub payload_offset: usize,
    /// Number of bytes to transfer
    pub payload_size: usize,
    /// Jaguar load address
    pub base_addr: u32,
    /// Jaguar entry point
    pub exec_addr: u32,
    /// Rule that produced this layout
    pub format: ImageFormat,
}

impl LayoutDescriptor {
    /// Default layout: whole file loaded and started at `$4000`
    pub fn fallback(buffer: Vec<u8>, format: ImageFormat) -> Self {
        let payload_size = buffer.len();
        Self {
            buffer,
            payload_offset: 0,
            payload_size,
            base_addr: DEFAULT_BASE_ADDR,
            exec_addr: DEFAULT_BASE_ADDR,
            format,
        }
    }

    /// Load `path` from disk and detect its layout
    pub fn load(path: &Path) -> Result<Self> {
        let buffer = load_file(path)?;
        let hint = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(detect(buffer, &hint))
    }

    /// Length of the loaded file
    pub fn file_length(&self) -> usize {
        self.buffer.len()
    }

    /// The bytes that get sent to the GameDrive
    pub fn payload(&self) -> Result<&[u8]> {
        let end = self
            .payload_offset
            .checked_add(self.payload_size)
            .filter(|end| *end <= self.buffer.len())
            .ok_or(Error::PayloadOutOfBounds {
                offset: self.payload_offset,
                size: self.payload_size,
                length: self.buffer.len(),
            })?;
        Ok(&self.buffer[self.payload_offset..end])
    }

    /// Apply explicit user overrides on top of the detected layout
    ///
    /// An explicit offset without an explicit size sends the rest of the file
    /// from that offset.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(offset) = overrides.offset {
            self.payload_offset = offset as usize;
            if overrides.size.is_none() {
                self.payload_size = self.buffer.len().saturating_sub(self.payload_offset);
            }
        }
        if let Some(size) = overrides.size {
            self.payload_size = size as usize;
        }
        if let Some(base) = overrides.base {
            self.base_addr = base;
        }
        if let Some(exec) = overrides.exec {
            self.exec_addr = exec;
        }
    }
}

/// Read a whole local file, refusing anything over [`MAX_FILE_SIZE`]
pub fn load_file(path: &Path) -> Result<Vec<u8>> {
    let io_err = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let size = file.metadata().map_err(io_err)?.len();
    if size > MAX_FILE_SIZE {
        return Err(Error::FileTooLarge {
            size,
            max: MAX_FILE_SIZE,
        });
    }

    let mut data = Vec::with_capacity(size as usize);
    file.read_to_end(&mut data).map_err(io_err)?;
    log::debug!("Read {} bytes from {}", data.len(), path.display());
    Ok(data)
}
