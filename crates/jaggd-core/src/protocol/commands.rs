//! Command packet encoders

use super::fields::{put_be32, put_bytes, put_le32, put_name, size_u32};
use crate::error::Result;

/// Reset packet length
pub const RESET_LEN: usize = 0x02;
/// Upload/execute packet length
pub const UPLOAD_EXECUTE_LEN: usize = 0x14;
/// Write-file packet length
pub const WRITE_FILE_LEN: usize = 0x36;
/// Enable-EEPROM packet length
pub const ENABLE_EEPROM_LEN: usize = 0x39;

/// Width of the destination name field in a write-file packet
pub const WRITE_FILE_NAME_WIDTH: usize = 0x30;
/// Width of the source name field in an enable-EEPROM packet
pub const EEPROM_NAME_WIDTH: usize = ENABLE_EEPROM_LEN - 0x09;

// Command bytes
const CMD_RESET: u8 = 0x02;
const CMD_UPLOAD_EXECUTE: u8 = 0x02;
const CMD_WRITE_FILE: u8 = 0x05;
const CMD_ENABLE_EEPROM: u8 = 0x02;
const EEPROM_SUBCMD: [u8; 2] = [0x33, 0x06];

// Upload/execute framing markers at 0x06
const FRAMING_UPLOAD: [u8; 2] = [0x0E, 0x04];
const FRAMING_EXECUTE_ONLY: [u8; 2] = [0x06, 0x05];

// Firmware magic, meaning unknown
const EXECUTE_ONLY_MAGIC_0C: [u8; 4] = [0x7A, 0x77, 0x4A, 0x00];
const EXECUTE_ONLY_MAGIC_10: [u8; 4] = [0x00, 0x00, 0x84, 0x19];

/// Which command a packet carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Reset,
    UploadExecute,
    WriteFile,
    EnableEeprom,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::Reset => write!(f, "reset"),
            CommandKind::UploadExecute => write!(f, "upload/execute"),
            CommandKind::WriteFile => write!(f, "write file"),
            CommandKind::EnableEeprom => write!(f, "enable EEPROM"),
        }
    }
}

/// An encoded command, ready to go out as a control transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandPacket {
    kind: CommandKind,
    bytes: Vec<u8>,
}

impl CommandPacket {
    fn new(kind: CommandKind, len: usize) -> Self {
        Self {
            kind,
            bytes: vec![0; len],
        }
    }

    /// Command carried by this packet
    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    /// Raw packet bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Where a reset lands
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Reboot into the GameDrive menu
    Menu = 0,
    /// Reboot into the debug stub, ready for uploads
    DebugStub = 1,
    /// Reboot and boot the ROM currently loaded
    RebootKeepRom = 6,
}

impl std::fmt::Display for ResetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetMode::Menu => write!(f, "menu"),
            ResetMode::DebugStub => write!(f, "debug stub"),
            ResetMode::RebootKeepRom => write!(f, "reboot keeping ROM"),
        }
    }
}

/// EEPROM size classes understood by the memory card firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EepromType {
    /// 128 bytes (93C46)
    #[default]
    Small,
    /// 256 or 512 bytes (93C56/93C66)
    Medium,
    /// 1024 or 2048 bytes (93C76/93C86)
    Large,
}

impl EepromType {
    /// Map an EEPROM size in bytes to its type
    pub fn from_size(bytes: u32) -> Option<Self> {
        match bytes {
            128 => Some(EepromType::Small),
            256 | 512 => Some(EepromType::Medium),
            1024 | 2048 => Some(EepromType::Large),
            _ => None,
        }
    }

    /// Type code byte sent to the firmware
    pub fn code(&self) -> u8 {
        match self {
            EepromType::Small => 0,
            EepromType::Medium => 1,
            EepromType::Large => 2,
        }
    }
}

/// Parameters of an upload/execute packet
///
/// A payload selects the upload framing; without one the packet only
/// starts code that is already in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadExecute {
    /// Upload `size` bytes to `base_addr`, optionally jumping to `exec_addr`
    /// once the payload has arrived
    Upload {
        base_addr: u32,
        size: usize,
        exec_addr: Option<u32>,
    },
    /// Jump to `exec_addr` without uploading anything
    ExecuteOnly { exec_addr: u32 },
}

/// Encode a reset: `[0x02, mode]`
pub fn encode_reset(mode: ResetMode) -> CommandPacket {
    let mut packet = CommandPacket::new(CommandKind::Reset, RESET_LEN);
    packet.bytes[0] = RESET_LEN as u8;
    packet.bytes[1] = mode as u8;
    packet
}

/// Encode an upload/execute packet
///
/// | Offset | Width | Upload                | Execute only  |
/// |--------|-------|-----------------------|---------------|
/// | 0x00   | 2     | `14 02`               | `14 02`       |
/// | 0x02   | 4 LE  | payload size          | 0             |
/// | 0x06   | 2     | `0E 04`               | `06 05`       |
/// | 0x08   | 4 BE  | load address          | entry address |
/// | 0x0C   | 4 BE  | payload size          | `7A 77 4A 00` |
/// | 0x10   | 4 BE  | entry address, or 0   | `00 00 84 19` |
pub fn encode_upload_execute(request: &UploadExecute) -> Result<CommandPacket> {
    let mut packet = CommandPacket::new(CommandKind::UploadExecute, UPLOAD_EXECUTE_LEN);
    let buf = &mut packet.bytes;
    buf[0] = UPLOAD_EXECUTE_LEN as u8;
    buf[1] = CMD_UPLOAD_EXECUTE;

    match *request {
        UploadExecute::Upload {
            base_addr,
            size,
            exec_addr,
        } => {
            let size = size_u32("payload size", size as u64)?;
            put_le32(buf, 0x02, size);
            put_bytes(buf, 0x06, &FRAMING_UPLOAD);
            put_be32(buf, 0x08, base_addr);
            put_be32(buf, 0x0C, size);
            put_be32(buf, 0x10, exec_addr.unwrap_or(0));
        }
        UploadExecute::ExecuteOnly { exec_addr } => {
            put_le32(buf, 0x02, 0);
            put_bytes(buf, 0x06, &FRAMING_EXECUTE_ONLY);
            put_be32(buf, 0x08, exec_addr);
            put_bytes(buf, 0x0C, &EXECUTE_ONLY_MAGIC_0C);
            put_bytes(buf, 0x10, &EXECUTE_ONLY_MAGIC_10);
        }
    }

    Ok(packet)
}

/// Encode a write-file packet announcing `size` bytes for `dest_name` on the
/// memory card
///
/// Name at 0x02 (48 bytes, NUL padded), size at 0x32 (4 bytes LE).
pub fn encode_write_file(dest_name: &str, size: u64) -> Result<CommandPacket> {
    let mut packet = CommandPacket::new(CommandKind::WriteFile, WRITE_FILE_LEN);
    let buf = &mut packet.bytes;
    buf[0] = WRITE_FILE_LEN as u8;
    buf[1] = CMD_WRITE_FILE;
    put_name(buf, 0x02, WRITE_FILE_NAME_WIDTH, "destination name", dest_name)?;
    put_le32(buf, 0x32, size_u32("file size", size)?);
    Ok(packet)
}

/// Encode an enable-EEPROM packet backing the cartridge EEPROM with
/// `src_name` on the memory card
///
/// Four zero bytes at 0x02, sub-command `33 06` at 0x06, type code at 0x08,
/// NUL-terminated name from 0x09 to the end of the packet.
pub fn encode_enable_eeprom(eeprom: EepromType, src_name: &str) -> Result<CommandPacket> {
    let mut packet = CommandPacket::new(CommandKind::EnableEeprom, ENABLE_EEPROM_LEN);
    let buf = &mut packet.bytes;
    buf[0] = ENABLE_EEPROM_LEN as u8;
    buf[1] = CMD_ENABLE_EEPROM;
    put_bytes(buf, 0x06, &EEPROM_SUBCMD);
    buf[0x08] = eeprom.code();
    put_name(buf, 0x09, EEPROM_NAME_WIDTH, "EEPROM name", src_name)?;
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn le32(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    fn be32(buf: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn test_reset() {
        assert_eq!(encode_reset(ResetMode::Menu).as_bytes(), &[0x02, 0x00]);
        assert_eq!(encode_reset(ResetMode::DebugStub).as_bytes(), &[0x02, 0x01]);
        assert_eq!(
            encode_reset(ResetMode::RebootKeepRom).as_bytes(),
            &[0x02, 0x06]
        );
    }

    #[test]
    fn test_upload_without_execute() {
        let packet = encode_upload_execute(&UploadExecute::Upload {
            base_addr: 0x80_2000,
            size: 256,
            exec_addr: None,
        })
        .unwrap();
        let buf = packet.as_bytes();

        assert_eq!(buf.len(), 0x14);
        assert_eq!(&buf[0..2], &[0x14, 0x02]);
        assert_eq!(le32(buf, 0x02), 256);
        assert_eq!(&buf[0x06..0x08], &[0x0E, 0x04]);
        assert_eq!(be32(buf, 0x08), 0x80_2000);
        assert_eq!(be32(buf, 0x0C), 256);
        assert_eq!(&buf[0x10..0x14], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_upload_and_execute() {
        let packet = encode_upload_execute(&UploadExecute::Upload {
            base_addr: 0x4000,
            size: 0x12_3456,
            exec_addr: Some(0x4010),
        })
        .unwrap();
        assert_eq!(
            packet.as_bytes(),
            &[
                0x14, 0x02, 0x56, 0x34, 0x12, 0x00, 0x0E, 0x04, 0x00, 0x00, 0x40, 0x00, 0x00, 0x12,
                0x34, 0x56, 0x00, 0x00, 0x40, 0x10,
            ]
        );
    }

    #[test]
    fn test_execute_only() {
        let packet =
            encode_upload_execute(&UploadExecute::ExecuteOnly { exec_addr: 0x80_2000 }).unwrap();
        assert_eq!(
            packet.as_bytes(),
            &[
                0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x06, 0x05, 0x00, 0x80, 0x20, 0x00, 0x7A, 0x77,
                0x4A, 0x00, 0x00, 0x00, 0x84, 0x19,
            ]
        );
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_upload_size_overflow() {
        let err = encode_upload_execute(&UploadExecute::Upload {
            base_addr: 0x4000,
            size: u32::MAX as usize + 1,
            exec_addr: None,
        })
        .unwrap_err();
        assert!(matches!(err, Error::FieldOverflow { .. }));
    }

    #[test]
    fn test_write_file() {
        let packet = encode_write_file("GAME.J64", 0x0001_0203).unwrap();
        let buf = packet.as_bytes();
        assert_eq!(buf.len(), 0x36);
        assert_eq!(&buf[0..2], &[0x36, 0x05]);
        assert_eq!(&buf[0x02..0x0A], b"GAME.J64");
        assert!(buf[0x0A..0x32].iter().all(|b| *b == 0));
        assert_eq!(&buf[0x32..0x36], &[0x03, 0x02, 0x01, 0x00]);
    }

    #[test]
    fn test_write_file_name_width() {
        let name = "n".repeat(47);
        let packet = encode_write_file(&name, 1).unwrap();
        assert_eq!(&packet.as_bytes()[0x02..0x31], name.as_bytes());
        assert_eq!(packet.as_bytes()[0x31], 0);

        let err = encode_write_file(&"n".repeat(48), 1).unwrap_err();
        assert!(matches!(err, Error::FieldOverflow { len: 48, max: 47, .. }));
    }

    #[test]
    fn test_write_file_size_overflow() {
        assert!(matches!(
            encode_write_file("big.bin", u32::MAX as u64 + 1),
            Err(Error::FieldOverflow { .. })
        ));
    }

    #[test]
    fn test_enable_eeprom() {
        let packet = encode_enable_eeprom(EepromType::Medium, "SAVE.E2P").unwrap();
        let buf = packet.as_bytes();
        assert_eq!(buf.len(), 0x39);
        assert_eq!(&buf[0..9], &[0x39, 0x02, 0, 0, 0, 0, 0x33, 0x06, 0x01]);
        assert_eq!(&buf[0x09..0x11], b"SAVE.E2P");
        assert!(buf[0x11..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_enable_eeprom_name_width() {
        assert!(encode_enable_eeprom(EepromType::Small, &"e".repeat(47)).is_ok());
        assert!(encode_enable_eeprom(EepromType::Small, &"e".repeat(48)).is_err());
    }

    #[test]
    fn test_eeprom_type_from_size() {
        assert_eq!(EepromType::from_size(128).map(|t| t.code()), Some(0));
        assert_eq!(EepromType::from_size(256).map(|t| t.code()), Some(1));
        assert_eq!(EepromType::from_size(512).map(|t| t.code()), Some(1));
        assert_eq!(EepromType::from_size(1024).map(|t| t.code()), Some(2));
        assert_eq!(EepromType::from_size(2048).map(|t| t.code()), Some(2));
        assert_eq!(EepromType::from_size(4096), None);
    }
}
