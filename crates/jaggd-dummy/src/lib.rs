//! jaggd-dummy - In-memory GameDrive emulator for testing
//!
//! This crate provides a dummy transport that decodes GameDrive command
//! packets the way the cartridge firmware does and applies them to an
//! emulated Jaguar address space. It's useful for testing and development
//! without real hardware.

use std::time::Duration;

use jaggd_core::error::{Error, Result};
use jaggd_core::transfer::Transport;

/// Size of the emulated address space: everything below the top of ROM1
const ADDRESS_SPACE: usize = 0xE0_0000;

/// Configuration for the dummy GameDrive
#[derive(Debug, Clone, Default)]
pub struct DummyConfig {
    /// Largest number of bytes accepted per bulk transfer (`None` = all)
    pub max_bulk_accept: Option<usize>,
    /// Fail the Nth bulk transfer (0-indexed)
    pub fail_bulk_at: Option<usize>,
}

/// Something the emulated firmware did in response to a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Reset with the given mode byte
    Reset(u8),
    /// EEPROM file enabled
    EepromEnabled { type_code: u8, name: String },
    /// File written to the memory card
    FileWritten { name: String, size: u32 },
    /// Upload into memory completed
    Uploaded { base: u32, size: u32 },
    /// Jump to an entry point
    Executed(u32),
}

/// Bulk data the firmware is waiting for
#[derive(Debug)]
enum Pending {
    Upload {
        base: u32,
        size: u32,
        received: u32,
        exec: Option<u32>,
    },
    CardFile {
        name: String,
        size: u32,
        data: Vec<u8>,
    },
}

/// Dummy GameDrive
///
/// Emulates the cartridge firmware in memory for testing purposes.
pub struct DummyGameDrive {
    config: DummyConfig,
    memory: Vec<u8>,
    card: Vec<(String, Vec<u8>)>,
    events: Vec<Event>,
    pending: Option<Pending>,
    control_calls: usize,
    bulk_calls: usize,
}

impl DummyGameDrive {
    /// Create a new dummy GameDrive with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            memory: vec![0; ADDRESS_SPACE],
            card: Vec::new(),
            events: Vec::new(),
            pending: None,
            control_calls: 0,
            bulk_calls: 0,
        }
    }

    /// Create a new dummy GameDrive that accepts every transfer whole
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Emulated Jaguar memory
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Contents of a file on the emulated memory card
    pub fn card_file(&self, name: &str) -> Option<&[u8]> {
        self.card
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Everything the firmware did, in order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Number of control transfers received
    pub fn control_calls(&self) -> usize {
        self.control_calls
    }

    /// Number of bulk transfers received
    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls
    }

    fn protocol_error(msg: impl Into<String>) -> Error {
        Error::Transport(msg.into())
    }

    fn be32(buf: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ])
    }

    fn le32(buf: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            buf[offset],
            buf[offset + 1],
            buf[offset + 2],
            buf[offset + 3],
        ])
    }

    fn c_string(field: &[u8]) -> String {
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        String::from_utf8_lossy(&field[..end]).into_owned()
    }

    fn handle_command(&mut self, packet: &[u8]) -> Result<()> {
        if self.pending.is_some() {
            return Err(Self::protocol_error("command received during bulk transfer"));
        }
        if packet.len() < 2 || packet[0] as usize != packet.len() {
            return Err(Self::protocol_error(format!(
                "malformed packet: {:02X?}",
                packet
            )));
        }

        match (packet[0], packet[1]) {
            (0x02, mode) => {
                log::debug!("dummy: reset mode {}", mode);
                self.events.push(Event::Reset(mode));
            }
            (0x14, 0x02) => self.handle_upload_execute(packet)?,
            (0x36, 0x05) => {
                let name = Self::c_string(&packet[0x02..0x32]);
                let size = Self::le32(packet, 0x32);
                log::debug!("dummy: write {} ({} bytes) to card", name, size);
                self.start_bulk(Pending::CardFile {
                    name,
                    size,
                    data: Vec::with_capacity(size as usize),
                });
            }
            (0x39, 0x02) => {
                if packet[0x02..0x06] != [0, 0, 0, 0] || packet[0x06..0x08] != [0x33, 0x06] {
                    return Err(Self::protocol_error("bad EEPROM sub-command"));
                }
                let type_code = packet[0x08];
                if type_code > 2 {
                    return Err(Self::protocol_error("bad EEPROM type"));
                }
                self.events.push(Event::EepromEnabled {
                    type_code,
                    name: Self::c_string(&packet[0x09..]),
                });
            }
            (len, cmd) => {
                return Err(Self::protocol_error(format!(
                    "unknown command {:02X} {:02X}",
                    len, cmd
                )));
            }
        }
        Ok(())
    }

    fn handle_upload_execute(&mut self, packet: &[u8]) -> Result<()> {
        match [packet[0x06], packet[0x07]] {
            [0x0E, 0x04] => {
                let size = Self::le32(packet, 0x02);
                if Self::be32(packet, 0x0C) != size {
                    return Err(Self::protocol_error("size fields disagree"));
                }
                let base = Self::be32(packet, 0x08);
                if base as usize + size as usize > ADDRESS_SPACE {
                    return Err(Self::protocol_error("upload past end of memory"));
                }
                let exec = match Self::be32(packet, 0x10) {
                    0 => None,
                    addr => Some(addr),
                };
                self.start_bulk(Pending::Upload {
                    base,
                    size,
                    received: 0,
                    exec,
                });
            }
            [0x06, 0x05] => {
                if Self::le32(packet, 0x02) != 0
                    || packet[0x0C..0x10] != [0x7A, 0x77, 0x4A, 0x00]
                    || packet[0x10..0x14] != [0x00, 0x00, 0x84, 0x19]
                {
                    return Err(Self::protocol_error("bad execute-only magic"));
                }
                self.events.push(Event::Executed(Self::be32(packet, 0x08)));
            }
            other => {
                return Err(Self::protocol_error(format!(
                    "unknown upload framing {:02X?}",
                    other
                )));
            }
        }
        Ok(())
    }

    /// Wait for bulk data, completing at once if none is expected
    fn start_bulk(&mut self, pending: Pending) {
        self.pending = Some(pending);
        self.complete_if_done();
    }

    fn handle_bulk(&mut self, data: &[u8]) -> Result<()> {
        match self.pending.as_mut() {
            Some(Pending::Upload {
                base,
                size,
                received,
                ..
            }) => {
                if *received as usize + data.len() > *size as usize {
                    return Err(Self::protocol_error("upload overrun"));
                }
                let start = (*base + *received) as usize;
                self.memory[start..start + data.len()].copy_from_slice(data);
                *received += data.len() as u32;
            }
            Some(Pending::CardFile { size, data: buf, .. }) => {
                if buf.len() + data.len() > *size as usize {
                    return Err(Self::protocol_error("card write overrun"));
                }
                buf.extend_from_slice(data);
            }
            None => return Err(Self::protocol_error("unexpected bulk data")),
        }
        self.complete_if_done();
        Ok(())
    }

    fn complete_if_done(&mut self) {
        let done = match &self.pending {
            Some(Pending::Upload { size, received, .. }) => received == size,
            Some(Pending::CardFile { size, data, .. }) => data.len() == *size as usize,
            None => false,
        };
        if !done {
            return;
        }

        match self.pending.take() {
            Some(Pending::Upload {
                base, size, exec, ..
            }) => {
                self.events.push(Event::Uploaded { base, size });
                if let Some(addr) = exec {
                    self.events.push(Event::Executed(addr));
                }
            }
            Some(Pending::CardFile { name, size, data }) => {
                self.events.push(Event::FileWritten {
                    name: name.clone(),
                    size,
                });
                self.card.retain(|(n, _)| *n != name);
                self.card.push((name, data));
            }
            None => {}
        }
    }
}

impl Transport for DummyGameDrive {
    fn control_transfer(&mut self, packet: &[u8], _timeout: Duration) -> Result<usize> {
        self.control_calls += 1;
        self.handle_command(packet)?;
        Ok(packet.len())
    }

    fn bulk_transfer(&mut self, data: &[u8], _timeout: Duration) -> Result<usize> {
        let call = self.bulk_calls;
        self.bulk_calls += 1;
        if self.config.fail_bulk_at == Some(call) {
            return Err(Self::protocol_error("emulated pipe error"));
        }

        let len = self
            .config
            .max_bulk_accept
            .map_or(data.len(), |max| max.min(data.len()));
        self.handle_bulk(&data[..len])?;
        Ok(len)
    }
}
