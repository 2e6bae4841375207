//! Jaguar address windows

use crate::error::{Error, Result};

/// Half-open address interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    /// First valid address
    pub start: u32,
    /// One past the last valid address
    pub end: u32,
}

/// Everything the GameDrive debug stub lets us write to or jump into: DRAM
/// above the stub's own `$2000` bytes, plus the ROM1 cartridge space.
pub const RAM_WINDOW: MemoryRange = MemoryRange {
    start: 0x2000,
    end: 0xE0_0000,
};

impl MemoryRange {
    /// Check whether `addr` lies inside the range
    pub const fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr < self.end
    }

    /// Validate a single address destined for a packet field
    pub fn check(&self, field: &'static str, addr: u32) -> Result<()> {
        if self.contains(addr) {
            Ok(())
        } else {
            Err(self.out_of_range(field, addr as u64))
        }
    }

    /// Validate that `len` bytes starting at `base` stay inside the range
    pub fn check_span(&self, field: &'static str, base: u32, len: usize) -> Result<()> {
        self.check(field, base)?;
        let end = base as u64 + len as u64;
        if end > self.end as u64 {
            return Err(self.out_of_range(field, end));
        }
        Ok(())
    }

    fn out_of_range(&self, field: &'static str, addr: u64) -> Error {
        Error::AddressOutOfRange {
            field,
            addr,
            start: self.start,
            end: self.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ram_window_bounds() {
        assert!(!RAM_WINDOW.contains(0x1FFF));
        assert!(RAM_WINDOW.contains(0x2000));
        assert!(RAM_WINDOW.contains(0x80_2000));
        assert!(RAM_WINDOW.contains(0xDF_FFFF));
        assert!(!RAM_WINDOW.contains(0xE0_0000));
    }

    #[test]
    fn test_check_reports_field() {
        match RAM_WINDOW.check("base", 0x1000) {
            Err(Error::AddressOutOfRange { field, addr, .. }) => {
                assert_eq!(field, "base");
                assert_eq!(addr, 0x1000);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_check_span() {
        // A full 6 MiB cartridge ends exactly at the top of ROM1
        assert!(RAM_WINDOW.check_span("base", 0x80_0000, 0x60_0000).is_ok());
        assert!(RAM_WINDOW.check_span("base", 0x80_0000, 0x60_0001).is_err());
        assert!(RAM_WINDOW.check_span("base", 0x1000, 16).is_err());
    }
}
