//! Format detection
//!
//! Jaguar software ships in a handful of loosely specified containers. Each
//! one is recognised by a byte-level predicate and laid out by an extractor;
//! the rules are tried in a fixed order and the first match wins.

use super::{ImageFormat, LayoutDescriptor};

/// Cartridge ROM1 space, where a ROM header's start address must point
const ROM1_START: u32 = 0x80_0000;
const ROM1_END: u32 = 0xE0_0000;

/// Load address of a headerless ROM: ROM1 plus the 8 KiB boot area
const HEADERLESS_ROM_BASE: u32 = 0x80_2000;

/// Size of the cartridge boot area that precedes ROM code
const ROM_BOOT_AREA: usize = 0x2000;

/// MEMCON1 ROMWIDTH/ROMSPEED bytes in a cartridge header
const MEMCON_OFFSET: usize = 0x400;
/// Only the ROMWIDTH and ROMSPEED bits may be set in the MEMCON bytes
const MEMCON_MASK: u8 = 0x1E;

const COFF_MAGIC: [u8; 2] = [0x01, 0x50];
const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
const JAGR_TAG: &[u8; 4] = b"JAGR";
const JAGR_TAG_OFFSET: usize = 0x1C;
const ABS_MAGIC: [u8; 2] = [0x60, 0x1B];

/// Jaguar-side placement produced by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    payload_offset: usize,
    payload_size: usize,
    base_addr: u32,
    exec_addr: u32,
}

type Predicate = fn(&[u8], &str) -> bool;
/// `None` means the format was recognised but cannot be loaded
type Extractor = fn(&[u8]) -> Option<Window>;

struct Rule {
    format: ImageFormat,
    matches: Predicate,
    extract: Extractor,
}

const RULES: &[Rule] = &[
    Rule {
        format: ImageFormat::RomHeader,
        matches: |buf, _| rom_start_addr(buf, 0).is_some(),
        extract: |buf| rom_window(buf, 0),
    },
    Rule {
        format: ImageFormat::RomHeaderPadded,
        matches: |buf, _| rom_start_addr(buf, 0x200).is_some(),
        extract: |buf| rom_window(buf, 0x200),
    },
    Rule {
        format: ImageFormat::Coff,
        matches: |buf, _| buf.len() > 0x48 && buf[..2] == COFF_MAGIC,
        extract: coff_window,
    },
    Rule {
        format: ImageFormat::Elf,
        matches: |buf, _| buf.len() > 0x30 && buf[..4] == ELF_MAGIC,
        extract: |_| None,
    },
    Rule {
        format: ImageFormat::JagServer,
        matches: |buf, _| {
            buf.len() > 0x2E && &buf[JAGR_TAG_OFFSET..JAGR_TAG_OFFSET + 4] == JAGR_TAG
        },
        extract: jag_server_window,
    },
    Rule {
        format: ImageFormat::Abs,
        matches: |buf, _| buf.len() > 0x24 && buf[..2] == ABS_MAGIC,
        extract: abs_window,
    },
    Rule {
        format: ImageFormat::PaddedRom,
        matches: |buf, _| is_padded_rom(buf),
        extract: |buf| {
            Some(Window {
                payload_offset: ROM_BOOT_AREA,
                payload_size: buf.len() - ROM_BOOT_AREA,
                base_addr: HEADERLESS_ROM_BASE,
                exec_addr: HEADERLESS_ROM_BASE,
            })
        },
    },
    Rule {
        format: ImageFormat::RomExtension,
        matches: |_, name| has_rom_extension(name),
        extract: |buf| {
            Some(Window {
                payload_offset: 0,
                payload_size: buf.len(),
                base_addr: HEADERLESS_ROM_BASE,
                exec_addr: HEADERLESS_ROM_BASE,
            })
        },
    },
];

/// Work out where `buffer` belongs in Jaguar memory
///
/// Never fails: a file no rule recognises (or one recognised as unsupported,
/// like ELF) is loaded whole at `$4000`.
pub fn detect(buffer: Vec<u8>, file_name: &str) -> LayoutDescriptor {
    let Some(rule) = RULES.iter().find(|r| (r.matches)(&buffer, file_name)) else {
        log::debug!("No format rule matched {:?}, using defaults", file_name);
        return LayoutDescriptor::fallback(buffer, ImageFormat::Unknown);
    };

    let Some(window) = (rule.extract)(&buffer) else {
        log::warn!("{} files are not supported, loading as raw data", rule.format);
        return LayoutDescriptor::fallback(buffer, rule.format);
    };

    log::debug!("Detected {}: {:x?}", rule.format, window);
    LayoutDescriptor {
        buffer,
        payload_offset: window.payload_offset,
        payload_size: window.payload_size,
        base_addr: window.base_addr,
        exec_addr: window.exec_addr,
        format: rule.format,
    }
}

fn read_be32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}

/// Validate a cartridge header at `offset` and return its start address
fn rom_start_addr(buf: &[u8], offset: usize) -> Option<u32> {
    if buf.len() <= ROM_BOOT_AREA + offset {
        return None;
    }

    let memcon = &buf[offset + MEMCON_OFFSET..offset + MEMCON_OFFSET + 4];
    if memcon.iter().any(|b| *b != memcon[0]) || memcon[0] & !MEMCON_MASK != 0 {
        return None;
    }

    let start = read_be32(buf, offset + MEMCON_OFFSET + 4);
    (ROM1_START..ROM1_END).contains(&start).then_some(start)
}

fn rom_window(buf: &[u8], offset: usize) -> Option<Window> {
    let start = rom_start_addr(buf, offset)?;
    Some(Window {
        payload_offset: offset,
        payload_size: buf.len() - offset,
        base_addr: ROM1_START,
        exec_addr: start,
    })
}

fn coff_window(buf: &[u8]) -> Option<Window> {
    // The text section header address is ignored: JiFFI hard-codes it to
    // $4000, while the run header carries the real text base.
    // Symbol sections trail the data and get sent along with it.
    let payload_offset = read_be32(buf, 0x44) as usize;
    Some(Window {
        payload_offset,
        payload_size: buf.len().saturating_sub(payload_offset),
        base_addr: read_be32(buf, 0x28),
        exec_addr: read_be32(buf, 0x24),
    })
}

fn jag_server_window(buf: &[u8]) -> Option<Window> {
    let version = buf[0x21];
    let base_addr = read_be32(buf, 0x22);
    // Version 3 added a start address separate from the load address
    let (exec_addr, payload_offset) = if version >= 3 {
        (read_be32(buf, 0x2A), 0x2E)
    } else {
        (base_addr, 0x2A)
    };
    log::debug!("JAGR header version {}", version);
    Some(Window {
        payload_offset,
        payload_size: buf.len() - payload_offset,
        base_addr,
        exec_addr,
    })
}

fn abs_window(buf: &[u8]) -> Option<Window> {
    let base_addr = read_be32(buf, 0x16);
    let text = read_be32(buf, 0x2) as usize;
    let data = read_be32(buf, 0x6) as usize;
    Some(Window {
        payload_offset: 0x24,
        payload_size: text.saturating_add(data),
        base_addr,
        exec_addr: base_addr,
    })
}

/// Headerless ROM dumps start with an 8 KiB boot area filled with one value
///
/// Fillers that happen to decode as a 68k `nop` defeat this check.
fn is_padded_rom(buf: &[u8]) -> bool {
    if buf.len() <= ROM_BOOT_AREA {
        return false;
    }
    let filler = buf[8];
    buf[9..ROM_BOOT_AREA].iter().all(|b| *b == filler) && buf[ROM_BOOT_AREA] != filler
}

fn has_rom_extension(name: &str) -> bool {
    let name = name.as_bytes();
    name.len() >= 4 && name[name.len() - 4..].eq_ignore_ascii_case(b".rom")
}
