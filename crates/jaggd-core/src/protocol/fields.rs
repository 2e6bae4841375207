//! Named-offset field writers for command packets
//!
//! Layouts are fixed by the firmware, so packets stay plain byte buffers and
//! each field is written through one of these helpers at its literal offset.

use crate::error::{Error, Result};

/// Write `value` big-endian into `buf[offset..offset + 4]`
pub(crate) fn put_be32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_be_bytes());
}

/// Write `value` little-endian into `buf[offset..offset + 4]`
pub(crate) fn put_le32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Copy a fixed byte pattern into `buf` at `offset`
pub(crate) fn put_bytes(buf: &mut [u8], offset: usize, bytes: &[u8]) {
    buf[offset..offset + bytes.len()].copy_from_slice(bytes);
}

/// Write a NUL-terminated name into the `width` bytes at `offset`
///
/// The field is NUL padded. Names that leave no room for the terminator are
/// rejected rather than truncated.
pub(crate) fn put_name(
    buf: &mut [u8],
    offset: usize,
    width: usize,
    field: &'static str,
    name: &str,
) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() >= width {
        return Err(Error::FieldOverflow {
            field,
            len: bytes.len() as u64,
            max: (width - 1) as u64,
        });
    }
    let dst = &mut buf[offset..offset + width];
    dst.fill(0);
    dst[..bytes.len()].copy_from_slice(bytes);
    Ok(())
}

/// Narrow a byte count to a 32-bit packet field
pub(crate) fn size_u32(field: &'static str, size: u64) -> Result<u32> {
    u32::try_from(size).map_err(|_| Error::FieldOverflow {
        field,
        len: size,
        max: u32::MAX as u64,
    })
}
