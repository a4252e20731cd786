//! Binary codec
//!
//! Fixed-width little-endian u32 encoding. Every length prefix, page header
//! field and the table's index offset goes through these two functions, so
//! the on-disk byte order is decided in exactly one place.

use crate::error::{PageKvError, Result};

/// Width of an encoded u32
pub const U32_SIZE: usize = 4;

/// Write `value` little-endian into `buf[0..4]`
pub fn encode_u32(buf: &mut [u8], value: u32) -> Result<()> {
    let available = buf.len();
    let dst = buf
        .get_mut(..U32_SIZE)
        .ok_or(PageKvError::InsufficientSpace {
            required: U32_SIZE,
            available,
        })?;
    dst.copy_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Read a little-endian u32 from `buf[0..4]`
pub fn decode_u32(buf: &[u8]) -> Result<u32> {
    let src: [u8; U32_SIZE] = buf
        .get(..U32_SIZE)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            PageKvError::Decode(format!(
                "need {} bytes for u32, got {}",
                U32_SIZE,
                buf.len()
            ))
        })?;
    Ok(u32::from_le_bytes(src))
}
