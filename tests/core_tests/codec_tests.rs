//! Tests for the binary codec
//!
//! These tests verify:
//! - Little-endian byte order
//! - Only the first four bytes are touched
//! - Short buffers are rejected instead of truncated

use pagekv::codec::{decode_u32, encode_u32};
use pagekv::PageKvError;

#[test]
fn test_encode_is_little_endian() {
    let mut buf = [0u8; 4];
    encode_u32(&mut buf, 0x0102_0304).unwrap();
    assert_eq!(buf, [0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn test_encode_touches_only_first_four_bytes() {
    let mut buf = [0xAAu8; 6];
    encode_u32(&mut buf, 7).unwrap();
    assert_eq!(buf, [7, 0, 0, 0, 0xAA, 0xAA]);
}

#[test]
fn test_decode_inverts_encode() {
    for value in [0, 1, 255, 256, 4088, 0xDEAD_BEEF, u32::MAX] {
        let mut buf = [0u8; 4];
        encode_u32(&mut buf, value).unwrap();
        assert_eq!(decode_u32(&buf).unwrap(), value);
    }
}

#[test]
fn test_decode_reads_prefix_of_longer_buffer() {
    let buf = [0x10, 0x00, 0x00, 0x00, 0xFF, 0xFF];
    assert_eq!(decode_u32(&buf).unwrap(), 16);
}

#[test]
fn test_encode_short_buffer_fails() {
    let mut buf = [0u8; 3];
    let err = encode_u32(&mut buf, 1).unwrap_err();
    assert!(matches!(
        err,
        PageKvError::InsufficientSpace {
            required: 4,
            available: 3
        }
    ));
    assert_eq!(buf, [0, 0, 0]);
}

#[test]
fn test_decode_short_buffer_fails() {
    let err = decode_u32(&[1, 2, 3]).unwrap_err();
    assert!(err.is_corruption());
}
