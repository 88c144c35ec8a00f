//! BER (Basic Encoding Rules) length encode/decode.
//!
//! Short form: a single byte `0x00..=0x7F` is the length itself. Long form:
//! `0x80 | n` followed by `n` big-endian bytes (`n` in `1..=8`), giving the
//! length as an unsigned integer.

use crate::error::{CoreError, Result};
use std::io::Read;

/// Encode `value` using the shortest valid BER form.
pub fn encode(value: u64) -> Vec<u8> {
    if value < 0x80 {
        return vec![value as u8];
    }
    let bytes = minimal_be_bytes(value);
    let mut out = Vec::with_capacity(1 + bytes.len());
    out.push(0x80 | bytes.len() as u8);
    out.extend_from_slice(&bytes);
    out
}

/// Encode `value` into exactly `size` bytes (including the leading
/// length-of-length byte for long form, or the single byte for short form).
///
/// Fails with [`CoreError::BerSizeTooSmall`] if `value` does not fit.
pub fn encode_sized(value: u64, size: u8) -> Result<Vec<u8>> {
    if size == 0 {
        return Err(CoreError::BerSizeTooSmall(size));
    }
    if size == 1 {
        if value < 0x80 {
            return Ok(vec![value as u8]);
        }
        return Err(CoreError::BerSizeTooSmall(size));
    }

    let value_bytes = (size - 1) as usize;
    if value_bytes > 8 {
        return Err(CoreError::BerTooLong(value_bytes as u8));
    }
    if value_bytes < 8 && value >= (1u64 << (value_bytes * 8)) {
        return Err(CoreError::BerSizeTooSmall(size));
    }

    let full = value.to_be_bytes();
    let mut out = Vec::with_capacity(size as usize);
    out.push(0x80 | value_bytes as u8);
    out.extend_from_slice(&full[8 - value_bytes..]);
    Ok(out)
}

/// Read a BER length from `reader`. Returns `(value, bytes_consumed)`.
pub fn decode<R: Read>(reader: &mut R) -> Result<(u64, usize)> {
    let mut first = [0u8; 1];
    reader.read_exact(&mut first)?;
    let first = first[0];

    if first < 0x80 {
        return Ok((first as u64, 1));
    }

    let n = first & 0x7F;
    if n == 0 {
        return Err(CoreError::BerZeroLength);
    }
    if n > 8 {
        return Err(CoreError::BerTooLong(n));
    }

    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf[8 - n as usize..])?;
    let value = u64::from_be_bytes(buf);
    Ok((value, 1 + n as usize))
}

fn minimal_be_bytes(value: u64) -> Vec<u8> {
    let full = value.to_be_bytes();
    let first_nonzero = full.iter().position(|&b| b != 0).unwrap_or(7);
    full[first_nonzero..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn short_form_roundtrip() {
        for v in [0u64, 1, 0x7F] {
            let enc = encode(v);
            assert_eq!(enc.len(), 1);
            let (dec, n) = decode(&mut Cursor::new(&enc)).unwrap();
            assert_eq!(dec, v);
            assert_eq!(n, enc.len());
        }
    }

    #[test]
    fn long_form_roundtrip() {
        for v in [0x80u64, 0xFF, 0x1_0000, u64::MAX] {
            let enc = encode(v);
            assert!(enc[0] & 0x80 != 0);
            let (dec, n) = decode(&mut Cursor::new(&enc)).unwrap();
            assert_eq!(dec, v);
            assert_eq!(n, enc.len());
        }
    }

    #[test]
    fn encode_sized_forces_width() {
        let enc = encode_sized(5, 4).unwrap();
        assert_eq!(enc.len(), 4);
        let (dec, n) = decode(&mut Cursor::new(&enc)).unwrap();
        assert_eq!(dec, 5);
        assert_eq!(n, 4);
    }

    #[test]
    fn encode_sized_too_small_fails() {
        // 4-byte BER (1 length-of-length + 3 value bytes) can't hold 2^24.
        assert!(encode_sized(1 << 24, 4).is_err());
        assert!(encode_sized(1 << 24, 5).is_ok());
    }

    #[test]
    fn reject_long_ber() {
        let bytes = [0x89u8, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let err = decode(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, CoreError::BerTooLong(9)));
    }

    #[test]
    fn reject_zero_length_long_form() {
        let bytes = [0x80u8];
        let err = decode(&mut Cursor::new(&bytes)).unwrap_err();
        assert!(matches!(err, CoreError::BerZeroLength));
    }

    proptest! {
        #[test]
        fn ber_roundtrips_for_all_values(v in any::<u64>()) {
            let enc = encode(v);
            let (dec, n) = decode(&mut Cursor::new(&enc)).unwrap();
            prop_assert_eq!(dec, v);
            prop_assert_eq!(n, enc.len());
        }

        #[test]
        fn encode_sized_matches_requested_width(v in 0u64..0x1_0000_0000, size in 5u8..=9) {
            let enc = encode_sized(v, size).unwrap();
            prop_assert_eq!(enc.len(), size as usize);
        }
    }
}
