//! Wire layout of the `EncryptedTriplet` variable pack: the structure an
//! encrypted essence KLV's value carries in place of the plaintext source
//! value.

use crate::error::{CryptError, Result};
use mxf_core::{ber, UL};
use std::io::Cursor;

const FIXED_PREFIX_LEN: usize = 16 + 8 + 16 + 8;

#[derive(Debug, Clone)]
pub struct EncryptedTriplet {
    pub context_id_link: [u8; 16],
    pub plaintext_offset: u64,
    pub source_key: UL,
    pub source_length: u64,
    pub encrypted_source_value: Vec<u8>,
    pub track_file_id: Option<[u8; 16]>,
    pub sequence_number: Option<u64>,
    pub mic: Option<[u8; 20]>,
}

impl EncryptedTriplet {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_PREFIX_LEN + self.encrypted_source_value.len() + 32);
        out.extend_from_slice(&self.context_id_link);
        out.extend_from_slice(&self.plaintext_offset.to_be_bytes());
        out.extend_from_slice(self.source_key.as_bytes());
        out.extend_from_slice(&self.source_length.to_be_bytes());

        out.extend_from_slice(&ber::encode(self.encrypted_source_value.len() as u64));
        out.extend_from_slice(&self.encrypted_source_value);

        encode_optional(&mut out, self.track_file_id.as_ref().map(|v| v.as_slice()));
        let sequence_number_bytes = self.sequence_number.map(|n| n.to_be_bytes());
        encode_optional(&mut out, sequence_number_bytes.as_ref().map(|v| v.as_slice()));
        encode_optional(&mut out, self.mic.as_ref().map(|v| v.as_slice()));

        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < FIXED_PREFIX_LEN {
            return Err(CryptError::TruncatedTriplet);
        }

        let mut context_id_link = [0u8; 16];
        context_id_link.copy_from_slice(&bytes[0..16]);
        let plaintext_offset = u64::from_be_bytes(bytes[16..24].try_into().unwrap());
        let source_key = UL::from_slice(&bytes[24..40])?;
        let source_length = u64::from_be_bytes(bytes[40..48].try_into().unwrap());

        let mut cursor = Cursor::new(&bytes[FIXED_PREFIX_LEN..]);
        let (value_len, _) = ber::decode(&mut cursor)?;
        let value_start = FIXED_PREFIX_LEN + cursor.position() as usize;
        let value_end = value_start + value_len as usize;
        let encrypted_source_value = bytes
            .get(value_start..value_end)
            .ok_or(CryptError::TruncatedTriplet)?
            .to_vec();

        let mut offset = value_end;
        let track_file_id = decode_fixed_optional::<16>(bytes, &mut offset)?;
        let sequence_number = decode_fixed_optional::<8>(bytes, &mut offset)?.map(u64::from_be_bytes);
        let mic = decode_fixed_optional::<20>(bytes, &mut offset)?;

        Ok(Self {
            context_id_link,
            plaintext_offset,
            source_key,
            source_length,
            encrypted_source_value,
            track_file_id,
            sequence_number,
            mic,
        })
    }
}

fn encode_optional(out: &mut Vec<u8>, value: Option<&[u8]>) {
    match value {
        Some(bytes) => {
            out.extend_from_slice(&ber::encode(bytes.len() as u64));
            out.extend_from_slice(bytes);
        }
        None => out.extend_from_slice(&ber::encode(0)),
    }
}

fn decode_optional(bytes: &[u8], offset: &mut usize) -> Result<Option<Vec<u8>>> {
    if *offset >= bytes.len() {
        return Ok(None);
    }
    let mut cursor = Cursor::new(&bytes[*offset..]);
    let (len, _) = ber::decode(&mut cursor)?;
    let start = *offset + cursor.position() as usize;
    let end = start + len as usize;
    let slice = bytes.get(start..end).ok_or(CryptError::TruncatedTriplet)?;
    *offset = end;
    if len == 0 {
        Ok(None)
    } else {
        Ok(Some(slice.to_vec()))
    }
}

/// Like [`decode_optional`], but for a field whose present form is always
/// exactly `N` bytes wide; a present field of any other width is malformed,
/// not a panic.
fn decode_fixed_optional<const N: usize>(bytes: &[u8], offset: &mut usize) -> Result<Option<[u8; N]>> {
    match decode_optional(bytes, offset)? {
        None => Ok(None),
        Some(v) => {
            let array: [u8; N] = v.try_into().map_err(|_| CryptError::TruncatedTriplet)?;
            Ok(Some(array))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EncryptedTriplet {
        EncryptedTriplet {
            context_id_link: [0x01; 16],
            plaintext_offset: 0,
            source_key: UL::new([0x06; 16]),
            source_length: 5,
            encrypted_source_value: vec![0xAA; 16],
            track_file_id: None,
            sequence_number: None,
            mic: None,
        }
    }

    #[test]
    fn roundtrip_without_optional_fields() {
        let triplet = sample();
        let encoded = triplet.encode();
        let decoded = EncryptedTriplet::decode(&encoded).unwrap();
        assert_eq!(decoded.source_length, 5);
        assert_eq!(decoded.encrypted_source_value, vec![0xAA; 16]);
        assert!(decoded.track_file_id.is_none());
        assert!(decoded.mic.is_none());
    }

    #[test]
    fn roundtrip_with_all_optional_fields() {
        let mut triplet = sample();
        triplet.track_file_id = Some([0x02; 16]);
        triplet.sequence_number = Some(42);
        triplet.mic = Some([0x03; 20]);

        let encoded = triplet.encode();
        let decoded = EncryptedTriplet::decode(&encoded).unwrap();
        assert_eq!(decoded.track_file_id, Some([0x02; 16]));
        assert_eq!(decoded.sequence_number, Some(42));
        assert_eq!(decoded.mic, Some([0x03; 20]));
    }

    #[test]
    fn truncated_bytes_are_rejected() {
        assert!(EncryptedTriplet::decode(&[0u8; 10]).is_err());
    }

    #[test]
    fn wrong_width_optional_field_is_an_error_not_a_panic() {
        let mut bytes = sample().encode();
        // Drop the three trailing zero-length optional-field markers and
        // substitute a 9-byte TrackFileID, a width the fixed 16-byte field
        // never takes.
        bytes.truncate(bytes.len() - 3);
        bytes.push(0x09);
        bytes.extend_from_slice(&[0u8; 9]);
        bytes.push(0x00);
        bytes.push(0x00);
        assert!(EncryptedTriplet::decode(&bytes).is_err());
    }
}
