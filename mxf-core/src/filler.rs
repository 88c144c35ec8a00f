//! KLV filler: padding packets whose value is all zero bytes, used to align
//! subsequent KLVs to a KLV Alignment Grid (KAG).

use crate::ber;
use crate::error::{CoreError, Result};
use crate::ul::UL;

/// The canonical `KLVFill` key.
pub const FILLER_KEY: UL = UL::new([
    0x06, 0x0E, 0x2B, 0x34, 0x01, 0x01, 0x01, 0x02, 0x03, 0x01, 0x02, 0x10, 0x01, 0x00, 0x00, 0x00,
]);

/// Minimum size of a filler KLV value (the spec's floor on a legal filler).
pub const MIN_FILLER_SIZE: u64 = 17;

/// Minimum size when a 4-byte BER length is forced.
pub const MIN_FILLER_SIZE_FORCED_BER4: u64 = 20;

/// Filler values cannot exceed this length.
pub const MAX_FILLER_SIZE: u64 = (1 << 24) - 1;

/// Compute the minimum filler KLV (total on-disk bytes, including its own
/// key and length) that, written at `position`, lands the following write on
/// a `kag`-byte boundary, while reserving at least `min_extra` bytes of
/// filler value and never landing on a value smaller than the legal minimum.
///
/// `force_ber4` requires the length field to always be the 4-byte long form,
/// even when a shorter BER would otherwise suffice.
pub fn compute_filler_size(
    position: u64,
    kag: u64,
    min_extra: u64,
    force_ber4: bool,
) -> Result<FillerPlan> {
    if kag == 0 {
        return Err(CoreError::FillerTooSmall(0));
    }

    let min_value = if force_ber4 {
        MIN_FILLER_SIZE_FORCED_BER4
    } else {
        MIN_FILLER_SIZE
    };

    let key_len = 16u64;
    let ber_len: u64 = if force_ber4 { 4 } else { 1 };

    // Start from the smallest legal filler and grow by `kag` until the end
    // position is KAG-aligned.
    let mut value_len = min_value.max(min_extra);
    loop {
        let total = key_len + ber_len + value_len;
        let end = position + total;
        if end % kag == 0 {
            break;
        }
        let remainder = end % kag;
        let needed = kag - remainder;
        value_len += needed;
    }

    if value_len > MAX_FILLER_SIZE {
        return Err(CoreError::FillerTooLarge(value_len));
    }

    let ber_len = if force_ber4 {
        4
    } else {
        ber::encode(value_len).len() as u64
    };

    // Re-check alignment once the real (possibly longer, if value grew past
    // a BER width boundary) length size is known.
    let total = key_len + ber_len + value_len;
    let end = position + total;
    if end % kag != 0 {
        let remainder = end % kag;
        let extra = kag - remainder;
        return compute_filler_size(position, kag, value_len + extra, force_ber4);
    }

    Ok(FillerPlan {
        value_len,
        ber_len,
        total_len: total,
    })
}

/// Result of [`compute_filler_size`]: how many bytes the filler KLV will
/// occupy on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillerPlan {
    pub value_len: u64,
    pub ber_len: u64,
    pub total_len: u64,
}

/// Serialize a filler KLV of `plan`'s shape: key, BER length, then
/// `value_len` zero bytes.
pub fn write_filler(plan: FillerPlan, force_ber4: bool) -> Result<Vec<u8>> {
    if plan.value_len < MIN_FILLER_SIZE {
        return Err(CoreError::FillerTooSmall(plan.value_len as usize));
    }
    if plan.value_len > MAX_FILLER_SIZE {
        return Err(CoreError::FillerTooLarge(plan.value_len));
    }

    let mut out = Vec::with_capacity(plan.total_len as usize);
    out.extend_from_slice(FILLER_KEY.as_bytes());
    if force_ber4 {
        out.extend_from_slice(&ber::encode_sized(plan.value_len, 4)?);
    } else {
        out.extend_from_slice(&ber::encode(plan.value_len));
    }
    out.resize(out.len() + plan.value_len as usize, 0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns_to_kag() {
        let plan = compute_filler_size(100, 64, 0, false).unwrap();
        let end = 100 + plan.total_len;
        assert_eq!(end % 64, 0);
        assert!(plan.value_len >= MIN_FILLER_SIZE);
    }

    #[test]
    fn respects_forced_ber4_minimum() {
        let plan = compute_filler_size(0, 16, 0, true).unwrap();
        assert!(plan.value_len >= MIN_FILLER_SIZE_FORCED_BER4);
        assert_eq!(plan.ber_len, 4);
    }

    #[test]
    fn write_filler_is_all_zero_value() {
        let plan = compute_filler_size(0, 16, 0, false).unwrap();
        let bytes = write_filler(plan, false).unwrap();
        assert_eq!(&bytes[0..16], FILLER_KEY.as_bytes());
        let value = &bytes[bytes.len() - plan.value_len as usize..];
        assert!(value.iter().all(|&b| b == 0));
    }

    #[test]
    fn already_aligned_still_inserts_minimum_filler() {
        // position 0, kag 17: writing nothing would already be "aligned" at
        // offset 0, but a filler is being inserted so it must still be >= 17
        // bytes and land the *next* write on a boundary.
        let plan = compute_filler_size(0, 17, 0, false).unwrap();
        assert!((plan.total_len) % 17 == 0);
    }
}
