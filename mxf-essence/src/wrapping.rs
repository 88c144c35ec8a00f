//! Wrapping options offered by a sub-parser, and the façade's record of the
//! wrapping actually selected for a stream.

use mxf_core::UL;
use mxf_index::EditRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapType {
    Frame,
    Clip,
    Custom,
}

/// One way a sub-parser is willing to carry a stream in the Generic
/// Container.
#[derive(Debug, Clone)]
pub struct WrappingOption {
    pub essence_container: UL,
    /// GC essence/element type bytes (1-based bytes 13 and 15 of the track
    /// number), used to build the element key once a track number is
    /// assigned.
    pub item_type: u8,
    pub element_type: u8,
    pub wrap_type: WrapType,
    /// Accepts a non-native edit rate, valid only for clip wrapping.
    pub can_slave: bool,
    pub can_index: bool,
    /// `Some(width)` when every edit unit of this wrapping encodes to the
    /// same fixed BER length.
    pub fixed_ber_size: Option<u64>,
}

impl WrappingOption {
    pub fn accepts_edit_rate(&self, native: EditRate, requested: EditRate) -> bool {
        if requested == native {
            return true;
        }
        if self.wrap_type == WrapType::Clip && self.can_slave {
            return true;
        }
        is_integer_multiple(native, requested)
    }
}

fn is_integer_multiple(native: EditRate, requested: EditRate) -> bool {
    if native.numerator == 0 || requested.denominator == 0 {
        return false;
    }
    // requested == k * native for some positive integer k.
    let lhs = requested.numerator as u64 * native.denominator as u64;
    let rhs = native.numerator as u64 * requested.denominator as u64;
    if rhs == 0 || lhs % rhs != 0 {
        return false;
    }
    lhs / rhs > 0
}

/// The façade's record of which wrapping it chose for a stream, and the
/// descriptor fields that choice implies.
#[derive(Debug, Clone)]
pub struct WrappingConfig {
    pub essence_container: UL,
    pub wrap_type: WrapType,
    pub sample_rate: EditRate,
    pub bytes_per_edit_unit: Option<u64>,
}
