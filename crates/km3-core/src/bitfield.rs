//! Fixed-width bit-field extraction from packed status/flag words.
//!
//! DAQ summary records pack several independent signals into one unsigned
//! word at documented bit offsets. Decoding is pure arithmetic:
//! `(word >> offset) & ((1 << width) - 1)`. Named layouts are static tables
//! validated once at construction; decode paths never re-validate.

use crate::error::{Error, Result};
use crate::jagged::Jagged;

/// An integer usable as a packed word.
///
/// Signed words are reinterpreted as unsigned of the same width before
/// shifting — an arithmetic right shift would smear the sign bit over the
/// high fields.
pub trait BitWord: Copy {
    /// The word's bits, zero-extended to 64.
    fn to_bits(self) -> u64;
}

macro_rules! impl_bit_word {
    ($($signed:ty => $unsigned:ty),* $(,)?) => {
        $(impl BitWord for $signed {
            #[inline]
            fn to_bits(self) -> u64 {
                self as $unsigned as u64
            }
        }
        impl BitWord for $unsigned {
            #[inline]
            fn to_bits(self) -> u64 {
                self as u64
            }
        })*
    };
}

impl_bit_word!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);

/// Extract `width` bits of `word` starting at `offset`.
///
/// `offset + width` is *not* checked against the word size; out-of-range
/// layouts simply mask to zero. Supplying correct documented offsets is the
/// caller's contract.
#[inline]
pub fn extract<W: BitWord>(word: W, offset: u32, width: u32) -> u64 {
    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
    word.to_bits().checked_shr(offset).unwrap_or(0) & mask
}

/// Element-wise `extract` over a slice.
pub fn extract_all<W: BitWord>(words: &[W], offset: u32, width: u32) -> Vec<u64> {
    words.iter().map(|&w| extract(w, offset, width)).collect()
}

/// Element-wise `extract` over a ragged column, preserving row structure.
pub fn extract_jagged<W: BitWord>(words: &Jagged<W>, offset: u32, width: u32) -> Jagged<u64> {
    words.map(|&w| extract(w, offset, width))
}

/// One named field of a packed word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitField {
    /// Field name.
    pub name: &'static str,
    /// Bit offset of the least significant bit.
    pub offset: u32,
    /// Field width in bits.
    pub width: u32,
}

impl BitField {
    /// True for single-bit boolean fields.
    pub fn is_flag(&self) -> bool {
        self.width == 1
    }
}

/// A named bit layout for one packed word format.
///
/// Adding a signal to a word format is a table edit at the construction
/// site, not new decode code.
#[derive(Debug, Clone)]
pub struct BitLayout {
    fields: Vec<BitField>,
}

impl BitLayout {
    /// Build a layout from `(name, offset, width)` entries.
    ///
    /// Fails fast on zero-width entries and duplicate names — these are
    /// programmer errors, not runtime data conditions.
    pub fn new(entries: &[(&'static str, u32, u32)]) -> Result<Self> {
        let mut fields = Vec::with_capacity(entries.len());
        for &(name, offset, width) in entries {
            if width == 0 {
                return Err(Error::InvalidBitLayout(format!(
                    "field '{name}' has zero width"
                )));
            }
            if fields.iter().any(|f: &BitField| f.name == name) {
                return Err(Error::InvalidBitLayout(format!(
                    "duplicate field name '{name}'"
                )));
            }
            fields.push(BitField { name, offset, width });
        }
        Ok(Self { fields })
    }

    /// All fields, in table order.
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<BitField> {
        self.fields
            .iter()
            .copied()
            .find(|f| f.name == name)
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// Decode one named field of one word.
    pub fn decode<W: BitWord>(&self, name: &str, word: W) -> Result<u64> {
        let f = self.field(name)?;
        Ok(extract(word, f.offset, f.width))
    }

    /// Decode one named field element-wise over a slice of words.
    pub fn decode_all<W: BitWord>(&self, name: &str, words: &[W]) -> Result<Vec<u64>> {
        let f = self.field(name)?;
        Ok(extract_all(words, f.offset, f.width))
    }

    /// Decode one named field over a ragged column, preserving row structure.
    pub fn decode_jagged<W: BitWord>(&self, name: &str, words: &Jagged<W>) -> Result<Jagged<u64>> {
        let f = self.field(name)?;
        Ok(extract_jagged(words, f.offset, f.width))
    }

    /// Decode a single-bit field as a boolean predicate.
    ///
    /// Errors with a type mismatch if the field is wider than one bit.
    pub fn flag<W: BitWord>(&self, name: &str, word: W) -> Result<bool> {
        let f = self.flag_field(name)?;
        Ok(extract(word, f.offset, 1) != 0)
    }

    /// Single-bit predicate element-wise over a slice of words.
    pub fn flags<W: BitWord>(&self, name: &str, words: &[W]) -> Result<Vec<bool>> {
        let f = self.flag_field(name)?;
        Ok(words.iter().map(|&w| extract(w, f.offset, 1) != 0).collect())
    }

    fn flag_field(&self, name: &str) -> Result<BitField> {
        let f = self.field(name)?;
        if !f.is_flag() {
            return Err(Error::TypeMismatch(format!(
                "field '{}' is {} bits wide, not a flag",
                f.name, f.width
            )));
        }
        Ok(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_matches_shift_and_mask() {
        for word in [0u32, 1, 0xDEAD_BEEF, u32::MAX] {
            for offset in [0u32, 3, 16, 31] {
                for width in [1u32, 4, 15, 16] {
                    let expect = (word as u64 >> offset) & ((1u64 << width) - 1);
                    assert_eq!(extract(word, offset, width), expect);
                }
            }
        }
    }

    #[test]
    fn single_bit_decode_is_boolean() {
        for word in [0u32, 1, 2, 0xFFFF_FFFF, 0x8000_0000] {
            for offset in 0..32 {
                let v = extract(word, offset, 1);
                assert!(v == 0 || v == 1);
            }
        }
    }

    #[test]
    fn signed_words_do_not_sign_extend() {
        // -1i32 has all 32 bits set; bits 32..64 must stay clear.
        assert_eq!(extract(-1i32, 16, 16), 0xFFFF);
        assert_eq!(extract(-1i32, 0, 64), 0xFFFF_FFFF);
        assert_eq!(extract(i32::MIN, 31, 1), 1);
        assert_eq!(extract(i32::MIN, 30, 1), 0);
    }

    #[test]
    fn extract_preserves_ragged_shape() {
        let words = Jagged::from_rows(vec![vec![0b1010i32, 0b0110], vec![], vec![-1]]);
        let bits = extract_jagged(&words, 1, 2);
        assert!(words.is_aligned_with(&bits));
        assert_eq!(bits.row(0), &[0b01, 0b11]);
        assert_eq!(bits.row(2), &[0b11]);
    }

    #[test]
    fn layout_construction_fails_fast() {
        assert!(matches!(
            BitLayout::new(&[("ok", 0, 4), ("bad", 4, 0)]),
            Err(Error::InvalidBitLayout(_))
        ));
        assert!(matches!(
            BitLayout::new(&[("dup", 0, 4), ("dup", 4, 4)]),
            Err(Error::InvalidBitLayout(_))
        ));
    }

    #[test]
    fn layout_decode_and_flags() {
        let layout = BitLayout::new(&[
            ("count", 0, 15),
            ("seq", 16, 16),
            ("trailer", 31, 1),
        ])
        .unwrap();

        let word: u32 = (1 << 31) | (7 << 16) | 1234;
        assert_eq!(layout.decode("count", word).unwrap(), 1234);
        assert_eq!(layout.decode("seq", word).unwrap(), 7 | (1 << 15));
        assert!(layout.flag("trailer", word).unwrap());

        assert!(matches!(
            layout.decode("nope", word),
            Err(Error::UnknownField(_))
        ));
        assert!(matches!(
            layout.flag("count", word),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn decode_all_is_elementwise() {
        let layout = BitLayout::new(&[("low", 0, 8)]).unwrap();
        let words: Vec<u32> = vec![0x0102, 0xFF00, 0x00FF];
        assert_eq!(layout.decode_all("low", &words).unwrap(), vec![0x02, 0x00, 0xFF]);
    }
}
