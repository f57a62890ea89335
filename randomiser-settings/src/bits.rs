use crate::{CodecError, Result};

/// A single bit inside the feature region: `byte` is an absolute offset,
/// `bit` is 0 for the least significant bit.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BitPos {
    pub byte: usize,
    pub bit: u8,
}

pub const fn bit(byte: usize, bit: u8) -> BitPos {
    BitPos { byte, bit }
}

/// Bit `i` of the result is set iff `flags[i]` is true.
pub fn pack_flags(flags: &[bool]) -> Result<u8> {
    if flags.len() > 8 {
        return Err(CodecError::TooManyFlags { count: flags.len() });
    }

    Ok(flags
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &set)| if set { acc | (1 << i) } else { acc }))
}

pub fn unpack_flag(byte: u8, index: u8) -> Result<bool> {
    if index >= 8 {
        return Err(CodecError::BitIndexOutOfRange { index });
    }
    Ok((byte >> index) & 0x01 == 0x01)
}

fn byte_at(bytes: &[u8], pos: BitPos) -> Result<u8> {
    bytes
        .get(pos.byte)
        .copied()
        .ok_or(CodecError::TruncatedInput {
            expected: pos.byte + 1,
            actual: bytes.len(),
        })
}

/// Write a single toggle at `pos`, leaving the other bits of that byte alone.
pub fn place_flag(bytes: &mut [u8], pos: BitPos, value: bool) -> Result<()> {
    if pos.bit >= 8 {
        return Err(CodecError::BitIndexOutOfRange { index: pos.bit });
    }
    let len = bytes.len();
    let slot = bytes.get_mut(pos.byte).ok_or(CodecError::TruncatedInput {
        expected: pos.byte + 1,
        actual: len,
    })?;
    if value {
        *slot |= 1 << pos.bit;
    } else {
        *slot &= !(1 << pos.bit);
    }
    Ok(())
}

pub fn read_flag(bytes: &[u8], pos: BitPos) -> Result<bool> {
    unpack_flag(byte_at(bytes, pos)?, pos.bit)
}

/// Set exactly the bit belonging to variant `active`. The other positions of
/// the group are cleared so a re-encode over dirty bytes stays one-hot.
pub fn encode_group(
    group: &'static str,
    active: usize,
    positions: &[BitPos],
    bytes: &mut [u8],
) -> Result<()> {
    if active >= positions.len() {
        return Err(CodecError::VariantOutOfRange { group, index: active });
    }
    for (i, &pos) in positions.iter().enumerate() {
        place_flag(bytes, pos, i == active)?;
    }
    Ok(())
}

/// Scan the designated positions; exactly one must be set. Zero set bits is
/// rejected the same way as several.
pub fn decode_group(group: &'static str, bytes: &[u8], positions: &[BitPos]) -> Result<usize> {
    let mut found = None;
    let mut set = 0usize;
    for (i, &pos) in positions.iter().enumerate() {
        if read_flag(bytes, pos)? {
            set += 1;
            found.get_or_insert(i);
        }
    }

    match (found, set) {
        (Some(index), 1) => Ok(index),
        _ => Err(CodecError::AmbiguousSelection { group, set }),
    }
}

/// A closed set of mutually exclusive variants with a fixed bit per variant.
///
/// `VARIANTS[i]` is stored at `BITS[i]`; both tables are in declaration
/// order so `ordinal()` indexes either of them.
pub trait OptionGroup: Copy + Sized + 'static {
    const NAME: &'static str;
    const VARIANTS: &'static [Self];
    const BITS: &'static [BitPos];

    fn ordinal(self) -> usize;

    fn encode_into(self, bytes: &mut [u8]) -> Result<()> {
        encode_group(Self::NAME, self.ordinal(), Self::BITS, bytes)
    }

    fn decode_from(bytes: &[u8]) -> Result<Self> {
        let index = decode_group(Self::NAME, bytes, Self::BITS)?;
        Self::VARIANTS
            .get(index)
            .copied()
            .ok_or(CodecError::VariantOutOfRange {
                group: Self::NAME,
                index,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPLIT: [BitPos; 3] = [bit(0, 2), bit(1, 2), bit(0, 0)];

    #[test]
    fn packs_flags_in_order() {
        assert_eq!(pack_flags(&[]).unwrap(), 0);
        assert_eq!(pack_flags(&[true]).unwrap(), 0x01);
        assert_eq!(pack_flags(&[false, true, false, true]).unwrap(), 0x0A);
        assert_eq!(pack_flags(&[true; 8]).unwrap(), 0xFF);
    }

    #[test]
    fn rejects_ninth_flag() {
        let err = pack_flags(&[false; 9]).unwrap_err();
        assert!(matches!(err, CodecError::TooManyFlags { count: 9 }));
    }

    #[test]
    fn unpacks_each_bit() {
        for i in 0..8u8 {
            assert!(unpack_flag(1 << i, i).unwrap());
            assert!(!unpack_flag(!(1 << i), i).unwrap());
        }
        assert!(matches!(
            unpack_flag(0xFF, 8),
            Err(CodecError::BitIndexOutOfRange { index: 8 })
        ));
    }

    #[test]
    fn group_spans_two_bytes() {
        for active in 0..SPLIT.len() {
            let mut bytes = [0u8; 2];
            encode_group("split", active, &SPLIT, &mut bytes).unwrap();
            assert_eq!(bytes.iter().map(|b| b.count_ones()).sum::<u32>(), 1);
            assert_eq!(decode_group("split", &bytes, &SPLIT).unwrap(), active);
        }
    }

    #[test]
    fn encode_keeps_unrelated_bits() {
        let mut bytes = [0b1000_0000u8, 0b0000_0001];
        encode_group("split", 1, &SPLIT, &mut bytes).unwrap();
        assert_eq!(bytes, [0b1000_0000, 0b0000_0101]);
    }

    #[test]
    fn multiple_bits_are_ambiguous() {
        let bytes = [0b0000_0101u8, 0];
        let err = decode_group("split", &bytes, &SPLIT).unwrap_err();
        assert!(matches!(
            err,
            CodecError::AmbiguousSelection { group: "split", set: 2 }
        ));
    }

    #[test]
    fn zero_bits_are_ambiguous() {
        let bytes = [0b1111_1010u8, 0b1111_1011];
        let err = decode_group("split", &bytes, &SPLIT).unwrap_err();
        assert!(matches!(err, CodecError::AmbiguousSelection { set: 0, .. }));
    }

    #[test]
    fn variant_out_of_range() {
        let mut bytes = [0u8; 2];
        assert!(matches!(
            encode_group("split", 3, &SPLIT, &mut bytes),
            Err(CodecError::VariantOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn short_buffer_is_truncated() {
        let bytes = [0x04u8];
        assert!(matches!(
            decode_group("split", &bytes, &SPLIT),
            Err(CodecError::TruncatedInput { expected: 2, actual: 1 })
        ));
    }
}
