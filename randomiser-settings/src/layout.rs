// Offsets of the current (v163) quick-settings layout.

pub const CURRENT_VERSION: u8 = 163;

/// Option bytes 0..20 plus the three selection slots inside them.
pub(crate) const FEATURE_BYTES: usize = 20;
pub(crate) const STARTER_SLOTS: [usize; 3] = [5, 7, 9];

pub(crate) const RESTRICTIONS_OFFSET: usize = 20;
pub(crate) const CODE_TWEAKS_OFFSET: usize = 24;
pub(crate) const PROFILE_NAME_LEN_OFFSET: usize = 28;
pub(crate) const PROFILE_NAME_OFFSET: usize = 29;

/// CRC-32 followed by the three resource checksums.
pub(crate) const TRAILER_LEN: usize = 16;

/// Shortest possible encoding: an empty profile name.
pub(crate) const MIN_ENCODED_LEN: usize = PROFILE_NAME_OFFSET + TRAILER_LEN;

pub(crate) fn read_u32_be(data: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

/// CRC-32 over everything before the trailer.
pub(crate) fn body_checksum(data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&data[..data.len() - TRAILER_LEN]);
    hasher.finalize()
}
