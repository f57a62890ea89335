use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};

use crate::layout::{CURRENT_VERSION, TRAILER_LEN};
use crate::{CodecError, Result};

/// Physical size of the working buffer. No migration grows a string by more
/// than 17 bytes, so this is never reached in practice.
const BLOCK_CAPACITY: usize = 100;

/// Working copy of an outdated layout: a zero-padded block with a logical
/// length tracked separately from its capacity.
struct DataBlock {
    data: Vec<u8>,
    len: usize,
}

impl DataBlock {
    fn new(bytes: &[u8]) -> Self {
        let mut data = vec![0u8; BLOCK_CAPACITY.max(bytes.len())];
        data[..bytes.len()].copy_from_slice(bytes);
        Self {
            data,
            len: bytes.len(),
        }
    }

    /// Shift everything at and after `position` right by `value.len()` and
    /// write `value` there. Skipped when the block is full.
    fn insert_at(&mut self, position: usize, value: &[u8]) {
        let width = value.len();
        if self.len + width > self.data.len() || position > self.len {
            warn!(
                "no room to insert {} byte(s) at {} (length {}, capacity {}), skipping",
                width,
                position,
                self.len,
                self.data.len()
            );
            return;
        }
        self.data.copy_within(position..self.len, position + width);
        self.data[position..position + width].copy_from_slice(value);
        self.len += width;
    }

    fn insert_byte(&mut self, position: usize, value: u8) {
        self.insert_at(position, &[value]);
    }

    fn insert_int_field(&mut self, position: usize, value: u32) {
        self.insert_at(position, &value.to_be_bytes());
    }

    /// Grow the logical length with zero bytes from the padding.
    fn extend(&mut self, width: usize) {
        if self.len + width > self.data.len() {
            warn!("no room to extend settings by {} byte(s), skipping", width);
            return;
        }
        self.len += width;
    }

    fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

/// Rewrites outdated quick-settings into the current layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyMigrator;

impl LegacyMigrator {
    /// Upgrade base64 `text` written by `old_version` and return it re-encoded
    /// in the current layout with a fresh checksum.
    pub fn update(&self, old_version: u8, text: &str) -> Result<String> {
        let data = STANDARD.decode(text.trim())?;
        let migrated = self.update_bytes(old_version, &data)?;
        Ok(STANDARD.encode(migrated))
    }

    pub fn update_bytes(&self, old_version: u8, data: &[u8]) -> Result<Vec<u8>> {
        if old_version > CURRENT_VERSION {
            return Err(CodecError::UnsupportedFutureVersion {
                version: old_version,
                current: CURRENT_VERSION,
            });
        }
        // the oldest layouts carried a 12 byte trailer
        if data.len() < TRAILER_LEN - 4 {
            return Err(CodecError::TruncatedInput {
                expected: TRAILER_LEN - 4,
                actual: data.len(),
            });
        }

        let mut block = DataBlock::new(data);
        debug!(
            "migrating {} byte settings from version {} to {}",
            data.len(),
            old_version,
            CURRENT_VERSION
        );

        // versions prior to 120 had no quick settings file; they are kept
        // for strings copied out of the old GUI

        if old_version < 102 {
            debug!("< 102: abilities unchanged");
            block.data[1] |= 0x10;
        }

        if old_version < 110 {
            debug!("< 110: move tutor byte");
            block.insert_byte(15, 0x04 | 0x10);
        }

        // 110 to 120: only new checkboxes, safe to leave off

        if old_version < 150 {
            debug!("< 150: trades, field items, nicknames checksum");
            block.insert_byte(16, 0x40);
            block.insert_byte(17, 0x04);
            block.extend(4);
        }

        if old_version < 160 {
            debug!("< 160: general options, wild pokemon byte, restrictions and tweaks");
            migrate_150(&mut block);
        }

        repair_wild_restriction(&mut block, old_version);

        // 160 to 161: implementation changes only

        if old_version < 162 {
            debug!("< 162: general options byte 3");
            block.insert_byte(3, 0x00);
        }

        if block.len < TRAILER_LEN {
            return Err(CodecError::TruncatedInput {
                expected: TRAILER_LEN,
                actual: block.len,
            });
        }
        let body = block.len - TRAILER_LEN;
        let checksum = crc32fast::hash(&block.data[..body]);
        block.data[body..body + 4].copy_from_slice(&checksum.to_be_bytes());

        Ok(block.as_slice().to_vec())
    }
}

/// 150 to 160 reorganised most of the general and wild pokemon options.
fn migrate_150(block: &mut DataBlock) {
    let data = &mut block.data;

    // byte 0: copy "update moves" into "update moves (legacy)" and move the
    // three fields after it up one
    let first = data[0];
    let update_moves = first & 0x08;
    let later_fields = first & (0x10 | 0x20 | 0x40);
    data[0] = (first & (0x01 | 0x02 | 0x04 | 0x08)) | (update_moves << 1) | (later_fields << 1);

    // byte 2: the experience patch bit becomes the code tweaks flag and keeps
    // its value; held items was replaced by the pokemon limit
    let has_exp_patch = (data[2] & 0x08) >> 3;
    let has_held_items = (data[2] & 0x80) >> 7;
    data[2] &= !0x80;

    // byte 3 (starters): held items now live here
    if has_held_items > 0 {
        data[3] |= 0x10;
    }

    // byte 11 (trainers): "wild no legendaries" moves out, "no early wonder
    // guard" moves in from byte 13, along with the wild catch rate
    let wild_no_legendaries = (data[11] & 0x80) >> 7;
    let no_early_wonder_guard = (data[13] & 0x10) >> 4;
    let wild_catch_rate = (data[13] & 0x08) >> 3;
    data[11] = (data[11] & !0x80) | (no_early_wonder_guard << 7);

    // new byte 13: second wild pokemon byte. Similar strength stays off
    // here, the 160 repair below deals with it
    block.insert_byte(
        13,
        wild_catch_rate | (wild_no_legendaries << 1) | (has_held_items << 3),
    );

    // byte 14 (was 13): drop the relocated bits
    block.data[14] &= 0x07;

    // no pokemon limit; the experience patch is the only possible tweak
    block.insert_int_field(19, 0);
    block.insert_int_field(23, u32::from(has_exp_patch));
}

/// 160 shipped with a bug that could save the wild restriction group with
/// none of None, Type Themed or Catch Em All set. Such strings meant
/// "similar strength", so switch that on.
fn repair_wild_restriction(block: &mut DataBlock, old_version: u8) {
    // byte 3 only exists from 162 on
    let wild = if old_version < 162 { 12 } else { 13 };
    if block.data[wild] & (0x01 | 0x04 | 0x08) == 0 && block.data[wild + 1] & 0x04 == 0 {
        debug!("wild restriction unset at byte {}, using similar strength", wild);
        block.data[wild + 1] |= 0x04;
    }
}
