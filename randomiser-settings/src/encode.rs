use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::bits::{bit, pack_flags, place_flag, OptionGroup};
use crate::layout::{FEATURE_BYTES, STARTER_SLOTS};
use crate::{CodecError, Result, Settings};

/// Render `settings` as current-version quick-settings text.
pub fn encode(settings: &Settings) -> Result<String> {
    Ok(STANDARD.encode(encode_bytes(settings)?))
}

/// The raw current-version layout, before base64.
pub fn encode_bytes(s: &Settings) -> Result<Vec<u8>> {
    let mut head = [0u8; FEATURE_BYTES];

    // 0: general options + trainer/class names
    head[0] = pack_flags(&[
        s.lower_case_pokemon_names,
        s.national_dex_at_start,
        s.change_impossible_evolutions,
        s.update_moves,
        s.update_moves_legacy,
        s.update_type_effectiveness,
        s.randomize_trainer_names,
        s.randomize_trainer_class_names,
    ])?;

    // 1: base stats & abilities
    s.base_statistics.encode_into(&mut head)?;
    s.abilities.encode_into(&mut head)?;
    place_flag(&mut head, bit(1, 6), !s.allow_wonder_guard)?;
    place_flag(&mut head, bit(1, 7), s.standardize_exp_curves)?;

    // 2: types & more general options
    s.types.encode_into(&mut head)?;
    place_flag(&mut head, bit(2, 3), s.use_code_tweaks)?;
    place_flag(&mut head, bit(2, 4), s.race_mode)?;
    place_flag(&mut head, bit(2, 5), s.randomize_hidden_hollows)?;
    place_flag(&mut head, bit(2, 6), !s.allow_broken_moves)?;
    place_flag(&mut head, bit(2, 7), s.limit_pokemon)?;

    // 3: general options overflow (v162)
    head[3] = pack_flags(&[s.make_evolutions_easier])?;

    // 4: starters
    s.starters.encode_into(&mut head)?;
    place_flag(&mut head, bit(4, 4), s.randomize_starters_held_items)?;

    // 5..11: custom starters, LE offsets
    for (&offset, &ordinal) in STARTER_SLOTS.iter().zip(&s.custom_starters) {
        let index = ordinal.saturating_sub(1).to_le_bytes();
        head[offset..offset + 2].copy_from_slice(&index);
    }

    // 11: movesets
    s.movesets.encode_into(&mut head)?;
    place_flag(&mut head, bit(11, 4), s.start_with_four_moves)?;

    // 12: trainers
    s.trainers.encode_into(&mut head)?;
    place_flag(&mut head, bit(12, 0), s.trainers_use_pokemon_of_similar_strength)?;
    place_flag(&mut head, bit(12, 2), s.rival_carries_starter_throughout)?;
    place_flag(&mut head, bit(12, 4), s.trainers_match_typing_distribution)?;
    place_flag(&mut head, bit(12, 6), !s.trainers_can_use_legendaries)?;
    place_flag(&mut head, bit(12, 7), !s.trainers_early_wonder_guard)?;

    // 13, 14: wild pokemon
    s.wild_pokemon.encode_into(&mut head)?;
    s.wild_pokemon_restriction.encode_into(&mut head)?;
    place_flag(&mut head, bit(13, 7), s.use_time_based_encounters)?;
    place_flag(&mut head, bit(14, 0), s.use_minimum_catch_rate)?;
    place_flag(&mut head, bit(14, 1), !s.encounter_legendaries)?;
    place_flag(&mut head, bit(14, 3), s.randomize_wild_pokemon_held_items)?;

    // 15: static pokemon
    s.static_pokemon.encode_into(&mut head)?;

    // 16: TMs
    s.tms.encode_into(&mut head)?;
    s.tms_hms_compatibility.encode_into(&mut head)?;
    place_flag(&mut head, bit(16, 5), s.tm_level_up_move_sanity)?;
    place_flag(&mut head, bit(16, 6), s.keep_field_moves)?;

    // 17: move tutors
    s.move_tutor_moves.encode_into(&mut head)?;
    s.move_tutors_compatibility.encode_into(&mut head)?;
    place_flag(&mut head, bit(17, 5), s.tutor_level_up_move_sanity)?;
    place_flag(&mut head, bit(17, 6), s.keep_field_move_tutors)?;

    // 18: in-game trades
    s.in_game_trades.encode_into(&mut head)?;
    place_flag(&mut head, bit(18, 2), s.randomize_in_game_trades_items)?;
    place_flag(&mut head, bit(18, 3), s.randomize_in_game_trades_ivs)?;
    place_flag(&mut head, bit(18, 4), s.randomize_in_game_trades_nicknames)?;
    place_flag(&mut head, bit(18, 5), s.randomize_in_game_trades_ots)?;

    // 19: field items
    s.field_items.encode_into(&mut head)?;

    let name = s.profile.as_bytes();
    if !s.profile.is_ascii() || name.len() > u8::MAX as usize {
        return Err(CodecError::InvalidProfileName {
            name: s.profile.clone(),
        });
    }

    let mut out = Vec::with_capacity(FEATURE_BYTES + 9 + name.len() + 16);
    out.extend_from_slice(&head);

    // @20 restrictions, @24 code tweaks
    let restrictions = s.restrictions.map_or(0, |r| r.bits());
    out.extend_from_slice(&restrictions.to_be_bytes());
    out.extend_from_slice(&s.code_tweaks.to_be_bytes());

    // @28 profile name
    out.push(name.len() as u8);
    out.extend_from_slice(name);

    let checksum = crc32fast::hash(&out);
    out.extend_from_slice(&checksum.to_be_bytes());

    let aux = &s.resource_checksums;
    for value in [aux.trainer_classes, aux.trainer_names, aux.nicknames] {
        out.extend_from_slice(&value.to_be_bytes());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{read_u32_be, PROFILE_NAME_OFFSET, TRAILER_LEN};
    use crate::{FieldItemsMod, Restrictions, StartersMod, WildPokemonRestrictionMod};

    #[test]
    fn default_settings_layout() {
        let bytes = encode_bytes(&Settings::for_profile("TESTPROFILE")).unwrap();
        assert_eq!(bytes.len(), PROFILE_NAME_OFFSET + 11 + TRAILER_LEN);

        // every group at its first variant, inverted toggles stored as 0
        assert_eq!(bytes[0], 0x00);
        assert_eq!(bytes[1], 0x08 | 0x10);
        assert_eq!(bytes[2], 0x04);
        assert_eq!(bytes[3], 0x00);
        assert_eq!(bytes[4], 0x04);
        assert_eq!(&bytes[5..11], &[0; 6]);
        assert_eq!(bytes[11], 0x04);
        assert_eq!(bytes[12], 0x20);
        assert_eq!(bytes[13], 0x40 | 0x04);
        assert_eq!(bytes[14], 0x00);
        assert_eq!(bytes[15], 0x01);
        assert_eq!(bytes[16], 0x10 | 0x04);
        assert_eq!(bytes[17], 0x10 | 0x04);
        assert_eq!(bytes[18], 0x40);
        assert_eq!(bytes[19], 0x04);
        assert_eq!(&bytes[20..28], &[0; 8]);
        assert_eq!(bytes[28], 11);
        assert_eq!(&bytes[29..40], b"TESTPROFILE");

        let crc = read_u32_be(&bytes, bytes.len() - TRAILER_LEN);
        assert_eq!(crc, crc32fast::hash(&bytes[..bytes.len() - TRAILER_LEN]));
    }

    #[test]
    fn multi_byte_fields_and_trailer() {
        let mut s = Settings::for_profile("P");
        s.starters = StartersMod::Custom;
        s.custom_starters = [1, 256, 650];
        s.restrictions = Some(Restrictions(0x0102_0304));
        s.code_tweaks = 0x8000_0001;
        s.resource_checksums.trainer_classes = 0xAABB_CCDD;
        s.resource_checksums.nicknames = 7;
        s.wild_pokemon_restriction = WildPokemonRestrictionMod::SimilarStrength;
        s.field_items = FieldItemsMod::Random;

        let bytes = encode_bytes(&s).unwrap();
        assert_eq!(bytes[4], 0x01);
        assert_eq!(&bytes[5..11], &[0x00, 0x00, 0xFF, 0x00, 0x89, 0x02]);
        assert_eq!(bytes[13] & 0x0D, 0);
        assert_eq!(bytes[14], 0x04);
        assert_eq!(bytes[19], 0x01);
        assert_eq!(&bytes[20..24], &[1, 2, 3, 4]);
        assert_eq!(&bytes[24..28], &[0x80, 0, 0, 1]);

        let n = bytes.len();
        assert_eq!(read_u32_be(&bytes, n - 12), 0xAABB_CCDD);
        assert_eq!(read_u32_be(&bytes, n - 8), 0);
        assert_eq!(read_u32_be(&bytes, n - 4), 7);
    }

    #[test]
    fn inverted_toggles_are_stored_negated() {
        let mut s = Settings::for_profile("P");
        s.allow_wonder_guard = false;
        s.allow_broken_moves = false;
        s.trainers_can_use_legendaries = false;
        s.trainers_early_wonder_guard = false;
        s.encounter_legendaries = false;

        let bytes = encode_bytes(&s).unwrap();
        assert_eq!(bytes[1] & 0x40, 0x40);
        assert_eq!(bytes[2] & 0x40, 0x40);
        assert_eq!(bytes[12] & 0xC0, 0xC0);
        assert_eq!(bytes[14] & 0x02, 0x02);
    }

    #[test]
    fn rejects_unstorable_profile_names() {
        let s = Settings::for_profile("Pokémon");
        assert!(matches!(
            encode(&s),
            Err(CodecError::InvalidProfileName { .. })
        ));
        let s = Settings::for_profile("x".repeat(256));
        assert!(matches!(
            encode(&s),
            Err(CodecError::InvalidProfileName { .. })
        ));
    }

    #[test]
    fn text_is_padded_base64() {
        let text = encode(&Settings::for_profile("TESTPROFILE")).unwrap();
        // 56 bytes -> 76 chars with one '=' of padding
        assert_eq!(text.len(), 76);
        assert!(text.ends_with('='));
        assert!(!text.ends_with("=="));
    }
}
