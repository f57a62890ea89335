use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};

use crate::bits::{bit, read_flag, unpack_flag, OptionGroup};
use crate::layout::{
    body_checksum, read_u32_be, CODE_TWEAKS_OFFSET, MIN_ENCODED_LEN, PROFILE_NAME_LEN_OFFSET,
    PROFILE_NAME_OFFSET, RESTRICTIONS_OFFSET, STARTER_SLOTS, TRAILER_LEN,
};
use crate::profile::{CatalogEntry, Profile, ProfileRegistry, Restrictions};
use crate::{CodecError, ResourceChecksums, Result, Settings};

/// Parse current-version quick-settings text, resolving the embedded
/// profile name against `registry`.
pub fn decode(text: &str, registry: &ProfileRegistry) -> Result<Settings> {
    let data = STANDARD.decode(text.trim())?;
    decode_bytes(&data, registry)
}

pub(crate) fn verify_checksum(data: &[u8]) -> Result<()> {
    if data.len() < MIN_ENCODED_LEN {
        return Err(CodecError::TruncatedInput {
            expected: MIN_ENCODED_LEN,
            actual: data.len(),
        });
    }

    let stored = read_u32_be(data, data.len() - TRAILER_LEN);
    let computed = body_checksum(data);
    if stored != computed {
        return Err(CodecError::IntegrityMismatch { stored, computed });
    }
    Ok(())
}

pub(crate) fn decode_bytes(data: &[u8], registry: &ProfileRegistry) -> Result<Settings> {
    verify_checksum(data)?;

    let name_len = data[PROFILE_NAME_LEN_OFFSET] as usize;
    let expected = PROFILE_NAME_OFFSET + name_len + TRAILER_LEN;
    if data.len() < expected {
        return Err(CodecError::TruncatedInput {
            expected,
            actual: data.len(),
        });
    }
    if data.len() > expected {
        return Err(CodecError::LengthMismatch {
            expected,
            actual: data.len(),
        });
    }

    let name_bytes = &data[PROFILE_NAME_OFFSET..PROFILE_NAME_OFFSET + name_len];
    let name = match std::str::from_utf8(name_bytes) {
        Ok(name) if name.is_ascii() => name,
        _ => {
            return Err(CodecError::UnknownProfile {
                name: String::from_utf8_lossy(name_bytes).into_owned(),
            })
        }
    };
    let profile = registry.resolve(name)?;
    debug!("decoding settings for profile '{}'", name);

    let mut s = Settings::for_profile(name);

    s.lower_case_pokemon_names = unpack_flag(data[0], 0)?;
    s.national_dex_at_start = unpack_flag(data[0], 1)?;
    s.change_impossible_evolutions = unpack_flag(data[0], 2)?;
    s.update_moves = unpack_flag(data[0], 3)?;
    s.update_moves_legacy = unpack_flag(data[0], 4)?;
    s.update_type_effectiveness = unpack_flag(data[0], 5)?;
    s.randomize_trainer_names = unpack_flag(data[0], 6)?;
    s.randomize_trainer_class_names = unpack_flag(data[0], 7)?;

    if s.update_moves_legacy && !profile.supports_legacy_move_update() {
        warn!(
            "profile '{}' has no legacy move update, turning move updates off",
            name
        );
        s.update_moves_legacy = false;
        s.update_moves = false;
    }

    s.base_statistics = OptionGroup::decode_from(data)?;
    s.abilities = OptionGroup::decode_from(data)?;
    s.allow_wonder_guard = !read_flag(data, bit(1, 6))?;
    s.standardize_exp_curves = read_flag(data, bit(1, 7))?;

    s.types = OptionGroup::decode_from(data)?;
    s.use_code_tweaks = read_flag(data, bit(2, 3))?;
    s.race_mode = read_flag(data, bit(2, 4))?;
    s.randomize_hidden_hollows = read_flag(data, bit(2, 5))?;
    s.allow_broken_moves = !read_flag(data, bit(2, 6))?;
    s.limit_pokemon = read_flag(data, bit(2, 7))?;

    s.make_evolutions_easier = unpack_flag(data[3], 0)?;

    s.starters = OptionGroup::decode_from(data)?;
    s.randomize_starters_held_items = read_flag(data, bit(4, 4))?;

    let catalog = profile.catalog();
    for (slot, &offset) in s.custom_starters.iter_mut().zip(STARTER_SLOTS.iter()) {
        let stored = u16::from_le_bytes([data[offset], data[offset + 1]]);
        *slot = resolve_slot(profile, catalog, stored)?.ordinal;
    }

    s.movesets = OptionGroup::decode_from(data)?;
    s.start_with_four_moves = read_flag(data, bit(11, 4))?;

    s.trainers = OptionGroup::decode_from(data)?;
    s.trainers_use_pokemon_of_similar_strength = read_flag(data, bit(12, 0))?;
    s.rival_carries_starter_throughout = read_flag(data, bit(12, 2))?;
    s.trainers_match_typing_distribution = read_flag(data, bit(12, 4))?;
    s.trainers_can_use_legendaries = !read_flag(data, bit(12, 6))?;
    s.trainers_early_wonder_guard = !read_flag(data, bit(12, 7))?;

    s.wild_pokemon = OptionGroup::decode_from(data)?;
    s.wild_pokemon_restriction = OptionGroup::decode_from(data)?;
    s.use_time_based_encounters = read_flag(data, bit(13, 7))?;
    s.use_minimum_catch_rate = read_flag(data, bit(14, 0))?;
    s.encounter_legendaries = !read_flag(data, bit(14, 1))?;
    s.randomize_wild_pokemon_held_items = read_flag(data, bit(14, 3))?;

    s.static_pokemon = OptionGroup::decode_from(data)?;

    s.tms = OptionGroup::decode_from(data)?;
    s.tms_hms_compatibility = OptionGroup::decode_from(data)?;
    s.tm_level_up_move_sanity = read_flag(data, bit(16, 5))?;
    s.keep_field_moves = read_flag(data, bit(16, 6))?;

    s.move_tutor_moves = OptionGroup::decode_from(data)?;
    s.move_tutors_compatibility = OptionGroup::decode_from(data)?;
    s.tutor_level_up_move_sanity = read_flag(data, bit(17, 5))?;
    s.keep_field_move_tutors = read_flag(data, bit(17, 6))?;

    s.in_game_trades = OptionGroup::decode_from(data)?;
    s.randomize_in_game_trades_items = read_flag(data, bit(18, 2))?;
    s.randomize_in_game_trades_ivs = read_flag(data, bit(18, 3))?;
    s.randomize_in_game_trades_nicknames = read_flag(data, bit(18, 4))?;
    s.randomize_in_game_trades_ots = read_flag(data, bit(18, 5))?;

    s.field_items = OptionGroup::decode_from(data)?;

    let raw_restrictions = read_u32_be(data, RESTRICTIONS_OFFSET);
    // a mask scoped down to nothing reads as unrestricted, same as it would
    // after being saved again
    s.restrictions = Some(profile.scope_restrictions(Restrictions(raw_restrictions)))
        .filter(|r| !r.is_empty());
    if raw_restrictions != 0 && s.restrictions.is_none() {
        warn!(
            "restrictions {:#x} are all outside what '{}' supports, dropping them",
            raw_restrictions, name
        );
    }

    let raw_tweaks = read_u32_be(data, CODE_TWEAKS_OFFSET);
    s.code_tweaks = raw_tweaks & profile.code_tweaks_available();
    if s.code_tweaks != raw_tweaks {
        warn!(
            "dropping code tweaks {:#x} not available for '{}'",
            raw_tweaks & !s.code_tweaks,
            name
        );
    }
    if s.code_tweaks == 0 {
        s.use_code_tweaks = false;
    }

    let trailer = data.len() - TRAILER_LEN;
    s.resource_checksums = ResourceChecksums {
        trainer_classes: read_u32_be(data, trailer + 4),
        trainer_names: read_u32_be(data, trailer + 8),
        nicknames: read_u32_be(data, trailer + 12),
    };

    Ok(s)
}

/// Offsets past the end of the catalog clamp to its last entry, so settings
/// made against a larger roster still load.
fn resolve_slot<'a>(
    profile: &dyn Profile,
    catalog: &'a [CatalogEntry],
    offset: u16,
) -> Result<&'a CatalogEntry> {
    let last = catalog.last().ok_or_else(|| CodecError::EmptyCatalog {
        name: profile.name().to_string(),
    })?;
    match catalog.get(offset as usize) {
        Some(entry) => Ok(entry),
        None => {
            warn!(
                "selection offset {} is past the {} catalog entries of '{}', using the last one",
                offset,
                catalog.len(),
                profile.name()
            );
            Ok(last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, encode_bytes};
    use crate::profile::StaticProfile;
    use crate::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn catalog(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("species #{i}")).collect()
    }

    fn registry() -> ProfileRegistry {
        ProfileRegistry::new([
            Box::new(StaticProfile::new("TESTPROFILE", catalog(649))) as Box<dyn Profile>,
            Box::new(
                StaticProfile::new("SMALL", catalog(151))
                    .with_restriction_mask(0x0F)
                    .with_code_tweaks(0x01)
                    .with_legacy_move_update(false),
            ),
            Box::new(StaticProfile::new("EMPTY", Vec::new())),
        ])
    }

    fn pick<G: OptionGroup>(rng: &mut StdRng) -> G {
        *G::VARIANTS.choose(rng).unwrap()
    }

    fn random_settings(rng: &mut StdRng) -> Settings {
        let mut s = Settings::for_profile("TESTPROFILE");
        s.lower_case_pokemon_names = rng.gen();
        s.national_dex_at_start = rng.gen();
        s.change_impossible_evolutions = rng.gen();
        s.update_moves = rng.gen();
        s.update_moves_legacy = rng.gen();
        s.update_type_effectiveness = rng.gen();
        s.randomize_trainer_names = rng.gen();
        s.randomize_trainer_class_names = rng.gen();
        s.race_mode = rng.gen();
        s.randomize_hidden_hollows = rng.gen();
        s.allow_broken_moves = rng.gen();
        s.limit_pokemon = rng.gen();
        s.make_evolutions_easier = rng.gen();
        s.base_statistics = pick(rng);
        s.standardize_exp_curves = rng.gen();
        s.abilities = pick(rng);
        s.allow_wonder_guard = rng.gen();
        s.types = pick(rng);
        s.starters = pick(rng);
        s.custom_starters = [
            rng.gen_range(1..=649),
            rng.gen_range(1..=649),
            rng.gen_range(1..=649),
        ];
        s.randomize_starters_held_items = rng.gen();
        s.movesets = pick(rng);
        s.start_with_four_moves = rng.gen();
        s.trainers = pick(rng);
        s.rival_carries_starter_throughout = rng.gen();
        s.trainers_use_pokemon_of_similar_strength = rng.gen();
        s.trainers_match_typing_distribution = rng.gen();
        s.trainers_can_use_legendaries = rng.gen();
        s.trainers_early_wonder_guard = rng.gen();
        s.wild_pokemon = pick(rng);
        s.wild_pokemon_restriction = pick(rng);
        s.use_time_based_encounters = rng.gen();
        s.encounter_legendaries = rng.gen();
        s.use_minimum_catch_rate = rng.gen();
        s.randomize_wild_pokemon_held_items = rng.gen();
        s.static_pokemon = pick(rng);
        s.tms = pick(rng);
        s.tms_hms_compatibility = pick(rng);
        s.tm_level_up_move_sanity = rng.gen();
        s.keep_field_moves = rng.gen();
        s.move_tutor_moves = pick(rng);
        s.move_tutors_compatibility = pick(rng);
        s.tutor_level_up_move_sanity = rng.gen();
        s.keep_field_move_tutors = rng.gen();
        s.in_game_trades = pick(rng);
        s.randomize_in_game_trades_nicknames = rng.gen();
        s.randomize_in_game_trades_ots = rng.gen();
        s.randomize_in_game_trades_ivs = rng.gen();
        s.randomize_in_game_trades_items = rng.gen();
        s.field_items = pick(rng);

        s.restrictions = match rng.gen_range(0u32..4) {
            0 => None,
            _ => Some(Restrictions(rng.gen_range(1..=u32::MAX))),
        };
        s.code_tweaks = rng.gen();
        s.use_code_tweaks = s.code_tweaks != 0 && rng.gen();
        s.resource_checksums = ResourceChecksums {
            trainer_classes: rng.gen(),
            trainer_names: rng.gen(),
            nicknames: rng.gen(),
        };
        s
    }

    #[test]
    fn default_settings_round_trip() {
        let registry = registry();
        let s = Settings::for_profile("TESTPROFILE");
        let text = encode(&s).unwrap();
        assert_eq!(decode(&text, &registry).unwrap(), s);
    }

    #[test]
    fn all_false_settings_round_trip() {
        let registry = registry();
        let mut s = Settings::for_profile("TESTPROFILE");
        s.allow_broken_moves = false;
        s.allow_wonder_guard = false;
        s.trainers_can_use_legendaries = false;
        s.trainers_early_wonder_guard = false;
        s.encounter_legendaries = false;

        let bytes = encode_bytes(&s).unwrap();
        verify_checksum(&bytes).unwrap();
        assert_eq!(decode_bytes(&bytes, &registry).unwrap(), s);
    }

    #[test]
    fn random_settings_round_trip() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(0x5EED_0163);
        for _ in 0..500 {
            let s = random_settings(&mut rng);
            let text = encode(&s).unwrap();
            assert_eq!(decode(&text, &registry).unwrap(), s);
        }
    }

    #[test]
    fn any_flipped_body_bit_fails_the_checksum() {
        let registry = registry();
        let mut rng = StdRng::seed_from_u64(42);
        let bytes = encode_bytes(&random_settings(&mut rng)).unwrap();
        let body = bytes.len() - TRAILER_LEN;

        for i in (0..body).chain(body..body + 4) {
            for b in 0..8 {
                let mut corrupt = bytes.clone();
                corrupt[i] ^= 1 << b;
                let err = decode_bytes(&corrupt, &registry).unwrap_err();
                assert!(
                    matches!(err, CodecError::IntegrityMismatch { .. }),
                    "byte {i} bit {b}: {err}"
                );
            }
        }
    }

    #[test]
    fn resource_checksums_are_not_covered() {
        let registry = registry();
        let s = Settings::for_profile("TESTPROFILE");
        let mut bytes = encode_bytes(&s).unwrap();
        let n = bytes.len();
        bytes[n - 1] ^= 0xFF;
        let decoded = decode_bytes(&bytes, &registry).unwrap();
        assert_eq!(decoded.resource_checksums.nicknames, 0xFF);
    }

    #[test]
    fn slot_offsets_clamp_to_last_entry() {
        let registry = registry();
        let mut s = Settings::for_profile("SMALL");
        s.custom_starters = [151, 152, 649];
        let decoded = decode(&encode(&s).unwrap(), &registry).unwrap();
        assert_eq!(decoded.custom_starters, [151, 151, 151]);

        s.custom_starters = [1, 2, 150];
        let decoded = decode(&encode(&s).unwrap(), &registry).unwrap();
        assert_eq!(decoded.custom_starters, [1, 2, 150]);
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let registry = registry();
        let text = encode(&Settings::for_profile("EMPTY")).unwrap();
        assert!(matches!(
            decode(&text, &registry),
            Err(CodecError::EmptyCatalog { .. })
        ));
    }

    #[test]
    fn profile_corrections_apply() {
        let registry = registry();
        let mut s = Settings::for_profile("SMALL");
        s.update_moves = true;
        s.update_moves_legacy = true;
        s.use_code_tweaks = true;
        s.code_tweaks = 0x06;
        s.restrictions = Some(Restrictions(0xF3));

        let decoded = decode(&encode(&s).unwrap(), &registry).unwrap();
        assert!(!decoded.update_moves);
        assert!(!decoded.update_moves_legacy);
        assert_eq!(decoded.code_tweaks, 0);
        assert!(!decoded.use_code_tweaks);
        assert_eq!(decoded.restrictions, Some(Restrictions(0x03)));

        s.code_tweaks = 0x07;
        let decoded = decode(&encode(&s).unwrap(), &registry).unwrap();
        assert_eq!(decoded.code_tweaks, 0x01);
        assert!(decoded.use_code_tweaks);
    }

    #[test]
    fn restrictions_scoped_to_nothing_stay_stable() {
        let registry = registry();
        let mut s = Settings::for_profile("SMALL");
        s.restrictions = Some(Restrictions(0xF0));

        let once = decode(&encode(&s).unwrap(), &registry).unwrap();
        assert_eq!(once.restrictions, None);
        let twice = decode(&encode(&once).unwrap(), &registry).unwrap();
        assert_eq!(twice, once);

        s.restrictions = Some(Restrictions(0xF3));
        let once = decode(&encode(&s).unwrap(), &registry).unwrap();
        let twice = decode(&encode(&once).unwrap(), &registry).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn unknown_profile() {
        let registry = registry();
        let text = encode(&Settings::for_profile("Emerald (U)")).unwrap();
        assert!(matches!(
            decode(&text, &registry),
            Err(CodecError::UnknownProfile { name }) if name == "Emerald (U)"
        ));
    }

    #[test]
    fn length_must_match_profile_name() {
        let registry = registry();
        let mut bytes = encode_bytes(&Settings::for_profile("TESTPROFILE")).unwrap();
        bytes[PROFILE_NAME_LEN_OFFSET] = 40;
        let n = bytes.len();
        let crc = crc32fast::hash(&bytes[..n - TRAILER_LEN]);
        bytes[n - TRAILER_LEN..n - 12].copy_from_slice(&crc.to_be_bytes());
        assert!(matches!(
            decode_bytes(&bytes, &registry),
            Err(CodecError::TruncatedInput { .. })
        ));

        bytes[PROFILE_NAME_LEN_OFFSET] = 2;
        let crc = crc32fast::hash(&bytes[..n - TRAILER_LEN]);
        bytes[n - TRAILER_LEN..n - 12].copy_from_slice(&crc.to_be_bytes());
        assert!(matches!(
            decode_bytes(&bytes, &registry),
            Err(CodecError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn short_input_is_truncated() {
        let registry = registry();
        let err = decode_bytes(&[0u8; 20], &registry).unwrap_err();
        assert!(matches!(err, CodecError::TruncatedInput { actual: 20, .. }));
        assert!(matches!(
            decode("not base64!", &registry),
            Err(CodecError::InvalidText(_))
        ));
    }

    #[test]
    fn two_bits_in_a_group_are_rejected() {
        let registry = registry();
        let mut bytes = encode_bytes(&Settings::for_profile("TESTPROFILE")).unwrap();
        bytes[19] |= 0x01;
        let n = bytes.len();
        let crc = crc32fast::hash(&bytes[..n - TRAILER_LEN]);
        bytes[n - TRAILER_LEN..n - 12].copy_from_slice(&crc.to_be_bytes());
        assert!(matches!(
            decode_bytes(&bytes, &registry),
            Err(CodecError::AmbiguousSelection { group: "field items", set: 2 })
        ));
    }
}
