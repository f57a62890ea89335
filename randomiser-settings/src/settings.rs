use serde::{Deserialize, Serialize};

use crate::bits::{bit, BitPos, OptionGroup};
use crate::profile::Restrictions;

/// Declares an option group enum together with its bit table. The first
/// variant listed is the default.
macro_rules! option_group {
    (
        $(#[$meta:meta])*
        pub enum $name:ident = $label:literal {
            $first:ident => ($fbyte:expr, $fbit:expr)
            $(, $variant:ident => ($byte:expr, $bit:expr))* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $first,
            $($variant,)*
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$first
            }
        }

        impl OptionGroup for $name {
            const NAME: &'static str = $label;
            const VARIANTS: &'static [Self] = &[Self::$first, $(Self::$variant,)*];
            const BITS: &'static [BitPos] = &[bit($fbyte, $fbit), $(bit($byte, $bit),)*];

            fn ordinal(self) -> usize {
                self as usize
            }
        }
    };
}

option_group! {
    pub enum BaseStatisticsMod = "base statistics" {
        Unchanged => (1, 3),
        Shuffle => (1, 2),
        RandomFollowEvolutions => (1, 0),
        CompletelyRandom => (1, 1),
    }
}

option_group! {
    pub enum AbilitiesMod = "abilities" {
        Unchanged => (1, 4),
        Randomize => (1, 5),
    }
}

option_group! {
    pub enum TypesMod = "types" {
        Unchanged => (2, 2),
        RandomFollowEvolutions => (2, 0),
        CompletelyRandom => (2, 1),
    }
}

option_group! {
    pub enum StartersMod = "starters" {
        Unchanged => (4, 2),
        Custom => (4, 0),
        CompletelyRandom => (4, 1),
        RandomWithTwoEvolutions => (4, 3),
    }
}

option_group! {
    pub enum MovesetsMod = "movesets" {
        Unchanged => (11, 2),
        RandomPreferSameType => (11, 1),
        CompletelyRandom => (11, 0),
        MetronomeOnly => (11, 3),
    }
}

option_group! {
    pub enum TrainersMod = "trainers" {
        Unchanged => (12, 5),
        Random => (12, 1),
        TypeThemed => (12, 3),
    }
}

option_group! {
    pub enum WildPokemonMod = "wild pokemon" {
        Unchanged => (13, 6),
        Random => (13, 5),
        AreaMapping => (13, 1),
        GlobalMapping => (13, 4),
    }
}

option_group! {
    /// The only group split across two bytes: similar strength lives in the
    /// second wild byte since the 161 bugfix.
    pub enum WildPokemonRestrictionMod = "wild pokemon restriction" {
        None => (13, 2),
        SimilarStrength => (14, 2),
        CatchEmAll => (13, 0),
        TypeThemeAreas => (13, 3),
    }
}

option_group! {
    pub enum StaticPokemonMod = "static pokemon" {
        Unchanged => (15, 0),
        RandomMatching => (15, 1),
        CompletelyRandom => (15, 2),
    }
}

option_group! {
    pub enum TmsMod = "TMs" {
        Unchanged => (16, 4),
        Random => (16, 3),
    }
}

option_group! {
    pub enum TmsHmsCompatibilityMod = "TM/HM compatibility" {
        Unchanged => (16, 2),
        RandomPreferType => (16, 1),
        CompletelyRandom => (16, 0),
        Full => (16, 7),
    }
}

option_group! {
    pub enum MoveTutorMovesMod = "move tutor moves" {
        Unchanged => (17, 4),
        Random => (17, 3),
    }
}

option_group! {
    pub enum MoveTutorsCompatibilityMod = "move tutor compatibility" {
        Unchanged => (17, 2),
        RandomPreferType => (17, 1),
        CompletelyRandom => (17, 0),
        Full => (17, 7),
    }
}

option_group! {
    pub enum InGameTradesMod = "in-game trades" {
        Unchanged => (18, 6),
        RandomizeGiven => (18, 1),
        RandomizeGivenAndRequested => (18, 0),
    }
}

option_group! {
    pub enum FieldItemsMod = "field items" {
        Unchanged => (19, 2),
        Shuffle => (19, 1),
        Random => (19, 0),
    }
}

/// Checksums of the three custom name files. They are carried through the
/// format untouched; comparing them against the files on disk is up to the
/// caller.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResourceChecksums {
    pub trainer_classes: u32,
    pub trainer_names: u32,
    pub nicknames: u32,
}

/// Everything a quick-settings string records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the profile (target game) the settings were made for.
    pub profile: String,
    pub restrictions: Option<Restrictions>,
    pub code_tweaks: u32,
    pub resource_checksums: ResourceChecksums,

    // general
    pub lower_case_pokemon_names: bool,
    pub national_dex_at_start: bool,
    pub change_impossible_evolutions: bool,
    pub update_moves: bool,
    pub update_moves_legacy: bool,
    pub update_type_effectiveness: bool,
    pub randomize_trainer_names: bool,
    pub randomize_trainer_class_names: bool,
    pub use_code_tweaks: bool,
    pub race_mode: bool,
    pub randomize_hidden_hollows: bool,
    pub allow_broken_moves: bool,
    pub limit_pokemon: bool,
    pub make_evolutions_easier: bool,

    pub base_statistics: BaseStatisticsMod,
    pub standardize_exp_curves: bool,
    pub abilities: AbilitiesMod,
    pub allow_wonder_guard: bool,
    pub types: TypesMod,

    pub starters: StartersMod,
    /// 1-based catalog ordinals.
    pub custom_starters: [u16; 3],
    pub randomize_starters_held_items: bool,

    pub movesets: MovesetsMod,
    pub start_with_four_moves: bool,

    pub trainers: TrainersMod,
    pub rival_carries_starter_throughout: bool,
    pub trainers_use_pokemon_of_similar_strength: bool,
    pub trainers_match_typing_distribution: bool,
    pub trainers_can_use_legendaries: bool,
    pub trainers_early_wonder_guard: bool,

    pub wild_pokemon: WildPokemonMod,
    pub wild_pokemon_restriction: WildPokemonRestrictionMod,
    pub use_time_based_encounters: bool,
    pub encounter_legendaries: bool,
    pub use_minimum_catch_rate: bool,
    pub randomize_wild_pokemon_held_items: bool,

    pub static_pokemon: StaticPokemonMod,

    pub tms: TmsMod,
    pub tms_hms_compatibility: TmsHmsCompatibilityMod,
    pub tm_level_up_move_sanity: bool,
    pub keep_field_moves: bool,

    pub move_tutor_moves: MoveTutorMovesMod,
    pub move_tutors_compatibility: MoveTutorsCompatibilityMod,
    pub tutor_level_up_move_sanity: bool,
    pub keep_field_move_tutors: bool,

    pub in_game_trades: InGameTradesMod,
    pub randomize_in_game_trades_nicknames: bool,
    pub randomize_in_game_trades_ots: bool,
    pub randomize_in_game_trades_ivs: bool,
    pub randomize_in_game_trades_items: bool,

    pub field_items: FieldItemsMod,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: String::new(),
            restrictions: None,
            code_tweaks: 0,
            resource_checksums: ResourceChecksums::default(),

            lower_case_pokemon_names: false,
            national_dex_at_start: false,
            change_impossible_evolutions: false,
            update_moves: false,
            update_moves_legacy: false,
            update_type_effectiveness: false,
            randomize_trainer_names: false,
            randomize_trainer_class_names: false,
            use_code_tweaks: false,
            race_mode: false,
            randomize_hidden_hollows: false,
            allow_broken_moves: true,
            limit_pokemon: false,
            make_evolutions_easier: false,

            base_statistics: BaseStatisticsMod::default(),
            standardize_exp_curves: false,
            abilities: AbilitiesMod::default(),
            allow_wonder_guard: true,
            types: TypesMod::default(),

            starters: StartersMod::default(),
            custom_starters: [1; 3],
            randomize_starters_held_items: false,

            movesets: MovesetsMod::default(),
            start_with_four_moves: false,

            trainers: TrainersMod::default(),
            rival_carries_starter_throughout: false,
            trainers_use_pokemon_of_similar_strength: false,
            trainers_match_typing_distribution: false,
            trainers_can_use_legendaries: true,
            trainers_early_wonder_guard: true,

            wild_pokemon: WildPokemonMod::default(),
            wild_pokemon_restriction: WildPokemonRestrictionMod::default(),
            use_time_based_encounters: false,
            encounter_legendaries: true,
            use_minimum_catch_rate: false,
            randomize_wild_pokemon_held_items: false,

            static_pokemon: StaticPokemonMod::default(),

            tms: TmsMod::default(),
            tms_hms_compatibility: TmsHmsCompatibilityMod::default(),
            tm_level_up_move_sanity: false,
            keep_field_moves: false,

            move_tutor_moves: MoveTutorMovesMod::default(),
            move_tutors_compatibility: MoveTutorsCompatibilityMod::default(),
            tutor_level_up_move_sanity: false,
            keep_field_move_tutors: false,

            in_game_trades: InGameTradesMod::default(),
            randomize_in_game_trades_nicknames: false,
            randomize_in_game_trades_ots: false,
            randomize_in_game_trades_ivs: false,
            randomize_in_game_trades_items: false,

            field_items: FieldItemsMod::default(),
        }
    }
}

impl Settings {
    pub fn for_profile(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            ..Self::default()
        }
    }
}
