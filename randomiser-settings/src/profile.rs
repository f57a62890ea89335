use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::Result;

/// Restriction bitmask over the species pool (which generations and their
/// related species are allowed).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Restrictions(pub u32);

impl Restrictions {
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One entry of a profile's ordered catalog, addressed by a 1-based ordinal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub ordinal: u16,
    pub name: String,
}

pub trait Profile: Send + Sync {
    fn name(&self) -> &str;

    /// Entries selectable by the three custom slots, ordinal 1 first.
    fn catalog(&self) -> &[CatalogEntry];

    /// Bound a raw restriction mask to what this profile can honour.
    fn scope_restrictions(&self, raw: Restrictions) -> Restrictions;

    /// Mask of code tweaks this profile implements.
    fn code_tweaks_available(&self) -> u32;

    /// Whether "update moves (legacy)" means anything for this target.
    fn supports_legacy_move_update(&self) -> bool {
        true
    }
}

/// Data-driven profile, loadable from JSON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StaticProfile {
    pub name: String,
    #[serde(default)]
    pub catalog: Vec<String>,
    #[serde(default = "all_bits")]
    pub restriction_mask: u32,
    #[serde(default = "all_bits")]
    pub code_tweaks_available: u32,
    #[serde(default = "default_true")]
    pub legacy_move_update: bool,
    #[serde(skip)]
    entries: Vec<CatalogEntry>,
}

fn default_true() -> bool {
    true
}

fn all_bits() -> u32 {
    u32::MAX
}

impl StaticProfile {
    pub fn new(name: impl Into<String>, catalog: Vec<String>) -> Self {
        let mut profile = Self {
            name: name.into(),
            catalog,
            restriction_mask: all_bits(),
            code_tweaks_available: all_bits(),
            legacy_move_update: true,
            entries: Vec::new(),
        };
        profile.index_catalog();
        profile
    }

    pub fn with_restriction_mask(mut self, mask: u32) -> Self {
        self.restriction_mask = mask;
        self
    }

    pub fn with_code_tweaks(mut self, mask: u32) -> Self {
        self.code_tweaks_available = mask;
        self
    }

    pub fn with_legacy_move_update(mut self, supported: bool) -> Self {
        self.legacy_move_update = supported;
        self
    }

    fn index_catalog(&mut self) {
        self.entries = self
            .catalog
            .iter()
            .enumerate()
            .map(|(i, name)| CatalogEntry {
                ordinal: (i + 1) as u16,
                name: name.clone(),
            })
            .collect();
    }
}

impl Profile for StaticProfile {
    fn name(&self) -> &str {
        &self.name
    }

    fn catalog(&self) -> &[CatalogEntry] {
        &self.entries
    }

    fn scope_restrictions(&self, raw: Restrictions) -> Restrictions {
        Restrictions(raw.0 & self.restriction_mask)
    }

    fn code_tweaks_available(&self) -> u32 {
        self.code_tweaks_available
    }

    fn supports_legacy_move_update(&self) -> bool {
        self.legacy_move_update
    }
}

#[derive(Default)]
pub struct ProfileRegistry {
    profiles: HashMap<String, Box<dyn Profile>>,
}

impl fmt::Debug for ProfileRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProfileRegistry").field("profiles", &names).finish()
    }
}

impl ProfileRegistry {
    pub fn new(profiles: impl IntoIterator<Item = Box<dyn Profile>>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.name().to_string(), p))
            .collect();
        Self { profiles }
    }

    /// Build a registry from a JSON array of [`StaticProfile`]s.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let profiles: Vec<StaticProfile> = serde_json::from_str(json)?;
        Ok(Self::new(profiles.into_iter().map(|mut p| {
            p.index_catalog();
            Box::new(p) as Box<dyn Profile>
        })))
    }

    pub fn get(&self, name: &str) -> Option<&dyn Profile> {
        Some(self.profiles.get(name)?.as_ref())
    }

    pub(crate) fn resolve(&self, name: &str) -> Result<&dyn Profile> {
        self.get(name).ok_or_else(|| crate::CodecError::UnknownProfile {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
