use thiserror::Error;

pub mod bits;
mod decode;
mod encode;
mod gate;
mod layout;
mod legacy;
pub mod profile;
mod settings;

pub use decode::decode;
pub use encode::{encode, encode_bytes};
pub use gate::{read_from, write_to, VersionGate};
pub use layout::CURRENT_VERSION;
pub use legacy::LegacyMigrator;
pub use profile::{CatalogEntry, Profile, ProfileRegistry, Restrictions, StaticProfile};
pub use settings::*;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("can't pack {count} flags into a single byte")]
    TooManyFlags { count: usize },

    #[error("bit index {index} is out of range for a byte")]
    BitIndexOutOfRange { index: u8 },

    #[error("exactly one value for {group} must be chosen, found {set}")]
    AmbiguousSelection { group: &'static str, set: usize },

    #[error("variant index {index} is out of range for {group}")]
    VariantOutOfRange { group: &'static str, index: usize },

    #[error("settings checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    IntegrityMismatch { stored: u32, computed: u32 },

    #[error("settings version {version} is newer than this tool (max {current})")]
    UnsupportedFutureVersion { version: u8, current: u8 },

    #[error("unknown profile '{name}'")]
    UnknownProfile { name: String },

    #[error("profile '{name}' has an empty catalog")]
    EmptyCatalog { name: String },

    #[error("profile name '{name}' can't be stored (must be ASCII, at most 255 bytes)")]
    InvalidProfileName { name: String },

    #[error("settings data truncated: need {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },

    #[error("settings data has wrong length: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("settings text is not valid base64: {0}")]
    InvalidText(#[from] base64::DecodeError),

    #[error("settings text is {len} bytes, the envelope holds at most 255")]
    TextTooLong { len: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
