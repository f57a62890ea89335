use log::debug;
use std::io::{Read, Write};

use crate::decode::decode;
use crate::encode::encode;
use crate::layout::CURRENT_VERSION;
use crate::legacy::LegacyMigrator;
use crate::profile::ProfileRegistry;
use crate::{CodecError, Result, Settings};

/// Entry point for loading and saving versioned settings.
#[derive(Clone, Copy, Debug)]
pub struct VersionGate<'a> {
    registry: &'a ProfileRegistry,
}

impl<'a> VersionGate<'a> {
    pub fn new(registry: &'a ProfileRegistry) -> Self {
        Self { registry }
    }

    pub fn load(&self, version: u8, text: &str) -> Result<Settings> {
        if version > CURRENT_VERSION {
            return Err(CodecError::UnsupportedFutureVersion {
                version,
                current: CURRENT_VERSION,
            });
        }

        if version < CURRENT_VERSION {
            debug!("settings from version {}, upgrading", version);
            let updated = LegacyMigrator.update(version, text)?;
            return decode(&updated, self.registry);
        }

        decode(text, self.registry)
    }

    pub fn save(&self, settings: &Settings) -> Result<(u8, String)> {
        Ok((CURRENT_VERSION, encode(settings)?))
    }

    pub fn read_settings<R: Read>(&self, reader: &mut R) -> Result<Settings> {
        let (version, text) = read_from(reader)?;
        self.load(version, &text)
    }

    pub fn write_settings<W: Write>(&self, writer: &mut W, settings: &Settings) -> Result<()> {
        write_to(writer, settings)
    }
}

/// Write the `[version][length][text]` envelope for `settings`.
pub fn write_to<W: Write>(writer: &mut W, settings: &Settings) -> Result<()> {
    let text = encode(settings)?;
    let len = u8::try_from(text.len()).map_err(|_| CodecError::TextTooLong { len: text.len() })?;
    writer.write_all(&[CURRENT_VERSION, len])?;
    writer.write_all(text.as_bytes())?;
    Ok(())
}

/// Read an envelope, returning the stored version and its text without
/// interpreting either. A version newer than this tool is rejected before
/// the text is read.
pub fn read_from<R: Read>(reader: &mut R) -> Result<(u8, String)> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header[..1])?;
    let version = header[0];
    if version > CURRENT_VERSION {
        return Err(CodecError::UnsupportedFutureVersion {
            version,
            current: CURRENT_VERSION,
        });
    }

    reader.read_exact(&mut header[1..])?;
    let mut text = vec![0u8; header[1] as usize];
    reader.read_exact(&mut text)?;
    // base64 is ASCII; anything else can't decode anyway
    let text = String::from_utf8_lossy(&text).into_owned();
    Ok((version, text))
}
