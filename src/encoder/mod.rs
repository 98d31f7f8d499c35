//! Tokens back to statement bytes.
//!
//! Each encoder owns a session: DRCS glyphs keep the code they were first
//! given for as long as the encoder lives, while the shift state restarts at
//! the profile defaults with every [`Encode::encode`] call, exactly as a
//! tokenizer does per statement.

pub(crate) mod control;
pub mod jis8;
pub mod utf8;

pub use jis8::Jis8Encoder;
pub use utf8::Utf8Encoder;

use crate::datagroup::DataUnit;
use crate::error::{Error, Result};
use crate::tokenizer::{Bitmap, DrcsGlyph, Token};
use crate::types::{Profile, TextCodingSystem};
use crate::constants::DATA_UNIT_STATEMENT;

/// Distinct glyphs an encoder session can assign before falling back to geta
pub const DRCS_CAPACITY: usize = 94 * 2;

/// One encoded statement and the data units it depends on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoded {
    /// `(data_unit_parameter, bytes)` for DRCS definitions and bitmaps
    pub units: Vec<(u8, Vec<u8>)>,
    pub statement: Vec<u8>,
}

impl Encoded {
    /// Supporting units first, then the statement
    pub fn data_units(&self) -> Vec<DataUnit<'_>> {
        self.units
            .iter()
            .map(|(parameter, data)| DataUnit::new(*parameter, data))
            .chain(std::iter::once(DataUnit::new(DATA_UNIT_STATEMENT, &self.statement)))
            .collect()
    }
}

pub trait Encode {
    fn encode_character(&mut self, text: &str, out: &mut Vec<u8>) -> Result<()>;

    fn encode_drcs(&mut self, glyph: &DrcsGlyph, combining: Option<&str>, out: &mut Vec<u8>) -> Result<()>;

    fn encode_bitmap(&mut self, bitmap: &Bitmap, out: &mut Vec<u8>) -> Result<()>;

    /// Mosaic sets have no token form; they are refused by every profile.
    fn encode_mosaic(&mut self, code: u8, _out: &mut Vec<u8>) -> Result<()> {
        Err(Error::NotImplemented(format!("mosaic code {code:#04x}")))
    }

    fn encode_control(&mut self, token: &Token, out: &mut Vec<u8>) -> Result<()>;

    /// Resets the per-statement state.
    fn begin(&mut self);

    /// Data units needed by everything encoded since [`Encode::begin`].
    fn finish(&mut self) -> Vec<(u8, Vec<u8>)>;

    /// Called with the tokens after the one about to be encoded.
    fn lookahead(&mut self, _rest: &[Token]) {}

    fn encode(&mut self, tokens: &[Token]) -> Result<Encoded> {
        self.begin();
        let mut statement = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            self.lookahead(&tokens[i + 1..]);
            match token {
                Token::Character { text, .. } => self.encode_character(text, &mut statement)?,
                Token::Drcs { glyph, combining } => {
                    self.encode_drcs(glyph, combining.as_deref(), &mut statement)?
                }
                Token::Bitmap(bitmap) => self.encode_bitmap(bitmap, &mut statement)?,
                control => self.encode_control(control, &mut statement)?,
            }
        }
        Ok(Encoded { units: self.finish(), statement })
    }
}

pub fn for_language(tcs: TextCodingSystem, profile: Profile) -> Box<dyn Encode + Send> {
    match tcs {
        TextCodingSystem::Jis8 => Box::new(Jis8Encoder::new(profile)),
        TextCodingSystem::Utf8 => Box::new(Utf8Encoder::new()),
    }
}

/// The glyph must be writable as a linear-bitmap DRCS font.
pub(crate) fn check_glyph(glyph: &DrcsGlyph) -> Result<()> {
    let expected = crate::tokenizer::drcs::pattern_len(glyph.width, glyph.height, glyph.depth);
    if !(1..=8).contains(&glyph.depth) || glyph.data.len() != expected {
        return Err(crate::error::malformed(format!(
            "DRCS glyph {}x{} at {} bits needs {expected} bytes, has {}",
            glyph.width,
            glyph.height,
            glyph.depth,
            glyph.data.len()
        )));
    }
    Ok(())
}
