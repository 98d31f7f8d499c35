//! Statement bytes to tokens.
//!
//! [`Jis8Tokenizer`] runs the ISO 2022 style shift-state machine for the ARIB
//! and SBTVD profiles; [`Utf8Tokenizer`] handles TCS = 1 statements. Both keep
//! their DRCS dictionary for the lifetime of the instance, so one tokenizer
//! should be held per caption language.

pub mod charset;
pub(crate) mod control;
pub mod drcs;
pub mod jis8;
pub(crate) mod reader;
pub mod tables;
pub mod token;
pub mod utf8;

use log::debug;

pub use charset::{Charset, ShiftState};
pub use drcs::DrcsStore;
pub use jis8::Jis8Tokenizer;
pub use token::{Bitmap, CharacterSize, DrcsGlyph, FlashingMode, Ornament, Token, WritingMode};
pub use utf8::Utf8Tokenizer;

use crate::datagroup::DataUnit;
use crate::error::Result;
use crate::types::{Profile, SymbolTable, TextCodingSystem};

pub trait Tokenize {
    /// Decodes one statement data unit.
    fn tokenize(&mut self, statement: &[u8]) -> Result<Vec<Token>>;

    /// Adds the glyphs of a DRCS data unit, returning how many were read.
    fn load_drcs(&mut self, data: &[u8], two_byte: bool) -> Result<usize>;

    /// Statement units yield tokens, DRCS units load glyphs, bitmap units yield one token.
    fn tokenize_unit(&mut self, unit: &DataUnit) -> Result<Vec<Token>> {
        match *unit {
            DataUnit::Statement(data) => self.tokenize(data),
            DataUnit::Drcs { two_byte, data } => {
                let n = self.load_drcs(data, two_byte)?;
                debug!("loaded {n} DRCS glyphs");
                Ok(Vec::new())
            }
            DataUnit::Bitmap(data) => Ok(vec![Token::Bitmap(drcs::parse_bitmap(data)?)]),
            DataUnit::Other { parameter, .. } => {
                debug!("skipping data unit {parameter:#04x}");
                Ok(Vec::new())
            }
        }
    }

    fn tokenize_units(&mut self, units: &[DataUnit]) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        for unit in units {
            out.extend(self.tokenize_unit(unit)?);
        }
        Ok(out)
    }
}

/// Tokenizer for a language's text coding system and profile
pub fn for_language(tcs: TextCodingSystem, profile: Profile, symbols: SymbolTable) -> Box<dyn Tokenize + Send> {
    match tcs {
        TextCodingSystem::Jis8 => Box::new(Jis8Tokenizer::new(profile, symbols)),
        TextCodingSystem::Utf8 => Box::new(Utf8Tokenizer::new()),
    }
}
