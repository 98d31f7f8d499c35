//! UTF-8 encoder: text passes through, DRCS glyphs become Private Use Area code points.

use std::collections::{BTreeSet, HashMap};

use log::debug;

use super::control::{encode_control, C1Form};
use super::{check_glyph, Encode, DRCS_CAPACITY};
use crate::constants::{DATA_UNIT_BITMAP, DATA_UNIT_DRCS_2BYTE, GETA};
use crate::error::Result;
use crate::tokenizer::drcs::{write_bitmap_unit, write_drcs_unit};
use crate::tokenizer::{Bitmap, DrcsGlyph, Token};

/// First code point handed to DRCS glyphs, clear of the additional-symbol PUA block
pub const DRCS_BASE: u32 = 0xEC00;

#[derive(Debug, Clone, Default)]
pub struct Utf8Encoder {
    assigned: HashMap<DrcsGlyph, usize>,
    glyphs:   Vec<DrcsGlyph>,
    used:     BTreeSet<usize>,
    bitmaps:  Vec<Vec<u8>>,
}

impl Utf8Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn code_point(index: usize) -> char {
        char::from_u32(DRCS_BASE + index as u32).unwrap_or(GETA)
    }
}

impl Encode for Utf8Encoder {
    fn encode_character(&mut self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(text.as_bytes());
        Ok(())
    }

    fn encode_drcs(&mut self, glyph: &DrcsGlyph, combining: Option<&str>, out: &mut Vec<u8>) -> Result<()> {
        check_glyph(glyph)?;
        let ch = match self.assigned.get(glyph).copied() {
            Some(i) => {
                self.used.insert(i);
                Self::code_point(i)
            }
            None if self.glyphs.len() < DRCS_CAPACITY => {
                let i = self.glyphs.len();
                self.glyphs.push(glyph.clone());
                self.assigned.insert(glyph.clone(), i);
                self.used.insert(i);
                Self::code_point(i)
            }
            None => {
                debug!("DRCS code points exhausted, writing geta");
                GETA
            }
        };
        let mut buf = [0; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        if let Some(text) = combining {
            out.extend_from_slice(text.as_bytes());
        }
        Ok(())
    }

    /// Bitmaps travel as their own data unit ahead of the statement.
    fn encode_bitmap(&mut self, bitmap: &Bitmap, _out: &mut Vec<u8>) -> Result<()> {
        self.bitmaps.push(write_bitmap_unit(bitmap));
        Ok(())
    }

    fn encode_control(&mut self, token: &Token, out: &mut Vec<u8>) -> Result<()> {
        encode_control(token, C1Form::Utf8, out)
    }

    fn begin(&mut self) {
        self.used.clear();
        self.bitmaps.clear();
    }

    fn finish(&mut self) -> Vec<(u8, Vec<u8>)> {
        let mut units = Vec::new();
        if !self.used.is_empty() {
            let entries: Vec<(u16, &DrcsGlyph)> = self
                .used
                .iter()
                .map(|&i| ((DRCS_BASE + i as u32) as u16, &self.glyphs[i]))
                .collect();
            units.push((DATA_UNIT_DRCS_2BYTE, write_drcs_unit(&entries)));
        }
        units.extend(self.bitmaps.drain(..).map(|b| (DATA_UNIT_BITMAP, b)));
        self.used.clear();
        units
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{CharacterSize, Tokenize, Utf8Tokenizer};

    #[test]
    fn c1_controls_are_two_bytes() {
        let mut encoder = Utf8Encoder::new();
        let tokens = [Token::CharacterSize(CharacterSize::Small), Token::character("字"), Token::ActivePositionReturn];
        let encoded = encoder.encode(&tokens).unwrap();
        assert_eq!(encoded.statement, [&[0xC2, 0x88][..], "字".as_bytes(), &[0x0D][..]].concat());
        assert!(encoded.units.is_empty());
    }

    #[test]
    fn drcs_and_bitmap_units() {
        let glyph = DrcsGlyph { width: 4, height: 2, depth: 1, data: vec![0x9F] };
        let bitmap = Bitmap { x: 10, y: 20, flashing_colors: vec![1, 2], data: vec![0x89, 0x50, 0x4E, 0x47] };
        let tokens = [
            Token::Drcs { glyph: glyph.clone(), combining: Some("\u{0303}".into()) },
            Token::Bitmap(bitmap.clone()),
        ];
        let mut encoder = Utf8Encoder::new();
        let encoded = encoder.encode(&tokens).unwrap();
        assert_eq!(encoded.statement, "\u{EC00}\u{0303}".as_bytes());
        assert_eq!(encoded.units.iter().map(|u| u.0).collect::<Vec<_>>(), [DATA_UNIT_DRCS_2BYTE, DATA_UNIT_BITMAP]);

        let mut tokenizer = Utf8Tokenizer::new();
        let decoded = tokenizer.tokenize_units(&encoded.data_units()).unwrap();
        assert_eq!(
            decoded,
            vec![Token::Bitmap(bitmap), Token::Drcs { glyph, combining: Some("\u{0303}".into()) }]
        );
    }
}
