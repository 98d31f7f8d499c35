//! UTF-8 statement decoding: controls share the 8-bit tables, C1 codes arrive as `C2 80..=C2 9F`.

use log::debug;
use unicode_segmentation::UnicodeSegmentation;

use super::control::{read_c0, read_c1};
use super::drcs::DrcsStore;
use super::reader::ByteReader;
use super::tables::SBTVD_NON_SPACING;
use super::token::Token;
use super::Tokenize;
use crate::error::{malformed, Error, Result};

const PUA: std::ops::RangeInclusive<u32> = 0xE000..=0xF8FF;

/// DRCS glyphs are keyed by their Private Use Area code point.
#[derive(Debug, Default, Clone)]
pub struct Utf8Tokenizer {
    drcs: DrcsStore,
}

impl Utf8Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drcs(&self) -> &DrcsStore {
        &self.drcs
    }

    fn push_text(&self, text: &str, out: &mut Vec<Token>) {
        for grapheme in text.graphemes(true) {
            let mut chars = grapheme.chars();
            let Some(first) = chars.next() else { continue };
            if PUA.contains(&(first as u32)) {
                if let Some(glyph) = self.drcs.get(0, first as u32 as u16) {
                    let rest = chars.as_str();
                    let combining = (!rest.is_empty()).then(|| rest.to_owned());
                    out.push(Token::Drcs { glyph: glyph.clone(), combining });
                    continue;
                }
                debug!("U+{:04X} has no DRCS definition, kept as text", first as u32);
            }
            let non_spacing = grapheme.chars().all(|c| SBTVD_NON_SPACING.contains(&c));
            out.push(Token::Character { text: grapheme.to_owned(), non_spacing });
        }
    }
}

/// Whether `b` opens a control function rather than text
fn is_control(b: u8, next: Option<u8>) -> bool {
    b <= 0x20 || b == 0x7F || (b == 0xC2 && matches!(next, Some(0x80..=0x9F)))
}

impl Tokenize for Utf8Tokenizer {
    fn tokenize(&mut self, statement: &[u8]) -> Result<Vec<Token>> {
        let mut out = Vec::new();
        let mut r = ByteReader::new(statement);
        while let Some(b) = r.peek() {
            match b {
                0x0E | 0x0F | 0x19 | 0x1B | 0x1D => {
                    return Err(Error::ViolatesStandard(format!("code set control {b:#04x} in UTF-8 text")));
                }
                0xC2 if matches!(r.peek_at(1), Some(0x80..=0x9F)) => {
                    r.next()?;
                    let c1 = r.next()?;
                    out.push(read_c1(c1, &mut r)?);
                }
                _ if b <= 0x20 || b == 0x7F => {
                    r.next()?;
                    out.push(read_c0(b, &mut r)?);
                }
                _ => {
                    let start = r.position();
                    let mut end = start;
                    while end < statement.len() && !is_control(statement[end], statement.get(end + 1).copied()) {
                        end += 1;
                    }
                    let run = r.take(end - start)?;
                    let text = std::str::from_utf8(run).map_err(|e| malformed(format!("UTF-8 text: {e}")))?;
                    self.push_text(text, &mut out);
                }
            }
        }
        Ok(out)
    }

    fn load_drcs(&mut self, data: &[u8], _two_byte: bool) -> Result<usize> {
        let parsed = super::drcs::parse_drcs(data)?;
        let n = parsed.len();
        for (code, glyph) in parsed {
            self.drcs.insert(0, code, glyph);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::drcs::write_drcs_unit;
    use crate::tokenizer::token::{CharacterSize, DrcsGlyph};

    #[test]
    fn text_controls_and_c1() {
        let mut tok = Utf8Tokenizer::new();
        let bytes = "\u{0089}日本\u{000C}e\u{0301}".as_bytes();
        let tokens = tok.tokenize(bytes).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::CharacterSize(CharacterSize::Middle),
                Token::character("日"),
                Token::character("本"),
                Token::ClearScreen,
                Token::character("e\u{0301}"),
            ]
        );
    }

    #[test]
    fn pua_resolves_to_drcs_with_combining_suffix() {
        let glyph = DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0xF0] };
        let mut tok = Utf8Tokenizer::new();
        tok.load_drcs(&write_drcs_unit(&[(0xE001, &glyph)]), true).unwrap();

        let tokens = tok.tokenize("\u{E001}\u{0308}\u{E002}".as_bytes()).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Drcs { glyph, combining: Some("\u{0308}".into()) },
                Token::character("\u{E002}"),
            ]
        );
    }

    #[test]
    fn shifts_violate_the_standard() {
        let mut tok = Utf8Tokenizer::new();
        assert!(matches!(tok.tokenize(&[0x41, 0x0E]), Err(Error::ViolatesStandard(_))));
        assert!(matches!(tok.tokenize(&[0x1B, 0x7E]), Err(Error::ViolatesStandard(_))));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut tok = Utf8Tokenizer::new();
        assert!(matches!(tok.tokenize(&[0xE6, 0x97]), Err(Error::Malformed(_))));
    }
}
