//! 8-bit (ISO 2022 style) statement decoding for the ARIB and SBTVD profiles.

use log::debug;

use super::charset::{Charset, ShiftState};
use super::control::{read_c0, read_c1};
use super::drcs::DrcsStore;
use super::reader::ByteReader;
use super::tables::{
    additional_symbol, latin_extension, DEFAULT_MACROS, HIRAGANA, JIS_X0201_KATAKANA, JIS_X0208,
    KATAKANA, SBTVD_NON_SPACING, SBTVD_SPECIAL,
};
use super::token::Token;
use super::Tokenize;
use crate::constants::GETA;
use crate::error::{malformed, Error, Result};
use crate::types::{Profile, SymbolTable};

const ADDITIONAL_SYMBOL_ROW: u8 = 85;

/// Tokenizer for one language; DRCS glyphs persist across statements, shift state does not.
#[derive(Debug, Clone)]
pub struct Jis8Tokenizer {
    profile: Profile,
    symbols: SymbolTable,
    drcs:    DrcsStore,
}

impl Jis8Tokenizer {
    pub fn new(profile: Profile, symbols: SymbolTable) -> Self {
        Self { profile, symbols, drcs: DrcsStore::default() }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn drcs(&self) -> &DrcsStore {
        &self.drcs
    }

    fn decode_graphic(&self, set: Charset, c1: u8, c2: u8) -> Result<Token> {
        let idx = (c1 - 0x21) as usize;
        let ch = match set {
            Charset::Kanji | Charset::JisKanji1 | Charset::ExtraSymbols => {
                return Ok(self.decode_kanji(c1, c2));
            }
            Charset::JisKanji2 => '\0',
            Charset::Alnum | Charset::PropAlnum => match (self.profile, c1) {
                (Profile::Arib, 0x5C) => '¥',
                (Profile::Arib, 0x7E) => '‾',
                _ => char::from(c1),
            },
            Charset::Hiragana | Charset::PropHiragana => HIRAGANA[idx],
            Charset::Katakana | Charset::PropKatakana => KATAKANA[idx],
            Charset::JisXKatakana => JIS_X0201_KATAKANA[idx],
            Charset::LatinExtension => latin_extension(c1),
            Charset::Special => {
                let ch = SBTVD_SPECIAL[idx];
                if SBTVD_NON_SPACING.contains(&ch) {
                    return Ok(Token::Character { text: ch.to_string(), non_spacing: true });
                }
                ch
            }
            Charset::MosaicA | Charset::MosaicB | Charset::MosaicC | Charset::MosaicD => {
                return Err(Error::NotImplemented(format!("mosaic set {:#04x}", set.final_byte())));
            }
            Charset::Drcs(plane) => {
                let code = if plane == 0 { u16::from_be_bytes([c1, c2]) } else { c1 as u16 };
                return Ok(match self.drcs.get(plane, code) {
                    Some(glyph) => Token::Drcs { glyph: glyph.clone(), combining: None },
                    None => {
                        debug!("DRCS-{plane} code {code:#06x} used before definition");
                        Token::character(GETA)
                    }
                });
            }
            Charset::Macro => unreachable!("macros expand before decoding"),
        };
        Ok(unmapped_or(ch, set, c1, c2))
    }

    fn decode_kanji(&self, c1: u8, c2: u8) -> Token {
        let row = c1 - 0x20;
        let cell = c2 - 0x20;
        if row >= ADDITIONAL_SYMBOL_ROW {
            let code = u16::from_be_bytes([c1, c2]);
            return match self.symbols {
                SymbolTable::PrivateUseArea => {
                    let offset = (row - ADDITIONAL_SYMBOL_ROW) as u32 * 94 + (cell - 1) as u32;
                    char::from_u32(0xE000 + offset).map_or_else(|| Token::character(GETA), Token::character)
                }
                SymbolTable::Unicode => match additional_symbol(code) {
                    Some(text) => Token::character(text),
                    None => {
                        debug!("unassigned additional symbol {code:#06x}");
                        Token::character(GETA)
                    }
                },
            };
        }
        let ch = JIS_X0208[(row as usize - 1) * 94 + (cell as usize - 1)];
        unmapped_or(ch, Charset::Kanji, c1, c2)
    }
}

fn unmapped_or(ch: char, set: Charset, c1: u8, c2: u8) -> Token {
    if ch == '\0' {
        debug!("unmapped code {c1:#04x}{c2:02x} in set {:#04x}", set.final_byte());
        Token::character(GETA)
    } else {
        Token::character(ch)
    }
}

impl Tokenize for Jis8Tokenizer {
    fn tokenize(&mut self, statement: &[u8]) -> Result<Vec<Token>> {
        let mut session = Session {
            tok:    self,
            state:  ShiftState::initial(self.profile),
            single: None,
            out:    Vec::new(),
        };
        session.run(&mut ByteReader::new(statement))?;
        Ok(session.out)
    }

    fn load_drcs(&mut self, data: &[u8], two_byte: bool) -> Result<usize> {
        self.drcs.load(data, two_byte)
    }
}

/// Shift state for one statement data unit
struct Session<'t> {
    tok:    &'t Jis8Tokenizer,
    state:  ShiftState,
    /// Register selected by SS2/SS3 for the next character only
    single: Option<usize>,
    out:    Vec<Token>,
}

impl Session<'_> {
    fn run(&mut self, r: &mut ByteReader) -> Result<()> {
        while !r.is_empty() {
            let b = r.next()?;
            match b {
                0x0F => self.state.gl = 0,
                0x0E => self.state.gl = 1,
                0x19 => self.single = Some(2),
                0x1D => self.single = Some(3),
                0x1B => self.escape(r)?,
                0x00..=0x20 | 0x7F => self.out.push(read_c0(b, r)?),
                0x21..=0x7E => {
                    let reg = self.single.take().unwrap_or(self.state.gl);
                    self.graphic(reg, b, r)?;
                }
                0x80..=0x9F => self.out.push(read_c1(b, r)?),
                0xA0 => self.out.push(Token::Space),
                0xFF => self.out.push(Token::Delete),
                0xA1..=0xFE => {
                    let reg = self.single.take().unwrap_or(self.state.gr);
                    self.graphic(reg, b & 0x7F, r)?;
                }
            }
        }
        Ok(())
    }

    fn graphic(&mut self, reg: usize, c1: u8, r: &mut ByteReader) -> Result<()> {
        let set = self.state.g[reg];
        if set == Charset::Macro {
            let template = match c1 {
                0x60..=0x6F => DEFAULT_MACROS[(c1 - 0x60) as usize],
                _ => return Err(malformed(format!("undefined macro {c1:#04x}"))),
            };
            return self.run(&mut ByteReader::new(template));
        }
        let c2 = if set.width() == 2 {
            let c2 = r.next()? & 0x7F;
            if !(0x21..=0x7E).contains(&c2) {
                return Err(malformed(format!("second byte {c2:#04x} of a 2-byte code")));
            }
            c2
        } else {
            0
        };
        let token = self.tok.decode_graphic(set, c1, c2)?;
        self.out.push(token);
        Ok(())
    }

    fn escape(&mut self, r: &mut ByteReader) -> Result<()> {
        let profile = self.tok.profile;
        let b1 = r.next()?;
        match b1 {
            0x6E => self.state.gl = 2,
            0x6F => self.state.gl = 3,
            0x7E => self.state.gr = 1,
            0x7D => self.state.gr = 2,
            0x7C => self.state.gr = 3,
            0x28..=0x2B => {
                let f = r.next()?;
                let set = if f == 0x20 {
                    let f2 = r.next()?;
                    Charset::one_byte_drcs(profile, f2).ok_or_else(|| unknown_final(f2))?
                } else {
                    Charset::one_byte(profile, f).ok_or_else(|| unknown_final(f))?
                };
                self.state.g[(b1 - 0x28) as usize] = set;
            }
            0x24 => {
                let b2 = r.next()?;
                let (reg, set) = match b2 {
                    0x28..=0x2B => {
                        let f = r.next()?;
                        let set = if f == 0x20 {
                            match r.next()? {
                                0x40 => Charset::Drcs(0),
                                f2 => return Err(unknown_final(f2)),
                            }
                        } else {
                            Charset::two_byte(profile, f).ok_or_else(|| unknown_final(f))?
                        };
                        ((b2 - 0x28) as usize, set)
                    }
                    f => (0, Charset::two_byte(profile, f).ok_or_else(|| unknown_final(f))?),
                };
                self.state.g[reg] = set;
            }
            _ => return Err(malformed(format!("escape sequence ESC {b1:#04x}"))),
        }
        Ok(())
    }
}

fn unknown_final(f: u8) -> Error {
    malformed(format!("designation final byte {f:#04x}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::drcs::write_drcs_unit;
    use crate::tokenizer::token::DrcsGlyph;

    fn arib() -> Jis8Tokenizer {
        Jis8Tokenizer::new(Profile::Arib, SymbolTable::Unicode)
    }

    fn text(tokens: &[Token]) -> String {
        tokens
            .iter()
            .filter_map(|t| match t {
                Token::Character { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn swf_alnum_and_clear_screen() {
        let bytes = [0x9B, 0x30, 0x37, 0x20, 0x53, 0x41, 0x0C];
        let mut sbtvd = Jis8Tokenizer::new(Profile::Sbtvd, SymbolTable::Unicode);
        let expected = vec![Token::SetWritingFormat(7), Token::character("A"), Token::ClearScreen];
        assert_eq!(sbtvd.tokenize(&bytes).unwrap(), expected);

        // G0 is kanji by default under ARIB; designate alphanumerics first.
        let mut designated = vec![0x1B, 0x28, 0x4A];
        designated.extend_from_slice(&bytes);
        assert_eq!(arib().tokenize(&designated).unwrap(), expected);
    }

    #[test]
    fn default_registers_decode_kanji_and_hiragana() {
        // 漢 is JIS 0x3441; あ is 0x22 in the hiragana set, invoked into GR.
        let tokens = arib().tokenize(&[0x34, 0x41, 0xA2]).unwrap();
        assert_eq!(text(&tokens), "漢あ");
    }

    #[test]
    fn arib_alnum_yen_and_overline() {
        let tokens = arib().tokenize(&[0x1B, 0x28, 0x4A, 0x5C, 0x7E, 0x61]).unwrap();
        assert_eq!(text(&tokens), "¥‾a");
    }

    #[test]
    fn single_shift_applies_to_one_character() {
        // G3 holds katakana; SS3 borrows it for one code, then GL is kanji again.
        let bytes = [0x1B, 0x2B, 0x31, 0x1D, 0x22, 0x34, 0x41];
        let tokens = arib().tokenize(&bytes).unwrap();
        assert_eq!(text(&tokens), "ア漢");
    }

    #[test]
    fn locking_shift_into_gl() {
        // LS1 invokes G1 (alphanumeric by default).
        let tokens = arib().tokenize(&[0x0E, 0x48, 0x69]).unwrap();
        assert_eq!(text(&tokens), "Hi");
    }

    #[test]
    fn default_macro_redesignates() {
        // Macro 0x6E loads katakana into G0 and hiragana into G1, then LS0.
        let tokens = arib().tokenize(&[0x1B, 0x6F, 0x6E, 0x22]).unwrap();
        assert_eq!(text(&tokens), "ア");
    }

    #[test]
    fn additional_symbols_by_table() {
        let bytes = [0x7A, 0x50];
        let unicode = arib().tokenize(&bytes).unwrap();
        assert_eq!(unicode, vec![Token::character(additional_symbol(0x7A50).unwrap())]);

        let mut pua = Jis8Tokenizer::new(Profile::Arib, SymbolTable::PrivateUseArea);
        let expected = char::from_u32(0xE000 + (0x5A - 85) as u32 * 94 + (0x50 - 0x21) as u32).unwrap();
        assert_eq!(pua.tokenize(&bytes).unwrap(), vec![Token::character(expected)]);
    }

    #[test]
    fn drcs_is_per_tokenizer() {
        let glyph = DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0x81] };
        let unit = write_drcs_unit(&[(0x4121, &glyph)]);
        let mut loaded = arib();
        assert_eq!(loaded.load_drcs(&unit, false).unwrap(), 1);

        // ESC ) SP A puts DRCS-1 in G1, LS1 invokes it.
        let stmt = [0x1B, 0x29, 0x20, 0x41, 0x0E, 0x21];
        assert_eq!(loaded.tokenize(&stmt).unwrap(), vec![Token::Drcs { glyph, combining: None }]);

        let mut other = arib();
        assert_eq!(other.tokenize(&stmt).unwrap(), vec![Token::character(GETA)]);
    }

    #[test]
    fn sbtvd_latin_and_combining() {
        let mut sbtvd = Jis8Tokenizer::new(Profile::Sbtvd, SymbolTable::Unicode);
        // GR is the Latin extension; SS3 picks the combining acute from the special set.
        let tokens = sbtvd.tokenize(&[0x65, 0x1D, 0x22, 0xE7]).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::character("e"),
                Token::Character { text: "\u{0301}".into(), non_spacing: true },
                Token::character("ç"),
            ]
        );
    }

    #[test]
    fn errors() {
        assert!(matches!(arib().tokenize(&[0x1B, 0x28, 0x32, 0x21]), Err(Error::NotImplemented(_))));
        assert!(matches!(arib().tokenize(&[0x1B, 0x28, 0x7A]), Err(Error::Malformed(_))));
        assert!(matches!(arib().tokenize(&[0x34]), Err(Error::Malformed(_))));
        let mut sbtvd = Jis8Tokenizer::new(Profile::Sbtvd, SymbolTable::Unicode);
        assert!(matches!(sbtvd.tokenize(&[0x1B, 0x24, 0x42]), Err(Error::Malformed(_))));
    }
}
