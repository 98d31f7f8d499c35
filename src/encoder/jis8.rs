//! 8-bit encoder for the ARIB and SBTVD profiles.

use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

use log::debug;

use super::control::{encode_control, C1Form};
use super::{check_glyph, Encode, DRCS_CAPACITY};
use crate::constants::{DATA_UNIT_DRCS_1BYTE, GETA};
use crate::error::{malformed, Error, Result};
use crate::tokenizer::drcs::write_drcs_unit;
use crate::tokenizer::tables::{
    ADDITIONAL_SYMBOLS, HIRAGANA, JIS_X0208, KATAKANA, SBTVD_SPECIAL,
};
use crate::tokenizer::{Bitmap, Charset, DrcsGlyph, ShiftState, Token};
use crate::types::Profile;

type CharMap = HashMap<char, (Charset, u16)>;

const PUA_SYMBOLS: u32 = 0xE000;
const SYMBOL_CODES: u32 = 10 * 94;

fn arib_chars() -> &'static CharMap {
    static MAP: OnceLock<CharMap> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = CharMap::new();
        for code in 0x21u8..=0x7E {
            let ch = match code {
                0x5C => '¥',
                0x7E => '‾',
                _ => char::from(code),
            };
            map.entry(ch).or_insert((Charset::Alnum, code as u16));
        }
        for (set, table) in [(Charset::Hiragana, &HIRAGANA), (Charset::Katakana, &KATAKANA)] {
            for (i, &ch) in table.iter().enumerate() {
                if ch != '\0' {
                    map.entry(ch).or_insert((set, 0x21 + i as u16));
                }
            }
        }
        for (i, &ch) in JIS_X0208.iter().enumerate() {
            if ch != '\0' {
                let code = (((i / 94) as u16 + 0x21) << 8) | ((i % 94) as u16 + 0x21);
                map.entry(ch).or_insert((Charset::Kanji, code));
            }
        }
        for &(code, text) in ADDITIONAL_SYMBOLS {
            let mut chars = text.chars();
            if let (Some(ch), None) = (chars.next(), chars.next()) {
                map.entry(ch).or_insert((Charset::Kanji, code));
            }
        }
        map
    })
}

/// Multi-character additional symbols such as `[HV]`
fn arib_symbols() -> &'static HashMap<&'static str, u16> {
    static MAP: OnceLock<HashMap<&'static str, u16>> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = HashMap::new();
        for &(code, text) in ADDITIONAL_SYMBOLS {
            if text.chars().nth(1).is_some() {
                map.entry(text).or_insert(code);
            }
        }
        map
    })
}

fn sbtvd_chars() -> &'static CharMap {
    static MAP: OnceLock<CharMap> = OnceLock::new();
    MAP.get_or_init(|| {
        let mut map = CharMap::new();
        for code in 0x21u8..=0x7E {
            map.insert(char::from(code), (Charset::Alnum, code as u16));
        }
        for code in 0x21u8..=0x7E {
            map.entry(char::from(code + 0x80)).or_insert((Charset::LatinExtension, code as u16));
        }
        for (i, &ch) in SBTVD_SPECIAL.iter().enumerate() {
            if ch != '\0' {
                map.entry(ch).or_insert((Charset::Special, 0x21 + i as u16));
            }
        }
        map
    })
}

/// Register a set is designated into when it is not present anywhere
fn home_register(set: Charset) -> usize {
    match set {
        Charset::Kanji | Charset::JisKanji1 | Charset::JisKanji2 | Charset::ExtraSymbols => 0,
        Charset::Alnum | Charset::PropAlnum | Charset::Drcs(_) => 1,
        Charset::Hiragana | Charset::PropHiragana | Charset::LatinExtension => 2,
        _ => 3,
    }
}

#[derive(Debug, Clone)]
pub struct Jis8Encoder {
    profile:  Profile,
    state:    ShiftState,
    /// Glyph to assignment index; index `i` is DRCS-(1 + i / 94), code 0x21 + i % 94
    assigned: HashMap<DrcsGlyph, usize>,
    glyphs:   Vec<DrcsGlyph>,
    used:     BTreeSet<usize>,
    /// Set of the graphic character after the one being written, when known
    next_set: Option<Charset>,
}

impl Jis8Encoder {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            state: ShiftState::initial(profile),
            assigned: HashMap::new(),
            glyphs: Vec::new(),
            used: BTreeSet::new(),
            next_set: None,
        }
    }

    fn lookup(&self, ch: char) -> Option<(Charset, u16)> {
        match self.profile {
            Profile::Arib => {
                let off = (ch as u32).wrapping_sub(PUA_SYMBOLS);
                if off < SYMBOL_CODES {
                    let row = 85 + off / 94;
                    let cell = 1 + off % 94;
                    return Some((Charset::Kanji, (((row + 0x20) << 8) | (cell + 0x20)) as u16));
                }
                arib_chars().get(&ch).copied()
            }
            Profile::Sbtvd => sbtvd_chars().get(&ch).copied(),
        }
    }

    fn encode_char(&mut self, ch: char, out: &mut Vec<u8>) -> Result<()> {
        if ch == ' ' {
            out.push(0x20);
            return Ok(());
        }
        let (set, code) = match self.lookup(ch) {
            Some(found) => found,
            None => {
                debug!("U+{:04X} has no code in the {:?} repertoire", ch as u32, self.profile);
                self.lookup(GETA).ok_or_else(|| malformed("geta missing from repertoire"))?
            }
        };
        self.emit(set, code, out);
        Ok(())
    }

    fn designate(&mut self, reg: usize, set: Charset, out: &mut Vec<u8>) {
        let g = 0x28 + reg as u8;
        out.push(0x1B);
        match (set, set.width()) {
            (Charset::Drcs(0), _) => out.extend_from_slice(&[0x24, g, 0x20, 0x40]),
            (Charset::Drcs(_) | Charset::Macro, _) => out.extend_from_slice(&[g, 0x20, set.final_byte()]),
            (_, 2) if reg == 0 => out.extend_from_slice(&[0x24, set.final_byte()]),
            (_, 2) => out.extend_from_slice(&[0x24, g, set.final_byte()]),
            _ => out.extend_from_slice(&[g, set.final_byte()]),
        }
        self.state.g[reg] = set;
    }

    fn lock_gl(&mut self, reg: usize, out: &mut Vec<u8>) {
        match reg {
            0 => out.push(0x0F),
            1 => out.push(0x0E),
            2 => out.extend_from_slice(&[0x1B, 0x6E]),
            _ => out.extend_from_slice(&[0x1B, 0x6F]),
        }
        self.state.gl = reg;
    }

    /// Writes `code` through whichever invocation reaches `set` with the fewest shifts.
    fn emit(&mut self, set: Charset, code: u16, out: &mut Vec<u8>) {
        let reg = match self.state.g.iter().position(|&s| s == set) {
            Some(reg) => reg,
            None => {
                let reg = home_register(set);
                self.designate(reg, set, out);
                reg
            }
        };
        let high = if reg == self.state.gl {
            0x00
        } else if reg == self.state.gr {
            0x80
        } else if reg >= 2 && self.next_set != Some(set) {
            // a lone character from G2/G3 goes through SS2/SS3
            out.push(if reg == 2 { 0x19 } else { 0x1D });
            0x00
        } else {
            self.lock_gl(reg, out);
            0x00
        };
        if set.width() == 2 {
            out.extend_from_slice(&[(code >> 8) as u8 | high, (code & 0xFF) as u8 | high]);
        } else {
            out.push(code as u8 | high);
        }
    }
}

impl Encode for Jis8Encoder {
    fn encode_character(&mut self, text: &str, out: &mut Vec<u8>) -> Result<()> {
        if self.profile == Profile::Arib && text.chars().nth(1).is_some() {
            if let Some(&code) = arib_symbols().get(text) {
                self.emit(Charset::Kanji, code, out);
                return Ok(());
            }
        }
        let after = self.next_set;
        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            self.next_set = match chars.peek() {
                Some(&next) => self.lookup(next).map(|(set, _)| set),
                None => after,
            };
            self.encode_char(ch, out)?;
        }
        self.next_set = after;
        Ok(())
    }

    fn encode_drcs(&mut self, glyph: &DrcsGlyph, combining: Option<&str>, out: &mut Vec<u8>) -> Result<()> {
        check_glyph(glyph)?;
        let index = match self.assigned.get(glyph) {
            Some(&i) => Some(i),
            None if self.glyphs.len() < DRCS_CAPACITY => {
                let i = self.glyphs.len();
                self.glyphs.push(glyph.clone());
                self.assigned.insert(glyph.clone(), i);
                Some(i)
            }
            None => None,
        };
        match index {
            Some(i) => {
                self.used.insert(i);
                let plane = 1 + (i / 94) as u8;
                self.emit(Charset::Drcs(plane), 0x21 + (i % 94) as u16, out);
            }
            None => {
                debug!("DRCS codes exhausted, writing geta");
                self.encode_char(GETA, out)?;
            }
        }
        if let Some(text) = combining {
            self.encode_character(text, out)?;
        }
        Ok(())
    }

    fn encode_bitmap(&mut self, _bitmap: &Bitmap, _out: &mut Vec<u8>) -> Result<()> {
        Err(Error::NotImplemented("bitmap in an 8-bit statement".into()))
    }

    fn encode_control(&mut self, token: &Token, out: &mut Vec<u8>) -> Result<()> {
        encode_control(token, C1Form::EightBit, out)
    }

    fn lookahead(&mut self, rest: &[Token]) {
        let next = rest
            .iter()
            .find_map(|token| match token {
                Token::Character { text, .. } => Some(text.chars().next().and_then(|ch| self.lookup(ch))),
                Token::Drcs { .. } | Token::Bitmap(_) => Some(None),
                _ => None,
            })
            .flatten()
            .map(|(set, _)| set);
        self.next_set = next;
    }

    fn begin(&mut self) {
        self.state = ShiftState::initial(self.profile);
        self.next_set = None;
        self.used.clear();
    }

    fn finish(&mut self) -> Vec<(u8, Vec<u8>)> {
        if self.used.is_empty() {
            return Vec::new();
        }
        let entries: Vec<(u16, &DrcsGlyph)> = self
            .used
            .iter()
            .map(|&i| {
                let plane = 0x41 + (i / 94) as u16;
                ((plane << 8) | (0x21 + (i % 94) as u16), &self.glyphs[i])
            })
            .collect();
        let unit = write_drcs_unit(&entries);
        self.used.clear();
        vec![(DATA_UNIT_DRCS_1BYTE, unit)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::{Jis8Tokenizer, Tokenize};
    use crate::types::SymbolTable;

    fn encode(profile: Profile, tokens: &[Token]) -> Vec<u8> {
        Jis8Encoder::new(profile).encode(tokens).unwrap().statement
    }

    #[test]
    fn kanji_and_hiragana_need_no_shift() {
        let bytes = encode(Profile::Arib, &[Token::character("漢"), Token::character("あ")]);
        assert_eq!(bytes, [0x34, 0x41, 0xA2]);
    }

    #[test]
    fn alnum_locks_g1_into_gl() {
        let bytes = encode(Profile::Arib, &[Token::character("A1")]);
        assert_eq!(bytes, [0x0E, 0x41, 0x31]);
    }

    #[test]
    fn lone_katakana_uses_single_shift() {
        let bytes = encode(Profile::Arib, &[Token::character("ア"), Token::character("漢")]);
        assert_eq!(bytes, [0x1B, 0x2B, 0x31, 0x1D, 0x22, 0x34, 0x41]);
    }

    #[test]
    fn katakana_run_locks_g3() {
        let tokens = [Token::character("ア"), Token::ColorForeground(1), Token::character("イ")];
        let bytes = encode(Profile::Arib, &tokens);
        assert_eq!(bytes, [0x1B, 0x2B, 0x31, 0x1B, 0x6F, 0x22, 0x81, 0x24]);
        let decoded = Jis8Tokenizer::new(Profile::Arib, SymbolTable::Unicode).tokenize(&bytes).unwrap();
        assert_eq!(decoded, tokens);
    }

    #[test]
    fn unencodable_becomes_geta() {
        let bytes = encode(Profile::Arib, &[Token::character("\u{1F600}")]);
        assert_eq!(bytes, [0x22, 0x2E]);
        let bytes = encode(Profile::Sbtvd, &[Token::character("\u{1F600}")]);
        assert_eq!(bytes, [0x1D, 0x2B]);
    }

    #[test]
    fn additional_symbols_from_text_or_pua() {
        let by_text = encode(Profile::Arib, &[Token::character("[HV]")]);
        assert_eq!(by_text, [0x7A, 0x50]);
        let pua = char::from_u32(0xE000 + 5 * 94 + 47).unwrap();
        assert_eq!(encode(Profile::Arib, &[Token::character(pua)]), by_text);
    }

    #[test]
    fn drcs_reuses_codes_and_defines_them() {
        let a = DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0xAA] };
        let b = DrcsGlyph { width: 8, height: 1, depth: 2, data: vec![0x12, 0x34] };
        let drcs = |g: &DrcsGlyph| Token::Drcs { glyph: g.clone(), combining: None };
        let mut encoder = Jis8Encoder::new(Profile::Arib);
        let encoded = encoder.encode(&[drcs(&a), drcs(&b), drcs(&a)]).unwrap();
        // ESC ) SP A designates DRCS-1 into G1, LS1, then codes 0x21 0x22 0x21.
        assert_eq!(encoded.statement, [0x1B, 0x29, 0x20, 0x41, 0x0E, 0x21, 0x22, 0x21]);
        assert_eq!(encoded.units.len(), 1);
        assert_eq!(encoded.units[0].0, DATA_UNIT_DRCS_1BYTE);

        let mut tokenizer = Jis8Tokenizer::new(Profile::Arib, SymbolTable::Unicode);
        tokenizer.load_drcs(&encoded.units[0].1, false).unwrap();
        assert_eq!(tokenizer.tokenize(&encoded.statement).unwrap(), vec![drcs(&a), drcs(&b), drcs(&a)]);
    }

    #[test]
    fn drcs_exhaustion_degrades_to_geta() {
        let mut encoder = Jis8Encoder::new(Profile::Arib);
        let tokens: Vec<Token> = (0..=DRCS_CAPACITY)
            .map(|i| Token::Drcs {
                glyph: DrcsGlyph { width: 16, height: 1, depth: 1, data: (i as u16).to_be_bytes().to_vec() },
                combining: None,
            })
            .collect();
        let encoded = encoder.encode(&tokens).unwrap();
        assert!(encoded.statement.ends_with(&[0x22, 0x2E]));
        assert_eq!(encoded.units[0].1[0] as usize, DRCS_CAPACITY);
    }

    #[test]
    fn unsupported_graphics() {
        let mut encoder = Jis8Encoder::new(Profile::Arib);
        let bitmap = Bitmap { x: 0, y: 0, flashing_colors: vec![], data: vec![] };
        assert!(matches!(encoder.encode(&[Token::Bitmap(bitmap)]), Err(Error::NotImplemented(_))));
        assert!(matches!(encoder.encode_mosaic(0x21, &mut Vec::new()), Err(Error::NotImplemented(_))));
        let bad = DrcsGlyph { width: 8, height: 2, depth: 1, data: vec![0] };
        let token = Token::Drcs { glyph: bad, combining: None };
        assert!(matches!(encoder.encode(&[token]), Err(Error::Malformed(_))));
    }
}
