//! Graphic sets, their designation final bytes and the per-profile defaults.

use crate::types::Profile;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Charset {
    Kanji,
    Alnum,
    Hiragana,
    Katakana,
    MosaicA,
    MosaicB,
    MosaicC,
    MosaicD,
    PropAlnum,
    PropHiragana,
    PropKatakana,
    JisXKatakana,
    JisKanji1,
    JisKanji2,
    ExtraSymbols,
    /// 0 is the 2-byte DRCS-0, 1..=15 are 1-byte DRCS-1..DRCS-15
    Drcs(u8),
    Macro,
    LatinExtension,
    Special,
}

impl Charset {
    /// Bytes per coded character
    pub fn width(self) -> usize {
        match self {
            Charset::Kanji
            | Charset::JisKanji1
            | Charset::JisKanji2
            | Charset::ExtraSymbols
            | Charset::Drcs(0) => 2,
            _ => 1,
        }
    }

    /// Final byte of the designation sequence; DRCS and macro sets follow an 0x20.
    pub fn final_byte(self) -> u8 {
        match self {
            Charset::Kanji => 0x42,
            Charset::Alnum => 0x4A,
            Charset::Hiragana => 0x30,
            Charset::Katakana => 0x31,
            Charset::MosaicA => 0x32,
            Charset::MosaicB => 0x33,
            Charset::MosaicC => 0x34,
            Charset::MosaicD => 0x35,
            Charset::PropAlnum => 0x36,
            Charset::PropHiragana => 0x37,
            Charset::PropKatakana => 0x38,
            Charset::JisXKatakana => 0x49,
            Charset::JisKanji1 => 0x39,
            Charset::JisKanji2 => 0x3A,
            Charset::ExtraSymbols => 0x3B,
            Charset::Drcs(plane) => 0x40 + plane,
            Charset::Macro => 0x70,
            Charset::LatinExtension => 0x4B,
            Charset::Special => 0x4C,
        }
    }

    pub fn is_drcs_or_macro(self) -> bool {
        matches!(self, Charset::Drcs(_) | Charset::Macro)
    }

    /// 1-byte set designated by `ESC 0x28..=0x2B F`
    pub fn one_byte(profile: Profile, f: u8) -> Option<Self> {
        match profile {
            Profile::Arib => Some(match f {
                0x4A => Charset::Alnum,
                0x30 => Charset::Hiragana,
                0x31 => Charset::Katakana,
                0x32 => Charset::MosaicA,
                0x33 => Charset::MosaicB,
                0x34 => Charset::MosaicC,
                0x35 => Charset::MosaicD,
                0x36 => Charset::PropAlnum,
                0x37 => Charset::PropHiragana,
                0x38 => Charset::PropKatakana,
                0x49 => Charset::JisXKatakana,
                _ => return None,
            }),
            Profile::Sbtvd => match f {
                0x4A => Some(Charset::Alnum),
                0x4B => Some(Charset::LatinExtension),
                0x4C => Some(Charset::Special),
                _ => None,
            },
        }
    }

    /// 2-byte set designated by `ESC 0x24 [0x28..=0x2B] F`
    pub fn two_byte(profile: Profile, f: u8) -> Option<Self> {
        if profile != Profile::Arib {
            return None;
        }
        match f {
            0x42 => Some(Charset::Kanji),
            0x39 => Some(Charset::JisKanji1),
            0x3A => Some(Charset::JisKanji2),
            0x3B => Some(Charset::ExtraSymbols),
            _ => None,
        }
    }

    /// Set designated by `ESC 0x28..=0x2B 0x20 F`
    pub fn one_byte_drcs(profile: Profile, f: u8) -> Option<Self> {
        match f {
            0x41..=0x4F => Some(Charset::Drcs(f - 0x40)),
            0x70 if profile == Profile::Arib => Some(Charset::Macro),
            _ => None,
        }
    }
}

/// G0..G3 plus the sets invoked into GL and GR
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShiftState {
    pub g: [Charset; 4],
    pub gl: usize,
    pub gr: usize,
}

impl ShiftState {
    pub fn initial(profile: Profile) -> Self {
        match profile {
            Profile::Arib => Self {
                g: [Charset::Kanji, Charset::Alnum, Charset::Hiragana, Charset::Macro],
                gl: 0,
                gr: 2,
            },
            Profile::Sbtvd => Self {
                g: [Charset::Alnum, Charset::Alnum, Charset::LatinExtension, Charset::Special],
                gl: 0,
                gr: 2,
            },
        }
    }
}
