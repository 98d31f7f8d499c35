use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Which elementary stream a demuxed unit came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptionKind {
    Caption,
    Superimpose,
}

impl CaptionKind {
    pub fn from_component_tag(tag: u8) -> Option<Self> {
        match tag {
            crate::constants::COMPONENT_TAG_CAPTION => Some(Self::Caption),
            crate::constants::COMPONENT_TAG_SUPERIMPOSE => Some(Self::Superimpose),
            _ => None,
        }
    }
}

/// One caption PES payload with normalized timestamps (seconds)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemuxedUnit {
    pub kind: CaptionKind,
    pub pts: f64,
    pub dts: f64,
    #[serde(skip)]
    pub payload: Bytes,
}

/// Stream whose first PTS anchors every normalized timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffsetReference {
    /// Timestamps are raw PTS / 90 kHz.
    Ignore,
    Video,
    Audio,
    /// Whichever of video or audio shows a PTS first.
    #[default]
    VideoOrAudio,
}

/// Demultiplexer configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemuxOptions {
    pub offset: OffsetReference,
    /// Restrict caption discovery to one program; the first caption stream found wins otherwise.
    pub program_number: Option<u16>,
}

/// Character-set profile driving the 8-bit tokenizer and the regioner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    /// Japanese ARIB STD-B24
    #[default]
    Arib,
    /// Brazilian ABNT NBR 15606-1
    Sbtvd,
}

/// Profile selection, either fixed or derived from the ISO-639 code of a language entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Association {
    Arib,
    Sbtvd,
    #[default]
    Auto,
}

impl Association {
    pub fn resolve(self, iso_639: &str) -> Profile {
        match self {
            Association::Arib => Profile::Arib,
            Association::Sbtvd => Profile::Sbtvd,
            Association::Auto => match iso_639 {
                "por" | "spa" => Profile::Sbtvd,
                _ => Profile::Arib,
            },
        }
    }
}

/// Text coding system of a language entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextCodingSystem {
    #[default]
    Jis8,
    Utf8,
}

impl TextCodingSystem {
    pub fn from_bits(tcs: u8) -> Self {
        if tcs == 1 { TextCodingSystem::Utf8 } else { TextCodingSystem::Jis8 }
    }

    pub fn bits(self) -> u8 {
        match self {
            TextCodingSystem::Jis8 => 0,
            TextCodingSystem::Utf8 => 1,
        }
    }
}

/// How ARIB additional symbols (rows 85..=94) decode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolTable {
    #[default]
    Unicode,
    /// `U+E000 + (row - 85) * 94 + (cell - 1)`
    PrivateUseArea,
}

/// Data group to token configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodeOptions {
    pub association: Association,
    pub tcs_override: Option<TextCodingSystem>,
    pub symbols: SymbolTable,
}

/// Handling of small-size runs sitting above normal text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RubyMode {
    #[default]
    Guess,
    Preserve,
    Ignore,
}

/// Token to primitive configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ParserOptions {
    pub magnification: f64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self { magnification: 1.0 }
    }
}

/// Primitive to region configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RegionerOptions {
    pub ruby: RubyMode,
    pub profile: Profile,
}
