//! The token stream shared by tokenizers, encoders and the presentation parser.

use serde::Serialize;

/// Character size classes selected by SSZ/MSZ/NSZ/SZX
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum CharacterSize {
    Small,
    Middle,
    #[default]
    Normal,
    Tiny,
    DoubleHeight,
    DoubleWidth,
    DoubleHeightAndWidth,
    Special1,
    Special2,
}

impl CharacterSize {
    /// Horizontal and vertical scale applied to the cell metrics.
    pub fn scale(self) -> (f64, f64) {
        match self {
            CharacterSize::Small => (0.5, 0.5),
            CharacterSize::Middle => (0.5, 1.0),
            CharacterSize::Normal => (1.0, 1.0),
            CharacterSize::Tiny => (0.25, 1.0 / 6.0),
            CharacterSize::DoubleHeight => (1.0, 2.0),
            CharacterSize::DoubleWidth => (2.0, 1.0),
            CharacterSize::DoubleHeightAndWidth => (2.0, 2.0),
            // TODO: SZX 0x6B/0x64 geometry is undefined until a broadcast using them turns up
            CharacterSize::Special1 | CharacterSize::Special2 => (f64::NAN, f64::NAN),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum FlashingMode {
    Normal,
    Inverted,
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WritingMode {
    Both,
    Foreground,
    Background,
}

/// ORN; colors are `pallet << 4 | index`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Ornament {
    None,
    Hemming(u8),
    Shade(u8),
    Hollow,
}

/// Glyph loaded by a DRCS data unit. `depth` is bits per pixel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct DrcsGlyph {
    pub width: u8,
    pub height: u8,
    pub depth: u8,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Bitmap {
    pub x: u16,
    pub y: u16,
    pub flashing_colors: Vec<u8>,
    /// PNG stream
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Token {
    Character { text: String, non_spacing: bool },
    Drcs { glyph: DrcsGlyph, combining: Option<String> },
    Bitmap(Bitmap),

    // C0
    Null,
    Bell,
    ActivePositionBackward,
    ActivePositionForward,
    ActivePositionDown,
    ActivePositionUp,
    ClearScreen,
    ActivePositionReturn,
    ParameterizedActivePositionForward(u8),
    Cancel,
    ActivePositionSet { x: u8, y: u8 },
    RecordSeparator,
    UnitSeparator,
    Space,
    Delete,

    // C1
    /// 0..=15, BKF..WHF or COL 0x48..=0x4F
    ColorForeground(u8),
    ColorBackground(u8),
    ColorHalfForeground(u8),
    ColorHalfBackground(u8),
    PalletControl(u8),
    CharacterSize(CharacterSize),
    FlashingControl(FlashingMode),
    PatternPolarity(u8),
    WritingModeModification(WritingMode),
    HighlightBlock(u8),
    RepeatCharacter(u8),
    StopLining,
    StartLining,
    TimeControlWait(f64),
    TimeControlMode(u8),

    // CSI
    SetWritingFormat(u32),
    RasterColorCommand(u32),
    ActiveCoordinatePositionSet { x: u32, y: u32 },
    SetDisplayFormat { width: u32, height: u32 },
    SetDisplayPosition { x: u32, y: u32 },
    CharacterCompositionDotDesignation { width: u32, height: u32 },
    SetHorizontalSpacing(u32),
    SetVerticalSpacing(u32),
    OrnamentControl(Ornament),
    BuiltinSoundReplay(u32),
}

impl Token {
    pub fn character(text: impl Into<String>) -> Self {
        Token::Character { text: text.into(), non_spacing: false }
    }

    /// Whether the token draws something at the cursor
    pub fn is_graphic(&self) -> bool {
        matches!(self, Token::Character { .. } | Token::Drcs { .. } | Token::Bitmap(_) | Token::Space | Token::Delete)
    }
}
