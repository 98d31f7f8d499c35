//! Every control family written by each encoder reads back unchanged.

use arib_caption::tokenizer::{CharacterSize, FlashingMode, Ornament, WritingMode};
use arib_caption::types::SymbolTable;
use arib_caption::{Encode, Jis8Encoder, Jis8Tokenizer, Profile, Token, Tokenize, Utf8Encoder, Utf8Tokenizer};

fn every_control(text: &str) -> Vec<Token> {
    let mut tokens = vec![
        // C0
        Token::Null,
        Token::Bell,
        Token::ActivePositionBackward,
        Token::ActivePositionForward,
        Token::ActivePositionDown,
        Token::ActivePositionUp,
        Token::ClearScreen,
        Token::ActivePositionReturn,
        Token::ParameterizedActivePositionForward(5),
        Token::Cancel,
        Token::ActivePositionSet { x: 3, y: 2 },
        Token::RecordSeparator,
        Token::UnitSeparator,
        Token::Space,
        Token::Delete,
        // colors
        Token::ColorForeground(3),
        Token::ColorForeground(12),
        Token::ColorBackground(5),
        Token::ColorHalfForeground(2),
        Token::ColorHalfBackground(9),
        Token::PalletControl(4),
        // C1
        Token::FlashingControl(FlashingMode::Normal),
        Token::FlashingControl(FlashingMode::Inverted),
        Token::FlashingControl(FlashingMode::Stop),
        Token::PatternPolarity(1),
        Token::WritingModeModification(WritingMode::Both),
        Token::WritingModeModification(WritingMode::Foreground),
        Token::WritingModeModification(WritingMode::Background),
        Token::HighlightBlock(5),
        Token::RepeatCharacter(2),
        Token::character(text),
        Token::StartLining,
        Token::StopLining,
        Token::TimeControlWait(1.5),
        Token::TimeControlMode(2),
        // CSI
        Token::SetWritingFormat(7),
        Token::RasterColorCommand(2),
        Token::ActiveCoordinatePositionSet { x: 100, y: 200 },
        Token::SetDisplayFormat { width: 960, height: 540 },
        Token::SetDisplayPosition { x: 0, y: 0 },
        Token::CharacterCompositionDotDesignation { width: 36, height: 36 },
        Token::SetHorizontalSpacing(4),
        Token::SetVerticalSpacing(24),
        Token::OrnamentControl(Ornament::None),
        Token::OrnamentControl(Ornament::Hemming(0x17)),
        Token::OrnamentControl(Ornament::Shade(0x20)),
        Token::OrnamentControl(Ornament::Hollow),
        Token::BuiltinSoundReplay(3),
    ];
    let sizes = [
        CharacterSize::Small,
        CharacterSize::Middle,
        CharacterSize::Normal,
        CharacterSize::Tiny,
        CharacterSize::DoubleHeight,
        CharacterSize::DoubleWidth,
        CharacterSize::DoubleHeightAndWidth,
        CharacterSize::Special1,
        CharacterSize::Special2,
    ];
    for size in sizes {
        tokens.push(Token::CharacterSize(size));
        tokens.push(Token::character(text));
    }
    tokens
}

#[test]
fn arib_8bit_controls_round_trip() {
    let tokens = every_control("字");
    let encoded = Jis8Encoder::new(Profile::Arib).encode(&tokens).unwrap();
    let decoded = Jis8Tokenizer::new(Profile::Arib, SymbolTable::Unicode).tokenize(&encoded.statement).unwrap();
    assert_eq!(decoded, tokens);
}

#[test]
fn sbtvd_8bit_controls_round_trip() {
    let tokens = every_control("é");
    let encoded = Jis8Encoder::new(Profile::Sbtvd).encode(&tokens).unwrap();
    let decoded = Jis8Tokenizer::new(Profile::Sbtvd, SymbolTable::Unicode).tokenize(&encoded.statement).unwrap();
    assert_eq!(decoded, tokens);
}

#[test]
fn utf8_controls_round_trip() {
    let tokens = every_control("ç");
    let encoded = Utf8Encoder::new().encode(&tokens).unwrap();
    let decoded = Utf8Tokenizer::new().tokenize(&encoded.statement).unwrap();
    assert_eq!(decoded, tokens);
}
