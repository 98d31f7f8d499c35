//! Control functions back to bytes. The 8-bit and UTF-8 codes differ only in how a C1 byte is carried.

use crate::error::{malformed, Result};
use crate::tokenizer::{CharacterSize, FlashingMode, Ornament, Token, WritingMode};

/// How a C1 code (0x80..=0x9F) is written
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum C1Form {
    /// A single byte
    EightBit,
    /// `0xC2` followed by the code, i.e. U+0080..=U+009F in UTF-8
    Utf8,
}

impl C1Form {
    fn push(self, code: u8, out: &mut Vec<u8>) {
        if self == C1Form::Utf8 {
            out.push(0xC2);
        }
        out.push(code);
    }
}

pub(crate) fn encode_control(token: &Token, c1: C1Form, out: &mut Vec<u8>) -> Result<()> {
    match *token {
        Token::Null => out.push(0x00),
        Token::Bell => out.push(0x07),
        Token::ActivePositionBackward => out.push(0x08),
        Token::ActivePositionForward => out.push(0x09),
        Token::ActivePositionDown => out.push(0x0A),
        Token::ActivePositionUp => out.push(0x0B),
        Token::ClearScreen => out.push(0x0C),
        Token::ActivePositionReturn => out.push(0x0D),
        Token::ParameterizedActivePositionForward(n) => out.extend_from_slice(&[0x16, param(n)]),
        Token::Cancel => out.push(0x18),
        Token::ActivePositionSet { x, y } => out.extend_from_slice(&[0x1C, param(y), param(x)]),
        Token::RecordSeparator => out.push(0x1E),
        Token::UnitSeparator => out.push(0x1F),
        Token::Space => out.push(0x20),
        Token::Delete => out.push(0x7F),

        Token::ColorForeground(c) if c < 8 => c1.push(0x80 + c, out),
        Token::ColorForeground(c) => col(c1, 0x40, c, out),
        Token::ColorBackground(c) => col(c1, 0x50, c, out),
        Token::ColorHalfForeground(c) => col(c1, 0x60, c, out),
        Token::ColorHalfBackground(c) => col(c1, 0x70, c, out),
        Token::PalletControl(p) => {
            c1.push(0x90, out);
            out.extend_from_slice(&[0x20, 0x40 | (p & 0x0F)]);
        }
        Token::CharacterSize(size) => match size {
            CharacterSize::Small => c1.push(0x88, out),
            CharacterSize::Middle => c1.push(0x89, out),
            CharacterSize::Normal => c1.push(0x8A, out),
            CharacterSize::Tiny => szx(c1, 0x60, out),
            CharacterSize::DoubleHeight => szx(c1, 0x41, out),
            CharacterSize::DoubleWidth => szx(c1, 0x44, out),
            CharacterSize::DoubleHeightAndWidth => szx(c1, 0x45, out),
            CharacterSize::Special1 => szx(c1, 0x6B, out),
            CharacterSize::Special2 => szx(c1, 0x64, out),
        },
        Token::FlashingControl(mode) => {
            c1.push(0x91, out);
            out.push(match mode {
                FlashingMode::Normal => 0x40,
                FlashingMode::Inverted => 0x47,
                FlashingMode::Stop => 0x4F,
            });
        }
        Token::PatternPolarity(p) => {
            if p > 2 {
                return Err(malformed(format!("pattern polarity {p}")));
            }
            c1.push(0x93, out);
            out.push(0x40 + p);
        }
        Token::WritingModeModification(mode) => {
            c1.push(0x94, out);
            out.push(match mode {
                WritingMode::Both => 0x40,
                WritingMode::Foreground => 0x44,
                WritingMode::Background => 0x45,
            });
        }
        Token::HighlightBlock(h) => {
            c1.push(0x97, out);
            out.push(0x40 | (h & 0x0F));
        }
        Token::RepeatCharacter(n) => {
            c1.push(0x98, out);
            out.push(param(n));
        }
        Token::StopLining => c1.push(0x99, out),
        Token::StartLining => c1.push(0x9A, out),
        Token::TimeControlWait(secs) => {
            let tenths = (secs * 10.0).round();
            if !(0.0..=63.0).contains(&tenths) {
                return Err(malformed(format!("wait of {secs}s does not fit TIME")));
            }
            c1.push(0x9D, out);
            out.extend_from_slice(&[0x20, 0x40 | tenths as u8]);
        }
        Token::TimeControlMode(m) => {
            c1.push(0x9D, out);
            out.extend_from_slice(&[0x28, 0x40 | (m & 0x0F)]);
        }

        Token::SetWritingFormat(p) => csi(c1, &[p], 0x53, out),
        Token::RasterColorCommand(p) => csi(c1, &[p], 0x6E, out),
        Token::ActiveCoordinatePositionSet { x, y } => csi(c1, &[x, y], 0x61, out),
        Token::SetDisplayFormat { width, height } => csi(c1, &[width, height], 0x56, out),
        Token::SetDisplayPosition { x, y } => csi(c1, &[x, y], 0x5F, out),
        Token::CharacterCompositionDotDesignation { width, height } => csi(c1, &[width, height], 0x57, out),
        Token::SetHorizontalSpacing(p) => csi(c1, &[p], 0x58, out),
        Token::SetVerticalSpacing(p) => csi(c1, &[p], 0x59, out),
        Token::OrnamentControl(orn) => match orn {
            Ornament::None => csi(c1, &[0], 0x63, out),
            Ornament::Hemming(c) => csi(c1, &[1, ornament_param(c)], 0x63, out),
            Ornament::Shade(c) => csi(c1, &[2, ornament_param(c)], 0x63, out),
            Ornament::Hollow => csi(c1, &[3], 0x63, out),
        },
        Token::BuiltinSoundReplay(p) => csi(c1, &[p], 0x68, out),

        Token::Character { .. } | Token::Drcs { .. } | Token::Bitmap(_) => {
            return Err(malformed("graphic token passed as a control"));
        }
    }
    Ok(())
}

/// Parameter byte carrying a 6-bit value
fn param(v: u8) -> u8 {
    0x40 | (v & 0x3F)
}

fn col(c1: C1Form, base: u8, c: u8, out: &mut Vec<u8>) {
    c1.push(0x90, out);
    out.push(base | (c & 0x0F));
}

fn szx(c1: C1Form, p: u8, out: &mut Vec<u8>) {
    c1.push(0x8B, out);
    out.push(p);
}

/// `pallet << 4 | index` to the decimal `pallet * 100 + index`
fn ornament_param(c: u8) -> u32 {
    (c >> 4) as u32 * 100 + (c & 0x0F) as u32
}

fn csi(c1: C1Form, params: &[u32], final_byte: u8, out: &mut Vec<u8>) {
    c1.push(0x9B, out);
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push(0x3B);
        }
        out.extend_from_slice(p.to_string().as_bytes());
    }
    out.extend_from_slice(&[0x20, final_byte]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(token: Token, c1: C1Form) -> Vec<u8> {
        let mut out = Vec::new();
        encode_control(&token, c1, &mut out).unwrap();
        out
    }

    #[test]
    fn c0_with_parameters() {
        assert_eq!(bytes(Token::ActivePositionSet { x: 3, y: 10 }, C1Form::EightBit), [0x1C, 0x4A, 0x43]);
        assert_eq!(bytes(Token::ParameterizedActivePositionForward(5), C1Form::EightBit), [0x16, 0x45]);
    }

    #[test]
    fn colors_pick_short_form() {
        assert_eq!(bytes(Token::ColorForeground(7), C1Form::EightBit), [0x87]);
        assert_eq!(bytes(Token::ColorForeground(9), C1Form::EightBit), [0x90, 0x49]);
        assert_eq!(bytes(Token::ColorBackground(8), C1Form::Utf8), [0xC2, 0x90, 0x58]);
    }

    #[test]
    fn csi_parameters() {
        assert_eq!(bytes(Token::SetWritingFormat(7), C1Form::EightBit), [0x9B, b'7', 0x20, 0x53]);
        assert_eq!(
            bytes(Token::SetDisplayFormat { width: 620, height: 480 }, C1Form::EightBit),
            b"\x9B620;480 V"
        );
        assert_eq!(bytes(Token::OrnamentControl(Ornament::Hemming(0x18)), C1Form::EightBit), b"\x9B1;108 c");
    }

    #[test]
    fn time_wait_in_tenths() {
        assert_eq!(bytes(Token::TimeControlWait(1.5), C1Form::EightBit), [0x9D, 0x20, 0x4F]);
        let mut out = Vec::new();
        assert!(encode_control(&Token::TimeControlWait(10.0), C1Form::EightBit, &mut out).is_err());
    }
}
