//! C0, C1 and CSI control functions common to the 8-bit and UTF-8 codes.

use super::reader::ByteReader;
use super::token::{CharacterSize, FlashingMode, Ornament, Token, WritingMode};
use crate::error::{malformed, Error, Result};

/// Decodes a C0 control other than the shift functions, or SP/DEL.
pub(crate) fn read_c0(code: u8, r: &mut ByteReader) -> Result<Token> {
    Ok(match code {
        0x00 => Token::Null,
        0x07 => Token::Bell,
        0x08 => Token::ActivePositionBackward,
        0x09 => Token::ActivePositionForward,
        0x0A => Token::ActivePositionDown,
        0x0B => Token::ActivePositionUp,
        0x0C => Token::ClearScreen,
        0x0D => Token::ActivePositionReturn,
        0x16 => Token::ParameterizedActivePositionForward(r.param()? & 0x3F),
        0x18 => Token::Cancel,
        0x1C => {
            let y = r.param()? & 0x3F;
            let x = r.param()? & 0x3F;
            Token::ActivePositionSet { x, y }
        }
        0x1E => Token::RecordSeparator,
        0x1F => Token::UnitSeparator,
        0x20 => Token::Space,
        0x7F => Token::Delete,
        _ => return Err(malformed(format!("unallocated C0 code {code:#04x}"))),
    })
}

/// Decodes a C1 control, `code` in 0x80..=0x9F.
pub(crate) fn read_c1(code: u8, r: &mut ByteReader) -> Result<Token> {
    Ok(match code {
        0x80..=0x87 => Token::ColorForeground(code - 0x80),
        0x88 => Token::CharacterSize(CharacterSize::Small),
        0x89 => Token::CharacterSize(CharacterSize::Middle),
        0x8A => Token::CharacterSize(CharacterSize::Normal),
        0x8B => Token::CharacterSize(match r.param()? {
            0x60 => CharacterSize::Tiny,
            0x41 => CharacterSize::DoubleHeight,
            0x44 => CharacterSize::DoubleWidth,
            0x45 => CharacterSize::DoubleHeightAndWidth,
            0x6B => CharacterSize::Special1,
            0x64 => CharacterSize::Special2,
            p => return Err(malformed(format!("SZX parameter {p:#04x}"))),
        }),
        0x90 => match r.param()? {
            0x20 => Token::PalletControl(r.param()? & 0x0F),
            p @ 0x48..=0x4F => Token::ColorForeground(p & 0x0F),
            p @ 0x50..=0x5F => Token::ColorBackground(p & 0x0F),
            p @ 0x60..=0x6F => Token::ColorHalfForeground(p & 0x0F),
            p @ 0x70..=0x7F => Token::ColorHalfBackground(p & 0x0F),
            p => return Err(malformed(format!("COL parameter {p:#04x}"))),
        },
        0x91 => Token::FlashingControl(match r.param()? {
            0x40 => FlashingMode::Normal,
            0x47 => FlashingMode::Inverted,
            0x4F => FlashingMode::Stop,
            p => return Err(malformed(format!("FLC parameter {p:#04x}"))),
        }),
        0x92 => return Err(Error::NotUsedByStandard("CDC".into())),
        0x93 => match r.param()? {
            p @ 0x40..=0x42 => Token::PatternPolarity(p - 0x40),
            p => return Err(malformed(format!("POL parameter {p:#04x}"))),
        },
        0x94 => Token::WritingModeModification(match r.param()? {
            0x40 => WritingMode::Both,
            0x44 => WritingMode::Foreground,
            0x45 => WritingMode::Background,
            p => return Err(malformed(format!("WMM parameter {p:#04x}"))),
        }),
        0x95 => return Err(Error::NotUsedByStandard("MACRO definition".into())),
        0x97 => Token::HighlightBlock(r.param()? & 0x0F),
        0x98 => Token::RepeatCharacter(r.param()? & 0x3F),
        0x99 => Token::StopLining,
        0x9A => Token::StartLining,
        0x9B => read_csi(r)?,
        0x9D => read_time(r)?,
        _ => return Err(malformed(format!("unallocated C1 code {code:#04x}"))),
    })
}

fn read_time(r: &mut ByteReader) -> Result<Token> {
    match r.param()? {
        0x20 => Ok(Token::TimeControlWait((r.param()? & 0x3F) as f64 / 10.0)),
        0x28 => Ok(Token::TimeControlMode(r.param()? & 0x0F)),
        0x29 => Err(Error::NotImplemented("TIME 0x29 (presentation start/end time)".into())),
        p => Err(malformed(format!("TIME parameter {p:#04x}"))),
    }
}

fn read_csi(r: &mut ByteReader) -> Result<Token> {
    let mut params = Vec::new();
    let mut cur: Option<u32> = None;
    loop {
        match r.next()? {
            b @ 0x30..=0x39 => {
                let v = cur.unwrap_or(0).saturating_mul(10).saturating_add((b - 0x30) as u32);
                cur = Some(v);
            }
            0x3B => params.push(cur.take().unwrap_or(0)),
            0x20 => {
                params.extend(cur.take());
                let final_byte = r.next()?;
                return csi_token(final_byte, &params);
            }
            // finals that take no intermediate
            b @ 0x40..=0x6F => {
                params.extend(cur.take());
                return csi_token(b, &params);
            }
            b => return Err(malformed(format!("CSI byte {b:#04x}"))),
        }
    }
}

/// `pallet * 100 + index` to `pallet << 4 | index`
fn ornament_color(p: u32) -> Result<u8> {
    let (pallet, index) = (p / 100, p % 100);
    if pallet > 0x0F || index > 0x0F {
        return Err(malformed(format!("ORN color {p}")));
    }
    Ok(((pallet << 4) | index) as u8)
}

fn csi_token(final_byte: u8, params: &[u32]) -> Result<Token> {
    let token = match (final_byte, params) {
        (0x53, [p]) => Token::SetWritingFormat(*p),
        (0x53, _) => return Err(Error::NotImplemented("SWF with format details".into())),
        (0x6E, [p]) => Token::RasterColorCommand(*p),
        (0x61, [x, y]) => Token::ActiveCoordinatePositionSet { x: *x, y: *y },
        (0x56, [w, h]) => Token::SetDisplayFormat { width: *w, height: *h },
        (0x5F, [x, y]) => Token::SetDisplayPosition { x: *x, y: *y },
        (0x57, [w, h]) => Token::CharacterCompositionDotDesignation { width: *w, height: *h },
        (0x58, [p]) => Token::SetHorizontalSpacing(*p),
        (0x59, [p]) => Token::SetVerticalSpacing(*p),
        (0x63, [0]) => Token::OrnamentControl(Ornament::None),
        (0x63, [1, c]) => Token::OrnamentControl(Ornament::Hemming(ornament_color(*c)?)),
        (0x63, [2, c]) => Token::OrnamentControl(Ornament::Shade(ornament_color(*c)?)),
        (0x63, [3]) => Token::OrnamentControl(Ornament::Hollow),
        (0x68, [p]) => Token::BuiltinSoundReplay(*p),
        (0x54, _) => return Err(Error::NotUsedByStandard("CCC".into())),
        (0x5B, _) => return Err(Error::NotUsedByStandard("PLD".into())),
        (0x5C, _) => return Err(Error::NotUsedByStandard("PLU".into())),
        (0x42, _) => return Err(Error::NotUsedByStandard("GSM".into())),
        (0x65, _) => return Err(Error::NotUsedByStandard("CFS".into())),
        (0x66, _) => return Err(Error::NotUsedByStandard("XCS".into())),
        (0x69, _) => return Err(Error::NotUsedByStandard("ACS".into())),
        (0x6A, _) => return Err(Error::NotUsedByStandard("UED".into())),
        (0x6F, _) => return Err(Error::NotUsedByStandard("SCS".into())),
        (0x5D, _) => return Err(Error::NotImplemented("GAA".into())),
        (0x5E, _) => return Err(Error::NotImplemented("SRC".into())),
        (0x62, _) => return Err(Error::NotImplemented("TCC".into())),
        (0x64, _) => return Err(Error::NotImplemented("MDF".into())),
        (0x53 | 0x6E | 0x61 | 0x56 | 0x5F | 0x57 | 0x58 | 0x59 | 0x63 | 0x68, _) => {
            return Err(malformed(format!("CSI {final_byte:#04x} with parameters {params:?}")));
        }
        _ => return Err(malformed(format!("unknown CSI final {final_byte:#04x}"))),
    };
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c1(bytes: &[u8]) -> Result<Token> {
        let mut r = ByteReader::new(&bytes[1..]);
        read_c1(bytes[0], &mut r)
    }

    #[test]
    fn decodes_csi_with_and_without_params() {
        assert_eq!(c1(b"\x9B7 S").unwrap(), Token::SetWritingFormat(7));
        assert_eq!(c1(b"\x9B620;480 V").unwrap(), Token::SetDisplayFormat { width: 620, height: 480 });
        assert_eq!(c1(b"\x9B1;107 c").unwrap(), Token::OrnamentControl(Ornament::Hemming(0x17)));
        assert!(matches!(c1(b"\x9B\x5B"), Err(Error::NotUsedByStandard(_))));
        assert!(matches!(c1(b"\x9B1 \x7E"), Err(Error::Malformed(_))));
        assert!(matches!(c1(b"\x9B1;2 S"), Err(Error::NotImplemented(_))));
        assert!(matches!(c1(b"\x9B1 n\x00"), Ok(Token::RasterColorCommand(1))));
        assert_eq!(c1(b"\x9B2;1515 c").unwrap(), Token::OrnamentControl(Ornament::Shade(0xFF)));
        assert!(matches!(c1(b"\x9B1;16 c"), Err(Error::Malformed(_))));
        assert!(matches!(c1(b"\x9B2;1600 c"), Err(Error::Malformed(_))));
    }

    #[test]
    fn decodes_col_variants() {
        assert_eq!(c1(b"\x90\x4A").unwrap(), Token::ColorForeground(10));
        assert_eq!(c1(b"\x90\x58").unwrap(), Token::ColorBackground(8));
        assert_eq!(c1(b"\x90\x20\x42").unwrap(), Token::PalletControl(2));
        assert!(matches!(c1(b"\x90\x41"), Err(Error::Malformed(_))));
    }

    #[test]
    fn time_control() {
        assert_eq!(c1(b"\x9D\x20\x4F").unwrap(), Token::TimeControlWait(1.5));
        assert!(matches!(c1(b"\x9D\x29\x40"), Err(Error::NotImplemented(_))));
    }

    #[test]
    fn reserved_and_truncated() {
        assert!(matches!(c1(b"\x92\x40"), Err(Error::NotUsedByStandard(_))));
        assert!(matches!(c1(b"\x96"), Err(Error::Malformed(_))));
        assert!(matches!(c1(b"\x8B"), Err(Error::Malformed(_))));
        let mut r = ByteReader::new(b"\x41");
        assert!(matches!(read_c0(0x1C, &mut r), Err(Error::Malformed(_))));
        let mut r = ByteReader::new(b"\x45\x4A");
        assert_eq!(read_c0(0x1C, &mut r).unwrap(), Token::ActivePositionSet { x: 10, y: 5 });
    }
}
