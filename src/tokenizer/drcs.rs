//! DRCS and bitmap data units.

use std::collections::HashMap;

use bitstream_io::{BigEndian, BitRead, BitReader};

use super::reader::ByteReader;
use super::token::{Bitmap, DrcsGlyph};
use crate::error::Result;

/// Bits per pixel for a declared `depth` byte (`colors = depth + 2`).
pub fn depth_bits(depth: u8) -> u8 {
    let colors = depth as u32 + 2;
    (u32::BITS - (colors - 1).leading_zeros()) as u8
}

/// The `depth` byte that declares `bits` per pixel.
pub fn depth_byte(bits: u8) -> u8 {
    ((1u32 << bits) - 2) as u8
}

pub fn pattern_len(width: u8, height: u8, bits: u8) -> usize {
    (width as usize * height as usize * bits as usize).div_ceil(8)
}

/// Parses a DRCS data unit into `(CharacterCode, glyph)` pairs.
///
/// Only the first linear-bitmap font of each code is kept. A font in any other
/// mode ends the unit early; whatever was read before it is returned.
pub fn parse_drcs(data: &[u8]) -> Result<Vec<(u16, DrcsGlyph)>> {
    let mut r = ByteReader::new(data);
    let mut glyphs = Vec::new();

    let number_of_code = r.next()?;
    for _ in 0..number_of_code {
        let code = u16::from_be_bytes([r.next()?, r.next()?]);
        let number_of_font = r.next()?;
        let mut found = None;
        for _ in 0..number_of_font {
            let mut br = BitReader::endian(r.take(1)?, BigEndian);
            let _font_id = br.read::<4, u8>()?;
            let mode = br.read::<4, u8>()?;
            if mode > 1 {
                log::debug!("DRCS {code:#06x}: geometric mode {mode} unsupported, skipping rest of unit");
                glyphs.extend(found);
                return Ok(glyphs);
            }
            let depth = r.next()?;
            let width = r.next()?;
            let height = r.next()?;
            let bits = depth_bits(depth);
            let pattern = r.take(pattern_len(width, height, bits))?;
            if found.is_none() {
                found = Some((code, DrcsGlyph { width, height, depth: bits, data: pattern.to_vec() }));
            }
        }
        glyphs.extend(found);
    }
    Ok(glyphs)
}

/// Glyph dictionary keyed by `(plane, code)`; plane 0 is the 2-byte DRCS-0.
#[derive(Debug, Default, Clone)]
pub struct DrcsStore {
    glyphs: HashMap<(u8, u16), DrcsGlyph>,
}

impl DrcsStore {
    pub fn load(&mut self, data: &[u8], two_byte: bool) -> Result<usize> {
        let parsed = parse_drcs(data)?;
        let n = parsed.len();
        for (code, glyph) in parsed {
            let key = if two_byte {
                (0, code)
            } else {
                (((code >> 8) as u8).wrapping_sub(0x40), code & 0xFF)
            };
            self.glyphs.insert(key, glyph);
        }
        Ok(n)
    }

    pub fn get(&self, plane: u8, code: u16) -> Option<&DrcsGlyph> {
        self.glyphs.get(&(plane, code))
    }

    pub fn insert(&mut self, plane: u8, code: u16, glyph: DrcsGlyph) {
        self.glyphs.insert((plane, code), glyph);
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

pub fn parse_bitmap(data: &[u8]) -> Result<Bitmap> {
    let mut r = ByteReader::new(data);
    let x = u16::from_be_bytes([r.next()?, r.next()?]);
    let y = u16::from_be_bytes([r.next()?, r.next()?]);
    let n = r.next()? as usize;
    let flashing_colors = r.take(n)?.to_vec();
    Ok(Bitmap { x, y, flashing_colors, data: r.rest().to_vec() })
}

/// DRCS data unit body defining one font per code; at most 255 codes.
pub fn write_drcs_unit(entries: &[(u16, &DrcsGlyph)]) -> Vec<u8> {
    let mut out = vec![entries.len().min(u8::MAX as usize) as u8];
    for (code, glyph) in entries {
        out.extend_from_slice(&code.to_be_bytes());
        out.push(1);
        out.push(if glyph.depth == 1 { 0x00 } else { 0x01 });
        out.extend_from_slice(&[depth_byte(glyph.depth), glyph.width, glyph.height]);
        out.extend_from_slice(&glyph.data);
    }
    out
}

pub fn write_bitmap_unit(bitmap: &Bitmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(5 + bitmap.flashing_colors.len() + bitmap.data.len());
    out.extend_from_slice(&bitmap.x.to_be_bytes());
    out.extend_from_slice(&bitmap.y.to_be_bytes());
    out.push(bitmap.flashing_colors.len() as u8);
    out.extend_from_slice(&bitmap.flashing_colors);
    out.extend_from_slice(&bitmap.data);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_bit_lengths() {
        let cases = [(2u32, 1u8), (3, 2), (4, 2), (8, 3), (16, 4), (32, 5), (64, 6), (128, 7), (192, 8)];
        for (colors, bits) in cases {
            assert_eq!(depth_bits((colors - 2) as u8), bits, "colors {colors}");
        }
        assert_eq!(depth_byte(2), 2);
        assert_eq!(depth_bits(depth_byte(2)), 2);
    }

    #[test]
    fn loads_one_byte_drcs_into_plane() {
        let glyph = DrcsGlyph { width: 16, height: 2, depth: 2, data: vec![0xAA; 8] };
        let unit = write_drcs_unit(&[(0x4121, &glyph)]);
        let mut store = DrcsStore::default();
        assert_eq!(store.load(&unit, false).unwrap(), 1);
        assert_eq!(store.get(1, 0x21), Some(&glyph));
        assert_eq!(store.get(0, 0x4121), None);
    }

    #[test]
    fn geometric_font_stops_the_unit() {
        let glyph = DrcsGlyph { width: 8, height: 1, depth: 1, data: vec![0xFF] };
        let mut unit = write_drcs_unit(&[(0x4121, &glyph)]);
        unit[0] = 2;
        // second code declares a geometric font
        unit.extend_from_slice(&[0x41, 0x22, 0x01, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00]);
        let parsed = parse_drcs(&unit).unwrap();
        assert_eq!(parsed, vec![(0x4121, glyph)]);
    }

    #[test]
    fn truncated_pattern_is_malformed() {
        let glyph = DrcsGlyph { width: 16, height: 16, depth: 1, data: vec![0; 32] };
        let unit = write_drcs_unit(&[(0x4121, &glyph)]);
        assert!(parse_drcs(&unit[..unit.len() - 1]).is_err());
    }

    #[test]
    fn bitmap_unit() {
        let bmp = parse_bitmap(&[0x01, 0x00, 0x00, 0x20, 0x02, 0x07, 0x08, 0x89, 0x50, 0x4E, 0x47]).unwrap();
        assert_eq!((bmp.x, bmp.y), (256, 32));
        assert_eq!(bmp.flashing_colors, vec![7, 8]);
        assert_eq!(bmp.data, b"\x89PNG");
    }
}
