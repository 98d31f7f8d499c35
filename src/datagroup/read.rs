use bitstream_io::{BigEndian, BitRead, BitReader};

use super::*;
use crate::constants::DATA_UNIT_SEPARATOR;
use crate::error::{malformed, Error, Result};

impl<'a> DataGroup<'a> {
    /// Decodes one data group; a bad CRC is recorded, not rejected.
    pub fn read(data: &'a [u8]) -> Result<Self> {
        if data.len() < 5 {
            return Err(malformed("data group header truncated"));
        }
        let id = data[0] >> 2;
        let version = data[0] & 0x03;
        let link_number = data[1];
        let last_link_number = data[2];
        let size = u16::from_be_bytes([data[3], data[4]]) as usize;
        if data.len() < 5 + size + 2 {
            return Err(malformed(format!("data group declares {size} bytes, {} available", data.len() - 5)));
        }

        let body = &data[5..5 + size];
        let crc = u16::from_be_bytes([data[5 + size], data[6 + size]]);
        let crc_valid = CRC_CCITT.checksum(&data[..7 + size]) == 0;
        if !crc_valid {
            log::debug!("data group CRC16 mismatch (trailer {crc:#06x})");
        }

        let group = id >> 5;
        let body = match id & 0x0F {
            0 => DataGroupBody::Management(read_management(body)?),
            tag @ 1..=8 => DataGroupBody::Statement(read_statement(tag - 1, body)?),
            tag => return Err(malformed(format!("data group language tag {tag}"))),
        };

        Ok(Self { group, version, link_number, last_link_number, body, crc, crc_valid })
    }

    /// As [`DataGroup::read`], failing on a CRC16 mismatch.
    pub fn read_strict(data: &'a [u8]) -> Result<Self> {
        let group = Self::read(data)?;
        if !group.crc_valid {
            return Err(malformed("data group CRC16 mismatch"));
        }
        Ok(group)
    }
}

fn read_management(body: &[u8]) -> Result<CaptionManagement<'_>> {
    let mut br = BitReader::endian(body, BigEndian);
    let tmd = TimeControlMode::from_bits(br.read::<2, u8>()?);
    br.skip(6)?;
    let offset_time = match tmd {
        TimeControlMode::OffsetTime => Some(read_bcd_time(&mut br)?),
        _ => None,
    };

    let count = br.read::<8, u8>()?;
    let mut languages = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let language_tag = br.read::<3, u8>()?;
        br.skip(1)?;
        let display_mode = br.read::<4, u8>()?;
        let display_condition = match display_mode {
            12..=14 => Some(br.read::<8, u8>()?),
            _ => None,
        };
        let mut iso_639 = [0u8; 3];
        br.read_bytes(&mut iso_639)?;
        let format = br.read::<4, u8>()?;
        let tcs = br.read::<2, u8>()?;
        let rollup_mode = br.read::<2, u8>()?;
        languages.push(LanguageEntry { language_tag, display_mode, display_condition, iso_639, format, tcs, rollup_mode });
    }

    let loop_len = br.read::<24, u32>()? as usize;
    let units = read_data_units(take(br.into_reader(), loop_len)?)?;
    Ok(CaptionManagement { tmd, offset_time, languages, units })
}

fn read_statement(language_index: u8, body: &[u8]) -> Result<CaptionStatement<'_>> {
    let mut br = BitReader::endian(body, BigEndian);
    let tmd = TimeControlMode::from_bits(br.read::<2, u8>()?);
    br.skip(6)?;
    let start_time = match tmd {
        TimeControlMode::RealTime | TimeControlMode::OffsetTime => Some(read_bcd_time(&mut br)?),
        _ => None,
    };
    let loop_len = br.read::<24, u32>()? as usize;
    let units = read_data_units(take(br.into_reader(), loop_len)?)?;
    Ok(CaptionStatement { language_index, tmd, start_time, units })
}

fn take(rest: &[u8], len: usize) -> Result<&[u8]> {
    rest.get(..len)
        .ok_or_else(|| malformed(format!("data unit loop declares {len} bytes, {} available", rest.len())))
}

fn read_bcd<R: BitRead>(br: &mut R, digits: u32) -> Result<u32> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = br.read::<4, u8>()?;
        if digit > 9 {
            return Err(Error::Malformed(format!("BCD digit {digit:#x}")));
        }
        value = value * 10 + digit as u32;
    }
    Ok(value)
}

fn read_bcd_time<R: BitRead>(br: &mut R) -> Result<BcdTime> {
    let time = BcdTime {
        hours: read_bcd(br, 2)? as u8,
        minutes: read_bcd(br, 2)? as u8,
        seconds: read_bcd(br, 2)? as u8,
        milliseconds: read_bcd(br, 3)? as u16,
    };
    br.skip(4)?;
    Ok(time)
}

pub(super) fn read_data_units(mut data: &[u8]) -> Result<Vec<DataUnit<'_>>> {
    let mut units = Vec::new();
    while !data.is_empty() {
        let [separator, parameter, s0, s1, s2, rest @ ..] = data else {
            return Err(malformed("data unit header truncated"));
        };
        if *separator != DATA_UNIT_SEPARATOR {
            return Err(malformed(format!("data unit separator {separator:#04x}")));
        }
        let size = u32::from_be_bytes([0, *s0, *s1, *s2]) as usize;
        if rest.len() < size {
            return Err(malformed(format!("data unit declares {size} bytes, {} available", rest.len())));
        }
        units.push(DataUnit::new(*parameter, &rest[..size]));
        data = &rest[size..];
    }
    Ok(units)
}
