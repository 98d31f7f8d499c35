use bitstream_io::{BigEndian, BitWrite, BitWriter};

use super::*;
use crate::constants::DATA_UNIT_SEPARATOR;
use crate::error::{malformed, Result};

impl DataGroup<'_> {
    /// Encodes the group, deriving every size field and the CRC16 trailer.
    pub fn write(&self) -> Result<Vec<u8>> {
        let (tag, body) = match &self.body {
            DataGroupBody::Management(m) => (0, write_management(m)?),
            DataGroupBody::Statement(s) => {
                if s.language_index > 7 {
                    return Err(malformed(format!("language index {}", s.language_index)));
                }
                (s.language_index + 1, write_statement(s)?)
            }
        };
        let size = u16::try_from(body.len())
            .map_err(|_| malformed(format!("data group body of {} bytes", body.len())))?;

        let id = ((self.group & 0x01) << 5) | tag;
        let mut out = Vec::with_capacity(7 + body.len());
        out.push((id << 2) | (self.version & 0x03));
        out.push(self.link_number);
        out.push(self.last_link_number);
        out.extend_from_slice(&size.to_be_bytes());
        out.extend_from_slice(&body);
        let crc = CRC_CCITT.checksum(&out);
        out.extend_from_slice(&crc.to_be_bytes());
        Ok(out)
    }
}

fn write_management(m: &CaptionManagement) -> Result<Vec<u8>> {
    let mut bw = BitWriter::endian(Vec::new(), BigEndian);
    bw.write::<2, u8>(m.tmd.bits())?;
    bw.write::<6, u8>(0x3F)?;
    if m.tmd == TimeControlMode::OffsetTime {
        write_bcd_time(&mut bw, &m.offset_time.unwrap_or_default())?;
    }

    let count = u8::try_from(m.languages.len())
        .map_err(|_| malformed(format!("{} language entries", m.languages.len())))?;
    bw.write::<8, u8>(count)?;
    for lang in &m.languages {
        bw.write::<3, u8>(lang.language_tag)?;
        bw.write::<1, u8>(1)?;
        bw.write::<4, u8>(lang.display_mode)?;
        if matches!(lang.display_mode, 12..=14) {
            bw.write::<8, u8>(lang.display_condition.unwrap_or(0))?;
        }
        bw.write_bytes(&lang.iso_639)?;
        bw.write::<4, u8>(lang.format)?;
        bw.write::<2, u8>(lang.tcs)?;
        bw.write::<2, u8>(lang.rollup_mode)?;
    }

    let units = write_data_units(&m.units)?;
    bw.write::<24, u32>(units.len() as u32)?;
    bw.write_bytes(&units)?;
    Ok(bw.into_writer())
}

fn write_statement(s: &CaptionStatement) -> Result<Vec<u8>> {
    let mut bw = BitWriter::endian(Vec::new(), BigEndian);
    bw.write::<2, u8>(s.tmd.bits())?;
    bw.write::<6, u8>(0x3F)?;
    if matches!(s.tmd, TimeControlMode::RealTime | TimeControlMode::OffsetTime) {
        write_bcd_time(&mut bw, &s.start_time.unwrap_or_default())?;
    }
    let units = write_data_units(&s.units)?;
    bw.write::<24, u32>(units.len() as u32)?;
    bw.write_bytes(&units)?;
    Ok(bw.into_writer())
}

fn write_bcd<W: BitWrite>(bw: &mut W, value: u32, digits: u32) -> Result<()> {
    if value >= 10u32.pow(digits) {
        return Err(malformed(format!("{value} does not fit {digits} BCD digits")));
    }
    for i in (0..digits).rev() {
        bw.write::<4, u8>((value / 10u32.pow(i) % 10) as u8)?;
    }
    Ok(())
}

fn write_bcd_time<W: BitWrite>(bw: &mut W, time: &BcdTime) -> Result<()> {
    write_bcd(bw, time.hours as u32, 2)?;
    write_bcd(bw, time.minutes as u32, 2)?;
    write_bcd(bw, time.seconds as u32, 2)?;
    write_bcd(bw, time.milliseconds as u32, 3)?;
    bw.write::<4, u8>(0x0F)?;
    Ok(())
}

pub(crate) fn write_data_units(units: &[DataUnit]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for unit in units {
        let data = unit.data();
        if data.len() > 0xFF_FFFF {
            return Err(malformed(format!("data unit of {} bytes", data.len())));
        }
        out.push(DATA_UNIT_SEPARATOR);
        out.push(unit.parameter());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes()[1..]);
        out.extend_from_slice(data);
    }
    if out.len() > 0xFF_FFFF {
        return Err(malformed(format!("data unit loop of {} bytes", out.len())));
    }
    Ok(out)
}
