//! Caption data groups: management and statement records with their data units.

mod read;
mod write;

use crc::{Crc, CRC_16_XMODEM};
use serde::Serialize;

use crate::constants::*;
use crate::types::TextCodingSystem;

pub(crate) const CRC_CCITT: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DataGroup<'a> {
    /// A/B group flag used for change detection
    pub group: u8,
    pub version: u8,
    pub link_number: u8,
    pub last_link_number: u8,
    pub body: DataGroupBody<'a>,
    /// Trailer as read; recomputed on write
    pub crc: u16,
    pub crc_valid: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum DataGroupBody<'a> {
    Management(CaptionManagement<'a>),
    Statement(CaptionStatement<'a>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TimeControlMode {
    Free,
    RealTime,
    OffsetTime,
    Reserved,
}

impl TimeControlMode {
    pub fn from_bits(tmd: u8) -> Self {
        match tmd & 0x03 {
            0 => TimeControlMode::Free,
            1 => TimeControlMode::RealTime,
            2 => TimeControlMode::OffsetTime,
            _ => TimeControlMode::Reserved,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            TimeControlMode::Free => 0,
            TimeControlMode::RealTime => 1,
            TimeControlMode::OffsetTime => 2,
            TimeControlMode::Reserved => 3,
        }
    }
}

/// Nine BCD digits: hours, minutes, seconds and milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BcdTime {
    pub hours: u8,
    pub minutes: u8,
    pub seconds: u8,
    pub milliseconds: u16,
}

impl BcdTime {
    pub fn as_secs_f64(&self) -> f64 {
        self.hours as f64 * 3600.0 + self.minutes as f64 * 60.0 + self.seconds as f64
            + self.milliseconds as f64 / 1000.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptionManagement<'a> {
    pub tmd: TimeControlMode,
    pub offset_time: Option<BcdTime>,
    pub languages: Vec<LanguageEntry>,
    pub units: Vec<DataUnit<'a>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageEntry {
    pub language_tag: u8,
    /// Display mode (DMF)
    pub display_mode: u8,
    /// Display condition, present for display modes 12..=14
    pub display_condition: Option<u8>,
    pub iso_639: [u8; 3],
    pub format: u8,
    pub tcs: u8,
    pub rollup_mode: u8,
}

impl LanguageEntry {
    pub fn iso_639_code(&self) -> String {
        String::from_utf8_lossy(&self.iso_639).into_owned()
    }

    pub fn text_coding_system(&self) -> TextCodingSystem {
        TextCodingSystem::from_bits(self.tcs)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CaptionStatement<'a> {
    /// 0-based; the data group id carries it plus one
    pub language_index: u8,
    pub tmd: TimeControlMode,
    pub start_time: Option<BcdTime>,
    pub units: Vec<DataUnit<'a>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DataUnit<'a> {
    Statement(&'a [u8]),
    Drcs { two_byte: bool, data: &'a [u8] },
    Bitmap(&'a [u8]),
    /// Any other parameter, carried so that mux stays exact
    Other { parameter: u8, data: &'a [u8] },
}

impl<'a> DataUnit<'a> {
    pub fn new(parameter: u8, data: &'a [u8]) -> Self {
        match parameter {
            DATA_UNIT_STATEMENT => DataUnit::Statement(data),
            DATA_UNIT_DRCS_1BYTE => DataUnit::Drcs { two_byte: false, data },
            DATA_UNIT_DRCS_2BYTE => DataUnit::Drcs { two_byte: true, data },
            DATA_UNIT_BITMAP => DataUnit::Bitmap(data),
            _ => DataUnit::Other { parameter, data },
        }
    }

    pub fn parameter(&self) -> u8 {
        match self {
            DataUnit::Statement(_) => DATA_UNIT_STATEMENT,
            DataUnit::Drcs { two_byte: false, .. } => DATA_UNIT_DRCS_1BYTE,
            DataUnit::Drcs { two_byte: true, .. } => DATA_UNIT_DRCS_2BYTE,
            DataUnit::Bitmap(_) => DATA_UNIT_BITMAP,
            DataUnit::Other { parameter, .. } => *parameter,
        }
    }

    pub fn data(&self) -> &'a [u8] {
        match *self {
            DataUnit::Statement(data)
            | DataUnit::Drcs { data, .. }
            | DataUnit::Bitmap(data)
            | DataUnit::Other { data, .. } => data,
        }
    }
}

/// Synchronized/asynchronous PES data wrapping one data group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PesData<'a> {
    pub data_identifier: u8,
    pub private_stream_id: u8,
    pub header: &'a [u8],
    pub data_group: &'a [u8],
}

impl<'a> PesData<'a> {
    pub fn read(payload: &'a [u8]) -> crate::Result<Self> {
        let [data_identifier, private_stream_id, hdr, rest @ ..] = payload else {
            return Err(crate::error::malformed("PES data header truncated"));
        };
        let hdr_len = (hdr & 0x0F) as usize;
        if rest.len() < hdr_len {
            return Err(crate::error::malformed("PES data private header truncated"));
        }
        if *data_identifier != DATA_IDENTIFIER_CAPTION && *data_identifier != DATA_IDENTIFIER_SUPERIMPOSE {
            log::debug!("unexpected data_identifier {data_identifier:#04x}");
        }
        Ok(Self {
            data_identifier: *data_identifier,
            private_stream_id: *private_stream_id,
            header: &rest[..hdr_len],
            data_group: &rest[hdr_len..],
        })
    }

    pub fn write(data_identifier: u8, data_group: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(3 + data_group.len());
        out.extend_from_slice(&[data_identifier, PRIVATE_STREAM_ID, 0xF0]);
        out.extend_from_slice(data_group);
        out
    }
}
