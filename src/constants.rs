//! Constants for MPEG-TS demultiplexing and ARIB caption framing

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const PAT_PID: u16 = 0x0000;
pub const NULL_PID: u16 = 0x1FFF;

/// PES packet constants
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

/// PTS constants
pub const PTS_CLOCK_HZ: u64 = 90_000; // 90 kHz
pub const PTS_WRAP_THRESHOLD: u64 = 1u64 << 33; // 33-bit PTS counter

/// PSI table ids
pub const TABLE_ID_PAT: u8 = 0x00;
pub const TABLE_ID_PMT: u8 = 0x02;

/// Stream types carrying the timestamp reference
pub const VIDEO_STREAM_TYPES: &[u8] = &[
    0x01, // MPEG-1 video
    0x02, // MPEG-2 video
    0x10, // MPEG-4 visual
    0x1B, // H.264
    0x24, // HEVC
];
pub const AUDIO_STREAM_TYPES: &[u8] = &[
    0x03, // MPEG-1 audio
    0x04, // MPEG-2 audio
    0x0F, // AAC ADTS
    0x11, // AAC LATM
    0x81, // AC-3
];

/// Private data stream type used for ARIB captions
pub const STREAM_TYPE_PRIVATE_DATA: u8 = 0x06;

/// Stream identifier descriptor and the component tags it selects
pub const STREAM_IDENTIFIER_DESCRIPTOR: u8 = 0x52;
pub const COMPONENT_TAG_CAPTION: u8 = 0x30;
pub const COMPONENT_TAG_SUPERIMPOSE: u8 = 0x38;

/// Synchronized PES data header
pub const DATA_IDENTIFIER_CAPTION: u8 = 0x80;
pub const DATA_IDENTIFIER_SUPERIMPOSE: u8 = 0x81;
pub const PRIVATE_STREAM_ID: u8 = 0xFF;

/// Data group framing
pub const DATA_UNIT_SEPARATOR: u8 = 0x1F;
pub const DATA_UNIT_STATEMENT: u8 = 0x20;
pub const DATA_UNIT_DRCS_1BYTE: u8 = 0x30;
pub const DATA_UNIT_DRCS_2BYTE: u8 = 0x31;
pub const DATA_UNIT_BITMAP: u8 = 0x35;

/// Placeholder drawn for characters that cannot be represented
pub const GETA: char = '\u{3013}';
