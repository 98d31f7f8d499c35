//! Transport stream fixtures: PAT, PMT and PES packets built from scratch.
#![allow(dead_code)]

use crc::{Crc, CRC_32_MPEG_2};

pub const PMT_PID: u16 = 0x0100;
pub const VIDEO_PID: u16 = 0x0111;
pub const CAPTION_PID: u16 = 0x0130;
pub const PROGRAM: u16 = 0x0401;

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Splits `data` over as many packets as needed, the first flagged as unit start.
pub fn packets(pid: u16, cc: &mut u8, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, chunk) in data.chunks(184).enumerate() {
        out.extend(packet(pid, i == 0, *cc, chunk));
        *cc = (*cc + 1) & 0x0F;
    }
    out
}

pub fn packet(pid: u16, unit_start: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    let mut pkt = vec![0x47, ((unit_start as u8) << 6) | (pid >> 8) as u8, pid as u8];
    let stuffing = 184 - payload.len();
    if stuffing == 0 {
        pkt.push(0x10 | cc);
    } else {
        pkt.push(0x30 | cc);
        pkt.push((stuffing - 1) as u8);
        if stuffing > 1 {
            pkt.push(0x00);
            pkt.extend(std::iter::repeat_n(0xFF, stuffing - 2));
        }
    }
    pkt.extend_from_slice(payload);
    pkt
}

/// Fills in the section length, appends the CRC32 and prepends a pointer field.
fn section(mut sec: Vec<u8>) -> Vec<u8> {
    let len = sec.len() - 3 + 4;
    sec[1] = 0xB0 | (len >> 8) as u8;
    sec[2] = len as u8;
    let crc = CRC_MPEG.checksum(&sec);
    sec.extend_from_slice(&crc.to_be_bytes());
    sec.insert(0, 0x00);
    sec
}

pub fn pat() -> Vec<u8> {
    let [p0, p1] = PROGRAM.to_be_bytes();
    section(vec![
        0x00, 0, 0, 0x7F, 0xE1, 0xC1, 0x00, 0x00,
        0x00, 0x00, 0xE0, 0x10, // network PID, skipped
        p0, p1, 0xE0 | (PMT_PID >> 8) as u8, PMT_PID as u8,
    ])
}

pub fn pmt() -> Vec<u8> {
    let [p0, p1] = PROGRAM.to_be_bytes();
    section(vec![
        0x02, 0, 0, p0, p1, 0xC1, 0x00, 0x00,
        0xE0 | (VIDEO_PID >> 8) as u8, VIDEO_PID as u8, 0xF0, 0x00,
        0x1B, 0xE0 | (VIDEO_PID >> 8) as u8, VIDEO_PID as u8, 0xF0, 0x00,
        0x06, 0xE0 | (CAPTION_PID >> 8) as u8, CAPTION_PID as u8, 0xF0, 0x03, 0x52, 0x01, 0x30,
    ])
}

fn timestamp(prefix: u8, ts: u64) -> [u8; 5] {
    [
        (prefix << 4) | ((ts >> 29) as u8 & 0x0E) | 1,
        (ts >> 22) as u8,
        ((ts >> 14) as u8 & 0xFE) | 1,
        (ts >> 7) as u8,
        ((ts << 1) as u8 & 0xFE) | 1,
    ]
}

/// Bounded PES with an optional PTS
pub fn pes(stream_id: u8, pts: Option<u64>, data: &[u8]) -> Vec<u8> {
    let mut hdr = vec![0x80, if pts.is_some() { 0x80 } else { 0x00 }, 0];
    if let Some(pts) = pts {
        hdr.extend_from_slice(&timestamp(0b0010, pts));
        hdr[2] = 5;
    }
    let len = (hdr.len() + data.len()) as u16;
    let mut out = vec![0x00, 0x00, 0x01, stream_id];
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&hdr);
    out.extend_from_slice(data);
    out
}
