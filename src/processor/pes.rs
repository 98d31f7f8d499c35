//! PES reassembly and header parsing

use bytes::{Bytes, BytesMut};

use crate::constants::PES_START_CODE;

#[derive(Debug, Clone, PartialEq)]
pub struct PesPacket {
    pub stream_id: u8,
    /// 33-bit, 90 kHz
    pub pts:       Option<u64>,
    /// Defaults to the PTS when the header carries none
    pub dts:       Option<u64>,
    pub data:      Bytes,
}

/// Accumulates the payloads of one PID into PES packets.
#[derive(Default)]
pub struct PesAssembler {
    buf:    BytesMut,
    active: bool,
}

impl PesAssembler {
    /// Feeds one packet payload and returns the packets it completed.
    pub fn push(&mut self, unit_start: bool, payload: &[u8]) -> Vec<PesPacket> {
        let mut done = Vec::new();

        if unit_start {
            if self.active {
                match self.declared_len() {
                    // length 0: delimited by this unit start
                    Some(0) => done.extend(self.take()),
                    _ => {
                        log::debug!("dropping incomplete PES ({} bytes buffered)", self.buf.len());
                        self.reset();
                    }
                }
            }
            self.buf.clear();
            self.active = true;
        } else if !self.active {
            return done;
        }

        self.buf.extend_from_slice(payload);
        if let Some(len) = self.declared_len() {
            let total = 6 + len;
            if len > 0 && self.buf.len() >= total {
                self.buf.truncate(total);
                done.extend(self.take());
            }
        }
        done
    }

    /// Emits a buffered unbounded packet at end of input.
    pub fn flush(&mut self) -> Option<PesPacket> {
        if self.active && self.declared_len() == Some(0) {
            return self.take();
        }
        self.reset();
        None
    }

    fn declared_len(&self) -> Option<usize> {
        (self.buf.len() >= 6).then(|| u16::from_be_bytes([self.buf[4], self.buf[5]]) as usize)
    }

    fn take(&mut self) -> Option<PesPacket> {
        self.active = false;
        let buf = self.buf.split().freeze();
        let pes = parse_pes(buf);
        if pes.is_none() {
            log::debug!("dropping PES with malformed header");
        }
        pes
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.active = false;
    }
}

/// Splits a complete PES packet into timestamps and payload.
pub fn parse_pes(buf: Bytes) -> Option<PesPacket> {
    if buf.len() < 6 || buf[..3] != PES_START_CODE {
        return None;
    }
    let stream_id = buf[3];
    let declared  = u16::from_be_bytes([buf[4], buf[5]]) as usize;
    let end       = if declared == 0 { buf.len() } else { (6 + declared).min(buf.len()) };

    match stream_id {
        // no optional header: program_stream_map, padding, private_stream_2, ECM, EMM, directory, DSMCC, H.222.1 type E
        0xBC | 0xBE | 0xBF | 0xF0 | 0xF1 | 0xFF | 0xF2 | 0xF8 => {
            return Some(PesPacket { stream_id, pts: None, dts: None, data: buf.slice(6..end) });
        }
        _ => {}
    }

    if buf.len() < 9 {
        return None;
    }
    let flags   = buf[7] >> 6;
    let hdr_end = 9 + buf[8] as usize;
    if hdr_end > end {
        return None;
    }

    let pts = if flags & 0b10 != 0 && hdr_end >= 14 { Some(parse_timestamp(&buf[9..14])) } else { None };
    let dts = if flags == 0b11 && hdr_end >= 19 { Some(parse_timestamp(&buf[14..19])) } else { pts };

    Some(PesPacket { stream_id, pts, dts, data: buf.slice(hdr_end..end) })
}

pub fn parse_timestamp(p: &[u8]) -> u64 {
    (((p[0] & 0x0E) as u64) << 29)
        | ((p[1] as u64) << 22)
        | ((((p[2] & 0xFE) as u64) >> 1) << 15)
        | ((p[3] as u64) << 7)
        | ((p[4] as u64) >> 1)
}

#[cfg(test)]
pub(crate) fn encode_timestamp(prefix: u8, ts: u64) -> [u8; 5] {
    [
        (prefix << 4) | (((ts >> 30) as u8 & 0x07) << 1) | 1,
        (ts >> 22) as u8,
        (((ts >> 15) as u8 & 0x7F) << 1) | 1,
        (ts >> 7) as u8,
        ((ts as u8 & 0x7F) << 1) | 1,
    ]
}

#[cfg(test)]
pub(crate) fn build_pes(stream_id: u8, pts: Option<u64>, data: &[u8], bounded: bool) -> Vec<u8> {
    let mut hdr = Vec::new();
    if let Some(pts) = pts {
        hdr.extend_from_slice(&encode_timestamp(0b0010, pts));
    }
    let mut pes = PES_START_CODE.to_vec();
    pes.push(stream_id);
    let len = if bounded { 3 + hdr.len() + data.len() } else { 0 };
    pes.extend_from_slice(&(len as u16).to_be_bytes());
    pes.push(0x80);
    pes.push(if pts.is_some() { 0x80 } else { 0x00 });
    pes.push(hdr.len() as u8);
    pes.extend_from_slice(&hdr);
    pes.extend_from_slice(data);
    pes
}
