//! TS packet header model

use crate::constants::{TS_PACKET_SIZE, TS_SYNC_BYTE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TsPacket<'a> {
    pub pid:                u16,
    pub payload_unit_start: bool,
    pub continuity_counter: u8,
    /// `adaptation_field_length`, 0 when the field is absent
    pub adaptation_length:  u8,
    /// PCR base (90 kHz) and extension
    pub pcr:                Option<(u64, u16)>,
    pub payload:            &'a [u8],
}

impl<'a> TsPacket<'a> {
    /// Parses one 188-byte packet; `None` for wrong sync, scrambled or malformed adaptation.
    pub fn parse(chunk: &'a [u8]) -> Option<Self> {
        if chunk.len() < TS_PACKET_SIZE || chunk[0] != TS_SYNC_BYTE {
            return None;
        }
        if chunk[1] & 0x80 != 0 {
            return None; // transport_error_indicator
        }

        let pid = (((chunk[1] & 0x1F) as u16) << 8) | (chunk[2] as u16);
        let payload_unit_start = chunk[1] & 0x40 != 0;
        let adaption_field_ctrl = (chunk[3] & 0x30) >> 4;
        let continuity_counter = chunk[3] & 0x0F;
        let mut payload_offset = 4usize;
        let mut adaptation_length = 0u8;
        let mut pcr = None;

        if adaption_field_ctrl & 0x02 != 0 {
            adaptation_length = chunk[4];
            payload_offset += 1 + adaptation_length as usize;
            if payload_offset > TS_PACKET_SIZE {
                return None;
            }
            if adaptation_length >= 7 && chunk[5] & 0x10 != 0 { // PCR_flag
                let p = &chunk[6..12];
                let base = ((p[0] as u64) << 25)
                        | ((p[1] as u64) << 17)
                        | ((p[2] as u64) << 9)
                        | ((p[3] as u64) << 1)
                        | ((p[4] as u64) >> 7);
                let ext = (((p[4] & 0x01) as u16) << 8) | (p[5] as u16);
                pcr = Some((base, ext));
            }
        }

        let payload = if adaption_field_ctrl & 0x01 != 0 {
            &chunk[payload_offset..TS_PACKET_SIZE]
        } else {
            &[]
        };

        Some(Self { pid, payload_unit_start, continuity_counter, adaptation_length, pcr, payload })
    }
}

#[cfg(test)]
pub(crate) fn build_packet(pid: u16, unit_start: bool, cc: u8, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= TS_PACKET_SIZE - 4);
    let mut pkt = Vec::with_capacity(TS_PACKET_SIZE);
    pkt.push(TS_SYNC_BYTE);
    pkt.push(((unit_start as u8) << 6) | ((pid >> 8) as u8 & 0x1F));
    pkt.push(pid as u8);
    let stuffing = TS_PACKET_SIZE - 4 - payload.len();
    if stuffing == 0 {
        pkt.push(0x10 | (cc & 0x0F));
    } else {
        pkt.push(0x30 | (cc & 0x0F));
        pkt.push((stuffing - 1) as u8);
        if stuffing > 1 {
            pkt.push(0x00);
            pkt.extend(std::iter::repeat_n(0xFF, stuffing - 2));
        }
    }
    pkt.extend_from_slice(payload);
    pkt
}
