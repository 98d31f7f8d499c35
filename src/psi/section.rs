// psi/section.rs
//! PSI section assembly across TS packets and CRC-32 (MPEG-2) validation.

use crc::{Crc, CRC_32_MPEG_2};

/// Header fields of a long-form section. Returned by [`SectionReader::new`].
pub struct SectionReader<'a> {
    pub table_id:      u8,
    pub version:       u8,
    pub current_next:  bool,
    pub section_number:u8,
    pub last_section:  u8,
    pub table_id_ext:  u16,
    pub body:          &'a [u8],   // bytes between fixed header & CRC
}

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

impl<'a> SectionReader<'a> {
    /// Validates length and CRC-32 of one complete section (no pointer field).
    pub fn new(section: &'a [u8]) -> anyhow::Result<Self> {
        if section.len() < 12 { anyhow::bail!("short section") }

        let table_id = section[0];
        let sec_len  = ((section[1] & 0x0F) as usize) << 8 | section[2] as usize;
        if sec_len < 9 { anyhow::bail!("invalid section_length") }
        let end      = 3 + sec_len;
        if end > section.len() { anyhow::bail!("truncated section") }

        // header + body + CRC runs through the register to zero
        if CRC_MPEG.checksum(&section[..end]) != 0 {
            anyhow::bail!("CRC-32 mismatch");
        }

        Ok(Self {
            table_id,
            version:       (section[5] & 0x3E) >> 1,
            current_next:  section[5] & 0x01 != 0,
            section_number:section[6],
            last_section:  section[7],
            table_id_ext:  u16::from_be_bytes([section[3], section[4]]),
            body:          &section[8 .. end-4],
        })
    }
}

/// Reassembles sections of one PID from consecutive TS payloads.
#[derive(Default)]
pub struct SectionCollector {
    buf:     Vec<u8>,
    started: bool,
}

impl SectionCollector {
    /// Feeds one packet payload and returns every section it completed.
    pub fn push(&mut self, unit_start: bool, payload: &[u8]) -> Vec<Vec<u8>> {
        let mut done = Vec::new();
        let mut data = payload;

        if unit_start {
            let Some((&pointer, rest)) = payload.split_first() else { return done };
            let pointer = pointer as usize;
            if pointer > rest.len() {
                self.reset();
                return done;
            }
            if self.started {
                // tail of the section begun in an earlier packet
                self.buf.extend_from_slice(&rest[..pointer]);
                self.drain(&mut done);
            }
            self.buf.clear();
            self.started = true;
            data = &rest[pointer..];
        } else if !self.started {
            return done;
        }

        self.buf.extend_from_slice(data);
        self.drain(&mut done);
        done
    }

    pub fn reset(&mut self) {
        self.buf.clear();
        self.started = false;
    }

    fn drain(&mut self, done: &mut Vec<Vec<u8>>) {
        loop {
            match self.buf.first() {
                None => return,
                Some(0xFF) => {
                    // stuffing until the next unit start
                    self.reset();
                    return;
                }
                Some(_) => {}
            }
            if self.buf.len() < 3 { return }
            let len = 3 + (((self.buf[1] & 0x0F) as usize) << 8 | self.buf[2] as usize);
            if self.buf.len() < len { return }
            done.push(self.buf.drain(..len).collect());
        }
    }
}

#[cfg(test)]
pub(crate) fn finish_section(mut section: Vec<u8>) -> Vec<u8> {
    let sec_len = section.len() - 3 + 4;
    section[1] = (section[1] & 0xF0) | ((sec_len >> 8) as u8 & 0x0F);
    section[2] = sec_len as u8;
    let crc = CRC_MPEG.checksum(&section);
    section.extend_from_slice(&crc.to_be_bytes());
    section
}
