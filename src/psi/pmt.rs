use crate::constants::{STREAM_IDENTIFIER_DESCRIPTOR, TABLE_ID_PMT};
use crate::psi::section::SectionReader;

/// ─────────── PMT ───────────
#[derive(Clone, Debug, PartialEq)]
pub struct PmtSection {
    pub version:        u8,
    pub program_number: u16,
    pub pcr_pid:        u16,
    pub streams:        Vec<StreamInfo>,
}
#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub stream_type:   u8,
    pub elementary_pid:u16,
    /// From the stream identifier descriptor, when present
    pub component_tag: Option<u8>,
}

pub fn parse_pmt(section:&[u8]) -> anyhow::Result<PmtSection> {
    let sec = SectionReader::new(section)?;
    if sec.table_id != TABLE_ID_PMT { anyhow::bail!("not PMT"); }
    let b = sec.body;
    if b.len() < 4 { anyhow::bail!("short PMT body"); }

    let pcr_pid       = (((b[0] & 0x1F) as u16) << 8) | (b[1] as u16);
    let prog_info_len = (((b[2] & 0x0F) as usize) << 8) | (b[3] as usize);
    let mut idx       = 4 + prog_info_len;          // program descriptors

    let mut streams = Vec::new();
    while idx + 5 <= b.len() {
        let stype = b[idx];
        let pid   = (((b[idx+1] & 0x1F) as u16) << 8) | (b[idx+2] as u16);
        let eslen = (((b[idx+3] & 0x0F) as usize) << 8) | (b[idx+4] as usize);
        let end   = idx + 5 + eslen;
        if end > b.len() { anyhow::bail!("ES descriptors overrun section"); }
        streams.push(StreamInfo{
            stream_type:stype,
            elementary_pid:pid,
            component_tag:component_tag(&b[idx+5..end]),
        });
        idx = end;
    }

    Ok(PmtSection{ version:sec.version,
                   program_number:sec.table_id_ext,
                   pcr_pid,
                   streams })
}

fn component_tag(mut descriptors: &[u8]) -> Option<u8> {
    while let [tag, len, rest @ ..] = descriptors {
        let len = *len as usize;
        if len > rest.len() { return None }
        if *tag == STREAM_IDENTIFIER_DESCRIPTOR && len >= 1 {
            return Some(rest[0]);
        }
        descriptors = &rest[len..];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::section::finish_section;

    #[test]
    fn reads_component_tags() {
        let sec = finish_section(vec![
            0x02, 0xB0, 0x00, 0x05, 0xC8, 0xC1, 0x00, 0x00,
            0xE1, 0x00, 0xF0, 0x00,
            // H.264 video, component tag 0x00
            0x1B, 0xE1, 0x00, 0xF0, 0x03, 0x52, 0x01, 0x00,
            // caption, component tag 0x30 after an unrelated descriptor
            0x06, 0xE1, 0x30, 0xF0, 0x06, 0xFD, 0x01, 0x00, 0x52, 0x01, 0x30,
            // no descriptors
            0x0F, 0xE1, 0x10, 0xF0, 0x00,
        ]);
        let pmt = parse_pmt(&sec).unwrap();
        assert_eq!(pmt.program_number, 0x05C8);
        assert_eq!(pmt.pcr_pid, 0x0100);
        assert_eq!(pmt.streams.len(), 3);
        assert_eq!(pmt.streams[1], StreamInfo { stream_type: 0x06, elementary_pid: 0x0130, component_tag: Some(0x30) });
        assert_eq!(pmt.streams[2].component_tag, None);
    }
}
