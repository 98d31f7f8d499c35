use crate::constants::TABLE_ID_PAT;
use crate::psi::section::SectionReader;

/// ─────────── PAT ───────────
#[derive(Clone, Debug, PartialEq)]
pub struct PatSection {
    pub version:      u8,
    pub current_next: bool,
    pub programs:     Vec<PatEntry>,
}
#[derive(Clone, Debug, PartialEq)]
pub struct PatEntry {
    pub program_number: u16,
    pub pmt_pid:        u16,
}

pub fn parse_pat(section:&[u8]) -> anyhow::Result<PatSection> {
    let sec = SectionReader::new(section)?;
    if sec.table_id != TABLE_ID_PAT { anyhow::bail!("not PAT"); }

    let programs = sec.body
        .chunks_exact(4)
        .filter_map(|e| {
            let pn  = u16::from_be_bytes([e[0], e[1]]);
            let pid = (((e[2] & 0x1F) as u16) << 8) | (e[3] as u16);
            // program 0 points at the NIT
            (pn != 0).then_some(PatEntry{ program_number:pn, pmt_pid:pid })
        })
        .collect();
    Ok(PatSection{ version:sec.version, current_next:sec.current_next, programs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::section::finish_section;

    #[test]
    fn skips_network_pid_entry() {
        let sec = finish_section(vec![
            0x00, 0xB0, 0x00, 0x7F, 0xE1, 0xC1, 0x00, 0x00,
            0x00, 0x00, 0xE0, 0x10,
            0x05, 0xC8, 0xF0, 0x31,
        ]);
        let pat = parse_pat(&sec).unwrap();
        assert_eq!(pat.programs, vec![PatEntry { program_number: 0x05C8, pmt_pid: 0x1031 }]);
    }
}
