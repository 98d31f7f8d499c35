//! Caption demultiplexer: TS packets in, timestamped caption PES payloads out

pub mod packet;
pub mod pes;

use std::collections::{HashMap, HashSet};

use bytes::{Buf, BytesMut};

use crate::constants::*;
use crate::psi::{parse_pat, parse_pmt, PatSection, PmtSection, SectionCollector};
use crate::types::{CaptionKind, DemuxOptions, DemuxedUnit, OffsetReference};
pub use packet::TsPacket;
pub use pes::{PesAssembler, PesPacket};

/// Caption units kept back while waiting for the reference PTS
const MAX_HELD_UNITS: usize = 256;

/// Restartable demultiplexer; feed it arbitrary chunks of a transport stream.
pub struct Demuxer {
    options:        DemuxOptions,
    pending:        BytesMut,
    sections:       HashMap<u16, SectionCollector>,
    pat:            Option<PatSection>,
    pmt_map:        HashMap<u16, PmtSection>, // pmt_pid -> pmt
    program:        Option<u16>,
    caption_pids:   HashMap<u16, CaptionKind>,
    reference_pids: HashSet<u16>,
    pes:            HashMap<u16, PesAssembler>,
    offset:         Option<u64>,
    held:           Vec<(CaptionKind, PesPacket)>,
    out:            Vec<DemuxedUnit>,
}

impl Demuxer {
    pub fn new(options: DemuxOptions) -> Self {
        let offset = (options.offset == OffsetReference::Ignore).then_some(0);
        Self {
            options,
            pending: BytesMut::new(),
            sections: HashMap::new(),
            pat: None,
            pmt_map: HashMap::new(),
            program: None,
            caption_pids: HashMap::new(),
            reference_pids: HashSet::new(),
            pes: HashMap::new(),
            offset,
            held: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Program carrying the selected caption streams, once known
    pub fn program(&self) -> Option<u16> {
        self.program
    }

    /// Consumes a chunk; a trailing partial packet is kept for the next call.
    pub fn push(&mut self, data: &[u8]) -> Vec<DemuxedUnit> {
        self.pending.extend_from_slice(data);
        let mut buf = std::mem::take(&mut self.pending);

        let mut pos = 0usize;
        loop {
            match buf[pos..].iter().position(|&b| b == TS_SYNC_BYTE) {
                Some(skip) => pos += skip,
                None => {
                    pos = buf.len();
                    break;
                }
            }
            let next = pos + TS_PACKET_SIZE;
            if next > buf.len() {
                break;
            }
            // a sync byte inside garbage is confirmed by the one after it
            if next < buf.len() && buf[next] != TS_SYNC_BYTE {
                pos += 1;
                continue;
            }
            self.process_packet(&buf[pos..next]);
            pos = next;
        }

        buf.advance(pos);
        self.pending = buf;
        std::mem::take(&mut self.out)
    }

    /// Ends the stream: emits unbounded PES still buffered and anything held for the offset anchor.
    pub fn flush(&mut self) -> Vec<DemuxedUnit> {
        let mut pids: Vec<u16> = self.pes.keys().copied().collect();
        pids.sort_unstable();
        for pid in pids {
            if let Some(pes) = self.pes.get_mut(&pid).and_then(PesAssembler::flush) {
                self.on_pes(pid, pes);
            }
        }
        if self.offset.is_none() && !self.held.is_empty() {
            log::warn!("no reference PTS seen; anchoring {} caption unit(s) at 0", self.held.len());
            self.set_offset(0);
        }
        self.pending.clear();
        std::mem::take(&mut self.out)
    }

    /// Process a single TS packet
    pub fn process_packet(&mut self, chunk: &[u8]) {
        let Some(pkt) = TsPacket::parse(chunk) else { return };
        if pkt.pid == NULL_PID || pkt.payload.is_empty() {
            return;
        }

        if pkt.pid == PAT_PID || self.pmt_map.contains_key(&pkt.pid) || self.is_announced_pmt(pkt.pid) {
            self.process_si_tables(&pkt);
        } else {
            self.process_elementary_streams(&pkt);
        }
    }

    fn is_announced_pmt(&self, pid: u16) -> bool {
        self.pat.as_ref().is_some_and(|p| p.programs.iter().any(|e| e.pmt_pid == pid))
    }

    fn process_si_tables(&mut self, pkt: &TsPacket) {
        let sections = self.sections.entry(pkt.pid).or_default().push(pkt.payload_unit_start, pkt.payload);
        for section in sections {
            if pkt.pid == PAT_PID {
                match parse_pat(&section) {
                    Ok(pat) => self.pat = Some(pat),
                    Err(e) => log::debug!("dropping PAT section: {e}"),
                }
            } else {
                match parse_pmt(&section) {
                    Ok(pmt) => self.apply_pmt(pkt.pid, pmt),
                    Err(e) => log::debug!("dropping PMT section on PID {:#06x}: {e}", pkt.pid),
                }
            }
        }
    }

    fn apply_pmt(&mut self, pid: u16, pmt: PmtSection) {
        if let Some(wanted) = self.options.program_number {
            if pmt.program_number != wanted { return }
        }
        if self.program.is_some_and(|p| p != pmt.program_number) {
            return;
        }

        let captions: HashMap<u16, CaptionKind> = pmt.streams.iter()
            .filter(|s| s.stream_type == STREAM_TYPE_PRIVATE_DATA)
            .filter_map(|s| Some((s.elementary_pid, CaptionKind::from_component_tag(s.component_tag?)?)))
            .collect();
        if captions.is_empty() && self.program.is_none() {
            self.pmt_map.insert(pid, pmt);
            return;
        }

        let (video, audio) = match self.options.offset {
            OffsetReference::Ignore => (false, false),
            OffsetReference::Video => (true, false),
            OffsetReference::Audio => (false, true),
            OffsetReference::VideoOrAudio => (true, true),
        };
        self.reference_pids = pmt.streams.iter()
            .filter(|s| (video && VIDEO_STREAM_TYPES.contains(&s.stream_type))
                     || (audio && AUDIO_STREAM_TYPES.contains(&s.stream_type)))
            .map(|s| s.elementary_pid)
            .collect();

        if self.program.is_none() {
            log::trace!("program {} carries caption PIDs {:?}", pmt.program_number, captions);
        }
        self.program = Some(pmt.program_number);
        self.caption_pids = captions;
        let (captions, references) = (&self.caption_pids, &self.reference_pids);
        self.pes.retain(|pid, _| captions.contains_key(pid) || references.contains(pid));
        let program = pmt.program_number;
        self.pmt_map.insert(pid, pmt);

        if self.offset.is_none() && self.reference_pids.is_empty() {
            log::warn!("program {program} has no {:?} stream; anchoring captions at 0", self.options.offset);
            self.set_offset(0);
        }
    }

    fn process_elementary_streams(&mut self, pkt: &TsPacket) {
        let wanted = self.caption_pids.contains_key(&pkt.pid)
            || (self.offset.is_none() && self.reference_pids.contains(&pkt.pid));
        if !wanted {
            return;
        }
        let done = self.pes.entry(pkt.pid).or_default().push(pkt.payload_unit_start, pkt.payload);
        for pes in done {
            self.on_pes(pkt.pid, pes);
        }
    }

    fn on_pes(&mut self, pid: u16, pes: PesPacket) {
        if let Some(&kind) = self.caption_pids.get(&pid) {
            match self.offset {
                Some(offset) => self.emit(kind, pes, offset),
                None => {
                    if self.held.len() >= MAX_HELD_UNITS {
                        log::debug!("reference PTS still missing, dropping the oldest held caption unit");
                        self.held.remove(0);
                    }
                    self.held.push((kind, pes));
                }
            }
        } else if self.reference_pids.contains(&pid) && self.offset.is_none() {
            if let Some(pts) = pes.pts {
                log::trace!("offset anchored at PTS {pts} from PID {pid:#06x}");
                self.set_offset(pts);
            }
        }
    }

    fn set_offset(&mut self, offset: u64) {
        self.offset = Some(offset);
        for (kind, pes) in std::mem::take(&mut self.held) {
            self.emit(kind, pes, offset);
        }
    }

    fn emit(&mut self, kind: CaptionKind, pes: PesPacket, offset: u64) {
        let pts = pes.pts.map_or(0.0, |t| normalize_timestamp(t, offset));
        let dts = pes.dts.map_or(pts, |t| normalize_timestamp(t, offset));
        self.out.push(DemuxedUnit { kind, pts, dts, payload: pes.data });
    }
}

/// Seconds since `offset`, taking the 33-bit rollover into account.
pub fn normalize_timestamp(raw: u64, offset: u64) -> f64 {
    let raw = raw % PTS_WRAP_THRESHOLD;
    let offset = offset % PTS_WRAP_THRESHOLD;
    ((PTS_WRAP_THRESHOLD + raw - offset) % PTS_WRAP_THRESHOLD) as f64 / PTS_CLOCK_HZ as f64
}
