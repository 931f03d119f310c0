use crate::error::{CaptionError, Result};
use crate::psi::section::SectionReader;

/// ─────────── PAT ───────────
#[derive(Debug, Clone)]
pub struct PatSection {
    pub transport_stream_id: u16,
    pub version:      u8,
    pub current_next: bool,
    pub programs:     Vec<PatEntry>,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatEntry {
    pub program_number: u16,
    /// PMT PID, or the network PID when `program_number` is 0
    pub pmt_pid:        u16,
}

impl PatSection {
    /// PMT PID of the first program. Validated sections skip the network entry;
    /// unvalidated ones take the first entry as it stands.
    pub fn first_pmt_pid(&self, skip_network: bool) -> Option<u16> {
        self.programs
            .iter()
            .find(|e| !skip_network || e.program_number != 0)
            .map(|e| e.pmt_pid)
    }
}

pub fn parse_pat(payload:&[u8], verify_crc: bool) -> Result<PatSection> {
    let sec = SectionReader::new(payload, verify_crc)?;
    if sec.table_id != 0x00 { return Err(CaptionError::InvalidSection("not PAT".into())); }

    let mut idx = 0;
    let mut programs = Vec::new();
    while idx + 4 <= sec.body.len() {
        let pn  = u16::from_be_bytes([sec.body[idx], sec.body[idx+1]]);
        let pid = (((sec.body[idx+2] & 0x1F) as u16) << 8) | (sec.body[idx+3] as u16);
        idx += 4;
        programs.push(PatEntry{ program_number:pn, pmt_pid:pid });
    }
    Ok(PatSection{ transport_stream_id: sec.extension, version:sec.version, current_next:sec.current_next, programs })
}
