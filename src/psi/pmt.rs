use crate::constants::{STREAM_TYPE_H262, STREAM_TYPE_H264, STREAM_TYPE_H265};
use crate::error::{CaptionError, Result};
use crate::psi::section::SectionReader;

/// ─────────── PMT ───────────
#[derive(Debug, Clone)]
pub struct PmtSection {
    pub version:        u8,
    pub current_next:   bool,
    pub program_number: u16,
    pub pcr_pid:        u16,
    pub streams:        Vec<StreamInfo>,
}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub stream_type:   u8,
    pub elementary_pid:u16,
}

impl StreamInfo {
    /// Video codecs whose user data can carry line-21 captions
    pub fn is_caption_carrier(&self) -> bool {
        matches!(self.stream_type, STREAM_TYPE_H262 | STREAM_TYPE_H264 | STREAM_TYPE_H265)
    }
}

impl PmtSection {
    pub fn caption_stream(&self) -> Option<StreamInfo> {
        self.streams.iter().copied().find(StreamInfo::is_caption_carrier)
    }
}

pub fn parse_pmt(payload:&[u8], verify_crc: bool) -> Result<PmtSection> {
    let sec = SectionReader::new(payload, verify_crc)?;
    if sec.table_id != 0x02 { return Err(CaptionError::InvalidSection("not PMT".into())); }
    let b = sec.body;
    if b.len() < 4 { return Err(CaptionError::InvalidSection("short PMT body".into())); }

    /* ── fixed header inside the body ── */
    let pcr_pid       = (((b[0] & 0x1F) as u16) << 8) | (b[1] as u16);
    let prog_info_len = (((b[2] & 0x0F) as usize) << 8) | (b[3] as usize);
    let mut idx       = 4 + prog_info_len;          // skip program descriptors

    /* ── ES loop ── */
    let mut streams = Vec::new();
    while idx + 5 <= b.len() {
        let stype = b[idx];
        let pid   = (((b[idx+1] & 0x1F) as u16) << 8) | (b[idx+2] as u16);
        let eslen = (((b[idx+3] & 0x0F) as usize) << 8) | (b[idx+4] as usize);
        streams.push(StreamInfo{ stream_type:stype, elementary_pid:pid });
        idx += 5 + eslen;                          // skip ES descriptors
    }

    Ok(PmtSection{ version:sec.version,
                   current_next:sec.current_next,
                   program_number:sec.extension,
                   pcr_pid,
                   streams })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::psi::section::CRC_MPEG;

    fn payload(streams: &[(u8, u16, &[u8])], current: bool) -> Vec<u8> {
        let es_len: usize = streams.iter().map(|s| 5 + s.2.len()).sum();
        let prog_info = [0x0E, 0x03, 0xC0, 0x00, 0x00];
        let sec_len = 9 + prog_info.len() + es_len + 4;
        let mut sec = vec![
            0x02, 0xB0 | (sec_len >> 8) as u8, sec_len as u8,
            0x00, 0x01, 0xC0 | current as u8, 0x00, 0x00,
            0xE1, 0x01, 0xF0, prog_info.len() as u8,
        ];
        sec.extend_from_slice(&prog_info);
        for &(st, pid, desc) in streams {
            sec.push(st);
            sec.extend_from_slice(&(0xE000 | pid).to_be_bytes());
            sec.extend_from_slice(&(0xF000 | desc.len() as u16).to_be_bytes());
            sec.extend_from_slice(desc);
        }
        let crc = CRC_MPEG.checksum(&sec);
        sec.extend_from_slice(&crc.to_be_bytes());
        let mut out = vec![0x00];
        out.extend(sec);
        out.resize(184, 0xFF);
        out
    }

    #[test]
    fn first_video_stream_carries_captions() {
        let none: &[u8] = &[];
        let stream_id_desc: &[u8] = &[0x52, 0x01, 0x00];
        let p = payload(&[(0x0F, 0x102, none), (0x1B, 0x101, stream_id_desc), (0x24, 0x103, none)], true);
        let pmt = parse_pmt(&p, true).unwrap();
        assert_eq!(pmt.program_number, 1);
        assert_eq!(pmt.pcr_pid, 0x101);
        assert!(pmt.current_next);
        assert_eq!(pmt.streams.len(), 3);
        assert_eq!(pmt.caption_stream(), Some(StreamInfo { stream_type: 0x1B, elementary_pid: 0x101 }));
    }

    #[test]
    fn no_video_stream() {
        let none: &[u8] = &[];
        let p = payload(&[(0x0F, 0x102, none), (0x81, 0x104, none)], false);
        let pmt = parse_pmt(&p, false).unwrap();
        assert!(!pmt.current_next);
        assert_eq!(pmt.caption_stream(), None);
    }
}
