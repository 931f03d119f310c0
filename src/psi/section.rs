// psi/section.rs
//! Generic PSI section reader with optional CRC-32 (MPEG-2) validation.

use crc::{Crc, CRC_32_MPEG_2};
use crate::error::{CaptionError, Result};

/// Returned by [`SectionReader::new`].
pub struct SectionReader<'a> {
    pub table_id:      u8,
    pub section_length:usize,
    pub version:       u8,
    pub current_next:  bool,
    pub section_number:u8,
    pub last_section:  u8,
    /// table_id_extension: program_number for PMT, transport_stream_id for PAT
    pub extension:     u16,
    pub body:          &'a [u8],   // bytes between fixed header & CRC
}

pub const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

fn invalid(msg: &str) -> CaptionError {
    CaptionError::InvalidSection(msg.to_string())
}

impl<'a> SectionReader<'a> {
    /// Splits a section that starts at a payload-unit start (pointer field first).
    ///
    /// With `verify` the declared length must fit the payload and the CRC-32 must match.
    /// Without it a section running past the packet is cut at the packet end.
    pub fn new(payload: &'a [u8], verify: bool) -> Result<Self> {
        if payload.is_empty() { return Err(invalid("payload empty")) }
        let pointer = payload[0] as usize;
        let start   = 1 + pointer;
        if payload.len() < start + 8 { return Err(invalid("short section")) }

        let table_id = payload[start];
        let sec_len  = ((payload[start+1] & 0x0F) as usize) << 8 | payload[start+2] as usize;
        if sec_len < 9 { return Err(invalid("invalid section_length")) }
        let mut end  = start + 3 + sec_len;
        if end > payload.len() {
            if verify { return Err(invalid("truncated section")) }
            end = payload.len();
        }

        if verify {
            let crc_calc = CRC_MPEG.checksum(&payload[start..end-4]);
            let crc_pkt  = u32::from_be_bytes([payload[end-4], payload[end-3], payload[end-2], payload[end-1]]);
            if crc_calc != crc_pkt {
                return Err(CaptionError::InvalidSection(
                    format!("CRC-32 mismatch: computed {crc_calc:08X}, carried {crc_pkt:08X}")));
            }
        }

        // a cut section may have lost its CRC; keep whatever body is there
        let body_end = end.saturating_sub(4).max(start + 8);

        Ok(Self {
            table_id,
            section_length: sec_len,
            version:       (payload[start+5] & 0x3E) >> 1,
            current_next:  payload[start+5] & 0x01 != 0,
            section_number:payload[start+6],
            last_section:  payload[start+7],
            extension:     u16::from_be_bytes([payload[start+3], payload[start+4]]),
            body:          &payload[start+8 .. body_end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat_section() -> Vec<u8> {
        let mut sec = vec![0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00, 0x00, 0x01, 0xE1, 0x00];
        let crc = CRC_MPEG.checksum(&sec);
        sec.extend_from_slice(&crc.to_be_bytes());
        let mut payload = vec![0x00];
        payload.extend(sec);
        payload.resize(184, 0xFF);
        payload
    }

    #[test]
    fn reads_header_fields() {
        let payload = pat_section();
        let sec = SectionReader::new(&payload, true).unwrap();
        assert_eq!(sec.table_id, 0x00);
        assert_eq!(sec.section_length, 13);
        assert_eq!(sec.extension, 1);
        assert!(sec.current_next);
        assert_eq!(sec.body, &[0x00, 0x01, 0xE1, 0x00]);
    }

    #[test]
    fn crc_mismatch_only_fails_when_verifying() {
        let mut payload = pat_section();
        payload[13] ^= 0xFF;
        assert!(matches!(SectionReader::new(&payload, true), Err(CaptionError::InvalidSection(_))));
        assert!(SectionReader::new(&payload, false).is_ok());
    }

    #[test]
    fn short_payload() {
        assert!(SectionReader::new(&[], false).is_err());
        assert!(SectionReader::new(&[0x00, 0x00, 0xB0], false).is_err());
    }
}
