//! Transport-stream demultiplexing down to the caption-bearing video PES payload

use tracing::{debug, trace, warn};
use crate::constants::*;
use crate::error::{CaptionError, Result};
use crate::parsers::utils::parse_pts;
use crate::psi::{parse_pat, parse_pmt};

/// PIDs discovered so far and the last PES timestamps, in 90 kHz ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportState {
    pub pmt_pid: Option<u16>,
    pub cc_pid: Option<u16>,
    pub stream_type: Option<u8>,
    pub pts: u64,
    pub dts: u64,
}

/// Elementary-stream bytes of one caption-PID packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload<'a> {
    pub data: &'a [u8],
    /// Packet started a PES packet that carried timestamps
    pub timestamps_updated: bool,
}

#[derive(Debug, Default)]
pub struct TransportDemuxer {
    state: TransportState,
    verify_crc: bool,
}

impl TransportDemuxer {
    pub fn new(verify_crc: bool) -> Self {
        Self { state: TransportState::default(), verify_crc }
    }

    pub fn state(&self) -> &TransportState {
        &self.state
    }

    pub fn pmt_pid(&self) -> Option<u16> {
        self.state.pmt_pid
    }

    pub fn caption_pid(&self) -> Option<u16> {
        self.state.cc_pid
    }

    pub fn stream_type(&self) -> Option<u8> {
        self.state.stream_type
    }

    pub fn pts_seconds(&self) -> f64 {
        self.state.pts as f64 / MPEG_TIMEBASE
    }

    pub fn dts_seconds(&self) -> f64 {
        self.state.dts as f64 / MPEG_TIMEBASE
    }

    /// Composition offset, PTS minus DTS
    pub fn cts_seconds(&self) -> f64 {
        (self.state.pts as i64 - self.state.dts as i64) as f64 / MPEG_TIMEBASE
    }

    /// Processes one transport packet.
    ///
    /// Returns `Some` with the elementary-stream bytes when the packet belongs to the
    /// caption PID, `None` for tables, other PIDs and payload-less packets.
    pub fn parse_packet<'a>(&mut self, chunk: &'a [u8]) -> Result<Option<Payload<'a>>> {
        if chunk.len() != TS_PACKET_SIZE {
            return Err(CaptionError::InvalidPacketSize { size: chunk.len() });
        }
        if chunk[0] != TS_SYNC_BYTE {
            trace!(sync = chunk[0], "unexpected sync byte");
        }

        let pid = (((chunk[1] & 0x1F) as u16) << 8) | (chunk[2] as u16);
        let payload_unit_start = chunk[1] & 0x40 != 0;
        let has_adaptation = chunk[3] & 0x20 != 0;
        let has_payload = chunk[3] & 0x10 != 0;
        let mut payload_offset = 4usize;

        if has_adaptation {
            payload_offset += 1 + chunk[4] as usize;
        }
        if !has_payload || payload_offset >= TS_PACKET_SIZE {
            return Ok(None);
        }
        let payload = &chunk[payload_offset..];

        // PAT
        if pid == PAT_PID {
            if payload_unit_start {
                self.on_pat(payload);
            }
            return Ok(None);
        }

        // PMT
        if Some(pid) == self.state.pmt_pid {
            if payload_unit_start {
                self.on_pmt(pid, payload);
            }
            return Ok(None);
        }

        if Some(pid) != self.state.cc_pid {
            return Ok(None);
        }

        if !payload_unit_start {
            return Ok(Some(Payload { data: payload, timestamps_updated: false }));
        }
        Ok(self.on_pes_start(pid, payload))
    }

    fn on_pat(&mut self, payload: &[u8]) {
        let pat = match parse_pat(payload, self.verify_crc) {
            Ok(pat) => pat,
            Err(e) => {
                warn!(error = %e, "PAT dropped");
                return;
            }
        };
        if let Some(pmt_pid) = pat.first_pmt_pid(self.verify_crc) {
            if self.state.pmt_pid != Some(pmt_pid) {
                debug!(pmt_pid, "PMT PID from PAT");
            }
            self.state.pmt_pid = Some(pmt_pid);
        }
    }

    fn on_pmt(&mut self, pid: u16, payload: &[u8]) {
        let pmt = match parse_pmt(payload, self.verify_crc) {
            Ok(pmt) => pmt,
            Err(e) => {
                warn!(pid, error = %e, "PMT dropped");
                return;
            }
        };
        if !pmt.current_next {
            return;
        }
        if let Some(stream) = pmt.caption_stream() {
            if self.state.cc_pid != Some(stream.elementary_pid) {
                debug!(pid = stream.elementary_pid, stream_type = stream.stream_type, "caption stream selected");
            }
            self.state.cc_pid = Some(stream.elementary_pid);
            self.state.stream_type = Some(stream.stream_type);
        }
    }

    /// PES header: PTS/DTS flags at byte 7, header length at byte 8, PTS at 9, DTS at 14.
    fn on_pes_start<'a>(&mut self, pid: u16, payload: &'a [u8]) -> Option<Payload<'a>> {
        if payload.len() < PES_FIXED_HEADER_LEN || !payload.starts_with(&PES_START_CODE) {
            warn!(pid, "PES start without start code");
            return None;
        }

        let flags = payload[7];
        let es_offset = PES_FIXED_HEADER_LEN + payload[8] as usize;
        let mut timestamps_updated = false;

        if flags & 0x80 != 0 {
            if let Some(pts) = parse_pts(&payload[PES_FIXED_HEADER_LEN..]) {
                let dts = if flags & 0x40 != 0 {
                    payload.get(14..).and_then(parse_pts).unwrap_or(pts)
                } else {
                    pts
                };
                self.state.pts = pts;
                self.state.dts = dts;
                timestamps_updated = true;
                trace!(pid, pts, dts, "PES timestamps");
            }
        }

        if es_offset > payload.len() {
            warn!(pid, es_offset, "PES header runs past packet");
            return None;
        }
        Some(Payload { data: &payload[es_offset..], timestamps_updated })
    }
}
