//! Annex-B NAL unit reassembly over demuxed PES payload bytes

use bytes::{Buf, Bytes, BytesMut};
use tracing::{trace, warn};
use crate::constants::{MAX_NALU_SIZE, NAL_HEADER_SIZE, PES_START_CODE};
use crate::error::{CaptionError, Result};
use crate::parsers::utils::find_start_code;
use crate::types::Status;

/// One complete NAL unit, still carrying its `00 00 01` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    data: Bytes,
}

impl NalUnit {
    pub fn header(&self) -> u8 {
        self.data[NAL_HEADER_SIZE - 1]
    }

    /// `nal_unit_type` for H.264 (low 5 bits of the header)
    pub fn nal_type(&self) -> u8 {
        self.header() & 0x1F
    }

    /// Escaped bytes following the header, up to the next start code
    pub fn payload(&self) -> &[u8] {
        &self.data[NAL_HEADER_SIZE..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() <= NAL_HEADER_SIZE
    }
}

/// Growable byte buffer that hands out NAL units once the next start code is seen.
///
/// The accumulator always keeps the start code of the NAL currently being filled at
/// its head; a unit is complete only when the following start code arrives.
#[derive(Debug, Default)]
pub struct NalAccumulator {
    buf: BytesMut,
    overflowed: bool,
}

impl NalAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends payload bytes. Exceeding [`MAX_NALU_SIZE`] is fatal: the accumulator
    /// refuses every later push.
    pub fn push(&mut self, data: &[u8]) -> Result<()> {
        let size = self.buf.len() + data.len();
        if self.overflowed || size > MAX_NALU_SIZE {
            if !self.overflowed {
                warn!(size, limit = MAX_NALU_SIZE, "NAL buffer overflow, stream halted");
            }
            self.overflowed = true;
            return Err(CaptionError::BufferOverflow { size, limit: MAX_NALU_SIZE });
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Splits off the next complete NAL unit, if the buffer holds one.
    ///
    /// Bytes that can not start a unit (junk before the first start code, the
    /// leading zero of a 4-byte start code) are dropped along the way.
    pub fn next_nal(&mut self) -> Option<NalUnit> {
        loop {
            let scpos = find_start_code(&self.buf);
            if scpos == 0 {
                return None;
            }
            if scpos <= NAL_HEADER_SIZE {
                trace!(skipped = scpos, "resync on start code");
                self.buf.advance(scpos);
                continue;
            }
            let data = self.buf.split_to(scpos).freeze();
            if !data.starts_with(&PES_START_CODE) {
                trace!(skipped = data.len(), "discarding bytes before first start code");
                continue;
            }
            return Some(NalUnit { data });
        }
    }

    pub fn status(&self) -> Status {
        if self.overflowed { Status::Error } else { Status::Ok }
    }

    pub fn is_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Bytes waiting for the next start code
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}
