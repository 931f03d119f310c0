//! Main packet processing logic

use tracing::{debug, trace, warn};
use crate::caption::{CaptionFrame, FrameSnapshot};
use crate::constants::{H264_SEI_PACKET, STREAM_TYPE_H264};
use crate::demux::TransportDemuxer;
use crate::error::{CaptionError, Result};
use crate::nal::{NalAccumulator, NalUnit};
use crate::parsers::cea708::Cea708Unit;
use crate::parsers::sei::{Sei, SeiMessageType};
use crate::parsers::utils::remove_emulation_prevention;
use crate::reorder::ReorderBuffer;
use crate::types::{OverflowPolicy, ProcessorConfig, Status};

/// Elementary-stream side of the pipeline: NAL reassembly, SEI and CEA-708 parsing,
/// reordering, and the hand-off of caption codes to a [`CaptionFrame`].
#[derive(Debug, Default)]
pub struct MpegBitstream {
    nal: NalAccumulator,
    reorder: ReorderBuffer,
    policy: OverflowPolicy,
    status: Status,
}

impl MpegBitstream {
    /// `policy` decides what a full reorder buffer does with the next unit.
    pub fn new(policy: OverflowPolicy) -> Self {
        Self { policy, ..Self::default() }
    }

    /// Status of the last [`MpegBitstream::parse`] call
    pub fn status(&self) -> Status {
        self.status
    }

    /// Units waiting for the decode clock
    pub fn pending_units(&self) -> usize {
        self.reorder.len()
    }

    pub fn pending_bytes(&self) -> usize {
        self.nal.pending()
    }

    /// Consumes one chunk of elementary-stream bytes.
    ///
    /// Units are stamped `dts + cts` and released to `frame` once their stamp is before
    /// `dts`. `on_ready` sees the frame every time a decoded code makes it ready.
    /// Only a NAL buffer overflow is returned as an error; everything else is folded
    /// into the returned status.
    pub fn parse<F>(
        &mut self,
        data: &[u8],
        stream_type: u8,
        dts: f64,
        cts: f64,
        frame: &mut CaptionFrame,
        mut on_ready: F,
    ) -> Result<Status>
    where
        F: FnMut(&CaptionFrame),
    {
        if let Err(e) = self.nal.push(data) {
            self.status = Status::Error;
            return Err(e);
        }

        let mut status = Status::Ok;
        while let Some(nal) = self.nal.next_nal() {
            trace!(nal_type = nal.nal_type(), len = nal.len(), "NAL");
            if stream_type != STREAM_TYPE_H264 || nal.nal_type() != H264_SEI_PACKET {
                continue;
            }
            status = status.merge(self.on_sei(&nal, dts, cts, frame, &mut on_ready));
        }
        self.status = status;
        Ok(status)
    }

    /// Releases every pending unit regardless of the decode clock.
    pub fn flush<F>(&mut self, frame: &mut CaptionFrame, mut on_ready: F) -> Status
    where
        F: FnMut(&CaptionFrame),
    {
        let mut status = Status::Ok;
        while let Some(unit) = self.reorder.pop_front() {
            status = status.merge(decode_unit(frame, &unit, &mut on_ready));
        }
        self.status = status;
        status
    }

    fn on_sei<F>(
        &mut self,
        nal: &NalUnit,
        dts: f64,
        cts: f64,
        frame: &mut CaptionFrame,
        on_ready: &mut F,
    ) -> Status
    where
        F: FnMut(&CaptionFrame),
    {
        let rbsp = remove_emulation_prevention(nal.payload());
        let mut sei = Sei::new(dts + cts);
        let mut status = Status::Ok;
        if let Err(e) = sei.parse(&rbsp) {
            warn!(error = %e, kept = sei.messages.len(), "SEI cut short");
            status = Status::Error;
        }

        for msg in sei.messages.iter().filter(|m| m.kind() == SeiMessageType::UserDataRegisteredItuTT35) {
            let unit = match Cea708Unit::parse(&msg.payload, sei.timestamp) {
                Ok(unit) => unit,
                Err(CaptionError::UnsupportedUserDataType { code }) => {
                    trace!(code, "not caption user data");
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "CEA-708 unit dropped");
                    status = Status::Error;
                    continue;
                }
            };
            debug!(ts = unit.timestamp, cc_count = unit.user_data.cc_count, "CEA-708 unit");

            if self.reorder.push(unit, self.policy).is_err() {
                status = Status::Error;
                continue;
            }
            status = status.merge(self.drain(dts, frame, on_ready));
        }
        status
    }

    /// Decodes head units stamped before `dts`; stops after a unit that errored.
    fn drain<F>(&mut self, dts: f64, frame: &mut CaptionFrame, on_ready: &mut F) -> Status
    where
        F: FnMut(&CaptionFrame),
    {
        let mut status = Status::Ok;
        while let Some(unit) = self.reorder.pop_before(dts) {
            let unit_status = decode_unit(frame, &unit, on_ready);
            status = status.merge(unit_status);
            if unit_status.is_error() {
                break;
            }
        }
        status
    }
}

/// Feeds a unit's field-1 codes to the frame. A bad code is dropped and the rest still decode.
fn decode_unit<F>(frame: &mut CaptionFrame, unit: &Cea708Unit, on_ready: &mut F) -> Status
where
    F: FnMut(&CaptionFrame),
{
    let mut status = Status::Ok;
    for cc in unit.field1_codes() {
        match frame.decode(cc, unit.timestamp) {
            Ok(Status::Ready) => {
                on_ready(&*frame);
                status = status.merge(Status::Ready);
            }
            Ok(s) => status = status.merge(s),
            Err(e) => {
                debug!(error = %e, ts = unit.timestamp, "caption code dropped");
                status = Status::Error;
            }
        }
    }
    status
}

/// Transport packets in, completed caption frames out
#[derive(Debug)]
pub struct CaptionProcessor {
    demux: TransportDemuxer,
    bitstream: MpegBitstream,
    frame: CaptionFrame,
    status: Status,
}

impl CaptionProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self {
            demux: TransportDemuxer::new(config.verify_psi_crc),
            bitstream: MpegBitstream::new(config.reorder_overflow),
            frame: CaptionFrame::new(),
            status: Status::Ok,
        }
    }

    pub fn demux(&self) -> &TransportDemuxer {
        &self.demux
    }

    pub fn bitstream(&self) -> &MpegBitstream {
        &self.bitstream
    }

    pub fn frame(&self) -> &CaptionFrame {
        &self.frame
    }

    /// Status of the last packet; `Ok` for packets that carried no caption-stream bytes
    pub fn status(&self) -> Status {
        self.status
    }

    /// Processes one 188-byte packet and returns the frames it completed.
    ///
    /// Fatal errors (wrong packet size, NAL buffer overflow) are returned; anything
    /// else only shows up in [`CaptionProcessor::status`].
    pub fn process_packet(&mut self, chunk: &[u8]) -> Result<Vec<FrameSnapshot>> {
        self.status = Status::Ok;
        let Some(payload) = self.demux.parse_packet(chunk)? else {
            return Ok(Vec::new());
        };

        let stream_type = self.demux.stream_type().unwrap_or(STREAM_TYPE_H264);
        let dts = self.demux.dts_seconds();
        let cts = self.demux.cts_seconds();

        let mut frames = Vec::new();
        self.status = self.bitstream.parse(
            payload.data,
            stream_type,
            dts,
            cts,
            &mut self.frame,
            |frame| frames.push(frame.snapshot()),
        )?;
        Ok(frames)
    }

    /// Drains units still held for reordering; call once the input has ended.
    pub fn finish(&mut self) -> Vec<FrameSnapshot> {
        let mut frames = Vec::new();
        self.status = self.bitstream.flush(&mut self.frame, |frame| frames.push(frame.snapshot()));
        frames
    }
}
