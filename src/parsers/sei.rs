//! SEI payload list: `0xFF`-continuation type/size pairs followed by the payload bytes

use crate::error::{CaptionError, Result};

/// H.264 SEI payload kinds (Annex D). Values past the table map to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeiMessageType {
    BufferingPeriod,
    PicTiming,
    PanScanRect,
    FillerPayload,
    UserDataRegisteredItuTT35,
    UserDataUnregistered,
    RecoveryPoint,
    DecRefPicMarkingRepetition,
    SparePic,
    SceneInfo,
    SubSeqInfo,
    SubSeqLayerCharacteristics,
    SubSeqCharacteristics,
    FullFrameFreeze,
    FullFrameFreezeRelease,
    FullFrameSnapshot,
    ProgressiveRefinementSegmentStart,
    ProgressiveRefinementSegmentEnd,
    MotionConstrainedSliceGroupSet,
    FilmGrainCharacteristics,
    DeblockingFilterDisplayPreference,
    StereoVideoInfo,
    Unknown(u32),
}

impl From<u32> for SeiMessageType {
    fn from(v: u32) -> Self {
        use SeiMessageType::*;
        match v {
            0 => BufferingPeriod,
            1 => PicTiming,
            2 => PanScanRect,
            3 => FillerPayload,
            4 => UserDataRegisteredItuTT35,
            5 => UserDataUnregistered,
            6 => RecoveryPoint,
            7 => DecRefPicMarkingRepetition,
            8 => SparePic,
            9 => SceneInfo,
            10 => SubSeqInfo,
            11 => SubSeqLayerCharacteristics,
            12 => SubSeqCharacteristics,
            13 => FullFrameFreeze,
            14 => FullFrameFreezeRelease,
            15 => FullFrameSnapshot,
            16 => ProgressiveRefinementSegmentStart,
            17 => ProgressiveRefinementSegmentEnd,
            18 => MotionConstrainedSliceGroupSet,
            19 => FilmGrainCharacteristics,
            20 => DeblockingFilterDisplayPreference,
            21 => StereoVideoInfo,
            other => Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeiMessage {
    pub payload_type: u32,
    pub payload: Vec<u8>,
}

impl SeiMessage {
    pub fn new(payload_type: u32, payload: impl Into<Vec<u8>>) -> Self {
        Self { payload_type, payload: payload.into() }
    }

    pub fn kind(&self) -> SeiMessageType {
        SeiMessageType::from(self.payload_type)
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// Messages of one SEI NAL unit, in encounter order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sei {
    pub timestamp: f64,
    pub messages: Vec<SeiMessage>,
}

/// Reads one `0xFF`-continued value, advancing `pos`.
fn read_varint(data: &[u8], pos: &mut usize) -> Result<u32> {
    let mut value = 0u32;
    loop {
        let Some(&byte) = data.get(*pos) else {
            return Err(CaptionError::TruncatedSei { needed: *pos + 1, available: data.len() });
        };
        *pos += 1;
        value = value.saturating_add(byte as u32);
        if byte != 0xFF {
            return Ok(value);
        }
    }
}

/// Stop byte plus any zero bytes left over from a 4-byte start code.
fn is_trailing_bits(rest: &[u8]) -> bool {
    matches!(rest.split_first(), Some((&0x80, zeros)) if zeros.iter().all(|&b| b == 0))
}

fn write_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 255 {
        out.push(0xFF);
        value -= 255;
    }
    out.push(value as u8);
}

impl Sei {
    pub fn new(timestamp: f64) -> Self {
        Self { timestamp, messages: Vec::new() }
    }

    /// Appends every message found in `rbsp`.
    ///
    /// Parsing continues while at least two bytes remain and stops at the RBSP trailing
    /// bits (`0x80` followed only by zero bytes). On truncation the messages decoded so
    /// far are kept and the error returned.
    pub fn parse(&mut self, rbsp: &[u8]) -> Result<()> {
        let mut pos = 0usize;
        while rbsp.len().saturating_sub(pos) >= 2 && !is_trailing_bits(&rbsp[pos..]) {
            let payload_type = read_varint(rbsp, &mut pos)?;
            let size = read_varint(rbsp, &mut pos)? as usize;
            let end = pos + size;
            if end > rbsp.len() {
                return Err(CaptionError::TruncatedSei { needed: end, available: rbsp.len() });
            }
            self.messages.push(SeiMessage::new(payload_type, &rbsp[pos..end]));
            pos = end;
        }
        Ok(())
    }

    /// Convenience wrapper around [`Sei::parse`] for a fresh message list.
    pub fn from_rbsp(rbsp: &[u8], timestamp: f64) -> Result<Self> {
        let mut sei = Sei::new(timestamp);
        sei.parse(rbsp)?;
        Ok(sei)
    }

    /// Encodes the messages back into RBSP form, terminated by the `0x80` stop byte.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.messages.iter().map(|m| m.payload.len() + 4).sum::<usize>() + 1,
        );
        for msg in &self.messages {
            write_varint(&mut out, msg.payload_type);
            write_varint(&mut out, msg.payload.len() as u32);
            out.extend_from_slice(&msg.payload);
        }
        out.push(0x80);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
