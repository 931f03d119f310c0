//! Error taxonomy shared by every pipeline stage

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptionError {
    /// Transport packets must be exactly 188 bytes
    #[error("invalid transport packet size: {size} bytes")]
    InvalidPacketSize { size: usize },

    /// NAL accumulator would exceed its hard cap
    #[error("NAL buffer overflow: {size} bytes exceeds limit of {limit}")]
    BufferOverflow { size: usize, limit: usize },

    /// SEI type/size encoding or payload cut short
    #[error("truncated SEI message: needed {needed} bytes, {available} available")]
    TruncatedSei { needed: usize, available: usize },

    /// T.35 header or user data cut short
    #[error("truncated CEA-708 user data: needed {needed} bytes, {available} available")]
    TruncatedCea708 { needed: usize, available: usize },

    #[error("EIA-608 parity error in code 0x{code:04X}")]
    ParityError { code: u16 },

    #[error("unsupported CEA-708 user_data_type_code {code}")]
    UnsupportedUserDataType { code: u8 },

    #[error("reorder buffer full ({capacity} pending units)")]
    ReorderOverflow { capacity: usize },

    #[error("invalid PSI section: {0}")]
    InvalidSection(String),
}

impl CaptionError {
    /// Fatal errors end processing for the stream; everything else drops one unit of work.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CaptionError::BufferOverflow { .. } | CaptionError::InvalidPacketSize { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CaptionError>;
