//! Constants for MPEG-TS demuxing and closed-caption extraction

/// MPEG-TS packet constants
pub const TS_PACKET_SIZE: usize = 188;
pub const TS_SYNC_BYTE: u8 = 0x47;
pub const PAT_PID: u16 = 0x0000;

/// PES packet constants
pub const PES_START_CODE: [u8; 3] = [0x00, 0x00, 0x01];
pub const PES_FIXED_HEADER_LEN: usize = 9;

/// PTS/DTS constants
pub const PTS_CLOCK_HZ: u64 = 90_000; // 90 kHz
pub const MPEG_TIMEBASE: f64 = PTS_CLOCK_HZ as f64;

/// Elementary stream types that may carry caption user data
pub const STREAM_TYPE_H262: u8 = 0x02;
pub const STREAM_TYPE_H264: u8 = 0x1B;
pub const STREAM_TYPE_H265: u8 = 0x24;

/// SEI carriers per codec. Only the H.264 one is parsed.
pub const H262_SEI_PACKET: u8 = 0xB2;
pub const H264_SEI_PACKET: u8 = 0x06;
pub const H265_SEI_PACKET: u8 = 0x27; // 0x28 is the suffix variant

/// Annex-B start code plus the one-byte H.264 NAL header
pub const NAL_HEADER_SIZE: usize = 4;

/// Hard cap on buffered, not yet delimited NAL bytes
pub const MAX_NALU_SIZE: usize = 6 * 1024 * 1024; // 6 MiB
/// Depth of the CEA-708 reorder ring
pub const MAX_REFERENCE_FRAMES: usize = 64;

/// ITU-T T.35 identifiers
pub const T35_COUNTRY_UNITED_STATES: u8 = 0xB5;
pub const T35_PROVIDER_DIRECTV: u16 = 0x002F;
pub const T35_PROVIDER_ATSC: u16 = 0x0031;
pub const ATSC_USER_IDENTIFIER: u32 = 0x4741_3934; // "GA94"
pub const CC_USER_DATA_TYPE_CODE: u8 = 3;
pub const MAX_CC_COUNT: usize = 32;

/// EIA-608 screen geometry
pub const SCREEN_ROWS: usize = 15;
pub const SCREEN_COLS: usize = 32;

/// EIA-608 padding word (two parity-encoded NULs)
pub const EIA608_PADDING: u16 = 0x8080;
