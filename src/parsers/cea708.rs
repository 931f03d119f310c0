//! CEA-708 caption user data carried in `user_data_registered_itu_t_t35` SEI payloads

use bitstream_io::{BitRead, BitReader, BigEndian};
use bytes::{BufMut, BytesMut};
use crate::constants::*;
use crate::error::{CaptionError, Result};

/// ITU-T T.35 terminal provider code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum T35Provider {
    Atsc,
    DirecTv,
    Other(u16),
}

impl From<u16> for T35Provider {
    fn from(v: u16) -> Self {
        match v {
            T35_PROVIDER_ATSC => T35Provider::Atsc,
            T35_PROVIDER_DIRECTV => T35Provider::DirecTv,
            other => T35Provider::Other(other),
        }
    }
}

impl From<T35Provider> for u16 {
    fn from(p: T35Provider) -> u16 {
        match p {
            T35Provider::Atsc => T35_PROVIDER_ATSC,
            T35Provider::DirecTv => T35_PROVIDER_DIRECTV,
            T35Provider::Other(v) => v,
        }
    }
}

/// `cc_type` of a caption triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CcType {
    NtscCcField1 = 0,
    NtscCcField2 = 1,
    DtvccPacketData = 2,
    DtvccPacketStart = 3,
}

impl CcType {
    fn from_bits(v: u8) -> Self {
        match v & 0x03 {
            0 => CcType::NtscCcField1,
            1 => CcType::NtscCcField2,
            2 => CcType::DtvccPacketData,
            _ => CcType::DtvccPacketStart,
        }
    }
}

/// One `{marker, valid, type, cc_data_1/2}` triplet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcData {
    pub marker_bits: u8,
    pub valid: bool,
    pub cc_type: CcType,
    pub payload: u16,
}

/// Body of a type-3 (`cc_data`) user data structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub process_em_data: bool,
    pub process_cc_data: bool,
    pub additional_data: bool,
    /// Count announced in the header; `cc_data` may hold fewer when the payload is short
    pub cc_count: u8,
    pub em_data: u8,
    pub cc_data: Vec<CcData>,
}

impl Default for UserData {
    fn default() -> Self {
        Self {
            process_em_data: false,
            process_cc_data: true,
            additional_data: false,
            cc_count: 0,
            em_data: 0xFF,
            cc_data: Vec::new(),
        }
    }
}

/// One decoded T.35 payload and the presentation time its codes belong to
#[derive(Debug, Clone, PartialEq)]
pub struct Cea708Unit {
    pub country: u8,
    pub provider: T35Provider,
    pub user_identifier: u32,
    pub user_data_type_code: u8,
    pub directv_user_data_length: u8,
    pub user_data: UserData,
    pub timestamp: f64,
}

impl Cea708Unit {
    /// Empty ATSC `GA94` caption unit, ready for [`Cea708Unit::add_cc`].
    pub fn atsc(timestamp: f64) -> Self {
        Self {
            country: T35_COUNTRY_UNITED_STATES,
            provider: T35Provider::Atsc,
            user_identifier: ATSC_USER_IDENTIFIER,
            user_data_type_code: CC_USER_DATA_TYPE_CODE,
            directv_user_data_length: 0,
            user_data: UserData::default(),
            timestamp,
        }
    }

    /// Decodes a T.35 payload.
    ///
    /// Only `user_data_type_code` 3 carries captions; any other code fails with
    /// [`CaptionError::UnsupportedUserDataType`], which callers treat as a skip.
    pub fn parse(data: &[u8], timestamp: f64) -> Result<Self> {
        let truncated = |needed: usize| CaptionError::TruncatedCea708 { needed, available: data.len() };
        if data.len() < 3 {
            return Err(truncated(3));
        }

        let country = data[0];
        let provider = T35Provider::from(u16::from_be_bytes([data[1], data[2]]));
        let mut pos = 3usize;

        let mut user_identifier = 0u32;
        if provider == T35Provider::Atsc {
            let bytes = data.get(pos..pos + 4).ok_or(truncated(pos + 4))?;
            user_identifier = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
            pos += 4;
        }

        let mut user_data_type_code = 0u8;
        if matches!(provider, T35Provider::Atsc | T35Provider::DirecTv) {
            user_data_type_code = *data.get(pos).ok_or(truncated(pos + 1))?;
            pos += 1;
        }

        let mut directv_user_data_length = 0u8;
        if provider == T35Provider::DirecTv {
            directv_user_data_length = *data.get(pos).ok_or(truncated(pos + 1))?;
            pos += 1;
        }

        if user_data_type_code != CC_USER_DATA_TYPE_CODE {
            return Err(CaptionError::UnsupportedUserDataType { code: user_data_type_code });
        }
        if data.len() < pos + 2 {
            return Err(truncated(pos + 2));
        }

        Ok(Self {
            country,
            provider,
            user_identifier,
            user_data_type_code,
            directv_user_data_length,
            user_data: parse_user_data(&data[pos..]),
            timestamp,
        })
    }

    /// Appends a triplet, keeping `cc_count` in step. Returns false once 31 entries are held.
    pub fn add_cc(&mut self, valid: bool, cc_type: CcType, payload: u16) -> bool {
        let ud = &mut self.user_data;
        if ud.cc_data.len() >= 0x1F {
            return false;
        }
        ud.cc_data.push(CcData { marker_bits: 0x1F, valid, cc_type, payload });
        ud.cc_count = ud.cc_data.len() as u8;
        true
    }

    /// Valid field-1 (CC1/CC2) code words in transmission order.
    pub fn field1_codes(&self) -> impl Iterator<Item = u16> + '_ {
        self.user_data
            .cc_data
            .iter()
            .filter(|cc| cc.valid && cc.cc_type == CcType::NtscCcField1)
            .map(|cc| cc.payload)
    }

    /// Serializes the unit back into a T.35 payload.
    pub fn render(&self) -> Vec<u8> {
        let ud = &self.user_data;
        let mut out = BytesMut::with_capacity(10 + 3 * ud.cc_data.len());
        out.put_u8(self.country);
        out.put_u16(self.provider.into());
        if self.provider == T35Provider::Atsc {
            out.put_u32(self.user_identifier);
        }
        if matches!(self.provider, T35Provider::Atsc | T35Provider::DirecTv) {
            out.put_u8(self.user_data_type_code);
        }
        if self.provider == T35Provider::DirecTv {
            out.put_u8(self.directv_user_data_length);
        }

        let flags = (ud.process_em_data as u8) << 7
            | (ud.process_cc_data as u8) << 6
            | (ud.additional_data as u8) << 5
            | (ud.cc_data.len() as u8 & 0x1F);
        out.put_u8(flags);
        out.put_u8(ud.em_data);
        for cc in &ud.cc_data {
            out.put_u8((cc.marker_bits & 0x1F) << 3 | (cc.valid as u8) << 2 | cc.cc_type as u8);
            out.put_u16(cc.payload);
        }
        out.to_vec()
    }
}

/// Flag byte, em_data, then up to `cc_count` triplets. Stops quietly at the end of the data.
fn parse_user_data(data: &[u8]) -> UserData {
    let mut br = BitReader::endian(data, BigEndian);
    let mut ud = UserData::default();

    let header = (|| -> std::io::Result<()> {
        ud.process_em_data = br.read_bit()?;
        ud.process_cc_data = br.read_bit()?;
        ud.additional_data = br.read_bit()?;
        ud.cc_count = br.read::<5, u8>()?;
        ud.em_data = br.read::<8, u8>()?;
        Ok(())
    })();
    if header.is_err() {
        return ud;
    }

    for _ in 0..ud.cc_count.min(MAX_CC_COUNT as u8) {
        let triplet = (|| -> std::io::Result<CcData> {
            let marker_bits = br.read::<5, u8>()?;
            let valid = br.read_bit()?;
            let cc_type = CcType::from_bits(br.read::<2, u8>()?);
            let payload = br.read::<16, u16>()?;
            Ok(CcData { marker_bits, valid, cc_type, payload })
        })();
        match triplet {
            Ok(cc) => ud.cc_data.push(cc),
            Err(_) => break,
        }
    }
    ud
}
