//! Hand-assembled transport streams for the integration tests
#![allow(dead_code)]

use crc::{Crc, CRC_32_MPEG_2};
use mpegts_captions::constants::{PAT_PID, TS_PACKET_SIZE, TS_SYNC_BYTE};
use mpegts_captions::parsers::{Cea708Unit, Sei, SeiMessage};

pub const PMT_PID: u16 = 0x100;
pub const VIDEO_PID: u16 = 0x101;
pub const FRAME_TICKS: u64 = 3003;

const CRC_MPEG: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// One packet; payloads shorter than 184 bytes are padded with adaptation-field stuffing.
pub fn ts_packet(pid: u16, pusi: bool, payload: &[u8]) -> Vec<u8> {
    assert!(payload.len() <= TS_PACKET_SIZE - 4);
    let stuffing = TS_PACKET_SIZE - 4 - payload.len();
    let mut pkt = vec![
        TS_SYNC_BYTE,
        ((pusi as u8) << 6) | ((pid >> 8) as u8 & 0x1F),
        pid as u8,
        if stuffing > 0 { 0x30 } else { 0x10 },
    ];
    if stuffing > 0 {
        pkt.push((stuffing - 1) as u8);
        if stuffing > 1 {
            pkt.push(0x00);
            pkt.resize(4 + stuffing, 0xFF);
        }
    }
    pkt.extend_from_slice(payload);
    debug_assert_eq!(pkt.len(), TS_PACKET_SIZE);
    pkt
}

fn section_packet(pid: u16, mut section: Vec<u8>) -> Vec<u8> {
    let crc = CRC_MPEG.checksum(&section);
    section.extend_from_slice(&crc.to_be_bytes());
    let mut payload = vec![0x00]; // pointer field
    payload.extend(section);
    payload.resize(TS_PACKET_SIZE - 4, 0xFF);
    ts_packet(pid, true, &payload)
}

pub fn pat_packet(pmt_pid: u16) -> Vec<u8> {
    section_packet(PAT_PID, vec![
        0x00, 0xB0, 0x0D, 0x00, 0x01, 0xC1, 0x00, 0x00,
        0x00, 0x01, 0xE0 | (pmt_pid >> 8) as u8, pmt_pid as u8,
    ])
}

pub fn pmt_packet(pmt_pid: u16, es_pid: u16, stream_type: u8) -> Vec<u8> {
    section_packet(pmt_pid, vec![
        0x02, 0xB0, 0x12, 0x00, 0x01, 0xC1, 0x00, 0x00,
        0xE0 | (es_pid >> 8) as u8, es_pid as u8, 0xF0, 0x00,
        stream_type, 0xE0 | (es_pid >> 8) as u8, es_pid as u8, 0xF0, 0x00,
    ])
}

fn timestamp_field(prefix: u8, ts: u64) -> [u8; 5] {
    [
        (prefix << 4) | (((ts >> 30) as u8 & 0x07) << 1) | 1,
        (ts >> 22) as u8,
        (((ts >> 15) as u8) << 1) | 1,
        (ts >> 7) as u8,
        ((ts as u8) << 1) | 1,
    ]
}

/// A video PES packet split over as many transport packets as it needs.
pub fn pes_packets(pid: u16, pts: u64, dts: u64, es: &[u8]) -> Vec<Vec<u8>> {
    let mut pes = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x80, 0xC0, 10];
    pes.extend_from_slice(&timestamp_field(0b0011, pts));
    pes.extend_from_slice(&timestamp_field(0b0001, dts));
    pes.extend_from_slice(es);

    pes.chunks(TS_PACKET_SIZE - 4)
        .enumerate()
        .map(|(i, chunk)| ts_packet(pid, i == 0, chunk))
        .collect()
}

/// Inserts an emulation-prevention byte wherever `00 00` is followed by a byte <= 3.
pub fn escape(rbsp: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(rbsp.len() + rbsp.len() / 2);
    let mut zeros = 0;
    for &b in rbsp {
        if zeros >= 2 && b <= 0x03 {
            out.push(0x03);
            zeros = 0;
        }
        out.push(b);
        zeros = if b == 0 { zeros + 1 } else { 0 };
    }
    out
}

fn build_access_unit(units: &[Cea708Unit], slice_start_code: &[u8]) -> Vec<u8> {
    let mut sei = Sei::new(0.0);
    for unit in units {
        sei.messages.push(SeiMessage::new(4, unit.render()));
    }
    let mut au = vec![0x00, 0x00, 0x00, 0x01, 0x09, 0xF0];
    au.extend_from_slice(&[0x00, 0x00, 0x01, 0x06]);
    au.extend(escape(&sei.render()));
    au.extend_from_slice(slice_start_code);
    au.extend_from_slice(&[0x41, 0x9A, 0x24, 0x6C]);
    au
}

/// Access-unit delimiter, an SEI NAL carrying one T.35 message per unit, then a slice.
pub fn access_unit(units: &[Cea708Unit]) -> Vec<u8> {
    build_access_unit(units, &[0x00, 0x00, 0x01])
}

/// Same as [`access_unit`], but the slice after the SEI starts with `00 00 00 01`.
pub fn access_unit_long_start_code(units: &[Cea708Unit]) -> Vec<u8> {
    build_access_unit(units, &[0x00, 0x00, 0x00, 0x01])
}

/// PAT and PMT followed by one PES per `(pts, dts, units)` entry
pub fn caption_stream(frames: &[(u64, u64, Vec<Cea708Unit>)]) -> Vec<Vec<u8>> {
    caption_stream_with(frames, access_unit)
}

pub fn caption_stream_with(
    frames: &[(u64, u64, Vec<Cea708Unit>)],
    au: fn(&[Cea708Unit]) -> Vec<u8>,
) -> Vec<Vec<u8>> {
    let mut packets = vec![pat_packet(PMT_PID), pmt_packet(PMT_PID, VIDEO_PID, 0x1B)];
    for (pts, dts, units) in frames {
        packets.extend(pes_packets(VIDEO_PID, *pts, *dts, &au(units)));
    }
    packets
}
