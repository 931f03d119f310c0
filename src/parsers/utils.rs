//! Bit-field readers for PES timestamps and Annex-B byte streams

/// Decodes the 33-bit PTS/DTS packed into 5 bytes (marker bits dropped).
///
/// Returns `None` when fewer than 5 bytes are available.
pub fn parse_pts(data: &[u8]) -> Option<u64> {
    let p = data.get(..5)?;
    Some(((p[0] as u64 & 0x0E) << 29)
        |  ((p[1] as u64) << 22)
        | (((p[2] as u64 & 0xFE) >> 1) << 15)
        |  ((p[3] as u64) << 7)
        |  ((p[4] as u64) >> 1))
}

/// Offset of the first `00 00 01` start code whose bytes all lie at or after index 1.
///
/// The scan keeps a rolling 32-bit window and compares its upper 24 bits against
/// `0x000001`, so the result is the index of the first `00`. A start code at index 0 is
/// never reported. Returns 0 when no start code is found.
pub fn find_start_code(data: &[u8]) -> usize {
    let mut window: u32 = 0xFFFF_FFFF;
    for (i, &byte) in data.iter().enumerate().skip(1) {
        window = (window << 8) | byte as u32;
        if window & 0xFFFF_FF00 == 0x0000_0100 {
            return i - 3;
        }
    }
    0
}

/// Offset of the first emulation-prevention byte (`03` after `00 00`), or `data.len()`.
pub fn find_emulation_prevention_byte(data: &[u8]) -> usize {
    let mut offset = 2;
    while offset < data.len() {
        match data[offset] {
            // 0 0 X 3 -> X is zero, the escape can start right after
            0x00 => offset += 1,
            // 0 X 0 0 3
            0x03 if data[offset - 1] != 0 => offset += 2,
            // X 0 0 3
            0x03 if data[offset - 2] != 0 => offset += 1,
            0x03 => return offset,
            // 0 0 X 0 0 3 -> X is neither 0 nor 3
            _ => offset += 3,
        }
    }
    data.len()
}

/// Annex-B RBSP extraction: drops every `03` that follows `00 00`.
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(data.len());
    let mut rest = data;
    loop {
        let escape = find_emulation_prevention_byte(rest);
        rbsp.extend_from_slice(&rest[..escape]);
        if escape >= rest.len() {
            break;
        }
        rest = &rest[escape + 1..];
    }
    rbsp
}
