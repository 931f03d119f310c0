//! EIA-608 line-21 code words: parity, classification and encoders
//!
//! A code word is two bytes, each carrying 7 data bits plus an odd-parity bit. The
//! classification masks below ignore the parity bits, so they apply to raw words.

pub mod charmap;

use crate::constants::{EIA608_PADDING, SCREEN_ROWS};

/* ── parity ── */

const fn odd_parity(b: u8) -> u8 {
    let b = b & 0x7F;
    if b.count_ones() % 2 == 0 { b | 0x80 } else { b }
}

/// Byte with its parity bit set correctly, for every input byte
pub static PARITY_TABLE: [u8; 256] = {
    let mut t = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        t[i] = odd_parity(i as u8);
        i += 1;
    }
    t
};

pub fn parity_byte(b: u8) -> u8 {
    PARITY_TABLE[b as usize]
}

pub fn parity_word(cc: u16) -> u16 {
    (parity_byte((cc >> 8) as u8) as u16) << 8 | parity_byte(cc as u8) as u16
}

pub fn parity_verify(cc: u16) -> bool {
    parity_word(cc) == cc
}

pub fn strip_parity(cc: u16) -> u16 {
    cc & 0x7F7F
}

/* ── code classes ── */

pub fn is_padding(cc: u16) -> bool {
    cc == EIA608_PADDING
}

pub fn is_basicna(cc: u16) -> bool {
    cc & 0x6000 != 0
}

pub fn is_preamble(cc: u16) -> bool {
    cc & 0x7040 == 0x1040
}

pub fn is_midrowchange(cc: u16) -> bool {
    cc & 0x7770 == 0x1120
}

pub fn is_specialna(cc: u16) -> bool {
    cc & 0x7770 == 0x1130
}

pub fn is_westeu(cc: u16) -> bool {
    cc & 0x7660 == 0x1220
}

pub fn is_control(cc: u16) -> bool {
    cc & 0x7670 == 0x1420 || cc & 0x7770 == 0x1720
}

pub fn is_xds(cc: u16) -> bool {
    cc & 0x7070 == 0 && cc & 0x0F0F != 0
}

/// Data channel bit: 0 for CC1/CC3, 1 for CC2/CC4
pub fn channel(cc: u16) -> u8 {
    ((cc & 0x0800) >> 11) as u8
}

/* ── styles ── */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    #[default]
    White = 0,
    Green = 1,
    Blue = 2,
    Cyan = 3,
    Red = 4,
    Yellow = 5,
    Magenta = 6,
    Italics = 7,
}

impl Style {
    pub fn from_bits(v: u16) -> Style {
        match v & 0x07 {
            0 => Style::White,
            1 => Style::Green,
            2 => Style::Blue,
            3 => Style::Cyan,
            4 => Style::Red,
            5 => Style::Yellow,
            6 => Style::Magenta,
            _ => Style::Italics,
        }
    }
}

/* ── control commands ── */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    TabOffset0,
    TabOffset1,
    TabOffset2,
    TabOffset3,
    ResumeCaptionLoading,
    Backspace,
    AlarmOff,
    AlarmOn,
    DeleteToEndOfRow,
    RollUp2,
    RollUp3,
    RollUp4,
    FlashOn,
    ResumeDirectCaptioning,
    TextRestart,
    ResumeTextDisplay,
    EraseDisplayMemory,
    CarriageReturn,
    EraseNonDisplayedMemory,
    EndOfCaption,
    /// Masked value outside the command table
    Other(u16),
}

impl Control {
    /// Command value with channel and field bits cleared
    pub fn code(self) -> u16 {
        use Control::*;
        match self {
            TabOffset0 => 0x1720,
            TabOffset1 => 0x1721,
            TabOffset2 => 0x1722,
            TabOffset3 => 0x1723,
            ResumeCaptionLoading => 0x1420,
            Backspace => 0x1421,
            AlarmOff => 0x1422,
            AlarmOn => 0x1423,
            DeleteToEndOfRow => 0x1424,
            RollUp2 => 0x1425,
            RollUp3 => 0x1426,
            RollUp4 => 0x1427,
            FlashOn => 0x1428,
            ResumeDirectCaptioning => 0x1429,
            TextRestart => 0x142A,
            ResumeTextDisplay => 0x142B,
            EraseDisplayMemory => 0x142C,
            CarriageReturn => 0x142D,
            EraseNonDisplayedMemory => 0x142E,
            EndOfCaption => 0x142F,
            Other(v) => v,
        }
    }

    fn from_code(v: u16) -> Control {
        use Control::*;
        match v {
            0x1720 => TabOffset0,
            0x1721 => TabOffset1,
            0x1722 => TabOffset2,
            0x1723 => TabOffset3,
            0x1420 => ResumeCaptionLoading,
            0x1421 => Backspace,
            0x1422 => AlarmOff,
            0x1423 => AlarmOn,
            0x1424 => DeleteToEndOfRow,
            0x1425 => RollUp2,
            0x1426 => RollUp3,
            0x1427 => RollUp4,
            0x1428 => FlashOn,
            0x1429 => ResumeDirectCaptioning,
            0x142A => TextRestart,
            0x142B => ResumeTextDisplay,
            0x142C => EraseDisplayMemory,
            0x142D => CarriageReturn,
            0x142E => EraseNonDisplayedMemory,
            0x142F => EndOfCaption,
            other => Other(other),
        }
    }

    /// Columns advanced by a tab offset command
    pub fn tab_offset(self) -> Option<usize> {
        match self {
            Control::TabOffset0 => Some(0),
            Control::TabOffset1 => Some(1),
            Control::TabOffset2 => Some(2),
            Control::TabOffset3 => Some(3),
            _ => None,
        }
    }
}

/// Decodes a control word into its command and data channel.
pub fn parse_control(cc: u16) -> (Control, u8) {
    let cmd = if cc & 0x0200 != 0 { cc & 0x177F } else { cc & 0x167F };
    (Control::from_code(cmd), channel(cc))
}

/* ── preamble / midrow ── */

/// Preamble row index -> screen row, -1 marks the unused slot
const ROW_MAP: [i8; 16] = [10, -1, 0, 1, 2, 3, 11, 12, 13, 14, 4, 5, 6, 7, 8, 9];
/// Screen row -> preamble row index
const ROW_INDEX: [u16; 16] = [2, 3, 4, 5, 10, 11, 12, 13, 14, 15, 0, 6, 7, 8, 9, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub row: usize,
    pub col: usize,
    pub style: Style,
    pub underline: bool,
    pub channel: u8,
}

/// Row/indent/style carried by a preamble address code, if its row slot is valid.
pub fn parse_preamble(cc: u16) -> Option<Preamble> {
    let row = ROW_MAP[(((0x0700 & cc) >> 7) | ((0x0020 & cc) >> 5)) as usize];
    if row < 0 {
        return None;
    }
    let (style, col) = if cc & 0x0010 != 0 {
        (Style::White, 4 * ((0x000E & cc) >> 1) as usize)
    } else {
        (Style::from_bits((0x000E & cc) >> 1), 0)
    };
    Some(Preamble {
        row: row as usize,
        col,
        style,
        underline: cc & 0x0001 != 0,
        channel: channel(cc),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Midrow {
    pub style: Style,
    pub underline: bool,
    pub channel: u8,
}

pub fn parse_midrow(cc: u16) -> Midrow {
    Midrow {
        style: Style::from_bits((0x000E & cc) >> 1),
        underline: cc & 0x0001 != 0,
        channel: channel(cc),
    }
}

/* ── classification ── */

/// Every code word falls into exactly one class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eia608Code {
    Padding,
    Control { control: Control, channel: u8 },
    BasicNa,
    SpecialNa,
    WestEu,
    Preamble(Preamble),
    Midrow(Midrow),
    Xds,
    Unknown,
}

impl Eia608Code {
    pub fn classify(cc: u16) -> Self {
        if is_padding(cc) {
            Eia608Code::Padding
        } else if is_control(cc) {
            let (control, channel) = parse_control(cc);
            Eia608Code::Control { control, channel }
        } else if is_basicna(cc) {
            Eia608Code::BasicNa
        } else if is_specialna(cc) {
            Eia608Code::SpecialNa
        } else if is_westeu(cc) {
            Eia608Code::WestEu
        } else if is_preamble(cc) {
            parse_preamble(cc).map_or(Eia608Code::Unknown, Eia608Code::Preamble)
        } else if is_midrowchange(cc) {
            Eia608Code::Midrow(parse_midrow(cc))
        } else if is_xds(cc) {
            Eia608Code::Xds
        } else {
            Eia608Code::Unknown
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Eia608Code::BasicNa | Eia608Code::SpecialNa | Eia608Code::WestEu)
    }
}

/* ── text ── */

/// Character-map slots for a text word: two for basic pairs, one otherwise.
pub fn to_index(cc: u16) -> (Option<usize>, Option<usize>) {
    let cc = strip_parity(cc);
    if is_basicna(cc) {
        let hi = (cc >> 8) as usize;
        let lo = (cc & 0x00FF) as usize;
        let c2 = (0x20..0x80).contains(&lo).then(|| lo - 0x20 + charmap::BASIC_NA_START);
        return (Some(hi - 0x20 + charmap::BASIC_NA_START), c2);
    }

    let cc = cc & 0xF7FF;
    let idx = match cc {
        0x1130..=0x113F => Some((cc - 0x1130) as usize + charmap::SPECIAL_NA_START),
        0x1220..=0x123F => Some((cc - 0x1220) as usize + charmap::WESTEU_SPANISH_START),
        0x1320..=0x133F => Some((cc - 0x1320) as usize + charmap::WESTEU_GERMAN_START),
        _ => None,
    };
    (idx, None)
}

/// Decoded characters of a text word, in display order.
pub fn to_chars(cc: u16) -> Vec<char> {
    let (a, b) = to_index(cc);
    [a, b].into_iter().flatten().filter_map(charmap::lookup).collect()
}

/* ── encoders ── */

/// Parity-encoded control word. `channel` bit 0 selects CC2/CC4, bit 1 selects field 2.
pub fn control_command(control: Control, channel: u8) -> u16 {
    let mut cc = control.code();
    if channel & 0x01 != 0 {
        cc |= 0x0800;
    }
    // tab offsets share 0x17 between fields
    if channel & 0x02 != 0 && control.tab_offset().is_none() {
        cc |= 0x0100;
    }
    parity_word(cc)
}

fn preamble_word(row: usize, channel: u8, x: u16, underline: bool) -> u16 {
    let r = ROW_INDEX[row.min(SCREEN_ROWS - 1)];
    let mut cc = 0x1040 | ((r << 7) & 0x0700) | ((r << 5) & 0x0020) | ((x << 1) & 0x001E);
    if channel & 0x01 != 0 {
        cc |= 0x0800;
    }
    if underline {
        cc |= 0x0001;
    }
    parity_word(cc)
}

/// Preamble addressing `row` with an indent of `col` rounded down to a multiple of 4.
pub fn row_column_preamble(row: usize, col: usize, channel: u8, underline: bool) -> u16 {
    preamble_word(row, channel, 0x08 | (col.min(31) / 4) as u16, underline)
}

/// Preamble addressing `row` at column 0 with `style`.
pub fn row_style_preamble(row: usize, channel: u8, style: Style, underline: bool) -> u16 {
    preamble_word(row, channel, style as u16, underline)
}

pub fn midrow_change(channel: u8, style: Style, underline: bool) -> u16 {
    let mut cc = 0x1120 | ((style as u16) << 1);
    if channel & 0x01 != 0 {
        cc |= 0x0800;
    }
    if underline {
        cc |= 0x0001;
    }
    parity_word(cc)
}

/// Parity-encoded word for a single character. Basic characters take the high byte
/// with a NUL partner; the rest use the special or extended two-byte forms.
pub fn from_char(c: char, channel: u8) -> Option<u16> {
    let idx = charmap::index_of(c)?;
    let chan = if channel & 0x01 != 0 { 0x0800 } else { 0 };
    let cc = match idx {
        i if i < charmap::SPECIAL_NA_START => ((i - charmap::BASIC_NA_START) as u16 + 0x20) << 8,
        i if i < charmap::WESTEU_SPANISH_START => 0x1130 + (i - charmap::SPECIAL_NA_START) as u16 | chan,
        i if i < charmap::WESTEU_GERMAN_START => 0x1220 + (i - charmap::WESTEU_SPANISH_START) as u16 | chan,
        i => 0x1320 + (i - charmap::WESTEU_GERMAN_START) as u16 | chan,
    };
    Some(parity_word(cc))
}

/// Packs two basic characters into one word.
pub fn from_basic_pair(a: char, b: char) -> Option<u16> {
    let ia = charmap::index_of(a).filter(|&i| i < charmap::SPECIAL_NA_START)?;
    let ib = charmap::index_of(b).filter(|&i| i < charmap::SPECIAL_NA_START)?;
    Some(parity_word(((ia as u16 + 0x20) << 8) | (ib as u16 + 0x20)))
}
