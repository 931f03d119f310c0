//! EIA-608 character set, indexed by decoded character slot
//!
//! Slots 0..96 are the basic North-American set (0x20..0x7F with the 608
//! substitutions), 96..112 the special North-American set (0x1130..), 112..144 the
//! extended Spanish/French/misc set (0x1220..) and 144..176 the extended
//! Portuguese/German/Danish set (0x1320..).

pub const CHARMAP_SIZE: usize = 176;

pub const BASIC_NA_START: usize = 0;
pub const SPECIAL_NA_START: usize = 96;
pub const WESTEU_SPANISH_START: usize = 112;
pub const WESTEU_GERMAN_START: usize = 144;

#[rustfmt::skip]
pub static CHARMAP: [char; CHARMAP_SIZE] = [
    /* basic North-American */
    ' ', '!', '"', '#', '$', '%', '&', '\u{2019}', '(', ')', 'á', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '@', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '[', 'é', ']', 'í', 'ó',
    'ú', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ç', '÷', 'Ñ', 'ñ', '█',
    /* special North-American */
    '®', '°', '½', '¿', '™', '¢', '£', '♪', 'à', '\u{00A0}', 'è', 'â', 'ê', 'î', 'ô', 'û',
    /* extended Spanish / French / misc */
    'Á', 'É', 'Ó', 'Ú', 'Ü', 'ü', '\u{2018}', '¡', '*', '\'', '—', '©', '℠', '•', '“', '”',
    'À', 'Â', 'Ç', 'È', 'Ê', 'Ë', 'ë', 'Î', 'Ï', 'ï', 'Ô', 'Ù', 'ù', 'Û', '«', '»',
    /* extended Portuguese / German / Danish */
    'Ã', 'ã', 'Í', 'Ì', 'ì', 'Ò', 'ò', 'Õ', 'õ', '{', '}', '\\', '^', '_', '|', '~',
    'Ä', 'ä', 'Ö', 'ö', 'ß', '¥', '¤', '¦', 'Å', 'å', 'Ø', 'ø', '┌', '┐', '└', '┘',
];

pub fn lookup(idx: usize) -> Option<char> {
    CHARMAP.get(idx).copied()
}

/// Reverse lookup; the first slot wins for glyphs present in more than one set.
pub fn index_of(c: char) -> Option<usize> {
    CHARMAP.iter().position(|&m| m == c)
}
