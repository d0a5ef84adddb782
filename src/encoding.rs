//! EBCDIC text encoding for structured fields.
//!
//! MO:DCA object names and the default presentation-text code page are
//! EBCDIC (code page 500). Only the printable ASCII range is mapped;
//! anything outside it is substituted with an EBCDIC space.

/// EBCDIC space, also used to pad fixed-width name fields.
pub const EBCDIC_SPACE: u8 = 0x40;

/// Code page 500 values for ASCII 0x20..=0x7E.
#[rustfmt::skip]
const CP500: [u8; 95] = [
    0x40, 0x4F, 0x7F, 0x7B, 0x5B, 0x6C, 0x50, 0x7D, //  !"#$%&'
    0x4D, 0x5D, 0x5C, 0x4E, 0x6B, 0x60, 0x4B, 0x61, // ()*+,-./
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, // 01234567
    0xF8, 0xF9, 0x7A, 0x5E, 0x4C, 0x7E, 0x6E, 0x6F, // 89:;<=>?
    0x7C, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, // @ABCDEFG
    0xC8, 0xC9, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, // HIJKLMNO
    0xD7, 0xD8, 0xD9, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, // PQRSTUVW
    0xE7, 0xE8, 0xE9, 0x4A, 0xE0, 0x5A, 0x5F, 0x6D, // XYZ[\]^_
    0x79, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, // `abcdefg
    0x88, 0x89, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, // hijklmno
    0x97, 0x98, 0x99, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, // pqrstuvw
    0xA7, 0xA8, 0xA9, 0xC0, 0xBB, 0xD0, 0xA1,       // xyz{|}~
];

/// Encode a string as EBCDIC (cp500), one byte per character.
///
/// Characters outside the printable ASCII range are replaced by a space.
pub fn encode_ebcdic(s: &str) -> Vec<u8> {
    s.chars().map(encode_char).collect()
}

/// Encode one character as its cp500 byte.
pub fn encode_char(ch: char) -> u8 {
    let code = ch as u32;
    if (0x20..=0x7E).contains(&code) {
        CP500[(code - 0x20) as usize]
    } else {
        EBCDIC_SPACE
    }
}

/// Encode an object name into the fixed 8-byte EBCDIC field used by
/// begin/end structured fields. Longer names are truncated, shorter
/// names are space-padded.
pub fn encode_name(name: &str) -> [u8; 8] {
    let mut field = [EBCDIC_SPACE; 8];
    for (slot, ch) in field.iter_mut().zip(name.chars()) {
        *slot = encode_char(ch);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_alphanumeric() {
        assert_eq!(encode_ebcdic("A"), vec![0xC1]);
        assert_eq!(encode_ebcdic("Z"), vec![0xE9]);
        assert_eq!(encode_ebcdic("a"), vec![0x81]);
        assert_eq!(encode_ebcdic("0"), vec![0xF0]);
        assert_eq!(encode_ebcdic("9"), vec![0xF9]);
        assert_eq!(encode_ebcdic(" "), vec![0x40]);
    }

    #[test]
    fn test_encode_name_pads_to_eight() {
        let field = encode_name("PGN00001");
        assert_eq!(field, [0xD7, 0xC7, 0xD5, 0xF0, 0xF0, 0xF0, 0xF0, 0xF1]);

        let short = encode_name("RG1");
        assert_eq!(&short[0..3], &[0xD9, 0xC7, 0xF1]);
        assert_eq!(&short[3..], &[EBCDIC_SPACE; 5]);
    }

    #[test]
    fn test_encode_name_truncates() {
        let field = encode_name("ABCDEFGHIJ");
        assert_eq!(field[7], encode_char('H'));
    }

    #[test]
    fn test_non_ascii_maps_to_space() {
        assert_eq!(encode_ebcdic("\u{00E9}"), vec![EBCDIC_SPACE]);
    }
}
