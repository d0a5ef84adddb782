//! Font abstractions used by the text pipeline and font embedding.

use crate::encoding;

/// How a font's glyphs are stored and referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontKind {
    /// Bitmap font shipped as character set plus code page files.
    Raster,
    /// Outline font shipped as character set plus code page files.
    Outline,
    /// TrueType or OpenType font embedded in an object container.
    TrueType {
        /// Location of the font file.
        uri: String,
        /// Sub-font name inside a TrueType collection, if any.
        ttc_entry: Option<String>,
    },
}

/// A font usable for presentation text.
pub trait Font {
    /// The resource name the output references the font by.
    fn font_name(&self) -> &str;

    /// Storage kind of the font.
    fn kind(&self) -> &FontKind;

    /// Whether the font's resources may be copied into the output.
    fn is_embeddable(&self) -> bool;

    /// Advance width of a character, in millipoints at the nominal size.
    fn char_width(&self, ch: char) -> i32;
}

/// An AFP character set paired with its code page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterSet {
    /// Character set resource name, e.g. `C0H20000`.
    pub name: String,
    /// Code page resource name, e.g. `T1V10500`.
    pub code_page: String,
    /// Location of the character set file when it can be embedded.
    pub uri: Option<String>,
    /// Advance width of the space character, in millipoints at the
    /// nominal size.
    pub space_width: i32,
}

impl CharacterSet {
    /// Encode a string into the code page's byte representation.
    pub fn encode_chars(&self, text: &str) -> Vec<u8> {
        encoding::encode_ebcdic(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_set_encodes_through_code_page() {
        let cs = CharacterSet {
            name: "C0H20000".to_string(),
            code_page: "T1V10500".to_string(),
            uri: None,
            space_width: 250,
        };
        assert_eq!(cs.encode_chars("A "), vec![0xC1, 0x40]);
    }
}
