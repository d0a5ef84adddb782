//! Structured field introducers and identifier codes.
//!
//! Every MO:DCA record is a structured field: a carriage control byte
//! (0x5A), a two-byte length counted from the length field itself, a
//! three-byte identifier (class, type, category), a flag byte and two
//! reserved bytes, followed by the field data. Begin/end fields carry an
//! 8-byte EBCDIC object name as the start of their data.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};

use crate::encoding;
use crate::error::Result;

/// Carriage control byte preceding every structured field.
pub const CARRIAGE_CONTROL: u8 = 0x5A;

/// Structured field class code for MO:DCA.
pub const SF_CLASS: u8 = 0xD3;

/// Introducer length counted by the SF length field (length + id + flag +
/// reserved).
const INTRODUCER_LEN: usize = 8;

/// Structured field type codes.
pub mod type_code {
    pub const ATTRIBUTE: u8 = 0xA0;
    pub const DESCRIPTOR: u8 = 0xA6;
    pub const CONTROL: u8 = 0xA7;
    pub const BEGIN: u8 = 0xA8;
    pub const END: u8 = 0xA9;
    pub const MAP: u8 = 0xAB;
    pub const POSITION: u8 = 0xAC;
    pub const PROCESS: u8 = 0xAD;
    pub const INCLUDE: u8 = 0xAF;
    pub const MIGRATION: u8 = 0xB1;
    pub const DATA: u8 = 0xEE;
}

/// Structured field category codes.
pub mod category_code {
    pub const PAGE_SEGMENT: u8 = 0x5F;
    pub const OBJECT_AREA: u8 = 0x6B;
    pub const CODED_FONT: u8 = 0x8A;
    pub const PROCESS_ELEMENT: u8 = 0x90;
    pub const OBJECT_CONTAINER: u8 = 0x92;
    pub const PRESENTATION_TEXT: u8 = 0x9B;
    pub const DOCUMENT: u8 = 0xA8;
    pub const PAGE_GROUP: u8 = 0xAD;
    pub const PAGE: u8 = 0xAF;
    pub const GRAPHICS: u8 = 0xBB;
    pub const DATA_RESOURCE: u8 = 0xC3;
    pub const RESOURCE_GROUP: u8 = 0xC6;
    pub const OBJECT_ENVIRONMENT_GROUP: u8 = 0xC7;
    pub const ACTIVE_ENVIRONMENT_GROUP: u8 = 0xC9;
    pub const MEDIUM_MAP: u8 = 0xCC;
    pub const NAME_RESOURCE: u8 = 0xCE;
    pub const PAGE_OVERLAY: u8 = 0xD8;
    pub const OVERLAY: u8 = 0xDF;
    pub const NO_OPERATION: u8 = 0xEE;
    pub const IMAGE: u8 = 0xFB;
}

/// Serialization capability shared by every structured object.
///
/// Partially built containers (document, page group) may be written more
/// than once: each call emits the begin field if not yet emitted, drains
/// completed children, and emits the end field only once the container
/// has been closed. Leaf objects write themselves completely.
pub trait StructuredObject {
    /// Serialize this object's structured fields to `out`.
    fn write(&mut self, out: &mut dyn Write) -> Result<()>;
}

/// Write a complete structured field: introducer plus `data`.
pub fn write_field(out: &mut dyn Write, type_: u8, category: u8, data: &[u8]) -> Result<()> {
    out.write_u8(CARRIAGE_CONTROL)?;
    out.write_u16::<BigEndian>((INTRODUCER_LEN + data.len()) as u16)?;
    out.write_u8(SF_CLASS)?;
    out.write_u8(type_)?;
    out.write_u8(category)?;
    out.write_u8(0x00)?; // flags
    out.write_u16::<BigEndian>(0x0000)?; // reserved
    out.write_all(data)?;
    Ok(())
}

/// Write a named structured field: the data is the 8-byte EBCDIC name
/// followed by `extra`.
pub fn write_named_field(
    out: &mut dyn Write,
    type_: u8,
    category: u8,
    name: &str,
    extra: &[u8],
) -> Result<()> {
    let mut data = Vec::with_capacity(8 + extra.len());
    data.extend_from_slice(&encoding::encode_name(name));
    data.extend_from_slice(extra);
    write_field(out, type_, category, &data)
}

/// Write a begin field for the given category and object name.
pub fn write_begin(out: &mut dyn Write, category: u8, name: &str) -> Result<()> {
    write_named_field(out, type_code::BEGIN, category, name, &[])
}

/// Write an end field for the given category and object name.
pub fn write_end(out: &mut dyn Write, category: u8, name: &str) -> Result<()> {
    write_named_field(out, type_code::END, category, name, &[])
}

/// Append a 24-bit big-endian value, the MO:DCA extent/offset encoding.
pub fn put_u24(data: &mut Vec<u8>, value: i32) {
    data.push(((value >> 16) & 0xFF) as u8);
    data.push(((value >> 8) & 0xFF) as u8);
    data.push((value & 0xFF) as u8);
}

/// Append a 16-bit big-endian value.
pub fn put_u16(data: &mut Vec<u8>, value: u16) {
    data.push((value >> 8) as u8);
    data.push((value & 0xFF) as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_layout() {
        let mut out = Vec::new();
        write_field(&mut out, type_code::DATA, category_code::NO_OPERATION, &[0xAA, 0xBB]).unwrap();
        assert_eq!(out[0], CARRIAGE_CONTROL);
        // length counts from the length field: 8 + 2 data bytes
        assert_eq!(&out[1..3], &[0x00, 0x0A]);
        assert_eq!(&out[3..6], &[SF_CLASS, 0xEE, 0xEE]);
        assert_eq!(&out[6..9], &[0x00, 0x00, 0x00]);
        assert_eq!(&out[9..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_begin_field_carries_padded_name() {
        let mut out = Vec::new();
        write_begin(&mut out, category_code::DOCUMENT, "DOC00001").unwrap();
        assert_eq!(out.len(), 1 + 8 + 8);
        assert_eq!(&out[3..6], &[SF_CLASS, type_code::BEGIN, category_code::DOCUMENT]);
        assert_eq!(&out[9..17], &crate::encoding::encode_name("DOC00001"));
    }

    #[test]
    fn test_put_u24() {
        let mut data = Vec::new();
        put_u24(&mut data, 0x012345);
        assert_eq!(data, vec![0x01, 0x23, 0x45]);
    }
}
