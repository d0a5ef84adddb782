//! IOCA image objects.
//!
//! An image object wraps one IOCA image segment in MO:DCA fields: begin
//! image, an object environment group describing the object area and the
//! image data descriptor, then the segment's self-defining fields carried
//! in image picture data fields, and the end field.

use bytes::Bytes;

use std::io::Write;

use crate::error::Result;
use crate::modca::field::{self, category_code, put_u16, put_u24, type_code, StructuredObject};
use crate::modca::triplets::{append_all, Triplet};
use crate::modca::{orientation_pair, ObjectAreaInfo};

/// Content budget of one image picture data field.
const MAX_DATA_LEN: usize = 8192;

/// Raster data budget of one IOCA image data self-defining field.
const MAX_SEGMENT_DATA_LEN: usize = 0xFFFF;

/// IOCA function set 10 (FS10, bilevel).
const FUNCTION_SET_FS10: u8 = 0x0A;
/// IOCA function set 45 (FS45, color).
const FUNCTION_SET_FS45: u8 = 0x2D;

/// IOCA compression identifiers used for the image encoding parameter.
pub mod compression {
    /// No compression, raw raster data.
    pub const NONE: u8 = 0x03;
    /// JPEG (ISO/IEC 10918) interchange data.
    pub const JPEG: u8 = 0x83;
    /// CCITT G4 (T.6) two-dimensional coding.
    pub const G4: u8 = 0x84;
}

/// The raster content of an image object.
#[derive(Debug, Clone)]
pub struct ImageContent {
    /// Width of the raster in pixels.
    pub width: u16,
    /// Height of the raster in pixels.
    pub height: u16,
    /// Bits per pixel (1 for bilevel, 8 grey, 24 RGB).
    pub bits_per_pixel: u8,
    /// IOCA compression identifier; raw raster when absent.
    pub compression: Option<u8>,
    /// The raster or compressed data.
    pub data: Bytes,
}

/// A named IOCA image object.
#[derive(Debug)]
pub struct ImageObject {
    name: String,
    oeg_name: String,
    segment_name: String,
    area: ObjectAreaInfo,
    content: ImageContent,
}

impl ImageObject {
    pub fn new(
        name: String,
        oeg_name: String,
        segment_name: String,
        area: ObjectAreaInfo,
        content: ImageContent,
    ) -> Self {
        Self { name, oeg_name, segment_name, area, content }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Pixel resolution of the image descriptor, dots per ten inches.
    fn descriptor_resolution(&self) -> (u16, u16) {
        (self.area.width_res * 10, self.area.height_res * 10)
    }

    fn write_object_environment_group(&self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::OBJECT_ENVIRONMENT_GROUP, &self.oeg_name)?;
        write_object_area_descriptor(out, &self.area)?;
        write_object_area_position(out, &self.area)?;
        self.write_image_data_descriptor(out)?;
        field::write_end(out, category_code::OBJECT_ENVIRONMENT_GROUP, &self.oeg_name)
    }

    fn write_image_data_descriptor(&self, out: &mut dyn Write) -> Result<()> {
        let (hres, vres) = self.descriptor_resolution();
        let mut data = Vec::with_capacity(13);
        data.push(0x00); // unit base: ten inches
        put_u16(&mut data, hres);
        put_u16(&mut data, vres);
        put_u16(&mut data, self.content.width);
        put_u16(&mut data, self.content.height);
        // IOCA function set identification
        let function_set = if self.content.bits_per_pixel > 1 {
            FUNCTION_SET_FS45
        } else {
            FUNCTION_SET_FS10
        };
        data.extend_from_slice(&[0xF7, 0x02, 0x01, function_set]);
        field::write_field(out, type_code::DESCRIPTOR, category_code::IMAGE, &data)
    }

    /// Serialize the IOCA image segment self-defining fields.
    fn segment_bytes(&self) -> Vec<u8> {
        let (hres, vres) = self.descriptor_resolution();
        let mut seg = Vec::with_capacity(self.content.data.len() + 64);

        // begin segment, four-byte segment name
        seg.push(0x70);
        seg.push(0x04);
        seg.extend_from_slice(&crate::encoding::encode_name(&self.segment_name)[..4]);
        // begin image content
        seg.extend_from_slice(&[0x91, 0x01, 0xFF]);
        // image size parameter
        seg.extend_from_slice(&[0x94, 0x09, 0x00]);
        put_u16(&mut seg, hres);
        put_u16(&mut seg, vres);
        put_u16(&mut seg, self.content.width);
        put_u16(&mut seg, self.content.height);
        // image encoding parameter
        let compression = self.content.compression.unwrap_or(compression::NONE);
        seg.extend_from_slice(&[0x95, 0x02, compression, 0x01]);
        // IDE size parameter
        seg.extend_from_slice(&[0x96, 0x01, self.content.bits_per_pixel]);
        if self.content.bits_per_pixel == 24 {
            // IDE structure parameter: additive RGB, 8 bits per component
            seg.extend_from_slice(&[0x9B, 0x08, 0x00, 0x01, 0x00, 0x00, 0x00, 8, 8, 8]);
        }
        // image data, extended self-defining fields of at most 64K each
        for chunk in self.content.data.chunks(MAX_SEGMENT_DATA_LEN) {
            seg.extend_from_slice(&[0xFE, 0x92]);
            put_u16(&mut seg, chunk.len() as u16);
            seg.extend_from_slice(chunk);
        }
        // end image content, end segment
        seg.extend_from_slice(&[0x93, 0x00, 0x71, 0x00]);
        seg
    }
}

impl StructuredObject for ImageObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::IMAGE, &self.name)?;
        self.write_object_environment_group(out)?;
        let segment = self.segment_bytes();
        for chunk in segment.chunks(MAX_DATA_LEN) {
            field::write_field(out, type_code::DATA, category_code::IMAGE, chunk)?;
        }
        field::write_end(out, category_code::IMAGE, &self.name)
    }
}

/// Write an object area descriptor for the given area.
pub(crate) fn write_object_area_descriptor(out: &mut dyn Write, area: &ObjectAreaInfo) -> Result<()> {
    let mut data = Vec::new();
    // triplet group: descriptor position, measurement units, area size
    data.extend_from_slice(&[0x03, 0x43, 0x01]);
    append_all(
        &[
            Triplet::MeasurementUnits {
                x_units: area.width_res * 10,
                y_units: area.height_res * 10,
            },
            Triplet::ObjectAreaSize { width: area.width, height: area.height },
        ],
        &mut data,
    );
    field::write_field(out, type_code::DESCRIPTOR, category_code::OBJECT_AREA, &data)
}

/// Write an object area position for the given area. The content is
/// placed at the area origin with the area's rotation.
pub(crate) fn write_object_area_position(out: &mut dyn Write, area: &ObjectAreaInfo) -> Result<()> {
    let (x_orent, y_orent) = orientation_pair(area.rotation);
    let mut data = Vec::with_capacity(23);
    data.push(0x01); // object area position id
    data.push(0x17); // repeating group length
    put_u24(&mut data, area.x);
    put_u24(&mut data, area.y);
    put_u16(&mut data, x_orent);
    put_u16(&mut data, y_orent);
    put_u24(&mut data, 0); // content x offset
    put_u24(&mut data, 0); // content y offset
    put_u16(&mut data, 0x0000); // content x rotation
    put_u16(&mut data, 0x2D00); // content y rotation
    data.push(0x01); // reference coordinate system: object area
    field::write_field(out, type_code::POSITION, category_code::OBJECT_AREA, &data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_image(data_len: usize) -> ImageObject {
        ImageObject::new(
            "IMG00001".to_string(),
            "OEG00001".to_string(),
            "IS01".to_string(),
            ObjectAreaInfo { width: 480, height: 480, ..Default::default() },
            ImageContent {
                width: 100,
                height: 100,
                bits_per_pixel: 8,
                compression: None,
                data: Bytes::from(vec![0x55u8; data_len]),
            },
        )
    }

    #[test]
    fn test_image_object_fields() {
        let mut img = sample_image(64);
        let mut out = Vec::new();
        img.write(&mut out).unwrap();

        // begin image, begin/end OEG, one IPD, end image
        assert_eq!(&out[3..6], &[0xD3, 0xA8, 0xFB]);
        let ipd_count = out.windows(3).filter(|w| w == &[0xD3, 0xEE, 0xFB]).count();
        assert_eq!(ipd_count, 1);
        assert_eq!(&out[out.len() - 14..out.len() - 11], &[0xD3, 0xA9, 0xFB]);
    }

    #[test]
    fn test_large_image_splits_picture_data() {
        let mut img = sample_image(MAX_DATA_LEN * 2);
        let mut out = Vec::new();
        img.write(&mut out).unwrap();
        let ipd_count = out.windows(3).filter(|w| w == &[0xD3, 0xEE, 0xFB]).count();
        assert!(ipd_count >= 2);
    }

    #[test]
    fn test_segment_opens_and_closes() {
        let img = sample_image(8);
        let seg = img.segment_bytes();
        assert_eq!(&seg[..2], &[0x70, 0x04]);
        assert_eq!(&seg[seg.len() - 4..], &[0x93, 0x00, 0x71, 0x00]);
    }

    #[test]
    fn test_color_image_carries_ide_structure() {
        let mut img = sample_image(8);
        img.content.bits_per_pixel = 24;
        let seg = img.segment_bytes();
        assert!(seg.windows(2).any(|w| w == [0x9B, 0x08]));
    }
}
