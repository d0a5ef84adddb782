//! GOCA graphics objects.
//!
//! A graphics object is a begin field, an object environment group with
//! the graphics data descriptor, the drawing orders carried in graphics
//! data fields, and an end field. The drawing orders themselves are
//! produced by the caller; this module only frames them.

use bytes::Bytes;

use std::io::Write;

use crate::error::Result;
use crate::modca::field::{self, category_code, put_u16, type_code, StructuredObject};
use crate::modca::image::{write_object_area_descriptor, write_object_area_position};
use crate::modca::ObjectAreaInfo;

/// Content budget of one graphics data field.
const MAX_DATA_LEN: usize = 8192;

/// A named GOCA graphics object carrying caller-built drawing orders.
#[derive(Debug)]
pub struct GraphicsObject {
    name: String,
    oeg_name: String,
    area: ObjectAreaInfo,
    orders: Bytes,
}

impl GraphicsObject {
    pub fn new(name: String, oeg_name: String, area: ObjectAreaInfo, orders: Bytes) -> Self {
        Self { name, oeg_name, area, orders }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn write_graphics_data_descriptor(&self, out: &mut dyn Write) -> Result<()> {
        let mut data = Vec::with_capacity(21);
        // drawing order subset: level 3 version 2
        data.extend_from_slice(&[0xF7, 0x07, 0xB0, 0x00, 0x00, 0x03, 0x02, 0x00, 0x00]);
        // window specification: absolute, device coordinates
        data.extend_from_slice(&[0xF6, 0x0A, 0x00, 0x00]);
        put_u16(&mut data, 0); // left edge
        put_u16(&mut data, self.area.width as u16);
        put_u16(&mut data, 0); // bottom edge
        put_u16(&mut data, self.area.height as u16);
        field::write_field(out, type_code::DESCRIPTOR, category_code::GRAPHICS, &data)
    }
}

impl StructuredObject for GraphicsObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::GRAPHICS, &self.name)?;
        field::write_begin(out, category_code::OBJECT_ENVIRONMENT_GROUP, &self.oeg_name)?;
        write_object_area_descriptor(out, &self.area)?;
        write_object_area_position(out, &self.area)?;
        self.write_graphics_data_descriptor(out)?;
        field::write_end(out, category_code::OBJECT_ENVIRONMENT_GROUP, &self.oeg_name)?;
        for chunk in self.orders.chunks(MAX_DATA_LEN) {
            field::write_field(out, type_code::DATA, category_code::GRAPHICS, chunk)?;
        }
        field::write_end(out, category_code::GRAPHICS, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphics_object_frames_orders() {
        let mut gfx = GraphicsObject::new(
            "GRA00001".to_string(),
            "OEG00001".to_string(),
            ObjectAreaInfo { width: 240, height: 120, ..Default::default() },
            Bytes::from_static(&[0xC1, 0x00]), // begin area order
        );
        let mut out = Vec::new();
        gfx.write(&mut out).unwrap();

        assert_eq!(&out[3..6], &[0xD3, 0xA8, 0xBB]);
        let gad_count = out.windows(3).filter(|w| w == &[0xD3, 0xEE, 0xBB]).count();
        assert_eq!(gad_count, 1);
        assert_eq!(&out[out.len() - 14..out.len() - 11], &[0xD3, 0xA9, 0xBB]);
    }

    #[test]
    fn test_orders_split_across_data_fields() {
        let mut gfx = GraphicsObject::new(
            "GRA00001".to_string(),
            "OEG00001".to_string(),
            ObjectAreaInfo::default(),
            Bytes::from(vec![0x00u8; MAX_DATA_LEN + 1]),
        );
        let mut out = Vec::new();
        gfx.write(&mut out).unwrap();
        let gad_count = out.windows(3).filter(|w| w == &[0xD3, 0xEE, 0xBB]).count();
        assert_eq!(gad_count, 2);
    }
}
