//! MO:DCA structured object model.
//!
//! Typed in-memory representations of the constructs this crate writes:
//! documents, page groups, pages, overlays, resource groups, data objects
//! and the include/control records placed on pages. Objects own their
//! children; the only "current target" state lives in the top-level
//! assembler, never as back-pointers in the tree.

pub mod document;
pub mod field;
pub mod graphics;
pub mod image;
pub mod page;
pub mod resource_group;
pub mod text;
pub mod triplets;

use std::io::Write;

use crate::error::Result;
use field::StructuredObject;

/// Placement and extent of a data object's area on the page, in AFP
/// units at the given resolutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectAreaInfo {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub width_res: u16,
    pub height_res: u16,
    pub rotation: u16,
}

impl Default for ObjectAreaInfo {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            width_res: 240,
            height_res: 240,
            rotation: 0,
        }
    }
}

/// Map a rotation in degrees onto the MO:DCA orientation pair
/// (I-direction, B-direction).
pub(crate) fn orientation_pair(rotation: u16) -> (u16, u16) {
    match rotation {
        90 => (0x2D00, 0x5A00),
        180 => (0x5A00, 0x8700),
        270 => (0x8700, 0x0000),
        _ => (0x0000, 0x2D00),
    }
}

/// A named data object that can ride on a page, in a page segment or in
/// a resource group.
#[derive(Debug)]
pub enum DataObject {
    /// IOCA image object.
    Image(image::ImageObject),
    /// GOCA graphics object.
    Graphics(graphics::GraphicsObject),
    /// MO:DCA object container (natively carried foreign data).
    Container(resource_group::ObjectContainer),
}

impl DataObject {
    /// The object name.
    pub fn name(&self) -> &str {
        match self {
            DataObject::Image(o) => o.name(),
            DataObject::Graphics(o) => o.name(),
            DataObject::Container(o) => o.name(),
        }
    }

    /// Rename the object (used when substituting a page segment name).
    pub fn set_name(&mut self, name: String) {
        match self {
            DataObject::Image(o) => o.set_name(name),
            DataObject::Graphics(o) => o.set_name(name),
            DataObject::Container(o) => o.set_name(name),
        }
    }

    /// The structured field category this object presents as when it is
    /// referenced by an include-object field.
    pub fn object_class(&self) -> u8 {
        match self {
            DataObject::Image(_) => field::category_code::IMAGE,
            DataObject::Graphics(_) => field::category_code::GRAPHICS,
            DataObject::Container(_) => field::category_code::OBJECT_CONTAINER,
        }
    }
}

impl StructuredObject for DataObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            DataObject::Image(o) => o.write(out),
            DataObject::Graphics(o) => o.write(out),
            DataObject::Container(o) => o.write(out),
        }
    }
}
