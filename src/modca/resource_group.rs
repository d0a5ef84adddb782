//! Resource groups and the objects they carry.
//!
//! A resource group is a sequence of resources between begin/end group
//! fields. Structural groups (page, page group, document level) buffer
//! their members and are drained as the owning container flushes; the
//! streamed variant writes members straight to an output sink and is used
//! for print-file level and external resource files.

use bytes::Bytes;

use std::io::Write;

use crate::error::{Error, Result};
use crate::modca::field::{self, category_code, put_u16, type_code, StructuredObject};
use crate::modca::image::{write_object_area_descriptor, write_object_area_position};
use crate::modca::triplets::{append_all, Triplet, STRUCFLGS_CONTAINER_AND_DATA};
use crate::modca::{DataObject, ObjectAreaInfo};

/// Content budget of one object container data field.
const MAX_CONTAINER_DATA_LEN: usize = 32759;

/// Resource object types carried in the X'21' triplet of a begin
/// resource field.
pub mod resource_type {
    pub const FONT_CHARACTER_SET: u8 = 0x40;
    pub const CODE_PAGE: u8 = 0x41;
    pub const CODED_FONT: u8 = 0x42;
    pub const OBJECT_CONTAINER: u8 = 0x92;
    pub const DOCUMENT: u8 = 0xA8;
    pub const GRAPHICS: u8 = 0xBB;
    pub const OVERLAY: u8 = 0xDF;
    pub const IMAGE: u8 = 0xFB;
    pub const PAGE_SEGMENT: u8 = 0xFC;

    /// Human-readable name of a resource object type, or an error for a
    /// type this writer cannot emit.
    pub fn name(object_type: u8) -> crate::error::Result<&'static str> {
        match object_type {
            FONT_CHARACTER_SET => Ok("font character set"),
            CODE_PAGE => Ok("code page"),
            CODED_FONT => Ok("coded font"),
            OBJECT_CONTAINER => Ok("object container"),
            DOCUMENT => Ok("document"),
            GRAPHICS => Ok("graphics"),
            OVERLAY => Ok("overlay"),
            IMAGE => Ok("image"),
            PAGE_SEGMENT => Ok("page segment"),
            other => Err(crate::error::Error::UnknownResourceType(other)),
        }
    }
}

/// A raw resource copied verbatim from an external file: the bytes are
/// already complete structured fields (a font character set or code page
/// as shipped on disk).
#[derive(Debug)]
pub struct IncludedResourceObject {
    pub name: String,
    pub data: Bytes,
}

impl StructuredObject for IncludedResourceObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.data)?;
        Ok(())
    }
}

/// A MO:DCA object container carrying foreign data (PDF, TIFF, TrueType
/// and friends) in object container data fields.
#[derive(Debug)]
pub struct ObjectContainer {
    name: String,
    object_type_name: String,
    object_id: Vec<u8>,
    triplets: Vec<Triplet>,
    /// Environment group describing placement, absent for resources that
    /// are only referenced (embedded fonts).
    area: Option<(String, ObjectAreaInfo)>,
    data: Bytes,
}

impl ObjectContainer {
    pub fn new(name: String, object_type_name: String, object_id: Vec<u8>, data: Bytes) -> Self {
        Self {
            name,
            object_type_name,
            object_id,
            triplets: Vec::new(),
            area: None,
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    /// Attach an object environment group so the container can be
    /// presented directly.
    pub fn set_area(&mut self, oeg_name: String, area: ObjectAreaInfo) {
        self.area = Some((oeg_name, area));
    }

    /// Add a triplet to the begin field, after the classification.
    pub fn add_triplet(&mut self, triplet: Triplet) {
        self.triplets.push(triplet);
    }

    fn write_container_data_descriptor(
        out: &mut dyn Write,
        area: &ObjectAreaInfo,
    ) -> Result<()> {
        let mut data = Vec::with_capacity(9);
        data.push(0x00); // unit base: ten inches
        put_u16(&mut data, area.width_res * 10);
        put_u16(&mut data, area.height_res * 10);
        put_u16(&mut data, area.width as u16);
        put_u16(&mut data, area.height as u16);
        field::write_field(out, type_code::DESCRIPTOR, category_code::OBJECT_CONTAINER, &data)
    }
}

impl StructuredObject for ObjectContainer {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut begin = Vec::new();
        Triplet::ObjectClassification {
            class: 0x01,
            strucflags: STRUCFLGS_CONTAINER_AND_DATA,
            object_id: self.object_id.clone(),
            object_type_name: self.object_type_name.clone(),
        }
        .append_to(&mut begin);
        append_all(&self.triplets, &mut begin);
        field::write_named_field(
            out,
            type_code::BEGIN,
            category_code::OBJECT_CONTAINER,
            &self.name,
            &begin,
        )?;
        if let Some((oeg_name, area)) = &self.area {
            field::write_begin(out, category_code::OBJECT_ENVIRONMENT_GROUP, oeg_name)?;
            write_object_area_descriptor(out, area)?;
            write_object_area_position(out, area)?;
            Self::write_container_data_descriptor(out, area)?;
            field::write_end(out, category_code::OBJECT_ENVIRONMENT_GROUP, oeg_name)?;
        }
        for chunk in self.data.chunks(MAX_CONTAINER_DATA_LEN) {
            field::write_field(out, type_code::DATA, category_code::OBJECT_CONTAINER, chunk)?;
        }
        field::write_end(out, category_code::OBJECT_CONTAINER, &self.name)
    }
}

/// A page segment: a named wrapper that lets hard included objects be
/// referenced from pages by segment name.
#[derive(Debug)]
pub struct PageSegment {
    name: String,
    objects: Vec<DataObject>,
}

impl PageSegment {
    pub fn new(name: String) -> Self {
        Self { name, objects: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_object(&mut self, object: DataObject) {
        self.objects.push(object);
    }
}

impl StructuredObject for PageSegment {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::PAGE_SEGMENT, &self.name)?;
        for object in &mut self.objects {
            object.write(out)?;
        }
        field::write_end(out, category_code::PAGE_SEGMENT, &self.name)
    }
}

/// Content wrapped by a resource object.
#[derive(Debug)]
pub enum ResourceContent {
    Object(DataObject),
    PageSegment(PageSegment),
    Included(IncludedResourceObject),
    /// A completed overlay referenced from its page by an
    /// include-page-overlay record.
    Overlay(crate::modca::page::PageObject),
}

/// A resource object: begin resource field with the object type triplet,
/// the wrapped content, end resource field.
#[derive(Debug)]
pub struct ResourceObject {
    name: String,
    object_type: u8,
    triplets: Vec<Triplet>,
    content: ResourceContent,
}

impl ResourceObject {
    pub fn new(name: String, object_type: u8, content: ResourceContent) -> Self {
        Self { name, object_type, triplets: Vec::new(), content }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn object_type(&self) -> u8 {
        self.object_type
    }

    pub fn add_triplet(&mut self, triplet: Triplet) {
        self.triplets.push(triplet);
    }
}

impl StructuredObject for ResourceObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        // refuse to emit a wrapper for a type we do not know
        let _ = resource_type::name(self.object_type)?;
        let mut extra = Vec::new();
        Triplet::ResourceObjectType { object_type: self.object_type }.append_to(&mut extra);
        append_all(&self.triplets, &mut extra);
        field::write_named_field(
            out,
            type_code::BEGIN,
            category_code::NAME_RESOURCE,
            &self.name,
            &extra,
        )?;
        match &mut self.content {
            ResourceContent::Object(o) => o.write(out)?,
            ResourceContent::PageSegment(s) => s.write(out)?,
            ResourceContent::Included(i) => i.write(out)?,
            ResourceContent::Overlay(o) => o.write(out)?,
        }
        field::write_named_field(
            out,
            type_code::END,
            category_code::NAME_RESOURCE,
            &self.name,
            &[],
        )
    }
}

/// One member of a resource group.
#[derive(Debug)]
pub enum ResourceMember {
    /// A wrapped resource (print-file and external groups).
    Resource(ResourceObject),
    /// An unwrapped data object (document, page group and page level).
    Object(DataObject),
    /// Pre-serialized structured fields copied from another resource
    /// file.
    Raw(Bytes),
}

impl StructuredObject for ResourceMember {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            ResourceMember::Resource(r) => r.write(out),
            ResourceMember::Object(o) => o.write(out),
            ResourceMember::Raw(data) => {
                out.write_all(data)?;
                Ok(())
            },
        }
    }
}

/// A buffered resource group inside a document, page group or page.
#[derive(Debug)]
pub struct ResourceGroup {
    name: String,
    started: bool,
    closed: bool,
    members: Vec<ResourceMember>,
}

impl ResourceGroup {
    pub fn new(name: String) -> Self {
        Self { name, started: false, closed: false, members: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        !self.started && self.members.is_empty()
    }

    pub fn add_object(&mut self, member: ResourceMember) {
        self.members.push(member);
    }

    /// Emit the begin field if needed and drain buffered members,
    /// leaving the group open for more.
    pub fn write_open(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.members.is_empty() && !self.started {
            return Ok(());
        }
        if !self.started {
            field::write_begin(out, category_code::RESOURCE_GROUP, &self.name)?;
            self.started = true;
        }
        for mut member in self.members.drain(..) {
            member.write(out)?;
        }
        Ok(())
    }

    /// Drain remaining members and close the group. Empty groups emit
    /// nothing. A resource registered after the group closed goes out in
    /// a reopened group with a warning, so it still precedes the content
    /// that references it.
    pub fn finish(&mut self, out: &mut dyn Write) -> Result<()> {
        if self.closed {
            if !self.members.is_empty() {
                log::warn!(
                    "resource group {} already closed, reopening for {} late resource(s)",
                    self.name,
                    self.members.len()
                );
                field::write_begin(out, category_code::RESOURCE_GROUP, &self.name)?;
                for mut member in self.members.drain(..) {
                    member.write(out)?;
                }
                field::write_end(out, category_code::RESOURCE_GROUP, &self.name)?;
            }
            return Ok(());
        }
        if self.is_empty() {
            return Ok(());
        }
        self.write_open(out)?;
        self.closed = true;
        field::write_end(out, category_code::RESOURCE_GROUP, &self.name)
    }
}

/// A resource group streamed straight to an output sink, used for the
/// print-file level group and for external resource files.
pub struct StreamedResourceGroup {
    name: String,
    started: bool,
    out: Box<dyn Write>,
}

impl std::fmt::Debug for StreamedResourceGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamedResourceGroup")
            .field("name", &self.name)
            .field("started", &self.started)
            .finish()
    }
}

impl StreamedResourceGroup {
    pub fn new(name: String, out: Box<dyn Write>) -> Self {
        Self { name, started: false, out }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Write a member straight through, opening the group first if this
    /// is the first member.
    pub fn add_object(&mut self, mut member: ResourceMember) -> Result<()> {
        if !self.started {
            field::write_begin(&mut *self.out, category_code::RESOURCE_GROUP, &self.name)?;
            self.started = true;
        }
        member.write(&mut *self.out)
    }

    /// Close the group and hand the sink back. A group that never saw a
    /// member emits nothing.
    pub fn finish(mut self) -> Result<Box<dyn Write>> {
        if self.started {
            field::write_end(&mut *self.out, category_code::RESOURCE_GROUP, &self.name)?;
        }
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Scan `data` for a named resource (begin resource through matching end
/// resource) and copy its fields verbatim to `out`.
pub fn copy_named_resource(name: &str, data: &[u8], out: &mut dyn Write) -> Result<()> {
    let wanted = crate::encoding::encode_name(name);
    let mut pos = 0usize;
    let mut copying = false;
    let mut start = 0usize;
    while pos + 9 <= data.len() {
        if data[pos] != field::CARRIAGE_CONTROL {
            return Err(Error::InvalidState(format!(
                "malformed structured field stream at offset {pos}"
            )));
        }
        let sf_len = u16::from_be_bytes([data[pos + 1], data[pos + 2]]) as usize;
        let total = 1 + sf_len;
        if sf_len < 8 || pos + total > data.len() {
            return Err(Error::InvalidState(format!(
                "truncated structured field at offset {pos}"
            )));
        }
        let id = &data[pos + 3..pos + 6];
        let named = sf_len >= 16 && data[pos + 9..pos + 17] == wanted;
        if !copying && id == [field::SF_CLASS, type_code::BEGIN, category_code::NAME_RESOURCE] && named {
            copying = true;
            start = pos;
        }
        if copying && id == [field::SF_CLASS, type_code::END, category_code::NAME_RESOURCE] && named {
            out.write_all(&data[start..pos + total])?;
            return Ok(());
        }
        pos += total;
    }
    Err(Error::ResourceNotFound(name.to_string()))
}
