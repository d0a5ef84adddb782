//! Pages, overlays and the records placed on them.
//!
//! A page owns its active environment group, an optional page-level
//! resource group, and an ordered list of content records. Text runs
//! accumulate in an open presentation text object that is flushed before
//! any non-text object so reading order matches painting order.

use std::io::Write;

use crate::encoding;
use crate::error::{Error, Result};
use crate::modca::field::{self, category_code, put_u16, put_u24, type_code, StructuredObject};
use crate::modca::text::PresentationTextObject;
use crate::modca::triplets::{append_all, fqn_format, fqn_type, mapping, Triplet};
use crate::modca::{orientation_pair, DataObject, ObjectAreaInfo};
use crate::modca::resource_group::ResourceGroup;
use crate::naming::NameFactory;

/// Whether a page object is a page or an overlay. The two share their
/// structure and differ only in the begin/end field category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Page,
    Overlay,
}

impl PageKind {
    fn category(self) -> u8 {
        match self {
            PageKind::Page => category_code::PAGE,
            PageKind::Overlay => category_code::OVERLAY,
        }
    }
}

/// A font mapped into a page's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontEntry {
    pub reference: u8,
    pub character_set: String,
    pub code_page: String,
}

/// Active environment group: descriptors, mapped fonts and mapped
/// overlays for one page.
#[derive(Debug)]
pub struct ActiveEnvironmentGroup {
    name: String,
    width: i32,
    height: i32,
    width_res: u16,
    height_res: u16,
    fonts: Vec<FontEntry>,
    overlays: Vec<String>,
}

impl ActiveEnvironmentGroup {
    pub fn new(name: String, width: i32, height: i32, width_res: u16, height_res: u16) -> Self {
        Self {
            name,
            width,
            height,
            width_res,
            height_res,
            fonts: Vec::new(),
            overlays: Vec::new(),
        }
    }

    /// Map a coded font. Re-registering the same local reference is a
    /// no-op.
    pub fn add_font(&mut self, entry: FontEntry) {
        if !self.fonts.iter().any(|f| f.reference == entry.reference) {
            self.fonts.push(entry);
        }
    }

    /// Map a page overlay by name, once.
    pub fn map_overlay(&mut self, name: &str) {
        if !self.overlays.iter().any(|n| n == name) {
            self.overlays.push(name.to_string());
        }
    }

    fn write_map_coded_font(&self, out: &mut dyn Write) -> Result<()> {
        let mut data = Vec::new();
        for font in &self.fonts {
            let mut group = Vec::new();
            append_all(
                &[
                    Triplet::ResourceLocalId { resource_type: 0x05, id: font.reference },
                    Triplet::FullyQualifiedName {
                        fqn_type: fqn_type::CODE_PAGE_NAME_REF,
                        format: fqn_format::CHARSTR,
                        name: font.code_page.clone(),
                    },
                    Triplet::FullyQualifiedName {
                        fqn_type: fqn_type::FONT_CHARSET_NAME_REF,
                        format: fqn_format::CHARSTR,
                        name: font.character_set.clone(),
                    },
                ],
                &mut group,
            );
            put_u16(&mut data, (group.len() + 2) as u16);
            data.extend_from_slice(&group);
        }
        field::write_field(out, type_code::MAP, category_code::CODED_FONT, &data)
    }

    fn write_map_page_overlay(&self, out: &mut dyn Write) -> Result<()> {
        let mut data = Vec::new();
        for overlay in &self.overlays {
            let mut group = Vec::new();
            Triplet::FullyQualifiedName {
                fqn_type: fqn_type::DATA_OBJECT_EXTERNAL_RESOURCE_REF,
                format: fqn_format::CHARSTR,
                name: overlay.clone(),
            }
            .append_to(&mut group);
            put_u16(&mut data, (group.len() + 2) as u16);
            data.extend_from_slice(&group);
        }
        field::write_field(out, type_code::MAP, category_code::PAGE_OVERLAY, &data)
    }

    fn descriptor_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(12);
        data.push(0x00); // X unit base: ten inches
        data.push(0x00); // Y unit base: ten inches
        put_u16(&mut data, self.width_res * 10);
        put_u16(&mut data, self.height_res * 10);
        put_u24(&mut data, self.width);
        put_u24(&mut data, self.height);
        data
    }
}

impl StructuredObject for ActiveEnvironmentGroup {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::ACTIVE_ENVIRONMENT_GROUP, &self.name)?;
        if !self.fonts.is_empty() {
            self.write_map_coded_font(out)?;
        }
        if !self.overlays.is_empty() {
            self.write_map_page_overlay(out)?;
        }
        field::write_field(out, type_code::DESCRIPTOR, category_code::PAGE, &self.descriptor_data())?;
        field::write_field(
            out,
            type_code::DESCRIPTOR,
            category_code::PRESENTATION_TEXT,
            &self.descriptor_data(),
        )?;
        field::write_end(out, category_code::ACTIVE_ENVIRONMENT_GROUP, &self.name)
    }
}

/// An include-object record referencing a cached resource by name.
#[derive(Debug)]
pub struct IncludeObject {
    name: String,
    object_class: u8,
    area: ObjectAreaInfo,
    mapping: u8,
}

impl IncludeObject {
    pub fn new(name: String, object_class: u8, area: ObjectAreaInfo) -> Self {
        Self { name, object_class, area, mapping: mapping::SCALE_TO_FIT }
    }

    pub fn set_mapping(&mut self, option: u8) {
        self.mapping = option;
    }
}

impl StructuredObject for IncludeObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let (x_orent, y_orent) = orientation_pair(self.area.rotation);
        let mut extra = Vec::new();
        extra.push(0x00); // reserved
        extra.push(self.object_class);
        put_u24(&mut extra, self.area.x);
        put_u24(&mut extra, self.area.y);
        put_u16(&mut extra, x_orent);
        put_u16(&mut extra, y_orent);
        put_u24(&mut extra, -1); // content x offset: use object default
        put_u24(&mut extra, -1); // content y offset: use object default
        extra.push(0x01); // reference coordinate system: page
        append_all(
            &[
                Triplet::MeasurementUnits {
                    x_units: self.area.width_res * 10,
                    y_units: self.area.height_res * 10,
                },
                Triplet::ObjectAreaSize { width: self.area.width, height: self.area.height },
                Triplet::MappingOption { option: self.mapping },
            ],
            &mut extra,
        );
        field::write_named_field(
            out,
            type_code::INCLUDE,
            category_code::DATA_RESOURCE,
            &self.name,
            &extra,
        )
    }
}

/// An include-page-segment record.
#[derive(Debug)]
pub struct IncludePageSegment {
    name: String,
    x: i32,
    y: i32,
}

impl IncludePageSegment {
    pub fn new(name: String, x: i32, y: i32) -> Self {
        Self { name, x, y }
    }
}

impl StructuredObject for IncludePageSegment {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut extra = Vec::with_capacity(6);
        put_u24(&mut extra, self.x);
        put_u24(&mut extra, self.y);
        field::write_named_field(
            out,
            type_code::INCLUDE,
            category_code::PAGE_SEGMENT,
            &self.name,
            &extra,
        )
    }
}

/// An include-page-overlay record.
#[derive(Debug)]
pub struct IncludePageOverlay {
    name: String,
    x: i32,
    y: i32,
    orientation: u16,
}

impl IncludePageOverlay {
    pub fn new(name: String, x: i32, y: i32, orientation: u16) -> Self {
        Self { name, x, y, orientation }
    }
}

impl StructuredObject for IncludePageOverlay {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let (x_orent, _) = orientation_pair(self.orientation);
        let mut extra = Vec::with_capacity(8);
        put_u24(&mut extra, self.x);
        put_u24(&mut extra, self.y);
        put_u16(&mut extra, x_orent);
        field::write_named_field(
            out,
            type_code::INCLUDE,
            category_code::PAGE_OVERLAY,
            &self.name,
            &extra,
        )
    }
}

/// A tag logical element: a name/value attribute attached to a page,
/// page group or document.
#[derive(Debug, Clone)]
pub struct TagLogicalElement {
    pub name: String,
    pub value: String,
    /// CCSID of the attribute value encoding; zero means unspecified.
    pub ccsid: u16,
}

impl StructuredObject for TagLogicalElement {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let mut data = Vec::new();
        Triplet::FullyQualifiedName {
            fqn_type: fqn_type::ATTRIBUTE_GID,
            format: fqn_format::CHARSTR,
            name: self.name.clone(),
        }
        .append_to(&mut data);
        Triplet::AttributeValue { value: self.value.clone() }.append_to(&mut data);
        if self.ccsid != 0 {
            Triplet::Encoding { ccsid: self.ccsid }.append_to(&mut data);
        }
        field::write_field(out, type_code::ATTRIBUTE, category_code::PROCESS_ELEMENT, &data)
    }
}

/// A no-operation field carrying an EBCDIC comment.
#[derive(Debug, Clone)]
pub struct NoOperation {
    pub content: String,
}

impl StructuredObject for NoOperation {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let data = encoding::encode_ebcdic(&self.content);
        field::write_field(out, type_code::DATA, category_code::NO_OPERATION, &data)
    }
}

/// An invoke-medium-map field.
#[derive(Debug, Clone)]
pub struct InvokeMediumMap {
    pub name: String,
}

impl StructuredObject for InvokeMediumMap {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_named_field(out, type_code::MAP, category_code::MEDIUM_MAP, &self.name, &[])
    }
}

/// One record placed on a page, in painting order.
#[derive(Debug)]
pub enum PageContent {
    Text(PresentationTextObject),
    Object(DataObject),
    Include(IncludeObject),
    IncludePageSegment(IncludePageSegment),
    IncludePageOverlay(IncludePageOverlay),
    Tle(TagLogicalElement),
    NoOp(NoOperation),
    Imm(InvokeMediumMap),
}

impl StructuredObject for PageContent {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            PageContent::Text(o) => o.write(out),
            PageContent::Object(o) => o.write(out),
            PageContent::Include(o) => o.write(out),
            PageContent::IncludePageSegment(o) => o.write(out),
            PageContent::IncludePageOverlay(o) => o.write(out),
            PageContent::Tle(o) => o.write(out),
            PageContent::NoOp(o) => o.write(out),
            PageContent::Imm(o) => o.write(out),
        }
    }
}

/// A page or overlay under construction.
#[derive(Debug)]
pub struct PageObject {
    kind: PageKind,
    name: String,
    aeg: ActiveEnvironmentGroup,
    resource_group: Option<ResourceGroup>,
    contents: Vec<PageContent>,
    current_text: Option<PresentationTextObject>,
    complete: bool,
}

impl PageObject {
    pub fn new(
        kind: PageKind,
        name: String,
        aeg_name: String,
        width: i32,
        height: i32,
        width_res: u16,
        height_res: u16,
    ) -> Self {
        Self {
            kind,
            name,
            aeg: ActiveEnvironmentGroup::new(aeg_name, width, height, width_res, height_res),
            resource_group: None,
            contents: Vec::new(),
            current_text: None,
            complete: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn environment_mut(&mut self) -> &mut ActiveEnvironmentGroup {
        &mut self.aeg
    }

    /// The page-level resource group, created on first use.
    pub fn resource_group_mut(&mut self, names: &mut NameFactory) -> &mut ResourceGroup {
        self.resource_group
            .get_or_insert_with(|| ResourceGroup::new(names.resource_group_name()))
    }

    /// Run a PTOCA producer against the open text object, opening one if
    /// none is active.
    pub fn create_text<F>(&mut self, names: &mut NameFactory, produce: F) -> Result<()>
    where
        F: FnOnce(&mut crate::ptoca::PtocaBuilder<'_>) -> Result<()>,
    {
        if self.current_text.is_none() {
            self.current_text = Some(PresentationTextObject::new(names.text_object_name()));
        }
        match self.current_text.as_mut() {
            Some(text) => text.create_control_sequences(produce),
            None => Err(Error::InvalidState("no open text object".to_string())),
        }
    }

    /// Close the open text object, if any, and append it to the page
    /// contents.
    pub fn end_presentation_object(&mut self) -> Result<()> {
        if let Some(mut text) = self.current_text.take() {
            text.end_control_sequence()?;
            self.contents.push(PageContent::Text(text));
        }
        Ok(())
    }

    /// Place a data object directly on the page.
    pub fn add_object(&mut self, object: DataObject) -> Result<()> {
        self.end_presentation_object()?;
        self.contents.push(PageContent::Object(object));
        Ok(())
    }

    /// Reference a resource by include-object record.
    pub fn include_object(&mut self, include: IncludeObject) -> Result<()> {
        self.end_presentation_object()?;
        self.contents.push(PageContent::Include(include));
        Ok(())
    }

    pub fn include_page_segment(&mut self, segment: IncludePageSegment) -> Result<()> {
        self.end_presentation_object()?;
        self.contents.push(PageContent::IncludePageSegment(segment));
        Ok(())
    }

    pub fn include_page_overlay(&mut self, overlay: IncludePageOverlay) -> Result<()> {
        self.end_presentation_object()?;
        self.aeg.map_overlay(&overlay.name);
        self.contents.push(PageContent::IncludePageOverlay(overlay));
        Ok(())
    }

    pub fn add_tag_logical_element(&mut self, tle: TagLogicalElement) {
        self.contents.push(PageContent::Tle(tle));
    }

    pub fn add_no_operation(&mut self, nop: NoOperation) {
        self.contents.push(PageContent::NoOp(nop));
    }

    pub fn add_invoke_medium_map(&mut self, imm: InvokeMediumMap) {
        self.contents.push(PageContent::Imm(imm));
    }

    /// Close the page. Further content is a caller error.
    pub fn end_page(&mut self) -> Result<()> {
        self.end_presentation_object()?;
        self.complete = true;
        Ok(())
    }
}

impl StructuredObject for PageObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, self.kind.category(), &self.name)?;
        if let Some(group) = self.resource_group.as_mut() {
            group.finish(out)?;
        }
        self.aeg.write(out)?;
        for content in &mut self.contents {
            content.write(out)?;
        }
        field::write_end(out, self.kind.category(), &self.name)
    }
}
