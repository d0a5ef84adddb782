//! Document assembly.
//!
//! `DataStream` is the sequencing API a renderer drives: start/end
//! document, page group, page and overlay, plus per-page content
//! emission. Completed structural objects are flushed incrementally to a
//! spool stream; the resource streamer copies the spool behind the
//! print-file resource group when the document closes.
//!
//! Scope nesting is document, then optional page group, then page, then
//! optional overlay. Exactly one page (or its overlay) is the active
//! content target at a time.

use std::io::{Read, Seek, Write};

use log::debug;

use crate::error::{Error, Result};
use crate::fonts::{CharacterSet, Font};
use crate::modca::document::{Document, PageGroup};
use crate::modca::field::StructuredObject;
use crate::modca::page::{
    FontEntry, IncludeObject, IncludePageOverlay, IncludePageSegment, InvokeMediumMap,
    NoOperation, PageKind, PageObject, TagLogicalElement,
};
use crate::modca::resource_group::{
    resource_type, ResourceContent, ResourceGroup, ResourceMember, ResourceObject,
};
use crate::modca::DataObject;
use crate::naming::NameFactory;
use crate::painting_state::{Color, PaintingState};
use crate::ptoca::PtocaBuilder;
use crate::resource::ResourceLevel;

/// A temporary store the document body is spooled to before the final
/// copy behind the print-file resources.
pub trait SpoolStream: Read + Write + Seek {}

impl<T: Read + Write + Seek> SpoolStream for T {}

/// One text placement request. Coordinates are AFP units in the
/// renderer coordinate system; spacing values are millipoints.
#[derive(Debug, Clone)]
pub struct TextDataInfo {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    /// Local font identifier mapped on the page environment.
    pub font_reference: u8,
    pub text: String,
    pub letter_spacing: i32,
    pub word_spacing: i32,
}

/// One rule placement request, in AFP units.
#[derive(Debug, Clone)]
pub struct LineDataInfo {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    pub thickness: i32,
    pub color: Color,
}

fn is_fixed_width_space(ch: char) -> bool {
    matches!(ch, '\u{2000}'..='\u{200B}' | '\u{3000}')
}

const NBSP: char = '\u{00A0}';

/// The document assembler.
pub struct DataStream {
    names: NameFactory,
    painting_state: PaintingState,
    spool: Box<dyn SpoolStream>,
    document: Option<Document>,
    current_page_group: Option<PageGroup>,
    current_page: Option<PageObject>,
    current_overlay: Option<PageObject>,
    complete: bool,
}

impl std::fmt::Debug for DataStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStream")
            .field("document", &self.document)
            .field("complete", &self.complete)
            .finish_non_exhaustive()
    }
}

impl DataStream {
    /// Create an assembler spooling the document body to `spool`.
    pub fn new(painting_state: PaintingState, spool: Box<dyn SpoolStream>) -> Self {
        Self {
            names: NameFactory::new(),
            painting_state,
            spool,
            document: None,
            current_page_group: None,
            current_page: None,
            current_overlay: None,
            complete: false,
        }
    }

    pub fn painting_state(&self) -> &PaintingState {
        &self.painting_state
    }

    pub fn painting_state_mut(&mut self) -> &mut PaintingState {
        &mut self.painting_state
    }

    pub(crate) fn names_mut(&mut self) -> &mut NameFactory {
        &mut self.names
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Tear down into the spool for the final copy. Returns the spool
    /// and whether the document was properly ended.
    pub(crate) fn into_spool(self) -> (Box<dyn SpoolStream>, bool) {
        (self.spool, self.complete)
    }

    fn document_mut(&mut self) -> Result<&mut Document> {
        self.document
            .as_mut()
            .ok_or_else(|| Error::InvalidState("document not started".to_string()))
    }

    /// The active content target: the open overlay if one exists, else
    /// the open page.
    fn current_page_mut(&mut self) -> Result<&mut PageObject> {
        self.current_overlay
            .as_mut()
            .or(self.current_page.as_mut())
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))
    }

    /// Write everything completed so far: document begin and pending
    /// content, then the open page group's pending pages.
    fn flush(&mut self) -> Result<()> {
        let document = self
            .document
            .as_mut()
            .ok_or_else(|| Error::InvalidState("document not started".to_string()))?;
        document.write(&mut self.spool)?;
        if let Some(group) = self.current_page_group.as_mut() {
            group.write(&mut self.spool)?;
        }
        Ok(())
    }

    // ----- document scope -----

    /// Open the document. Single use.
    pub fn start_document(&mut self) -> Result<()> {
        if self.complete || self.document.is_some() {
            return Err(Error::InvalidState("document already started".to_string()));
        }
        let name = self.names.document_name();
        debug!("starting document {name}");
        self.document = Some(Document::new(name));
        Ok(())
    }

    /// Set the externally visible document name. Only honored before
    /// the first page has been flushed.
    pub fn set_document_name(&mut self, name: &str) -> Result<()> {
        self.document_mut()?.set_fqn_name(name.to_string());
        Ok(())
    }

    /// Close the document and flush all remaining structured fields to
    /// the spool. Calling this twice is an error.
    pub fn end_document(&mut self) -> Result<()> {
        if self.complete {
            return Err(Error::InvalidState("document already ended".to_string()));
        }
        if self.current_page.is_some() || self.current_overlay.is_some() {
            return Err(Error::InvalidState(
                "cannot end the document while a page is open".to_string(),
            ));
        }
        if self.current_page_group.is_some() {
            debug!("ending open page group at document end");
            self.end_page_group()?;
        }
        self.document_mut()?.end_document();
        self.flush()?;
        self.spool.flush()?;
        self.complete = true;
        Ok(())
    }

    // ----- page group scope -----

    /// Open a page group. A group that is already open stays the
    /// current one unless `end_previous` asks to close it first.
    pub fn start_page_group(&mut self, end_previous: bool) -> Result<()> {
        if self.current_page_group.is_some() {
            if !end_previous {
                return Ok(());
            }
            self.end_page_group()?;
        }
        let _ = self.document_mut()?;
        self.current_page_group = Some(PageGroup::new(self.names.page_group_name()));
        Ok(())
    }

    /// Close the open page group, if any, and flush it.
    pub fn end_page_group(&mut self) -> Result<()> {
        if let Some(group) = self.current_page_group.as_mut() {
            group.end_page_group();
            self.flush()?;
            self.current_page_group = None;
        }
        Ok(())
    }

    // ----- page scope -----

    /// Open a page. Fails if another page is still open.
    pub fn start_page(
        &mut self,
        width: i32,
        height: i32,
        rotation: u16,
        width_res: u16,
        height_res: u16,
    ) -> Result<()> {
        if self.current_page.is_some() {
            return Err(Error::InvalidState("a page is already open".to_string()));
        }
        let _ = self.document_mut()?;
        let name = self.names.page_name();
        let aeg_name = self.names.active_environment_group_name();
        // extents arrive pre-rotated from the caller; rotation only
        // drives content placement through the painting state
        self.painting_state.set_rotation(rotation);
        self.painting_state.set_page_size(width, height);
        self.current_page = Some(PageObject::new(
            PageKind::Page,
            name,
            aeg_name,
            width,
            height,
            width_res,
            height_res,
        ));
        Ok(())
    }

    /// Close the current page and flush it into the open page group or
    /// the document.
    pub fn end_page(&mut self) -> Result<()> {
        if self.current_overlay.is_some() {
            return Err(Error::InvalidState(
                "cannot end the page while an overlay is open".to_string(),
            ));
        }
        let mut page = self
            .current_page
            .take()
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
        page.end_page()?;
        match self.current_page_group.as_mut() {
            Some(group) => group.add_page(page),
            None => self.document_mut()?.add_page(page),
        }
        self.flush()
    }

    /// Suspend the current page without ending it, for interleaved
    /// multi-pass layout. The page is handed back to the caller and can
    /// be reactivated with [`restore_page`](Self::restore_page).
    pub fn save_page(&mut self) -> Result<PageObject> {
        if self.current_overlay.is_some() {
            return Err(Error::InvalidState(
                "cannot save the page while an overlay is open".to_string(),
            ));
        }
        self.current_page
            .take()
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))
    }

    /// Reactivate a page previously returned by
    /// [`save_page`](Self::save_page).
    pub fn restore_page(&mut self, page: PageObject) -> Result<()> {
        if self.current_page.is_some() {
            return Err(Error::InvalidState("a page is already open".to_string()));
        }
        self.current_page = Some(page);
        Ok(())
    }

    // ----- overlay scope -----

    /// Open an overlay on the current page. The overlay becomes the
    /// active content target and an include-page-overlay record for it
    /// is placed on the page immediately.
    pub fn start_overlay(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        width_res: u16,
        height_res: u16,
        rotation: u16,
    ) -> Result<()> {
        if self.current_overlay.is_some() {
            return Err(Error::InvalidState("an overlay is already open".to_string()));
        }
        let name = self.names.overlay_name();
        let aeg_name = self.names.active_environment_group_name();
        let overlay = PageObject::new(
            PageKind::Overlay,
            name.clone(),
            aeg_name,
            width,
            height,
            width_res,
            height_res,
        );
        let page = self
            .current_page
            .as_mut()
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
        page.include_page_overlay(IncludePageOverlay::new(name, x, y, rotation))?;
        self.current_overlay = Some(overlay);
        Ok(())
    }

    /// Close the open overlay and store it in the page-level resource
    /// group, restoring the page as the content target.
    pub fn end_overlay(&mut self) -> Result<()> {
        if let Some(mut overlay) = self.current_overlay.take() {
            overlay.end_page()?;
            let resource = ResourceObject::new(
                overlay.name().to_string(),
                resource_type::OVERLAY,
                ResourceContent::Overlay(overlay),
            );
            let names = &mut self.names;
            let page = self
                .current_page
                .as_mut()
                .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
            page.resource_group_mut(names)
                .add_object(ResourceMember::Resource(resource));
        }
        Ok(())
    }

    // ----- content emission -----

    /// Map a coded font into the current page's environment so text can
    /// reference it by `font_reference`.
    pub fn create_font(&mut self, font_reference: u8, char_set: &CharacterSet) -> Result<()> {
        let entry = FontEntry {
            reference: font_reference,
            character_set: char_set.name.clone(),
            code_page: char_set.code_page.clone(),
        };
        self.current_page_mut()?.environment_mut().add_font(entry);
        Ok(())
    }

    /// Map a batch of coded fonts into the current page's environment.
    pub fn add_fonts_to_current_page<'a, I>(&mut self, fonts: I) -> Result<()>
    where
        I: IntoIterator<Item = (u8, &'a CharacterSet)>,
    {
        for (reference, char_set) in fonts {
            self.create_font(reference, char_set)?;
        }
        Ok(())
    }

    /// Emit a text run on the active target. Transparent-data batching:
    /// glyphs accumulate into a pending run that is flushed only on a
    /// spacing-mode change or glyph-width correction.
    pub fn create_text(
        &mut self,
        info: &TextDataInfo,
        font: &dyn Font,
        char_set: &CharacterSet,
    ) -> Result<()> {
        let rotation = self.painting_state.rotation();
        let (x, y) = self.painting_state.point(info.x, info.y);
        let unit = self.painting_state.unit_converter();

        let inter_character_adjustment = if info.letter_spacing != 0 {
            unit.mpt2units(info.letter_spacing as f32).round() as i32
        } else {
            0
        };
        let space_width = font.char_width(' ');
        let fixed_space_increment = unit
            .mpt2units((space_width + info.letter_spacing) as f32)
            .round() as i32;
        let variable_space_increment = if info.word_spacing != 0 {
            unit.mpt2units((space_width + info.word_spacing + info.letter_spacing) as f32)
                .round() as i32
        } else {
            fixed_space_increment
        };

        fn flush_pending(
            builder: &mut PtocaBuilder<'_>,
            char_set: &CharacterSet,
            pending: &mut String,
        ) -> Result<()> {
            if !pending.is_empty() {
                builder.add_transparent_data(&char_set.encode_chars(pending))?;
                pending.clear();
            }
            Ok(())
        }

        let names = &mut self.names;
        let page = self
            .current_overlay
            .as_mut()
            .or(self.current_page.as_mut())
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
        page.create_text(names, |builder| {
            builder.set_text_orientation(rotation)?;
            builder.set_extended_text_color(info.color)?;
            builder.set_coded_font(info.font_reference)?;
            builder.absolute_move_baseline(y)?;
            builder.absolute_move_inline(x)?;
            builder.set_inter_character_adjustment(inter_character_adjustment)?;
            builder.set_variable_space_character_increment(variable_space_increment)?;

            let mut pending = String::new();
            let mut fixed_space_mode = false;
            for ch in info.text.chars() {
                let mut glyph_adjust = 0;
                if is_fixed_width_space(ch) {
                    flush_pending(builder, char_set, &mut pending)?;
                    builder.set_variable_space_character_increment(fixed_space_increment)?;
                    fixed_space_mode = true;
                    pending.push(' ');
                    glyph_adjust = font.char_width(ch) - space_width;
                } else {
                    if fixed_space_mode {
                        flush_pending(builder, char_set, &mut pending)?;
                        builder.set_variable_space_character_increment(variable_space_increment)?;
                        fixed_space_mode = false;
                    }
                    pending.push(if ch == NBSP { ' ' } else { ch });
                }
                if glyph_adjust != 0 {
                    flush_pending(builder, char_set, &mut pending)?;
                    builder.relative_move_inline(unit.mpt2units(glyph_adjust as f32).round() as i32)?;
                }
            }
            flush_pending(builder, char_set, &mut pending)
        })
    }

    /// Emit a rule between two points as a PTOCA draw-rule sequence.
    pub fn create_line(&mut self, line: &LineDataInfo) -> Result<()> {
        let rotation = self.painting_state.rotation();
        let (x1, y1) = self.painting_state.point(line.x1, line.y1);
        let (x2, y2) = self.painting_state.point(line.x2, line.y2);
        let thickness = line.thickness;
        let color = line.color;

        let names = &mut self.names;
        let page = self
            .current_overlay
            .as_mut()
            .or(self.current_page.as_mut())
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
        page.create_text(names, |builder| {
            builder.set_text_orientation(rotation)?;
            builder.set_extended_text_color(color)?;
            builder.absolute_move_baseline(y1)?;
            builder.absolute_move_inline(x1)?;
            if y1 == y2 {
                builder.draw_i_axis_rule(x2 - x1, thickness)
            } else {
                builder.draw_b_axis_rule(y2 - y1, thickness)
            }
        })
    }

    /// Fill a rectangle with a grey shade of the given color, as a thick
    /// I-direction rule.
    pub fn create_shading(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        color: Color,
    ) -> Result<()> {
        let grey = color.to_grey();
        let shade = Color::Rgb(grey, grey, grey);
        let names = &mut self.names;
        let page = self
            .current_overlay
            .as_mut()
            .or(self.current_page.as_mut())
            .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
        page.create_text(names, |builder| {
            builder.set_extended_text_color(shade)?;
            builder.absolute_move_baseline(y)?;
            builder.absolute_move_inline(x)?;
            builder.draw_i_axis_rule(width, height)
        })
    }

    /// Reference a page segment at a position in the renderer
    /// coordinate system.
    pub fn create_include_page_segment(&mut self, name: &str, x: i32, y: i32) -> Result<()> {
        let (x, y) = self.painting_state.point(x, y);
        self.current_page_mut()?
            .include_page_segment(IncludePageSegment::new(name.to_string(), x, y))
    }

    /// Reference a pre-existing page overlay resource on the current
    /// page, at the current rotation.
    pub fn create_include_page_overlay(&mut self, name: &str, x: i32, y: i32) -> Result<()> {
        let rotation = self.painting_state.rotation();
        self.current_page_mut()?
            .include_page_overlay(IncludePageOverlay::new(name.to_string(), x, y, rotation))
    }

    /// Place an include-page-segment record on the active target. The
    /// coordinates are device-space already, no remap.
    pub(crate) fn place_page_segment(&mut self, name: &str, x: i32, y: i32) -> Result<()> {
        self.current_page_mut()?
            .include_page_segment(IncludePageSegment::new(name.to_string(), x, y))
    }

    /// Place an include-object record on the active target.
    pub(crate) fn include_object(&mut self, include: IncludeObject) -> Result<()> {
        self.current_page_mut()?.include_object(include)
    }

    /// Place a data object directly on the active target.
    pub(crate) fn add_object_to_page(&mut self, object: DataObject) -> Result<()> {
        self.current_page_mut()?.add_object(object)
    }

    /// Attach a tag logical element to the most specific open scope:
    /// page, then page group, then document.
    pub fn create_tag_logical_element(&mut self, name: &str, value: &str, ccsid: u16) -> Result<()> {
        let tle = TagLogicalElement {
            name: name.to_string(),
            value: value.to_string(),
            ccsid,
        };
        if self.current_overlay.is_some() || self.current_page.is_some() {
            self.current_page_mut()?.add_tag_logical_element(tle);
        } else if let Some(group) = self.current_page_group.as_mut() {
            group.add_tag_logical_element(tle);
        } else {
            self.document_mut()?.add_tag_logical_element(tle);
        }
        Ok(())
    }

    /// Attach a tag logical element to the current page regardless of
    /// any open group.
    pub fn create_page_tag_logical_element(
        &mut self,
        name: &str,
        value: &str,
        ccsid: u16,
    ) -> Result<()> {
        let tle = TagLogicalElement {
            name: name.to_string(),
            value: value.to_string(),
            ccsid,
        };
        self.current_page_mut()?.add_tag_logical_element(tle);
        Ok(())
    }

    /// Attach a tag logical element to the open page group.
    pub fn create_page_group_tag_logical_element(
        &mut self,
        name: &str,
        value: &str,
        ccsid: u16,
    ) -> Result<()> {
        let tle = TagLogicalElement {
            name: name.to_string(),
            value: value.to_string(),
            ccsid,
        };
        match self.current_page_group.as_mut() {
            Some(group) => {
                group.add_tag_logical_element(tle);
                Ok(())
            },
            None => Err(Error::InvalidState("no page group open".to_string())),
        }
    }

    /// Emit a no-operation comment on the current page, or at document
    /// level when no page is open.
    pub fn create_no_operation(&mut self, content: &str) -> Result<()> {
        let nop = NoOperation { content: content.to_string() };
        if self.current_overlay.is_some() || self.current_page.is_some() {
            self.current_page_mut()?.add_no_operation(nop);
        } else {
            self.document_mut()?.add_no_operation(nop);
        }
        Ok(())
    }

    /// Invoke a medium map. Prefers the open page group, then the open
    /// page, then the document.
    pub fn create_invoke_medium_map(&mut self, name: &str) -> Result<()> {
        let imm = InvokeMediumMap { name: name.to_string() };
        if let Some(group) = self.current_page_group.as_mut() {
            group.add_invoke_medium_map(imm);
        } else if self.current_page.is_some() {
            self.current_page_mut()?.add_invoke_medium_map(imm);
        } else {
            self.document_mut()?.add_invoke_medium_map(imm);
        }
        Ok(())
    }

    /// The buffered resource group for a structural level. Print-file
    /// and external levels are owned by the resource streamer, not the
    /// assembler.
    pub(crate) fn resource_group_for(&mut self, level: &ResourceLevel) -> Result<&mut ResourceGroup> {
        let names = &mut self.names;
        match level {
            ResourceLevel::Page => {
                let page = self
                    .current_overlay
                    .as_mut()
                    .or(self.current_page.as_mut())
                    .ok_or_else(|| Error::InvalidState("no page open".to_string()))?;
                Ok(page.resource_group_mut(names))
            },
            ResourceLevel::PageGroup => match self.current_page_group.as_mut() {
                Some(group) => Ok(group.resource_group_mut(names)),
                None => Err(Error::InvalidState(
                    "page-group resource level with no open page group".to_string(),
                )),
            },
            ResourceLevel::Document => {
                let document = self
                    .document
                    .as_mut()
                    .ok_or_else(|| Error::InvalidState("document not started".to_string()))?;
                Ok(document.resource_group_mut(names))
            },
            other => Err(Error::InvalidState(format!(
                "resource level {other} is not buffered by the assembler"
            ))),
        }
    }
}
