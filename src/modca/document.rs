//! Documents and page groups.
//!
//! Both are incremental containers: the begin field goes out on the
//! first flush, completed children are drained as they arrive, and the
//! end field goes out only once the container is closed. This keeps
//! memory bounded by the open page rather than the whole document.

use std::io::Write;

use crate::error::Result;
use crate::modca::field::{self, category_code, StructuredObject};
use crate::modca::page::{InvokeMediumMap, NoOperation, PageObject, TagLogicalElement};
use crate::modca::resource_group::{ResourceGroup, ResourceMember};
use crate::modca::triplets::{fqn_format, fqn_type, Triplet};
use crate::naming::NameFactory;

/// A completed record queued inside a page group.
#[derive(Debug)]
enum GroupContent {
    Page(PageObject),
    Tle(TagLogicalElement),
    NoOp(NoOperation),
    Imm(InvokeMediumMap),
}

impl StructuredObject for GroupContent {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            GroupContent::Page(o) => o.write(out),
            GroupContent::Tle(o) => o.write(out),
            GroupContent::NoOp(o) => o.write(out),
            GroupContent::Imm(o) => o.write(out),
        }
    }
}

/// A named page group under construction.
#[derive(Debug)]
pub struct PageGroup {
    name: String,
    started: bool,
    complete: bool,
    resource_group: Option<ResourceGroup>,
    pending: Vec<GroupContent>,
}

impl PageGroup {
    pub fn new(name: String) -> Self {
        Self {
            name,
            started: false,
            complete: false,
            resource_group: None,
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The group-level resource group, created on first use. Resources
    /// registered after the first page of the group has been flushed
    /// still land before the next page.
    pub fn resource_group_mut(&mut self, names: &mut NameFactory) -> &mut ResourceGroup {
        self.resource_group
            .get_or_insert_with(|| ResourceGroup::new(names.resource_group_name()))
    }

    /// Queue a completed page for the next flush.
    pub fn add_page(&mut self, page: PageObject) {
        self.pending.push(GroupContent::Page(page));
    }

    pub fn add_tag_logical_element(&mut self, tle: TagLogicalElement) {
        self.pending.push(GroupContent::Tle(tle));
    }

    pub fn add_no_operation(&mut self, nop: NoOperation) {
        self.pending.push(GroupContent::NoOp(nop));
    }

    pub fn add_invoke_medium_map(&mut self, imm: InvokeMediumMap) {
        self.pending.push(GroupContent::Imm(imm));
    }

    /// Close the group; the end field goes out on the next flush.
    pub fn end_page_group(&mut self) {
        self.complete = true;
    }
}

impl StructuredObject for PageGroup {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        if !self.started {
            field::write_begin(out, category_code::PAGE_GROUP, &self.name)?;
            self.started = true;
        }
        if let Some(group) = self.resource_group.as_mut() {
            group.finish(out)?;
        }
        for mut content in self.pending.drain(..) {
            content.write(out)?;
        }
        if self.complete {
            field::write_end(out, category_code::PAGE_GROUP, &self.name)?;
        }
        Ok(())
    }
}

/// A completed record queued at document level.
#[derive(Debug)]
enum DocContent {
    Page(PageObject),
    Tle(TagLogicalElement),
    NoOp(NoOperation),
    Imm(InvokeMediumMap),
}

impl StructuredObject for DocContent {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        match self {
            DocContent::Page(o) => o.write(out),
            DocContent::Tle(o) => o.write(out),
            DocContent::NoOp(o) => o.write(out),
            DocContent::Imm(o) => o.write(out),
        }
    }
}

/// The document under construction.
#[derive(Debug)]
pub struct Document {
    name: String,
    /// External document name carried as a begin-document-reference
    /// triplet on the begin field; only honored before the first flush.
    fqn_name: Option<String>,
    started: bool,
    complete: bool,
    resource_group: Option<ResourceGroup>,
    pending: Vec<DocContent>,
}

impl Document {
    pub fn new(name: String) -> Self {
        Self {
            name,
            fqn_name: None,
            started: false,
            complete: false,
            resource_group: None,
            pending: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Set the externally visible document name. Takes effect only while
    /// the begin field has not been written.
    pub fn set_fqn_name(&mut self, name: String) {
        if !self.started {
            self.fqn_name = Some(name);
        } else {
            log::warn!("document name set after the document begin field was written; ignored");
        }
    }

    /// The document-level resource group, created on first use.
    pub fn resource_group_mut(&mut self, names: &mut NameFactory) -> &mut ResourceGroup {
        self.resource_group
            .get_or_insert_with(|| ResourceGroup::new(names.resource_group_name()))
    }

    pub fn add_page(&mut self, page: PageObject) {
        self.pending.push(DocContent::Page(page));
    }

    pub fn add_tag_logical_element(&mut self, tle: TagLogicalElement) {
        self.pending.push(DocContent::Tle(tle));
    }

    pub fn add_no_operation(&mut self, nop: NoOperation) {
        self.pending.push(DocContent::NoOp(nop));
    }

    pub fn add_invoke_medium_map(&mut self, imm: InvokeMediumMap) {
        self.pending.push(DocContent::Imm(imm));
    }

    /// Close the document; the end field goes out on the next flush.
    pub fn end_document(&mut self) {
        self.complete = true;
    }

    /// Add a resource member, to be emitted before the next flushed
    /// page content.
    pub fn add_resource(&mut self, names: &mut NameFactory, member: ResourceMember) {
        self.resource_group_mut(names).add_object(member);
    }
}

impl StructuredObject for Document {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        if !self.started {
            let mut extra = Vec::new();
            if let Some(fqn) = &self.fqn_name {
                Triplet::FullyQualifiedName {
                    fqn_type: fqn_type::BEGIN_DOCUMENT_REF,
                    format: fqn_format::CHARSTR,
                    name: fqn.clone(),
                }
                .append_to(&mut extra);
            }
            field::write_named_field(
                out,
                field::type_code::BEGIN,
                category_code::DOCUMENT,
                &self.name,
                &extra,
            )?;
            self.started = true;
        }
        if let Some(group) = self.resource_group.as_mut() {
            group.finish(out)?;
        }
        for mut content in self.pending.drain(..) {
            content.write(out)?;
        }
        if self.complete {
            field::write_end(out, category_code::DOCUMENT, &self.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modca::page::PageKind;

    fn completed_page(name: &str) -> PageObject {
        let mut page = PageObject::new(
            PageKind::Page,
            name.to_string(),
            "AEG00001".to_string(),
            100,
            100,
            240,
            240,
        );
        page.end_page().unwrap();
        page
    }

    #[test]
    fn test_incremental_document_flush() {
        let mut doc = Document::new("DOC00001".to_string());
        let mut out = Vec::new();

        doc.write(&mut out).unwrap();
        let begins = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xA8]).count();
        assert_eq!(begins, 1);
        assert!(!out.windows(3).any(|w| w == [0xD3, 0xA9, 0xA8]));

        doc.add_page(completed_page("PGN00001"));
        doc.write(&mut out).unwrap();
        // begin is not repeated
        let begins = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xA8]).count();
        assert_eq!(begins, 1);
        assert!(out.windows(3).any(|w| w == [0xD3, 0xA8, 0xAF]));

        doc.end_document();
        doc.write(&mut out).unwrap();
        assert_eq!(&out[out.len() - 14..out.len() - 11], &[0xD3, 0xA9, 0xA8]);
    }

    #[test]
    fn test_document_name_triplet_on_begin() {
        let mut doc = Document::new("DOC00001".to_string());
        doc.set_fqn_name("INVOICE".to_string());
        let mut out = Vec::new();
        doc.write(&mut out).unwrap();
        // begin field carries the FQN triplet after the 8-byte name
        assert_eq!(out[17], 2 + 2 + 7); // triplet length
        assert_eq!(out[18], 0x02);
        assert_eq!(out[19], fqn_type::BEGIN_DOCUMENT_REF);
    }

    #[test]
    fn test_page_group_wraps_pages() {
        let mut group = PageGroup::new("PGP00001".to_string());
        group.add_page(completed_page("PGN00001"));
        let mut out = Vec::new();
        group.write(&mut out).unwrap();
        assert!(out.windows(3).any(|w| w == [0xD3, 0xA8, 0xAD]));
        assert!(!out.windows(3).any(|w| w == [0xD3, 0xA9, 0xAD]));

        group.add_page(completed_page("PGN00002"));
        group.end_page_group();
        group.write(&mut out).unwrap();
        let begins = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xAD]).count();
        assert_eq!(begins, 1);
        assert_eq!(&out[out.len() - 14..out.len() - 11], &[0xD3, 0xA9, 0xAD]);
    }

    #[test]
    fn test_document_resources_precede_pages() {
        let mut names = NameFactory::new();
        let mut doc = Document::new("DOC00001".to_string());
        doc.add_resource(&mut names, ResourceMember::Raw(bytes::Bytes::from_static(&[0x00])));
        doc.add_page(completed_page("PGN00001"));
        let mut out = Vec::new();
        doc.write(&mut out).unwrap();

        let rg_pos = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xC6]).unwrap();
        let page_pos = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xAF]).unwrap();
        assert!(rg_pos < page_pos);
    }
}
