//! Resource creation and caching.
//!
//! The manager is the object-creation façade: it decides whether a
//! requested data object already has a materialized resource that can be
//! referenced by an include record, or must be encoded fresh, wrapped
//! and registered in the cache. The guarantee the cache provides is at
//! most one full encode per distinct (name, uri, level) identity,
//! however many times the resource is placed.

use bytes::Bytes;
use indexmap::IndexMap;
use log::debug;

use crate::datastream::DataStream;
use crate::error::{Error, Result};
use crate::fonts::{CharacterSet, Font, FontKind};
use crate::modca::field::category_code;
use crate::modca::graphics::GraphicsObject;
use crate::modca::image::{ImageContent, ImageObject};
use crate::modca::page::IncludeObject;
use crate::modca::resource_group::{
    copy_named_resource, resource_type, IncludedResourceObject, ObjectContainer, PageSegment,
    ResourceContent, ResourceMember, ResourceObject,
};
use crate::modca::triplets::{fqn_format, fqn_type, Triplet};
use crate::modca::{DataObject, ObjectAreaInfo};
use crate::naming::NameFactory;
use crate::painting_state::PaintingState;
use crate::resource::streamer::{ResourceResolver, ResourceStreamer};
use crate::resource::{
    object_types, DataObjectContent, DataObjectInfo, ResourceInfo, ResourceLevel,
    ResourceLevelDefaults,
};

/// Prefix substituted onto an object name to derive its page segment
/// name.
const PAGE_SEGMENT_NAME_PREFIX: &str = "S10";

/// A resource that has been written once; later placements reference it
/// by name.
#[derive(Debug, Clone)]
struct CachedObject {
    name: String,
    /// Placement descriptor with the payload cleared; absent for
    /// embedded font resources, which are never placed by include.
    info: Option<DataObjectInfo>,
    page_segment: bool,
}

fn object_class(content: &DataObjectContent) -> u8 {
    match content {
        DataObjectContent::Image(_) => category_code::IMAGE,
        DataObjectContent::Graphics(_) => category_code::GRAPHICS,
        DataObjectContent::Container(_) => category_code::OBJECT_CONTAINER,
    }
}

fn wrapper_type(content: &DataObjectContent, page_segment: bool) -> u8 {
    if page_segment {
        return resource_type::PAGE_SEGMENT;
    }
    match content {
        DataObjectContent::Image(_) => resource_type::IMAGE,
        DataObjectContent::Graphics(_) => resource_type::GRAPHICS,
        DataObjectContent::Container(_) => resource_type::OBJECT_CONTAINER,
    }
}

/// Build the named structured object for a data object description.
fn build_data_object(names: &mut NameFactory, info: &DataObjectInfo) -> DataObject {
    let area = info.area.clone();
    let mut object = match &info.content {
        DataObjectContent::Image(image) => DataObject::Image(ImageObject::new(
            names.image_name(),
            names.object_environment_group_name(),
            names.image_segment_name(),
            area,
            ImageContent {
                width: image.width,
                height: image.height,
                bits_per_pixel: image.bits_per_pixel,
                compression: image.compression,
                data: image.data.clone(),
            },
        )),
        DataObjectContent::Graphics(graphics) => DataObject::Graphics(GraphicsObject::new(
            names.graphics_name(),
            names.object_environment_group_name(),
            area,
            graphics.orders.clone(),
        )),
        DataObjectContent::Container(container) => {
            let mut oc = ObjectContainer::new(
                names.object_container_name(),
                container.object_type.name.to_string(),
                container.object_type.object_id.to_vec(),
                container.data.clone(),
            );
            oc.set_area(names.object_environment_group_name(), area);
            DataObject::Container(oc)
        },
    };
    if let Some(name) = &info.resource.name {
        object.set_name(name.clone());
    }
    object
}

/// The resource creation and caching façade.
pub struct ResourceManager {
    streamer: ResourceStreamer,
    data_stream: Option<DataStream>,
    defaults: ResourceLevelDefaults,
    cache: IndexMap<ResourceInfo, Vec<CachedObject>>,
    /// Counter used to synthesize unique URIs for anonymous in-stream
    /// objects.
    instream_object_count: u32,
}

impl std::fmt::Debug for ResourceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceManager")
            .field("cached", &self.cache.len())
            .field("instream_object_count", &self.instream_object_count)
            .finish_non_exhaustive()
    }
}

impl ResourceManager {
    pub fn new(resolver: Box<dyn ResourceResolver>) -> Self {
        Self {
            streamer: ResourceStreamer::new(resolver),
            data_stream: None,
            defaults: ResourceLevelDefaults::default(),
            cache: IndexMap::new(),
            instream_object_count: 0,
        }
    }

    /// Bind the output sink and create the document assembler.
    pub fn create_data_stream(
        &mut self,
        painting_state: PaintingState,
        output: Box<dyn std::io::Write>,
    ) -> Result<()> {
        if self.data_stream.is_some() {
            return Err(Error::InvalidState("data stream already created".to_string()));
        }
        self.data_stream = Some(self.streamer.create_data_stream(painting_state, output)?);
        Ok(())
    }

    pub fn data_stream_mut(&mut self) -> Result<&mut DataStream> {
        self.data_stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))
    }

    /// Finalize every destination: close external and print-file
    /// resource groups and copy the spooled document into the output.
    pub fn write_to_stream(&mut self) -> Result<()> {
        let data_stream = self
            .data_stream
            .take()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))?;
        self.streamer.close(data_stream)
    }

    pub fn set_default_resource_group_uri(&mut self, uri: &str) {
        self.streamer.set_default_resource_group_uri(uri);
    }

    pub fn resource_level_defaults(&self) -> &ResourceLevelDefaults {
        &self.defaults
    }

    /// Overlay configured resource level defaults.
    pub fn set_resource_level_defaults(&mut self, defaults: &ResourceLevelDefaults) {
        self.defaults.merge(defaults);
    }

    /// Normalize a resource identity for cache lookup: anonymous
    /// in-stream objects get a synthesized URI so distinct objects
    /// never collide on the empty key.
    fn update_resource_info_uri(&mut self, info: &mut ResourceInfo) {
        let uri = info.uri.take().unwrap_or_else(|| "/".to_string());
        let uri = if uri.ends_with('/') {
            self.instream_object_count += 1;
            format!("{uri}{}", self.instream_object_count)
        } else {
            uri
        };
        info.uri = Some(uri);
    }

    /// Whether a resource identity has already been materialized.
    pub fn is_object_cached(&self, info: &ResourceInfo) -> bool {
        self.cache.get(info).is_some_and(|entries| !entries.is_empty())
    }

    /// If the resource is cached, place include references for it on
    /// the current page and report true; the caller must not re-encode.
    pub fn try_include_object(&mut self, info: &mut DataObjectInfo) -> Result<bool> {
        self.update_resource_info_uri(&mut info.resource);
        self.include_cached_object(&info.resource, Some(&info.area))
    }

    fn include_cached_object(
        &mut self,
        key: &ResourceInfo,
        area: Option<&ObjectAreaInfo>,
    ) -> Result<bool> {
        let Some(entries) = self.cache.get_mut(key) else {
            return Ok(false);
        };
        if entries.is_empty() {
            return Ok(false);
        }
        // re-placement at a new position updates the cached descriptor
        if let Some(area) = area {
            if entries.len() == 1 {
                if let Some(info) = entries[0].info.as_mut() {
                    info.area = area.clone();
                }
            }
        }
        let placements: Vec<CachedObject> = entries.clone();
        let data_stream = self
            .data_stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))?;
        for cached in placements {
            match cached.info {
                Some(info) if cached.page_segment => {
                    data_stream.place_page_segment(&cached.name, info.area.x, info.area.y)?;
                },
                Some(info) => {
                    data_stream.include_object(IncludeObject::new(
                        cached.name,
                        object_class(&info.content),
                        info.area,
                    ))?;
                },
                None => {
                    debug!(
                        "cached resource {} has no placement descriptor, skipping include",
                        cached.name
                    );
                },
            }
        }
        Ok(true)
    }

    /// Create a data object, or reference it if its identity is already
    /// cached. The primary dedup guarantee lives here.
    pub fn create_object(&mut self, mut info: DataObjectInfo) -> Result<()> {
        if self.try_include_object(&mut info)? {
            return Ok(());
        }

        let level = info.resource.level.clone();
        let mut use_include = match &info.content {
            DataObjectContent::Container(c) => c.object_type.includable,
            _ => true,
        };

        let data_stream = self
            .data_stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))?;
        let named = build_data_object(data_stream.names_mut(), &info);

        let group_available = if use_include {
            match &level {
                ResourceLevel::Inline => false,
                ResourceLevel::Page | ResourceLevel::PageGroup | ResourceLevel::Document => true,
                ResourceLevel::PrintFile | ResourceLevel::External { .. } => {
                    self.streamer.prepare_group(&level, data_stream.names_mut())?
                },
            }
        } else {
            false
        };
        use_include &= group_available;

        if !use_include {
            // not sharable: embed straight on the page, nothing cached
            return data_stream.add_object_to_page(named);
        }

        let mut cached_name = named.name().to_string();
        let mut page_segment = false;
        let member = match &level {
            ResourceLevel::PrintFile | ResourceLevel::External { .. } => {
                let content = if info.create_page_segment {
                    let suffix = named.name().get(3..).unwrap_or_default();
                    let segment_name = format!("{PAGE_SEGMENT_NAME_PREFIX}{suffix}");
                    cached_name = segment_name.clone();
                    page_segment = true;
                    let mut segment = PageSegment::new(segment_name);
                    segment.add_object(named);
                    ResourceContent::PageSegment(segment)
                } else {
                    ResourceContent::Object(named)
                };
                let wrapper_name = info
                    .resource
                    .name
                    .clone()
                    .unwrap_or_else(|| data_stream.names_mut().resource_name());
                ResourceMember::Resource(ResourceObject::new(
                    wrapper_name,
                    wrapper_type(&info.content, page_segment),
                    content,
                ))
            },
            _ => ResourceMember::Object(named),
        };

        match &level {
            ResourceLevel::PrintFile | ResourceLevel::External { .. } => {
                self.streamer
                    .streamed_group(&level)
                    .ok_or_else(|| {
                        Error::InvalidState(format!("resource group for level {level} vanished"))
                    })?
                    .add_object(member)?;
            },
            _ => data_stream.resource_group_for(&level)?.add_object(member),
        }

        // place the reference, then remember the materialization
        if page_segment {
            data_stream.place_page_segment(&cached_name, info.area.x, info.area.y)?;
        } else {
            data_stream.include_object(IncludeObject::new(
                cached_name.clone(),
                object_class(&info.content),
                info.area.clone(),
            ))?;
        }

        let mut cached_info = info.clone();
        cached_info.content.clear_data();
        self.cache
            .entry(info.resource)
            .or_default()
            .push(CachedObject { name: cached_name, info: Some(cached_info), page_segment });
        Ok(())
    }

    /// Copy a raw resource into the print-file resource group, wrapped
    /// as a named resource. Idempotent per (name, uri).
    pub fn create_included_resource(
        &mut self,
        resource_name: &str,
        uri: Option<&str>,
        object_type: u8,
        truetype: bool,
        ttc_entry: Option<&str>,
    ) -> Result<()> {
        let source_uri = uri.unwrap_or(resource_name).trim().to_string();
        let key = ResourceInfo {
            name: Some(resource_name.to_string()),
            uri: Some(source_uri.clone()),
            level: ResourceLevel::PrintFile,
        };
        if self.is_object_cached(&key) {
            return Ok(());
        }
        if truetype {
            if let Some(entry) = ttc_entry {
                return Err(Error::UnsupportedFont(format!(
                    "TrueType collection entry {entry} cannot be embedded"
                )));
            }
        }

        let data = self.streamer.resolver().resolve_input(&source_uri)?;
        let data_stream = self
            .data_stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))?;

        let resource = if truetype {
            let mut container = ObjectContainer::new(
                data_stream.names_mut().object_container_name(),
                object_types::TRUETYPE.name.to_string(),
                object_types::TRUETYPE.object_id.to_vec(),
                Bytes::from(data),
            );
            container.add_triplet(Triplet::Encoding { ccsid: 1200 });
            container.add_triplet(Triplet::FullyQualifiedName {
                fqn_type: fqn_type::REPLACE_FIRST_GID,
                format: fqn_format::CHARSTR,
                name: resource_name.to_string(),
            });
            ResourceObject::new(
                data_stream.names_mut().resource_name(),
                resource_type::OBJECT_CONTAINER,
                ResourceContent::Object(DataObject::Container(container)),
            )
        } else {
            ResourceObject::new(
                resource_name.to_string(),
                object_type,
                ResourceContent::Included(IncludedResourceObject {
                    name: resource_name.to_string(),
                    data: Bytes::from(data),
                }),
            )
        };

        let level = ResourceLevel::PrintFile;
        if !self.streamer.prepare_group(&level, data_stream.names_mut())? {
            return Err(Error::InvalidState(
                "print-file resource group unavailable".to_string(),
            ));
        }
        self.streamer
            .streamed_group(&level)
            .ok_or_else(|| Error::InvalidState("print-file resource group vanished".to_string()))?
            .add_object(ResourceMember::Resource(resource))?;

        self.cache.entry(key).or_default().push(CachedObject {
            name: resource_name.to_string(),
            info: None,
            page_segment: false,
        });
        Ok(())
    }

    /// Copy one named resource out of an external AFP resource file
    /// into the print-file resource group, verbatim.
    pub fn create_included_resource_from_external(
        &mut self,
        resource_name: &str,
        uri: &str,
    ) -> Result<()> {
        let key = ResourceInfo {
            name: Some(resource_name.to_string()),
            uri: Some(uri.to_string()),
            level: ResourceLevel::PrintFile,
        };
        if self.is_object_cached(&key) {
            return Ok(());
        }
        let file = self.streamer.resolver().resolve_input(uri)?;
        let mut copied = Vec::new();
        copy_named_resource(resource_name, &file, &mut copied)?;

        let data_stream = self
            .data_stream
            .as_mut()
            .ok_or_else(|| Error::InvalidState("data stream not created".to_string()))?;
        let level = ResourceLevel::PrintFile;
        if !self.streamer.prepare_group(&level, data_stream.names_mut())? {
            return Err(Error::InvalidState(
                "print-file resource group unavailable".to_string(),
            ));
        }
        self.streamer
            .streamed_group(&level)
            .ok_or_else(|| Error::InvalidState("print-file resource group vanished".to_string()))?
            .add_object(ResourceMember::Raw(Bytes::from(copied)))?;

        self.cache.entry(key).or_default().push(CachedObject {
            name: resource_name.to_string(),
            info: None,
            page_segment: false,
        });
        Ok(())
    }

    /// Embed a font's resources at print-file level. Raster and outline
    /// fonts contribute their character set and code page; TrueType
    /// fonts are carried in an object container.
    pub fn embed_font(&mut self, font: &dyn Font, char_set: &CharacterSet) -> Result<()> {
        if !font.is_embeddable() {
            return Ok(());
        }
        match font.kind() {
            FontKind::TrueType { uri, ttc_entry } => self.create_included_resource(
                font.font_name(),
                Some(uri.as_str()),
                resource_type::OBJECT_CONTAINER,
                true,
                ttc_entry.as_deref(),
            ),
            FontKind::Raster | FontKind::Outline => {
                if char_set.uri.is_none() {
                    return Ok(());
                }
                self.create_included_resource(
                    &char_set.name,
                    char_set.uri.as_deref(),
                    resource_type::FONT_CHARACTER_SET,
                    false,
                    None,
                )?;
                self.create_included_resource(
                    &char_set.code_page,
                    None,
                    resource_type::CODE_PAGE,
                    false,
                    None,
                )
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ImageObjectInfo;
    use std::collections::HashMap;
    use std::io;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl SharedBuf {
        fn contents(&self) -> Vec<u8> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct MemoryResolver {
        inputs: HashMap<String, Vec<u8>>,
    }

    impl ResourceResolver for MemoryResolver {
        fn resolve_output(&self, _uri: &str) -> io::Result<Box<dyn Write>> {
            Ok(Box::new(SharedBuf::default()))
        }

        fn resolve_input(&self, uri: &str) -> io::Result<Vec<u8>> {
            self.inputs
                .get(uri)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
        }
    }

    fn manager_with(inputs: HashMap<String, Vec<u8>>) -> (ResourceManager, SharedBuf) {
        let mut manager = ResourceManager::new(Box::new(MemoryResolver { inputs }));
        let sink = SharedBuf::default();
        manager
            .create_data_stream(PaintingState::new(240), Box::new(sink.clone()))
            .unwrap();
        let ds = manager.data_stream_mut().unwrap();
        ds.start_document().unwrap();
        ds.start_page(4800, 6240, 0, 240, 240).unwrap();
        (manager, sink)
    }

    fn image_info(uri: Option<&str>) -> DataObjectInfo {
        DataObjectInfo {
            resource: ResourceInfo {
                name: None,
                uri: uri.map(str::to_string),
                level: ResourceLevel::PrintFile,
            },
            area: ObjectAreaInfo { width: 480, height: 480, ..Default::default() },
            create_page_segment: false,
            content: DataObjectContent::Image(ImageObjectInfo {
                width: 100,
                height: 100,
                bits_per_pixel: 8,
                compression: None,
                data: Bytes::from(vec![0xAAu8; 64]),
            }),
        }
    }

    #[test]
    fn test_second_placement_is_include_only() {
        let (mut manager, sink) = manager_with(HashMap::new());
        manager.create_object(image_info(Some("file:img/logo"))).unwrap();
        manager.create_object(image_info(Some("file:img/logo"))).unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        // one materialized resource, two include records
        let brs = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xCE]).count();
        assert_eq!(brs, 1);
        let iob = out.windows(3).filter(|w| w == &[0xD3, 0xAF, 0xC3]).count();
        assert_eq!(iob, 2);
        let bim = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xFB]).count();
        assert_eq!(bim, 1);
    }

    #[test]
    fn test_anonymous_objects_get_distinct_identities() {
        let (mut manager, sink) = manager_with(HashMap::new());
        manager.create_object(image_info(None)).unwrap();
        manager.create_object(image_info(None)).unwrap();

        assert_eq!(manager.cache.len(), 2);

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        let bim = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xFB]).count();
        assert_eq!(bim, 2);
    }

    #[test]
    fn test_inline_level_embeds_on_page() {
        let (mut manager, sink) = manager_with(HashMap::new());
        let mut info = image_info(Some("file:img/logo"));
        info.resource.level = ResourceLevel::Inline;
        manager.create_object(info).unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        // embedded inside the page, no resource wrapper, no include
        assert!(!out.windows(3).any(|w| w == [0xD3, 0xA8, 0xCE]));
        assert!(!out.windows(3).any(|w| w == [0xD3, 0xAF, 0xC3]));
        let page = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xAF]).unwrap();
        let image = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xFB]).unwrap();
        assert!(page < image);
    }

    #[test]
    fn test_page_segment_wrapping_renames() {
        let (mut manager, sink) = manager_with(HashMap::new());
        let mut info = image_info(Some("file:img/seg"));
        info.create_page_segment = true;
        manager.create_object(info).unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        // the page segment carries the derived S10 name
        let bps = out.windows(3).position(|w| w == [0xD3, 0xA8, 0x5F]).unwrap();
        let name = &out[bps + 6..bps + 14];
        assert_eq!(name, &crate::encoding::encode_name("S1000001"));
        // include-page-segment record on the page
        assert!(out.windows(3).any(|w| w == [0xD3, 0xAF, 0x5F]));
    }

    #[test]
    fn test_page_segment_placement_keeps_device_coordinates() {
        let (mut manager, sink) = manager_with(HashMap::new());
        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.start_page(6240, 4800, 90, 240, 240).unwrap();

        let mut info = image_info(Some("file:img/seg"));
        info.create_page_segment = true;
        info.area.x = 100;
        info.area.y = 200;
        manager.create_object(info).unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        // the include record carries the area origin untouched even on
        // a rotated page, matching the include-object path
        let out = sink.contents();
        let ips = out.windows(3).position(|w| w == [0xD3, 0xAF, 0x5F]).unwrap();
        let x = u32::from_be_bytes([0, out[ips + 14], out[ips + 15], out[ips + 16]]);
        let y = u32::from_be_bytes([0, out[ips + 17], out[ips + 18], out[ips + 19]]);
        assert_eq!((x, y), (100, 200));
    }

    #[test]
    fn test_non_includable_container_embeds_inline() {
        let (mut manager, sink) = manager_with(HashMap::new());
        let info = DataObjectInfo {
            resource: ResourceInfo {
                name: None,
                uri: Some("file:doc.eps".to_string()),
                level: ResourceLevel::PrintFile,
            },
            area: ObjectAreaInfo::default(),
            create_page_segment: false,
            content: DataObjectContent::Container(crate::resource::ContainerObjectInfo {
                object_type: object_types::EPS,
                data: Bytes::from_static(b"%!PS"),
            }),
        };
        manager.create_object(info).unwrap();
        assert!(manager.cache.is_empty());

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        assert!(!out.windows(3).any(|w| w == [0xD3, 0xAF, 0xC3]));
        assert!(out.windows(3).any(|w| w == [0xD3, 0xA8, 0x92]));
    }

    #[test]
    fn test_included_resource_is_idempotent() {
        let mut inputs = HashMap::new();
        inputs.insert("C0H20000".to_string(), vec![0x01, 0x02, 0x03]);
        let (mut manager, sink) = manager_with(inputs);

        manager
            .create_included_resource("C0H20000", None, resource_type::FONT_CHARACTER_SET, false, None)
            .unwrap();
        manager
            .create_included_resource("C0H20000", None, resource_type::FONT_CHARACTER_SET, false, None)
            .unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        let brs = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xCE]).count();
        assert_eq!(brs, 1);
    }

    #[test]
    fn test_truetype_collection_is_rejected() {
        let mut inputs = HashMap::new();
        inputs.insert("font.ttc".to_string(), vec![0x00]);
        let (mut manager, _sink) = manager_with(inputs);

        let err = manager.create_included_resource(
            "NotoSans",
            Some("font.ttc"),
            resource_type::OBJECT_CONTAINER,
            true,
            Some("Noto Sans Regular"),
        );
        match err {
            Err(Error::UnsupportedFont(msg)) => assert!(msg.contains("Noto Sans Regular")),
            other => panic!("expected unsupported font, got {other:?}"),
        }
    }

    #[test]
    fn test_embed_font_skips_unembeddable() {
        let (mut manager, _sink) = manager_with(HashMap::new());

        struct MetricsOnly;
        impl Font for MetricsOnly {
            fn font_name(&self) -> &str {
                "F1"
            }
            fn kind(&self) -> &FontKind {
                &FontKind::Raster
            }
            fn is_embeddable(&self) -> bool {
                false
            }
            fn char_width(&self, _ch: char) -> i32 {
                500
            }
        }

        let cs = CharacterSet {
            name: "C0H20000".to_string(),
            code_page: "T1V10500".to_string(),
            uri: Some("C0H20000".to_string()),
            space_width: 250,
        };
        manager.embed_font(&MetricsOnly, &cs).unwrap();
        assert!(manager.cache.is_empty());
    }

    #[test]
    fn test_external_resource_copy() {
        // build a little resource file containing two wrapped resources
        let mut file = Vec::new();
        for name in ["AAAA", "BBBB"] {
            let mut res = ResourceObject::new(
                name.to_string(),
                resource_type::FONT_CHARACTER_SET,
                ResourceContent::Included(IncludedResourceObject {
                    name: name.to_string(),
                    data: Bytes::new(),
                }),
            );
            use crate::modca::field::StructuredObject;
            res.write(&mut file).unwrap();
        }
        let mut inputs = HashMap::new();
        inputs.insert("resources.afp".to_string(), file);
        let (mut manager, sink) = manager_with(inputs);

        manager
            .create_included_resource_from_external("BBBB", "resources.afp")
            .unwrap();

        let ds = manager.data_stream_mut().unwrap();
        ds.end_page().unwrap();
        ds.end_document().unwrap();
        manager.write_to_stream().unwrap();

        let out = sink.contents();
        let brs = out.windows(3).filter(|w| w == &[0xD3, 0xA8, 0xCE]).count();
        assert_eq!(brs, 1);
        // the copied resource keeps its name
        let pos = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xCE]).unwrap();
        assert_eq!(&out[pos + 6..pos + 10], &crate::encoding::encode_name("BBBB")[..4]);
    }
}
