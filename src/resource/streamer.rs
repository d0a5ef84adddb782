//! Destination routing for resources and the final output copy.
//!
//! The streamer owns everything that writes to a real sink: the
//! print-file level resource group at the head of the output, external
//! resource files resolved by URI, and the close-time copy of the
//! spooled document body into the output behind the print-file
//! resources.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::PathBuf;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::datastream::DataStream;
use crate::error::{Error, Result};
use crate::modca::resource_group::{ResourceGroup, ResourceMember, StreamedResourceGroup};
use crate::painting_state::PaintingState;
use crate::resource::ResourceLevel;

/// Destination of external-level resources when no URI is configured.
pub const DEFAULT_EXTERNAL_RESOURCE_FILE: &str = "resources.afp";

/// Resolves resource URIs to byte sinks and sources.
pub trait ResourceResolver {
    /// Open a sink for an external resource file.
    fn resolve_output(&self, uri: &str) -> io::Result<Box<dyn Write>>;

    /// Read the bytes of a resource (font file, AFP resource file).
    fn resolve_input(&self, uri: &str) -> io::Result<Vec<u8>>;
}

/// Resolver backed by the filesystem, relative to a base directory.
#[derive(Debug)]
pub struct FileResolver {
    base: PathBuf,
}

impl FileResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    fn path_for(&self, uri: &str) -> PathBuf {
        let trimmed = uri.strip_prefix("file:").unwrap_or(uri);
        self.base.join(trimmed)
    }
}

impl ResourceResolver for FileResolver {
    fn resolve_output(&self, uri: &str) -> io::Result<Box<dyn Write>> {
        let file = File::create(self.path_for(uri))?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn resolve_input(&self, uri: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.path_for(uri))
    }
}

/// A resource group selected by level: either buffered inside the
/// document tree or streamed straight to a sink.
pub enum ResourceGroupRef<'a> {
    Plain(&'a mut ResourceGroup),
    Streamed(&'a mut StreamedResourceGroup),
}

impl ResourceGroupRef<'_> {
    /// Add a member to the group; streamed groups write it out
    /// immediately.
    pub fn add_object(&mut self, member: ResourceMember) -> Result<()> {
        match self {
            ResourceGroupRef::Plain(group) => {
                group.add_object(member);
                Ok(())
            },
            ResourceGroupRef::Streamed(group) => group.add_object(member),
        }
    }
}

/// Routes resources to their destination groups and performs the final
/// spool-to-output copy.
pub struct ResourceStreamer {
    resolver: Box<dyn ResourceResolver>,
    default_group_uri: String,
    external_groups: IndexMap<String, StreamedResourceGroup>,
    print_file_group: Option<StreamedResourceGroup>,
    output: Option<Box<dyn Write>>,
}

impl std::fmt::Debug for ResourceStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStreamer")
            .field("default_group_uri", &self.default_group_uri)
            .field("external_groups", &self.external_groups.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ResourceStreamer {
    pub fn new(resolver: Box<dyn ResourceResolver>) -> Self {
        Self {
            resolver,
            default_group_uri: DEFAULT_EXTERNAL_RESOURCE_FILE.to_string(),
            external_groups: IndexMap::new(),
            print_file_group: None,
            output: None,
        }
    }

    pub fn resolver(&self) -> &dyn ResourceResolver {
        &*self.resolver
    }

    /// Set the destination for external-level resources with no
    /// explicit URI.
    pub fn set_default_resource_group_uri(&mut self, uri: &str) {
        self.default_group_uri = uri.to_string();
    }

    /// Bind the real output sink and create the assembler that spools
    /// the document body.
    pub fn create_data_stream(
        &mut self,
        painting_state: PaintingState,
        output: Box<dyn Write>,
    ) -> Result<DataStream> {
        self.output = Some(output);
        let spool = tempfile::tempfile()?;
        Ok(DataStream::new(painting_state, Box::new(spool)))
    }

    fn external_uri(&self, level: &ResourceLevel) -> String {
        match level {
            ResourceLevel::External { uri: Some(uri) } => uri.clone(),
            _ => self.default_group_uri.clone(),
        }
    }

    /// Make sure the streamed group for a print-file or external level
    /// exists. Returns false when an external destination cannot be
    /// opened; the caller then embeds the resource inline instead of
    /// failing the document.
    pub(crate) fn prepare_group(
        &mut self,
        level: &ResourceLevel,
        names: &mut crate::naming::NameFactory,
    ) -> Result<bool> {
        match level {
            ResourceLevel::PrintFile => {
                if self.print_file_group.is_some() {
                    return Ok(true);
                }
                let output = self.output.take().ok_or_else(|| {
                    Error::InvalidState("no output bound for print-file resources".to_string())
                })?;
                self.print_file_group =
                    Some(StreamedResourceGroup::new(names.resource_group_name(), output));
                Ok(true)
            },
            ResourceLevel::External { .. } => {
                let uri = self.external_uri(level);
                if self.external_groups.contains_key(&uri) {
                    return Ok(true);
                }
                match self.resolver.resolve_output(&uri) {
                    Ok(sink) => {
                        debug!("opened external resource group at {uri}");
                        let group =
                            StreamedResourceGroup::new(names.resource_group_name(), sink);
                        self.external_groups.insert(uri, group);
                        Ok(true)
                    },
                    Err(e) => {
                        warn!("could not open external resource file {uri}: {e}");
                        Ok(false)
                    },
                }
            },
            _ => Ok(false),
        }
    }

    pub(crate) fn streamed_group(
        &mut self,
        level: &ResourceLevel,
    ) -> Option<&mut StreamedResourceGroup> {
        match level {
            ResourceLevel::PrintFile => self.print_file_group.as_mut(),
            ResourceLevel::External { .. } => {
                let uri = self.external_uri(level);
                self.external_groups.get_mut(&uri)
            },
            _ => None,
        }
    }

    /// The resource group a level routes to: none for inline, a
    /// streamed group for print-file and external levels, and the
    /// assembler's buffered group for the structural levels.
    pub fn resource_group<'a>(
        &'a mut self,
        level: &ResourceLevel,
        data_stream: &'a mut DataStream,
    ) -> Result<Option<ResourceGroupRef<'a>>> {
        match level {
            ResourceLevel::Inline => Ok(None),
            ResourceLevel::PrintFile | ResourceLevel::External { .. } => {
                if !self.prepare_group(level, data_stream.names_mut())? {
                    return Ok(None);
                }
                Ok(self.streamed_group(level).map(ResourceGroupRef::Streamed))
            },
            _ => data_stream
                .resource_group_for(level)
                .map(|g| Some(ResourceGroupRef::Plain(g))),
        }
    }

    /// Close every resource destination and copy the spooled document
    /// body into the output behind the print-file resource group.
    pub fn close(&mut self, data_stream: DataStream) -> Result<()> {
        let external: Vec<StreamedResourceGroup> =
            self.external_groups.drain(..).map(|(_, g)| g).collect();
        for group in external {
            group.finish()?;
        }
        let mut output = match self.print_file_group.take() {
            Some(group) => group.finish()?,
            None => self.output.take().ok_or_else(|| {
                Error::InvalidState("output already consumed".to_string())
            })?,
        };
        let (mut spool, complete) = data_stream.into_spool();
        if !complete {
            warn!("closing output for a document that was never ended");
        }
        spool.seek(SeekFrom::Start(0))?;
        io::copy(&mut spool, &mut output)?;
        output.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
        sinks: Mutex<Vec<(String, SharedBuf)>>,
        fail_outputs: bool,
    }

    impl MemoryResolver {
        fn new(fail_outputs: bool) -> Self {
            Self { sinks: Mutex::new(Vec::new()), fail_outputs }
        }
    }

    impl ResourceResolver for MemoryResolver {
        fn resolve_output(&self, uri: &str) -> io::Result<Box<dyn Write>> {
            if self.fail_outputs {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
            }
            let buf = SharedBuf::default();
            self.sinks.lock().unwrap().push((uri.to_string(), buf.clone()));
            Ok(Box::new(buf))
        }

        fn resolve_input(&self, _uri: &str) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no inputs"))
        }
    }

    fn spooled_stream() -> DataStream {
        DataStream::new(
            PaintingState::new(240),
            Box::new(io::Cursor::new(Vec::new())),
        )
    }

    #[test]
    fn test_print_file_resources_precede_document() {
        let mut streamer = ResourceStreamer::new(Box::new(MemoryResolver::new(false)));
        let sink = SharedBuf::default();
        streamer.output = Some(Box::new(sink.clone()));

        let mut ds = spooled_stream();
        ds.start_document().unwrap();
        ds.end_document().unwrap();

        let ok = streamer
            .prepare_group(&ResourceLevel::PrintFile, ds.names_mut())
            .unwrap();
        assert!(ok);
        streamer
            .streamed_group(&ResourceLevel::PrintFile)
            .unwrap()
            .add_object(ResourceMember::Raw(bytes::Bytes::from_static(&[0x00])))
            .unwrap();

        streamer.close(ds).unwrap();
        let out = sink.contents();
        let erg = out.windows(3).position(|w| w == [0xD3, 0xA9, 0xC6]).unwrap();
        let bdt = out.windows(3).position(|w| w == [0xD3, 0xA8, 0xA8]).unwrap();
        assert!(erg < bdt);
    }

    #[test]
    fn test_unopenable_external_destination_degrades() {
        let mut streamer = ResourceStreamer::new(Box::new(MemoryResolver::new(true)));
        let mut names = crate::naming::NameFactory::new();
        let level = ResourceLevel::External { uri: Some("res.afp".to_string()) };
        assert!(!streamer.prepare_group(&level, &mut names).unwrap());
        assert!(streamer.streamed_group(&level).is_none());
    }

    #[test]
    fn test_external_groups_memoized_by_uri() {
        let resolver = MemoryResolver::new(false);
        let mut streamer = ResourceStreamer::new(Box::new(resolver));
        let mut names = crate::naming::NameFactory::new();
        let level = ResourceLevel::External { uri: Some("res.afp".to_string()) };
        assert!(streamer.prepare_group(&level, &mut names).unwrap());
        assert!(streamer.prepare_group(&level, &mut names).unwrap());
        assert_eq!(streamer.external_groups.len(), 1);

        let default_level = ResourceLevel::External { uri: None };
        assert!(streamer.prepare_group(&default_level, &mut names).unwrap());
        assert_eq!(streamer.external_groups.len(), 2);
        assert!(streamer
            .external_groups
            .contains_key(DEFAULT_EXTERNAL_RESOURCE_FILE));
    }

    #[test]
    fn test_close_without_print_file_group_copies_spool() {
        let mut streamer = ResourceStreamer::new(Box::new(MemoryResolver::new(false)));
        let sink = SharedBuf::default();
        streamer.output = Some(Box::new(sink.clone()));

        let mut ds = spooled_stream();
        ds.start_document().unwrap();
        ds.end_document().unwrap();
        streamer.close(ds).unwrap();

        let out = sink.contents();
        assert_eq!(&out[3..6], &[0xD3, 0xA8, 0xA8]);
    }
}
