//! Resource identity, caching levels and data object descriptions.

pub mod manager;
pub mod streamer;

use std::str::FromStr;

use bytes::Bytes;
use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::modca::ObjectAreaInfo;

/// Where a resource is stored and therefore how widely it is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceLevel {
    /// Embedded at the point of use, never shared.
    Inline,
    /// Page-level resource group.
    Page,
    /// Page-group-level resource group.
    PageGroup,
    /// Document-level resource group.
    Document,
    /// Print-file-level resource group at the start of the output.
    PrintFile,
    /// A separate resource file next to the output.
    External {
        /// Destination of the resource file; the configured default is
        /// used when absent.
        uri: Option<String>,
    },
}

impl ResourceLevel {
    pub fn is_inline(&self) -> bool {
        matches!(self, ResourceLevel::Inline)
    }

    pub fn is_print_file(&self) -> bool {
        matches!(self, ResourceLevel::PrintFile)
    }

    pub fn is_external(&self) -> bool {
        matches!(self, ResourceLevel::External { .. })
    }
}

impl std::fmt::Display for ResourceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLevel::Inline => write!(f, "inline"),
            ResourceLevel::Page => write!(f, "page"),
            ResourceLevel::PageGroup => write!(f, "page-group"),
            ResourceLevel::Document => write!(f, "document"),
            ResourceLevel::PrintFile => write!(f, "print-file"),
            ResourceLevel::External { uri: Some(uri) } => write!(f, "external({uri})"),
            ResourceLevel::External { uri: None } => write!(f, "external"),
        }
    }
}

impl FromStr for ResourceLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(ResourceLevel::Inline),
            "page" => Ok(ResourceLevel::Page),
            "page-group" => Ok(ResourceLevel::PageGroup),
            "document" => Ok(ResourceLevel::Document),
            "print-file" => Ok(ResourceLevel::PrintFile),
            "external" => Ok(ResourceLevel::External { uri: None }),
            other => Err(Error::InvalidConfig(format!("unknown resource level: {other}"))),
        }
    }
}

/// Cache identity of a resource: source name, source location and the
/// level it is kept at. Two descriptions naming the same name, uri and
/// level refer to one cached resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceInfo {
    pub name: Option<String>,
    pub uri: Option<String>,
    pub level: ResourceLevel,
}

impl ResourceInfo {
    pub fn new(level: ResourceLevel) -> Self {
        Self { name: None, uri: None, level }
    }
}

/// Kinds of data objects a resource level default can be configured
/// for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Graphics,
    ObjectContainer,
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(ResourceKind::Image),
            "graphics" => Ok(ResourceKind::Graphics),
            "object-container" => Ok(ResourceKind::ObjectContainer),
            other => Err(Error::InvalidConfig(format!("unknown resource kind: {other}"))),
        }
    }
}

/// Per-kind default resource levels, merged from configuration.
#[derive(Debug, Clone)]
pub struct ResourceLevelDefaults {
    levels: IndexMap<ResourceKind, ResourceLevel>,
}

impl Default for ResourceLevelDefaults {
    fn default() -> Self {
        let mut levels = IndexMap::new();
        levels.insert(ResourceKind::Image, ResourceLevel::PrintFile);
        levels.insert(ResourceKind::Graphics, ResourceLevel::Inline);
        levels.insert(ResourceKind::ObjectContainer, ResourceLevel::PrintFile);
        Self { levels }
    }
}

impl ResourceLevelDefaults {
    /// The default level for a data object kind.
    pub fn level_for(&self, kind: ResourceKind) -> ResourceLevel {
        self.levels
            .get(&kind)
            .cloned()
            .unwrap_or(ResourceLevel::PrintFile)
    }

    pub fn set_level(&mut self, kind: ResourceKind, level: ResourceLevel) {
        self.levels.insert(kind, level);
    }

    /// Overlay another set of defaults on top of this one.
    pub fn merge(&mut self, other: &ResourceLevelDefaults) {
        for (kind, level) in &other.levels {
            self.levels.insert(*kind, level.clone());
        }
    }
}

/// Registered object type of a container payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectType {
    /// Registry name placed in the object classification triplet.
    pub name: &'static str,
    /// Registered object identifier.
    pub object_id: &'static [u8],
    /// Whether the object may be referenced by an include-object record
    /// rather than copied inline.
    pub includable: bool,
}

/// The MO:DCA object type registry entries this writer emits.
pub mod object_types {
    use super::ObjectType;

    pub const EPS: ObjectType = ObjectType {
        name: "EPS",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x0D],
        includable: false,
    };
    pub const TIFF: ObjectType = ObjectType {
        name: "TIFF",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x0E],
        includable: true,
    };
    pub const GIF: ObjectType = ObjectType {
        name: "GIF",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x16],
        includable: true,
    };
    pub const JFIF: ObjectType = ObjectType {
        name: "JFIF",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x17],
        includable: true,
    };
    pub const PDF: ObjectType = ObjectType {
        name: "PDF",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x19],
        includable: true,
    };
    pub const PCL: ObjectType = ObjectType {
        name: "PCL",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x22],
        includable: false,
    };
    pub const TRUETYPE: ObjectType = ObjectType {
        name: "TRUETYPE",
        object_id: &[0x06, 0x07, 0x2B, 0x12, 0x00, 0x04, 0x01, 0x01, 0x33],
        includable: true,
    };

    /// Look up the registry entry for a MIME type.
    pub fn for_mime(mime: &str) -> Option<ObjectType> {
        match mime {
            "application/postscript" => Some(EPS),
            "image/tiff" => Some(TIFF),
            "image/gif" => Some(GIF),
            "image/jpeg" => Some(JFIF),
            "application/pdf" => Some(PDF),
            "application/vnd.hp-PCL" | "application/x-pcl" => Some(PCL),
            "application/x-font-truetype" | "font/ttf" | "font/otf" => Some(TRUETYPE),
            _ => None,
        }
    }
}

/// Raster content of an image data object.
#[derive(Debug, Clone)]
pub struct ImageObjectInfo {
    pub width: u16,
    pub height: u16,
    pub bits_per_pixel: u8,
    pub compression: Option<u8>,
    pub data: Bytes,
}

/// Drawing order content of a graphics data object.
#[derive(Debug, Clone)]
pub struct GraphicsObjectInfo {
    pub orders: Bytes,
}

/// Foreign payload carried in an object container.
#[derive(Debug, Clone)]
pub struct ContainerObjectInfo {
    pub object_type: ObjectType,
    pub data: Bytes,
}

/// The payload of a data object, by kind.
#[derive(Debug, Clone)]
pub enum DataObjectContent {
    Image(ImageObjectInfo),
    Graphics(GraphicsObjectInfo),
    Container(ContainerObjectInfo),
}

impl DataObjectContent {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DataObjectContent::Image(_) => ResourceKind::Image,
            DataObjectContent::Graphics(_) => ResourceKind::Graphics,
            DataObjectContent::Container(_) => ResourceKind::ObjectContainer,
        }
    }

    /// Drop the payload, keeping only the descriptive fields. Cached
    /// entries hold the description; the bytes have already been
    /// written.
    pub fn clear_data(&mut self) {
        match self {
            DataObjectContent::Image(i) => i.data = Bytes::new(),
            DataObjectContent::Graphics(g) => g.orders = Bytes::new(),
            DataObjectContent::Container(c) => c.data = Bytes::new(),
        }
    }
}

/// Everything needed to create or re-reference one data object.
#[derive(Debug, Clone)]
pub struct DataObjectInfo {
    pub resource: ResourceInfo,
    pub area: ObjectAreaInfo,
    /// Wrap the object in a page segment so devices that cannot include
    /// data resources can still reference it.
    pub create_page_segment: bool,
    pub content: DataObjectContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_info_value_identity() {
        let a = ResourceInfo {
            name: Some("logo".to_string()),
            uri: Some("file:img/logo.png".to_string()),
            level: ResourceLevel::PrintFile,
        };
        let b = a.clone();
        assert_eq!(a, b);

        let mut c = a.clone();
        c.level = ResourceLevel::Document;
        assert_ne!(a, c);
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!("print-file".parse::<ResourceLevel>().unwrap(), ResourceLevel::PrintFile);
        assert_eq!(
            " External ".parse::<ResourceLevel>().unwrap(),
            ResourceLevel::External { uri: None }
        );
        assert!("bogus".parse::<ResourceLevel>().is_err());
    }

    #[test]
    fn test_defaults_merge() {
        let mut defaults = ResourceLevelDefaults::default();
        assert_eq!(defaults.level_for(ResourceKind::Graphics), ResourceLevel::Inline);

        let mut overlay = ResourceLevelDefaults::default();
        overlay.set_level(ResourceKind::Graphics, ResourceLevel::Document);
        defaults.merge(&overlay);
        assert_eq!(defaults.level_for(ResourceKind::Graphics), ResourceLevel::Document);
        assert_eq!(defaults.level_for(ResourceKind::Image), ResourceLevel::PrintFile);
    }

    #[test]
    fn test_object_type_lookup() {
        let pdf = object_types::for_mime("application/pdf").unwrap();
        assert_eq!(pdf.name, "PDF");
        assert_eq!(pdf.object_id[8], 0x19);
        assert!(pdf.includable);
        assert!(!object_types::EPS.includable);
        assert!(object_types::for_mime("text/plain").is_none());
    }
}
