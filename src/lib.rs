// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
#![allow(clippy::match_like_matches_macro)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # AFP Oxide
//!
//! AFP (MO:DCA/IOCA/PTOCA) document writer: structured-field assembly,
//! resource caching, streamed output composition.
//!
//! ## Core Features
//!
//! ### Document Assembly
//! - **MO:DCA Structure**: documents, page groups, pages and overlays as
//!   incrementally flushed structured-field containers
//! - **Presentation Text**: PTOCA control sequence builder with modal
//!   state suppression and fixed-width space handling
//! - **Images & Graphics**: IOCA FS10/FS45 image segments, GOCA drawing
//!   order objects, foreign payloads in object containers
//! - **Indexing**: tag logical elements, no-operation records, medium
//!   map invocation
//!
//! ### Resource Handling
//! - **Caching**: each distinct resource identity (name, uri, level) is
//!   encoded once and re-placed by include records
//! - **Levels**: inline, page, page group, document, print file and
//!   external resource files
//! - **Font Embedding**: raster/outline character sets and code pages,
//!   TrueType carried in object containers
//! - **External Copy**: lift named resources out of existing AFP
//!   resource files verbatim
//!
//! ### Output
//! - **Two-Phase Writing**: the document body spools to a temporary file
//!   while print-file resources stream to the head of the output
//! - **Configuration**: JSON output configuration for resource level
//!   defaults and external destinations
//!
//! ## Quick Start
//!
//! ```ignore
//! use afp_oxide::{DataObjectInfo, OutputConfig, PaintingState, ResourceManager};
//! use afp_oxide::resource::streamer::FileResolver;
//!
//! # fn main() -> afp_oxide::Result<()> {
//! let resolver = Box::new(FileResolver::new("."));
//! let mut manager = ResourceManager::new(resolver);
//! let output = std::fs::File::create("out.afp")?;
//! manager.create_data_stream(PaintingState::new(240), Box::new(output))?;
//!
//! let ds = manager.data_stream_mut()?;
//! ds.start_document()?;
//! ds.start_page(4800, 6240, 0, 240, 240)?;
//! // place text, images, lines ...
//! ds.end_page()?;
//! ds.end_document()?;
//! manager.write_to_stream()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod datastream;
pub mod encoding;
pub mod error;
pub mod fonts;
pub mod modca;
pub mod naming;
pub mod painting_state;
pub mod ptoca;
pub mod resource;

pub use config::OutputConfig;
pub use datastream::{DataStream, LineDataInfo, TextDataInfo};
pub use error::{Error, Result};
pub use fonts::{CharacterSet, Font, FontKind};
pub use painting_state::{Color, PaintingState};
pub use resource::manager::ResourceManager;
pub use resource::streamer::{FileResolver, ResourceResolver};
pub use resource::{DataObjectContent, DataObjectInfo, ResourceInfo, ResourceKind, ResourceLevel};
