//! Document Assembly Integration Tests
//!
//! End-to-end assembly through the resource manager and data stream:
//! - Structured field chaining: every field in the final output starts
//!   with the carriage control byte and its length walks exactly to the
//!   next field
//! - Scope nesting: document, page group, page, overlay
//! - Text, rules and indexing records on pages

use std::io;
use std::io::Write;
use std::sync::{Arc, Mutex};

use afp_oxide::fonts::{CharacterSet, Font, FontKind};
use afp_oxide::{
    Color, DataStream, LineDataInfo, PaintingState, ResourceManager, ResourceResolver,
    TextDataInfo,
};

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

struct NullResolver;

impl ResourceResolver for NullResolver {
    fn resolve_output(&self, _uri: &str) -> io::Result<Box<dyn Write>> {
        Ok(Box::new(SharedBuf::default()))
    }

    fn resolve_input(&self, uri: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::NotFound, uri.to_string()))
    }
}

/// Walk the output as a chain of structured fields, asserting the
/// framing is exact, and return the (type, category) sequence.
fn field_ids(stream: &[u8]) -> Vec<(u8, u8)> {
    let mut ids = Vec::new();
    let mut pos = 0usize;
    while pos < stream.len() {
        assert_eq!(stream[pos], 0x5A, "carriage control expected at offset {pos}");
        let len = u16::from_be_bytes([stream[pos + 1], stream[pos + 2]]) as usize;
        assert!(len >= 8, "field at offset {pos} shorter than its introducer");
        assert_eq!(stream[pos + 3], 0xD3, "class byte at offset {pos}");
        ids.push((stream[pos + 4], stream[pos + 5]));
        pos += 1 + len;
    }
    assert_eq!(pos, stream.len(), "trailing bytes after the last field");
    ids
}

struct FixedFont;

impl Font for FixedFont {
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

fn char_set() -> CharacterSet {
    CharacterSet {
        name: "C0H20000".to_string(),
        code_page: "T1V10500".to_string(),
        uri: None,
        space_width: 500,
    }
}

fn manager() -> (ResourceManager, SharedBuf) {
    let mut manager = ResourceManager::new(Box::new(NullResolver));
    let sink = SharedBuf::default();
    manager
        .create_data_stream(PaintingState::new(240), Box::new(sink.clone()))
        .unwrap();
    (manager, sink)
}

fn ds(manager: &mut ResourceManager) -> &mut DataStream {
    manager.data_stream_mut().unwrap()
}

#[test]
fn test_full_document_is_a_well_formed_field_chain() {
    let (mut manager, sink) = manager();
    let font = FixedFont;
    let cs = char_set();

    let stream = ds(&mut manager);
    stream.start_document().unwrap();
    stream.set_document_name("INVOICE1").unwrap();
    stream.start_page_group(false).unwrap();

    for page in 0..2 {
        stream.start_page(4800, 6240, 0, 240, 240).unwrap();
        stream.create_font(1, &cs).unwrap();
        stream
            .create_text(
                &TextDataInfo {
                    x: 240,
                    y: 300 + page * 100,
                    color: Color::BLACK,
                    font_reference: 1,
                    text: format!("page {page}"),
                    letter_spacing: 0,
                    word_spacing: 0,
                },
                &font,
                &cs,
            )
            .unwrap();
        stream
            .create_line(&LineDataInfo {
                x1: 240,
                y1: 400,
                x2: 2400,
                y2: 400,
                thickness: 4,
                color: Color::BLACK,
            })
            .unwrap();
        stream.create_tag_logical_element("PageNo", &page.to_string(), 0).unwrap();
        stream.end_page().unwrap();
    }

    stream.end_page_group().unwrap();
    stream.create_no_operation("produced by afp_oxide").unwrap();
    stream.end_document().unwrap();
    manager.write_to_stream().unwrap();

    let out = sink.contents();
    let ids = field_ids(&out);

    assert_eq!(ids.first(), Some(&(0xA8, 0xA8)), "output opens with begin document");
    assert_eq!(ids.last(), Some(&(0xA9, 0xA8)), "output closes with end document");

    let pages = ids.iter().filter(|id| **id == (0xA8, 0xAF)).count();
    assert_eq!(pages, 2);
    let groups = ids.iter().filter(|id| **id == (0xA8, 0xAD)).count();
    assert_eq!(groups, 1);
    // each page carries an environment group and presentation text
    assert_eq!(ids.iter().filter(|id| **id == (0xA8, 0xC9)).count(), 2);
    assert!(ids.contains(&(0xEE, 0x9B)));
    assert!(ids.contains(&(0xA0, 0x90)));
    assert!(ids.contains(&(0xEE, 0xEE)));
}

#[test]
fn test_document_name_rides_the_begin_field() {
    let (mut manager, sink) = manager();
    let stream = ds(&mut manager);
    stream.start_document().unwrap();
    stream.set_document_name("INVOICE1").unwrap();
    stream.end_document().unwrap();
    manager.write_to_stream().unwrap();

    let out = sink.contents();
    // begin document longer than a bare named begin field: it carries
    // the fully qualified name triplet
    let len = u16::from_be_bytes([out[1], out[2]]) as usize;
    assert!(len > 16);
}

#[test]
fn test_overlay_is_a_page_resource() {
    let (mut manager, sink) = manager();
    let stream = ds(&mut manager);
    stream.start_document().unwrap();
    stream.start_page(4800, 6240, 0, 240, 240).unwrap();
    stream.start_overlay(120, 120, 960, 480, 240, 240, 0).unwrap();
    stream
        .create_line(&LineDataInfo {
            x1: 0,
            y1: 0,
            x2: 960,
            y2: 0,
            thickness: 2,
            color: Color::BLACK,
        })
        .unwrap();
    stream.end_overlay().unwrap();
    stream.end_page().unwrap();
    stream.end_document().unwrap();
    manager.write_to_stream().unwrap();

    let ids = field_ids(&sink.contents());
    let brg = ids.iter().position(|id| *id == (0xA8, 0xC6)).unwrap();
    let bmo = ids.iter().position(|id| *id == (0xA8, 0xDF)).unwrap();
    let ipo = ids.iter().position(|id| *id == (0xAF, 0xD8)).unwrap();
    let bag = ids.iter().position(|id| *id == (0xA8, 0xC9)).unwrap();
    // overlay definition inside the page's resource group, before the
    // page environment, and an include record after it
    assert!(brg < bmo);
    assert!(bmo < bag);
    assert!(bag < ipo);
}

#[test]
fn test_rotated_page_text_is_remapped() {
    let (mut manager, sink) = manager();
    let font = FixedFont;
    let cs = char_set();
    let stream = ds(&mut manager);
    stream.start_document().unwrap();
    stream.start_page(6240, 4800, 90, 240, 240).unwrap();
    stream
        .create_text(
            &TextDataInfo {
                x: 100,
                y: 200,
                color: Color::BLACK,
                font_reference: 1,
                text: "rotated".to_string(),
                letter_spacing: 0,
                word_spacing: 0,
            },
            &font,
            &cs,
        )
        .unwrap();
    stream.end_page().unwrap();
    stream.end_document().unwrap();
    manager.write_to_stream().unwrap();

    let out = sink.contents();
    // text orientation control sequence set to 90 degrees: I-axis at
    // 0x2D00, B-axis at 0x5A00
    assert!(out.windows(6).any(|w| w == [0x06, 0xF7, 0x2D, 0x00, 0x5A, 0x00]));
    field_ids(&out);
}

#[test]
fn test_medium_map_invocation_targets_the_group() {
    let (mut manager, sink) = manager();
    let stream = ds(&mut manager);
    stream.start_document().unwrap();
    stream.start_page_group(false).unwrap();
    stream.create_invoke_medium_map("TRAY2").unwrap();
    stream.start_page(100, 100, 0, 240, 240).unwrap();
    stream.end_page().unwrap();
    stream.end_page_group().unwrap();
    stream.end_document().unwrap();
    manager.write_to_stream().unwrap();

    let ids = field_ids(&sink.contents());
    let bpg = ids.iter().position(|id| *id == (0xA8, 0xAD)).unwrap();
    let imm = ids.iter().position(|id| *id == (0xAB, 0xCC)).unwrap();
    let page = ids.iter().position(|id| *id == (0xA8, 0xAF)).unwrap();
    assert!(bpg < imm && imm < page);
}
