//! Presentation text objects (PTOCA content carried in MO:DCA fields).

use std::io::Write;

use crate::error::Result;
use crate::modca::field::{self, category_code, type_code, StructuredObject};
use crate::ptoca::{ControlSequenceSink, PtocaBuilder, PtocaState, ESCAPE};

/// Content budget of one presentation text data field.
const MAX_DATA_LEN: usize = 8192;

/// One PTX structured field worth of chained control sequences. The
/// buffer always opens with the control sequence escape.
#[derive(Debug)]
pub struct PresentationTextData {
    buf: Vec<u8>,
}

impl PresentationTextData {
    fn new() -> Self {
        Self { buf: ESCAPE.to_vec() }
    }

    fn bytes_available(&self) -> usize {
        MAX_DATA_LEN - self.buf.len()
    }
}

/// Chunk list implementing the builder sink: sequences that no longer
/// fit the current data field start a fresh one.
#[derive(Debug, Default)]
pub(crate) struct TextChunks {
    chunks: Vec<PresentationTextData>,
}

impl ControlSequenceSink for TextChunks {
    fn stream_for(&mut self, len: usize) -> &mut Vec<u8> {
        let needs_new = match self.chunks.last() {
            Some(chunk) => chunk.bytes_available() < len,
            None => true,
        };
        if needs_new {
            self.chunks.push(PresentationTextData::new());
        }
        &mut self.chunks.last_mut().expect("chunk just ensured").buf
    }
}

/// A named presentation text object: begin field, one or more PTX data
/// fields, end field. The PTOCA modal state lives for the whole object
/// so consecutive text runs on a page share suppression context.
#[derive(Debug)]
pub struct PresentationTextObject {
    name: String,
    chunks: TextChunks,
    state: PtocaState,
}

impl PresentationTextObject {
    /// Create an empty text object with the given name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            chunks: TextChunks::default(),
            state: PtocaState::default(),
        }
    }

    /// The object name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run a producer against a PTOCA builder bound to this object.
    pub fn create_control_sequences<F>(&mut self, produce: F) -> Result<()>
    where
        F: FnOnce(&mut PtocaBuilder<'_>) -> Result<()>,
    {
        let mut builder = PtocaBuilder::new(&mut self.chunks, &mut self.state);
        produce(&mut builder)
    }

    /// Terminate the chained control sequence. Called when the page is
    /// done adding text to this object.
    pub fn end_control_sequence(&mut self) -> Result<()> {
        self.create_control_sequences(|builder| builder.end_chained_control_sequence())
    }
}

impl StructuredObject for PresentationTextObject {
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        field::write_begin(out, category_code::PRESENTATION_TEXT, &self.name)?;
        for chunk in &self.chunks.chunks {
            field::write_field(out, type_code::DATA, category_code::PRESENTATION_TEXT, &chunk.buf)?;
        }
        field::write_end(out, category_code::PRESENTATION_TEXT, &self.name)
    }
}
