//! PTOCA control sequence generation.
//!
//! Presentation text content is a chain of control sequences: an escape
//! (X'2BD3'), then per sequence a length byte, a function type byte with
//! the chain bit set, and parameters. Modal sequences (orientation, font,
//! color, increments) are suppressed when the requested value already
//! matches the current state, which is the main op-code economy lever
//! besides transparent-data batching.

use crate::error::Result;
use crate::painting_state::Color;

/// Escape sequence introducing a chain of control sequences.
pub const ESCAPE: [u8; 2] = [0x2B, 0xD3];

/// Chain bit set on every function type except the terminating NOP.
const CHAIN_BIT: u8 = 0x01;

/// Maximum payload of one transparent data control sequence.
const TRANSPARENT_DATA_MAX_SIZE: usize = 253;

// Function types (unchained values).
const AMI: u8 = 0xC6; // absolute move inline
const RMI: u8 = 0xC8; // relative move inline
const AMB: u8 = 0xD2; // absolute move baseline
const TRN: u8 = 0xDA; // transparent data
const DIR: u8 = 0xE4; // draw I-axis rule
const DBR: u8 = 0xE6; // draw B-axis rule
const STO: u8 = 0xF6; // set text orientation
const SIA: u8 = 0xC2; // set intercharacter adjustment
const SVI: u8 = 0xC4; // set variable space character increment
const SCFL: u8 = 0xF0; // set coded font local
const SEC: u8 = 0x80; // set extended text color
const NOP: u8 = 0xF8; // no operation, terminates the chain

fn chained(function_type: u8) -> u8 {
    function_type | CHAIN_BIT
}

/// Receives encoded control sequences. The text object implements this
/// to chunk sequences into presentation text data fields.
pub trait ControlSequenceSink {
    /// Buffer that the next `len` bytes of control sequence data should
    /// be appended to. Implementations may rotate to a fresh chunk (and
    /// re-emit the escape) when the current one cannot hold `len` bytes.
    fn stream_for(&mut self, len: usize) -> &mut Vec<u8>;
}

/// Modal PTOCA state, persisted for the lifetime of one presentation
/// text object.
#[derive(Debug, Clone)]
pub struct PtocaState {
    x: i32,
    y: i32,
    font: Option<u8>,
    orientation: u16,
    color: Color,
    variable_space_increment: i32,
    inter_character_adjustment: i32,
}

impl Default for PtocaState {
    fn default() -> Self {
        Self {
            x: -1,
            y: -1,
            font: None,
            orientation: 0,
            color: Color::BLACK,
            variable_space_increment: 0,
            inter_character_adjustment: 0,
        }
    }
}

/// Generator for PTOCA control sequences.
pub struct PtocaBuilder<'a> {
    sink: &'a mut dyn ControlSequenceSink,
    state: &'a mut PtocaState,
    buf: Vec<u8>,
}

impl<'a> PtocaBuilder<'a> {
    /// Create a builder writing into `sink` with persistent modal `state`.
    pub fn new(sink: &'a mut dyn ControlSequenceSink, state: &'a mut PtocaState) -> Self {
        Self { sink, state, buf: Vec::with_capacity(64) }
    }

    fn new_control_sequence(&mut self) {
        self.buf.clear();
    }

    fn commit(&mut self, function_type: u8) -> Result<()> {
        let length = self.buf.len() + 2;
        debug_assert!(length < 256);
        let out = self.sink.stream_for(length);
        out.push(length as u8);
        out.push(function_type);
        out.extend_from_slice(&self.buf);
        Ok(())
    }

    fn write_byte(&mut self, data: u8) {
        self.buf.push(data);
    }

    fn write_short(&mut self, data: i32) {
        self.buf.push(((data >> 8) & 0xFF) as u8);
        self.buf.push((data & 0xFF) as u8);
    }

    /// Activate a coded font by its local identifier. Modal.
    pub fn set_coded_font(&mut self, font: u8) -> Result<()> {
        if self.state.font == Some(font) {
            return Ok(());
        }
        self.state.font = Some(font);

        self.new_control_sequence();
        self.write_byte(font);
        self.commit(chained(SCFL))
    }

    /// Establish the presentation position at a new inline coordinate.
    pub fn absolute_move_inline(&mut self, coordinate: i32) -> Result<()> {
        if coordinate == self.state.x {
            return Ok(());
        }
        self.new_control_sequence();
        self.write_short(coordinate);
        self.commit(chained(AMI))?;

        self.state.x = coordinate;
        Ok(())
    }

    /// Move the inline coordinate relative to the current position.
    pub fn relative_move_inline(&mut self, increment: i32) -> Result<()> {
        self.new_control_sequence();
        self.write_short(increment);
        self.commit(chained(RMI))
    }

    /// Establish the baseline at a new B-axis coordinate.
    pub fn absolute_move_baseline(&mut self, coordinate: i32) -> Result<()> {
        if coordinate == self.state.y {
            return Ok(());
        }
        self.new_control_sequence();
        self.write_short(coordinate);
        self.commit(chained(AMB))?;

        self.state.y = coordinate;
        self.state.x = -1;
        Ok(())
    }

    /// Present a run of code points without a scan for embedded control
    /// sequences. Runs longer than one sequence can hold are sliced into
    /// consecutive transparent data sequences.
    pub fn add_transparent_data(&mut self, encoded: &[u8]) -> Result<()> {
        let mut chunks = encoded.chunks(TRANSPARENT_DATA_MAX_SIZE);
        match chunks.next() {
            None => self.add_transparent_data_chunk(&[]),
            Some(first) => {
                self.add_transparent_data_chunk(first)?;
                for chunk in chunks {
                    self.add_transparent_data_chunk(chunk)?;
                }
                Ok(())
            },
        }
    }

    fn add_transparent_data_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.new_control_sequence();
        self.buf.extend_from_slice(chunk);
        self.commit(chained(TRN))
    }

    /// Draw a rule in the B-direction from the current position.
    pub fn draw_b_axis_rule(&mut self, length: i32, width: i32) -> Result<()> {
        self.new_control_sequence();
        self.write_short(length);
        self.write_short(width);
        self.write_byte(0); // rule width fraction
        self.commit(chained(DBR))
    }

    /// Draw a rule in the I-direction from the current position.
    pub fn draw_i_axis_rule(&mut self, length: i32, width: i32) -> Result<()> {
        self.new_control_sequence();
        self.write_short(length);
        self.write_short(width);
        self.write_byte(0); // rule width fraction
        self.commit(chained(DIR))
    }

    /// Establish the I-direction and B-direction for subsequent text.
    /// Modal; also invalidates the tracked presentation position.
    pub fn set_text_orientation(&mut self, orientation: u16) -> Result<()> {
        if orientation == self.state.orientation {
            return Ok(());
        }
        self.new_control_sequence();
        let angles: [u8; 4] = match orientation {
            90 => [0x2D, 0x00, 0x5A, 0x00],
            180 => [0x5A, 0x00, 0x87, 0x00],
            270 => [0x87, 0x00, 0x00, 0x00],
            _ => [0x00, 0x00, 0x2D, 0x00],
        };
        self.buf.extend_from_slice(&angles);
        self.commit(chained(STO))?;

        self.state.orientation = orientation;
        self.state.x = -1;
        self.state.y = -1;
        Ok(())
    }

    /// Set the foreground text color. Modal.
    pub fn set_extended_text_color(&mut self, color: Color) -> Result<()> {
        if color == self.state.color {
            return Ok(());
        }
        self.new_control_sequence();
        match color {
            Color::Rgb(r, g, b) => {
                self.write_byte(0x00); // reserved
                self.write_byte(0x01); // color space: RGB
                self.buf.extend_from_slice(&[0x00; 4]); // reserved
                self.buf.extend_from_slice(&[8, 8, 8, 0]); // bits per component
                self.write_byte(r);
                self.write_byte(g);
                self.write_byte(b);
            },
            Color::Cmyk(c, m, y, k) => {
                self.write_byte(0x00); // reserved
                self.write_byte(0x04); // color space: CMYK
                self.buf.extend_from_slice(&[0x00; 4]); // reserved
                self.buf.extend_from_slice(&[8, 8, 8, 8]); // bits per component
                self.write_byte(c);
                self.write_byte(m);
                self.write_byte(y);
                self.write_byte(k);
            },
        }
        self.commit(chained(SEC))?;

        self.state.color = color;
        Ok(())
    }

    /// Set the variable space character increment. Modal.
    pub fn set_variable_space_character_increment(&mut self, increment: i32) -> Result<()> {
        if increment == self.state.variable_space_increment {
            return Ok(());
        }
        debug_assert!((0..1 << 16).contains(&increment));
        self.new_control_sequence();
        self.write_short(increment.abs());
        self.commit(chained(SVI))?;

        self.state.variable_space_increment = increment;
        Ok(())
    }

    /// Set the intercharacter adjustment (signed). Modal.
    pub fn set_inter_character_adjustment(&mut self, increment: i32) -> Result<()> {
        if increment == self.state.inter_character_adjustment {
            return Ok(());
        }
        debug_assert!((i16::MIN as i32..=i16::MAX as i32).contains(&increment));
        self.new_control_sequence();
        self.write_short(increment.abs());
        self.write_byte(if increment >= 0 { 0 } else { 1 }); // direction
        self.commit(chained(SIA))?;

        self.state.inter_character_adjustment = increment;
        Ok(())
    }

    /// Terminate the chained control sequence with an unchained NOP.
    pub fn end_chained_control_sequence(&mut self) -> Result<()> {
        self.new_control_sequence();
        self.commit(NOP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct VecSink(Vec<u8>);

    impl ControlSequenceSink for VecSink {
        fn stream_for(&mut self, _len: usize) -> &mut Vec<u8> {
            &mut self.0
        }
    }

    #[test]
    fn test_modal_sequences_are_suppressed() {
        let mut sink = VecSink::default();
        let mut state = PtocaState::default();
        let mut builder = PtocaBuilder::new(&mut sink, &mut state);

        builder.set_coded_font(1).unwrap();
        builder.set_coded_font(1).unwrap();
        builder.absolute_move_baseline(100).unwrap();
        builder.absolute_move_baseline(100).unwrap();
        drop(builder);

        // one SCFL (3 bytes) and one AMB (4 bytes)
        assert_eq!(sink.0.len(), 3 + 4);
        assert_eq!(sink.0[1], 0xF0 | 0x01);
        assert_eq!(sink.0[4], 0xD2 | 0x01);
    }

    #[test]
    fn test_baseline_move_invalidates_inline_position() {
        let mut sink = VecSink::default();
        let mut state = PtocaState::default();
        let mut builder = PtocaBuilder::new(&mut sink, &mut state);

        builder.absolute_move_inline(50).unwrap();
        builder.absolute_move_baseline(80).unwrap();
        builder.absolute_move_inline(50).unwrap();
        drop(builder);

        // AMI is re-emitted after AMB even for the same coordinate
        let ami_count = sink.0.iter().filter(|&&b| b == (0xC6 | 0x01)).count();
        assert_eq!(ami_count, 2);
    }

    #[test]
    fn test_transparent_data_slicing() {
        let mut sink = VecSink::default();
        let mut state = PtocaState::default();
        let mut builder = PtocaBuilder::new(&mut sink, &mut state);

        let data = vec![0x40u8; 300];
        builder.add_transparent_data(&data).unwrap();
        drop(builder);

        // one full 253-byte sequence plus the 47-byte remainder
        assert_eq!(sink.0.len(), (253 + 2) + (47 + 2));
        assert_eq!(sink.0[0], 255);
        assert_eq!(sink.0[1], 0xDA | 0x01);
    }

    #[test]
    fn test_intercharacter_adjustment_direction() {
        let mut sink = VecSink::default();
        let mut state = PtocaState::default();
        let mut builder = PtocaBuilder::new(&mut sink, &mut state);

        builder.set_inter_character_adjustment(-20).unwrap();
        drop(builder);

        assert_eq!(sink.0, vec![5, 0xC2 | 0x01, 0x00, 20, 1]);
    }

    #[test]
    fn test_end_chain_is_unchained() {
        let mut sink = VecSink::default();
        let mut state = PtocaState::default();
        let mut builder = PtocaBuilder::new(&mut sink, &mut state);

        builder.end_chained_control_sequence().unwrap();
        drop(builder);

        assert_eq!(sink.0, vec![2, 0xF8]);
    }
}
