//! Ambient rendering context threaded through content emission.
//!
//! The painting state carries the current color, rotation, output
//! resolution and page extent. It is mutated by the calling renderer
//! layer and read by the assembly core when positioning content.

/// A device color as presented to the PTOCA/IOCA encoders.
///
/// The CMYK variant is carried through when the caller's color management
/// produced one; no conversion happens in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Red/green/blue, 8 bits per component.
    Rgb(u8, u8, u8),
    /// Cyan/magenta/yellow/black, 8 bits per component.
    Cmyk(u8, u8, u8, u8),
}

impl Color {
    /// Black in RGB space, the PTOCA initial text color.
    pub const BLACK: Color = Color::Rgb(0, 0, 0);

    /// Collapse to a grey intensity (ITU-R 601 luma for RGB).
    pub fn to_grey(self) -> u8 {
        match self {
            Color::Rgb(r, g, b) => {
                let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
                y.round() as u8
            },
            Color::Cmyk(_, _, _, k) => 255 - k,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// Converts layout lengths (millipoints) into AFP measurement units at
/// the configured output resolution.
#[derive(Debug, Clone, Copy)]
pub struct UnitConverter {
    resolution: u32,
}

impl UnitConverter {
    /// Create a converter for the given resolution in dots per inch.
    pub fn new(resolution: u32) -> Self {
        Self { resolution }
    }

    /// Convert millipoints to AFP units (not rounded).
    pub fn mpt2units(&self, mpt: f32) -> f32 {
        mpt / 72_000.0 * self.resolution as f32
    }

    /// Convert points to AFP units (not rounded).
    pub fn pt2units(&self, pt: f32) -> f32 {
        self.mpt2units(pt * 1000.0)
    }
}

/// Mutable painting state for one document production run.
#[derive(Debug, Clone)]
pub struct PaintingState {
    /// Current coordinate system rotation (0, 90, 180 or 270 degrees).
    rotation: u16,
    /// Output resolution in dots per inch.
    resolution: u32,
    /// Current page width in AFP units.
    page_width: i32,
    /// Current page height in AFP units.
    page_height: i32,
    /// Current painting color.
    color: Color,
}

impl Default for PaintingState {
    fn default() -> Self {
        Self::new(240)
    }
}

impl PaintingState {
    /// Create a painting state at the given output resolution (dpi).
    pub fn new(resolution: u32) -> Self {
        Self {
            rotation: 0,
            resolution,
            page_width: 0,
            page_height: 0,
            color: Color::BLACK,
        }
    }

    /// The current coordinate system rotation in degrees.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    /// Set the coordinate system rotation (must be 0, 90, 180 or 270).
    pub fn set_rotation(&mut self, rotation: u16) {
        debug_assert!(matches!(rotation, 0 | 90 | 180 | 270));
        self.rotation = rotation;
    }

    /// The output resolution in dots per inch.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Unit converter for the current resolution.
    pub fn unit_converter(&self) -> UnitConverter {
        UnitConverter::new(self.resolution)
    }

    /// Set the current page extent in AFP units.
    pub fn set_page_size(&mut self, width: i32, height: i32) {
        self.page_width = width;
        self.page_height = height;
    }

    /// The current page width in AFP units.
    pub fn page_width(&self) -> i32 {
        self.page_width
    }

    /// The current page height in AFP units.
    pub fn page_height(&self) -> i32 {
        self.page_height
    }

    /// The current painting color.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Set the current painting color.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    /// Map a point from the renderer coordinate system into the rotated
    /// page coordinate system.
    pub fn point(&self, x: i32, y: i32) -> (i32, i32) {
        match self.rotation {
            90 => (y, self.page_width - x),
            180 => (self.page_width - x, self.page_height - y),
            270 => (self.page_height - y, x),
            _ => (x, y),
        }
    }
}
