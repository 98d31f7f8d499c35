//! Presentation state carried by every drawing primitive.

use serde::Serialize;

use crate::tokenizer::{CharacterSize, FlashingMode, Ornament, WritingMode};

/// Geometry is in display pixels with the magnification already applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParserState {
    pub magnification: f64,
    pub writing_format: u32,
    pub plane: [f64; 2],
    pub area: [f64; 2],
    pub margin: [f64; 2],
    pub font_size: [f64; 2],
    pub hspace: f64,
    pub vspace: f64,
    /// Left edge and baseline of the active position
    pub position: [f64; 2],
    pub size: CharacterSize,
    pub pallet: u8,
    /// Color indices are `pallet << 4 | index`.
    pub foreground: u8,
    pub background: u8,
    pub half_foreground: u8,
    pub half_background: u8,
    pub raster: Option<u8>,
    pub underline: bool,
    /// HLC bit mask: bottom, right, top, left
    pub highlight: u8,
    pub ornament: Ornament,
    pub flashing: FlashingMode,
    pub polarity: u8,
    pub writing_mode: WritingMode,
    pub elapsed_time: f64,
}

/// Plane size for an SWF format number; odd formats above 4 are horizontal.
pub fn writing_format_plane(format: u32) -> [f64; 2] {
    match format {
        5 | 6 => [1920.0, 1080.0],
        9 | 10 => [720.0, 480.0],
        11 | 12 => [1280.0, 720.0],
        _ => [960.0, 540.0],
    }
}

impl ParserState {
    /// Format 7 with the caption defaults
    pub fn initial(magnification: f64) -> Self {
        let m = magnification;
        let plane = writing_format_plane(7);
        let mut state = Self {
            magnification: m,
            writing_format: 7,
            plane: [plane[0] * m, plane[1] * m],
            area: [plane[0] * m, plane[1] * m],
            margin: [0.0, 0.0],
            font_size: [36.0 * m, 36.0 * m],
            hspace: 4.0 * m,
            vspace: 24.0 * m,
            position: [0.0, 0.0],
            size: CharacterSize::Normal,
            pallet: 0,
            foreground: 7,
            background: 8,
            half_foreground: 7,
            half_background: 8,
            raster: None,
            underline: false,
            highlight: 0,
            ornament: Ornament::None,
            flashing: FlashingMode::Stop,
            polarity: 0,
            writing_mode: WritingMode::Both,
            elapsed_time: 0.0,
        };
        state.set_cell(0, 0);
        state
    }

    pub fn cell_width(&self) -> f64 {
        (self.font_size[0] + self.hspace) * self.size.scale().0
    }

    pub fn cell_height(&self) -> f64 {
        (self.font_size[1] + self.vspace) * self.size.scale().1
    }

    pub fn set_writing_format(&mut self, format: u32) {
        let plane = writing_format_plane(format);
        let m = self.magnification;
        self.writing_format = format;
        self.plane = [plane[0] * m, plane[1] * m];
        self.area = self.plane;
        self.margin = [0.0, 0.0];
    }

    /// APS: column `x`, row `y` of the display area
    pub fn set_cell(&mut self, x: u8, y: u8) {
        self.position = [
            self.margin[0] + x as f64 * self.cell_width(),
            self.margin[1] + (y as f64 + 1.0) * self.cell_height() - self.magnification,
        ];
    }

    fn columns(&self) -> f64 {
        let columns = self.area[0] / self.cell_width();
        if columns.is_finite() { columns.floor().clamp(1.0, MAX_ROW_CELLS) } else { 1.0 }
    }

    fn rows(&self) -> f64 {
        (self.area[1] / self.cell_height()).floor().max(1.0)
    }

    /// Cells left on the row, counting the active one; at most a full row
    pub fn remaining_in_row(&self) -> usize {
        let width = self.cell_width();
        if !width.is_finite() || width <= EPSILON {
            return 1;
        }
        let left = ((self.margin[0] + self.area[0] - self.position[0]) / width).floor();
        left.clamp(1.0, self.columns()) as usize
    }

    /// APF
    pub fn forward(&mut self) {
        self.position[0] += self.cell_width();
        if self.position[0] >= self.margin[0] + self.area[0] - EPSILON {
            self.position[0] = self.margin[0];
            self.down();
        }
    }

    /// APB
    pub fn backward(&mut self) {
        self.position[0] -= self.cell_width();
        if self.position[0] < self.margin[0] - EPSILON {
            self.position[0] = self.margin[0] + (self.columns() - 1.0) * self.cell_width();
            self.up();
        }
    }

    /// APD
    pub fn down(&mut self) {
        self.position[1] += self.cell_height();
        if self.position[1] > self.margin[1] + self.area[1] + EPSILON {
            self.position[1] = self.margin[1] + self.cell_height() - self.magnification;
        }
    }

    /// APU
    pub fn up(&mut self) {
        self.position[1] -= self.cell_height();
        if self.position[1] < self.margin[1] - EPSILON {
            self.position[1] = self.margin[1] + self.rows() * self.cell_height() - self.magnification;
        }
    }

    /// APR
    pub fn newline(&mut self) {
        self.position[0] = self.margin[0];
        self.down();
    }

    /// Color index under the active pallet
    pub fn color(&self, index: u8) -> u8 {
        (self.pallet << 4) | (index & 0x0F)
    }
}

pub(crate) const EPSILON: f64 = 1e-6;

/// Upper bound on the cells of one row, one per pixel of the widest plane
const MAX_ROW_CELLS: f64 = 1920.0;
