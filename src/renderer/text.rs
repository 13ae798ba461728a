//! Character-grid surface
//!
//! Used by the native demo and by tests. One character per cell.

use super::Surface;
use crate::maze::{CellClass, GridSize, MarkerColor, Point, Viewport};

fn glyph(class: CellClass) -> char {
    match class {
        CellClass::Base => '.',
        CellClass::Blocker => '#',
        CellClass::Marker(MarkerColor::Solid1) => '1',
        CellClass::Marker(MarkerColor::Solid2) => '2',
        CellClass::Marker(MarkerColor::Solid3) => '3',
        CellClass::Marker(MarkerColor::Solid4) => '4',
    }
}

/// Text surface with a settable pixel size
#[derive(Debug, Clone)]
pub struct TextSurface {
    viewport: Viewport,
    width: usize,
    height: usize,
    chars: Vec<char>,
    /// Number of `layout` calls (one per build)
    pub layouts: u32,
    /// Number of `paint` calls
    pub paints: u64,
}

impl TextSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            width: 0,
            height: 0,
            chars: Vec::new(),
            layouts: 0,
            paints: 0,
        }
    }

    /// Simulate the host resizing the drawable area
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
    }

    /// Character at `point`, if painted
    pub fn glyph_at(&self, point: Point) -> Option<char> {
        if point.row < 0 || point.col < 0 {
            return None;
        }
        let (row, col) = (point.row as usize, point.col as usize);
        if row >= self.height || col >= self.width {
            return None;
        }
        Some(self.chars[row * self.width + col])
    }

    /// The whole grid, one line per row
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for line in self.chars.chunks(self.width.max(1)) {
            out.extend(line);
            out.push('\n');
        }
        out
    }
}

impl Surface for TextSurface {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn layout(&mut self, size: GridSize) {
        self.width = size.cols as usize + 1;
        self.height = size.rows as usize + 1;
        self.chars = vec![' '; self.width * self.height];
        self.layouts += 1;
    }

    fn paint(&mut self, point: Point, class: CellClass) {
        self.paints += 1;
        if point.row < 0 || point.col < 0 {
            return;
        }
        let (row, col) = (point.row as usize, point.col as usize);
        if row < self.height && col < self.width {
            self.chars[row * self.width + col] = glyph(class);
        }
    }
}
