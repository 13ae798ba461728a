//! Drawable surfaces
//!
//! The maze only ever asks a surface for its pixel size and tells it which
//! class a cell now has. How a class looks is up to the surface.

pub mod text;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

pub use text::TextSurface;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

use glam::Vec2;

use crate::maze::{CellClass, GridSize, Point, Viewport};

/// A 2-D drawing target for the maze
pub trait Surface {
    /// Current pixel size of the drawable area
    fn viewport(&self) -> Viewport;

    /// Prepare for a freshly sized grid. Called on every build, before any
    /// cell of the new grid is painted.
    fn layout(&mut self, size: GridSize);

    /// Show `class` at `point`
    fn paint(&mut self, point: Point, class: CellClass);
}

/// Pixel-space origin and extent of a cell
#[inline]
pub fn cell_rect(point: Point, cell_px: u32) -> (Vec2, Vec2) {
    let px = cell_px as f32;
    (
        Vec2::new(point.col as f32 * px, point.row as f32 * px),
        Vec2::splat(px),
    )
}
