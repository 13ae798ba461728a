//! HTML canvas surface (WASM only)
//!
//! Paints each cell as a filled square with the 2D context.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Surface, cell_rect};
use crate::maze::{CellClass, GridSize, MarkerColor, Point, Viewport};

fn fill_color(class: CellClass) -> &'static str {
    match class {
        CellClass::Base => "#0d1117",
        CellClass::Blocker => "#21262d",
        CellClass::Marker(MarkerColor::Solid1) => "#ff5f56",
        CellClass::Marker(MarkerColor::Solid2) => "#ffbd2e",
        CellClass::Marker(MarkerColor::Solid3) => "#27c93f",
        CellClass::Marker(MarkerColor::Solid4) => "#58a6ff",
    }
}

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    cell_px: u32,
}

impl CanvasSurface {
    /// Wrap the canvas with the given element id
    pub fn from_element_id(id: &str) -> Option<Self> {
        let document = web_sys::window()?.document()?;
        let canvas = document
            .get_element_by_id(id)?
            .dyn_into::<HtmlCanvasElement>()
            .ok()?;
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self {
            canvas,
            ctx,
            cell_px: 0,
        })
    }
}

impl Surface for CanvasSurface {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            self.canvas.client_width().max(0) as u32,
            self.canvas.client_height().max(0) as u32,
        )
    }

    fn layout(&mut self, size: GridSize) {
        let viewport = self.viewport();
        self.canvas.set_width(viewport.width);
        self.canvas.set_height(viewport.height);
        self.cell_px = size.cell_px();
        self.ctx.set_fill_style_str(fill_color(CellClass::Base));
        self.ctx
            .fill_rect(0.0, 0.0, viewport.width as f64, viewport.height as f64);
        log::debug!(
            "Canvas laid out {}x{} cells at {}px",
            size.cols + 1,
            size.rows + 1,
            self.cell_px
        );
    }

    fn paint(&mut self, point: Point, class: CellClass) {
        let (origin, extent) = cell_rect(point, self.cell_px);
        self.ctx.set_fill_style_str(fill_color(class));
        self.ctx.fill_rect(
            origin.x as f64,
            origin.y as f64,
            extent.x as f64,
            extent.y as f64,
        );
    }
}
