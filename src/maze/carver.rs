//! Wall carvers
//!
//! Each carver is a biased random walk that repaints the cell it stands on as
//! wall or open on every tick. Several carvers started from the corners (and
//! the center on larger grids) overlap into an uneven maze texture. There is
//! no connectivity guarantee.

use rand::Rng;

use super::WalkContext;
use super::grid::{CellClass, GridSize, Point};
use super::scheduler::Step;
use crate::consts::CENTER_SEED_MIN;

/// A single wall-carving walk
#[derive(Debug, Clone)]
pub struct Carver {
    pub point: Point,
    pub step_ms: u64,
}

impl Carver {
    pub fn new(seed: Point, step_ms: u64) -> Self {
        Self {
            point: seed,
            step_ms: step_ms.max(1),
        }
    }

    /// Paint the current cell, then pick the next one
    pub fn tick(&mut self, ctx: &mut WalkContext<'_>) -> Step {
        if !ctx.active {
            return Step::Done;
        }
        if ctx.grid.cell_at(self.point).is_none() {
            log::debug!("Carver at {:?} is off the grid, stopping", self.point);
            return Step::Done;
        }

        let class = if ctx.rng.random::<f64>() < ctx.wall_density {
            CellClass::Blocker
        } else {
            CellClass::Base
        };
        ctx.grid.set_cell_class(self.point, class);

        self.point = next_point(self.point, ctx.grid.size(), &mut *ctx.rng);
        Step::Sleep(self.step_ms)
    }
}

/// Biased neighbor step. Each axis moves by -1, 0 or 1; a move that would
/// leave the grid is replaced by 0, so walkers stick to edges.
pub fn next_point(point: Point, size: GridSize, rng: &mut impl Rng) -> Point {
    let d_row = clamp_delta(point.row, rng.random_range(-1..=1), size.rows as i32);
    let d_col = clamp_delta(point.col, rng.random_range(-1..=1), size.cols as i32);
    point.offset(d_row, d_col)
}

fn clamp_delta(pos: i32, delta: i32, max: i32) -> i32 {
    let next = pos + delta;
    if next < 0 || next > max { 0 } else { delta }
}

/// Where carvers start: the four corners, plus the center when the grid is
/// big enough for it to matter
pub fn seed_points(size: &GridSize) -> Vec<Point> {
    let (rows, cols) = (size.rows as i32, size.cols as i32);
    let mut points = Vec::with_capacity(5);
    for p in [
        Point::new(0, 0),
        Point::new(0, cols),
        Point::new(rows, 0),
        Point::new(rows, cols),
    ] {
        if !points.contains(&p) {
            points.push(p);
        }
    }
    if rows >= CENTER_SEED_MIN && cols >= CENTER_SEED_MIN {
        points.push(Point::new(rows / 2, cols / 2));
    }
    points
}
