//! Marker walkers
//!
//! A marker is a colored token that walks the open cells one step per tick.
//! Each step is split around the suspend point: look ahead (paint the current
//! cell, find the candidate), sleep for the travel time, then commit (clear the
//! current cell and either move or bounce off a wall). Wall detection happens
//! before the commit, so a marker is never drawn inside a wall.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::WalkContext;
use super::grid::{CellClass, MarkerColor, Point};
use super::scheduler::Step;

/// Direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    North,
    South,
    East,
    West,
}

impl Heading {
    pub const ALL: [Heading; 4] = [Heading::North, Heading::South, Heading::East, Heading::West];

    /// `(d_row, d_col)` for one step
    pub fn delta(self) -> (i32, i32) {
        match self {
            Heading::North => (-1, 0),
            Heading::South => (1, 0),
            Heading::East => (0, 1),
            Heading::West => (0, -1),
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            Heading::North => Heading::South,
            Heading::South => Heading::North,
            Heading::East => Heading::West,
            Heading::West => Heading::East,
        }
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Uniform pick among the three other headings. Only `self` is excluded,
    /// so a bounce may pick a perpendicular or the reverse direction.
    pub fn random_except(self, rng: &mut impl Rng) -> Self {
        let pick = rng.random_range(0..Self::ALL.len() - 1);
        Self::ALL
            .into_iter()
            .filter(|h| *h != self)
            .nth(pick)
            .unwrap_or(self.reverse())
    }
}

impl Point {
    /// The neighboring point one step along `heading`
    pub fn step(self, heading: Heading) -> Self {
        let (d_row, d_col) = heading.delta();
        self.offset(d_row, d_col)
    }
}

/// A colored token wandering the open cells
#[derive(Debug, Clone)]
pub struct Marker {
    pub point: Point,
    pub heading: Heading,
    pub step_ms: u64,
    pub color: MarkerColor,
    /// Candidate found by the last look-ahead, committed on the next tick
    pending: Option<Point>,
}

impl Marker {
    pub fn new(start: Point, step_ms: u64, heading: Heading, color: MarkerColor) -> Self {
        Self {
            point: start,
            heading,
            step_ms: step_ms.max(1),
            color,
            pending: None,
        }
    }

    /// Candidate waiting to be committed, if the marker is mid-step
    pub fn pending(&self) -> Option<Point> {
        self.pending
    }

    /// Run one tick: commit the pending move (if any), then look ahead again
    pub fn tick(&mut self, ctx: &mut WalkContext<'_>) -> Step {
        if let Some(candidate) = self.pending.take() {
            if !ctx.active {
                return Step::Done;
            }
            self.commit(candidate, ctx);
        }
        self.look_ahead(ctx)
    }

    fn commit(&mut self, candidate: Point, ctx: &mut WalkContext<'_>) {
        ctx.grid.set_cell_class(self.point, CellClass::Base);

        match ctx.grid.cell_at(candidate) {
            None | Some(CellClass::Blocker) => {
                // Bounce: stay put, retry with another heading
                self.heading = self.heading.random_except(&mut *ctx.rng);
            }
            Some(_) => {
                if ctx.rng.random_bool(ctx.redirect_chance) {
                    self.heading = self.heading.random_except(&mut *ctx.rng);
                }
                self.point = candidate;
            }
        }
    }

    fn look_ahead(&mut self, ctx: &mut WalkContext<'_>) -> Step {
        if !ctx.active || ctx.grid.cell_at(self.point).is_none() {
            return Step::Done;
        }
        ctx.grid
            .set_cell_class(self.point, CellClass::Marker(self.color));

        let candidate = self.point.step(self.heading);
        if ctx.grid.cell_at(candidate).is_none() {
            // Walking off the grid ends the marker; it leaves its cell open
            ctx.grid.set_cell_class(self.point, CellClass::Base);
            log::debug!(
                "Marker {} left the grid at {:?} heading {:?}",
                self.color.as_str(),
                self.point,
                self.heading
            );
            return Step::Done;
        }

        self.pending = Some(candidate);
        Step::Sleep(self.step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maze::grid::{Grid, Viewport};
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn grid() -> Grid {
        // 10 cols x 8 rows
        Grid::from_viewport(Viewport::new(350, 280))
    }

    fn ctx<'a>(grid: &'a mut Grid, rng: &'a mut Pcg32, redirect: f64) -> WalkContext<'a> {
        WalkContext {
            grid,
            rng,
            active: true,
            wall_density: 0.0,
            redirect_chance: redirect,
        }
    }

    #[test]
    fn test_heading_basics() {
        for h in Heading::ALL {
            assert_eq!(h.reverse().reverse(), h);
            let (dr, dc) = h.delta();
            let (rr, rc) = h.reverse().delta();
            assert_eq!((dr + rr, dc + rc), (0, 0));
        }
        assert_eq!(Point::new(2, 2).step(Heading::North), Point::new(1, 2));
        assert_eq!(Point::new(2, 2).step(Heading::East), Point::new(2, 3));
    }

    #[test]
    fn test_random_except_never_returns_self() {
        let mut rng = Pcg32::seed_from_u64(3);
        for h in Heading::ALL {
            let mut seen = std::collections::HashSet::new();
            for _ in 0..200 {
                let next = h.random_except(&mut rng);
                assert_ne!(next, h);
                seen.insert(next);
            }
            assert_eq!(seen.len(), 3);
        }
    }

    #[test]
    fn test_look_ahead_then_commit() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(9);
        let mut marker = Marker::new(Point::new(4, 4), 100, Heading::East, MarkerColor::Solid2);

        let step = marker.tick(&mut ctx(&mut grid, &mut rng, 0.0));
        assert_eq!(step, Step::Sleep(100));
        assert_eq!(
            grid.cell_at(Point::new(4, 4)),
            Some(CellClass::Marker(MarkerColor::Solid2))
        );
        assert_eq!(marker.pending(), Some(Point::new(4, 5)));
        // Not moved until the wait is over
        assert_eq!(marker.point, Point::new(4, 4));

        marker.tick(&mut ctx(&mut grid, &mut rng, 0.0));
        assert_eq!(marker.point, Point::new(4, 5));
        assert_eq!(grid.cell_at(Point::new(4, 4)), Some(CellClass::Base));
        assert_eq!(
            grid.cell_at(Point::new(4, 5)),
            Some(CellClass::Marker(MarkerColor::Solid2))
        );
        assert_eq!(grid.marker_cells(), 1);
    }

    #[test]
    fn test_wall_bounce_never_enters_blocker() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(11);
        let wall = Point::new(4, 5);
        grid.set_cell_class(wall, CellClass::Blocker);

        let mut marker = Marker::new(Point::new(4, 4), 100, Heading::East, MarkerColor::Solid1);
        marker.tick(&mut ctx(&mut grid, &mut rng, 0.0));
        assert_eq!(marker.pending(), Some(wall));

        marker.tick(&mut ctx(&mut grid, &mut rng, 0.0));
        // Stayed put, picked another heading, wall untouched
        assert_eq!(marker.point, Point::new(4, 4));
        assert_ne!(marker.heading, Heading::East);
        assert_eq!(grid.cell_at(wall), Some(CellClass::Blocker));
        assert_eq!(
            grid.cell_at(Point::new(4, 4)),
            Some(CellClass::Marker(MarkerColor::Solid1))
        );
    }

    #[test]
    fn test_walk_in_walled_grid() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(5);
        // Checkerboard-ish walls everywhere except a cross of open cells
        for p in grid.points().collect::<Vec<_>>() {
            if p.row != 4 && p.col != 5 && (p.row + p.col) % 3 == 0 {
                grid.set_cell_class(p, CellClass::Blocker);
            }
        }

        let mut marker = Marker::new(Point::new(4, 5), 10, Heading::North, MarkerColor::Solid3);
        for _ in 0..500 {
            let before = marker.point;
            if marker.tick(&mut ctx(&mut grid, &mut rng, 0.05)) == Step::Done {
                break;
            }
            if marker.point != before {
                assert_eq!(grid.cell_at(before), Some(CellClass::Base));
            }
            let here = grid.cell_at(marker.point);
            assert_eq!(here, Some(CellClass::Marker(MarkerColor::Solid3)));
            assert!(grid.marker_cells() <= 1);
        }
    }

    #[test]
    fn test_off_grid_terminates_and_clears() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut marker = Marker::new(Point::new(0, 3), 100, Heading::North, MarkerColor::Solid4);

        assert_eq!(marker.tick(&mut ctx(&mut grid, &mut rng, 0.0)), Step::Done);
        assert_eq!(grid.cell_at(Point::new(0, 3)), Some(CellClass::Base));
        assert_eq!(grid.marker_cells(), 0);
    }

    #[test]
    fn test_inactive_after_wait_does_not_mutate() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(2);
        let mut marker = Marker::new(Point::new(3, 3), 100, Heading::South, MarkerColor::Solid1);
        marker.tick(&mut ctx(&mut grid, &mut rng, 0.0));
        let before = grid.mutations();

        let mut c = ctx(&mut grid, &mut rng, 0.0);
        c.active = false;
        assert_eq!(marker.tick(&mut c), Step::Done);
        assert_eq!(grid.mutations(), before);
        assert_eq!(marker.point, Point::new(3, 3));
    }

    #[test]
    fn test_redirect_changes_heading_but_still_moves() {
        let mut grid = grid();
        let mut rng = Pcg32::seed_from_u64(8);
        let mut marker = Marker::new(Point::new(4, 4), 100, Heading::East, MarkerColor::Solid1);

        marker.tick(&mut ctx(&mut grid, &mut rng, 1.0));
        marker.tick(&mut ctx(&mut grid, &mut rng, 1.0));
        assert_eq!(marker.point, Point::new(4, 5));
        assert_ne!(marker.heading, Heading::East);
    }
}
