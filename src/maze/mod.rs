//! Maze simulation module
//!
//! Everything that decides what a cell looks like lives here. Nothing in this
//! module touches a rendering API:
//! - Virtual clock only (driven by `MazeController::advance`)
//! - Seeded RNG only
//! - Cooperative scheduling, one unit at a time

pub mod carver;
pub mod controller;
pub mod grid;
pub mod marker;
pub mod resize;
pub mod scheduler;

pub use carver::{Carver, seed_points};
pub use controller::{MazeController, MazeStats, Phase};
pub use grid::{CellClass, CellTier, Grid, GridSize, MarkerColor, Point, Viewport, size};
pub use marker::{Heading, Marker};
pub use resize::{DeviceClass, is_significant_resize};
pub use scheduler::{Scheduler, Step};

use rand_pcg::Pcg32;

/// What a carver or marker sees during one tick
pub struct WalkContext<'a> {
    pub grid: &'a mut Grid,
    pub rng: &'a mut Pcg32,
    /// False once the controller stopped or rebuilt since the unit spawned
    pub active: bool,
    pub wall_density: f64,
    pub redirect_chance: f64,
}
