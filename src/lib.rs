//! Maze Backdrop - an animated random-walk maze background
//!
//! Core modules:
//! - `maze`: Grid model, wall carvers, marker walkers and the controller
//! - `renderer`: Drawable surfaces (text for native, canvas for the web)
//! - `platform`: Browser/native platform abstraction
//! - `settings`: Persisted tunables

pub mod maze;
pub mod platform;
pub mod renderer;
pub mod settings;

pub use maze::{MazeController, Phase};
pub use renderer::{Surface, TextSurface};
pub use settings::Settings;

/// Maze configuration constants
pub mod consts {
    /// Chance that a carver paints its current cell as a wall
    pub const WALL_DENSITY: f64 = 0.25;
    /// Per-step chance that a marker changes heading without hitting a wall
    pub const REDIRECT_CHANCE: f64 = 0.05;

    /// Hard cap on concurrently alive markers
    pub const MAX_MARKERS: usize = 4;
    /// Pause between carver spawn and the first marker spawn (ms)
    pub const SETTLE_DELAY_MS: u64 = 1500;
    /// Carver step interval (ms)
    pub const CARVER_STEP_MS: u64 = 120;

    /// Grids at least this many rows and cols also get a center carver
    pub const CENTER_SEED_MIN: i32 = 6;
    /// Random probes when looking for an open cell to drop a marker on
    pub const MARKER_PLACEMENT_ATTEMPTS: u32 = 32;

    /// Resize significance thresholds (fractional change)
    pub const RESIZE_WIDTH_THRESHOLD: f64 = 0.10;
    pub const RESIZE_HEIGHT_THRESHOLD_TOUCH: f64 = 0.20;
    pub const RESIZE_HEIGHT_THRESHOLD_DESKTOP: f64 = 0.10;

    /// Resize debounce intervals (ms)
    pub const RESIZE_DEBOUNCE_TOUCH_MS: u64 = 500;
    pub const RESIZE_DEBOUNCE_DESKTOP_MS: u64 = 250;
}
