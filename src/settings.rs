//! Maze settings
//!
//! Read from LocalStorage on the web and from a JSON file natively.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Tunables for the maze
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Fixed RNG seed for reproducible runs (random when unset)
    pub seed: Option<u64>,

    // === Carving ===
    /// Chance a carver paints a wall (0.0 - 1.0)
    pub wall_density: f64,
    /// Carver step interval (ms)
    pub carver_step_ms: u64,

    // === Markers ===
    /// Markers alive at once (at most 4)
    pub max_markers: usize,
    /// Per-step chance of a spontaneous heading change (0.0 - 1.0)
    pub redirect_chance: f64,
    /// Delay between carving start and marker spawn, also the replenish period (ms)
    pub settle_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,

            wall_density: WALL_DENSITY,
            carver_step_ms: CARVER_STEP_MS,

            max_markers: MAX_MARKERS,
            redirect_chance: REDIRECT_CHANCE,
            settle_delay_ms: SETTLE_DELAY_MS,
        }
    }
}

impl Settings {
    /// Settings with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Pull every field back into its valid range
    pub fn clamped(mut self) -> Self {
        self.wall_density = clamp_probability(self.wall_density, WALL_DENSITY);
        self.redirect_chance = clamp_probability(self.redirect_chance, REDIRECT_CHANCE);
        self.max_markers = self.max_markers.min(MAX_MARKERS);
        self.carver_step_ms = self.carver_step_ms.max(1);
        self.settle_delay_ms = self.settle_delay_ms.max(1);
        self
    }

    /// Parse settings JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Settings>(json).map(Settings::clamped)
    }

    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "maze_backdrop_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from the JSON file named by `MAZE_SETTINGS` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Some(path) = std::env::var_os("MAZE_SETTINGS") else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.to_string_lossy());
                    settings
                }
                Err(e) => {
                    log::warn!("Bad settings file {}: {}", path.to_string_lossy(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.to_string_lossy(), e);
                Self::default()
            }
        }
    }
}

fn clamp_probability(p: f64, fallback: f64) -> f64 {
    if p.is_nan() { fallback } else { p.clamp(0.0, 1.0) }
}
