//! Resize significance and debounce policy
//!
//! Touch devices reflow the viewport height whenever the on-screen keyboard or
//! address bar slides in, so they get a looser height threshold and a longer
//! debounce.

use serde::{Deserialize, Serialize};

use super::grid::Viewport;
use crate::consts::*;

/// Input device class, decides resize thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceClass {
    /// Touch screen or small viewport
    Touch,
    #[default]
    Desktop,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Touch => "touch",
            DeviceClass::Desktop => "desktop",
        }
    }

    /// How long a burst of resize events must go quiet before it is evaluated
    pub fn debounce_ms(&self) -> u64 {
        match self {
            DeviceClass::Touch => RESIZE_DEBOUNCE_TOUCH_MS,
            DeviceClass::Desktop => RESIZE_DEBOUNCE_DESKTOP_MS,
        }
    }

    fn height_threshold(&self) -> f64 {
        match self {
            DeviceClass::Touch => RESIZE_HEIGHT_THRESHOLD_TOUCH,
            DeviceClass::Desktop => RESIZE_HEIGHT_THRESHOLD_DESKTOP,
        }
    }
}

/// Fractional change from `last` to `new`. A zero baseline counts any
/// change as total.
fn fractional_change(last: u32, new: u32) -> f64 {
    if last == 0 {
        return if new == 0 { 0.0 } else { 1.0 };
    }
    (new as f64 - last as f64).abs() / last as f64
}

/// Whether moving from `last` to `new` warrants rebuilding the maze
pub fn is_significant_resize(last: Viewport, new: Viewport, device: DeviceClass) -> bool {
    let dw = fractional_change(last.width, new.width);
    let dh = fractional_change(last.height, new.height);
    dw > RESIZE_WIDTH_THRESHOLD || dh > device.height_threshold()
}
