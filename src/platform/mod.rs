//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Device class detection (touch vs desktop)
//! - Monotonic time in milliseconds
//! - Converting fractional frame times into whole maze milliseconds

use crate::maze::DeviceClass;

/// Viewports narrower than this count as touch devices even without touch points
pub const SMALL_VIEWPORT_PX: f64 = 768.0;

/// Classify the device from touch capability and viewport width
pub fn classify(max_touch_points: i32, viewport_width: f64) -> DeviceClass {
    if max_touch_points > 0 || viewport_width < SMALL_VIEWPORT_PX {
        DeviceClass::Touch
    } else {
        DeviceClass::Desktop
    }
}

#[cfg(target_arch = "wasm32")]
pub fn detect_device() -> DeviceClass {
    let Some(window) = web_sys::window() else {
        return DeviceClass::default();
    };
    let touch_points = window.navigator().max_touch_points();
    let width = window
        .inner_width()
        .ok()
        .and_then(|w| w.as_f64())
        .unwrap_or(f64::MAX);
    classify(touch_points, width)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn detect_device() -> DeviceClass {
    DeviceClass::Desktop
}

/// Milliseconds since an arbitrary fixed origin
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs_f64() * 1000.0
}

/// Accumulates fractional frame times so the whole-ms maze clock keeps pace
/// with the host clock
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameClock {
    accumulator: f64,
}

impl FrameClock {
    pub const fn new() -> Self {
        Self { accumulator: 0.0 }
    }

    /// Add `dt_ms` and return the whole milliseconds now due. The fractional
    /// remainder carries into the next frame.
    pub fn tick(&mut self, dt_ms: f64) -> u64 {
        if dt_ms.is_finite() && dt_ms > 0.0 {
            self.accumulator += dt_ms;
        }
        let whole = self.accumulator.floor();
        self.accumulator -= whole;
        whole as u64
    }
}
