//! Maze Backdrop entry point
//!
//! On the web, drives the maze on `<canvas id="maze-canvas">` from the
//! animation frame loop. Natively, runs a headless demo on a text surface.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_backdrop {
    use std::cell::{Cell, RefCell};
    use wasm_bindgen::prelude::*;

    use maze_backdrop::renderer::CanvasSurface;
    use maze_backdrop::platform::FrameClock;
    use maze_backdrop::{MazeController, Settings, platform};

    /// Canvas element the background is painted on
    const CANVAS_ID: &str = "maze-canvas";
    /// Longest frame gap fed to the maze (ms), so a hidden tab does not replay
    /// minutes of walking at once
    const MAX_FRAME_MS: f64 = 100.0;

    thread_local! {
        static MAZE: RefCell<Option<MazeController<CanvasSurface>>> = const { RefCell::new(None) };
        static LAST_FRAME: Cell<f64> = const { Cell::new(0.0) };
        static FRAME_CLOCK: Cell<FrameClock> = const { Cell::new(FrameClock::new()) };
    }

    fn with_maze<R>(f: impl FnOnce(&mut MazeController<CanvasSurface>) -> R) -> Option<R> {
        MAZE.with(|m| m.borrow_mut().as_mut().map(f))
    }

    /// Build and start the background (no-op if already running)
    #[wasm_bindgen]
    pub fn maze_start() -> bool {
        let Some(surface) = CanvasSurface::from_element_id(CANVAS_ID) else {
            log::error!("Canvas #{} not found", CANVAS_ID);
            return false;
        };
        with_maze(|maze| maze.start(surface)).unwrap_or(false)
    }

    /// Stop all walkers and release the canvas
    #[wasm_bindgen]
    pub fn maze_stop() {
        with_maze(|maze| {
            maze.stop();
        });
    }

    #[wasm_bindgen]
    pub fn maze_is_running() -> bool {
        with_maze(|maze| maze.is_running()).unwrap_or(false)
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Maze backdrop starting...");

        let device = platform::detect_device();
        let settings = Settings::load();
        MAZE.with(|m| *m.borrow_mut() = Some(MazeController::new(settings, device)));

        if !maze_start() {
            return;
        }

        setup_resize_handler();
        // Frame timestamps share the performance clock origin
        LAST_FRAME.with(|l| l.set(platform::now_ms()));
        request_animation_frame();

        log::info!("Maze backdrop running!");
    }

    fn setup_resize_handler() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            with_maze(|maze| maze.notify_resize());
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame() {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(time: f64) {
        let last = LAST_FRAME.with(|l| l.replace(time));
        let dt = if last > 0.0 {
            (time - last).clamp(0.0, MAX_FRAME_MS)
        } else {
            0.0
        };
        let step_ms = FRAME_CLOCK.with(|c| {
            let mut clock = c.get();
            let step_ms = clock.tick(dt);
            c.set(clock);
            step_ms
        });
        with_maze(|maze| maze.advance(step_ms));

        request_animation_frame();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_backdrop::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_WIDTH: u32 = 1280;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_HEIGHT: u32 = 720;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SECONDS: u64 = 10;
#[cfg(not(target_arch = "wasm32"))]
const FRAME_MS: u64 = 16;

#[cfg(not(target_arch = "wasm32"))]
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Frames needed to simulate `seconds`
#[cfg(not(target_arch = "wasm32"))]
fn frame_count(seconds: u64) -> u64 {
    seconds.saturating_mul(1000) / FRAME_MS
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use maze_backdrop::{MazeController, Settings, TextSurface, platform};

    env_logger::init();
    log::info!("Maze backdrop (native) starting...");

    let width = env_or("MAZE_WIDTH", DEFAULT_WIDTH);
    let height = env_or("MAZE_HEIGHT", DEFAULT_HEIGHT);
    let seconds = env_or("MAZE_SECONDS", DEFAULT_SECONDS);

    let mut maze = MazeController::new(Settings::load(), platform::detect_device());
    maze.start(TextSurface::new(width, height));

    let started = platform::now_ms();
    let frames = frame_count(seconds);
    for frame in 0..frames {
        maze.advance(FRAME_MS);
        if frame % (1000 / FRAME_MS) == 0 {
            log::debug!("{:?}", maze.stats());
        }
    }

    log::info!(
        "Simulated {}s in {:.1}ms",
        seconds,
        platform::now_ms() - started
    );

    if let Some(surface) = maze.surface() {
        print!("{}", surface.render());
    }
    let stats = maze.stats();
    println!(
        "{}x{} cells, {} walls, {} markers alive, {} spawned, {} cell writes",
        stats.grid.cols + 1,
        stats.grid.rows + 1,
        maze.grid().count(maze_backdrop::maze::CellClass::Blocker),
        stats.live_markers,
        stats.markers_spawned,
        stats.mutations
    );

    maze.stop();
    // Let every walker observe the stop
    maze.advance(maze.settings().settle_delay_ms.max(1000));
    log::info!("Stopped, {} units left queued", maze.stats().queued);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(10), 625);
        assert_eq!(frame_count(0), 0);
        assert_eq!(frame_count(u64::MAX), u64::MAX / FRAME_MS);
    }
}
