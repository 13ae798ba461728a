//! Maze controller
//!
//! Owns the grid, the RNG and the timer queue, and supervises every carver and
//! marker. The host drives it with `advance` from its frame loop.
//!
//! Lifecycle: `Idle -> Building -> Running -> Idle`, with `Running -> Building`
//! whenever a debounced resize turns out to be significant.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::WalkContext;
use super::carver::{Carver, seed_points};
use super::grid::{CellClass, Grid, GridSize, MarkerColor, Point, Viewport};
use super::marker::{Heading, Marker};
use super::resize::{DeviceClass, is_significant_resize};
use super::scheduler::{Scheduler, Step};
use crate::consts::{MARKER_PLACEMENT_ATTEMPTS, MAX_MARKERS};
use crate::renderer::Surface;
use crate::settings::Settings;

/// Controller lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Not started, or stopped
    Idle,
    /// Carvers running, waiting for the settle delay
    Building,
    /// Carvers and markers running
    Running,
}

/// A queued unit of work. Units carry the epoch of the build that spawned
/// them and go quiet as soon as that build is no longer current.
enum Task {
    Carver { epoch: u64, carver: Carver },
    Marker { epoch: u64, marker: Marker },
    /// Settle timer; re-arms itself to keep the marker population topped up
    Spawner { epoch: u64 },
    /// Fires once a burst of resize notifications goes quiet
    ResizeCheck { ticket: u64 },
}

/// Snapshot of controller bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeStats {
    pub phase: Phase,
    pub epoch: u64,
    pub clock_ms: u64,
    pub grid: GridSize,
    pub live_markers: usize,
    pub markers_spawned: u64,
    /// Carver units still queued
    pub carvers: usize,
    /// All queued units, timers included
    pub queued: usize,
    pub mutations: u64,
}

/// Drives the maze on a drawable surface
pub struct MazeController<S: Surface> {
    settings: Settings,
    device: DeviceClass,
    phase: Phase,
    active: bool,
    /// Incremented on every build
    epoch: u64,
    grid: Grid,
    rng: Pcg32,
    scheduler: Scheduler<Task>,
    live_markers: usize,
    markers_spawned: u64,
    /// Viewport at the last build, baseline for resize significance
    last_viewport: Option<Viewport>,
    resize_ticket: u64,
    surface: Option<S>,
}

impl<S: Surface> MazeController<S> {
    pub fn new(settings: Settings, device: DeviceClass) -> Self {
        let settings = settings.clamped();
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!(
            "Maze controller ready (seed {}, {} device)",
            seed,
            device.as_str()
        );
        Self {
            settings,
            device,
            phase: Phase::Idle,
            active: false,
            epoch: 0,
            grid: Grid::new(GridSize::from_viewport(Viewport::new(0, 0))),
            rng: Pcg32::seed_from_u64(seed),
            scheduler: Scheduler::new(),
            live_markers: 0,
            markers_spawned: 0,
            last_viewport: None,
            resize_ticket: 0,
            surface: None,
        }
    }

    /// Attach a surface and build. Refused (returns false) while running.
    pub fn start(&mut self, surface: S) -> bool {
        if self.active {
            log::warn!("Maze already running, start ignored");
            return false;
        }
        self.surface = Some(surface);
        self.build();
        true
    }

    /// Clear the active flag and hand back the surface. Queued units end on
    /// their next wake without touching the grid.
    pub fn stop(&mut self) -> Option<S> {
        if self.active {
            log::info!("Stopping maze (epoch {})", self.epoch);
        }
        self.active = false;
        self.phase = Phase::Idle;
        self.surface.take()
    }

    pub fn is_running(&self) -> bool {
        self.active
    }

    /// Note that the surface may have changed size. Bursts collapse into one
    /// check after the device's debounce interval.
    pub fn notify_resize(&mut self) {
        if !self.active {
            return;
        }
        self.resize_ticket += 1;
        self.scheduler.schedule(
            self.device.debounce_ms(),
            Task::ResizeCheck {
                ticket: self.resize_ticket,
            },
        );
    }

    /// Advance the virtual clock by `dt_ms`, running every unit that comes due
    pub fn advance(&mut self, dt_ms: u64) {
        let until = self.scheduler.now().saturating_add(dt_ms);
        while let Some(task) = self.scheduler.pop_due(until) {
            self.run(task);
            self.flush();
        }
        self.scheduler.advance_to(until);
    }

    /// Start a marker on an open cell, unless the live cap is reached or the
    /// maze is stopped
    pub fn spawn_marker(
        &mut self,
        start: Point,
        step_ms: u64,
        heading: Heading,
        color: MarkerColor,
    ) -> bool {
        if !self.active {
            return false;
        }
        if self.grid.cell_at(start) != Some(CellClass::Base) {
            log::trace!("Marker spawn refused, {:?} is not open", start);
            return false;
        }
        if self.live_markers >= self.marker_cap() {
            log::trace!("Marker spawn refused, {} alive", self.live_markers);
            return false;
        }
        self.live_markers += 1;
        self.markers_spawned += 1;
        self.scheduler.schedule(
            0,
            Task::Marker {
                epoch: self.epoch,
                marker: Marker::new(start, step_ms, heading, color),
            },
        );
        true
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn surface(&self) -> Option<&S> {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> Option<&mut S> {
        self.surface.as_mut()
    }

    pub fn live_markers(&self) -> usize {
        self.live_markers
    }

    pub fn stats(&self) -> MazeStats {
        MazeStats {
            phase: self.phase,
            epoch: self.epoch,
            clock_ms: self.scheduler.now(),
            grid: self.grid.size(),
            live_markers: self.live_markers,
            markers_spawned: self.markers_spawned,
            carvers: self
                .scheduler
                .count_where(|t| matches!(t, Task::Carver { .. })),
            queued: self.scheduler.len(),
            mutations: self.grid.mutations(),
        }
    }

    fn marker_cap(&self) -> usize {
        self.settings.max_markers.min(MAX_MARKERS)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.active && epoch == self.epoch
    }

    fn walk_context(&mut self, epoch: u64) -> WalkContext<'_> {
        WalkContext {
            active: self.is_current(epoch),
            grid: &mut self.grid,
            rng: &mut self.rng,
            wall_density: self.settings.wall_density,
            redirect_chance: self.settings.redirect_chance,
        }
    }

    /// Size the grid from the surface, clear it and spawn carvers
    fn build(&mut self) {
        let Some(surface) = self.surface.as_mut() else {
            log::warn!("No surface attached, nothing to build");
            return;
        };
        let viewport = surface.viewport();
        let size = GridSize::from_viewport(viewport);

        self.epoch += 1;
        self.last_viewport = Some(viewport);
        self.grid.reset(size);
        surface.layout(size);
        self.active = true;
        self.phase = Phase::Building;

        let seeds = seed_points(&size);
        for &seed in &seeds {
            self.scheduler.schedule(
                0,
                Task::Carver {
                    epoch: self.epoch,
                    carver: Carver::new(seed, self.settings.carver_step_ms),
                },
            );
        }
        self.scheduler.schedule(
            self.settings.settle_delay_ms,
            Task::Spawner { epoch: self.epoch },
        );

        log::info!(
            "Building {}x{} maze at {}px ({} carvers, epoch {})",
            size.cols,
            size.rows,
            size.cell_px(),
            seeds.len(),
            self.epoch
        );
        self.flush();
    }

    fn run(&mut self, task: Task) {
        match task {
            Task::Carver { epoch, mut carver } => {
                let mut ctx = self.walk_context(epoch);
                if let Step::Sleep(ms) = carver.tick(&mut ctx) {
                    self.scheduler.schedule(ms, Task::Carver { epoch, carver });
                }
            }
            Task::Marker { epoch, mut marker } => {
                let mut ctx = self.walk_context(epoch);
                match marker.tick(&mut ctx) {
                    Step::Sleep(ms) => {
                        self.scheduler.schedule(ms, Task::Marker { epoch, marker });
                    }
                    Step::Done => self.release_marker(),
                }
            }
            Task::Spawner { epoch } => {
                if !self.is_current(epoch) {
                    return;
                }
                if self.phase == Phase::Building {
                    self.phase = Phase::Running;
                    log::info!("Maze settled, releasing markers");
                }
                self.replenish_markers();
                self.scheduler
                    .schedule(self.settings.settle_delay_ms, Task::Spawner { epoch });
            }
            Task::ResizeCheck { ticket } => {
                if ticket == self.resize_ticket && self.active {
                    self.check_resize();
                }
            }
        }
    }

    fn check_resize(&mut self) {
        let Some(surface) = self.surface.as_ref() else {
            return;
        };
        let new = surface.viewport();
        let significant = match self.last_viewport {
            Some(last) => is_significant_resize(last, new, self.device),
            None => true,
        };
        if significant {
            log::info!("Viewport now {}x{}, rebuilding", new.width, new.height);
            self.build();
        } else {
            log::debug!("Viewport now {}x{}, change too small", new.width, new.height);
        }
    }

    /// Spawn markers until the cap is reached or no open cell turns up
    fn replenish_markers(&mut self) {
        let cap = self.marker_cap();
        let step_ms = self.grid.size().tier.marker_step_ms();
        for _ in 0..cap {
            if self.live_markers >= cap {
                break;
            }
            let Some(start) = self.random_open_point() else {
                log::debug!("No open cell for a marker");
                break;
            };
            let heading = Heading::random(&mut self.rng);
            let color = self.free_color();
            self.spawn_marker(start, step_ms, heading, color);
        }
    }

    fn random_open_point(&mut self) -> Option<Point> {
        let size = self.grid.size();
        (0..MARKER_PLACEMENT_ATTEMPTS).find_map(|_| {
            let p = Point::new(
                self.rng.random_range(0..=size.rows as i32),
                self.rng.random_range(0..=size.cols as i32),
            );
            (self.grid.cell_at(p) == Some(CellClass::Base)).then_some(p)
        })
    }

    /// First color no current marker is wearing
    fn free_color(&self) -> MarkerColor {
        let epoch = self.epoch;
        MarkerColor::ALL
            .into_iter()
            .find(|&color| {
                self.scheduler.count_where(|t| {
                    matches!(t, Task::Marker { epoch: e, marker } if *e == epoch && marker.color == color)
                }) == 0
            })
            .unwrap_or_else(|| MarkerColor::cycle(self.markers_spawned))
    }

    fn release_marker(&mut self) {
        debug_assert!(self.live_markers > 0, "marker slot released twice");
        if self.live_markers == 0 {
            log::error!("Marker slot released with none alive");
            return;
        }
        self.live_markers -= 1;
    }

    /// Push changed cells to the surface
    fn flush(&mut self) {
        let dirty = self.grid.take_dirty();
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        for point in dirty {
            if let Some(class) = self.grid.cell_at(point) {
                surface.paint(point, class);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextSurface;

    /// 10 cols x 8 rows at the 35px tier
    fn small_surface() -> TextSurface {
        TextSurface::new(350, 280)
    }

    fn controller(settings: Settings) -> MazeController<TextSurface> {
        MazeController::new(settings, DeviceClass::Desktop)
    }

    #[test]
    fn test_start_builds_then_settles() {
        let mut maze = controller(Settings::seeded(12345));
        assert_eq!(maze.phase(), Phase::Idle);
        assert!(!maze.is_running());

        assert!(maze.start(small_surface()));
        assert!(maze.is_running());
        assert_eq!(maze.phase(), Phase::Building);
        let stats = maze.stats();
        assert_eq!((stats.grid.cols, stats.grid.rows), (10, 8));
        assert_eq!(stats.carvers, 5);
        assert_eq!(stats.epoch, 1);
        let surface = maze.surface().unwrap();
        assert_eq!(surface.layouts, 1);
        // Every cell painted open on build
        assert_eq!(surface.render().matches('.').count(), 99);

        maze.advance(1499);
        assert_eq!(maze.phase(), Phase::Building);
        assert_eq!(maze.live_markers(), 0);
        assert!(maze.grid().count(CellClass::Blocker) > 0);

        maze.advance(1);
        assert_eq!(maze.phase(), Phase::Running);
        assert_eq!(maze.stats().markers_spawned, 4);
        assert!(maze.live_markers() <= 4);
    }

    #[test]
    fn test_surface_mirrors_grid() {
        let mut maze = controller(Settings::seeded(3));
        maze.start(small_surface());
        maze.advance(4000);

        let grid = maze.grid();
        let surface = maze.surface().unwrap();
        for p in grid.points() {
            let expected = match grid.cell_at(p).unwrap() {
                CellClass::Base => '.',
                CellClass::Blocker => '#',
                CellClass::Marker(_) => continue,
            };
            assert_eq!(surface.glyph_at(p), Some(expected), "mismatch at {:?}", p);
        }
    }

    #[test]
    fn test_cap_never_exceeded() {
        let mut maze = controller(Settings::seeded(777));
        maze.start(small_surface());
        // Two settle cycles
        maze.advance(3000);
        assert!(maze.live_markers() <= 4);

        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..200 {
            let start = Point::new(rng.random_range(0..=8), rng.random_range(0..=10));
            let accepted = maze.spawn_marker(
                start,
                150,
                Heading::random(&mut rng),
                MarkerColor::Solid1,
            );
            if maze.live_markers() == 4 {
                assert!(!maze.spawn_marker(start, 150, Heading::North, MarkerColor::Solid2));
            }
            let open = maze.grid().cell_at(start) == Some(CellClass::Base);
            assert!(accepted || !open || maze.live_markers() == 4);
            assert!(maze.live_markers() <= 4);

            maze.advance(rng.random_range(1..200));
            assert!(maze.live_markers() <= 4);
            assert!(maze.grid().marker_cells() <= maze.live_markers());
        }
    }

    #[test]
    fn test_spawn_on_wall_is_refused() {
        // Carvers only ever paint walls here
        let settings = Settings {
            seed: Some(2024),
            wall_density: 1.0,
            settle_delay_ms: 10_000_000,
            ..Settings::default()
        };
        let mut maze = controller(settings);
        maze.start(small_surface());
        maze.advance(500);
        let wall = maze
            .grid()
            .points()
            .find(|&p| maze.grid().cell_at(p) == Some(CellClass::Blocker))
            .unwrap();
        let spawned = maze.stats().markers_spawned;
        for heading in Heading::ALL {
            assert!(!maze.spawn_marker(wall, 10, heading, MarkerColor::Solid1));
        }
        assert_eq!(maze.live_markers(), 0);
        assert_eq!(maze.stats().markers_spawned, spawned);
        assert!(!maze.spawn_marker(Point::new(-1, 0), 10, Heading::North, MarkerColor::Solid1));

        maze.advance(50);
        assert_eq!(maze.grid().cell_at(wall), Some(CellClass::Blocker));
        assert_eq!(maze.grid().marker_cells(), 0);
    }

    #[test]
    fn test_stop_halts_all_units_within_one_tick() {
        let mut maze = controller(Settings::seeded(99));
        maze.start(small_surface());
        maze.advance(2500);
        assert!(maze.stats().carvers > 0);

        let surface = maze.stop();
        assert!(surface.is_some());
        assert!(!maze.is_running());
        assert_eq!(maze.phase(), Phase::Idle);
        let frozen = maze.grid().mutations();

        // Longest unit step is 150ms
        maze.advance(150);
        assert_eq!(maze.grid().mutations(), frozen);
        assert_eq!(maze.stats().carvers, 0);
        assert_eq!(maze.live_markers(), 0);

        maze.advance(5000);
        assert_eq!(maze.grid().mutations(), frozen);
        // The settle timer also noticed and did not re-arm
        assert_eq!(maze.stats().queued, 0);
        assert!(maze.stop().is_none());
    }

    #[test]
    fn test_hundred_markers_release_exactly_once() {
        let settings = Settings {
            seed: Some(5),
            wall_density: 0.0,
            redirect_chance: 0.0,
            // Keep the automatic spawner out of the way
            settle_delay_ms: 10_000_000,
            ..Settings::default()
        };
        let mut maze = controller(settings);
        maze.start(small_surface());

        let mut rng = Pcg32::seed_from_u64(17);
        let mut spawned = 0;
        while spawned < 100 {
            let start = Point::new(rng.random_range(0..=8), rng.random_range(0..=10));
            let color = MarkerColor::cycle(spawned);
            if maze.spawn_marker(start, 10, Heading::random(&mut rng), color) {
                spawned += 1;
            } else {
                maze.advance(10);
            }
            assert!(maze.live_markers() <= 4);
        }

        // A straight walk crosses at most 11 cells
        maze.advance(200);
        assert_eq!(maze.live_markers(), 0);
        assert_eq!(maze.stats().markers_spawned, 100);
        assert_eq!(maze.grid().marker_cells(), 0);
    }

    #[test]
    fn test_touch_resize_thresholds() {
        let mut maze: MazeController<TextSurface> =
            MazeController::new(Settings::seeded(1), DeviceClass::Touch);
        maze.start(TextSurface::new(1000, 800));
        maze.advance(100);

        // Address bar reflow: ignored
        maze.surface_mut().unwrap().set_viewport(1050, 820);
        maze.notify_resize();
        maze.advance(600);
        assert_eq!(maze.stats().epoch, 1);
        assert_eq!(maze.surface().unwrap().layouts, 1);

        // 20% wider: rebuild after the touch debounce
        maze.surface_mut().unwrap().set_viewport(1200, 800);
        maze.notify_resize();
        maze.advance(499);
        assert_eq!(maze.stats().epoch, 1);
        maze.advance(1);
        assert_eq!(maze.stats().epoch, 2);
        assert_eq!(maze.phase(), Phase::Building);
        assert_eq!(maze.surface().unwrap().layouts, 2);
        assert_eq!(maze.stats().grid.cols, 1200 / 40);
    }

    #[test]
    fn test_resize_burst_collapses_to_one_rebuild() {
        let mut maze = controller(Settings::seeded(1));
        maze.start(TextSurface::new(1000, 800));

        for width in [1100, 1200, 1300, 1400] {
            maze.surface_mut().unwrap().set_viewport(width, 800);
            maze.notify_resize();
            maze.advance(100);
        }
        assert_eq!(maze.stats().epoch, 1);

        maze.advance(150);
        assert_eq!(maze.stats().epoch, 2);
        assert_eq!(maze.stats().grid.cols, 1400 / 40);

        maze.advance(1000);
        assert_eq!(maze.stats().epoch, 2);
    }

    #[test]
    fn test_rebuild_retires_previous_units() {
        let mut maze = controller(Settings::seeded(21));
        maze.start(small_surface());
        maze.advance(2000);

        maze.surface_mut().unwrap().set_viewport(800, 800);
        maze.notify_resize();
        maze.advance(250);
        assert_eq!(maze.stats().epoch, 2);
        let seeds = seed_points(&maze.grid().size()).len();

        // Old carvers and markers see the stale epoch on their next wake
        maze.advance(150);
        assert_eq!(maze.stats().carvers, seeds);
        assert_eq!(maze.live_markers(), 0);

        maze.advance(1500);
        assert_eq!(maze.phase(), Phase::Running);
        assert!(maze.live_markers() <= 4);
    }

    #[test]
    fn test_start_while_running_is_refused() {
        let mut maze = controller(Settings::seeded(1));
        assert!(maze.start(small_surface()));
        assert!(!maze.start(TextSurface::new(2000, 2000)));
        assert_eq!(maze.stats().grid.cols, 10);

        maze.stop();
        assert!(maze.start(TextSurface::new(2000, 2000)));
        assert_eq!(maze.stats().epoch, 2);
    }

    #[test]
    fn test_resize_ignored_when_idle() {
        let mut maze = controller(Settings::seeded(1));
        maze.notify_resize();
        maze.advance(1000);
        assert_eq!(maze.stats().epoch, 0);
        assert!(!maze.spawn_marker(Point::new(0, 0), 10, Heading::East, MarkerColor::Solid1));
    }

    #[test]
    fn test_determinism() {
        // Two controllers with the same seed paint identical frames
        let mut a = controller(Settings::seeded(4242));
        let mut b = controller(Settings::seeded(4242));
        a.start(small_surface());
        b.start(small_surface());

        for dt in [16, 33, 250, 1500, 16, 700] {
            a.advance(dt);
            b.advance(dt);
        }
        assert_eq!(a.surface().unwrap().render(), b.surface().unwrap().render());
        assert_eq!(a.stats(), b.stats());
    }
}
