//! Grid model: sizing, per-cell render class and change tracking
//!
//! Cells are addressed by `(row, col)` with both bounds inclusive, so a grid of
//! `cols × rows` holds `(cols + 1) * (rows + 1)` cells. Storage is row-major.

use serde::{Deserialize, Serialize};

/// Viewport dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The smaller of width and height (drives the cell tier)
    pub fn minor(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Cell size tier, picked from the viewport's minor dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellTier {
    /// Minor dimension above 1200px
    Large,
    /// Above 950px
    Medium,
    /// Above 750px
    Small,
    /// Everything else
    Compact,
}

impl CellTier {
    pub fn for_viewport(viewport: Viewport) -> Self {
        match viewport.minor() {
            m if m > 1200 => CellTier::Large,
            m if m > 950 => CellTier::Medium,
            m if m > 750 => CellTier::Small,
            _ => CellTier::Compact,
        }
    }

    /// Cell edge length in pixels
    pub fn cell_px(&self) -> u32 {
        match self {
            CellTier::Large => 60,
            CellTier::Medium => 50,
            CellTier::Small => 40,
            CellTier::Compact => 35,
        }
    }

    /// Marker step interval (ms). Bigger screens hold more cells, so markers
    /// move faster there to keep the motion density similar.
    pub fn marker_step_ms(&self) -> u64 {
        match self {
            CellTier::Large => 90,
            CellTier::Medium => 110,
            CellTier::Small => 130,
            CellTier::Compact => 150,
        }
    }
}

/// Grid dimensions derived from a viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub cols: u32,
    pub rows: u32,
    pub tier: CellTier,
}

impl GridSize {
    pub fn from_viewport(viewport: Viewport) -> Self {
        let tier = CellTier::for_viewport(viewport);
        let cell = tier.cell_px();
        Self {
            cols: viewport.width / cell,
            rows: viewport.height / cell,
            tier,
        }
    }

    pub fn cell_px(&self) -> u32 {
        self.tier.cell_px()
    }

    /// Number of addressable cells
    pub fn total(&self) -> usize {
        (self.cols as usize + 1) * (self.rows as usize + 1)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.row >= 0
            && point.col >= 0
            && point.row <= self.rows as i32
            && point.col <= self.cols as i32
    }

    fn index(&self, point: Point) -> Option<usize> {
        if !self.contains(point) {
            return None;
        }
        Some(point.row as usize * (self.cols as usize + 1) + point.col as usize)
    }
}

/// Compute `(cols, rows, cell_px)` for a viewport
pub fn size(width: u32, height: u32) -> (u32, u32, u32) {
    let grid = GridSize::from_viewport(Viewport::new(width, height));
    (grid.cols, grid.rows, grid.cell_px())
}

/// A grid coordinate. Signed so off-grid candidates can be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, d_row: i32, d_col: i32) -> Self {
        Self::new(self.row + d_row, self.col + d_col)
    }
}

/// Marker color tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerColor {
    Solid1,
    Solid2,
    Solid3,
    Solid4,
}

impl MarkerColor {
    pub const ALL: [MarkerColor; 4] = [
        MarkerColor::Solid1,
        MarkerColor::Solid2,
        MarkerColor::Solid3,
        MarkerColor::Solid4,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Solid1 => "solid1",
            MarkerColor::Solid2 => "solid2",
            MarkerColor::Solid3 => "solid3",
            MarkerColor::Solid4 => "solid4",
        }
    }

    /// Color for the n-th spawned marker
    pub fn cycle(n: u64) -> Self {
        Self::ALL[(n % Self::ALL.len() as u64) as usize]
    }
}

/// Render class of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CellClass {
    /// Open cell
    #[default]
    Base,
    /// Wall
    Blocker,
    /// Occupied by a marker
    Marker(MarkerColor),
}

impl CellClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellClass::Base => "base",
            CellClass::Blocker => "blocker",
            CellClass::Marker(color) => color.as_str(),
        }
    }

    pub fn is_blocker(&self) -> bool {
        matches!(self, CellClass::Blocker)
    }
}

/// The cell grid shared by carvers and markers
#[derive(Debug, Clone)]
pub struct Grid {
    size: GridSize,
    cells: Vec<CellClass>,
    /// Cells whose class changed since the last `take_dirty`
    dirty: Vec<Point>,
    /// Total writes, including ones that left the class unchanged
    mutations: u64,
}

impl Grid {
    /// Create a grid with every cell open. All cells start dirty.
    pub fn new(size: GridSize) -> Self {
        let mut grid = Self {
            size,
            cells: Vec::new(),
            dirty: Vec::new(),
            mutations: 0,
        };
        grid.reset(size);
        grid
    }

    pub fn from_viewport(viewport: Viewport) -> Self {
        Self::new(GridSize::from_viewport(viewport))
    }

    /// Resize and clear every cell to `Base`
    pub fn reset(&mut self, size: GridSize) {
        self.size = size;
        self.cells.clear();
        self.cells.resize(size.total(), CellClass::Base);
        self.dirty = self.points().collect();
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Cell at `point`, or `None` outside the grid
    pub fn cell_at(&self, point: Point) -> Option<CellClass> {
        self.size.index(point).map(|i| self.cells[i])
    }

    /// Set the render class of a cell. Returns false (and does nothing) for
    /// out-of-range points.
    pub fn set_cell_class(&mut self, point: Point, class: CellClass) -> bool {
        let Some(i) = self.size.index(point) else {
            return false;
        };
        self.mutations += 1;
        if self.cells[i] != class {
            self.cells[i] = class;
            self.dirty.push(point);
        }
        true
    }

    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Drain the points whose class changed since the last call
    pub fn take_dirty(&mut self) -> Vec<Point> {
        std::mem::take(&mut self.dirty)
    }

    /// Every addressable point, row-major
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (rows, cols) = (self.size.rows as i32, self.size.cols as i32);
        (0..=rows).flat_map(move |row| (0..=cols).map(move |col| Point::new(row, col)))
    }

    pub fn count(&self, class: CellClass) -> usize {
        self.cells.iter().filter(|c| **c == class).count()
    }

    /// Number of cells currently painted with any marker color
    pub fn marker_cells(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c, CellClass::Marker(_)))
            .count()
    }
}
