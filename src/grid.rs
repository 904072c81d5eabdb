use crate::{error::GenerateError, region::Region};

use fnv::FnvHashSet;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// A lattice point. `x` is the column and `y` is the row, everywhere.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn manhattan_distance(&self, other: &Point) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point { x, y }
    }
}

static ORTHOGONAL_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
static DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Connectivity {
    /// Movement along the four axis directions.
    Orthogonal,
    /// Axis directions plus the four diagonals.
    Diagonal,
}

impl Connectivity {
    pub fn offsets(self) -> impl Iterator<Item = (i32, i32)> {
        let diagonals: &'static [(i32, i32)] = match self {
            Connectivity::Orthogonal => &[],
            Connectivity::Diagonal => &DIAGONAL_OFFSETS,
        };

        ORTHOGONAL_OFFSETS.iter().chain(diagonals.iter()).copied()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Connectivity::Orthogonal
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TileKind {
    Unknown,
    Floor,
    Wall,
    Stone,
}

impl TileKind {
    /// Index into a tile atlas laid out unknown, floor, wall, stone.
    pub fn code(self) -> u8 {
        match self {
            TileKind::Unknown => 0,
            TileKind::Floor => 1,
            TileKind::Wall => 2,
            TileKind::Stone => 3,
        }
    }

    fn glyph(self) -> char {
        match self {
            TileKind::Unknown => '?',
            TileKind::Floor => '.',
            TileKind::Wall => '#',
            TileKind::Stone => ' ',
        }
    }
}

impl Default for TileKind {
    fn default() -> Self {
        TileKind::Unknown
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Cell {
    x: i32,
    y: i32,
    pub kind: TileKind,
    /// Carving state. Everything starts blocked and carvers open it up.
    pub blocked: bool,
}

impl Cell {
    fn new(x: i32, y: i32) -> Self {
        Cell {
            x,
            y,
            kind: TileKind::Unknown,
            blocked: true,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn is_open(&self) -> bool {
        !self.blocked
    }
}

/// Row-major 2D array of cells with bounds-checked `(x, y)` access.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// A grid of blocked, unclassified cells.
    pub fn new(width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                cells.push(Cell::new(x, y));
            }
        }

        Grid {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width as i32 && p.y < self.height as i32
    }

    fn index(&self, p: &Point) -> Result<usize, GenerateError> {
        if self.contains(p) {
            Ok(p.y as usize * self.width as usize + p.x as usize)
        } else {
            Err(GenerateError::OutOfBounds {
                point: *p,
                width: self.width,
                height: self.height,
            })
        }
    }

    pub fn get(&self, p: &Point) -> Result<&Cell, GenerateError> {
        let i = self.index(p)?;

        Ok(&self.cells[i])
    }

    pub fn get_mut(&mut self, p: &Point) -> Result<&mut Cell, GenerateError> {
        let i = self.index(p)?;

        Ok(&mut self.cells[i])
    }

    /// Returns false for points outside the grid.
    pub fn is_open(&self, p: &Point) -> bool {
        self.get(p).map(Cell::is_open).unwrap_or(false)
    }

    pub fn open(&mut self, p: &Point) -> Result<(), GenerateError> {
        self.get_mut(p)?.blocked = false;

        Ok(())
    }

    pub fn block(&mut self, p: &Point) -> Result<(), GenerateError> {
        self.get_mut(p)?.blocked = true;

        Ok(())
    }

    /// Per-cell classification for renderers.
    ///
    /// Panics if `(x, y)` is outside the grid; use `get` for a checked lookup.
    pub fn classification(&self, x: u32, y: u32) -> TileKind {
        assert!(
            x < self.width && y < self.height,
            "({}, {}) is outside the {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );

        self.cells[y as usize * self.width as usize + x as usize].kind
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn open_cell_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_open()).count()
    }

    /// Turns the carving state into final tile kinds: open cells become floor, blocked cells
    /// touching floor (including diagonally) become wall, and the rest is stone.
    pub fn classify(&mut self) {
        let kinds: Vec<TileKind> = self
            .cells
            .iter()
            .map(|c| {
                if c.is_open() {
                    TileKind::Floor
                } else if self.has_adjacent_open(&c.position()) {
                    TileKind::Wall
                } else {
                    TileKind::Stone
                }
            })
            .collect();

        for (cell, kind) in self.cells.iter_mut().zip(kinds.into_iter()) {
            cell.kind = kind;
        }
    }

    fn has_adjacent_open(&self, p: &Point) -> bool {
        Connectivity::Diagonal
            .offsets()
            .any(|(dx, dy)| self.is_open(&Point::new(p.x + dx, p.y + dy)))
    }

    /// The set of open cells reachable from `start` by stepping between open neighbors. Empty if
    /// `start` itself is not open.
    pub fn flood_fill(&self, start: &Point, connectivity: Connectivity) -> FnvHashSet<Point> {
        self.flood_fill_where(start, connectivity, |_| true)
    }

    /// Like `flood_fill`, but never leaves `bounds`.
    pub fn flood_fill_within(
        &self,
        start: &Point,
        connectivity: Connectivity,
        bounds: &Region,
    ) -> FnvHashSet<Point> {
        self.flood_fill_where(start, connectivity, |p| bounds.contains(p))
    }

    fn flood_fill_where(
        &self,
        start: &Point,
        connectivity: Connectivity,
        admit: impl Fn(&Point) -> bool,
    ) -> FnvHashSet<Point> {
        let mut visited = FnvHashSet::default();
        if !self.is_open(start) || !admit(start) {
            return visited;
        }

        let mut queue = VecDeque::new();
        visited.insert(*start);
        queue.push_back(*start);
        while let Some(p) = queue.pop_front() {
            for (dx, dy) in connectivity.offsets() {
                let n = Point::new(p.x + dx, p.y + dy);
                if self.is_open(&n) && admit(&n) && visited.insert(n) {
                    queue.push_back(n);
                }
            }
        }

        visited
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width.max(1) as usize) {
            let line: String = row.iter().map(|c| c.kind.glyph()).collect();
            writeln!(f, "{}", line)?;
        }

        Ok(())
    }
}
