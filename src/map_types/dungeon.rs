use crate::{
    corridor::{carve_corridors, carve_entrance, Diagonal},
    error::GenerateError,
    graph::{is_connected, longest_path_in_tree, room_graph},
    grid::{Connectivity, Grid, Point},
    partition::{PartitionTree, SplitSpec},
    region::Region,
    room::{carve_room, decorate_room, inset_room, spawn_in_room, Decoration},
    sampling::small_rng,
    symmetric_map::SymmetricMap,
    SpawnArea, TileEncoder,
};

use petgraph::{stable_graph::StableGraph, Undirected};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use stats::OnlineStats;

pub const MAX_GENERATE_TRIES: usize = 200;
/// Deeper trees would have more leaves than any sensible grid has cells, and joining sibling
/// subtrees compares every pair of their leaves.
pub const MAX_ITERATIONS: u32 = 12;
/// 2048 x 2048.
pub const MAX_CELLS: u64 = 1 << 22;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct DungeonMapSpec {
    pub seed: [u32; 4],
    pub width: u32,
    pub height: u32,
    /// The region to partition. Defaults to the whole grid less a one-cell border.
    pub root: Option<Region>,
    /// Defaults to the top-left corner.
    pub entrance: Option<Point>,
    /// Defaults to the bottom-right corner.
    pub exit: Option<Point>,
    /// Which neighbors count as adjacent when querying reachability.
    pub connectivity: Connectivity,
    /// Chance that a room gets decorated, when decoration is enabled.
    pub wall_density: f32,
    /// Depth of the partition tree. The dungeon has `2^iterations` rooms.
    pub iterations: u32,
    pub split: SplitSpec,
    pub decorate: bool,
    pub max_generate_tries: usize,
}

impl Default for DungeonMapSpec {
    fn default() -> Self {
        DungeonMapSpec {
            seed: [0; 4],
            width: 64,
            height: 48,
            root: None,
            entrance: None,
            exit: None,
            connectivity: Connectivity::Orthogonal,
            wall_density: 0.3,
            iterations: 4,
            split: SplitSpec::default(),
            decorate: false,
            max_generate_tries: MAX_GENERATE_TRIES,
        }
    }
}

impl DungeonMapSpec {
    pub fn with_size(width: u32, height: u32) -> Self {
        DungeonMapSpec {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn from_ron(s: &str) -> Result<Self, GenerateError> {
        let spec: Self = ron::de::from_str(s)?;
        spec.validate()?;

        Ok(spec)
    }

    pub fn to_ron(&self) -> Result<String, GenerateError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    pub fn root_region(&self) -> Region {
        self.root.unwrap_or_else(|| {
            Region::new(1, 1, self.width as i32 - 2, self.height as i32 - 2)
        })
    }

    pub fn entrance_point(&self) -> Point {
        self.entrance.unwrap_or_else(|| Point::new(0, 0))
    }

    pub fn exit_point(&self) -> Point {
        self.exit
            .unwrap_or_else(|| Point::new(self.width as i32 - 1, self.height as i32 - 1))
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        let invalid = |msg: String| Err(GenerateError::InvalidSpec(msg));

        if self.width == 0 || self.height == 0 {
            return invalid(format!("unusable grid size {}x{}", self.width, self.height));
        }
        let num_cells = u64::from(self.width) * u64::from(self.height);
        if num_cells > MAX_CELLS {
            return invalid(format!(
                "{}x{} grid exceeds the maximum of {} cells",
                self.width, self.height, MAX_CELLS
            ));
        }
        let root = self.root_region();
        let bounds = Region::new(0, 0, self.width as i32, self.height as i32);
        if root.is_empty() || root.checked_supremum().is_none() || !bounds.contains_region(&root) {
            return invalid(format!(
                "root region {:?} does not fit in the {}x{} grid",
                root, self.width, self.height
            ));
        }
        if self.iterations > MAX_ITERATIONS {
            return invalid(format!(
                "{} iterations exceeds the maximum of {}",
                self.iterations, MAX_ITERATIONS
            ));
        }
        if !(0.0..=1.0).contains(&self.wall_density) {
            return invalid(format!("wall density {} is not in [0, 1]", self.wall_density));
        }
        let ratios = [self.split.min_width_ratio, self.split.min_height_ratio];
        if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return invalid(format!("bad split ratios {:?}", ratios));
        }
        if self.max_generate_tries == 0 {
            return invalid("max_generate_tries must be at least 1".to_string());
        }

        Ok(())
    }

    /// Runs the whole pipeline once. Any failure leaves nothing behind; the grid being carved is
    /// dropped with the error.
    pub fn try_generate(&self, rng: &mut impl Rng) -> Result<Dungeon, GenerateError> {
        self.validate()?;
        log::debug!("Generating {}x{} dungeon map", self.width, self.height);

        let mut grid = Grid::new(self.width, self.height);

        let tree = PartitionTree::build(self.root_region(), self.iterations, &self.split, rng)?;
        let leaves = tree.leaves();
        log::debug!("Partitioned {:?} into {} leaves", self.root_region(), leaves.len());

        let mut rooms = Vec::with_capacity(leaves.len());
        let mut num_decorated = 0;
        for leaf in leaves.iter() {
            let room = inset_room(leaf, rng);
            carve_room(&room, &mut grid)?;
            log::trace!("Carved room {:?} in leaf {:?}", room, leaf);

            if self.decorate {
                if let Some(decoration) = Decoration::choose(&room, self.wall_density, rng) {
                    if decorate_room(&room, &decoration, &mut grid)? {
                        num_decorated += 1;
                    }
                }
            }

            rooms.push(room);
        }
        let mut area_stats = OnlineStats::new();
        for room in rooms.iter() {
            area_stats.add(room.area() as f64);
        }
        log::debug!(
            "Carved {} rooms ({} decorated), area mean = {:.1}, stddev = {:.1}",
            rooms.len(),
            num_decorated,
            area_stats.mean(),
            area_stats.stddev()
        );

        let corridors = carve_corridors(&tree, &mut grid)?;
        log::debug!("Carved {} corridors", corridors.len());
        debug_assert!(is_connected(&room_graph(rooms.len(), &corridors)));

        let entrance = self.entrance_point();
        let exit = self.exit_point();
        let entrance_path = carve_entrance(&mut grid, entrance, Diagonal::Forward)?;
        let exit_path = carve_entrance(&mut grid, exit, Diagonal::Backward)?;
        log::debug!(
            "Entrance {:?} needed {} cells, exit {:?} needed {}",
            entrance,
            entrance_path.len(),
            exit,
            exit_path.len()
        );

        grid.classify();

        Ok(Dungeon {
            grid,
            rooms,
            corridors,
            entrance,
            exit,
            entrance_path,
            exit_path,
            connectivity: self.connectivity,
        })
    }

    /// Calls `try_generate` until it succeeds, as long as the failures are ones a different random
    /// draw could avoid.
    pub fn generate(&self, rng: &mut impl Rng) -> Result<Dungeon, GenerateError> {
        self.validate()?;

        let mut last = None;
        for attempt in 1..=self.max_generate_tries {
            match self.try_generate(rng) {
                Ok(dungeon) => return Ok(dungeon),
                Err(e) if e.is_retryable() => {
                    log::warn!("Dungeon generation attempt {} failed: {}", attempt, e);
                    last = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        match last {
            Some(last) => Err(GenerateError::GenerationFailed {
                tries: self.max_generate_tries,
                last: Box::new(last),
            }),
            None => Err(GenerateError::InvalidSpec(
                "max_generate_tries must be at least 1".to_string(),
            )),
        }
    }

    /// `generate` with an RNG seeded from `self.seed`.
    pub fn generate_seeded(&self) -> Result<Dungeon, GenerateError> {
        self.generate(&mut small_rng(self.seed))
    }
}

/// A finished dungeon. The grid is fully classified and no longer changes.
#[derive(Clone, Debug)]
pub struct Dungeon {
    grid: Grid,
    rooms: Vec<Region>,
    corridors: SymmetricMap<Vec<Point>>,
    entrance: Point,
    exit: Point,
    entrance_path: Vec<Point>,
    exit_path: Vec<Point>,
    connectivity: Connectivity,
}

impl Dungeon {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Rooms in partition leaf order.
    pub fn rooms(&self) -> &[Region] {
        &self.rooms
    }

    pub fn corridor_count(&self) -> usize {
        self.corridors.len()
    }

    /// The corridor directly joining rooms `i` and `j`, if there is one.
    pub fn corridor_between(&self, i: usize, j: usize) -> Option<&[Point]> {
        self.corridors.get(i, j).map(Vec::as_slice)
    }

    pub fn entrance(&self) -> Point {
        self.entrance
    }

    pub fn exit(&self) -> Point {
        self.exit
    }

    /// Cells opened to connect the entrance; empty if it was already on the floor.
    pub fn entrance_path(&self) -> &[Point] {
        &self.entrance_path
    }

    pub fn exit_path(&self) -> &[Point] {
        &self.exit_path
    }

    /// An open cell to put the camera or the player on: the center of the first room.
    pub fn start(&self) -> Point {
        self.rooms
            .first()
            .map(Region::center)
            .unwrap_or(self.entrance)
    }

    pub fn spawn_area(&self) -> SpawnArea {
        match self.rooms.first() {
            Some(room) => spawn_in_room(room, &self.grid),
            None => SpawnArea {
                valid_spawn_points: vec![self.entrance],
            },
        }
    }

    pub fn room_graph(&self) -> StableGraph<usize, (), Undirected> {
        room_graph(self.rooms.len(), &self.corridors)
    }

    /// Room indices along the longest chain of corridors.
    pub fn main_path(&self) -> Vec<usize> {
        let graph = self.room_graph();

        longest_path_in_tree(&graph)
            .into_iter()
            .map(|n| graph[n])
            .collect()
    }

    pub fn is_reachable(&self, from: &Point, to: &Point) -> bool {
        self.grid
            .flood_fill(from, self.connectivity)
            .contains(to)
    }

    /// Hands every cell's classification to `encoder`, row by row.
    pub fn encode(&self, encoder: &mut impl TileEncoder) {
        for cell in self.grid.cells() {
            encoder.encode_tile(&cell.position(), cell.kind);
        }
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
