pub mod corridor;
pub mod error;
pub mod graph;
pub mod grid;
pub mod map_types;
pub mod partition;
pub mod region;
pub mod room;
pub mod sampling;

mod symmetric_map;

pub use error::GenerateError;
pub use grid::{Cell, Connectivity, Grid, Point, TileKind};
pub use map_types::dungeon::{Dungeon, DungeonMapSpec};
pub use region::Region;

use serde::{Deserialize, Serialize};

/// Implement this to let a renderer (mesh builder, texture painter, ...) receive the finished
/// tiles of a dungeon.
pub trait TileEncoder {
    /// `tile` is the classification of the cell at `point`.
    fn encode_tile(&mut self, point: &Point, tile: TileKind);
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpawnArea {
    pub valid_spawn_points: Vec<Point>,
}
