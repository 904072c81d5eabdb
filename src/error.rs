use crate::{grid::Point, partition::Axis, region::Region};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("point {point:?} is outside the {width}x{height} grid")]
    OutOfBounds {
        point: Point,
        width: u32,
        height: u32,
    },

    #[error("{region:?} is too small to split along the {axis:?} axis")]
    RegionTooSmall { region: Region, axis: Axis },

    /// The entrance/exit walk ran off the grid without reaching open floor.
    #[error("no open cell reachable from {point:?} along its diagonal")]
    DisconnectedTopology { point: Point },

    #[error("invalid dungeon spec: {0}")]
    InvalidSpec(String),

    #[error("failed to parse dungeon spec: {0}")]
    Spec(#[from] ron::Error),

    #[error("failed to generate dungeon after {tries} tries: {last}")]
    GenerationFailed {
        tries: usize,
        last: Box<GenerateError>,
    },
}

impl GenerateError {
    /// True for failures that a fresh random stream may avoid.
    pub fn is_retryable(&self) -> bool {
        match self {
            GenerateError::RegionTooSmall { .. } | GenerateError::DisconnectedTopology { .. } => {
                true
            }
            _ => false,
        }
    }
}
