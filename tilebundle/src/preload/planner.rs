//! Chunk planning over a version's index space.

use super::types::PreloadError;
use crate::grid::{bounding_region, GridRegion};
use crate::manifest::VersionId;

/// One contiguous slice of a version's tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    pub version: VersionId,
    pub tile_indices: Vec<u32>,
    /// Bounding box on the grid; `None` when the tile count is not square
    pub grid_region: Option<GridRegion>,
}

impl ChunkPlan {
    pub fn len(&self) -> usize {
        self.tile_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tile_indices.is_empty()
    }
}

/// Splits `0..tile_count` into contiguous chunks of at most `chunk_size`.
///
/// The last chunk may be shorter. Chunks cover every index exactly once.
pub fn plan_chunks(
    version: &str,
    tile_count: u32,
    chunk_size: u32,
) -> Result<Vec<ChunkPlan>, PreloadError> {
    if chunk_size == 0 {
        return Err(PreloadError::InvalidChunkSize);
    }

    let mut plans = Vec::with_capacity(tile_count.div_ceil(chunk_size) as usize);
    let mut start = 0u32;
    while start < tile_count {
        let end = start.saturating_add(chunk_size).min(tile_count);
        let tile_indices: Vec<u32> = (start..end).collect();
        let grid_region = bounding_region(&tile_indices, tile_count);
        plans.push(ChunkPlan {
            version: version.to_string(),
            tile_indices,
            grid_region,
        });
        start = end;
    }
    Ok(plans)
}
