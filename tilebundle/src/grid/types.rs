//! Grid type definitions

use crate::manifest::VersionId;
use std::fmt;
use thiserror::Error;

/// A tile addressed by position on its version's square grid.
///
/// `index == y * grid_size + x`, with `x` growing east and `y` growing
/// south from the top-left tile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridCoordinate {
    pub version: VersionId,
    pub x: u32,
    pub y: u32,
    pub index: u32,
}

/// Rectangle of tiles with inclusive bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridRegion {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl GridRegion {
    pub fn new(min_x: u32, min_y: u32, max_x: u32, max_y: u32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Region covering exactly one tile.
    pub fn single(x: u32, y: u32) -> Self {
        Self::new(x, y, x, y)
    }

    /// True when both minimums are at most their maximums.
    pub fn is_well_formed(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    pub fn width(&self) -> u32 {
        self.max_x.saturating_sub(self.min_x) + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y.saturating_sub(self.min_y) + 1
    }

    /// Number of tiles in the rectangle.
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.min_x..=self.max_x).contains(&x) && (self.min_y..=self.max_y).contains(&y)
    }

    /// Grows the region to include `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }
}

impl fmt::Display for GridRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {})..=({}, {})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Errors from grid conversions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GridError {
    /// The tile count does not form a square grid
    #[error("tile count {tile_count} is not a perfect square")]
    InvalidGrid { tile_count: u32 },

    /// An index, coordinate or region falls outside the grid
    #[error("out of bounds: {0}")]
    OutOfBounds(String),
}
