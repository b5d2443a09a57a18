//! Grid coordinate mapping
//!
//! A version's tiles form a square grid of `sqrt(tile_count)` columns,
//! numbered row-major from the top-left. These functions convert between
//! linear indices and `(x, y)` positions and enumerate rectangular regions.

mod types;

pub use types::{GridCoordinate, GridError, GridRegion};

/// Returns the side length of the grid, or `InvalidGrid` when `tile_count`
/// is not a non-zero perfect square.
pub fn grid_size(tile_count: u32) -> Result<u32, GridError> {
    let side = isqrt(tile_count);
    if tile_count == 0 || side * side != tile_count {
        return Err(GridError::InvalidGrid { tile_count });
    }
    Ok(side)
}

/// Converts a linear index to `(x, y)`.
pub fn to_coordinate(index: u32, tile_count: u32) -> Result<(u32, u32), GridError> {
    let size = grid_size(tile_count)?;
    if index >= tile_count {
        return Err(GridError::OutOfBounds(format!(
            "index {} is outside 0..{}",
            index, tile_count
        )));
    }
    Ok((index % size, index / size))
}

/// Converts `(x, y)` to a linear index on a grid of `grid_size` columns.
pub fn to_index(x: u32, y: u32, grid_size: u32) -> Result<u32, GridError> {
    if x >= grid_size || y >= grid_size {
        return Err(GridError::OutOfBounds(format!(
            "({}, {}) is outside a {}x{} grid",
            x, y, grid_size, grid_size
        )));
    }
    Ok(y * grid_size + x)
}

/// Like [`to_coordinate`], returning the full [`GridCoordinate`].
pub fn coordinate(version: &str, index: u32, tile_count: u32) -> Result<GridCoordinate, GridError> {
    let (x, y) = to_coordinate(index, tile_count)?;
    Ok(GridCoordinate {
        version: version.to_string(),
        x,
        y,
        index,
    })
}

/// Lists every tile in `region`, rows top to bottom, columns left to right.
///
/// The whole rectangle must lie inside the grid; nothing is enumerated
/// otherwise.
pub fn tiles_in_region(
    version: &str,
    tile_count: u32,
    region: GridRegion,
) -> Result<Vec<GridCoordinate>, GridError> {
    let size = grid_size(tile_count)?;

    if !region.is_well_formed() {
        return Err(GridError::OutOfBounds(format!(
            "region {} has minimum greater than maximum",
            region
        )));
    }
    if region.max_x >= size || region.max_y >= size {
        return Err(GridError::OutOfBounds(format!(
            "region {} exceeds a {}x{} grid",
            region, size, size
        )));
    }

    let mut tiles = Vec::with_capacity(region.area() as usize);
    for y in region.min_y..=region.max_y {
        for x in region.min_x..=region.max_x {
            tiles.push(GridCoordinate {
                version: version.to_string(),
                x,
                y,
                index: y * size + x,
            });
        }
    }
    Ok(tiles)
}

/// Bounding box of `indices` on the grid.
///
/// `None` when the tile count is not square, `indices` is empty, or any
/// index is out of range.
pub fn bounding_region(indices: &[u32], tile_count: u32) -> Option<GridRegion> {
    let size = grid_size(tile_count).ok()?;
    let mut region: Option<GridRegion> = None;

    for &index in indices {
        if index >= tile_count {
            return None;
        }
        let (x, y) = (index % size, index / size);
        match region.as_mut() {
            Some(r) => r.include(x, y),
            None => region = Some(GridRegion::single(x, y)),
        }
    }
    region
}

/// Integer square root, rounded down.
fn isqrt(n: u32) -> u32 {
    let mut root = f64::from(n).sqrt() as u32;
    // Correct any float rounding at the edges
    while u64::from(root) * u64::from(root) > u64::from(n) {
        root -= 1;
    }
    while u64::from(root + 1) * u64::from(root + 1) <= u64::from(n) {
        root += 1;
    }
    root
}
