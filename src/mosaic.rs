//! Mosaic layout of a tile stack.
//!
//! A stack of `T` equally sized tiles is packed into a single canvas on a
//! near-square grid with `rows = floor(sqrt(T))` and `cols = ceil(T / rows)`.
//! Tiles are placed in reading order: tile 0 top-left, tile 1 to its right,
//! wrapping to the next grid row after `cols` tiles. Grid cells past the last
//! tile keep the background value (`A::default()`, zero for pixel types).

use ndarray::{Array2, ArrayView2, ArrayView3, Axis, s};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MosaicError {
    #[error("Cannot build a mosaic from an empty tile stack")]
    EmptyInput,

    #[error("Tile {index} has shape {found:?}, expected {expected:?}")]
    ShapeMismatch {
        index: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Grid arrangement (rows, cols) for a given number of tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
}

impl GridShape {
    /// Returns `None` for an empty stack
    pub fn for_tile_count(tile_count: usize) -> Option<Self> {
        if tile_count == 0 {
            return None;
        }
        let rows = tile_count.isqrt();
        let cols = tile_count.div_ceil(rows);
        Some(Self { rows, cols })
    }

    /// Number of grid cells, including padding cells
    pub fn cells(&self) -> usize {
        self.rows * self.cols
    }

    /// Grid cell (row, col) holding tile `index`
    #[inline]
    pub fn cell(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

/// Packs `tiles` into one canvas of shape `(rows * H, cols * W)`.
///
/// A single tile is returned unchanged.
///
/// # Errors
///
/// [`MosaicError::EmptyInput`] for an empty slice and
/// [`MosaicError::ShapeMismatch`] when a tile's shape differs from the first
/// tile's.
pub fn mosaic<A>(tiles: &[ArrayView2<'_, A>]) -> Result<Array2<A>, MosaicError>
where
    A: Clone + Default,
{
    let first = tiles.first().ok_or(MosaicError::EmptyInput)?;
    let tile_dim = first.dim();

    if let Some((index, tile)) = tiles
        .iter()
        .enumerate()
        .find(|(_, tile)| tile.dim() != tile_dim)
    {
        return Err(MosaicError::ShapeMismatch {
            index,
            expected: tile_dim,
            found: tile.dim(),
        });
    }

    if tiles.len() == 1 {
        return Ok(first.to_owned());
    }

    Ok(place_tiles(tiles.iter().cloned(), tiles.len(), tile_dim))
}

/// Packs a stack whose first axis indexes tiles. A stack of depth one is
/// returned as its only plane.
pub fn mosaic_stack<A>(stack: ArrayView3<'_, A>) -> Result<Array2<A>, MosaicError>
where
    A: Clone + Default,
{
    let (depth, height, width) = stack.dim();
    match depth {
        0 => Err(MosaicError::EmptyInput),
        1 => Ok(stack.index_axis(Axis(0), 0).to_owned()),
        _ => Ok(place_tiles(stack.outer_iter(), depth, (height, width))),
    }
}

fn place_tiles<'a, A, I>(tiles: I, tile_count: usize, tile_dim: (usize, usize)) -> Array2<A>
where
    A: Clone + Default + 'a,
    I: Iterator<Item = ArrayView2<'a, A>>,
{
    let (height, width) = tile_dim;
    // tile_count > 0 is checked by both callers
    let grid = GridShape::for_tile_count(tile_count).unwrap_or(GridShape { rows: 1, cols: 1 });
    let mut canvas = Array2::from_elem((grid.rows * height, grid.cols * width), A::default());

    for (index, tile) in tiles.enumerate() {
        let (row, col) = grid.cell(index);
        canvas
            .slice_mut(s![
                row * height..(row + 1) * height,
                col * width..(col + 1) * width
            ])
            .assign(&tile);
    }

    canvas
}
