//! Mask assembly from labeled blocks
//!
//! Each block writes only the middle half of its window (from `B/4` to
//! `3B/4` on each axis); those regions tile the image. Blocks on the
//! first and last row or column extend their region to the image edge.

use crate::block::BlockGrid;
use crate::error::{CosError, CosResult};
use crate::params::BlockLabel;
use mrcseg_core::{Bitmap, Grid};
use rayon::prelude::*;

/// Build the full-resolution mask for a labeling of a block grid.
///
/// # Errors
///
/// Returns [`CosError::InvalidParameters`] when the label grid does not
/// match the block grid.
pub fn assemble_mask(grid: &BlockGrid, labels: &Grid<BlockLabel>) -> CosResult<Bitmap> {
    let g = &grid.geometry;
    if labels.rows() != g.rows || labels.cols() != g.cols {
        return Err(CosError::InvalidParameters(format!(
            "label grid {}x{} does not match block grid {}x{}",
            labels.rows(),
            labels.cols(),
            g.rows,
            g.cols
        )));
    }

    let mut mask = Bitmap::new(g.width, g.height)?;
    let width = g.width as usize;
    mask.data_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, out)| {
            let y = y as u32;
            // rows of blocks whose center span holds this image row
            let r = (0..g.rows)
                .find(|&r| g.center_span(r, g.rows, g.height).contains(&y))
                .unwrap_or(g.rows - 1);
            let oy = g.origin(r, 0).1;
            for c in 0..g.cols {
                let span = g.center_span(c, g.cols, g.width);
                let label = labels[(r, c)];
                let block = grid.block(r, c);
                let ox = g.origin(r, c).0;
                for x in span {
                    let original = block.binary.get(x - ox, y - oy);
                    out[x as usize] = label.apply(original) as u8;
                }
            }
        });
    Ok(mask)
}
