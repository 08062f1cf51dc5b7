//! One block segmentation pass
//!
//! Threshold the block grid, precompute the overlap tables, iterate the
//! row solver, and assemble the mask. A finer pass of a multiscale run
//! passes the previous pass as a [`CoarseLayer`]: its mask feeds the
//! coarser-layer mismatch term and its labels seed the solver.

use crate::assemble::assemble_mask;
use crate::block::{BlockGrid, GridGeometry};
use crate::error::{CosError, CosResult};
use crate::overlap::{CoarseTable, OverlapTables};
use crate::params::{BlockLabel, CosParams};
use crate::solver::CostModel;
use log::debug;
use mrcseg_core::{Bitmap, Grid, Pix};

/// The previous, coarser pass of a multiscale run
#[derive(Debug, Clone, Copy)]
pub struct CoarseLayer<'a> {
    /// Final mask of the coarser pass, at full resolution
    pub mask: &'a Bitmap,
    /// Block labels of the coarser pass
    pub labels: &'a Grid<BlockLabel>,
    /// Grid placement of the coarser pass
    pub geometry: GridGeometry,
}

/// Output of one block segmentation pass
#[derive(Debug, Clone)]
pub struct CosSegmentation {
    /// Grid placement
    pub geometry: GridGeometry,
    /// Final block labels
    pub labels: Grid<BlockLabel>,
    /// Assembled mask (1 = foreground)
    pub mask: Bitmap,
    /// Sweeps performed
    pub sweeps: usize,
    /// Grid cost after each sweep
    pub cost_history: Vec<f64>,
    /// Whether the solver reached a fixed point before the sweep cap
    pub converged: bool,
}

impl CosSegmentation {
    /// Grid cost after the last sweep
    pub fn final_cost(&self) -> Option<f64> {
        self.cost_history.last().copied()
    }
}

/// Nearest-neighbor upsampling of a coarse label grid by block centers.
pub fn upsample_labels(
    coarse: &GridGeometry,
    labels: &Grid<BlockLabel>,
    fine: &GridGeometry,
) -> Grid<BlockLabel> {
    Grid::from_fn(fine.rows, fine.cols, |r, c| {
        let cr = coarse.nearest_block(fine.block_center(r), labels.rows());
        let cc = coarse.nearest_block(fine.block_center(c), labels.cols());
        labels[(cr, cc)]
    })
}

/// Run one block segmentation pass over a 3-channel 8-bit image.
///
/// # Errors
///
/// Returns an error for invalid parameters, an image that is not
/// 3-channel 8-bit, or a coarse layer whose mask or labels do not match.
pub fn segment_blocks(
    pix: &Pix,
    params: &CosParams,
    coarse: Option<CoarseLayer<'_>>,
) -> CosResult<CosSegmentation> {
    params.validate()?;
    let grid = BlockGrid::build(pix, params.block_size)?;
    let geometry = grid.geometry;
    let tables = OverlapTables::build(&grid);

    let (coarse_table, init) = match coarse {
        Some(layer) => {
            if layer.labels.rows() != layer.geometry.rows
                || layer.labels.cols() != layer.geometry.cols
            {
                return Err(CosError::CoarseMismatch(format!(
                    "labels are {}x{}, coarse grid is {}x{}",
                    layer.labels.rows(),
                    layer.labels.cols(),
                    layer.geometry.rows,
                    layer.geometry.cols
                )));
            }
            let table = CoarseTable::build(&grid, layer.mask)?;
            let init = upsample_labels(&layer.geometry, layer.labels, &geometry);
            (Some(table), Some(init))
        }
        None => (None, None),
    };

    let model = CostModel::new(&grid, &tables, coarse_table.as_ref(), params.weights);
    let outcome = model.solve(init, params.max_iterations);
    let mask = assemble_mask(&grid, &outcome.labels)?;

    debug!(
        "cos: block {} grid {}x{} sweeps {} converged {} cost {:.3}",
        params.block_size,
        geometry.rows,
        geometry.cols,
        outcome.sweeps,
        outcome.converged,
        outcome.cost_history.last().copied().unwrap_or(0.0)
    );

    Ok(CosSegmentation {
        geometry,
        labels: outcome.labels,
        mask,
        sweeps: outcome.sweeps,
        cost_history: outcome.cost_history,
        converged: outcome.converged,
    })
}

/// Cost of an arbitrary labeling under the same model as
/// [`segment_blocks`], for diagnostics.
pub fn total_cost(
    pix: &Pix,
    params: &CosParams,
    labels: &Grid<BlockLabel>,
    coarse_mask: Option<&Bitmap>,
) -> CosResult<f64> {
    params.validate()?;
    let grid = BlockGrid::build(pix, params.block_size)?;
    if labels.rows() != grid.geometry.rows || labels.cols() != grid.geometry.cols {
        return Err(CosError::InvalidParameters(format!(
            "label grid {}x{} does not match block grid {}x{}",
            labels.rows(),
            labels.cols(),
            grid.geometry.rows,
            grid.geometry.cols
        )));
    }
    let tables = OverlapTables::build(&grid);
    let coarse = coarse_mask
        .map(|m| CoarseTable::build(&grid, m))
        .transpose()?;
    let model = CostModel::new(&grid, &tables, coarse.as_ref(), params.weights);
    Ok(model.total_cost(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrcseg_core::PixelDepth;

    #[test]
    fn test_upsample_labels() {
        let coarse = GridGeometry::new(64, 64, 32).unwrap();
        let fine = GridGeometry::new(64, 64, 16).unwrap();
        assert_eq!((coarse.rows, coarse.cols), (3, 3));
        assert_eq!((fine.rows, fine.cols), (7, 7));
        let labels = Grid::from_fn(3, 3, |r, _| BlockLabel::ALL[r]);
        let up = upsample_labels(&coarse, &labels, &fine);
        assert_eq!(up.rows(), 7);
        // fine centers 8, 16, ..., 56 against coarse centers 16, 32, 48
        assert_eq!(up[(0, 0)], BlockLabel::Original);
        assert_eq!(up[(3, 0)], BlockLabel::Reversed);
        assert_eq!(up[(6, 6)], BlockLabel::AllBackground);
    }

    #[test]
    fn test_segment_rejects_bad_input() {
        let gray = Pix::new(64, 64, 1, PixelDepth::Bit8).unwrap();
        assert!(segment_blocks(&gray, &CosParams::default(), None).is_err());
        let rgb = Pix::new(64, 64, 3, PixelDepth::Bit8).unwrap();
        let bad = CosParams::default().with_block_size(10);
        assert!(matches!(
            segment_blocks(&rgb, &bad, None),
            Err(CosError::InvalidBlockSize(10))
        ));
    }

    #[test]
    fn test_total_cost_agrees_with_solver() {
        let mut pm = Pix::new(64, 64, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(0, 0, 64, 64, (230, 230, 230)).unwrap();
        pm.fill_rect_rgb(10, 10, 30, 6, (20, 20, 20)).unwrap();
        let pix: Pix = pm.into();
        let params = CosParams::default().with_block_size(16);
        let seg = segment_blocks(&pix, &params, None).unwrap();
        let cost = total_cost(&pix, &params, &seg.labels, None).unwrap();
        assert!((cost - seg.final_cost().unwrap()).abs() < 1e-9);
    }
}
