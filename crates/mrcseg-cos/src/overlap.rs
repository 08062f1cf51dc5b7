//! Precomputed overlap tables
//!
//! Adjacent blocks share a `B x B/2` overlap. The solver's neighbor terms
//! count pixel disagreements in that overlap for every pair of labels. All
//! of them follow from two kinds of counts taken once per layer:
//!
//! - `d00`: disagreements between the two thresholded binaries; a pair of
//!   thresholded labels disagrees on `d00` pixels when both keep or both
//!   flip their binary, and on `area - d00` otherwise
//! - per-block foreground counts in the left/right/top/bottom halves;
//!   when either label is constant the disagreement is the difference of
//!   the two foreground counts
//!
//! The coarser-layer table holds, per block and label, the disagreement
//! between the labeled block and the previous layer's mask.

use crate::block::{BlockGrid, GridGeometry};
use crate::error::{CosError, CosResult};
use crate::params::BlockLabel;
use mrcseg_core::{Bitmap, Grid};
use rayon::prelude::*;

/// Foreground counts of the four half-windows of one block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HalfCounts {
    /// Columns `0..B/2`
    pub left: u32,
    /// Columns `B/2..B`
    pub right: u32,
    /// Rows `0..B/2`
    pub top: u32,
    /// Rows `B/2..B`
    pub bottom: u32,
}

/// Read-only disagreement tables for one block grid
#[derive(Debug, Clone)]
pub struct OverlapTables {
    /// `d00` between `(r, c)` and `(r, c + 1)`; `rows x (cols - 1)`
    pub horizontal: Grid<u32>,
    /// `d00` between `(r, c)` and `(r + 1, c)`; `(rows - 1) x cols`
    pub vertical: Grid<u32>,
    /// Half-window foreground counts per block
    pub halves: Grid<HalfCounts>,
    /// Pixels in one overlap
    pub area: u32,
}

fn half_counts(bm: &Bitmap, half: u32) -> HalfCounts {
    let mut hc = HalfCounts::default();
    for y in 0..bm.height() {
        for x in 0..bm.width() {
            if bm.get(x, y) {
                if x < half {
                    hc.left += 1;
                } else {
                    hc.right += 1;
                }
                if y < half {
                    hc.top += 1;
                } else {
                    hc.bottom += 1;
                }
            }
        }
    }
    hc
}

/// Disagreements between the right half of `a` and the left half of `b`.
fn horizontal_d00(a: &Bitmap, b: &Bitmap, half: u32) -> u32 {
    let mut n = 0;
    for y in 0..a.height() {
        for x in 0..half {
            n += (a.get(half + x, y) != b.get(x, y)) as u32;
        }
    }
    n
}

/// Disagreements between the bottom half of `a` and the top half of `b`.
fn vertical_d00(a: &Bitmap, b: &Bitmap, half: u32) -> u32 {
    let mut n = 0;
    for y in 0..half {
        for x in 0..a.width() {
            n += (a.get(x, half + y) != b.get(x, y)) as u32;
        }
    }
    n
}

/// Disagreeing pixels in an overlap of `area` pixels, given the labels of
/// both blocks, their binaries' `d00`, and each side's foreground count
/// within the overlap.
#[inline]
pub fn pair_mismatch(
    a: BlockLabel,
    b: BlockLabel,
    d00: u32,
    fg_a: u32,
    fg_b: u32,
    area: u32,
) -> u32 {
    if a.uses_threshold() && b.uses_threshold() {
        if a == b { d00 } else { area - d00 }
    } else {
        a.foreground_in(fg_a, area)
            .abs_diff(b.foreground_in(fg_b, area))
    }
}

impl OverlapTables {
    /// Count overlaps for every adjacent pair of a block grid.
    pub fn build(grid: &BlockGrid) -> Self {
        let g = &grid.geometry;
        let half = g.half();
        let (rows, cols) = (g.rows, g.cols);

        let halves = grid.blocks.map(|b| half_counts(&b.binary, half));

        let h_cells: Vec<(usize, usize)> = (0..rows)
            .flat_map(|r| (0..cols.saturating_sub(1)).map(move |c| (r, c)))
            .collect();
        let h: Vec<u32> = h_cells
            .par_iter()
            .map(|&(r, c)| {
                horizontal_d00(
                    &grid.block(r, c).binary,
                    &grid.block(r, c + 1).binary,
                    half,
                )
            })
            .collect();

        let v_cells: Vec<(usize, usize)> = (0..rows.saturating_sub(1))
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .collect();
        let v: Vec<u32> = v_cells
            .par_iter()
            .map(|&(r, c)| {
                vertical_d00(
                    &grid.block(r, c).binary,
                    &grid.block(r + 1, c).binary,
                    half,
                )
            })
            .collect();

        let h_cols = cols.saturating_sub(1);
        let v_rows = rows.saturating_sub(1);
        Self {
            horizontal: Grid::from_fn(rows, h_cols, |r, c| h[r * h_cols + c]),
            vertical: Grid::from_fn(v_rows, cols, |r, c| v[r * cols + c]),
            halves,
            area: g.overlap_area(),
        }
    }

    /// Disagreements between `(r, c)` labeled `a` and `(r, c + 1)` labeled `b`.
    #[inline]
    pub fn horizontal_mismatch(&self, r: usize, c: usize, a: BlockLabel, b: BlockLabel) -> u32 {
        pair_mismatch(
            a,
            b,
            self.horizontal[(r, c)],
            self.halves[(r, c)].right,
            self.halves[(r, c + 1)].left,
            self.area,
        )
    }

    /// Disagreements between `(r, c)` labeled `a` and `(r + 1, c)` labeled `b`.
    #[inline]
    pub fn vertical_mismatch(&self, r: usize, c: usize, a: BlockLabel, b: BlockLabel) -> u32 {
        pair_mismatch(
            a,
            b,
            self.vertical[(r, c)],
            self.halves[(r, c)].bottom,
            self.halves[(r + 1, c)].top,
            self.area,
        )
    }
}

/// Per-block, per-label disagreement with a coarser layer's mask
#[derive(Debug, Clone)]
pub struct CoarseTable {
    /// Disagreeing in-bounds pixels, indexed by [`BlockLabel::index`]
    pub mismatch: Grid<[u32; 4]>,
}

impl CoarseTable {
    /// Compare every block window against a full-resolution coarse mask.
    ///
    /// Only in-bounds pixels of each window are counted.
    ///
    /// # Errors
    ///
    /// Returns [`CosError::CoarseMismatch`] when the mask size differs
    /// from the image.
    pub fn build(grid: &BlockGrid, coarse: &Bitmap) -> CosResult<Self> {
        let g = &grid.geometry;
        if coarse.width() != g.width || coarse.height() != g.height {
            return Err(CosError::CoarseMismatch(format!(
                "mask is {}x{}, image is {}x{}",
                coarse.width(),
                coarse.height(),
                g.width,
                g.height
            )));
        }
        let cells: Vec<(usize, usize)> = (0..g.rows)
            .flat_map(|r| (0..g.cols).map(move |c| (r, c)))
            .collect();
        let rows: Vec<[u32; 4]> = cells
            .par_iter()
            .map(|&(r, c)| block_vs_coarse(g, &grid.block(r, c).binary, g.origin(r, c), coarse))
            .collect();
        let mismatch = Grid::from_fn(g.rows, g.cols, |r, c| rows[r * g.cols + c]);
        Ok(Self { mismatch })
    }
}

fn block_vs_coarse(
    g: &GridGeometry,
    binary: &Bitmap,
    origin: (u32, u32),
    coarse: &Bitmap,
) -> [u32; 4] {
    let x_end = (origin.0 + g.block_size).min(g.width);
    let y_end = (origin.1 + g.block_size).min(g.height);
    let n = (x_end - origin.0) * (y_end - origin.1);
    let mut on = 0u32;
    let mut m = 0u32;
    for y in origin.1..y_end {
        for x in origin.0..x_end {
            let c = coarse.get(x, y);
            on += c as u32;
            m += (c != binary.get(x - origin.0, y - origin.1)) as u32;
        }
    }
    let mut out = [0; 4];
    out[BlockLabel::Original.index()] = m;
    out[BlockLabel::Reversed.index()] = n - m;
    out[BlockLabel::AllBackground.index()] = on;
    out[BlockLabel::AllForeground.index()] = n - on;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrcseg_core::{Pix, PixelDepth};

    #[test]
    fn test_pair_mismatch_cases() {
        use BlockLabel::*;
        // area 8, binaries disagree on 3, a has 5 fg, b has 2 fg
        assert_eq!(pair_mismatch(Original, Original, 3, 5, 2, 8), 3);
        assert_eq!(pair_mismatch(Reversed, Reversed, 3, 5, 2, 8), 3);
        assert_eq!(pair_mismatch(Original, Reversed, 3, 5, 2, 8), 5);
        assert_eq!(pair_mismatch(Original, AllBackground, 3, 5, 2, 8), 5);
        assert_eq!(pair_mismatch(Reversed, AllForeground, 3, 5, 2, 8), 5);
        assert_eq!(pair_mismatch(AllForeground, AllBackground, 3, 5, 2, 8), 8);
        assert_eq!(pair_mismatch(AllBackground, Original, 3, 5, 2, 8), 2);
    }

    #[test]
    fn test_tables_on_vertical_edge() {
        // dark left third of a 48x16 image, blocks of 16
        let mut pm = Pix::new(48, 16, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(0, 0, 48, 16, (240, 240, 240)).unwrap();
        pm.fill_rect_rgb(0, 0, 12, 16, (10, 10, 10)).unwrap();
        let pix: Pix = pm.into();
        let grid = BlockGrid::build(&pix, 16).unwrap();
        assert_eq!((grid.geometry.rows, grid.geometry.cols), (1, 5));

        let t = OverlapTables::build(&grid);
        assert_eq!(t.area, 128);
        assert_eq!(t.vertical.len(), 0);
        // block 0 covers x 0..16: fg columns 0..12
        assert_eq!(t.halves[(0, 0)].left, 128);
        assert_eq!(t.halves[(0, 0)].right, 64);
        // block 1 covers x 8..24: fg columns 8..12 in its left half
        assert_eq!(t.halves[(0, 1)].left, 64);
        assert_eq!(t.horizontal[(0, 0)], 0);
        assert_eq!(
            t.horizontal_mismatch(0, 0, BlockLabel::Original, BlockLabel::Reversed),
            128
        );
        // block 2 (x 16..32) is uniform: Original is all background
        assert_eq!(
            t.horizontal_mismatch(0, 1, BlockLabel::Original, BlockLabel::Original),
            0
        );
        assert_eq!(
            t.horizontal_mismatch(0, 1, BlockLabel::Original, BlockLabel::AllForeground),
            128
        );
    }

    #[test]
    fn test_coarse_table() {
        let mut pm = Pix::new(16, 16, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(0, 0, 16, 16, (240, 240, 240)).unwrap();
        pm.fill_rect_rgb(0, 0, 8, 16, (10, 10, 10)).unwrap();
        let pix: Pix = pm.into();
        let grid = BlockGrid::build(&pix, 16).unwrap();
        let mut coarse = Bitmap::new(16, 16).unwrap();
        coarse.fill_rect(&mrcseg_core::Box::new_unchecked(0, 0, 4, 16), true);
        let t = CoarseTable::build(&grid, &coarse).unwrap();
        let m = t.mismatch[(0, 0)];
        assert_eq!(m, [64, 192, 64, 192]);
        let wrong = Bitmap::new(8, 8).unwrap();
        assert!(CoarseTable::build(&grid, &wrong).is_err());
    }
}
