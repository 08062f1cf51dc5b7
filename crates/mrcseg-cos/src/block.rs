//! Overlapping block grid
//!
//! Blocks are `B x B` windows placed with stride `B/2`, so every
//! interior pixel is covered by four blocks. Along a dimension of length
//! `d` there are `max(1, ceil((d - B/2) / (B/2)))` blocks; the last one
//! may run past the image and is padded with zero samples.
//!
//! For each block the channel with the greatest variance is chosen and
//! thresholded at its minimum within-class variance cut. Samples at or
//! below the threshold are foreground (dark ink on light paper).

use crate::error::{CosError, CosResult};
use crate::threshold::Histogram;
use mrcseg_core::{Bitmap, Grid, Pix};
use rayon::prelude::*;
use std::ops::Range;

/// Placement of the block grid over an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridGeometry {
    /// Block side `B`
    pub block_size: u32,
    /// Image width
    pub width: u32,
    /// Image height
    pub height: u32,
    /// Number of block rows
    pub rows: usize,
    /// Number of block columns
    pub cols: usize,
}

/// Number of stride-`half` blocks of side `2*half` needed to cover `len`.
pub fn grid_len(len: u32, half: u32) -> usize {
    if len <= half {
        return 1;
    }
    (len - half).div_ceil(half).max(1) as usize
}

impl GridGeometry {
    /// Lay out blocks of side `block_size` over a `width x height` image.
    ///
    /// # Errors
    ///
    /// Returns [`CosError::InvalidBlockSize`] unless `block_size` is a
    /// positive multiple of 4.
    pub fn new(width: u32, height: u32, block_size: u32) -> CosResult<Self> {
        if block_size == 0 || block_size % 4 != 0 {
            return Err(CosError::InvalidBlockSize(block_size));
        }
        if width == 0 || height == 0 {
            return Err(mrcseg_core::Error::InvalidDimension { width, height }.into());
        }
        let half = block_size / 2;
        Ok(Self {
            block_size,
            width,
            height,
            rows: grid_len(height, half),
            cols: grid_len(width, half),
        })
    }

    /// Stride between blocks, `B/2`
    #[inline]
    pub fn half(&self) -> u32 {
        self.block_size / 2
    }

    /// Pixels in one block, `B^2`
    #[inline]
    pub fn block_area(&self) -> u32 {
        self.block_size * self.block_size
    }

    /// Pixels in the overlap of two adjacent blocks, `B * B/2`
    #[inline]
    pub fn overlap_area(&self) -> u32 {
        self.block_size * self.half()
    }

    /// Image position of the top-left corner of block `(row, col)`
    #[inline]
    pub fn origin(&self, row: usize, col: usize) -> (u32, u32) {
        (col as u32 * self.half(), row as u32 * self.half())
    }

    /// Image pixels a block owns in the assembled mask along one axis.
    ///
    /// Each block owns the middle half of its window; the first and last
    /// blocks extend to the image edge.
    pub fn center_span(&self, index: usize, count: usize, len: u32) -> Range<u32> {
        let start = index as u32 * self.half();
        let quarter = self.block_size / 4;
        let lo = if index == 0 { 0 } else { start + quarter };
        let hi = if index + 1 == count {
            len
        } else {
            start + 3 * quarter
        };
        lo.min(len)..hi.min(len)
    }

    /// Block whose center is nearest to image coordinate `c` along an
    /// axis with `count` blocks.
    pub fn nearest_block(&self, c: f64, count: usize) -> usize {
        // center of block k is (k + 1) * half
        let k = (c / self.half() as f64 - 1.0).round();
        k.clamp(0.0, (count.max(1) - 1) as f64) as usize
    }

    /// Center of block index `k` along either axis
    #[inline]
    pub fn block_center(&self, k: usize) -> f64 {
        ((k + 1) as u32 * self.half()) as f64
    }

    /// Whether at least `min_blocks` blocks fit across the shorter side.
    pub fn fits(&self, min_blocks: usize) -> bool {
        self.rows.min(self.cols) >= min_blocks
    }
}

/// One block of the grid after local thresholding
#[derive(Debug, Clone)]
pub struct Block {
    /// Source channel with the greatest variance
    pub channel: usize,
    /// Cut point; samples `<= threshold` are foreground
    pub threshold: u8,
    /// Whether the block has a cut with both sides non-empty
    pub split: bool,
    /// Thresholded binary of the `B x B` window
    pub binary: Bitmap,
    /// Minimum pooled within-class variance (0 for uniform blocks)
    pub gamma: f64,
    /// Variance of the chosen channel over the window
    pub variance: f64,
    /// Foreground pixels of `binary`
    pub fg_count: u32,
}

impl Block {
    /// Threshold the `B x B` window at `origin` of a 3-channel 8-bit image.
    fn build(pix: &Pix, origin: (u32, u32), block_size: u32) -> CosResult<Self> {
        let b = block_size as usize;
        let (w, h) = (pix.width(), pix.height());
        let data = pix.data();
        let x_end = (origin.0 + block_size).min(w);
        let y_end = (origin.1 + block_size).min(h);

        // per-channel sums and sums of squares; padding contributes zeros
        let mut sum = [0u64; 3];
        let mut sum_sq = [0u64; 3];
        for y in origin.1..y_end {
            let row = pix.sample_index(origin.0, y, 0);
            let n = (x_end - origin.0) as usize * 3;
            for px in data[row..row + n].chunks_exact(3) {
                for c in 0..3 {
                    let v = px[c] as u64;
                    sum[c] += v;
                    sum_sq[c] += v * v;
                }
            }
        }
        let n = (b * b) as f64;
        let mut channel = 0;
        let mut variance = -1.0;
        for c in 0..3 {
            let mean = sum[c] as f64 / n;
            let var = (sum_sq[c] as f64 / n - mean * mean).max(0.0);
            if var > variance {
                variance = var;
                channel = c;
            }
        }

        let mut hist = Histogram::new();
        let inside = ((x_end - origin.0) * (y_end - origin.1)) as usize;
        hist.add_n(0, (b * b - inside) as u32);
        for y in origin.1..y_end {
            for x in origin.0..x_end {
                hist.add(data[pix.sample_index(x, y, channel as u32)]);
            }
        }

        let mut binary = Bitmap::new(block_size, block_size)?;
        let (threshold, gamma, split) = match hist.min_variance_cut() {
            Some(cut) => (cut.threshold, cut.gamma, true),
            None => (0, 0.0, false),
        };
        let mut fg_count = 0;
        if split {
            for ly in 0..block_size {
                for lx in 0..block_size {
                    let (x, y) = (origin.0 + lx, origin.1 + ly);
                    let v = if x < w && y < h {
                        data[pix.sample_index(x, y, channel as u32)]
                    } else {
                        0
                    };
                    if v <= threshold {
                        binary.set(lx, ly, true);
                        fg_count += 1;
                    }
                }
            }
        }

        Ok(Self {
            channel,
            threshold,
            split,
            binary,
            gamma,
            variance,
            fg_count,
        })
    }

    /// Cost of the local data term: `sqrt(gamma)` for the thresholded
    /// labels, `sqrt(variance)` for the constant ones.
    #[inline]
    pub fn data_cost(&self, uses_threshold: bool) -> f64 {
        if uses_threshold {
            self.gamma.sqrt()
        } else {
            self.variance.sqrt()
        }
    }
}

/// Thresholded blocks of one image at one block size
#[derive(Debug, Clone)]
pub struct BlockGrid {
    /// Grid placement
    pub geometry: GridGeometry,
    /// Blocks, indexed `(row, col)`
    pub blocks: Grid<Block>,
}

impl BlockGrid {
    /// Partition and threshold a 3-channel 8-bit image.
    ///
    /// Blocks are thresholded in parallel.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid block size, an empty image, or an
    /// image that is not 3-channel 8-bit.
    pub fn build(pix: &Pix, block_size: u32) -> CosResult<Self> {
        pix.ensure_rgb8()?;
        let geometry = GridGeometry::new(pix.width(), pix.height(), block_size)?;
        let cells: Vec<(usize, usize)> = (0..geometry.rows)
            .flat_map(|r| (0..geometry.cols).map(move |c| (r, c)))
            .collect();
        let blocks = cells
            .par_iter()
            .map(|&(r, c)| Block::build(pix, geometry.origin(r, c), block_size))
            .collect::<CosResult<Vec<_>>>()?;
        let blocks = Grid::from_vec(geometry.rows, geometry.cols, blocks).ok_or_else(|| {
            CosError::InvalidParameters("block count does not match grid".into())
        })?;
        Ok(Self { geometry, blocks })
    }

    /// Block at `(row, col)`
    #[inline]
    pub fn block(&self, row: usize, col: usize) -> &Block {
        &self.blocks[(row, col)]
    }
}
