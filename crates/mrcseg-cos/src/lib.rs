//! mrcseg-cos - Cost-optimized block segmentation
//!
//! This crate binarizes a color page by labeling a grid of half-overlapping
//! blocks:
//!
//! - **Local thresholding** - Per block, the highest-variance channel is cut
//!   at its minimum within-class variance threshold
//! - **Overlap tables** - Neighbor disagreements for every label pair,
//!   computed once per grid
//! - **Dynamic programming** - Rows are relabeled by an exact 4-state
//!   Viterbi pass and swept to a fixed point
//! - **Mask assembly** - Each block writes the middle half of its window
//!
//! # Examples
//!
//! ```
//! use mrcseg_core::{Pix, PixelDepth};
//! use mrcseg_cos::{CosParams, segment_blocks};
//!
//! let pix = Pix::new(128, 128, 3, PixelDepth::Bit8).unwrap();
//! let params = CosParams::default().with_block_size(16);
//! let seg = segment_blocks(&pix, &params, None).unwrap();
//! assert_eq!(seg.mask.width(), 128);
//! ```

pub mod assemble;
pub mod block;
pub mod error;
pub mod overlap;
pub mod params;
pub mod segment;
pub mod solver;
pub mod threshold;

pub use error::{CosError, CosResult};

pub use params::{
    BlockLabel, CosParams, CosWeights, DEFAULT_BLOCK_SIZE, DEFAULT_LAMBDA1, DEFAULT_LAMBDA2,
    DEFAULT_LAMBDA3, DEFAULT_LAMBDA4, DEFAULT_MAX_ITERATIONS,
};

pub use block::{Block, BlockGrid, GridGeometry, grid_len};
pub use overlap::{CoarseTable, HalfCounts, OverlapTables};
pub use segment::{CoarseLayer, CosSegmentation, segment_blocks, total_cost, upsample_labels};
pub use solver::{CostModel, SolveOutcome};
pub use threshold::{Histogram, ThresholdCut};

pub use assemble::assemble_mask;
