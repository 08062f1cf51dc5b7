//! mrcseg - Multiscale document image segmentation
//!
//! Separates text and line-art foreground from the background of a
//! scanned page, producing a binary mask the size of the page.
//!
//! # Overview
//!
//! Each scale runs two passes:
//!
//! - Block segmentation ([`cos`]): overlapping blocks are thresholded
//!   locally and labeled by row-wise dynamic programming
//! - Component classification ([`ccc`]): connected components of that
//!   mask are scored by a Gaussian-mixture model and smoothed over a
//!   neighbor graph; non-text components are dropped
//!
//! Scales run coarse to fine, each finer layer seeded and penalized by the
//! coarser one.
//!
//! # Example
//!
//! ```
//! use mrcseg::{Pix, PixelDepth, SegmentParams, SignatureSet, segment};
//!
//! let mut pm = Pix::new(256, 256, 3, PixelDepth::Bit8).unwrap().to_mut();
//! pm.fill_rect_rgb(0, 0, 256, 256, (250, 250, 250)).unwrap();
//! pm.fill_rect_rgb(40, 40, 6, 40, (10, 10, 10)).unwrap();
//! let pix: Pix = pm.into();
//!
//! let set = SignatureSet::default_model().unwrap();
//! let params = SegmentParams::default().with_block_size(32).with_num_layers(2);
//! let result = segment(&pix, &params, &set).unwrap();
//! assert_eq!(result.mask.width(), 256);
//! assert_eq!(result.report.layers.len(), 2);
//! ```

pub mod error;
pub mod multiscale;
pub mod params;

// Re-export core types (primary data structures used everywhere)
pub use mrcseg_core::*;

// Re-export the pass crates as modules to avoid name conflicts
pub use mrcseg_ccc as ccc;
pub use mrcseg_cos as cos;
pub use mrcseg_region as region;

pub use error::{SegmentError, SegmentResult};
pub use multiscale::{
    LayerReport, SegmentReport, Segmentation, plan_layers, segment, segment_cos_only,
};
pub use params::{
    DEFAULT_DPI, DEFAULT_NUM_LAYERS, MIN_AUTO_BLOCK_SIZE, MIN_BLOCKS_ACROSS,
    REFERENCE_BLOCK_SIZE, SegmentParams, resolve_block_size,
};

pub use mrcseg_ccc::{CccParams, SignatureSet};
pub use mrcseg_cos::CosWeights;
