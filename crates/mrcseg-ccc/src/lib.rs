//! mrcseg-ccc - Connected-component classification
//!
//! This crate decides which connected components of a binary mask are
//! text:
//!
//! - **Edge features** - Color contrast and background statistics sampled
//!   across every boundary crossing of a component
//! - **Signature sets** - Trained Gaussian mixtures loaded from a tagged
//!   text format, with a bundled two-class default
//! - **Neighbor graph** - Nearby components of comparable size linked by a
//!   normalized Mahalanobis feature distance
//! - **MAP refinement** - Iterated conditional modes trading the mixture
//!   likelihood against agreement with similar neighbors
//!
//! # Examples
//!
//! ```
//! use mrcseg_ccc::{CccParams, SignatureSet, classify_components};
//! use mrcseg_core::{Bitmap, Box, Pix, PixelDepth};
//!
//! let mut pm = Pix::new(48, 32, 3, PixelDepth::Bit8).unwrap().to_mut();
//! pm.fill_rect_rgb(0, 0, 48, 32, (245, 245, 245)).unwrap();
//! pm.fill_rect_rgb(10, 8, 5, 16, (10, 10, 10)).unwrap();
//! let pix: Pix = pm.into();
//!
//! let mut mask = Bitmap::new(48, 32).unwrap();
//! mask.fill_rect(&Box::new_unchecked(10, 8, 5, 16), true);
//!
//! let set = SignatureSet::default_model().unwrap();
//! let out = classify_components(&pix, &mask, &set, &CccParams::default()).unwrap();
//! assert_eq!(out.components.len(), 1);
//! ```

pub mod classify;
pub mod error;
pub mod feature;
pub mod graph;
pub mod params;
pub mod pipeline;
pub mod refine;
pub mod signature;

pub use error::{CccError, CccResult};

pub use params::{
    CccParams, DEFAULT_EDGE_WINDOW, DEFAULT_FEATURE_INV_COV, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MIN_NEIGHBOR_SIZE_RATIO, DEFAULT_NEIGHBORS, DEFAULT_POTENTIAL_A, DEFAULT_POTENTIAL_B,
    DEFAULT_POTENTIAL_P, DEFAULT_SEARCH_FRACTION, DEFAULT_TEXT_CLASS, MAX_EDGE_WINDOW,
};

pub use classify::{Classification, argmax, classify};
pub use feature::{EdgeFeature, FEATURE_BANDS, component_feature, compute_features};
pub use graph::{NeighborEdge, NeighborGraph, build_graph, feature_metric, mahalanobis, total_energy};
pub use pipeline::{CccOutput, classify_components};
pub use refine::{CccClassification, refine_map};
pub use signature::{SignatureClass, SignatureSet, Subclass};
