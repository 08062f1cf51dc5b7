//! mrcseg-region - Connected components of binary masks
//!
//! This crate provides the region analysis used by the component
//! classification pass:
//!
//! - **Connected component extraction** - Raster-order discovery with
//!   outer-border tracing and scan-line fill
//! - **Noise removal** - Discarding components below a minimum area
//! - **Hole detection** - Background regions enclosed by a component
//! - **Boundary crossings** - Inside/outside pixel pairs along every border
//!
//! # Examples
//!
//! ```
//! use mrcseg_core::Bitmap;
//! use mrcseg_region::{ConnectivityType, find_components};
//!
//! let mut bm = Bitmap::new(100, 100).unwrap();
//! bm.set(10, 10, true);
//! bm.set(11, 10, true);
//! bm.set(50, 50, true);
//!
//! let components = find_components(&bm, ConnectivityType::FourWay).unwrap();
//! assert_eq!(components.len(), 2);
//! assert_eq!(components[0].area, 2);
//! ```
//!
//! ## Flood fill
//!
//! ```
//! use mrcseg_core::Bitmap;
//! use mrcseg_region::{ConnectivityType, floodfill};
//!
//! let mut bm = Bitmap::new(10, 10).unwrap();
//! let count = floodfill(&mut bm, 5, 5, true, ConnectivityType::FourWay).unwrap();
//! assert_eq!(count, 100);
//! ```

pub mod ccbord;
pub mod conncomp;
pub mod error;
pub mod seedfill;

pub use mrcseg_core;

pub use error::{RegionError, RegionResult};

pub use conncomp::{
    Component, ConnectivityType, Extraction, MIN_COMPONENT_AREA, extract_components,
    find_components, find_holes, remove_small_components,
};

pub use seedfill::{Span, clear_border, fill_spans, floodfill};

pub use ccbord::{
    BorderPoint, BoundaryCrossing, Direction, border_bounds, boundary_crossings,
    boundary_length, trace_outer_border,
};
