//! mrcseg Core - Basic data structures for document segmentation
//!
//! This crate provides the fundamental data structures used throughout
//! the mrcseg segmentation engine:
//!
//! - [`Pix`] / [`PixMut`] - Decoded image container (immutable / mutable)
//! - [`Bitmap`] - Binary foreground/background mask
//! - [`Box`] - Rectangle regions
//! - [`Grid`] - Flat two-dimensional arrays for block-level state
//!
//! Decoding and encoding image files is left to the caller; the
//! [`pix::convert`] module accepts buffers decoded with the `image` crate.

pub mod bitmap;
pub mod box_;
pub mod error;
pub mod grid;
pub mod pix;

pub use bitmap::Bitmap;
pub use box_::Box;
pub use error::{Error, Result};
pub use grid::Grid;
pub use pix::{Pix, PixMut, PixelDepth};

/// Color channel helpers for 3-channel 8-bit pixels.
pub mod color {
    /// Red channel index
    pub const RED: usize = 0;
    /// Green channel index
    pub const GREEN: usize = 1;
    /// Blue channel index
    pub const BLUE: usize = 2;

    /// Euclidean length of an RGB vector.
    #[inline]
    pub fn magnitude(c: [f64; 3]) -> f64 {
        (c[0] * c[0] + c[1] * c[1] + c[2] * c[2]).sqrt()
    }

    /// Euclidean distance between two RGB vectors.
    #[inline]
    pub fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
        magnitude([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_distance() {
            assert_eq!(distance([0.0, 0.0, 0.0], [3.0, 4.0, 0.0]), 5.0);
            assert_eq!(magnitude([0.0, 0.0, 2.0]), 2.0);
        }
    }
}
