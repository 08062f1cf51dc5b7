//! Interop with the `image` crate
//!
//! Decoding is out of scope for the engine; callers that decode with the
//! `image` crate hand the buffer over here. Only `Rgb8` buffers are
//! accepted. Other layouts are rejected rather than converted, since
//! color handling belongs upstream.

use super::{Pix, PixelDepth};
use crate::error::{Error, Result};
use image::{DynamicImage, RgbImage};

impl Pix {
    /// Build a 3-channel 8-bit `Pix` from an `image::RgbImage`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] for an empty buffer.
    pub fn from_rgb_image(img: &RgbImage) -> Result<Self> {
        Pix::from_raw(
            img.width(),
            img.height(),
            3,
            PixelDepth::Bit8,
            img.as_raw().clone(),
        )
    }

    /// Build a `Pix` from a decoded `DynamicImage`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedChannels`] for gray or alpha layouts and
    /// [`Error::UnsupportedDepth`] for 16-bit or float layouts.
    pub fn from_dynamic_image(img: &DynamicImage) -> Result<Self> {
        match img {
            DynamicImage::ImageRgb8(rgb) => Self::from_rgb_image(rgb),
            DynamicImage::ImageLuma8(_) => Err(Error::UnsupportedChannels {
                expected: 3,
                actual: 1,
            }),
            DynamicImage::ImageLumaA8(_) => Err(Error::UnsupportedChannels {
                expected: 3,
                actual: 2,
            }),
            DynamicImage::ImageRgba8(_) => Err(Error::UnsupportedChannels {
                expected: 3,
                actual: 4,
            }),
            DynamicImage::ImageRgb16(_) => Err(Error::UnsupportedDepth {
                expected: "8 bpp",
                actual: 16,
            }),
            DynamicImage::ImageRgb32F(_) => Err(Error::UnsupportedDepth {
                expected: "8 bpp",
                actual: 32,
            }),
            other => Err(Error::UnsupportedLayout(format!("{:?}", other.color()))),
        }
    }

    /// Copy a 3-channel 8-bit `Pix` into an `image::RgbImage`.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        self.ensure_rgb8()?;
        RgbImage::from_raw(self.width(), self.height(), self.data().to_vec()).ok_or(
            Error::BufferLength {
                expected: self.width() as usize * self.height() as usize * 3,
                actual: self.data().len(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Rgb};

    #[test]
    fn test_from_rgb_image() {
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(1, 1, Rgb([7, 8, 9]));
        let pix = Pix::from_rgb_image(&img).unwrap();
        assert_eq!(pix.get_rgb(1, 1), Some((7, 8, 9)));
        let back = pix.to_rgb_image().unwrap();
        assert_eq!(back.get_pixel(1, 1), &Rgb([7, 8, 9]));
    }

    #[test]
    fn test_dynamic_image_rejects_gray() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
        assert!(matches!(
            Pix::from_dynamic_image(&img),
            Err(Error::UnsupportedChannels { actual: 1, .. })
        ));
    }

    #[test]
    fn test_dynamic_image_rejects_empty() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(matches!(
            Pix::from_dynamic_image(&img),
            Err(Error::InvalidDimension { .. })
        ));
    }
}
