//! PIX - The image container handed to the segmentation engine
//!
//! `Pix` holds a decoded raster: width, height, samples per pixel and
//! bit depth, with samples stored interleaved in row-major order. The
//! segmentation engine consumes 3-channel 8-bit images and produces
//! single-channel 8-bit masks; other layouts can be represented so that
//! they can be rejected with a precise error.
//!
//! # Pixel layout
//!
//! - Rows are stored top to bottom with no padding
//! - Samples of one pixel are adjacent (`RGBRGB...` for 3 channels)
//! - 8-bit samples use one byte, 16-bit samples two bytes (big endian)
//! - 1-bit images use one byte per pixel holding 0 or 1
//!
//! # Ownership model
//!
//! `Pix` uses `Arc` for cheap cloning (shared ownership).
//! To modify pixel data, convert to `PixMut` via [`Pix::try_into_mut`]
//! or [`Pix::to_mut`], then convert back with `Into<Pix>`.

mod access;
pub mod convert;

use crate::error::{Error, Result};
use std::sync::Arc;

/// Pixel depth (bits per sample)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelDepth {
    /// 1-bit binary image
    Bit1 = 1,
    /// 8-bit samples
    Bit8 = 8,
    /// 16-bit samples
    Bit16 = 16,
}

impl PixelDepth {
    /// Create `PixelDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDepth`] if `bits` is not 1, 8, or 16.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            1 => Ok(PixelDepth::Bit1),
            8 => Ok(PixelDepth::Bit8),
            16 => Ok(PixelDepth::Bit16),
            _ => Err(Error::InvalidDepth(bits)),
        }
    }

    /// Get the number of bits per sample.
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Number of bytes used to store one sample.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            PixelDepth::Bit1 | PixelDepth::Bit8 => 1,
            PixelDepth::Bit16 => 2,
        }
    }

    /// Get the maximum sample value representable at this depth.
    pub fn max_value(self) -> u32 {
        (1u32 << self.bits()) - 1
    }
}

/// Internal PIX data
#[derive(Debug)]
struct PixData {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Bits per sample
    depth: PixelDepth,
    /// Samples per pixel (1 for a mask, 3 for RGB)
    spp: u32,
    /// Interleaved sample bytes
    data: Vec<u8>,
}

impl PixData {
    fn bytes_per_pixel(&self) -> usize {
        self.spp as usize * self.depth.bytes_per_sample()
    }

    fn bytes_per_line(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }
}

/// PIX - Image container
///
/// # Examples
///
/// ```
/// use mrcseg_core::{Pix, PixelDepth};
///
/// let pix = Pix::new(640, 480, 3, PixelDepth::Bit8).unwrap();
/// assert_eq!(pix.width(), 640);
/// assert_eq!(pix.spp(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct Pix {
    inner: Arc<PixData>,
}

impl Pix {
    /// Create a new zero-filled PIX.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0, and
    /// [`Error::InvalidParameter`] if `spp` is outside `1..=4`.
    pub fn new(width: u32, height: u32, spp: u32, depth: PixelDepth) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        if spp == 0 || spp > 4 {
            return Err(Error::InvalidParameter(format!(
                "samples per pixel must be 1..=4, got {}",
                spp
            )));
        }
        let len = width as usize * height as usize * spp as usize * depth.bytes_per_sample();
        Ok(Pix {
            inner: Arc::new(PixData {
                width,
                height,
                depth,
                spp,
                data: vec![0u8; len],
            }),
        })
    }

    /// Wrap an existing interleaved buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferLength`] if `data` does not hold exactly
    /// `width * height * spp` samples of the given depth.
    pub fn from_raw(
        width: u32,
        height: u32,
        spp: u32,
        depth: PixelDepth,
        data: Vec<u8>,
    ) -> Result<Self> {
        let template = Self::new(width, height, spp, depth)?;
        let expected = template.inner.data.len();
        if data.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Pix {
            inner: Arc::new(PixData {
                width,
                height,
                depth,
                spp,
                data,
            }),
        })
    }

    /// Create a 3-channel 8-bit image from packed `RGBRGB...` bytes.
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        Self::from_raw(width, height, 3, PixelDepth::Bit8, data)
    }

    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the bits per sample.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get the samples per pixel.
    #[inline]
    pub fn spp(&self) -> u32 {
        self.inner.spp
    }

    /// Get the raw sample bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Get the bytes of one row.
    pub fn row_data(&self, y: u32) -> &[u8] {
        let bpl = self.inner.bytes_per_line();
        let start = y as usize * bpl;
        &self.inner.data[start..start + bpl]
    }

    /// Require a 3-channel 8-bit image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedChannels`] or [`Error::UnsupportedDepth`]
    /// for any other layout. No conversion is attempted.
    pub fn ensure_rgb8(&self) -> Result<()> {
        if self.spp() != 3 {
            return Err(Error::UnsupportedChannels {
                expected: 3,
                actual: self.spp(),
            });
        }
        if self.depth() != PixelDepth::Bit8 {
            return Err(Error::UnsupportedDepth {
                expected: "8 bpp",
                actual: self.depth().bits(),
            });
        }
        Ok(())
    }

    /// Try to take unique ownership of the data for mutation.
    ///
    /// Fails (returning `self`) when the data is shared.
    pub fn try_into_mut(self) -> std::result::Result<PixMut, Self> {
        match Arc::try_unwrap(self.inner) {
            Ok(inner) => Ok(PixMut { inner }),
            Err(inner) => Err(Pix { inner }),
        }
    }

    /// Create a mutable copy of this image.
    pub fn to_mut(&self) -> PixMut {
        PixMut {
            inner: PixData {
                width: self.inner.width,
                height: self.inner.height,
                depth: self.inner.depth,
                spp: self.inner.spp,
                data: self.inner.data.clone(),
            },
        }
    }
}

/// Mutable image, obtained from [`Pix::try_into_mut`] or [`Pix::to_mut`].
#[derive(Debug)]
pub struct PixMut {
    inner: PixData,
}

impl PixMut {
    /// Get the image width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    /// Get the image height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Get the bits per sample.
    #[inline]
    pub fn depth(&self) -> PixelDepth {
        self.inner.depth
    }

    /// Get the samples per pixel.
    #[inline]
    pub fn spp(&self) -> u32 {
        self.inner.spp
    }

    /// Get the raw sample bytes.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.inner.data
    }

    /// Get mutable access to the raw sample bytes.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.inner.data
    }
}

impl From<PixMut> for Pix {
    fn from(pix: PixMut) -> Self {
        Pix {
            inner: Arc::new(pix.inner),
        }
    }
}
