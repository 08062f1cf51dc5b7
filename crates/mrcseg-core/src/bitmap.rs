//! Bitmap - Binary foreground/background masks
//!
//! A `Bitmap` stores one byte per pixel holding 0 (background) or 1
//! (foreground) in a flat row-major buffer. It is the working mask type
//! of the segmentation passes; [`Bitmap::to_pix`] produces the
//! single-channel 8-bit mask returned to callers.

use crate::box_::Box;
use crate::error::{Error, Result};
use crate::pix::{Pix, PixelDepth};
use image::GrayImage;

/// Binary mask with one byte per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Bitmap {
    /// Create an all-background bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimension`] if width or height is 0.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize],
        })
    }

    /// Wrap a row-major byte buffer. Any non-zero byte becomes 1.
    pub fn from_vec(width: u32, height: u32, mut data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimension { width, height });
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: data.len(),
            });
        }
        for v in data.iter_mut() {
            *v = (*v != 0) as u8;
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Build a bitmap from a single-channel `Pix`; non-zero samples are set.
    pub fn from_pix(pix: &Pix) -> Result<Self> {
        if pix.spp() != 1 {
            return Err(Error::UnsupportedChannels {
                expected: 1,
                actual: pix.spp(),
            });
        }
        let mut bm = Self::new(pix.width(), pix.height())?;
        for y in 0..pix.height() {
            for x in 0..pix.width() {
                if pix.get_pixel(x, y).unwrap_or(0) != 0 {
                    bm.set(x, y, true);
                }
            }
        }
        Ok(bm)
    }

    /// Width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major 0/1 bytes
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable row-major 0/1 bytes; callers must only store 0 or 1.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Get the pixel at (x, y); out-of-bounds reads as background.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.data[self.offset(x, y)] != 0
    }

    /// Signed-coordinate read; anything outside the bitmap is background.
    #[inline]
    pub fn get_signed(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && self.get(x as u32, y as u32)
    }

    /// Set the pixel at (x, y); out-of-bounds writes are ignored.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, on: bool) {
        if x < self.width && y < self.height {
            let i = self.offset(x, y);
            self.data[i] = on as u8;
        }
    }

    /// Number of foreground pixels
    pub fn count_ones(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    /// Number of foreground pixels inside a rectangle (clipped).
    pub fn count_in_rect(&self, rect: &Box) -> usize {
        let bounds = Box::new_unchecked(0, 0, self.width as i32, self.height as i32);
        let Some(r) = bounds.intersect(rect) else {
            return 0;
        };
        let mut n = 0;
        for y in r.y..r.bottom() {
            let start = self.offset(r.x as u32, y as u32);
            n += self.data[start..start + r.w as usize]
                .iter()
                .filter(|&&v| v != 0)
                .count();
        }
        n
    }

    /// Flip every pixel.
    pub fn invert(&mut self) {
        for v in self.data.iter_mut() {
            *v ^= 1;
        }
    }

    /// Set every pixel in a rectangle (clipped) to `on`.
    pub fn fill_rect(&mut self, rect: &Box, on: bool) {
        let bounds = Box::new_unchecked(0, 0, self.width as i32, self.height as i32);
        if let Some(r) = bounds.intersect(rect) {
            for y in r.y..r.bottom() {
                let start = self.offset(r.x as u32, y as u32);
                self.data[start..start + r.w as usize].fill(on as u8);
            }
        }
    }

    fn check_same_size(&self, other: &Bitmap) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::DimensionMismatch {
                expected: (self.width, self.height),
                actual: (other.width, other.height),
            });
        }
        Ok(())
    }

    /// In-place intersection with another bitmap of the same size.
    pub fn and_assign(&mut self, other: &Bitmap) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a &= *b;
        }
        Ok(())
    }

    /// In-place union with another bitmap of the same size.
    pub fn or_assign(&mut self, other: &Bitmap) -> Result<()> {
        self.check_same_size(other)?;
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a |= *b;
        }
        Ok(())
    }

    /// Number of pixels that differ from `other`.
    pub fn count_differences(&self, other: &Bitmap) -> Result<usize> {
        self.check_same_size(other)?;
        Ok(self
            .data
            .iter()
            .zip(&other.data)
            .filter(|(a, b)| a != b)
            .count())
    }

    /// Copy out a rectangle; pixels outside the bitmap read as background.
    pub fn crop(&self, rect: &Box) -> Result<Bitmap> {
        if rect.is_empty() {
            return Err(Error::InvalidDimension {
                width: rect.w.max(0) as u32,
                height: rect.h.max(0) as u32,
            });
        }
        let mut out = Bitmap::new(rect.w as u32, rect.h as u32)?;
        for y in 0..rect.h {
            for x in 0..rect.w {
                if self.get_signed(rect.x + x, rect.y + y) {
                    out.set(x as u32, y as u32, true);
                }
            }
        }
        Ok(out)
    }

    /// Copy `src` into this bitmap with its top-left corner at `(x, y)`.
    /// Pixels falling outside are dropped.
    pub fn paste(&mut self, src: &Bitmap, x: i32, y: i32) {
        for sy in 0..src.height as i32 {
            let ty = y + sy;
            if ty < 0 || ty >= self.height as i32 {
                continue;
            }
            for sx in 0..src.width as i32 {
                let tx = x + sx;
                if tx >= 0 && tx < self.width as i32 {
                    self.set(tx as u32, ty as u32, src.get(sx as u32, sy as u32));
                }
            }
        }
    }

    /// Single-channel 8-bit mask with values 0 (background) and 1.
    pub fn to_pix(&self) -> Result<Pix> {
        Pix::from_raw(
            self.width,
            self.height,
            1,
            PixelDepth::Bit8,
            self.data.clone(),
        )
    }

    /// Grayscale rendering for viewing: foreground black, background white.
    pub fn to_gray_image(&self) -> GrayImage {
        let buf = self
            .data
            .iter()
            .map(|&v| if v != 0 { 0 } else { 255 })
            .collect();
        // dimensions match the buffer by construction
        GrayImage::from_raw(self.width, self.height, buf)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmap_basic() {
        let mut bm = Bitmap::new(4, 3).unwrap();
        bm.set(1, 2, true);
        bm.set(9, 9, true);
        assert!(bm.get(1, 2));
        assert!(!bm.get(9, 9));
        assert!(!bm.get_signed(-1, 0));
        assert_eq!(bm.count_ones(), 1);
        bm.invert();
        assert_eq!(bm.count_ones(), 11);
    }

    #[test]
    fn test_from_vec_normalizes() {
        let bm = Bitmap::from_vec(2, 2, vec![0, 255, 3, 0]).unwrap();
        assert_eq!(bm.data(), &[0, 1, 1, 0]);
        assert!(Bitmap::from_vec(2, 2, vec![0; 3]).is_err());
        assert!(Bitmap::new(0, 2).is_err());
    }

    #[test]
    fn test_rect_ops() {
        let mut bm = Bitmap::new(10, 10).unwrap();
        bm.fill_rect(&Box::new_unchecked(8, 8, 5, 5), true);
        assert_eq!(bm.count_ones(), 4);
        assert_eq!(bm.count_in_rect(&Box::new_unchecked(9, 0, 5, 10)), 2);
        let c = bm.crop(&Box::new_unchecked(7, 7, 4, 4)).unwrap();
        assert_eq!(c.count_ones(), 4);
        assert!(c.get(1, 1) && !c.get(0, 0));

        let mut dst = Bitmap::new(4, 4).unwrap();
        dst.paste(&c, 2, 2);
        assert_eq!(dst.count_ones(), 1);
        assert!(dst.get(3, 3));
    }

    #[test]
    fn test_boolean_ops() {
        let mut a = Bitmap::from_vec(2, 1, vec![1, 0]).unwrap();
        let b = Bitmap::from_vec(2, 1, vec![1, 1]).unwrap();
        assert_eq!(a.count_differences(&b).unwrap(), 1);
        a.or_assign(&b).unwrap();
        assert_eq!(a, b);
        let c = Bitmap::new(3, 1).unwrap();
        assert!(a.and_assign(&c).is_err());
    }

    #[test]
    fn test_pix_roundtrip() {
        let bm = Bitmap::from_vec(2, 2, vec![1, 0, 0, 1]).unwrap();
        let pix = bm.to_pix().unwrap();
        assert_eq!(pix.spp(), 1);
        assert_eq!(pix.get_pixel(1, 1), Some(1));
        assert_eq!(Bitmap::from_pix(&pix).unwrap(), bm);
        let gray = bm.to_gray_image();
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
        assert_eq!(gray.get_pixel(1, 0).0, [255]);
    }
}
