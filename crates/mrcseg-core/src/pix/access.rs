//! Pixel access functions
//!
//! Bounds-checked getters and setters for individual samples. Hot loops
//! in the segmentation crates index [`Pix::data`] directly with
//! [`Pix::sample_index`] instead.

use super::{Pix, PixMut, PixelDepth};
use crate::error::{Error, Result};

#[inline]
fn read_sample(data: &[u8], offset: usize, depth: PixelDepth) -> u32 {
    match depth {
        PixelDepth::Bit1 | PixelDepth::Bit8 => data[offset] as u32,
        PixelDepth::Bit16 => ((data[offset] as u32) << 8) | data[offset + 1] as u32,
    }
}

#[inline]
fn write_sample(data: &mut [u8], offset: usize, depth: PixelDepth, val: u32) {
    match depth {
        PixelDepth::Bit1 => data[offset] = (val & 1) as u8,
        PixelDepth::Bit8 => data[offset] = (val & 0xff) as u8,
        PixelDepth::Bit16 => {
            data[offset] = ((val >> 8) & 0xff) as u8;
            data[offset + 1] = (val & 0xff) as u8;
        }
    }
}

impl Pix {
    /// Byte offset of sample `c` of pixel `(x, y)`.
    ///
    /// No bounds checking is done.
    #[inline]
    pub fn sample_index(&self, x: u32, y: u32, c: u32) -> usize {
        let bps = self.depth().bytes_per_sample();
        ((y as usize * self.width() as usize + x as usize) * self.spp() as usize + c as usize)
            * bps
    }

    /// Get sample `c` at (x, y).
    ///
    /// Returns `None` if coordinates or channel are out of bounds.
    pub fn get_sample(&self, x: u32, y: u32, c: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() || c >= self.spp() {
            return None;
        }
        Some(read_sample(
            self.data(),
            self.sample_index(x, y, c),
            self.depth(),
        ))
    }

    /// Get a single-channel pixel value at (x, y).
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.get_sample(x, y, 0)
    }

    /// Get RGB values at (x, y).
    ///
    /// Only valid for 3-channel 8-bit images.
    pub fn get_rgb(&self, x: u32, y: u32) -> Option<(u8, u8, u8)> {
        if self.spp() < 3 || self.depth() != PixelDepth::Bit8 {
            return None;
        }
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let i = self.sample_index(x, y, 0);
        let d = self.data();
        Some((d[i], d[i + 1], d[i + 2]))
    }
}

impl PixMut {
    #[inline]
    fn sample_index(&self, x: u32, y: u32, c: u32) -> usize {
        let bps = self.depth().bytes_per_sample();
        ((y as usize * self.width() as usize + x as usize) * self.spp() as usize + c as usize)
            * bps
    }

    /// Get sample `c` at (x, y).
    pub fn get_sample(&self, x: u32, y: u32, c: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() || c >= self.spp() {
            return None;
        }
        Some(read_sample(
            self.data(),
            self.sample_index(x, y, c),
            self.depth(),
        ))
    }

    /// Set sample `c` at (x, y).
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if coordinates or channel are
    /// out of bounds.
    pub fn set_sample(&mut self, x: u32, y: u32, c: u32, val: u32) -> Result<()> {
        if x >= self.width() || y >= self.height() || c >= self.spp() {
            let len = self.width() as usize * self.height() as usize;
            return Err(Error::IndexOutOfBounds {
                index: y as usize * self.width() as usize + x as usize,
                len,
            });
        }
        let offset = self.sample_index(x, y, c);
        let depth = self.depth();
        write_sample(self.data_mut(), offset, depth, val);
        Ok(())
    }

    /// Set a single-channel pixel value at (x, y).
    pub fn set_pixel(&mut self, x: u32, y: u32, val: u32) -> Result<()> {
        self.set_sample(x, y, 0, val)
    }

    /// Set an RGB pixel at (x, y).
    ///
    /// Only valid for 3-channel 8-bit images.
    pub fn set_rgb(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) -> Result<()> {
        if self.spp() < 3 || self.depth() != PixelDepth::Bit8 {
            return Err(Error::UnsupportedChannels {
                expected: 3,
                actual: self.spp(),
            });
        }
        self.set_sample(x, y, 0, r as u32)?;
        self.set_sample(x, y, 1, g as u32)?;
        self.set_sample(x, y, 2, b as u32)
    }

    /// Fill an axis-aligned rectangle with one RGB color.
    ///
    /// The rectangle is clipped to the image.
    pub fn fill_rect_rgb(
        &mut self,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        rgb: (u8, u8, u8),
    ) -> Result<()> {
        let x_end = x.saturating_add(w).min(self.width());
        let y_end = y.saturating_add(h).min(self.height());
        for yy in y..y_end {
            for xx in x..x_end {
                self.set_rgb(xx, yy, rgb.0, rgb.1, rgb.2)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_access() {
        let mut pm = Pix::new(4, 3, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.set_rgb(2, 1, 10, 20, 30).unwrap();
        let pix: Pix = pm.into();
        assert_eq!(pix.get_rgb(2, 1), Some((10, 20, 30)));
        assert_eq!(pix.get_sample(2, 1, 2), Some(30));
        assert_eq!(pix.get_rgb(4, 1), None);
    }

    #[test]
    fn test_16bit_samples() {
        let mut pm = Pix::new(2, 2, 1, PixelDepth::Bit16).unwrap().to_mut();
        pm.set_pixel(1, 1, 0xabcd).unwrap();
        assert_eq!(pm.get_sample(1, 1, 0), Some(0xabcd));
    }

    #[test]
    fn test_set_out_of_bounds() {
        let mut pm = Pix::new(2, 2, 1, PixelDepth::Bit8).unwrap().to_mut();
        assert!(pm.set_pixel(2, 0, 1).is_err());
        assert!(pm.set_sample(0, 0, 1, 1).is_err());
    }

    #[test]
    fn test_fill_rect_clipped() {
        let mut pm = Pix::new(5, 5, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(3, 3, 10, 10, (1, 2, 3)).unwrap();
        let pix: Pix = pm.into();
        assert_eq!(pix.get_rgb(4, 4), Some((1, 2, 3)));
        assert_eq!(pix.get_rgb(2, 2), Some((0, 0, 0)));
    }
}
