//! Synthetic page fixtures
//!
//! Deterministic in-memory test pages. Pages with a meaningful answer
//! come with a ground-truth mask of the pixels a segmenter should mark as
//! foreground.

use crate::error::{TestError, TestResult};
use mrcseg_core::{Bitmap, Box, Pix, PixMut, PixelDepth};

/// White paper
pub const WHITE: (u8, u8, u8) = (255, 255, 255);
/// Black ink
pub const BLACK: (u8, u8, u8) = (0, 0, 0);
/// Slightly yellowed paper used by [`text_page`]
pub const PAPER: (u8, u8, u8) = (236, 228, 206);
/// Dark blue-black ink used by [`text_page`]
pub const INK: (u8, u8, u8) = (28, 30, 44);

/// A synthetic page and the mask a segmenter should recover from it
#[derive(Debug, Clone)]
pub struct Page {
    /// 3-channel 8-bit page image
    pub pix: Pix,
    /// Foreground ground truth
    pub truth: Bitmap,
}

fn blank(width: u32, height: u32, rgb: (u8, u8, u8)) -> TestResult<PixMut> {
    let mut pm = Pix::new(width, height, 3, PixelDepth::Bit8)?.to_mut();
    pm.fill_rect_rgb(0, 0, width, height, rgb)?;
    Ok(pm)
}

fn paint(pm: &mut PixMut, truth: &mut Bitmap, rect: Box, rgb: (u8, u8, u8)) -> TestResult<()> {
    pm.fill_rect_rgb(rect.x as u32, rect.y as u32, rect.w as u32, rect.h as u32, rgb)?;
    truth.fill_rect(&rect, true);
    Ok(())
}

/// A page of one color.
pub fn solid_rgb(width: u32, height: u32, rgb: (u8, u8, u8)) -> TestResult<Pix> {
    Ok(blank(width, height, rgb)?.into())
}

/// A white page with one solid black square of side `side` at `(x, y)`.
pub fn square_on_white(width: u32, height: u32, x: u32, y: u32, side: u32) -> TestResult<Page> {
    if x.saturating_add(side) > width || y.saturating_add(side) > height {
        return Err(TestError::Fixture {
            name: "square_on_white".into(),
            message: format!("square {side}px at ({x}, {y}) exceeds {width}x{height}"),
        });
    }
    let mut pm = blank(width, height, WHITE)?;
    let mut truth = Bitmap::new(width, height)?;
    let rect = Box::new_unchecked(x as i32, y as i32, side as i32, side as i32);
    paint(&mut pm, &mut truth, rect, BLACK)?;
    Ok(Page {
        pix: pm.into(),
        truth,
    })
}

/// Stroke rectangles of a glyph-like shape inside a `size`-pixel cell.
fn glyph_strokes(kind: usize, size: i32) -> Vec<Box> {
    let s = (size / 6).max(2);
    let r = Box::new_unchecked;
    match kind % 4 {
        // l
        0 => vec![r(size / 2 - s / 2, 0, s, size)],
        // o
        1 => vec![
            r(0, size / 3, size, s),
            r(0, size - s, size, s),
            r(0, size / 3, s, size - size / 3),
            r(size - s, size / 3, s, size - size / 3),
        ],
        // T
        2 => vec![r(0, 0, size, s), r(size / 2 - s / 2, 0, s, size)],
        // n
        _ => vec![
            r(0, size / 3, size, s),
            r(0, size / 3, s, size - size / 3),
            r(size - s, size / 3, s, size - size / 3),
        ],
    }
}

/// Lines of glyph-like strokes on tinted paper.
///
/// Glyphs are `glyph`-pixel squares laid out with a one-third glyph gap
/// and a one-glyph margin; every fifth slot is a word space.
pub fn text_page(width: u32, height: u32, glyph: u32) -> TestResult<Page> {
    let g = glyph as i32;
    if g < 6 || 3 * glyph > width.min(height) {
        return Err(TestError::Fixture {
            name: "text_page".into(),
            message: format!("glyph size {glyph} does not fit {width}x{height}"),
        });
    }
    let mut pm = blank(width, height, PAPER)?;
    let mut truth = Bitmap::new(width, height)?;

    let pitch = g + g / 3;
    let line_pitch = 2 * g;
    let mut slot = 0usize;
    let mut y = g;
    while y + g <= height as i32 - g {
        let mut x = g;
        while x + g <= width as i32 - g {
            if slot % 5 != 4 {
                for stroke in glyph_strokes(slot * 7 / 5, g) {
                    let rect = Box::new_unchecked(x + stroke.x, y + stroke.y, stroke.w, stroke.h);
                    paint(&mut pm, &mut truth, rect, INK)?;
                }
            }
            slot += 1;
            x += pitch;
        }
        y += line_pitch;
    }

    Ok(Page {
        pix: pm.into(),
        truth,
    })
}

/// Small linear congruential generator so fixtures need no RNG crate.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }
}

/// A white page with `count` isolated 1- or 2-pixel black specks and one
/// solid bar across the middle. Only the bar is in the ground truth.
pub fn noise_specks(width: u32, height: u32, count: usize, seed: u64) -> TestResult<Page> {
    if width < 16 || height < 16 {
        return Err(TestError::Fixture {
            name: "noise_specks".into(),
            message: format!("page {width}x{height} too small"),
        });
    }
    let mut pm = blank(width, height, WHITE)?;
    let mut truth = Bitmap::new(width, height)?;
    let bar = Box::new_unchecked(
        width as i32 / 4,
        height as i32 / 2 - 2,
        width as i32 / 2,
        4,
    );
    paint(&mut pm, &mut truth, bar, BLACK)?;

    let mut rng = Lcg(seed);
    let mut placed = 0;
    // Specks stay two pixels clear of the bar and of each other
    let mut taken = Bitmap::new(width, height)?;
    taken.fill_rect(
        &Box::new_unchecked(bar.x - 3, bar.y - 3, bar.w + 6, bar.h + 6),
        true,
    );
    let mut attempts = 0;
    while placed < count && attempts < count * 50 {
        attempts += 1;
        let x = rng.next() % (width - 2);
        let y = rng.next() % (height - 2);
        let w = 1 + rng.next() % 2;
        let area = Box::new_unchecked(x as i32 - 2, y as i32 - 2, w as i32 + 4, 5);
        if taken.count_in_rect(&area) > 0 {
            continue;
        }
        taken.fill_rect(&area, true);
        pm.fill_rect_rgb(x, y, w, 1, BLACK)?;
        placed += 1;
    }

    Ok(Page {
        pix: pm.into(),
        truth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_on_white() {
        let page = square_on_white(64, 48, 10, 8, 20).unwrap();
        assert_eq!(page.pix.get_rgb(10, 8), Some(BLACK));
        assert_eq!(page.pix.get_rgb(30, 8), Some(WHITE));
        assert_eq!(page.truth.count_ones(), 400);
        assert!(square_on_white(64, 48, 50, 8, 20).is_err());
    }

    #[test]
    fn test_text_page_truth_matches_ink() {
        let page = text_page(160, 120, 12).unwrap();
        assert!(page.truth.count_ones() > 0);
        for y in 0..120 {
            for x in 0..160 {
                let ink = page.pix.get_rgb(x, y) == Some(INK);
                assert_eq!(ink, page.truth.get(x, y));
            }
        }
    }

    #[test]
    fn test_noise_specks_deterministic() {
        let a = noise_specks(100, 80, 30, 7).unwrap();
        let b = noise_specks(100, 80, 30, 7).unwrap();
        assert_eq!(a.pix.data(), b.pix.data());
        assert_eq!(a.truth.count_ones(), 50 * 4);
    }
}
