//! Seed fill operations
//!
//! Scan-line flood fill driven by an explicit array-backed seed stack.
//! Each pop extends a seed left and right into a horizontal span, then
//! pushes one seed per run of matching pixels in the rows above and
//! below. With 8-connectivity the neighbor rows are scanned one pixel
//! beyond each end of the span.

use crate::conncomp::ConnectivityType;
use crate::error::{RegionError, RegionResult};
use mrcseg_core::Bitmap;

/// A horizontal run of filled pixels, `x0..=x1` on row `y`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// Row
    pub y: u32,
    /// First column (inclusive)
    pub x0: u32,
    /// Last column (inclusive)
    pub x1: u32,
}

impl Span {
    /// Number of pixels in the span
    #[inline]
    pub fn len(&self) -> u32 {
        self.x1 - self.x0 + 1
    }

    /// Spans are never empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Flip the region of pixels equal to the seed's value that is connected
/// to `(seed_x, seed_y)`, returning the spans that were flipped.
///
/// This is the primitive behind both component extraction (clearing
/// foreground as it is consumed) and [`floodfill`].
pub fn fill_spans(
    bm: &mut Bitmap,
    seed_x: u32,
    seed_y: u32,
    connectivity: ConnectivityType,
) -> RegionResult<Vec<Span>> {
    let width = bm.width();
    let height = bm.height();
    if seed_x >= width || seed_y >= height {
        return Err(RegionError::InvalidSeed {
            x: seed_x,
            y: seed_y,
        });
    }

    let target = bm.get(seed_x, seed_y);
    let mut spans = Vec::new();
    let mut stack = vec![(seed_x, seed_y)];

    while let Some((x, y)) = stack.pop() {
        if bm.get(x, y) != target {
            continue;
        }

        let mut x0 = x;
        while x0 > 0 && bm.get(x0 - 1, y) == target {
            x0 -= 1;
        }
        let mut x1 = x;
        while x1 + 1 < width && bm.get(x1 + 1, y) == target {
            x1 += 1;
        }
        for xx in x0..=x1 {
            bm.set(xx, y, !target);
        }
        spans.push(Span { y, x0, x1 });

        let (lo, hi) = match connectivity {
            ConnectivityType::FourWay => (x0, x1),
            ConnectivityType::EightWay => (x0.saturating_sub(1), (x1 + 1).min(width - 1)),
        };
        let mut push_runs = |row: u32, stack: &mut Vec<(u32, u32)>| {
            let mut in_run = false;
            for xx in lo..=hi {
                let hit = bm.get(xx, row) == target;
                if hit && !in_run {
                    stack.push((xx, row));
                }
                in_run = hit;
            }
        };
        if y > 0 {
            push_runs(y - 1, &mut stack);
        }
        if y + 1 < height {
            push_runs(y + 1, &mut stack);
        }
    }

    Ok(spans)
}

/// Flood fill in a binary image starting from a seed point
///
/// Sets the connected region containing the seed to `value`. Returns the
/// number of pixels that changed.
///
/// # Errors
///
/// Returns an error if the seed position is out of bounds.
pub fn floodfill(
    bm: &mut Bitmap,
    seed_x: u32,
    seed_y: u32,
    value: bool,
    connectivity: ConnectivityType,
) -> RegionResult<u32> {
    if seed_x >= bm.width() || seed_y >= bm.height() {
        return Err(RegionError::InvalidSeed {
            x: seed_x,
            y: seed_y,
        });
    }
    if bm.get(seed_x, seed_y) == value {
        return Ok(0);
    }
    let spans = fill_spans(bm, seed_x, seed_y, connectivity)?;
    Ok(spans.iter().map(Span::len).sum())
}

/// Clear every foreground region that touches the bitmap border.
///
/// Returns the number of pixels cleared.
pub fn clear_border(bm: &mut Bitmap, connectivity: ConnectivityType) -> RegionResult<u32> {
    let w = bm.width();
    let h = bm.height();
    let mut cleared = 0;
    for x in 0..w {
        for y in [0, h - 1] {
            if bm.get(x, y) {
                cleared += floodfill(bm, x, y, false, connectivity)?;
            }
        }
    }
    for y in 0..h {
        for x in [0, w - 1] {
            if bm.get(x, y) {
                cleared += floodfill(bm, x, y, false, connectivity)?;
            }
        }
    }
    Ok(cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bitmap_from(rows: &[&str]) -> Bitmap {
        let h = rows.len() as u32;
        let w = rows[0].len() as u32;
        let data = rows
            .iter()
            .flat_map(|r| r.bytes().map(|b| (b == b'#') as u8))
            .collect();
        Bitmap::from_vec(w, h, data).unwrap()
    }

    #[test]
    fn test_floodfill_whole_image() {
        let mut bm = Bitmap::new(10, 10).unwrap();
        let n = floodfill(&mut bm, 5, 5, true, ConnectivityType::FourWay).unwrap();
        assert_eq!(n, 100);
        assert_eq!(bm.count_ones(), 100);
        assert_eq!(
            floodfill(&mut bm, 5, 5, true, ConnectivityType::FourWay).unwrap(),
            0
        );
    }

    #[test]
    fn test_fill_spans_connectivity() {
        let rows = ["#...", ".#..", "..#.", "...#"];
        let mut bm = bitmap_from(&rows);
        let four = fill_spans(&mut bm, 0, 0, ConnectivityType::FourWay).unwrap();
        assert_eq!(four.len(), 1);
        assert_eq!(bm.count_ones(), 3);

        let mut bm = bitmap_from(&rows);
        let eight = fill_spans(&mut bm, 0, 0, ConnectivityType::EightWay).unwrap();
        assert_eq!(eight.len(), 4);
        assert_eq!(bm.count_ones(), 0);
    }

    #[test]
    fn test_fill_spans_concave() {
        let mut bm = bitmap_from(&[
            "#.#.#", //
            "#.#.#", //
            "#####",
        ]);
        let spans = fill_spans(&mut bm, 0, 0, ConnectivityType::FourWay).unwrap();
        let total: u32 = spans.iter().map(Span::len).sum();
        assert_eq!(total, 11);
        assert_eq!(bm.count_ones(), 0);
    }

    #[test]
    fn test_invalid_seed() {
        let mut bm = Bitmap::new(3, 3).unwrap();
        assert!(matches!(
            floodfill(&mut bm, 3, 0, true, ConnectivityType::FourWay),
            Err(RegionError::InvalidSeed { x: 3, y: 0 })
        ));
    }

    #[test]
    fn test_clear_border() {
        let mut bm = bitmap_from(&[
            "##...", //
            ".....", //
            "..#..", //
            ".....",
        ]);
        assert_eq!(clear_border(&mut bm, ConnectivityType::FourWay).unwrap(), 2);
        assert_eq!(bm.count_ones(), 1);
    }
}
