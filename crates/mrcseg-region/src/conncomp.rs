//! Connected component analysis
//!
//! Components are found by scanning the mask in raster order. Each newly
//! found foreground pixel is the top-left pixel of an unvisited
//! component: its outer border is traced to get the bounding box, then a
//! scan-line fill copies the component into its own local mask and
//! clears it from the working copy of the source.
//!
//! Components smaller than [`MIN_COMPONENT_AREA`] are treated as noise:
//! [`extract_components`] erases them from the mask and extracts again,
//! so its output never contains them.

use crate::ccbord::{self, BoundaryCrossing};
use crate::error::RegionResult;
use crate::seedfill::{self, Span};
use log::trace;
use mrcseg_core::{Bitmap, Box};

/// Components with fewer set pixels than this are discarded as noise.
pub const MIN_COMPONENT_AREA: u32 = 6;

/// Connectivity type for component analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectivityType {
    /// 4-way connectivity (up, down, left, right)
    #[default]
    FourWay,
    /// 8-way connectivity (includes diagonals)
    EightWay,
}

/// A connected component of a binary mask
#[derive(Debug, Clone)]
pub struct Component {
    /// Extraction order index
    pub id: u32,
    /// Bounding box in image coordinates
    pub bounds: Box,
    /// Pixel mask local to `bounds`
    pub mask: Bitmap,
    /// Number of set pixels
    pub area: u32,
    /// Mean (x, y) of the set pixels
    pub centroid: (f64, f64),
    /// Number of 4-neighbor transitions to the complement
    pub boundary_length: u32,
}

impl Component {
    /// Check whether a global pixel belongs to this component.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.bounds.contains_point(x, y)
            && self.mask.get((x - self.bounds.x) as u32, (y - self.bounds.y) as u32)
    }

    /// All pixels in global coordinates, row-major.
    pub fn pixels(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (ox, oy) = (self.bounds.x, self.bounds.y);
        let w = self.mask.width() as usize;
        self.mask
            .data()
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(move |(i, _)| (ox + (i % w) as i32, oy + (i / w) as i32))
    }

    /// Boundary crossings in global coordinates, holes included.
    pub fn boundary_crossings(&self) -> Vec<BoundaryCrossing> {
        ccbord::boundary_crossings(&self.mask, (self.bounds.x, self.bounds.y))
    }

    /// Set (or clear) every pixel of this component in a full-size mask.
    pub fn paint(&self, target: &mut Bitmap, on: bool) {
        for (x, y) in self.pixels() {
            if x >= 0 && y >= 0 {
                target.set(x as u32, y as u32, on);
            }
        }
    }

    fn from_spans(id: u32, traced: Box, spans: &[Span]) -> RegionResult<Self> {
        // bounds are the union of the traced border and the filled spans
        let mut min_x = traced.x;
        let mut min_y = traced.y;
        let mut max_x = traced.right() - 1;
        let mut max_y = traced.bottom() - 1;
        for s in spans {
            min_x = min_x.min(s.x0 as i32);
            max_x = max_x.max(s.x1 as i32);
            min_y = min_y.min(s.y as i32);
            max_y = max_y.max(s.y as i32);
        }
        let bounds = Box::from_extremes(min_x, min_y, max_x, max_y);

        let mut mask = Bitmap::new(bounds.w as u32, bounds.h as u32)?;
        let mut area = 0u32;
        let mut sum_x = 0f64;
        let mut sum_y = 0f64;
        for s in spans {
            let ly = (s.y as i32 - bounds.y) as u32;
            for x in s.x0..=s.x1 {
                mask.set((x as i32 - bounds.x) as u32, ly, true);
                sum_x += x as f64;
            }
            let n = s.len();
            sum_y += s.y as f64 * n as f64;
            area += n;
        }
        let centroid = if area > 0 {
            (sum_x / area as f64, sum_y / area as f64)
        } else {
            (bounds.x as f64, bounds.y as f64)
        };
        let boundary_length = ccbord::boundary_length(&mask);

        Ok(Self {
            id,
            bounds,
            mask,
            area,
            centroid,
            boundary_length,
        })
    }
}

/// Find all connected components of a binary mask, in raster order of
/// their top-left pixels.
pub fn find_components(
    bm: &Bitmap,
    connectivity: ConnectivityType,
) -> RegionResult<Vec<Component>> {
    let mut work = bm.clone();
    let mut components = Vec::new();
    let width = work.width();

    for y in 0..work.height() {
        for x in 0..width {
            if !work.get(x, y) {
                continue;
            }
            let border = ccbord::trace_outer_border(&work, x, y, connectivity);
            let traced = ccbord::border_bounds(&border);
            let spans = seedfill::fill_spans(&mut work, x, y, connectivity)?;
            let id = components.len() as u32;
            components.push(Component::from_spans(id, traced, &spans)?);
        }
    }

    Ok(components)
}

/// Components and the cleaned mask they partition
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Components with area >= the minimum
    pub components: Vec<Component>,
    /// Input mask with the discarded components erased
    pub mask: Bitmap,
    /// Number of components erased
    pub discarded: usize,
}

/// Extract components, discarding those below `min_area`.
///
/// Small components are erased from a copy of the mask and extraction is
/// run once more on the cleaned mask, so the returned components exactly
/// partition the returned mask.
pub fn extract_components(
    bm: &Bitmap,
    connectivity: ConnectivityType,
    min_area: u32,
) -> RegionResult<Extraction> {
    let first = find_components(bm, connectivity)?;
    let small: Vec<&Component> = first.iter().filter(|c| c.area < min_area).collect();
    if small.is_empty() {
        return Ok(Extraction {
            components: first,
            mask: bm.clone(),
            discarded: 0,
        });
    }

    let mut cleaned = bm.clone();
    for c in &small {
        c.paint(&mut cleaned, false);
    }
    let discarded = small.len();
    trace!(
        "extract_components: discarded {} of {} components below {} px",
        discarded,
        first.len(),
        min_area
    );

    let components = find_components(&cleaned, connectivity)?;
    Ok(Extraction {
        components,
        mask: cleaned,
        discarded,
    })
}

/// Erase components below `min_area` in place; returns how many were erased.
pub fn remove_small_components(
    bm: &mut Bitmap,
    connectivity: ConnectivityType,
    min_area: u32,
) -> RegionResult<usize> {
    let comps = find_components(bm, connectivity)?;
    let mut removed = 0;
    for c in comps.iter().filter(|c| c.area < min_area) {
        c.paint(bm, false);
        removed += 1;
    }
    Ok(removed)
}

/// Find the background holes embedded in a component.
///
/// Background is taken with 8-connectivity (the dual of the 4-connected
/// foreground). Holes are returned in image coordinates.
pub fn find_holes(component: &Component) -> RegionResult<Vec<Component>> {
    let mut background = component.mask.clone();
    background.invert();
    seedfill::clear_border(&mut background, ConnectivityType::EightWay)?;
    if background.count_ones() == 0 {
        return Ok(Vec::new());
    }
    let mut holes = find_components(&background, ConnectivityType::EightWay)?;
    for h in holes.iter_mut() {
        h.bounds.x += component.bounds.x;
        h.bounds.y += component.bounds.y;
        h.centroid.0 += component.bounds.x as f64;
        h.centroid.1 += component.bounds.y as f64;
    }
    Ok(holes)
}
