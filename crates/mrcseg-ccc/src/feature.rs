//! Boundary edge features
//!
//! Every 4-neighbor transition from a component pixel to the outside is
//! sampled twice: a small window one step further inside the component
//! and one step further outside. The mean colors of the two windows give
//!
//! - `edge_depth = |inner - outer|`, the color contrast of the edge
//! - `background = |outer|`, the brightness of what surrounds it
//!
//! and a component's feature is the mean and spread of those samples.
//! Crossings into holes smaller than [`MIN_COMPONENT_AREA`] are skipped:
//! such holes are usually noise inside a stroke rather than background.

use crate::error::{CccError, CccResult};
use crate::params::MAX_EDGE_WINDOW;
use mrcseg_core::{Pix, color};
use mrcseg_region::{BorderPoint, BoundaryCrossing, Component, MIN_COMPONENT_AREA, find_holes};
use rayon::prelude::*;

/// Number of bands in an [`EdgeFeature`]
pub const FEATURE_BANDS: usize = 4;

/// Lower background percentile of the spread statistic
pub const BACKGROUND_LOW_PERCENTILE: f64 = 0.02;

/// Upper background percentile of the spread statistic
pub const BACKGROUND_HIGH_PERCENTILE: f64 = 0.98;

/// Boundary statistics of one component
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeFeature {
    /// Mean color contrast across the boundary
    pub mean_edge_depth: f64,
    /// Spread between the 2nd and 98th percentile of background magnitude
    pub background_spread: f64,
    /// Standard deviation of the edge contrast
    pub edge_depth_std: f64,
    /// Standard deviation of the background magnitude
    pub background_std: f64,
    /// Boundary crossings that contributed
    pub samples: usize,
}

impl EdgeFeature {
    /// Feature bands in model order.
    pub fn to_array(&self) -> [f64; FEATURE_BANDS] {
        [
            self.mean_edge_depth,
            self.background_spread,
            self.edge_depth_std,
            self.background_std,
        ]
    }

    /// Feature bands followed by the centroid, for neighbor distances.
    pub fn augmented(&self, centroid: (f64, f64)) -> [f64; 6] {
        let [a, b, c, d] = self.to_array();
        [a, b, c, d, centroid.0, centroid.1]
    }
}

// ============================================================================
// Sampling
// ============================================================================

fn rgb_at(pix: &Pix, x: i32, y: i32) -> Option<[f64; 3]> {
    if x < 0 || y < 0 {
        return None;
    }
    pix.get_rgb(x as u32, y as u32)
        .map(|(r, g, b)| [r as f64, g as f64, b as f64])
}

/// Mean color of the accepted in-image pixels of a square window.
fn window_mean(
    pix: &Pix,
    center: BorderPoint,
    radius: i32,
    accept: impl Fn(i32, i32) -> bool,
) -> Option<[f64; 3]> {
    let mut sum = [0.0; 3];
    let mut n = 0usize;
    for y in center.y - radius..=center.y + radius {
        for x in center.x - radius..=center.x + radius {
            if !accept(x, y) {
                continue;
            }
            if let Some(c) = rgb_at(pix, x, y) {
                sum[0] += c[0];
                sum[1] += c[1];
                sum[2] += c[2];
                n += 1;
            }
        }
    }
    (n > 0).then(|| {
        let n = n as f64;
        [sum[0] / n, sum[1] / n, sum[2] / n]
    })
}

/// Inner and outer mean colors at one crossing, or `None` when the
/// outside pixel lies off the image.
fn sample_crossing(
    pix: &Pix,
    comp: &Component,
    crossing: &BoundaryCrossing,
    radius: i32,
) -> Option<([f64; 3], [f64; 3])> {
    let inside = BorderPoint::new(crossing.x, crossing.y);
    let outside = crossing.outside();
    let outer_pixel = rgb_at(pix, outside.x, outside.y)?;
    let inner_pixel = rgb_at(pix, inside.x, inside.y)?;

    let (dx, dy) = (crossing.dir.dx(), crossing.dir.dy());
    let inner_center = BorderPoint::new(inside.x - radius * dx, inside.y - radius * dy);
    let outer_center = BorderPoint::new(outside.x + radius * dx, outside.y + radius * dy);

    let inner = window_mean(pix, inner_center, radius, |x, y| comp.contains(x, y))
        .unwrap_or(inner_pixel);
    let outer = window_mean(pix, outer_center, radius, |x, y| !comp.contains(x, y))
        .unwrap_or(outer_pixel);
    Some((inner, outer))
}

// ============================================================================
// Aggregation
// ============================================================================

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.max(0.0).sqrt())
}

/// Value at quantile `q` of `values`, by nearest rank. Reorders `values`.
fn percentile(values: &mut [f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let idx = ((values.len() - 1) as f64 * q).round() as usize;
    let (_, v, _) = values.select_nth_unstable_by(idx, |a, b| a.total_cmp(b));
    *v
}

/// Edge feature of one component.
///
/// Components with no usable crossings get an all-zero feature.
///
/// # Errors
///
/// Returns an error if `radius` is outside `1..=MAX_EDGE_WINDOW` or hole
/// extraction fails.
pub fn component_feature(pix: &Pix, comp: &Component, radius: u32) -> CccResult<EdgeFeature> {
    if !(1..=MAX_EDGE_WINDOW).contains(&radius) {
        return Err(CccError::InvalidParameters(format!(
            "window radius must be in 1..={}, got {}",
            MAX_EDGE_WINDOW, radius
        )));
    }
    let radius = radius as i32;
    let small_holes: Vec<Component> = find_holes(comp)?
        .into_iter()
        .filter(|h| h.area < MIN_COMPONENT_AREA)
        .collect();

    let crossings = comp.boundary_crossings();
    let mut depths = Vec::with_capacity(crossings.len());
    let mut backgrounds = Vec::with_capacity(crossings.len());
    for crossing in &crossings {
        let out = crossing.outside();
        if small_holes.iter().any(|h| h.contains(out.x, out.y)) {
            continue;
        }
        if let Some((inner, outer)) = sample_crossing(pix, comp, crossing, radius) {
            depths.push(color::distance(inner, outer));
            backgrounds.push(color::magnitude(outer));
        }
    }

    let (mean_edge_depth, edge_depth_std) = mean_and_std(&depths);
    let (_, background_std) = mean_and_std(&backgrounds);
    let samples = depths.len();
    let high = percentile(&mut backgrounds, BACKGROUND_HIGH_PERCENTILE);
    let low = percentile(&mut backgrounds, BACKGROUND_LOW_PERCENTILE);

    Ok(EdgeFeature {
        mean_edge_depth,
        background_spread: high - low,
        edge_depth_std,
        background_std,
        samples,
    })
}

/// Edge features of all components, in component order.
///
/// # Errors
///
/// Returns an error if `pix` is not 3-channel 8-bit.
pub fn compute_features(
    pix: &Pix,
    components: &[Component],
    radius: u32,
) -> CccResult<Vec<EdgeFeature>> {
    pix.ensure_rgb8()?;
    components
        .par_iter()
        .map(|c| component_feature(pix, c, radius))
        .collect()
}
