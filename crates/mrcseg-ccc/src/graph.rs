//! Component neighbor graph
//!
//! Components are placed by centroid on an occupancy grid the size of the
//! image. Each component then searches square rings of growing radius
//! around its cell for up to `K` neighbors, skipping candidates much
//! smaller than itself. Every pair found becomes an undirected edge stored
//! in both adjacency lists.
//!
//! Each edge carries the Euclidean centroid distance and a feature
//! distance: the Mahalanobis distance between the two augmented feature
//! vectors under a fixed inverse covariance, divided by the mean of the
//! two endpoints' average neighbor distances.

use crate::error::{CccError, CccResult};
use crate::feature::EdgeFeature;
use crate::params::{CccParams, DEFAULT_FEATURE_INV_COV};
use log::{debug, warn};
use mrcseg_core::Grid;
use mrcseg_region::Component;
use nalgebra::{Matrix6, Vector6};
use rayon::prelude::*;

/// Occupancy grid marker for a free cell
const EMPTY: u32 = u32::MAX;

/// Guard for normalizing by a vanishing mean distance
const NORMALIZE_EPS: f64 = 1e-9;

/// Rings tried when a centroid cell is already taken
const PLACEMENT_RINGS: i32 = 2;

/// One directed half of an undirected neighbor edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborEdge {
    /// Index of the neighboring component
    pub target: usize,
    /// Euclidean distance between the centroids
    pub distance: f64,
    /// Normalized Mahalanobis feature distance
    pub feature_distance: f64,
}

/// Symmetric neighbor graph over components
#[derive(Debug, Clone, Default)]
pub struct NeighborGraph {
    adjacency: Vec<Vec<NeighborEdge>>,
    /// Components that found no free occupancy cell
    pub unplaced: usize,
}

impl NeighborGraph {
    /// Number of components
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Whether the graph has no components
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Edges of component `i`
    pub fn neighbors(&self, i: usize) -> &[NeighborEdge] {
        &self.adjacency[i]
    }

    /// Number of undirected edges
    pub fn num_edges(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Check that every edge has a reverse twin with equal distances.
    pub fn is_symmetric(&self) -> bool {
        self.adjacency.iter().enumerate().all(|(i, edges)| {
            edges.iter().all(|e| {
                self.adjacency[e.target].iter().any(|r| {
                    r.target == i
                        && r.distance == e.distance
                        && r.feature_distance == e.feature_distance
                })
            })
        })
    }

    /// Build a graph from explicit undirected edges `(a, b, distance,
    /// feature_distance)`; duplicates are ignored.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64, f64)]) -> Self {
        let mut graph = Self {
            adjacency: vec![Vec::new(); n],
            unplaced: 0,
        };
        for &(a, b, distance, feature_distance) in edges {
            graph.insert(a, b, distance);
            for (from, to) in [(a, b), (b, a)] {
                if let Some(e) = graph.adjacency[from].iter_mut().find(|e| e.target == to) {
                    e.feature_distance = feature_distance;
                }
            }
        }
        graph
    }

    fn insert(&mut self, a: usize, b: usize, distance: f64) {
        if a == b || self.adjacency[a].iter().any(|e| e.target == b) {
            return;
        }
        self.adjacency[a].push(NeighborEdge {
            target: b,
            distance,
            feature_distance: 0.0,
        });
        self.adjacency[b].push(NeighborEdge {
            target: a,
            distance,
            feature_distance: 0.0,
        });
    }
}

// ============================================================================
// Occupancy grid
// ============================================================================

/// Cells at Chebyshev distance exactly `r > 0`, in raster order.
fn ring(r: i32) -> impl Iterator<Item = (i32, i32)> {
    (-r..=r).flat_map(move |dy| {
        let step = if dy.abs() == r { 1 } else { 2 * r as usize };
        (-r..=r).step_by(step).map(move |dx| (dx, dy))
    })
}

fn cell_of(centroid: (f64, f64), width: u32, height: u32) -> (i32, i32) {
    let x = centroid.0.round().clamp(0.0, (width - 1) as f64) as i32;
    let y = centroid.1.round().clamp(0.0, (height - 1) as f64) as i32;
    (x, y)
}

fn occupant(occ: &Grid<u32>, x: i32, y: i32) -> Option<u32> {
    if x < 0 || y < 0 {
        return None;
    }
    occ.get(y as usize, x as usize).copied()
}

/// Place every component on the grid; returns each component's search
/// position and the number that found no free cell.
fn place(components: &[Component], occ: &mut Grid<u32>) -> (Vec<(i32, i32)>, usize) {
    let (width, height) = (occ.cols() as u32, occ.rows() as u32);
    let mut positions = Vec::with_capacity(components.len());
    let mut unplaced = 0;
    for (i, comp) in components.iter().enumerate() {
        let (x, y) = cell_of(comp.centroid, width, height);
        let free = std::iter::once((0, 0))
            .chain((1..=PLACEMENT_RINGS).flat_map(ring))
            .map(|(dx, dy)| (x + dx, y + dy))
            .find(|&(cx, cy)| occupant(occ, cx, cy) == Some(EMPTY));
        match free {
            Some((cx, cy)) => {
                if let Some(cell) = occ.get_mut(cy as usize, cx as usize) {
                    *cell = i as u32;
                }
                positions.push((cx, cy));
            }
            None => {
                warn!(
                    "ccc graph: component {} at ({}, {}) has no free occupancy cell",
                    i, x, y
                );
                unplaced += 1;
                positions.push((x, y));
            }
        }
    }
    (positions, unplaced)
}

fn centroid_distance(a: &Component, b: &Component) -> f64 {
    let dx = a.centroid.0 - b.centroid.0;
    let dy = a.centroid.1 - b.centroid.1;
    (dx * dx + dy * dy).sqrt()
}

/// Up to `params.neighbors` candidates around component `i`, nearest ring
/// first, by centroid distance within a ring.
fn search(
    i: usize,
    pos: (i32, i32),
    components: &[Component],
    occ: &Grid<u32>,
    max_radius: i32,
    params: &CccParams,
) -> Vec<usize> {
    let k = params.neighbors;
    let min_area = params.min_neighbor_size_ratio * components[i].area as f64;
    let mut found = Vec::with_capacity(k);
    for r in 1..=max_radius {
        let mut hits: Vec<(f64, usize)> = ring(r)
            .filter_map(|(dx, dy)| occupant(occ, pos.0 + dx, pos.1 + dy))
            .filter(|&j| j != EMPTY && j as usize != i)
            .map(|j| j as usize)
            .filter(|&j| components[j].area as f64 >= min_area)
            .map(|j| (centroid_distance(&components[i], &components[j]), j))
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let room = k - found.len();
        found.extend(hits.into_iter().take(room).map(|(_, j)| j));
        if found.len() >= k {
            break;
        }
    }
    found
}

// ============================================================================
// Feature distances
// ============================================================================

/// The inverse covariance of `params`, or the default one if it is not
/// positive definite.
pub fn feature_metric(params: &CccParams) -> Matrix6<f64> {
    let m = Matrix6::from_fn(|i, j| params.feature_inv_cov[i][j]);
    if m.cholesky().is_some() {
        return m;
    }
    warn!("ccc graph: feature inverse covariance is not positive definite, using the default");
    Matrix6::from_fn(|i, j| DEFAULT_FEATURE_INV_COV[i][j])
}

/// Mahalanobis distance between two augmented feature vectors.
pub fn mahalanobis(metric: &Matrix6<f64>, a: &[f64; 6], b: &[f64; 6]) -> f64 {
    let d = Vector6::from_fn(|i, _| a[i] - b[i]);
    d.dot(&(metric * d)).max(0.0).sqrt()
}

/// Build the neighbor graph of a component list.
///
/// # Errors
///
/// Returns [`CccError::InvalidParameters`] if the feature list does not
/// match the components or the image is empty.
pub fn build_graph(
    components: &[Component],
    features: &[EdgeFeature],
    width: u32,
    height: u32,
    params: &CccParams,
) -> CccResult<NeighborGraph> {
    if components.len() != features.len() {
        return Err(CccError::InvalidParameters(format!(
            "{} components but {} features",
            components.len(),
            features.len()
        )));
    }
    if width == 0 || height == 0 {
        return Err(CccError::InvalidParameters(format!(
            "empty image {}x{}",
            width, height
        )));
    }
    params.validate()?;

    let n = components.len();
    let mut occ = Grid::new(height as usize, width as usize, EMPTY);
    let (positions, unplaced) = place(components, &mut occ);

    let max_radius = ((params.search_fraction * width.max(height) as f64).ceil() as i32).max(1);
    let candidates: Vec<Vec<usize>> = (0..n)
        .into_par_iter()
        .map(|i| search(i, positions[i], components, &occ, max_radius, params))
        .collect();

    let mut graph = NeighborGraph {
        adjacency: vec![Vec::new(); n],
        unplaced,
    };
    for (i, cands) in candidates.iter().enumerate() {
        for &j in cands {
            graph.insert(i, j, centroid_distance(&components[i], &components[j]));
        }
    }

    // raw Mahalanobis distances, then per-endpoint normalization
    let metric = feature_metric(params);
    let augmented: Vec<[f64; 6]> = features
        .iter()
        .zip(components)
        .map(|(f, c)| f.augmented(c.centroid))
        .collect();
    graph
        .adjacency
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, edges)| {
            for e in edges.iter_mut() {
                e.feature_distance = mahalanobis(&metric, &augmented[i], &augmented[e.target]);
            }
        });
    let means: Vec<f64> = graph
        .adjacency
        .iter()
        .map(|edges| {
            if edges.is_empty() {
                0.0
            } else {
                edges.iter().map(|e| e.feature_distance).sum::<f64>() / edges.len() as f64
            }
        })
        .collect();
    graph
        .adjacency
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, edges)| {
            for e in edges.iter_mut() {
                let scale = (0.5 * (means[i] + means[e.target])).max(NORMALIZE_EPS);
                e.feature_distance /= scale;
            }
        });

    debug!(
        "ccc graph: {} components, {} edges, {} unplaced, search radius {}",
        n,
        graph.num_edges(),
        unplaced,
        max_radius
    );
    Ok(graph)
}

/// Energy of a class assignment: data terms plus one pairwise potential
/// per undirected edge whose endpoints disagree.
pub fn total_energy(
    graph: &NeighborGraph,
    log_likelihoods: &[Vec<f64>],
    classes: &[usize],
    params: &CccParams,
) -> f64 {
    let data: f64 = classes
        .iter()
        .zip(log_likelihoods)
        .map(|(&c, ll)| -ll[c])
        .sum();
    let pair: f64 = graph
        .adjacency
        .iter()
        .enumerate()
        .flat_map(|(i, edges)| edges.iter().map(move |e| (i, e)))
        .filter(|(i, e)| e.target > *i && classes[*i] != classes[e.target])
        .map(|(_, e)| params.potential(e.feature_distance))
        .sum();
    data + pair
}
