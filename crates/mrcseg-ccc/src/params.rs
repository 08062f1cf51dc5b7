//! Component classification parameters

use crate::error::{CccError, CccResult};

// ============================================================================
// Default parameters
// ============================================================================

/// Default index of the text class in the signature set
pub const DEFAULT_TEXT_CLASS: usize = 1;

/// Default number of neighbor candidates per component
pub const DEFAULT_NEIGHBORS: usize = 6;

/// Default neighbor search radius as a fraction of the larger image side
pub const DEFAULT_SEARCH_FRACTION: f64 = 0.1;

/// Default minimum neighbor area relative to the querying component
pub const DEFAULT_MIN_NEIGHBOR_SIZE_RATIO: f64 = 0.25;

/// Default potential offset `a` in `b / (d^p + a)`
pub const DEFAULT_POTENTIAL_A: f64 = 0.1;

/// Default potential scale `b` in `b / (d^p + a)`
pub const DEFAULT_POTENTIAL_B: f64 = 1.0;

/// Default potential exponent `p` in `b / (d^p + a)`
pub const DEFAULT_POTENTIAL_P: f64 = 2.0;

/// Default cap on MAP refinement sweeps
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Default radius of the color sampling windows (1 = 3x3)
pub const DEFAULT_EDGE_WINDOW: u32 = 1;

/// Largest accepted sampling window radius
pub const MAX_EDGE_WINDOW: u32 = 16;

/// Default inverse covariance of the augmented feature vector
///
/// Order: mean edge depth, background spread, edge depth deviation,
/// background deviation, centroid x, centroid y.
pub const DEFAULT_FEATURE_INV_COV: [[f64; 6]; 6] = [
    [1.0 / 3600.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0 / 1600.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0 / 400.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0 / 400.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0 / 2500.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 0.0, 1.0 / 2500.0],
];

// ============================================================================
// Parameters
// ============================================================================

/// Parameters of one component classification pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CccParams {
    /// Index of the class whose components stay in the mask
    pub text_class: usize,
    /// Bias added to the text class log-likelihood (negative favors non-text)
    pub text_cost: f64,
    /// Neighbor candidates collected per component
    pub neighbors: usize,
    /// Search radius cap as a fraction of the larger image side
    pub search_fraction: f64,
    /// Candidates smaller than this fraction of the querying area are skipped
    pub min_neighbor_size_ratio: f64,
    /// Potential offset `a`
    pub potential_a: f64,
    /// Potential scale `b`
    pub potential_b: f64,
    /// Potential exponent `p`
    pub potential_p: f64,
    /// Maximum number of MAP refinement sweeps
    pub max_iterations: usize,
    /// Fixed inverse covariance for neighbor feature distances
    pub feature_inv_cov: [[f64; 6]; 6],
    /// Radius of the inner/outer color sampling windows
    pub edge_window: u32,
}

impl Default for CccParams {
    fn default() -> Self {
        Self {
            text_class: DEFAULT_TEXT_CLASS,
            text_cost: 0.0,
            neighbors: DEFAULT_NEIGHBORS,
            search_fraction: DEFAULT_SEARCH_FRACTION,
            min_neighbor_size_ratio: DEFAULT_MIN_NEIGHBOR_SIZE_RATIO,
            potential_a: DEFAULT_POTENTIAL_A,
            potential_b: DEFAULT_POTENTIAL_B,
            potential_p: DEFAULT_POTENTIAL_P,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            feature_inv_cov: DEFAULT_FEATURE_INV_COV,
            edge_window: DEFAULT_EDGE_WINDOW,
        }
    }
}

impl CccParams {
    /// Set the text class index
    pub fn with_text_class(mut self, text_class: usize) -> Self {
        self.text_class = text_class;
        self
    }

    /// Set the text class bias
    pub fn with_text_cost(mut self, text_cost: f64) -> Self {
        self.text_cost = text_cost;
        self
    }

    /// Set the number of neighbor candidates
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    /// Set the search radius fraction
    pub fn with_search_fraction(mut self, fraction: f64) -> Self {
        self.search_fraction = fraction;
        self
    }

    /// Set the minimum neighbor size ratio
    pub fn with_min_neighbor_size_ratio(mut self, ratio: f64) -> Self {
        self.min_neighbor_size_ratio = ratio;
        self
    }

    /// Set the pairwise potential `b / (d^p + a)`
    pub fn with_potential(mut self, a: f64, b: f64, p: f64) -> Self {
        self.potential_a = a;
        self.potential_b = b;
        self.potential_p = p;
        self
    }

    /// Set the MAP sweep cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the fixed feature inverse covariance
    pub fn with_feature_inv_cov(mut self, inv_cov: [[f64; 6]; 6]) -> Self {
        self.feature_inv_cov = inv_cov;
        self
    }

    /// Set the sampling window radius
    pub fn with_edge_window(mut self, radius: u32) -> Self {
        self.edge_window = radius;
        self
    }

    /// Pairwise potential between two components of different classes.
    #[inline]
    pub fn potential(&self, feature_distance: f64) -> f64 {
        self.potential_b / (feature_distance.powf(self.potential_p) + self.potential_a)
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`CccError::InvalidParameters`] for out-of-range values.
    pub fn validate(&self) -> CccResult<()> {
        if !self.text_cost.is_finite() {
            return Err(CccError::InvalidParameters(format!(
                "text_cost must be finite, got {}",
                self.text_cost
            )));
        }
        if self.neighbors == 0 {
            return Err(CccError::InvalidParameters(
                "neighbors must be at least 1".to_string(),
            ));
        }
        if !(self.search_fraction > 0.0 && self.search_fraction <= 1.0) {
            return Err(CccError::InvalidParameters(format!(
                "search_fraction must be in (0, 1], got {}",
                self.search_fraction
            )));
        }
        if !(self.min_neighbor_size_ratio >= 0.0 && self.min_neighbor_size_ratio.is_finite()) {
            return Err(CccError::InvalidParameters(format!(
                "min_neighbor_size_ratio must be non-negative, got {}",
                self.min_neighbor_size_ratio
            )));
        }
        if !(self.potential_a > 0.0 && self.potential_a.is_finite())
            || !(self.potential_b >= 0.0 && self.potential_b.is_finite())
            || !(self.potential_p > 0.0 && self.potential_p.is_finite())
        {
            return Err(CccError::InvalidParameters(format!(
                "potential needs a > 0, b >= 0, p > 0, got a={} b={} p={}",
                self.potential_a, self.potential_b, self.potential_p
            )));
        }
        if !(1..=MAX_EDGE_WINDOW).contains(&self.edge_window) {
            return Err(CccError::InvalidParameters(format!(
                "edge_window must be in 1..={}, got {}",
                MAX_EDGE_WINDOW, self.edge_window
            )));
        }
        let m = &self.feature_inv_cov;
        for i in 0..6 {
            for j in 0..6 {
                if !m[i][j].is_finite() || (m[i][j] - m[j][i]).abs() > 1e-12 * (1.0 + m[i][j].abs())
                {
                    return Err(CccError::InvalidParameters(
                        "feature_inv_cov must be finite and symmetric".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = CccParams::default();
        assert_eq!(p.text_class, 1);
        assert_eq!(p.neighbors, 6);
        assert_eq!(p.max_iterations, 100);
        assert!(p.validate().is_ok());
        // b / (0 + a)
        assert!((p.potential(0.0) - 10.0).abs() < 1e-12);
        assert!((p.potential(1.0) - 1.0 / 1.1).abs() < 1e-12);
        assert!(p.potential(3.0) < p.potential(2.0));
    }

    #[test]
    fn test_builders_and_validation() {
        let p = CccParams::default()
            .with_neighbors(3)
            .with_potential(0.5, 2.0, 1.0)
            .with_text_cost(-1.5);
        assert_eq!(p.neighbors, 3);
        assert!((p.potential(1.5) - 1.0).abs() < 1e-12);
        assert!(p.validate().is_ok());

        assert!(CccParams::default().with_neighbors(0).validate().is_err());
        assert!(CccParams::default().with_search_fraction(0.0).validate().is_err());
        assert!(CccParams::default().with_potential(0.0, 1.0, 2.0).validate().is_err());

        assert!(CccParams::default().with_edge_window(0).validate().is_err());
        assert!(CccParams::default().with_edge_window(16).validate().is_ok());
        assert!(CccParams::default().with_edge_window(17).validate().is_err());
        assert!(
            CccParams::default()
                .with_edge_window(u32::MAX)
                .validate()
                .is_err()
        );

        let mut cov = DEFAULT_FEATURE_INV_COV;
        cov[0][1] = 0.5;
        assert!(CccParams::default().with_feature_inv_cov(cov).validate().is_err());
    }
}
