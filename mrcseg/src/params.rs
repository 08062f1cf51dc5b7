//! Multiscale segmentation parameters

use crate::error::{SegmentError, SegmentResult};
use mrcseg_ccc::CccParams;
use mrcseg_cos::{CosWeights, DEFAULT_MAX_ITERATIONS};

// ============================================================================
// Default parameters
// ============================================================================

/// Default scan resolution
pub const DEFAULT_DPI: u32 = 300;

/// Default number of multiscale layers
pub const DEFAULT_NUM_LAYERS: usize = 3;

/// Block size used at [`DEFAULT_DPI`]
pub const REFERENCE_BLOCK_SIZE: u32 = 32;

/// Smallest block size picked from a resolution
pub const MIN_AUTO_BLOCK_SIZE: u32 = 8;

/// A layer needs at least this many blocks across the shorter image side
pub const MIN_BLOCKS_ACROSS: usize = 5;

/// Finest block size for a scan resolution.
///
/// Scales [`REFERENCE_BLOCK_SIZE`] linearly with `dpi`, rounded to a
/// multiple of 4 and clamped below at [`MIN_AUTO_BLOCK_SIZE`].
pub fn resolve_block_size(dpi: u32) -> u32 {
    let scaled = dpi as f64 * REFERENCE_BLOCK_SIZE as f64 / DEFAULT_DPI as f64;
    let quads = (scaled / 4.0).round() as u32;
    (4 * quads).max(MIN_AUTO_BLOCK_SIZE)
}

/// Parameters of a multiscale segmentation run
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentParams {
    /// Finest block size; derived from `dpi` when `None`
    pub block_size: Option<u32>,
    /// Scan resolution, used only when `block_size` is `None`
    pub dpi: u32,
    /// Maximum number of layers, coarsest first
    pub num_layers: usize,
    /// Dynamic-programming sweep cap per layer
    pub dp_iterations: usize,
    /// Cost weights per layer, coarsest first; the last entry is reused
    pub layer_weights: Vec<CosWeights>,
    /// Text class bias, applied on the finest layer only
    pub text_cost: f64,
    /// Component classification parameters (their `text_cost` is ignored)
    pub ccc: CccParams,
    /// Whether layers run component classification after block segmentation
    pub ccc_enabled: bool,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            block_size: None,
            dpi: DEFAULT_DPI,
            num_layers: DEFAULT_NUM_LAYERS,
            dp_iterations: DEFAULT_MAX_ITERATIONS,
            layer_weights: vec![CosWeights::default()],
            text_cost: 0.0,
            ccc: CccParams::default(),
            ccc_enabled: true,
        }
    }
}

impl SegmentParams {
    /// Set an explicit finest block size
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = Some(block_size);
        self
    }

    /// Set the scan resolution
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the number of layers
    pub fn with_num_layers(mut self, num_layers: usize) -> Self {
        self.num_layers = num_layers;
        self
    }

    /// Set the per-layer sweep cap
    pub fn with_dp_iterations(mut self, dp_iterations: usize) -> Self {
        self.dp_iterations = dp_iterations;
        self
    }

    /// Set the per-layer weights
    pub fn with_layer_weights(mut self, weights: Vec<CosWeights>) -> Self {
        self.layer_weights = weights;
        self
    }

    /// Set the finest-layer text bias
    pub fn with_text_cost(mut self, text_cost: f64) -> Self {
        self.text_cost = text_cost;
        self
    }

    /// Set the component classification parameters
    pub fn with_ccc(mut self, ccc: CccParams) -> Self {
        self.ccc = ccc;
        self
    }

    /// Enable or disable component classification
    pub fn with_ccc_enabled(mut self, enabled: bool) -> Self {
        self.ccc_enabled = enabled;
        self
    }

    /// The finest block size, explicit or derived from `dpi`.
    ///
    /// # Errors
    ///
    /// Returns [`SegmentError::InvalidBlockSize`] for an explicit size
    /// that is not a positive multiple of 4.
    pub fn finest_block_size(&self) -> SegmentResult<u32> {
        match self.block_size {
            Some(b) if b == 0 || b % 4 != 0 => Err(SegmentError::InvalidBlockSize(b)),
            Some(b) => Ok(b),
            None => Ok(resolve_block_size(self.dpi)),
        }
    }

    /// Weights of layer `index`, counted from the coarsest.
    pub fn weights_for_layer(&self, index: usize) -> CosWeights {
        self.layer_weights
            .get(index)
            .or(self.layer_weights.last())
            .copied()
            .unwrap_or_default()
    }

    /// Check parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid block size, zero layers or sweeps,
    /// a non-finite text bias, or invalid classification parameters.
    pub fn validate(&self) -> SegmentResult<()> {
        self.finest_block_size()?;
        if self.num_layers == 0 {
            return Err(SegmentError::InvalidParameters(
                "num_layers must be at least 1".into(),
            ));
        }
        if self.dp_iterations == 0 {
            return Err(SegmentError::InvalidParameters(
                "dp_iterations must be at least 1".into(),
            ));
        }
        if !self.text_cost.is_finite() {
            return Err(SegmentError::InvalidParameters(format!(
                "text_cost must be finite, got {}",
                self.text_cost
            )));
        }
        if self.ccc_enabled {
            self.ccc.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_block_size() {
        assert_eq!(resolve_block_size(300), 32);
        assert_eq!(resolve_block_size(600), 64);
        assert_eq!(resolve_block_size(150), 16);
        assert_eq!(resolve_block_size(200), 20);
        assert_eq!(resolve_block_size(72), 8);
        assert_eq!(resolve_block_size(0), 8);
    }

    #[test]
    fn test_finest_block_size() {
        let p = SegmentParams::default();
        assert_eq!(p.finest_block_size().unwrap(), 32);
        assert_eq!(p.clone().with_dpi(600).finest_block_size().unwrap(), 64);
        assert_eq!(p.clone().with_block_size(24).finest_block_size().unwrap(), 24);
        assert!(matches!(
            p.clone().with_block_size(30).finest_block_size(),
            Err(SegmentError::InvalidBlockSize(30))
        ));
        assert!(p.with_block_size(0).validate().is_err());
    }

    #[test]
    fn test_weights_for_layer() {
        let a = CosWeights::new(1.0, 2.0, 3.0, 4.0);
        let b = CosWeights::new(5.0, 6.0, 7.0, 8.0);
        let p = SegmentParams::default().with_layer_weights(vec![a, b]);
        assert_eq!(p.weights_for_layer(0), a);
        assert_eq!(p.weights_for_layer(1), b);
        assert_eq!(p.weights_for_layer(5), b);
        let empty = SegmentParams::default().with_layer_weights(Vec::new());
        assert_eq!(empty.weights_for_layer(0), CosWeights::default());
    }

    #[test]
    fn test_validate() {
        assert!(SegmentParams::default().validate().is_ok());
        assert!(SegmentParams::default().with_num_layers(0).validate().is_err());
        assert!(SegmentParams::default().with_dp_iterations(0).validate().is_err());
        assert!(
            SegmentParams::default()
                .with_text_cost(f64::NAN)
                .validate()
                .is_err()
        );
    }
}
