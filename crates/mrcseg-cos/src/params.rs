//! Block labels and solver parameters

use crate::error::{CosError, CosResult};

// ============================================================================
// Default parameters
// ============================================================================

/// Default block size in pixels
pub const DEFAULT_BLOCK_SIZE: u32 = 32;

/// Default cap on dynamic-programming sweeps
pub const DEFAULT_MAX_ITERATIONS: usize = 20;

/// Default horizontal mismatch weight
pub const DEFAULT_LAMBDA1: f64 = 24.0;

/// Default vertical mismatch weight
pub const DEFAULT_LAMBDA2: f64 = 24.0;

/// Default foreground-fraction weight
pub const DEFAULT_LAMBDA3: f64 = 8.0;

/// Default coarser-layer mismatch weight
pub const DEFAULT_LAMBDA4: f64 = 15.0;

// ============================================================================
// Block labels
// ============================================================================

/// The four discrete labelings a block can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BlockLabel {
    /// The block's thresholded binary as computed
    #[default]
    Original = 0,
    /// Bitwise complement of the thresholded binary
    Reversed = 1,
    /// Every pixel background
    AllBackground = 2,
    /// Every pixel foreground
    AllForeground = 3,
}

impl BlockLabel {
    /// All labels in index order; ties are broken toward lower indices.
    pub const ALL: [BlockLabel; 4] = [
        BlockLabel::Original,
        BlockLabel::Reversed,
        BlockLabel::AllBackground,
        BlockLabel::AllForeground,
    ];

    /// Index of this label in [`BlockLabel::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Label from an index in `0..4`
    #[inline]
    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    /// Whether the label reads the block's thresholded binary.
    #[inline]
    pub fn uses_threshold(self) -> bool {
        matches!(self, BlockLabel::Original | BlockLabel::Reversed)
    }

    /// Output value of a pixel whose thresholded value is `original`.
    #[inline]
    pub fn apply(self, original: bool) -> bool {
        match self {
            BlockLabel::Original => original,
            BlockLabel::Reversed => !original,
            BlockLabel::AllBackground => false,
            BlockLabel::AllForeground => true,
        }
    }

    /// Foreground pixels in a region of `area` pixels, `original` of which
    /// are set in the thresholded binary.
    #[inline]
    pub fn foreground_in(self, original: u32, area: u32) -> u32 {
        match self {
            BlockLabel::Original => original,
            BlockLabel::Reversed => area - original,
            BlockLabel::AllBackground => 0,
            BlockLabel::AllForeground => area,
        }
    }
}

// ============================================================================
// Weights and parameters
// ============================================================================

/// Weights of the block cost terms
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CosWeights {
    /// Horizontal neighbor mismatch
    pub lambda1: f64,
    /// Vertical neighbor mismatch
    pub lambda2: f64,
    /// Foreground fraction
    pub lambda3: f64,
    /// Mismatch against the coarser layer's mask
    pub lambda4: f64,
}

impl Default for CosWeights {
    fn default() -> Self {
        Self {
            lambda1: DEFAULT_LAMBDA1,
            lambda2: DEFAULT_LAMBDA2,
            lambda3: DEFAULT_LAMBDA3,
            lambda4: DEFAULT_LAMBDA4,
        }
    }
}

impl CosWeights {
    /// Create weights from the four terms.
    pub fn new(lambda1: f64, lambda2: f64, lambda3: f64, lambda4: f64) -> Self {
        Self {
            lambda1,
            lambda2,
            lambda3,
            lambda4,
        }
    }

    fn validate(&self) -> CosResult<()> {
        let all = [self.lambda1, self.lambda2, self.lambda3, self.lambda4];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CosError::InvalidParameters(format!(
                "weights must be finite and non-negative, got {:?}",
                all
            )));
        }
        Ok(())
    }
}

/// Parameters of one block segmentation pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CosParams {
    /// Block side in pixels; a positive multiple of 4
    pub block_size: u32,
    /// Maximum number of full-grid sweeps
    pub max_iterations: usize,
    /// Cost weights
    pub weights: CosWeights,
}

impl Default for CosParams {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            weights: CosWeights::default(),
        }
    }
}

impl CosParams {
    /// Create parameters with custom block size
    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Create parameters with custom sweep cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Create parameters with custom weights
    pub fn with_weights(mut self, weights: CosWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CosError::InvalidBlockSize`] if the block size is not a
    /// positive multiple of 4, and [`CosError::InvalidParameters`] for a
    /// zero sweep cap or negative weights.
    pub fn validate(&self) -> CosResult<()> {
        if self.block_size == 0 || self.block_size % 4 != 0 {
            return Err(CosError::InvalidBlockSize(self.block_size));
        }
        if self.max_iterations == 0 {
            return Err(CosError::InvalidParameters(
                "max_iterations must be at least 1".into(),
            ));
        }
        self.weights.validate()
    }
}
