//! Coarse-to-fine multiscale driver
//!
//! Layers run from the coarsest fitting block size down to the finest,
//! halving each time. Every layer runs block segmentation, then component
//! classification on the resulting mask. The layer's final mask and block
//! labels are handed to the next finer layer, whose solver starts from the
//! upsampled labels and pays for disagreeing with the coarser mask. The
//! text bias is applied on the finest layer only.

use crate::error::{SegmentError, SegmentResult};
use crate::params::{MIN_BLOCKS_ACROSS, SegmentParams};
use log::debug;
use mrcseg_ccc::{SignatureSet, classify_components};
use mrcseg_core::{Bitmap, Grid, Pix};
use mrcseg_cos::{BlockLabel, CoarseLayer, CosParams, GridGeometry, segment_blocks};

/// What one layer did
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerReport {
    /// Block size of the layer
    pub block_size: u32,
    /// Block grid rows and columns
    pub grid: (usize, usize),
    /// Dynamic-programming sweeps
    pub dp_sweeps: usize,
    /// Whether the solver reached a fixed point
    pub dp_converged: bool,
    /// Final block grid cost
    pub dp_cost: f64,
    /// Components classified (0 when classification is off)
    pub components: usize,
    /// Components kept as text
    pub text_components: usize,
    /// MAP refinement sweeps
    pub map_sweeps: usize,
}

/// Per-layer diagnostics of a run, coarsest layer first
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SegmentReport {
    /// One entry per layer run
    pub layers: Vec<LayerReport>,
}

/// Final mask of a run with its diagnostics
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Foreground mask (1 = text/foreground)
    pub mask: Bitmap,
    /// Per-layer diagnostics
    pub report: SegmentReport,
}

impl Segmentation {
    /// The mask as a single-channel 8-bit image with values 0 and 1.
    ///
    /// # Errors
    ///
    /// Propagates image allocation errors.
    pub fn to_pix(&self) -> SegmentResult<Pix> {
        Ok(self.mask.to_pix()?)
    }
}

/// Block sizes of the layers to run, coarsest first.
///
/// Candidates are `block_size * 2^k` for `k` in `num_layers - 1 ..= 0`;
/// those with fewer than [`MIN_BLOCKS_ACROSS`] blocks across the shorter
/// image side are skipped. Layer counts beyond 32 add no candidates.
///
/// # Errors
///
/// Returns [`SegmentError::NoLayers`] if no candidate fits and
/// [`SegmentError::InvalidBlockSize`] for a bad `block_size`.
pub fn plan_layers(
    height: u32,
    width: u32,
    block_size: u32,
    num_layers: usize,
) -> SegmentResult<Vec<u32>> {
    if block_size == 0 || block_size % 4 != 0 {
        return Err(SegmentError::InvalidBlockSize(block_size));
    }
    if width == 0 || height == 0 {
        return Err(SegmentError::EmptyImage { width, height });
    }
    // block sizes past 2^31 overflow u32, so at most 32 candidates exist
    let candidates = num_layers.min(u32::BITS as usize) as u32;
    let mut sizes = Vec::new();
    for k in (0..candidates).rev() {
        let Some(size) = 1u32.checked_shl(k).and_then(|m| block_size.checked_mul(m)) else {
            continue;
        };
        let geometry = GridGeometry::new(width, height, size)?;
        if geometry.fits(MIN_BLOCKS_ACROSS) {
            sizes.push(size);
        }
    }
    if sizes.is_empty() {
        return Err(SegmentError::NoLayers {
            width,
            height,
            block_size,
        });
    }
    Ok(sizes)
}

/// State handed from one layer to the next finer one
struct Carry {
    mask: Bitmap,
    labels: Grid<BlockLabel>,
    geometry: GridGeometry,
}

fn run(
    pix: &Pix,
    params: &SegmentParams,
    set: Option<&SignatureSet>,
) -> SegmentResult<Segmentation> {
    if pix.width() == 0 || pix.height() == 0 {
        return Err(SegmentError::EmptyImage {
            width: pix.width(),
            height: pix.height(),
        });
    }
    pix.ensure_rgb8()?;
    params.validate()?;

    let finest = params.finest_block_size()?;
    let sizes = plan_layers(pix.height(), pix.width(), finest, params.num_layers)?;
    debug!(
        "segment: {}x{} image, layers {:?}",
        pix.width(),
        pix.height(),
        sizes
    );

    let mut report = SegmentReport::default();
    let mut carry: Option<Carry> = None;
    let last = sizes.len() - 1;

    for (index, &block_size) in sizes.iter().enumerate() {
        let cos_params = CosParams::default()
            .with_block_size(block_size)
            .with_max_iterations(params.dp_iterations)
            .with_weights(params.weights_for_layer(index));
        let coarse = carry.as_ref().map(|c| CoarseLayer {
            mask: &c.mask,
            labels: &c.labels,
            geometry: c.geometry,
        });
        let seg = segment_blocks(pix, &cos_params, coarse)?;

        let mut layer = LayerReport {
            block_size,
            grid: (seg.geometry.rows, seg.geometry.cols),
            dp_sweeps: seg.sweeps,
            dp_converged: seg.converged,
            dp_cost: seg.final_cost().unwrap_or(0.0),
            components: 0,
            text_components: 0,
            map_sweeps: 0,
        };

        let mask = match set {
            Some(set) => {
                let text_cost = if index == last { params.text_cost } else { 0.0 };
                let ccc_params = params.ccc.clone().with_text_cost(text_cost);
                let out = classify_components(pix, &seg.mask, set, &ccc_params)?;
                layer.components = out.components.len();
                layer.text_components = out.text_components(ccc_params.text_class);
                layer.map_sweeps = out.classification.sweeps;
                out.mask
            }
            None => seg.mask,
        };

        debug!(
            "segment: layer {} block {} grid {}x{} dp sweeps {} components {} text {} map sweeps {}",
            index,
            block_size,
            layer.grid.0,
            layer.grid.1,
            layer.dp_sweeps,
            layer.components,
            layer.text_components,
            layer.map_sweeps
        );
        report.layers.push(layer);
        carry = Some(Carry {
            mask,
            labels: seg.labels,
            geometry: seg.geometry,
        });
    }

    let mask = match carry {
        Some(c) => c.mask,
        None => Bitmap::new(pix.width(), pix.height())?,
    };
    Ok(Segmentation { mask, report })
}

/// Segment a 3-channel 8-bit page.
///
/// Component classification runs on every layer unless
/// [`SegmentParams::ccc_enabled`] is off.
///
/// # Errors
///
/// Returns an error for an empty or non-RGB image, invalid parameters,
/// an image too small for any layer, or a model that does not match the
/// edge features.
pub fn segment(
    pix: &Pix,
    params: &SegmentParams,
    set: &SignatureSet,
) -> SegmentResult<Segmentation> {
    let set = params.ccc_enabled.then_some(set);
    run(pix, params, set)
}

/// Segment with block dynamic programming only, skipping component
/// classification on every layer.
///
/// # Errors
///
/// Same as [`segment`], minus model errors.
pub fn segment_cos_only(pix: &Pix, params: &SegmentParams) -> SegmentResult<Segmentation> {
    run(pix, params, None)
}
