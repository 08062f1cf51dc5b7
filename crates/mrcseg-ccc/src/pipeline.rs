//! One component classification pass over a binary mask

use crate::classify::classify;
use crate::error::{CccError, CccResult};
use crate::feature::{EdgeFeature, compute_features};
use crate::graph::{NeighborGraph, build_graph};
use crate::params::CccParams;
use crate::refine::{CccClassification, refine_map};
use crate::signature::SignatureSet;
use log::debug;
use mrcseg_core::{Bitmap, Pix};
use mrcseg_region::{Component, ConnectivityType, MIN_COMPONENT_AREA, extract_components};

/// Everything a classification pass produced
#[derive(Debug, Clone)]
pub struct CccOutput {
    /// Input mask without small or non-text components
    pub mask: Bitmap,
    /// Components of the cleaned input mask
    pub components: Vec<Component>,
    /// Edge feature per component
    pub features: Vec<EdgeFeature>,
    /// Per-component, per-class log-likelihoods (text bias included)
    pub log_likelihoods: Vec<Vec<f64>>,
    /// Neighbor graph
    pub graph: NeighborGraph,
    /// Initial and refined classes
    pub classification: CccClassification,
    /// Components dropped for being below the minimum area
    pub discarded: usize,
}

impl CccOutput {
    /// Number of components kept as text
    pub fn text_components(&self, text_class: usize) -> usize {
        self.classification.count_class(text_class)
    }
}

/// Classify the connected components of `mask` and drop non-text ones.
///
/// # Errors
///
/// Returns an error if `pix` is not 3-channel 8-bit, the mask size differs
/// from the image, the model is not 4-band or lacks the text class, or
/// the parameters are invalid.
pub fn classify_components(
    pix: &Pix,
    mask: &Bitmap,
    set: &SignatureSet,
    params: &CccParams,
) -> CccResult<CccOutput> {
    params.validate()?;
    pix.ensure_rgb8()?;
    if mask.width() != pix.width() || mask.height() != pix.height() {
        return Err(CccError::Core(mrcseg_core::Error::DimensionMismatch {
            expected: (pix.width(), pix.height()),
            actual: (mask.width(), mask.height()),
        }));
    }

    let extraction = extract_components(mask, ConnectivityType::FourWay, MIN_COMPONENT_AREA)?;
    let components = extraction.components;
    let features = compute_features(pix, &components, params.edge_window)?;
    let initial = classify(&features, set, params.text_class, params.text_cost)?;
    let graph = build_graph(&components, &features, pix.width(), pix.height(), params)?;

    let (classes, log_likelihoods): (Vec<usize>, Vec<Vec<f64>>) = initial
        .into_iter()
        .map(|c| (c.class, c.log_likelihoods))
        .unzip();
    let classification = refine_map(&graph, &log_likelihoods, classes, params);

    let mut out_mask = extraction.mask;
    for (comp, &class) in components.iter().zip(&classification.classes) {
        if class != params.text_class {
            comp.paint(&mut out_mask, false);
        }
    }

    debug!(
        "ccc: {} components ({} discarded), {} edges, {} map sweeps, {} changed, {} text",
        components.len(),
        extraction.discarded,
        graph.num_edges(),
        classification.sweeps,
        classification.changed(),
        classification.count_class(params.text_class)
    );

    Ok(CccOutput {
        mask: out_mask,
        components,
        features,
        log_likelihoods,
        graph,
        classification,
        discarded: extraction.discarded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mrcseg_core::{Box, PixelDepth};

    #[test]
    fn test_dark_strokes_are_kept() {
        let mut pm = Pix::new(64, 48, 3, PixelDepth::Bit8).unwrap().to_mut();
        pm.fill_rect_rgb(0, 0, 64, 48, (240, 240, 235)).unwrap();
        let mut mask = Bitmap::new(64, 48).unwrap();
        for x in [8, 24, 40] {
            pm.fill_rect_rgb(x, 10, 4, 20, (15, 15, 20)).unwrap();
            mask.fill_rect(&Box::new_unchecked(x as i32, 10, 4, 20), true);
        }
        // speck below the area floor
        mask.set(60, 40, true);
        let pix: Pix = pm.into();

        let set = SignatureSet::default_model().unwrap();
        let params = CccParams::default().with_search_fraction(0.5);
        let out = classify_components(&pix, &mask, &set, &params).unwrap();
        assert_eq!(out.components.len(), 3);
        assert_eq!(out.discarded, 1);
        assert_eq!(out.text_components(1), 3);
        assert_eq!(out.mask.count_ones(), 3 * 80);
        assert!(out.graph.is_symmetric());
    }

    #[test]
    fn test_size_mismatch() {
        let pix = Pix::new(32, 32, 3, PixelDepth::Bit8).unwrap();
        let mask = Bitmap::new(16, 32).unwrap();
        let set = SignatureSet::default_model().unwrap();
        assert!(classify_components(&pix, &mask, &set, &CccParams::default()).is_err());
    }
}
