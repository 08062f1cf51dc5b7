//! Component classification regression test
//!
//! Text-like strokes survive, textured picture regions are dropped, the
//! neighbor graph is symmetric, refinement never raises the energy, and
//! a weak data term is overridden by a similar neighbor.

use mrcseg_ccc::{
    CccParams, EdgeFeature, SignatureSet, build_graph, classify, classify_components, refine_map,
    total_energy,
};
use mrcseg_core::{Bitmap, Box, Pix, PixelDepth};
use mrcseg_region::{ConnectivityType, find_components};
use mrcseg_test::{RegParams, synth};

fn flag(ok: bool) -> f64 {
    if ok { 1.0 } else { 0.0 }
}

#[test]
fn ccc_text_page_reg() {
    let mut rp = RegParams::new("ccc_text_page");

    let page = synth::text_page(320, 256, 12).unwrap();
    let set = SignatureSet::default_model().unwrap();
    let params = CccParams::default();
    let out = classify_components(&page.pix, &page.truth, &set, &params).unwrap();
    eprintln!(
        "  {} components, {} edges, {} sweeps",
        out.components.len(),
        out.graph.num_edges(),
        out.classification.sweeps
    );

    rp.compare_values(0.0, out.discarded as f64, 0.0);
    rp.compare_values(
        out.components.len() as f64,
        out.text_components(params.text_class) as f64,
        0.0,
    );
    rp.compare_masks(&page.truth, &out.mask);
    rp.compare_values(1.0, flag(out.graph.is_symmetric()), 0.0);
    rp.compare_values(1.0, flag(out.classification.converged), 0.0);

    // every glyph edge is the same ink against the same paper
    let f = &out.features[0];
    rp.compare_values(0.0, f.edge_depth_std, 1e-9);
    rp.compare_values(0.0, f.background_spread, 1e-9);

    rp.write_mask_and_check(&out.mask).unwrap();

    assert!(rp.cleanup(), "ccc_text_page regression test failed");
}

/// Three ink strokes on white, plus a gray square inside a striped
/// picture region.
fn mixed_page() -> (Pix, Bitmap, Bitmap) {
    let mut pm = Pix::new(200, 120, 3, PixelDepth::Bit8).unwrap().to_mut();
    pm.fill_rect_rgb(0, 0, 200, 120, synth::WHITE).unwrap();
    let mut mask = Bitmap::new(200, 120).unwrap();
    let mut strokes = Bitmap::new(200, 120).unwrap();

    for x in [20, 36, 52] {
        pm.fill_rect_rgb(x, 40, 5, 30, synth::BLACK).unwrap();
        strokes.fill_rect(&Box::new_unchecked(x as i32, 40, 5, 30), true);
    }
    for x in (100..190).step_by(8) {
        pm.fill_rect_rgb(x, 15, 4, 90, (90, 90, 90)).unwrap();
    }
    pm.fill_rect_rgb(125, 40, 40, 40, (120, 120, 120)).unwrap();
    mask.or_assign(&strokes).unwrap();
    mask.fill_rect(&Box::new_unchecked(125, 40, 40, 40), true);
    (pm.into(), mask, strokes)
}

#[test]
fn ccc_mixed_page_reg() {
    let mut rp = RegParams::new("ccc_mixed_page");

    let (pix, mask, strokes) = mixed_page();
    let set = SignatureSet::default_model().unwrap();
    let params = CccParams::default().with_search_fraction(0.5);
    let out = classify_components(&pix, &mask, &set, &params).unwrap();
    rp.compare_values(4.0, out.components.len() as f64, 0.0);
    rp.compare_values(3.0, out.text_components(1) as f64, 0.0);

    // --- the picture square is dropped, strokes kept ---
    let square = out
        .components
        .iter()
        .position(|c| c.area == 1600)
        .unwrap();
    let f = &out.features[square];
    eprintln!("  square feature {:?}", f.to_array());
    rp.compare_values(1.0, flag(f.background_spread > 100.0), 0.0);
    rp.compare_values(0.0, out.classification.classes[square] as f64, 0.0);
    rp.compare_masks(&strokes, &out.mask);

    // --- energy never rises across sweeps ---
    let rising = out
        .classification
        .energy_history
        .windows(2)
        .filter(|w| w[1] > w[0] + 1e-9)
        .count();
    rp.compare_values(0.0, rising as f64, 0.0);
    let e = total_energy(
        &out.graph,
        &out.log_likelihoods,
        &out.classification.classes,
        &params,
    );
    rp.compare_values(*out.classification.energy_history.last().unwrap(), e, 1e-9);

    // --- determinism ---
    let again = classify_components(&pix, &mask, &set, &params).unwrap();
    rp.compare_masks(&out.mask, &again.mask);
    rp.compare_values(1.0, flag(out.classification == again.classification), 0.0);

    assert!(rp.cleanup(), "ccc_mixed_page regression test failed");
}

const ONE_BAND_SPLIT: &str = "\
title: split on the first band
nbands: 4
class:
 classnum: 0
 classtitle: low
 subclass:
  pi: 1.0
  means: 100 0 0 0
  covar:
   100 0 0 0
   0 100 0 0
   0 0 100 0
   0 0 0 100
 endsubclass:
endclass:
class:
 classnum: 1
 classtitle: high
 subclass:
  pi: 1.0
  means: 110 0 0 0
  covar:
   100 0 0 0
   0 100 0 0
   0 0 100 0
   0 0 0 100
 endsubclass:
endclass:
";

#[test]
fn ccc_smoothing_reg() {
    let mut rp = RegParams::new("ccc_smoothing");

    let mut bm = Bitmap::new(60, 40).unwrap();
    bm.fill_rect(&Box::new_unchecked(10, 10, 8, 12), true);
    bm.fill_rect(&Box::new_unchecked(24, 10, 8, 12), true);
    let comps = find_components(&bm, ConnectivityType::FourWay).unwrap();
    rp.compare_values(2.0, comps.len() as f64, 0.0);

    // first clearly high, second a hair on the low side of the boundary
    let feature = |depth: f64| EdgeFeature {
        mean_edge_depth: depth,
        samples: 40,
        ..Default::default()
    };
    let features = vec![feature(120.0), feature(104.5)];

    let set = SignatureSet::parse(ONE_BAND_SPLIT).unwrap();
    let initial = classify(&features, &set, 1, 0.0).unwrap();
    rp.compare_values(1.0, initial[0].class as f64, 0.0);
    rp.compare_values(0.0, initial[1].class as f64, 0.0);
    let margin = initial[1].log_likelihoods[0] - initial[1].log_likelihoods[1];
    rp.compare_values(0.05, margin, 1e-9);

    let params = CccParams::default().with_search_fraction(0.5);
    let graph = build_graph(&comps, &features, 60, 40, &params).unwrap();
    rp.compare_values(1.0, graph.num_edges() as f64, 0.0);
    rp.compare_values(14.0, graph.neighbors(0)[0].distance, 1e-9);
    rp.compare_values(1.0, graph.neighbors(0)[0].feature_distance, 1e-9);

    let lls: Vec<Vec<f64>> = initial.iter().map(|c| c.log_likelihoods.clone()).collect();
    let classes: Vec<usize> = initial.iter().map(|c| c.class).collect();
    let refined = refine_map(&graph, &lls, classes, &params);
    rp.compare_values(1.0, refined.classes[0] as f64, 0.0);
    rp.compare_values(1.0, refined.classes[1] as f64, 0.0);
    rp.compare_values(1.0, flag(refined.converged), 0.0);
    rp.compare_values(2.0, refined.sweeps as f64, 0.0);

    assert!(rp.cleanup(), "ccc_smoothing regression test failed");
}
