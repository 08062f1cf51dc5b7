//! Multiscale segmentation regression test
//!
//! Single-layer square scenario, coarse-to-fine runs on a text page with
//! and without component classification, and layer planning failures.

use mrcseg::{SegmentError, SegmentParams, SignatureSet, segment, segment_cos_only};
use mrcseg_test::{RegParams, synth};

#[test]
fn multiscale_square_reg() {
    let mut rp = RegParams::new("multiscale_square");

    let page = synth::square_on_white(512, 512, 156, 156, 200).unwrap();
    let params = SegmentParams::default()
        .with_block_size(32)
        .with_num_layers(1);
    let seg = segment_cos_only(&page.pix, &params).unwrap();
    rp.compare_values(1.0, seg.report.layers.len() as f64, 0.0);
    rp.compare_values(32.0, seg.report.layers[0].block_size as f64, 0.0);
    rp.compare_masks(&page.truth, &seg.mask);
    rp.compare_values(40000.0, seg.mask.count_ones() as f64, 0.0);

    rp.write_mask_and_check(&seg.mask).unwrap();

    assert!(rp.cleanup(), "multiscale_square regression test failed");
}

#[test]
fn multiscale_text_page_reg() {
    let mut rp = RegParams::new("multiscale_text_page");

    let page = synth::text_page(320, 256, 12).unwrap();
    let set = SignatureSet::default_model().unwrap();
    let params = SegmentParams::default().with_block_size(16);
    let seg = segment(&page.pix, &params, &set).unwrap();

    // --- layers run coarsest first, halving ---
    let sizes: Vec<u32> = seg.report.layers.iter().map(|l| l.block_size).collect();
    eprintln!("  layers {:?}", seg.report.layers);
    rp.compare_strings(
        format!("{:?}", sizes).as_bytes(),
        format!("{:?}", vec![64u32, 32, 16]).as_bytes(),
    );
    let classified = seg.report.layers.iter().all(|l| l.components > 0);
    rp.compare_values(1.0, if classified { 1.0 } else { 0.0 }, 0.0);

    // --- ink is kept as text ---
    let ink = page.truth.count_ones() as f64;
    let mut hit = page.truth.clone();
    hit.and_assign(&seg.mask).unwrap();
    eprintln!("  recovered {} of {} ink pixels", hit.count_ones(), ink);
    rp.compare_values(1.0, hit.count_ones() as f64 / ink, 0.1);

    // --- determinism ---
    let again = segment(&page.pix, &params, &set).unwrap();
    rp.compare_masks(&seg.mask, &again.mask);
    rp.compare_values(1.0, if seg.report == again.report { 1.0 } else { 0.0 }, 0.0);

    rp.write_mask_and_check(&seg.mask).unwrap();

    assert!(rp.cleanup(), "multiscale_text_page regression test failed");
}

#[test]
fn multiscale_cos_only_reg() {
    let mut rp = RegParams::new("multiscale_cos_only");

    let page = synth::text_page(256, 192, 10).unwrap();
    let set = SignatureSet::default_model().unwrap();
    let params = SegmentParams::default()
        .with_block_size(16)
        .with_num_layers(2)
        .with_ccc_enabled(false);
    let a = segment(&page.pix, &params, &set).unwrap();
    let b = segment_cos_only(&page.pix, &params).unwrap();
    rp.compare_masks(&a.mask, &b.mask);
    let none_classified = a.report.layers.iter().all(|l| l.components == 0);
    rp.compare_values(1.0, if none_classified { 1.0 } else { 0.0 }, 0.0);

    assert!(rp.cleanup(), "multiscale_cos_only regression test failed");
}

#[test]
fn multiscale_no_layers_reg() {
    let mut rp = RegParams::new("multiscale_no_layers");

    // 80 px across holds only four 32 px blocks
    let pix = synth::solid_rgb(80, 400, synth::WHITE).unwrap();
    let params = SegmentParams::default().with_block_size(32);
    let err = segment_cos_only(&pix, &params).unwrap_err();
    eprintln!("  {}", err);
    let ok = matches!(
        err,
        SegmentError::NoLayers {
            width: 80,
            height: 400,
            block_size: 32
        }
    );
    rp.compare_values(1.0, if ok { 1.0 } else { 0.0 }, 0.0);

    // a finer block size fits
    let fine = SegmentParams::default().with_block_size(16).with_num_layers(3);
    let seg = segment_cos_only(&pix, &fine).unwrap();
    rp.compare_values(1.0, seg.report.layers.len() as f64, 0.0);
    rp.compare_values(0.0, seg.mask.count_ones() as f64, 0.0);

    assert!(rp.cleanup(), "multiscale_no_layers regression test failed");
}

#[test]
fn multiscale_layer_count_reg() {
    let mut rp = RegParams::new("multiscale_layer_count");

    // any layer count is accepted; only the fitting sizes run
    let pix = synth::solid_rgb(256, 192, synth::WHITE).unwrap();
    for layers in [3, 40, usize::MAX] {
        let params = SegmentParams::default()
            .with_block_size(16)
            .with_num_layers(layers);
        let seg = segment_cos_only(&pix, &params).unwrap();
        let sizes: Vec<u32> = seg.report.layers.iter().map(|l| l.block_size).collect();
        rp.compare_strings(
            format!("{:?}", sizes).as_bytes(),
            format!("{:?}", vec![64u32, 32, 16]).as_bytes(),
        );
        rp.compare_values(0.0, seg.mask.count_ones() as f64, 0.0);
    }

    assert!(rp.cleanup(), "multiscale_layer_count regression test failed");
}
