//! Connected component regression test
//!
//! Extraction on synthetic pages: component counts, partition of the
//! mask, small-component discard and its idempotence, and hole search.

use mrcseg_core::{Bitmap, Box};
use mrcseg_region::{
    ConnectivityType, MIN_COMPONENT_AREA, extract_components, find_components, find_holes,
    remove_small_components,
};
use mrcseg_test::{RegParams, synth};

/// Foreground of a page: every pixel darker than mid-gray.
fn dark_pixels(pix: &mrcseg_core::Pix) -> Bitmap {
    let mut bm = Bitmap::new(pix.width(), pix.height()).unwrap();
    for y in 0..pix.height() {
        for x in 0..pix.width() {
            let (r, g, b) = pix.get_rgb(x, y).unwrap();
            if (r as u32 + g as u32 + b as u32) < 384 {
                bm.set(x, y, true);
            }
        }
    }
    bm
}

#[test]
fn conncomp_reg() {
    let mut rp = RegParams::new("conncomp");

    // --- Test 1: glyph page components partition the ink ---
    let page = synth::text_page(240, 120, 12).unwrap();
    let mask = dark_pixels(&page.pix);
    rp.compare_masks(&page.truth, &mask);

    let comps = find_components(&mask, ConnectivityType::FourWay).unwrap();
    let total: u64 = comps.iter().map(|c| c.area as u64).sum();
    rp.compare_values(mask.count_ones() as f64, total as f64, 0.0);
    let mut rebuilt = Bitmap::new(mask.width(), mask.height()).unwrap();
    for c in &comps {
        c.paint(&mut rebuilt, true);
    }
    rp.compare_masks(&mask, &rebuilt);
    eprintln!("  text_page: {} components", comps.len());

    // ids follow raster order of top-left pixels
    let ordered = comps
        .windows(2)
        .all(|w| w[0].id + 1 == w[1].id && w[0].bounds.y <= w[1].bounds.y);
    rp.compare_values(1.0, if ordered { 1.0 } else { 0.0 }, 0.0);

    // --- Test 2: every component box is tight ---
    let tight = comps.iter().all(|c| {
        let w = c.mask.width();
        let h = c.mask.height();
        let full = Box::new_unchecked(0, 0, w as i32, h as i32);
        let row0 = Box::new_unchecked(0, 0, w as i32, 1);
        let col0 = Box::new_unchecked(0, 0, 1, h as i32);
        let rowl = Box::new_unchecked(0, h as i32 - 1, w as i32, 1);
        let coll = Box::new_unchecked(w as i32 - 1, 0, 1, h as i32);
        c.mask.count_in_rect(&full) == c.area as usize
            && [row0, col0, rowl, coll]
                .iter()
                .all(|r| c.mask.count_in_rect(r) > 0)
    });
    rp.compare_values(1.0, if tight { 1.0 } else { 0.0 }, 0.0);

    // --- Test 3: specks are discarded, the bar survives ---
    let specks = synth::noise_specks(160, 120, 40, 11).unwrap();
    let mask = dark_pixels(&specks.pix);
    let ex = extract_components(&mask, ConnectivityType::FourWay, MIN_COMPONENT_AREA).unwrap();
    rp.compare_values(1.0, ex.components.len() as f64, 0.0);
    rp.compare_masks(&specks.truth, &ex.mask);
    let small = ex
        .components
        .iter()
        .filter(|c| c.area < MIN_COMPONENT_AREA)
        .count();
    rp.compare_values(0.0, small as f64, 0.0);
    eprintln!("  noise_specks: discarded {}", ex.discarded);

    // --- Test 4: discard is idempotent ---
    let mut cleaned = ex.mask.clone();
    let removed =
        remove_small_components(&mut cleaned, ConnectivityType::FourWay, MIN_COMPONENT_AREA)
            .unwrap();
    rp.compare_values(0.0, removed as f64, 0.0);
    rp.compare_masks(&ex.mask, &cleaned);
    let again = extract_components(&cleaned, ConnectivityType::FourWay, MIN_COMPONENT_AREA).unwrap();
    rp.compare_values(0.0, again.discarded as f64, 0.0);

    // --- Test 5: holes of the "o" glyphs ---
    let with_holes: usize = comps
        .iter()
        .map(|c| find_holes(c).unwrap().len())
        .filter(|&n| n > 0)
        .count();
    eprintln!("  components with holes: {}", with_holes);
    rp.compare_values(1.0, if with_holes > 0 { 1.0 } else { 0.0 }, 0.0);

    // --- Test 6: 8-connectivity merges diagonal contacts ---
    let mut diag = Bitmap::new(20, 20).unwrap();
    diag.fill_rect(&Box::new_unchecked(2, 2, 4, 4), true);
    diag.fill_rect(&Box::new_unchecked(6, 6, 4, 4), true);
    let four = find_components(&diag, ConnectivityType::FourWay).unwrap();
    let eight = find_components(&diag, ConnectivityType::EightWay).unwrap();
    rp.compare_values(2.0, four.len() as f64, 0.0);
    rp.compare_values(1.0, eight.len() as f64, 0.0);
    rp.compare_values(32.0, eight[0].area as f64, 0.0);

    rp.write_mask_and_check(&ex.mask).unwrap();

    assert!(rp.cleanup(), "conncomp regression test failed");
}
