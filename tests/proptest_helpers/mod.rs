#![allow(dead_code)]

use platescan::geom::BBoxXYXY;
use platescan::region::{Mask, Region};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Arbitrary cell-level mask on a `width x height` grid.
pub fn arb_mask(width: u32, height: u32) -> impl Strategy<Value = Mask> {
    proptest::collection::vec(any::<bool>(), (width * height) as usize)
        .prop_map(move |cells| Mask::from_cells(width, height, cells).expect("mask size"))
}

/// Rectangular mask, which gives realistic overlaps between candidates.
pub fn arb_rect_mask(width: u32, height: u32) -> impl Strategy<Value = Mask> {
    (0..width, 0..height, 1..=width, 1..=height).prop_map(move |(x, y, w, h)| {
        let x2 = (x + w).min(width);
        let y2 = (y + h).min(height);
        Mask::from_rect(width, height, x, y, x2, y2)
    })
}

pub fn arb_region(width: u32, height: u32) -> impl Strategy<Value = Region> {
    (
        prop_oneof![arb_rect_mask(width, height), arb_mask(width, height)],
        0.0f64..=1.0,
    )
        .prop_map(move |(mask, score)| {
            Region::new(
                mask,
                BBoxXYXY::from_xyxy(0.0, 0.0, width as f64, height as f64),
                score,
            )
        })
}

pub fn arb_regions(max: usize) -> impl Strategy<Value = Vec<Region>> {
    proptest::collection::vec(arb_region(12, 12), 0..=max)
}
