#![allow(dead_code)]

use std::collections::BTreeSet;

use arenalabel::ir::{BBoxXYXY, Coord, Pixel};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Half a unit in the sixth decimal, scaled to the larger image side.
pub fn eps_label(image_w: u32, image_h: u32) -> f64 {
    image_w.max(image_h) as f64 * 1e-6
}

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

pub fn arb_image_size() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=4096, 1u32..=4096)
}

/// A point anywhere in `[-margin, size + margin]`, so drags may leave the image.
pub fn arb_point(width: u32, height: u32, margin: f64) -> impl Strategy<Value = Coord<Pixel>> {
    (
        -margin..=(width as f64 + margin),
        -margin..=(height as f64 + margin),
    )
        .prop_map(|(x, y)| Coord::new(x, y))
}

/// An image size plus two drag corners inside it.
pub fn arb_drag() -> impl Strategy<Value = (u32, u32, Coord<Pixel>, Coord<Pixel>)> {
    arb_image_size().prop_flat_map(|(w, h)| {
        (
            Just(w),
            Just(h),
            arb_point(w, h, 0.0),
            arb_point(w, h, 0.0),
        )
    })
}

pub fn drag_box(a: Coord<Pixel>, b: Coord<Pixel>) -> BBoxXYXY<Pixel> {
    BBoxXYXY::from_corners(a, b)
}

/// A set of distinct stems.
pub fn arb_stems(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z0-9_]{1,12}", 0..=max)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
}
