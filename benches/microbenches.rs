//! Criterion microbenches for the platescan hot paths.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - mask IoU on a detector-sized grid
//! - greedy region selection over a crowded plate
//! - masked cropping with nearest-neighbor mask sampling
//! - run-length mask decoding

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use image::{Rgb, RgbImage};
use platescan::detections::{decode_rle, encode_rle};
use platescan::extract::masked_crop;
use platescan::geom::{BBoxXYXY, Pixel};
use platescan::region::{mask_iou, select_regions, Mask, Region, SelectOptions};

const GRID: u32 = 256;

fn disc(cx: f64, cy: f64, r: f64) -> Mask {
    Mask::from_fn(GRID, GRID, |x, y| {
        let dx = x as f64 - cx;
        let dy = y as f64 - cy;
        dx * dx + dy * dy <= r * r
    })
}

/// Forty overlapping discs laid out on a loose grid.
fn crowded_plate() -> Vec<Region> {
    (0..40)
        .map(|i| {
            let cx = 20.0 + (i % 8) as f64 * 28.0;
            let cy = 20.0 + (i / 8) as f64 * 45.0;
            let r = 18.0 + (i % 3) as f64 * 4.0;
            Region::new(
                disc(cx, cy, r),
                BBoxXYXY::from_xyxy(cx - r, cy - r, cx + r, cy + r),
                1.0 - i as f64 / 40.0,
            )
        })
        .collect()
}

fn bench_mask_iou(c: &mut Criterion) {
    let a = disc(100.0, 100.0, 60.0);
    let b = disc(130.0, 110.0, 60.0);
    let mut group = c.benchmark_group("region");
    group.throughput(Throughput::Elements((GRID * GRID) as u64));

    group.bench_function("mask_iou", |bench| {
        bench.iter(|| black_box(mask_iou(black_box(&a), black_box(&b))))
    });

    group.finish();
}

/// Benchmark selection; regions are cloned per iteration since selection
/// consumes them.
fn bench_select_regions(c: &mut Criterion) {
    let regions = crowded_plate();
    let opts = SelectOptions::default();
    let mut group = c.benchmark_group("region");
    group.throughput(Throughput::Elements(regions.len() as u64));

    group.bench_function("select_regions", |bench| {
        bench.iter(|| black_box(select_regions(black_box(regions.clone()), &opts)))
    });

    group.finish();
}

fn bench_masked_crop(c: &mut Criterion) {
    let image = RgbImage::from_fn(1024, 768, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
    let mask = disc(128.0, 128.0, 90.0);
    let rect = BBoxXYXY::<Pixel>::from_xyxy(200.0, 100.0, 700.0, 600.0).crop_rect(1024, 768);
    let mut group = c.benchmark_group("extract");
    group.throughput(Throughput::Elements(rect.area()));

    group.bench_function("masked_crop", |bench| {
        bench.iter(|| black_box(masked_crop(black_box(&image), &mask, rect)))
    });

    group.finish();
}

fn bench_decode_rle(c: &mut Criterion) {
    let rle = encode_rle(&disc(128.0, 128.0, 90.0));
    let mut group = c.benchmark_group("detections");
    group.throughput(Throughput::Elements((GRID * GRID) as u64));

    group.bench_function("decode_rle", |bench| {
        bench.iter(|| black_box(decode_rle(black_box(&rle), GRID, GRID).unwrap()))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_mask_iou,
    bench_select_regions,
    bench_masked_crop,
    bench_decode_rle
);
criterion_main!(benches);
