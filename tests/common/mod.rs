#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use platescan::detections::{to_detections_string, DetectionsDocument};
use platescan::geom::BBoxXYXY;
use platescan::region::{Mask, Region};

/// Side of the square detector grid used by the fixtures.
pub const MASK_GRID: u32 = 100;

/// A region whose mask is the cell rectangle `[x1, x2) x [y1, y2)` on the
/// fixture grid and whose box is given in image pixels.
pub fn region(mask: (u32, u32, u32, u32), bbox: (f64, f64, f64, f64), score: f64) -> Region {
    let (mx1, my1, mx2, my2) = mask;
    let (x1, y1, x2, y2) = bbox;
    Region::new(
        Mask::from_rect(MASK_GRID, MASK_GRID, mx1, my1, mx2, my2),
        BBoxXYXY::from_xyxy(x1, y1, x2, y2),
        score,
    )
}

/// Image with a horizontal colour gradient, so crops are not uniform.
pub fn plate_image(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    plate_image(width, height).save(path).expect("write png file");
}

pub fn write_detections(path: &Path, regions: &[Region]) {
    let doc = DetectionsDocument::from_regions(MASK_GRID, MASK_GRID, regions);
    fs::write(path, to_detections_string(&doc).expect("serialize detections"))
        .expect("write detections file");
}

/// Region 2 overlaps region 1 at IoU 0.7; region 3 is disjoint from both.
/// Boxes are in a 200x200 image.
pub fn overlapping_trio() -> Vec<Region> {
    vec![
        region((0, 0, 40, 40), (0.0, 0.0, 80.0, 80.0), 0.6),
        region((0, 0, 40, 28), (0.0, 0.0, 80.0, 56.0), 0.9),
        region((60, 60, 90, 90), (120.0, 120.0, 180.0, 180.0), 0.8),
    ]
}

/// Files directly inside `dir`, sorted.
pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
