//! Detector regions and their deduplication.
//!
//! A [`Region`] is one candidate food item as reported by the segmentation
//! detector. Before anything is cropped, overlapping candidates are
//! suppressed with a greedy pass ([`select_regions`]) scored by mask IoU
//! ([`mask_iou`]). The result is the kept-region set: detector order
//! preserved, no pair overlapping by more than the threshold.

mod mask;
mod select;

pub use mask::{mask_iou, Mask};
pub use select::{select_region_indices, select_regions, SelectOptions, SelectOrder};

use crate::geom::{BBoxXYXY, Pixel};

/// A detected candidate item.
#[derive(Clone, Debug, PartialEq)]
pub struct Region {
    /// Occupancy on the detector's grid, which need not match the image size.
    pub mask: Mask,
    /// Box in source-image pixel coordinates.
    pub bbox: BBoxXYXY<Pixel>,
    /// Detector confidence.
    pub score: f64,
}

impl Region {
    pub fn new(mask: Mask, bbox: BBoxXYXY<Pixel>, score: f64) -> Self {
        Self { mask, bbox, score }
    }
}
