//! JSON documents carrying segmentation detector output.
//!
//! The detector itself runs outside this crate; its output (one mask, box
//! and score per candidate) is exchanged as JSON:
//!
//! ```json
//! {
//!   "mask_width": 160, "mask_height": 120,
//!   "box_space": "pixel",
//!   "detections": [
//!     {"bbox": {"xmin": 10, "ymin": 10, "xmax": 90, "ymax": 70},
//!      "score": 0.91,
//!      "mask": {"start": 0, "counts": [12, 30, 118, 30]}}
//!   ]
//! }
//! ```
//!
//! Masks are row-major run lengths. Runs alternate between empty and
//! occupied cells beginning with `start`, and must cover the whole grid.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::PlatescanError;
use crate::geom::{BBoxXYXY, Pixel};
use crate::pipeline::Detector;
use crate::region::{Mask, Region};

/// Coordinate space of the boxes in a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxSpace {
    #[default]
    Pixel,
    Normalized,
}

/// Run-length encoded mask.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RleMask {
    /// Value of the first run (0 or 1).
    #[serde(default)]
    pub start: u8,
    pub counts: Vec<u64>,
}

/// One detector candidate as stored in the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionEntry {
    /// Box in the document's [`BoxSpace`].
    pub bbox: BBoxXYXY<Pixel>,
    #[serde(default)]
    pub score: f64,
    pub mask: RleMask,
}

/// Detector output for one image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionsDocument {
    pub mask_width: u32,
    pub mask_height: u32,
    #[serde(default)]
    pub box_space: BoxSpace,
    #[serde(default)]
    pub detections: Vec<DetectionEntry>,
}

impl DetectionsDocument {
    /// Builds a pixel-space document from regions sharing one mask grid.
    pub fn from_regions(mask_width: u32, mask_height: u32, regions: &[Region]) -> Self {
        Self {
            mask_width,
            mask_height,
            box_space: BoxSpace::Pixel,
            detections: regions
                .iter()
                .map(|r| DetectionEntry {
                    bbox: r.bbox,
                    score: r.score,
                    mask: encode_rle(&r.mask),
                })
                .collect(),
        }
    }

    /// Decodes every entry into a [`Region`] for an image of the given size.
    ///
    /// Normalized boxes are scaled to pixels here.
    pub fn to_regions(&self, image_width: u32, image_height: u32) -> Result<Vec<Region>, String> {
        self.detections
            .iter()
            .enumerate()
            .map(|(idx, entry)| {
                let mask = decode_rle(&entry.mask, self.mask_width, self.mask_height)
                    .map_err(|msg| format!("detection {}: {}", idx, msg))?;
                let bbox = match self.box_space {
                    BoxSpace::Pixel => entry.bbox,
                    BoxSpace::Normalized => entry
                        .bbox
                        .assume_normalized()
                        .to_pixel(image_width, image_height),
                };
                if !bbox.is_finite() {
                    return Err(format!("detection {}: box is not finite", idx));
                }
                Ok(Region::new(mask, bbox, entry.score))
            })
            .collect()
    }
}

/// Largest mask grid accepted from a document.
const MAX_MASK_CELLS: u64 = 1 << 26;

/// Decodes a run-length mask on a `width x height` grid.
pub fn decode_rle(rle: &RleMask, width: u32, height: u32) -> Result<Mask, String> {
    if rle.start > 1 {
        return Err(format!("start must be 0 or 1, got {}", rle.start));
    }

    let expected = u64::from(width) * u64::from(height);
    if expected > MAX_MASK_CELLS {
        return Err(format!("mask grid {}x{} is too large", width, height));
    }
    let total = rle
        .counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or_else(|| "run lengths overflow".to_string())?;
    if total != expected {
        return Err(format!(
            "run lengths cover {} cells, mask grid has {}",
            total, expected
        ));
    }

    let mut cells = Vec::with_capacity(expected as usize);
    let mut value = rle.start == 1;
    for &count in &rle.counts {
        cells.extend(std::iter::repeat_n(value, count as usize));
        value = !value;
    }

    Mask::from_cells(width, height, cells).ok_or_else(|| "mask size mismatch".to_string())
}

/// Run-length encodes a mask, always starting with an empty run.
pub fn encode_rle(mask: &Mask) -> RleMask {
    let mut counts = Vec::new();
    let mut current = false;
    let mut run = 0u64;
    for &cell in mask.cells() {
        if cell == current {
            run += 1;
        } else {
            counts.push(run);
            current = cell;
            run = 1;
        }
    }
    counts.push(run);
    RleMask { start: 0, counts }
}

/// Parses a detections document from a JSON string.
pub fn from_detections_str(json: &str) -> Result<DetectionsDocument, serde_json::Error> {
    serde_json::from_str(json)
}

/// Parses a detections document from JSON bytes.
pub fn from_detections_slice(bytes: &[u8]) -> Result<DetectionsDocument, serde_json::Error> {
    serde_json::from_slice(bytes)
}

pub fn to_detections_string(doc: &DetectionsDocument) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(doc)
}

/// Reads a detections document from a file.
pub fn read_detections(path: &Path) -> Result<DetectionsDocument, PlatescanError> {
    let file = File::open(path).map_err(PlatescanError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| PlatescanError::DetectionsParse {
        path: path.to_path_buf(),
        source,
    })
}

/// A [`Detector`] that replays a precomputed detections file.
#[derive(Clone, Debug)]
pub struct JsonDetections {
    path: PathBuf,
    document: DetectionsDocument,
}

impl JsonDetections {
    pub fn open(path: &Path) -> Result<Self, PlatescanError> {
        Ok(Self {
            path: path.to_path_buf(),
            document: read_detections(path)?,
        })
    }

    pub fn document(&self) -> &DetectionsDocument {
        &self.document
    }
}

impl Detector for JsonDetections {
    fn detect(&self, image: &RgbImage) -> Result<Vec<Region>, PlatescanError> {
        let (width, height) = image.dimensions();
        self.document
            .to_regions(width, height)
            .map_err(|message| PlatescanError::InvalidDetections {
                path: self.path.clone(),
                message,
            })
    }
}
