//! Cutting kept regions out of the source image.
//!
//! For each kept region the extractor clamps its box to the image, rejects
//! crops below the minimum size, and otherwise writes the masked pixels
//! inside the box (black elsewhere) to an [`ArtifactStore`].

mod store;

pub use store::{ArtifactHandle, ArtifactId, ArtifactStore, DirStore, MemoryStore};

use image::{Rgb, RgbImage};
use log::debug;

use crate::error::PlatescanError;
use crate::geom::CropRect;
use crate::region::{Mask, Region};

/// Why a kept region produced no artifact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The clamped box has zero area.
    Empty,
    /// The clamped box is narrower or shorter than the configured minimum.
    TooSmall { width: u32, height: u32 },
}

/// A persisted crop together with its pixels.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub handle: ArtifactHandle,
    pub image: RgbImage,
}

/// Outcome of extracting one region.
#[derive(Clone, Debug)]
pub enum Extraction {
    Accepted(Artifact),
    Rejected(RejectReason),
}

/// Crops regions, enforcing a minimum crop size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Extractor {
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            min_width: 20,
            min_height: 20,
        }
    }
}

impl Extractor {
    pub fn new(min_width: u32, min_height: u32) -> Self {
        Self {
            min_width,
            min_height,
        }
    }

    /// The clamped crop rectangle for `region`, or the reason it is rejected.
    pub fn crop_rect(
        &self,
        image_width: u32,
        image_height: u32,
        region: &Region,
    ) -> Result<CropRect, RejectReason> {
        let rect = region.bbox.crop_rect(image_width, image_height);
        if rect.is_empty() {
            return Err(RejectReason::Empty);
        }
        if rect.width < self.min_width || rect.height < self.min_height {
            return Err(RejectReason::TooSmall {
                width: rect.width,
                height: rect.height,
            });
        }
        Ok(rect)
    }

    /// Extracts `region` from `image` and persists it in `store`.
    ///
    /// Rejections are not errors; only a failing store is.
    pub fn extract<S: ArtifactStore + ?Sized>(
        &self,
        image: &RgbImage,
        region: &Region,
        store: &mut S,
    ) -> Result<Extraction, PlatescanError> {
        let (width, height) = image.dimensions();
        let rect = match self.crop_rect(width, height, region) {
            Ok(rect) => rect,
            Err(reason) => {
                debug!("region rejected: {:?} (box {:?})", reason, region.bbox);
                return Ok(Extraction::Rejected(reason));
            }
        };

        let crop = masked_crop(image, &region.mask, rect);
        let handle = store.put(&crop)?;
        Ok(Extraction::Accepted(Artifact {
            handle,
            image: crop,
        }))
    }
}

/// Copies `rect` out of `image`, blacking out every pixel whose
/// nearest-neighbour mask cell (mask stretched to the full image) is empty.
pub fn masked_crop(image: &RgbImage, mask: &Mask, rect: CropRect) -> RgbImage {
    let (image_width, image_height) = image.dimensions();
    RgbImage::from_fn(rect.width, rect.height, |cx, cy| {
        let (x, y) = (rect.x + cx, rect.y + cy);
        if mask.sample_nearest(x, y, image_width, image_height) {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::BBoxXYXY;

    fn solid(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([200, 120, 40]))
    }

    fn full_region(x1: f64, y1: f64, x2: f64, y2: f64) -> Region {
        Region::new(
            Mask::from_rect(10, 10, 0, 0, 10, 10),
            BBoxXYXY::from_xyxy(x1, y1, x2, y2),
            0.9,
        )
    }

    #[test]
    fn narrow_box_is_rejected() {
        let mut store = MemoryStore::new();
        let out = Extractor::default()
            .extract(&solid(100, 100), &full_region(10.0, 10.0, 25.0, 40.0), &mut store)
            .unwrap();
        assert!(matches!(
            out,
            Extraction::Rejected(RejectReason::TooSmall {
                width: 15,
                height: 30
            })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn box_outside_image_is_empty() {
        let extractor = Extractor::default();
        let region = full_region(150.0, 150.0, 190.0, 190.0);
        assert_eq!(
            extractor.crop_rect(100, 100, &region),
            Err(RejectReason::Empty)
        );
    }

    #[test]
    fn clamping_happens_before_size_check() {
        // 40 px wide box, but only 12 px of it lie inside the image.
        let extractor = Extractor::default();
        let region = full_region(88.0, 0.0, 128.0, 40.0);
        assert_eq!(
            extractor.crop_rect(100, 100, &region),
            Err(RejectReason::TooSmall {
                width: 12,
                height: 40
            })
        );
    }

    #[test]
    fn minimum_size_is_inclusive() {
        let extractor = Extractor::default();
        let region = full_region(0.0, 0.0, 20.0, 20.0);
        assert!(extractor.crop_rect(100, 100, &region).is_ok());
    }

    #[test]
    fn accepted_crop_has_box_size_and_masked_pixels() {
        // Mask covers the left half of the image only.
        let region = Region::new(
            Mask::from_rect(4, 4, 0, 0, 2, 4),
            BBoxXYXY::from_xyxy(0.0, 0.0, 80.0, 40.0),
            0.5,
        );
        let mut store = MemoryStore::with_seed(3);
        let out = Extractor::default()
            .extract(&solid(80, 80), &region, &mut store)
            .unwrap();

        let Extraction::Accepted(artifact) = out else {
            panic!("expected accepted extraction");
        };
        assert_eq!(artifact.image.dimensions(), (80, 40));
        assert_eq!(*artifact.image.get_pixel(10, 10), Rgb([200, 120, 40]));
        assert_eq!(*artifact.image.get_pixel(39, 10), Rgb([200, 120, 40]));
        assert_eq!(*artifact.image.get_pixel(40, 10), Rgb([0, 0, 0]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn crop_offsets_into_source_image() {
        let image = RgbImage::from_fn(50, 50, |x, y| Rgb([x as u8, y as u8, 0]));
        let mask = Mask::from_rect(50, 50, 0, 0, 50, 50);
        let rect = CropRect {
            x: 10,
            y: 20,
            width: 5,
            height: 5,
        };
        let crop = masked_crop(&image, &mask, rect);
        assert_eq!(*crop.get_pixel(0, 0), Rgb([10, 20, 0]));
        assert_eq!(*crop.get_pixel(4, 4), Rgb([14, 24, 0]));
    }
}
