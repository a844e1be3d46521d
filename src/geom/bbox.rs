//! Bounding boxes in XYXY form and the integer crop rectangles derived from them.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::{Normalized, Pixel, Space};

/// An axis-aligned bounding box (xmin, ymin, xmax, ymax).
///
/// Construction does not check ordering; detectors occasionally emit
/// degenerate boxes and the extractor is the place that rejects them.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    /// Width of the box; negative when xmax < xmin.
    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height of the box; negative when ymax < ymin.
    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

impl<TSpace: Space> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("space", &TSpace::NAME)
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}

impl<TSpace> Default for BBoxXYXY<TSpace> {
    fn default() -> Self {
        Self::from_xyxy(0.0, 0.0, 0.0, 0.0)
    }
}

// Hand-written so that TSpace needs no serde bounds.
impl<TSpace> Serialize for BBoxXYXY<TSpace> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("BBoxXYXY", 4)?;
        state.serialize_field("xmin", &self.min.x)?;
        state.serialize_field("ymin", &self.min.y)?;
        state.serialize_field("xmax", &self.max.x)?;
        state.serialize_field("ymax", &self.max.y)?;
        state.end()
    }
}

impl<'de, TSpace> Deserialize<'de> for BBoxXYXY<TSpace> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct BBoxData {
            xmin: f64,
            ymin: f64,
            xmax: f64,
            ymax: f64,
        }
        let data = BBoxData::deserialize(deserializer)?;
        Ok(BBoxXYXY::from_xyxy(
            data.xmin, data.ymin, data.xmax, data.ymax,
        ))
    }
}

impl BBoxXYXY<Normalized> {
    /// Scales fractional coordinates up to source-image pixels.
    pub fn to_pixel(&self, image_width: u32, image_height: u32) -> BBoxXYXY<Pixel> {
        let (w, h) = (f64::from(image_width), f64::from(image_height));
        BBoxXYXY::from_xyxy(
            self.min.x * w,
            self.min.y * h,
            self.max.x * w,
            self.max.y * h,
        )
    }
}

impl BBoxXYXY<Pixel> {
    /// Reinterprets a box whose space was not known when it was parsed.
    pub fn assume_normalized(&self) -> BBoxXYXY<Normalized> {
        BBoxXYXY::from_xyxy(self.min.x, self.min.y, self.max.x, self.max.y)
    }

    /// Integer crop rectangle for an image of the given size.
    ///
    /// Coordinates are truncated toward zero and clamped into
    /// `[0, image_width] x [0, image_height]`. Inverted or non-finite boxes
    /// produce an empty rectangle.
    pub fn crop_rect(&self, image_width: u32, image_height: u32) -> CropRect {
        let clamp = |v: f64, hi: u32| -> u32 {
            if !v.is_finite() || v <= 0.0 {
                0
            } else {
                (v.trunc() as u64).min(u64::from(hi)) as u32
            }
        };

        let x1 = clamp(self.min.x, image_width);
        let y1 = clamp(self.min.y, image_height);
        let x2 = clamp(self.max.x, image_width);
        let y2 = clamp(self.max.y, image_height);

        CropRect {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }
}

/// Integer rectangle inside a source image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    #[inline]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}
