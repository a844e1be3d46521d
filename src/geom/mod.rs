//! Geometry shared by the detector input and the extractor.
//!
//! Boxes are always XYXY. The coordinate space is carried in the type so a
//! normalized detector box cannot be used to crop pixels without first being
//! scaled to the source image:
//!
//! ```
//! use platescan::geom::{BBoxXYXY, Normalized};
//!
//! let fractional: BBoxXYXY<Normalized> = BBoxXYXY::from_xyxy(0.1, 0.1, 0.5, 0.5);
//! let rect = fractional.to_pixel(640, 480).crop_rect(640, 480);
//! assert_eq!((rect.width, rect.height), (256, 192));
//! ```

mod bbox;
mod coord;
mod space;

pub use bbox::{BBoxXYXY, CropRect};
pub use coord::Coord;
pub use space::{Normalized, Pixel, Space};
