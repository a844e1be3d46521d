//! Which frame a detector box is expressed in.
//!
//! Detector boxes arrive either in source-image pixels or as fractions of the
//! image size. The uninhabited markers below tag boxes with their frame, and
//! [`Space::NAME`] is the spelling used for that frame in detections
//! documents and debug output.

/// A coordinate frame a box can be tagged with.
pub trait Space: Copy + private::Sealed {
    /// Lowercase frame name, as written in a document's `box_space`.
    const NAME: &'static str;
}

/// Source-image pixels, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Fractions (0.0 to 1.0) of the source image width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl Space for Pixel {
    const NAME: &'static str = "pixel";
}

impl Space for Normalized {
    const NAME: &'static str = "normalized";
}

mod private {
    pub trait Sealed {}

    impl Sealed for super::Pixel {}
    impl Sealed for super::Normalized {}
}
