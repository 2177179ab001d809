//! Image preprocessing for OCR passes
//!
//! OCR accuracy depends heavily on contrast and background, so every text
//! search runs the recognizer over several renderings of the same capture.
//! The order of `Variant::ALL` is part of the search contract: earlier
//! variants win ties.

use image::{imageops, GrayImage, Luma, RgbaImage};
use imageproc::contrast::{adaptive_threshold, equalize_histogram, otsu_level};
use serde::Serialize;

/// Block radius for the local threshold, in pixels
const ADAPTIVE_BLOCK_RADIUS: u32 = 15;

/// Tesseract page segmentation: fully automatic layout analysis
const PSM_AUTO: u8 = 3;
/// Tesseract page segmentation: sparse text, find as much text as possible
const PSM_SPARSE: u8 = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Plain luminance
    Grayscale,
    /// Global Otsu threshold
    Binary,
    /// Local mean threshold, for uneven backgrounds
    Adaptive,
    /// Histogram equalisation
    Contrast,
    /// Luminance with sparse-text segmentation, for short isolated labels
    /// such as links and toolbar buttons
    Sparse,
}

impl Variant {
    /// Fixed pass order
    pub const ALL: [Variant; 5] = [
        Variant::Grayscale,
        Variant::Binary,
        Variant::Adaptive,
        Variant::Contrast,
        Variant::Sparse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::Grayscale => "grayscale",
            Variant::Binary => "binary",
            Variant::Adaptive => "adaptive",
            Variant::Contrast => "contrast",
            Variant::Sparse => "sparse",
        }
    }

    /// Page segmentation mode the recognizer should use for this variant
    pub fn page_segmentation(&self) -> u8 {
        match self {
            Variant::Sparse => PSM_SPARSE,
            _ => PSM_AUTO,
        }
    }

    /// Render a capture for this pass. Output has the capture's dimensions,
    /// so recognizer boxes stay in window-relative pixels.
    pub fn prepare(&self, image: &RgbaImage) -> GrayImage {
        let gray = imageops::grayscale(image);
        match self {
            Variant::Grayscale | Variant::Sparse => gray,
            Variant::Binary => {
                let level = otsu_level(&gray);
                GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
                    if gray.get_pixel(x, y).0[0] > level {
                        Luma([255])
                    } else {
                        Luma([0])
                    }
                })
            }
            Variant::Adaptive => adaptive_threshold(&gray, ADAPTIVE_BLOCK_RADIUS),
            Variant::Contrast => equalize_histogram(&gray),
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
