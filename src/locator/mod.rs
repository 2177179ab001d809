//! Element location
//!
//! Finds the point to click for a text or image target inside a window
//! capture. Points are window-relative; translating them to the screen is
//! the executor's job.

pub mod ocr;
pub mod preprocess;
pub mod template;
pub mod text;

use image::{GrayImage, RgbaImage};

pub use ocr::{TesseractRecognizer, TextRecognizer};
pub use preprocess::Variant;
pub use text::{locate_text, Pass};

use crate::models::MatchResult;

/// Fuses several recognizer passes and the template matcher behind one
/// "find it or not" contract
pub struct ElementLocator {
    recognizer: Box<dyn TextRecognizer>,
    variants: Vec<Variant>,
    debug: bool,
}

impl ElementLocator {
    /// Locator running every variant in `Variant::ALL` order
    pub fn new(recognizer: Box<dyn TextRecognizer>) -> Self {
        Self {
            recognizer,
            variants: Variant::ALL.to_vec(),
            debug: false,
        }
    }

    /// Report per-pass detections at info level
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Run every recognizer pass over a capture, in pass order.
    ///
    /// A pass whose recognizer call fails contributes no detections.
    pub fn recognize(&self, screenshot: &RgbaImage) -> Vec<Pass> {
        self.variants
            .iter()
            .map(|&variant| {
                let prepared = variant.prepare(screenshot);
                let detections = match self.recognizer.recognize(&prepared, variant) {
                    Ok(detections) => detections,
                    Err(e) => {
                        tracing::warn!(%variant, "Text recognition failed: {}", e);
                        Vec::new()
                    }
                };
                if self.debug {
                    let texts: Vec<&str> = detections.iter().map(|d| d.text.as_str()).collect();
                    tracing::info!(%variant, count = detections.len(), "Detected: {:?}", texts);
                }
                Pass::new(variant, detections)
            })
            .collect()
    }

    /// Find `target` text in a capture
    pub fn find_text(&self, target: &str, screenshot: &RgbaImage) -> Option<MatchResult> {
        let passes = self.recognize(screenshot);
        let hit = locate_text(target, &passes);
        match hit {
            Some(m) if self.debug => {
                tracing::info!("Found text '{}' at ({}, {}) by {:?} match", target, m.point.x, m.point.y, m.source)
            }
            None if self.debug => tracing::info!("Text '{}' not found in window", target),
            _ => {}
        }
        hit
    }

    /// Find an image template in a capture
    pub fn find_template(&self, template: &GrayImage, threshold: f64, screenshot: &RgbaImage) -> Option<MatchResult> {
        template::find_template(screenshot, template, threshold)
    }
}
