use serde::{Deserialize, Serialize};

use crate::desktop::types::{Point, Rect};

/// Size substituted for a degenerate OCR box before taking its center
pub const FALLBACK_BOX_SIZE: (u32, u32) = (50, 20);

/// One text token reported by a recognizer pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub text: String,
    pub bbox: Rect,
    pub confidence: f32,
}

impl Detection {
    pub fn new(text: impl Into<String>, bbox: Rect, confidence: f32) -> Self {
        Self {
            text: text.into(),
            bbox,
            confidence,
        }
    }

    /// Center of the box. Zero-sized boxes are widened to `FALLBACK_BOX_SIZE`
    /// so the point still lands on the text.
    pub fn center(&self) -> Point {
        let mut bbox = self.bbox;
        if bbox.is_empty() {
            bbox.width = FALLBACK_BOX_SIZE.0;
            bbox.height = FALLBACK_BOX_SIZE.1;
        }
        bbox.center()
    }
}

/// Which stage of element location produced a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchSource {
    Exact,
    Fuzzy,
    Fallback,
    Template,
}

/// A located element, in window-relative coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchResult {
    pub point: Point,
    pub source: MatchSource,
}

impl MatchResult {
    pub fn new(point: Point, source: MatchSource) -> Self {
        Self { point, source }
    }
}
