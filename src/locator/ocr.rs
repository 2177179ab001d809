//! Text recognition through the tesseract command line
//!
//! The image is piped to `tesseract stdin stdout ... tsv` and the word rows of
//! the TSV report become `Detection`s in the order tesseract lists them.

use anyhow::{anyhow, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};
use std::io::Write;
use std::process::{Command, Stdio};

use super::preprocess::Variant;
use crate::desktop::types::Rect;
use crate::models::Detection;

/// TSV row level for individual words
const WORD_LEVEL: u32 = 5;

/// Produces text tokens with boxes and confidences from an image
pub trait TextRecognizer {
    fn recognize(&self, image: &GrayImage, variant: Variant) -> Result<Vec<Detection>>;
}

/// Recognizer that shells out to tesseract
pub struct TesseractRecognizer {
    program: String,
    lang: String,
}

impl TesseractRecognizer {
    pub fn new(program: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            lang: lang.into(),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage, variant: Variant) -> Result<Vec<Detection>> {
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::L8)
            .map_err(|e| anyhow!("Failed to encode PNG: {}", e))?;

        let psm = variant.page_segmentation().to_string();
        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "--psm", &psm, "-l", &self.lang, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow!("Failed to start {}: {}", self.program, e))?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| anyhow!("tesseract stdin unavailable"))?;
            stdin
                .write_all(&png)
                .map_err(|e| anyhow!("Failed to send image to tesseract: {}", e))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| anyhow!("Failed to read tesseract output: {}", e))?;

        if !output.status.success() {
            return Err(anyhow!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(parse_tsv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract word detections from tesseract TSV output.
///
/// Columns: level page_num block_num par_num line_num word_num
/// left top width height conf text
pub fn parse_tsv(tsv: &str) -> Vec<Detection> {
    tsv.lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split('\t').collect();
            if cols.len() < 12 {
                return None;
            }
            if cols[0].parse::<u32>().ok()? != WORD_LEVEL {
                return None;
            }
            let text = cols[11].trim();
            if text.is_empty() {
                return None;
            }
            let bbox = Rect::new(
                cols[6].parse().ok()?,
                cols[7].parse().ok()?,
                cols[8].parse().ok()?,
                cols[9].parse().ok()?,
            );
            let confidence = cols[10].parse().unwrap_or(-1.0);
            Some(Detection::new(text, bbox, confidence))
        })
        .collect()
}
