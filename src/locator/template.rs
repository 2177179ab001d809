//! Image template matching by zero-mean normalized cross-correlation

use image::{imageops, GrayImage, RgbaImage};
use image::Luma;
use imageproc::definitions::Image;
use imageproc::integral_image::{integral_image, integral_squared_image, sum_image_pixels};
use std::path::Path;

use crate::desktop::types::Point;
use crate::error::{AppError, Result};
use crate::models::{MatchResult, MatchSource};

/// Read a template image from disk as luminance
pub fn load_template(path: &Path) -> Result<GrayImage> {
    let image = image::open(path).map_err(|e| AppError::TemplateUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(image.to_luma8())
}

/// Best zero-mean normalized cross-correlation of `template` over `image`:
/// top-left corner and score in `[-1, 1]`. `None` when the template does
/// not fit inside the image.
///
/// Both the template and each window have their mean removed, so a flat
/// region or a flat template scores 0 instead of correlating with any
/// bright background. Ties keep the first position in row-major order.
pub fn best_match(image: &GrayImage, template: &GrayImage) -> Option<(Point, f64)> {
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > image.width() || th > image.height() {
        return None;
    }

    let n = f64::from(tw * th);
    let template_mean = template.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / n;
    let centered: Vec<f64> = template.pixels().map(|p| f64::from(p.0[0]) - template_mean).collect();
    let template_energy: f64 = centered.iter().map(|v| v * v).sum();

    let sums: Image<Luma<u64>> = integral_image(image);
    let squares: Image<Luma<u64>> = integral_squared_image(image);

    let mut best: Option<(Point, f64)> = None;
    for y in 0..=image.height() - th {
        for x in 0..=image.width() - tw {
            let sum = sum_image_pixels(&sums, x, y, x + tw - 1, y + th - 1)[0] as f64;
            let sum_sq = sum_image_pixels(&squares, x, y, x + tw - 1, y + th - 1)[0] as f64;
            let window_energy = sum_sq - sum * sum / n;

            let score = if template_energy <= f64::EPSILON || window_energy <= f64::EPSILON {
                0.0
            } else {
                let mut cross = 0.0;
                for ty in 0..th {
                    let row = &centered[(ty * tw) as usize..((ty + 1) * tw) as usize];
                    for (tx, t) in row.iter().enumerate() {
                        cross += f64::from(image.get_pixel(x + tx as u32, y + ty).0[0]) * t;
                    }
                }
                (cross / (template_energy * window_energy).sqrt()).clamp(-1.0, 1.0)
            };

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((Point::new(x as i32, y as i32), score));
            }
        }
    }
    best
}

/// A score counts as a hit when it reaches the threshold (inclusive)
pub fn accepts(score: f64, threshold: f64) -> bool {
    score >= threshold
}

/// Locate `template` in a capture, returning the center of the best match
/// if it scores at least `threshold`
pub fn find_template(screenshot: &RgbaImage, template: &GrayImage, threshold: f64) -> Option<MatchResult> {
    let gray = imageops::grayscale(screenshot);
    let Some((top_left, score)) = best_match(&gray, template) else {
        tracing::debug!(
            template_size = ?template.dimensions(),
            capture_size = ?gray.dimensions(),
            "Template does not fit in capture"
        );
        return None;
    };

    if !accepts(score, threshold) {
        tracing::debug!("Template not found (best match: {:.2}, threshold: {})", score, threshold);
        return None;
    }

    let center = Point::new(
        top_left.x + (template.width() / 2) as i32,
        top_left.y + (template.height() / 2) as i32,
    );
    tracing::debug!("Found template with {:.2} confidence at ({}, {})", score, center.x, center.y);
    Some(MatchResult::new(center, MatchSource::Template))
}
