//! Screen capture using xcap
//!
//! Captures the monitor that contains a rectangle and crops it down, so a
//! window is captured as it appears on screen (including anything on top).

use image::{imageops, RgbaImage};
use xcap::Monitor;

use super::types::Rect;

/// Returns the pixels of a screen rectangle
pub trait ScreenCapture {
    fn capture(&self, rect: Rect) -> anyhow::Result<RgbaImage>;
}

/// Screen capture backed by xcap monitors
#[derive(Debug, Default)]
pub struct XcapCapture;

impl XcapCapture {
    pub fn new() -> Self {
        Self
    }

    /// Bounds of the primary monitor, used as a degraded stand-in for a
    /// window whose geometry cannot be resolved
    pub fn primary_bounds() -> anyhow::Result<Rect> {
        let monitors = Monitor::all().map_err(|e| anyhow::anyhow!("Failed to get monitors: {}", e))?;

        let primary = monitors
            .into_iter()
            .find(|m| m.is_primary())
            .ok_or_else(|| anyhow::anyhow!("No primary monitor found"))?;

        Ok(Rect::new(primary.x(), primary.y(), primary.width(), primary.height()))
    }
}

impl ScreenCapture for XcapCapture {
    fn capture(&self, rect: Rect) -> anyhow::Result<RgbaImage> {
        let monitors = Monitor::all().map_err(|e| anyhow::anyhow!("Failed to get monitors: {}", e))?;

        let monitor = monitors
            .iter()
            .find(|m| Rect::new(m.x(), m.y(), m.width(), m.height()).contains(rect.x, rect.y))
            .or_else(|| monitors.iter().find(|m| m.is_primary()))
            .ok_or_else(|| anyhow::anyhow!("No monitor contains ({}, {})", rect.x, rect.y))?;

        let bounds = Rect::new(monitor.x(), monitor.y(), monitor.width(), monitor.height());
        let (x, y, width, height) = crop_region(bounds, rect)
            .ok_or_else(|| anyhow::anyhow!("Rectangle ({}) is outside monitor ({})", rect, bounds))?;

        let image = monitor
            .capture_image()
            .map_err(|e| anyhow::anyhow!("Failed to capture screen: {}", e))?;

        Ok(imageops::crop_imm(&image, x, y, width, height).to_image())
    }
}

/// Intersect `rect` with `monitor` and express it in monitor-local pixels
fn crop_region(monitor: Rect, rect: Rect) -> Option<(u32, u32, u32, u32)> {
    let left = rect.x.max(monitor.x) as i64;
    let top = rect.y.max(monitor.y) as i64;
    let right = (rect.x as i64 + rect.width as i64).min(monitor.x as i64 + monitor.width as i64);
    let bottom = (rect.y as i64 + rect.height as i64).min(monitor.y as i64 + monitor.height as i64);

    if right <= left || bottom <= top {
        return None;
    }

    Some((
        (left - monitor.x as i64) as u32,
        (top - monitor.y as i64) as u32,
        (right - left) as u32,
        (bottom - top) as u32,
    ))
}
