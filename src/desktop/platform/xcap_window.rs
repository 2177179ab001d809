use anyhow::Result;
use xcap::Window;

use super::GeometryStrategy;
use crate::desktop::types::{Rect, WindowId, WindowInfo};

/// Geometry strategy using the xcap window list (works without X11 tools)
pub struct XcapGeometry;

impl GeometryStrategy for XcapGeometry {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn resolve(&self, window_id: WindowId) -> Result<Option<Rect>> {
        let windows = Window::all().map_err(|e| anyhow::anyhow!("Failed to get windows: {}", e))?;

        Ok(windows
            .into_iter()
            .find(|w| w.id() == window_id)
            .map(|w| Rect::new(w.x(), w.y(), w.width(), w.height())))
    }
}

/// List all visible, titled windows
pub fn list_windows() -> Result<Vec<WindowInfo>> {
    let windows = Window::all().map_err(|e| anyhow::anyhow!("Failed to get windows: {}", e))?;

    Ok(windows
        .into_iter()
        .filter(|w| !w.title().is_empty() && !w.is_minimized())
        .map(|w| WindowInfo {
            id: w.id(),
            title: w.title().to_string(),
            app_name: w.app_name().to_string(),
            bounds: Rect::new(w.x(), w.y(), w.width(), w.height()),
            is_minimized: w.is_minimized(),
        })
        .collect())
}
