use anyhow::{anyhow, Result};
use std::thread;
use std::time::Duration;

use super::platform::{linux, xcap_window, WindowControl, WindowInfoProvider};
use super::types::{Point, WindowId, WindowInfo, WindowTarget};

/// Window discovery and selection
///
/// Used by the command surface to pick the window an automation session
/// will drive. Geometry comes from the same `WindowInfoProvider` the session
/// uses afterwards, so selection and per-action refresh agree.
pub struct DesktopManager {
    xdotool: String,
    provider: WindowInfoProvider,
}

impl DesktopManager {
    pub fn new(xdotool: impl Into<String>, provider: WindowInfoProvider) -> Self {
        Self {
            xdotool: xdotool.into(),
            provider,
        }
    }

    pub fn provider(&self) -> &WindowInfoProvider {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut WindowInfoProvider {
        &mut self.provider
    }

    pub fn into_provider(self) -> WindowInfoProvider {
        self.provider
    }

    /// Get all visible windows
    pub fn list_windows(&self) -> Result<Vec<WindowInfo>> {
        xcap_window::list_windows()
    }

    /// Title of a window, or "Unknown"
    pub fn window_name(&self, window_id: WindowId) -> String {
        linux::window_name(&self.xdotool, window_id).unwrap_or_else(|_| "Unknown".to_string())
    }

    /// Find a window by title.
    ///
    /// Tries xdotool's title search first and falls back to a case-insensitive
    /// substring match over the xcap window list.
    pub fn find_by_name(&self, name: &str) -> Result<WindowId> {
        match linux::search_by_name(&self.xdotool, name) {
            Ok(ids) if !ids.is_empty() => return Ok(ids[0]),
            Ok(_) => {}
            Err(e) => tracing::debug!("xdotool search failed: {}", e),
        }

        let name_lower = name.to_lowercase();
        self.list_windows()?
            .into_iter()
            .find(|w| w.title.to_lowercase().contains(&name_lower))
            .map(|w| w.id)
            .ok_or_else(|| anyhow!("No window found matching title: {}", name))
    }

    /// Wait `countdown`, then take the window under the pointer
    pub fn pick_under_pointer(&self, countdown: Duration) -> Result<WindowId> {
        thread::sleep(countdown);
        linux::window_under_pointer(&self.xdotool)
    }

    /// Resolve the geometry of a chosen window into a session target
    pub fn target(&self, window_id: WindowId) -> crate::error::Result<WindowTarget> {
        let geometry = self.provider.geometry(window_id)?;
        Ok(WindowTarget::new(window_id, geometry))
    }

    /// Pointer position relative to the window's top-left corner
    pub fn pointer_relative_to(&self, target: &WindowTarget) -> Result<Point> {
        let absolute = linux::pointer_location(&self.xdotool)?;
        Ok(Point::new(
            absolute.x - target.geometry.x,
            absolute.y - target.geometry.y,
        ))
    }
}
