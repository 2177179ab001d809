use image::RgbaImage;
use std::time::Duration;

use super::sleep::Sleeper;
use crate::desktop::{InputInjector, Rect, ScreenCapture, WindowControl, WindowTarget};
use crate::error::{AppError, Result};
use crate::locator::ElementLocator;

/// State and collaborators of one automation run.
///
/// The session owns the only input injector for the run. It is released
/// exactly once: explicitly when the loop ends, or on drop if the loop never
/// got that far.
pub struct Session {
    window: WindowTarget,
    running: bool,
    windows: Box<dyn WindowControl>,
    capture: Box<dyn ScreenCapture>,
    input: Box<dyn InputInjector>,
    released: bool,
    locator: ElementLocator,
    sleeper: Box<dyn Sleeper>,
}

impl Session {
    pub fn new(
        window: WindowTarget,
        windows: Box<dyn WindowControl>,
        capture: Box<dyn ScreenCapture>,
        input: Box<dyn InputInjector>,
        locator: ElementLocator,
        sleeper: Box<dyn Sleeper>,
    ) -> Self {
        Self {
            window,
            running: false,
            windows,
            capture,
            input,
            released: false,
            locator,
            sleeper,
        }
    }

    pub fn window(&self) -> &WindowTarget {
        &self.window
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Re-query the window geometry; the window may have moved since the
    /// last action
    pub fn refresh_geometry(&mut self) -> Result<Rect> {
        let geometry = self.windows.geometry(self.window.id)?;
        if geometry != self.window.geometry {
            tracing::debug!(from = %self.window.geometry, to = %geometry, "Window geometry changed");
        }
        self.window.geometry = geometry;
        Ok(geometry)
    }

    /// Raise the window. Failure is logged and otherwise ignored.
    pub fn activate(&self) {
        if let Err(e) = self.windows.activate(self.window.id) {
            tracing::warn!("Could not activate window {}: {}", self.window.id, e);
        }
    }

    /// Capture the window's current rectangle
    pub fn capture(&self) -> anyhow::Result<RgbaImage> {
        self.capture.capture(self.window.geometry)
    }

    pub fn locator(&self) -> &ElementLocator {
        &self.locator
    }

    /// The input channel, unless the session has been released
    pub fn input(&mut self) -> Result<&mut dyn InputInjector> {
        if self.released {
            return Err(AppError::InjectionFailure("session input already released".to_string()));
        }
        Ok(self.input.as_mut())
    }

    pub fn sleep(&self, duration: Duration) {
        self.sleeper.sleep(duration);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Hand the input channel back. Later calls are no-ops.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.running = false;
        self.input.release();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}
