use anyhow::Result as AnyResult;

use super::types::{Rect, WindowId};
use crate::error::{AppError, Result};

pub mod linux;
pub mod xcap_window;

pub use linux::{XdotoolGeometry, XwininfoGeometry};
pub use xcap_window::XcapGeometry;

/// One way of asking the OS where a window is.
///
/// `Ok(None)` means the strategy ran but did not know the window;
/// errors mean the strategy itself is unavailable (missing tool, no display).
pub trait GeometryStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn resolve(&self, window_id: WindowId) -> AnyResult<Option<Rect>>;
}

/// Window operations the automation core needs between actions
pub trait WindowControl {
    /// Current absolute geometry of the window
    fn geometry(&self, window_id: WindowId) -> Result<Rect>;

    /// Raise and focus the window
    fn activate(&self, window_id: WindowId) -> AnyResult<()>;
}

/// Selectable geometry strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GeometryStrategyKind {
    Xdotool,
    Xwininfo,
    Xcap,
}

impl GeometryStrategyKind {
    /// Default priority order
    pub const DEFAULT_ORDER: [GeometryStrategyKind; 3] = [
        GeometryStrategyKind::Xdotool,
        GeometryStrategyKind::Xwininfo,
        GeometryStrategyKind::Xcap,
    ];

    /// Default order with `preferred` moved to the front
    pub fn ordered(preferred: Option<GeometryStrategyKind>) -> Vec<GeometryStrategyKind> {
        let mut order = Self::DEFAULT_ORDER.to_vec();
        if let Some(kind) = preferred {
            order.retain(|k| *k != kind);
            order.insert(0, kind);
        }
        order
    }
}

/// Geometry of a fixed rectangle, standing in for a window the OS could not
/// locate. Only installed after the user accepts the degraded accuracy.
pub struct FixedGeometry {
    bounds: Rect,
}

impl FixedGeometry {
    pub fn new(bounds: Rect) -> Self {
        Self { bounds }
    }
}

impl GeometryStrategy for FixedGeometry {
    fn name(&self) -> &'static str {
        "full-screen"
    }

    fn resolve(&self, _window_id: WindowId) -> AnyResult<Option<Rect>> {
        Ok(Some(self.bounds))
    }
}

/// Resolves window geometry through an ordered list of strategies.
/// The first strategy that returns a non-empty rectangle wins.
pub struct WindowInfoProvider {
    strategies: Vec<Box<dyn GeometryStrategy>>,
    xdotool_cmd: String,
}

impl WindowInfoProvider {
    pub fn new(strategies: Vec<Box<dyn GeometryStrategy>>, xdotool_cmd: impl Into<String>) -> Self {
        Self {
            strategies,
            xdotool_cmd: xdotool_cmd.into(),
        }
    }

    /// Build the platform strategies in the given order
    pub fn from_kinds(kinds: &[GeometryStrategyKind], xdotool_cmd: &str) -> Self {
        let strategies = kinds
            .iter()
            .map(|kind| -> Box<dyn GeometryStrategy> {
                match kind {
                    GeometryStrategyKind::Xdotool => Box::new(XdotoolGeometry::new(xdotool_cmd)),
                    GeometryStrategyKind::Xwininfo => Box::new(XwininfoGeometry::new()),
                    GeometryStrategyKind::Xcap => Box::new(XcapGeometry),
                }
            })
            .collect();
        Self::new(strategies, xdotool_cmd)
    }

    /// Append a last-resort strategy (full-screen bounds)
    pub fn push_fallback(&mut self, strategy: Box<dyn GeometryStrategy>) {
        self.strategies.push(strategy);
    }

    /// Try every strategy in order, returning the winner's rectangle
    pub fn resolve(&self, window_id: WindowId) -> Option<(Rect, &'static str)> {
        for strategy in &self.strategies {
            match strategy.resolve(window_id) {
                Ok(Some(rect)) if !rect.is_empty() => {
                    tracing::debug!(strategy = strategy.name(), %rect, "Resolved window geometry");
                    return Some((rect, strategy.name()));
                }
                Ok(Some(rect)) => {
                    tracing::debug!(strategy = strategy.name(), %rect, "Ignoring empty window geometry");
                }
                Ok(None) => {
                    tracing::debug!(strategy = strategy.name(), window_id, "Window unknown to strategy");
                }
                Err(e) => {
                    tracing::debug!(strategy = strategy.name(), "Geometry strategy failed: {}", e);
                }
            }
        }
        None
    }
}

impl WindowControl for WindowInfoProvider {
    fn geometry(&self, window_id: WindowId) -> Result<Rect> {
        self.resolve(window_id)
            .map(|(rect, _)| rect)
            .ok_or_else(|| {
                AppError::ResourceUnavailable(format!("could not resolve geometry of window {}", window_id))
            })
    }

    fn activate(&self, window_id: WindowId) -> AnyResult<()> {
        linux::activate_window(&self.xdotool_cmd, window_id)
    }
}
