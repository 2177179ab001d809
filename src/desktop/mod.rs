//! Desktop access
//!
//! Everything the automation core needs from the operating system, each
//! behind a small trait so the core can run against fakes:
//! - `WindowControl` / `WindowInfoProvider` - window geometry and activation
//! - `ScreenCapture` - pixels of a screen rectangle
//! - `InputInjector` - synthetic clicks and key presses
//!
//! `DesktopManager` handles window discovery and selection for the CLI.

pub mod input;
pub mod manager;
pub mod platform;
pub mod screenshot;
pub mod types;

pub use input::{EnigoInjector, InputInjector, KeyCode, KeyDirection};
pub use manager::DesktopManager;
pub use platform::{GeometryStrategy, GeometryStrategyKind, WindowControl, WindowInfoProvider};
pub use screenshot::{ScreenCapture, XcapCapture};
pub use types::{Point, Rect, WindowId, WindowInfo, WindowTarget};
