//! Command-line surface
//!
//! Parses arguments, checks external tools, selects the target window and
//! wires the desktop collaborators into a `Session` for the automation loop.

pub mod interactive;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{AutomationConfig, EngineConfig};
use crate::desktop::platform::{linux, FixedGeometry};
use crate::desktop::{
    DesktopManager, EnigoInjector, GeometryStrategyKind, InputInjector, Point, WindowId, WindowInfoProvider,
    WindowTarget, XcapCapture,
};
use crate::error::{AppError, Result};
use crate::locator::{ElementLocator, TesseractRecognizer};
use crate::runs::{AutomationLoop, RunReport, RunStatus, Session, ThreadSleeper};

/// Countdown before taking the window under the pointer
const PICK_COUNTDOWN: Duration = Duration::from_secs(3);

/// Raises log verbosity once a configuration asks for debug output
pub type DebugSwitch = Box<dyn Fn() + Send>;

#[derive(Parser, Debug)]
#[command(
    name = "smart-clicker",
    about = "Automate clicks and typing in a desktop window by text, image or position",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Select the target window by title (substring match)
    #[arg(long, global = true)]
    pub window_name: Option<String>,

    /// Select the target window by id (decimal or 0x-prefixed hex)
    #[arg(long, global = true, value_parser = parse_window_id)]
    pub window_id: Option<WindowId>,

    /// Verbose logging and per-pass detection reports
    #[arg(long, global = true)]
    pub debug: bool,

    /// Do not raise the window before each action
    #[arg(long, global = true)]
    pub no_activate: bool,

    /// Try this geometry strategy before the others
    #[arg(long, global = true, value_enum)]
    pub geometry_strategy: Option<GeometryStrategyKind>,

    /// Use full-screen bounds without asking when the window cannot be located
    #[arg(long, global = true)]
    pub allow_fullscreen: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a saved configuration
    Run {
        /// Configuration JSON file
        #[arg(long, short)]
        config: PathBuf,
    },

    /// Build a configuration interactively (default)
    Setup,

    /// List visible windows
    ListWindows,

    /// Click once at a window-relative position
    TestClick {
        #[arg(long, allow_negative_numbers = true)]
        x: i32,
        #[arg(long, allow_negative_numbers = true)]
        y: i32,
    },
}

fn parse_window_id(value: &str) -> std::result::Result<WindowId, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => WindowId::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid window id '{}': {}", value, e))
}

/// Process-wide state shared by every subcommand
pub struct App {
    pub cli: Cli,
    pub engine: EngineConfig,
    cancel: Arc<AtomicBool>,
    debug_switch: Option<DebugSwitch>,
}

impl App {
    pub fn new(cli: Cli, engine: EngineConfig, cancel: Arc<AtomicBool>) -> Self {
        Self {
            cli,
            engine,
            cancel,
            debug_switch: None,
        }
    }

    pub fn with_debug_switch(mut self, switch: DebugSwitch) -> Self {
        self.debug_switch = Some(switch);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Dispatch the selected subcommand. Returns whether the process should
    /// exit successfully.
    pub fn execute(&mut self) -> Result<bool> {
        check_prerequisites(&self.engine)?;

        match self.cli.command.take() {
            Some(Command::Run { config }) => {
                let config = AutomationConfig::load(&config)?;
                let (manager, target) = self.select_target()?;
                let report = self.start(config, manager, target)?;
                Ok(report.status.is_success())
            }
            Some(Command::ListWindows) => {
                self.list_windows()?;
                Ok(true)
            }
            Some(Command::TestClick { x, y }) => {
                self.test_click(Point::new(x, y))?;
                Ok(true)
            }
            Some(Command::Setup) | None => interactive::setup(self),
        }
    }

    pub fn manager(&self) -> DesktopManager {
        let kinds = GeometryStrategyKind::ordered(self.cli.geometry_strategy);
        let provider = WindowInfoProvider::from_kinds(&kinds, &self.engine.xdotool_cmd);
        DesktopManager::new(self.engine.xdotool_cmd.clone(), provider)
    }

    /// Pick the window from `--window-id`, `--window-name`, or the pointer
    pub fn select_window(&self, manager: &DesktopManager) -> Result<WindowId> {
        if let Some(id) = self.cli.window_id {
            return Ok(id);
        }
        if let Some(name) = &self.cli.window_name {
            let id = manager
                .find_by_name(name)
                .map_err(|e| AppError::ResourceUnavailable(e.to_string()))?;
            tracing::info!("Found window '{}' with id {}", name, id);
            return Ok(id);
        }

        println!(
            "Move the pointer over the target window. Selecting in {} seconds...",
            PICK_COUNTDOWN.as_secs()
        );
        let id = manager
            .pick_under_pointer(PICK_COUNTDOWN)
            .map_err(|e| AppError::ResourceUnavailable(format!("Could not pick a window: {}", e)))?;
        tracing::info!("Selected window: {} (id {})", manager.window_name(id), id);
        Ok(id)
    }

    /// Resolve the geometry of `window_id`, offering full-screen bounds when
    /// no strategy can locate it
    pub fn resolve_target(&self, manager: &mut DesktopManager, window_id: WindowId) -> Result<WindowTarget> {
        match manager.target(window_id) {
            Ok(target) => Ok(target),
            Err(AppError::ResourceUnavailable(reason)) => {
                tracing::warn!("{}", reason);
                if !self.cli.allow_fullscreen && !interactive::confirm_fullscreen()? {
                    return Err(AppError::ResourceUnavailable(reason));
                }
                let bounds = XcapCapture::primary_bounds()
                    .map_err(|e| AppError::ResourceUnavailable(format!("No screen bounds: {}", e)))?;
                tracing::warn!("Using full-screen bounds {}; clicks may land off target", bounds);
                manager
                    .provider_mut()
                    .push_fallback(Box::new(FixedGeometry::new(bounds)));
                manager.target(window_id)
            }
            Err(e) => Err(e),
        }
    }

    pub fn select_target(&self) -> Result<(DesktopManager, WindowTarget)> {
        let mut manager = self.manager();
        let id = self.select_window(&manager)?;
        let target = self.resolve_target(&mut manager, id)?;
        tracing::info!("Window {} at {}", target.id, target.geometry);
        Ok((manager, target))
    }

    /// Build a session for `target` and run `config` until it stops
    ///
    /// A Ctrl+C received before the run starts is honoured: nothing is
    /// executed and `UserCancelled` is returned.
    pub fn start(&self, config: AutomationConfig, manager: DesktopManager, target: WindowTarget) -> Result<RunReport> {
        if self.is_cancelled() {
            tracing::info!("Cancelled before the run started");
            return Err(AppError::UserCancelled);
        }

        let debug = self.cli.debug || config.debug_mode;
        if config.debug_mode {
            if let Some(switch) = &self.debug_switch {
                switch();
            }
        }

        let mut config = config;
        if self.cli.no_activate {
            config.activate_window = false;
        }

        let input = EnigoInjector::new().map_err(|e| AppError::InjectionFailure(e.to_string()))?;
        let recognizer = TesseractRecognizer::new(self.engine.tesseract_cmd.clone(), self.engine.ocr_lang.clone());
        let mut session = Session::new(
            target,
            Box::new(manager.into_provider()),
            Box::new(XcapCapture::new()),
            Box::new(input),
            ElementLocator::new(Box::new(recognizer)).with_debug(debug),
            Box::new(ThreadSleeper),
        );

        println!("Automation running. Press Ctrl+C to stop.");
        let report = AutomationLoop::new(config, Arc::clone(&self.cancel)).run(&mut session)?;
        print_report(&report);
        Ok(report)
    }

    fn list_windows(&self) -> Result<()> {
        let windows = self
            .manager()
            .list_windows()
            .map_err(|e| AppError::ResourceUnavailable(e.to_string()))?;
        if windows.is_empty() {
            println!("No visible windows found");
            return Ok(());
        }
        for window in windows {
            println!(
                "{:>10}  {:<40}  {:<20}  {}",
                window.id, window.title, window.app_name, window.bounds
            );
        }
        Ok(())
    }

    fn test_click(&self, relative: Point) -> Result<()> {
        let (_manager, target) = self.select_target()?;
        let point = target.to_screen(relative);
        let mut input = EnigoInjector::new().map_err(|e| AppError::InjectionFailure(e.to_string()))?;
        tracing::info!("Test click at ({}, {}) -> screen ({}, {})", relative.x, relative.y, point.x, point.y);
        let result = input.click_at(point);
        input.release();
        result
    }
}

/// Fail when xdotool is missing; warn when tesseract is
pub fn check_prerequisites(engine: &EngineConfig) -> Result<()> {
    if !linux::tool_available(&engine.xdotool_cmd) {
        return Err(AppError::ResourceUnavailable(format!(
            "'{}' not found. Install it with: sudo apt-get install xdotool",
            engine.xdotool_cmd
        )));
    }
    if !linux::tool_available(&engine.tesseract_cmd) {
        tracing::warn!(
            "'{}' not found; click_text actions will not find anything. Install it with: sudo apt-get install tesseract-ocr",
            engine.tesseract_cmd
        );
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!(
        "Run {} finished: {} ({} actions executed, {} failures)",
        report.run_id,
        report.status,
        report.actions_executed,
        report.failure_count
    );
    if report.status == RunStatus::StoppedOnRequiredFailure {
        if let Some(failure) = report.stopping_failure() {
            println!("Stopped: {}", failure);
        }
    }
}
