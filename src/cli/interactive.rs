//! Interactive configuration menu

use dialoguer::{Confirm, Input, Select};
use std::io;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use super::App;
use crate::config::AutomationConfig;
use crate::desktop::{DesktopManager, Point, WindowTarget};
use crate::error::{AppError, Result};
use crate::models::{Action, DEFAULT_THRESHOLD, DEFAULT_WAIT_SECONDS, MAX_SECONDS};

const DEFAULT_CONFIG_FILE: &str = "automation_config.json";
const POSITION_COUNTDOWN: Duration = Duration::from_secs(3);

const MENU: [&str; 6] = [
    "Add action",
    "Remove action",
    "Save configuration",
    "Load configuration",
    "Start automation",
    "Exit",
];

const ACTION_KINDS: [&str; 5] = [
    "Click on text",
    "Click on template image",
    "Click at position",
    "Type text",
    "Wait",
];

fn prompt_error(e: dialoguer::Error) -> AppError {
    match e {
        dialoguer::Error::IO(e) if e.kind() == io::ErrorKind::Interrupted => AppError::UserCancelled,
        e => AppError::Internal(anyhow::anyhow!("Prompt failed: {}", e)),
    }
}

fn ask_select(prompt: &str, items: &[String]) -> Result<usize> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()
        .map_err(prompt_error)
}

fn ask_text(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_error)
}

fn ask_path(prompt: &str) -> Result<PathBuf> {
    Input::<String>::new()
        .with_prompt(prompt)
        .default(DEFAULT_CONFIG_FILE.to_string())
        .interact_text()
        .map(PathBuf::from)
        .map_err(prompt_error)
}

fn ask_seconds(prompt: &str, default: f64) -> Result<f64> {
    Input::<f64>::new()
        .with_prompt(prompt)
        .default(default)
        .validate_with(|v: &f64| {
            if (0.0..=MAX_SECONDS).contains(v) {
                Ok(())
            } else {
                Err("enter a number of seconds between 0 and 86400")
            }
        })
        .interact_text()
        .map_err(prompt_error)
}

fn ask_confirm(prompt: &str, default: bool) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(prompt_error)
}

/// Ask whether to continue with full-screen bounds for a window that could
/// not be located
pub fn confirm_fullscreen() -> Result<bool> {
    ask_confirm(
        "Could not determine the window position. Use full-screen bounds instead? (clicks may be inaccurate)",
        false,
    )
}

/// Select a window, prompt for settings, then loop over the menu.
///
/// Returns whether the process should exit successfully: the run's outcome
/// when automation was started, `true` otherwise.
pub fn setup(app: &mut App) -> Result<bool> {
    let (manager, target) = app.select_target()?;

    let mut config = AutomationConfig {
        debug_mode: app.cli.debug,
        ..AutomationConfig::default()
    };

    println!("\nGeneral settings");
    config.interval_seconds = ask_seconds("Interval between actions (seconds)", config.interval_seconds)?;
    config.debug_mode = ask_confirm("Enable debug mode?", config.debug_mode)?;
    config.loop_actions = ask_confirm("Loop actions?", config.loop_actions)?;

    let menu: Vec<String> = MENU.iter().map(|s| s.to_string()).collect();
    loop {
        if app.is_cancelled() {
            println!("Setup cancelled");
            return Ok(true);
        }

        print_actions(&config);
        match ask_select("Choose an option", &menu)? {
            0 => {
                if let Some(action) = prompt_action(&manager, &target)? {
                    println!("Added: {}", action);
                    config.actions.push(action);
                }
            }
            1 => remove_action(&mut config)?,
            2 => {
                let path = ask_path("Save to")?;
                if let Err(e) = config.save(&path) {
                    println!("Error: {}", e);
                }
            }
            3 => {
                let path = ask_path("Load from")?;
                match AutomationConfig::load(&path) {
                    Ok(loaded) => {
                        config = loaded;
                        println!("Loaded {} actions", config.actions.len());
                    }
                    Err(e) => println!("Error: {}", e),
                }
            }
            4 => {
                if let Err(e) = config.validate() {
                    println!("Cannot start: {}", e);
                    continue;
                }
                let report = app.start(config, manager, target)?;
                return Ok(report.status.is_success());
            }
            _ => return Ok(true),
        }
    }
}

fn print_actions(config: &AutomationConfig) {
    println!("\nCurrent actions:");
    if config.actions.is_empty() {
        println!("  (none)");
    }
    for (i, action) in config.actions.iter().enumerate() {
        println!("  {}. {}", i + 1, action);
    }
}

fn remove_action(config: &mut AutomationConfig) -> Result<()> {
    if config.actions.is_empty() {
        println!("No actions to remove");
        return Ok(());
    }
    let items: Vec<String> = config.actions.iter().map(|a| a.to_string()).collect();
    let index = ask_select("Remove which action?", &items)?;
    let removed = config.actions.remove(index);
    println!("Removed: {}", removed);
    Ok(())
}

/// A pointer read that failed is reported and skipped so the menu goes on
fn captured_position(read: anyhow::Result<Point>) -> Option<Point> {
    match read {
        Ok(point) => Some(point),
        Err(e) => {
            tracing::warn!("Pointer read failed: {:#}", e);
            println!("Could not get mouse position: {}", e);
            None
        }
    }
}

/// Prompt for one action. `None` when the entered values are invalid.
fn prompt_action(manager: &DesktopManager, target: &WindowTarget) -> Result<Option<Action>> {
    let kinds: Vec<String> = ACTION_KINDS.iter().map(|s| s.to_string()).collect();
    let action = match ask_select("Action type", &kinds)? {
        0 => Action::ClickText {
            text: ask_text("Text to click")?,
            required: ask_confirm("Required?", false)?,
        },
        1 => Action::ClickTemplate {
            template_path: PathBuf::from(ask_text("Template image path")?),
            threshold: Input::<f64>::new()
                .with_prompt("Match threshold (0.0-1.0)")
                .default(DEFAULT_THRESHOLD)
                .validate_with(|v: &f64| {
                    if (0.0..=1.0).contains(v) {
                        Ok(())
                    } else {
                        Err("threshold must be between 0.0 and 1.0")
                    }
                })
                .interact_text()
                .map_err(prompt_error)?,
            required: ask_confirm("Required?", false)?,
        },
        2 => {
            println!(
                "Move the pointer to the position to click. Capturing in {} seconds...",
                POSITION_COUNTDOWN.as_secs()
            );
            thread::sleep(POSITION_COUNTDOWN);
            let current = manager.target(target.id).unwrap_or_else(|_| target.clone());
            let Some(point) = captured_position(manager.pointer_relative_to(&current)) else {
                return Ok(None);
            };
            println!("Captured position ({}, {}) relative to the window", point.x, point.y);
            Action::ClickPosition {
                x: point.x,
                y: point.y,
                required: ask_confirm("Required?", false)?,
            }
        }
        3 => Action::TypeText {
            text: ask_text("Text to type")?,
            required: ask_confirm("Required?", false)?,
        },
        _ => Action::Wait {
            duration_seconds: ask_seconds("Wait duration (seconds)", DEFAULT_WAIT_SECONDS)?,
        },
    };

    match action.validate() {
        Ok(()) => Ok(Some(action)),
        Err(e) => {
            println!("Not added: {}", e);
            Ok(None)
        }
    }
}
