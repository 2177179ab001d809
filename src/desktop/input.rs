//! Synthetic mouse and keyboard input
//!
//! `InputInjector` is the seam the executor drives; `EnigoInjector` is the
//! OS-level implementation. Only one injector exists per automation session.

use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use std::thread;
use std::time::Duration;

use super::types::Point;
use crate::error::{AppError, Result};

/// Synthesizes pointer and key events at the OS input layer
pub trait InputInjector {
    /// Press and release the primary button at absolute screen coordinates
    fn click_at(&mut self, point: Point) -> Result<()>;

    /// Send a single key transition
    fn key(&mut self, key: KeyCode, direction: KeyDirection) -> Result<()>;

    /// Give the input channel back to the OS. Called once when a session ends.
    fn release(&mut self) {}
}

/// Key transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDirection {
    Down,
    Up,
}

/// Keys that can be typed by a `type_text` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCode {
    /// Unshifted printable key, stored lower-case
    Char(char),
    Space,
    Shift,
}

/// Punctuation reachable without a modifier on a US layout
const PLAIN_PUNCTUATION: &str = ",.;'[]\\-=/`";

impl KeyCode {
    /// Map a character to the key that produces it.
    ///
    /// Letters map to their lower-case key; whether shift is needed is decided
    /// by the caller from the original character. Returns `None` for
    /// characters that have no direct key.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' => Some(KeyCode::Space),
            c if c.is_ascii_alphanumeric() => Some(KeyCode::Char(c.to_ascii_lowercase())),
            c if PLAIN_PUNCTUATION.contains(c) => Some(KeyCode::Char(c)),
            _ => None,
        }
    }

    fn to_enigo(self) -> Key {
        match self {
            KeyCode::Char(c) => Key::Unicode(c),
            KeyCode::Space => Key::Space,
            KeyCode::Shift => Key::Shift,
        }
    }
}

/// Input injector backed by enigo
pub struct EnigoInjector {
    enigo: Option<Enigo>,
}

impl EnigoInjector {
    /// Open the OS input channel
    pub fn new() -> anyhow::Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| anyhow::anyhow!("Failed to create input controller: {:?}", e))?;
        Ok(Self { enigo: Some(enigo) })
    }

    fn enigo(&mut self) -> Result<&mut Enigo> {
        self.enigo
            .as_mut()
            .ok_or_else(|| AppError::InjectionFailure("input channel already released".to_string()))
    }
}

impl InputInjector for EnigoInjector {
    fn click_at(&mut self, point: Point) -> Result<()> {
        let enigo = self.enigo()?;
        enigo
            .move_mouse(point.x, point.y, Coordinate::Abs)
            .map_err(|e| AppError::InjectionFailure(format!("Failed to move pointer: {:?}", e)))?;
        thread::sleep(Duration::from_millis(50));
        enigo
            .button(Button::Left, Direction::Press)
            .map_err(|e| AppError::InjectionFailure(format!("Failed to press button: {:?}", e)))?;
        enigo
            .button(Button::Left, Direction::Release)
            .map_err(|e| AppError::InjectionFailure(format!("Failed to release button: {:?}", e)))
    }

    fn key(&mut self, key: KeyCode, direction: KeyDirection) -> Result<()> {
        let direction = match direction {
            KeyDirection::Down => Direction::Press,
            KeyDirection::Up => Direction::Release,
        };
        self.enigo()?
            .key(key.to_enigo(), direction)
            .map_err(|e| AppError::InjectionFailure(format!("Failed to send key {:?}: {:?}", key, e)))
    }

    fn release(&mut self) {
        if self.enigo.take().is_some() {
            tracing::debug!("Released input channel");
        }
    }
}
