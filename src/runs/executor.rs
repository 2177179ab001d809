//! Single-action execution
//!
//! Text and template actions run a small retry state machine: each attempt
//! captures the window, asks the locator for a point, and clicks on a hit.
//! A miss sleeps `retry_backoff` and recaptures; after `retry_count`
//! attempts the action fails with `DetectionFailure`. Injection errors are
//! never retried.

use image::RgbaImage;
use std::time::{Duration, Instant};

use super::models::ActionFailure;
use super::session::Session;
use super::sleep::seconds;
use crate::config::AutomationConfig;
use crate::desktop::{KeyCode, KeyDirection, Point};
use crate::error::AppError;
use crate::locator::{template, ElementLocator};
use crate::models::{Action, MatchResult};

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_KEY_DELAY: Duration = Duration::from_millis(10);

/// Executes one action against a session
#[derive(Debug, Clone)]
pub struct ActionExecutor {
    pub retry_count: u32,
    pub activate_window: bool,
    pub retry_backoff: Duration,
    pub key_delay: Duration,
}

impl Default for ActionExecutor {
    fn default() -> Self {
        Self {
            retry_count: 3,
            activate_window: true,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            key_delay: DEFAULT_KEY_DELAY,
        }
    }
}

impl ActionExecutor {
    pub fn new(config: &AutomationConfig) -> Self {
        Self {
            retry_count: config.retry_count.max(1),
            activate_window: config.activate_window,
            ..Self::default()
        }
    }

    /// Run `action`, the `index`-th of the sequence
    pub fn execute(&self, index: usize, action: &Action, session: &mut Session) -> Result<(), ActionFailure> {
        let started = Instant::now();
        tracing::info!("Executing action {}: {}", index + 1, action);

        if self.activate_window {
            session.activate();
        }

        let result = match action {
            Action::ClickText { text, .. } => {
                let initial = self.capture_window(session);
                self.locate_and_click(session, &format!("text '{}'", text), initial, |locator, shot| {
                    locator.find_text(text, shot)
                })
            }
            Action::ClickTemplate {
                template_path,
                threshold,
                ..
            } => match template::load_template(template_path) {
                Ok(template) => {
                    let target = format!("template '{}'", template_path.display());
                    let initial = self.capture_window(session);
                    self.locate_and_click(session, &target, initial, |locator, shot| {
                        locator.find_template(&template, *threshold, shot)
                    })
                }
                Err(e) => Err((0, e)),
            },
            Action::ClickPosition { x, y, .. } => {
                let point = session.window().to_screen(Point::new(*x, *y));
                tracing::info!("Clicking at position ({}, {})", x, y);
                click(session, point).map(|_| 0).map_err(|e| (0, e))
            }
            Action::TypeText { text, .. } => self.type_text(session, text).map(|_| 0).map_err(|e| (0, e)),
            Action::Wait { duration_seconds } => {
                tracing::info!("Waiting for {} seconds", duration_seconds);
                session.sleep(seconds(*duration_seconds));
                Ok(0)
            }
        };

        match result {
            Ok(attempts) => {
                tracing::debug!(
                    attempts,
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Action {} succeeded",
                    index + 1
                );
                Ok(())
            }
            Err((attempts, error)) => Err(ActionFailure::new(index, action, attempts, error)),
        }
    }

    /// Capture the window for one detection attempt. A failed capture counts
    /// as a miss for that attempt.
    fn capture_window(&self, session: &Session) -> Option<RgbaImage> {
        match session.capture() {
            Ok(shot) => Some(shot),
            Err(e) => {
                tracing::warn!("Screen capture failed: {}", e);
                None
            }
        }
    }

    /// Retry loop for detection-based clicks.
    ///
    /// `initial` is the first attempt's capture; `None` means that capture
    /// failed and the attempt is a miss. Every later attempt recaptures after
    /// the backoff. Returns the attempt number that hit, or the attempts made
    /// alongside the error.
    pub fn locate_and_click<F>(
        &self,
        session: &mut Session,
        target: &str,
        mut initial: Option<RgbaImage>,
        mut find: F,
    ) -> Result<u32, (u32, AppError)>
    where
        F: FnMut(&ElementLocator, &RgbaImage) -> Option<MatchResult>,
    {
        let retry_count = self.retry_count.max(1);

        for attempt in 1..=retry_count {
            let shot = if attempt == 1 {
                initial.take()
            } else {
                self.capture_window(session)
            };

            if let Some(shot) = shot {
                if let Some(hit) = find(session.locator(), &shot) {
                    let point = session.window().to_screen(hit.point);
                    tracing::info!(
                        source = ?hit.source,
                        "Clicking on {} at ({}, {})",
                        target,
                        hit.point.x,
                        hit.point.y
                    );
                    click(session, point).map_err(|e| (attempt, e))?;
                    return Ok(attempt);
                }
            }

            if attempt < retry_count {
                tracing::info!(
                    "{} not found, retrying in {:.1} seconds ({}/{})",
                    target,
                    self.retry_backoff.as_secs_f64(),
                    attempt,
                    retry_count
                );
                session.sleep(self.retry_backoff);
            }
        }

        tracing::warn!("Could not find {} after {} attempts", target, retry_count);
        Err((
            retry_count,
            AppError::DetectionFailure {
                target: target.to_string(),
                attempts: retry_count,
            },
        ))
    }

    /// Type `text` key by key. Upper-case letters are wrapped in shift;
    /// characters without a key are skipped.
    fn type_text(&self, session: &mut Session, text: &str) -> crate::Result<()> {
        tracing::info!("Typing text: '{}'", text);
        for c in text.chars() {
            let Some(key) = KeyCode::from_char(c) else {
                tracing::debug!("Skipping unsupported character {:?}", c);
                continue;
            };
            let shifted = c.is_ascii_uppercase();
            let input = session.input()?;
            if shifted {
                input.key(KeyCode::Shift, KeyDirection::Down)?;
            }
            input.key(key, KeyDirection::Down)?;
            input.key(key, KeyDirection::Up)?;
            if shifted {
                input.key(KeyCode::Shift, KeyDirection::Up)?;
            }
            session.sleep(self.key_delay);
        }
        Ok(())
    }
}

fn click(session: &mut Session, point: Point) -> crate::Result<()> {
    session.input()?.click_at(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::Rect;
    use crate::models::{Detection, MatchSource};
    use crate::runs::testing::{Event, Harness};

    fn executor(retry_count: u32) -> ActionExecutor {
        ActionExecutor {
            retry_count,
            activate_window: false,
            ..ActionExecutor::default()
        }
    }

    #[test]
    fn test_click_position_is_window_relative() {
        let harness = Harness::new(Rect::new(100, 200, 800, 600));
        let mut session = harness.session();
        let action = Action::ClickPosition {
            x: 10,
            y: 20,
            required: false,
        };

        executor(3).execute(0, &action, &mut session).unwrap();
        assert_eq!(harness.events(), vec![Event::Click(Point::new(110, 220))]);
    }

    #[test]
    fn test_type_text_wraps_uppercase_in_shift() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100));
        let mut session = harness.session();
        let action = Action::TypeText {
            text: "Ab1".to_string(),
            required: false,
        };

        executor(3).execute(0, &action, &mut session).unwrap();

        use KeyDirection::{Down, Up};
        assert_eq!(
            harness.events(),
            vec![
                Event::Key(KeyCode::Shift, Down),
                Event::Key(KeyCode::Char('a'), Down),
                Event::Key(KeyCode::Char('a'), Up),
                Event::Key(KeyCode::Shift, Up),
                Event::Key(KeyCode::Char('b'), Down),
                Event::Key(KeyCode::Char('b'), Up),
                Event::Key(KeyCode::Char('1'), Down),
                Event::Key(KeyCode::Char('1'), Up),
            ]
        );
        assert_eq!(harness.sleeps().len(), 3);
    }

    #[test]
    fn test_type_text_skips_unsupported_characters() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100));
        let mut session = harness.session();
        let action = Action::TypeText {
            text: "a!é b".to_string(),
            required: false,
        };

        executor(3).execute(0, &action, &mut session).unwrap();
        let keys: Vec<KeyCode> = harness
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Key(key, KeyDirection::Down) => Some(key),
                _ => None,
            })
            .collect();
        assert_eq!(keys, vec![KeyCode::Char('a'), KeyCode::Space, KeyCode::Char('b')]);
    }

    #[test]
    fn test_detection_retries_then_fails() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100));
        let mut session = harness.session();
        let initial = session.capture().ok();
        let mut calls = 0;

        let err = executor(4)
            .locate_and_click(&mut session, "text 'Go'", initial, |_, _| {
                calls += 1;
                None
            })
            .unwrap_err();

        assert_eq!(calls, 4);
        // one capture for the caller, three recaptures
        assert_eq!(harness.captures(), 4);
        assert_eq!(harness.sleeps(), vec![Duration::from_secs(1); 3]);
        assert!(harness.events().is_empty());
        assert_eq!(err.0, 4);
        assert!(matches!(err.1, AppError::DetectionFailure { attempts: 4, .. }));
    }

    #[test]
    fn test_detection_hit_on_second_attempt() {
        let harness = Harness::new(Rect::new(50, 60, 100, 100));
        let mut session = harness.session();
        let initial = session.capture().ok();
        let mut calls = 0;

        let attempt = executor(3)
            .locate_and_click(&mut session, "text 'Go'", initial, |_, _| {
                calls += 1;
                (calls == 2).then(|| MatchResult::new(Point::new(5, 5), MatchSource::Exact))
            })
            .unwrap();

        assert_eq!(attempt, 2);
        assert_eq!(harness.captures(), 2);
        assert_eq!(harness.events(), vec![Event::Click(Point::new(55, 65))]);
    }

    #[test]
    fn test_failed_first_capture_is_a_miss() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100)).with_failing_captures(1);
        let mut session = harness.session();
        let action = Action::ClickText {
            text: "Go".to_string(),
            required: false,
        };

        let failure = executor(3).execute(0, &action, &mut session).unwrap_err();

        // the failed first capture plus one recapture per backoff
        assert_eq!(harness.captures(), 3);
        assert_eq!(harness.sleeps(), vec![Duration::from_secs(1); 2]);
        assert_eq!(failure.attempts, 3);
    }

    #[test]
    fn test_click_text_uses_locator_and_window_origin() {
        let harness = Harness::new(Rect::new(300, 400, 200, 100))
            .with_detections(vec![Detection::new("Submit", Rect::new(20, 30, 40, 10), 90.0)]);
        let mut session = harness.session();
        let action = Action::ClickText {
            text: "submit".to_string(),
            required: true,
        };

        executor(3).execute(0, &action, &mut session).unwrap();
        assert_eq!(harness.events(), vec![Event::Click(Point::new(340, 435))]);
        assert_eq!(harness.captures(), 1);
    }

    #[test]
    fn test_unreadable_template_fails_without_retry() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100));
        let mut session = harness.session();
        let action = Action::ClickTemplate {
            template_path: "/nonexistent/button.png".into(),
            threshold: 0.8,
            required: true,
        };

        let failure = executor(3).execute(4, &action, &mut session).unwrap_err();
        assert_eq!(failure.index, 4);
        assert_eq!(failure.attempts, 0);
        assert!(matches!(failure.error, AppError::TemplateUnreadable { .. }));
        assert_eq!(harness.captures(), 0);
        assert!(harness.sleeps().is_empty());
    }

    #[test]
    fn test_injection_failure_is_not_retried() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100)).with_failing_input();
        let mut session = harness.session();
        let initial = session.capture().ok();
        let mut calls = 0;

        let err = executor(3)
            .locate_and_click(&mut session, "text 'Go'", initial, |_, _| {
                calls += 1;
                Some(MatchResult::new(Point::new(1, 1), MatchSource::Exact))
            })
            .unwrap_err();

        assert_eq!(calls, 1);
        assert_eq!(err.0, 1);
        assert!(matches!(err.1, AppError::InjectionFailure(_)));
    }

    #[test]
    fn test_wait_sleeps_configured_duration() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100));
        let mut session = harness.session();

        executor(3)
            .execute(0, &Action::Wait { duration_seconds: 2.5 }, &mut session)
            .unwrap();
        assert_eq!(harness.sleeps(), vec![Duration::from_millis(2500)]);
        assert!(harness.events().is_empty());
    }

    #[test]
    fn test_activation_failure_is_not_fatal() {
        let harness = Harness::new(Rect::new(0, 0, 100, 100)).with_failing_activation();
        let mut session = harness.session();
        let exec = ActionExecutor {
            activate_window: true,
            ..executor(3)
        };

        exec.execute(
            0,
            &Action::ClickPosition {
                x: 1,
                y: 2,
                required: true,
            },
            &mut session,
        )
        .unwrap();
        assert_eq!(harness.activations(), 1);
        assert_eq!(harness.events(), vec![Event::Click(Point::new(1, 2))]);
    }
}
