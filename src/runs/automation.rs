use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::executor::ActionExecutor;
use super::models::{ActionFailure, RunReport, RunStatus};
use super::session::Session;
use super::sleep::seconds;
use crate::config::AutomationConfig;
use crate::error::{AppError, Result};

/// Drives the action sequence until it completes, a required action fails,
/// or the cancel flag is raised.
///
/// The flag is only checked between actions; an action in flight runs to
/// completion.
pub struct AutomationLoop {
    config: AutomationConfig,
    executor: ActionExecutor,
    cancel: Arc<AtomicBool>,
}

impl AutomationLoop {
    pub fn new(config: AutomationConfig, cancel: Arc<AtomicBool>) -> Self {
        let executor = ActionExecutor::new(&config);
        Self {
            config,
            executor,
            cancel,
        }
    }

    /// Replace the executor, e.g. to shorten backoffs
    pub fn with_executor(mut self, executor: ActionExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Run the sequence against `session`. The session is released before
    /// this returns, whatever the outcome.
    pub fn run(&self, session: &mut Session) -> Result<RunReport> {
        let actions = &self.config.actions;
        if actions.is_empty() {
            session.release();
            return Err(AppError::ConfigError("No actions to run".to_string()));
        }

        let mut report = RunReport::new(uuid::Uuid::new_v4().to_string());
        let span = tracing::info_span!("run", run_id = %report.run_id);
        let _enter = span.enter();

        tracing::info!(
            "Starting automation with {} actions (loop: {}, interval: {}s)",
            actions.len(),
            self.config.loop_actions,
            self.config.interval_seconds
        );

        let interval = seconds(self.config.interval_seconds);
        let mut index = 0;
        session.set_running(true);

        let status = loop {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!("Automation cancelled");
                break RunStatus::Cancelled;
            }

            let action = &actions[index];
            let result = match session.refresh_geometry() {
                Ok(_) => self.executor.execute(index, action, session),
                Err(e) => Err(ActionFailure::new(index, action, 0, e)),
            };
            report.actions_executed += 1;

            if let Err(failure) = result {
                let required = failure.required;
                if required {
                    tracing::error!("Required {}, stopping automation", failure);
                } else {
                    tracing::warn!("Optional {}, continuing", failure);
                }
                report.record_failure(failure);
                if required {
                    break RunStatus::StoppedOnRequiredFailure;
                }
            }

            index = (index + 1) % actions.len();
            if index == 0 {
                report.completed_passes += 1;
                if !self.config.loop_actions {
                    tracing::info!("Completed all actions");
                    break RunStatus::CompletedAllActions;
                }
            }

            session.sleep(interval);
        };

        session.release();
        report.finish(status);
        tracing::info!(
            status = %report.status,
            executed = report.actions_executed,
            failures = report.failure_count,
            duration_ms = report.duration_ms().unwrap_or_default(),
            "Automation stopped"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desktop::{Point, Rect};
    use crate::models::Action;
    use crate::runs::models::RETAINED_FAILURES;
    use crate::runs::testing::Harness;
    use std::time::Duration;

    fn click(x: i32, y: i32, required: bool) -> Action {
        Action::ClickPosition { x, y, required }
    }

    fn missing_text(required: bool) -> Action {
        Action::ClickText {
            text: "nowhere".to_string(),
            required,
        }
    }

    fn config(actions: Vec<Action>, loop_actions: bool) -> AutomationConfig {
        AutomationConfig {
            interval_seconds: 0.5,
            activate_window: false,
            retry_count: 2,
            loop_actions,
            actions,
            ..AutomationConfig::default()
        }
    }

    fn automation(config: AutomationConfig) -> AutomationLoop {
        AutomationLoop::new(config, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_single_pass_runs_each_action_once_in_order() {
        let harness = Harness::new(Rect::new(100, 100, 50, 50));
        let mut session = harness.session();
        let actions = vec![click(1, 1, false), click(2, 2, false), click(3, 3, false)];

        let report = automation(config(actions, false)).run(&mut session).unwrap();

        assert_eq!(report.status, RunStatus::CompletedAllActions);
        assert_eq!(report.actions_executed, 3);
        assert_eq!(report.completed_passes, 1);
        assert_eq!(
            harness.clicks(),
            vec![Point::new(101, 101), Point::new(102, 102), Point::new(103, 103)]
        );
        // interval after every action but the last
        assert_eq!(harness.sleeps(), vec![Duration::from_millis(500); 2]);
        assert_eq!(harness.releases(), 1);
        assert!(session.is_released());
    }

    #[test]
    fn test_required_failure_stops_loop() {
        let harness = Harness::new(Rect::new(0, 0, 50, 50));
        let mut session = harness.session();
        let actions = vec![click(1, 1, false), missing_text(true), click(3, 3, false)];

        let report = automation(config(actions, true)).run(&mut session).unwrap();

        assert_eq!(report.status, RunStatus::StoppedOnRequiredFailure);
        assert_eq!(harness.clicks(), vec![Point::new(1, 1)]);
        let failure = report.stopping_failure().unwrap();
        assert_eq!(failure.index, 1);
        assert_eq!(failure.attempts, 2);
        assert!(matches!(failure.error, AppError::DetectionFailure { attempts: 2, .. }));
        assert_eq!(harness.releases(), 1);
    }

    #[test]
    fn test_optional_failure_continues() {
        let harness = Harness::new(Rect::new(0, 0, 50, 50));
        let mut session = harness.session();
        let actions = vec![missing_text(false), click(7, 8, true)];

        let report = automation(config(actions, false)).run(&mut session).unwrap();

        assert_eq!(report.status, RunStatus::CompletedAllActions);
        assert_eq!(report.failure_count, 1);
        assert!(report.stopping_failure().is_none());
        assert_eq!(harness.clicks(), vec![Point::new(7, 8)]);
    }

    #[test]
    fn test_geometry_failure_counts_as_action_failure() {
        let harness = Harness::new(Rect::new(0, 0, 50, 50)).with_failing_geometry();
        let mut session = harness.session();
        let actions = vec![click(1, 1, false), click(2, 2, true)];

        let report = automation(config(actions, true)).run(&mut session).unwrap();

        assert_eq!(report.status, RunStatus::StoppedOnRequiredFailure);
        assert_eq!(report.failure_count, 2);
        assert!(matches!(report.recent_failures[0].error, AppError::ResourceUnavailable(_)));
        assert!(harness.clicks().is_empty());
    }

    #[test]
    fn test_looping_run_stops_on_cancel() {
        let cancel = Arc::new(AtomicBool::new(false));
        let harness = Harness::new(Rect::new(0, 0, 50, 50)).cancel_after_sleeps(5, Arc::clone(&cancel));
        let mut session = harness.session();
        let actions = vec![click(1, 1, false), click(2, 2, false)];

        let report = AutomationLoop::new(config(actions, true), cancel)
            .run(&mut session)
            .unwrap();

        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.actions_executed, 5);
        assert_eq!(report.completed_passes, 2);
        assert_eq!(harness.clicks().len(), 5);
        assert_eq!(harness.releases(), 1);
    }

    #[test]
    fn test_long_run_retains_bounded_failures() {
        let cancel = Arc::new(AtomicBool::new(false));
        let harness = Harness::new(Rect::new(0, 0, 50, 50)).cancel_after_sleeps(200, Arc::clone(&cancel));
        let mut session = harness.session();
        let executor = ActionExecutor {
            retry_count: 1,
            ..ActionExecutor::default()
        };

        let report = AutomationLoop::new(config(vec![missing_text(false)], true), cancel)
            .with_executor(executor)
            .run(&mut session)
            .unwrap();

        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.completed_passes, 200);
        assert_eq!(report.failure_count, 200);
        assert_eq!(report.recent_failures.len(), RETAINED_FAILURES);
        assert!(report.last_failure().is_some());
    }

    #[test]
    fn test_cancel_before_start_runs_nothing() {
        let harness = Harness::new(Rect::new(0, 0, 50, 50));
        let mut session = harness.session();

        let report = AutomationLoop::new(config(vec![click(1, 1, true)], true), Arc::new(AtomicBool::new(true)))
            .run(&mut session)
            .unwrap();

        assert_eq!(report.status, RunStatus::Cancelled);
        assert_eq!(report.actions_executed, 0);
        assert_eq!(harness.releases(), 1);
    }

    #[test]
    fn test_empty_sequence_is_config_error() {
        let harness = Harness::new(Rect::new(0, 0, 50, 50));
        let mut session = harness.session();

        let err = automation(config(Vec::new(), false)).run(&mut session).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert_eq!(harness.releases(), 1);
    }
}
