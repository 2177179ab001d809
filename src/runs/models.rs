use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::Action;

/// How an automation run ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    CompletedAllActions,
    StoppedOnRequiredFailure,
    Cancelled,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::CompletedAllActions => "completed_all_actions",
            RunStatus::StoppedOnRequiredFailure => "stopped_on_required_failure",
            RunStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the run ended without a required action failing
    pub fn is_success(&self) -> bool {
        matches!(self, RunStatus::CompletedAllActions | RunStatus::Cancelled)
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed_all_actions" => Ok(RunStatus::CompletedAllActions),
            "stopped_on_required_failure" => Ok(RunStatus::StoppedOnRequiredFailure),
            "cancelled" => Ok(RunStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action that did not succeed
#[derive(Debug)]
pub struct ActionFailure {
    /// Position of the action in the configured list
    pub index: usize,
    pub action: String,
    pub required: bool,
    /// Detection attempts made; zero when the action failed before detecting
    pub attempts: u32,
    pub error: AppError,
}

impl ActionFailure {
    pub fn new(index: usize, action: &Action, attempts: u32, error: AppError) -> Self {
        Self {
            index,
            action: action.to_string(),
            required: action.required(),
            attempts,
            error,
        }
    }
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "action {} ({}) failed after {} attempts: {}",
            self.index + 1,
            self.action,
            self.attempts,
            self.error
        )
    }
}

/// Failures kept in a report; older ones only count towards `failure_count`
pub const RETAINED_FAILURES: usize = 16;

/// Summary of one run of the automation loop
#[derive(Debug)]
pub struct RunReport {
    pub run_id: String,
    pub status: RunStatus,
    pub actions_executed: usize,
    pub completed_passes: usize,
    /// Every failure of the run, including those no longer retained
    pub failure_count: usize,
    /// The most recent failures, oldest first, at most `RETAINED_FAILURES`.
    /// The last one is the stopping failure when status is
    /// `StoppedOnRequiredFailure`.
    pub recent_failures: VecDeque<ActionFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            status: RunStatus::Running,
            actions_executed: 0,
            completed_passes: 0,
            failure_count: 0,
            recent_failures: VecDeque::with_capacity(RETAINED_FAILURES),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self, failure: ActionFailure) {
        self.failure_count += 1;
        if self.recent_failures.len() == RETAINED_FAILURES {
            self.recent_failures.pop_front();
        }
        self.recent_failures.push_back(failure);
    }

    pub fn last_failure(&self) -> Option<&ActionFailure> {
        self.recent_failures.back()
    }

    /// The required failure that stopped the run, if any
    pub fn stopping_failure(&self) -> Option<&ActionFailure> {
        match self.status {
            RunStatus::StoppedOnRequiredFailure => self.last_failure(),
            _ => None,
        }
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds())
    }
}
