use crate::protocol::PenaltyAction;
use crate::telemetry::{ActivityLog, MetricsRecorder};
use log::warn;
use std::{fmt, sync::Arc};

/// Reason recorded when the operator leaves the dialog field blank.
pub const DEFAULT_REASON: &str = "No reason given";

/// A command ready to be sent to the race-control server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PenaltyCommand {
    pub driver_name: String,
    pub action: PenaltyAction,
    pub reason: String,
}

/// Selection waiting in the confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPenalty {
    pub driver_name: String,
    pub action: PenaltyAction,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    AwaitingConfirmation,
    Dispatch(PenaltyCommand),
}

/// Turns operator selections into fire-and-forget commands.
///
/// Nothing here predicts the effect of a command; the next status poll is
/// the only feedback.
#[derive(Debug)]
pub struct PenaltyDispatcher {
    confirm: bool,
    pending: Option<PendingPenalty>,
    activity: ActivityLog,
    metrics: Arc<MetricsRecorder>,
}

impl PenaltyDispatcher {
    pub fn new(confirm: bool, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            confirm,
            pending: None,
            activity: ActivityLog::default(),
            metrics,
        }
    }

    pub fn pending(&self) -> Option<&PendingPenalty> {
        self.pending.as_ref()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Starts a command for `driver_name`. With confirmation enabled the
    /// selection replaces any open dialog; otherwise it dispatches at once.
    pub fn select(&mut self, driver_name: impl Into<String>, action: PenaltyAction) -> Selection {
        let driver_name = driver_name.into();
        if !self.confirm {
            return Selection::Dispatch(self.issue(driver_name, action, DEFAULT_REASON.into()));
        }

        self.pending = Some(PendingPenalty {
            driver_name,
            action,
            reason: String::new(),
        });
        Selection::AwaitingConfirmation
    }

    pub fn edit_reason(&mut self, reason: impl Into<String>) {
        if let Some(pending) = self.pending.as_mut() {
            pending.reason = reason.into();
        }
    }

    pub fn cancel(&mut self) -> Option<PendingPenalty> {
        self.pending.take()
    }

    /// Closes the dialog and yields the command to send.
    pub fn confirm(&mut self) -> Option<PenaltyCommand> {
        let pending = self.pending.take()?;
        let reason = if pending.reason.trim().is_empty() {
            DEFAULT_REASON.to_string()
        } else {
            pending.reason
        };
        Some(self.issue(pending.driver_name, pending.action, reason))
    }

    /// Notes how the server answered. Failures are logged, never surfaced.
    pub fn record_result<E: fmt::Display>(&mut self, command: &PenaltyCommand, result: Result<(), E>) {
        if let Err(err) = result {
            warn!(
                "command {} for {} was not accepted: {}",
                command.action.code(),
                command.driver_name,
                err
            );
            self.metrics.record_command_failed();
        }
    }

    fn issue(&mut self, driver_name: String, action: PenaltyAction, reason: String) -> PenaltyCommand {
        let verb = if action.is_lap_correction() {
            "Lap correction"
        } else {
            "Penalty"
        };
        self.activity
            .record(format!("{verb} {action} for {driver_name}: {reason}"));
        self.metrics.record_command_sent();
        PenaltyCommand {
            driver_name,
            action,
            reason,
        }
    }
}
