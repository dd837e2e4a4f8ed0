use crate::protocol::StatusSnapshot;
use crate::telemetry::MetricsRecorder;
use log::{debug, warn};
use std::{fmt, sync::Arc, time::Duration};

/// Proof that a status request was started by [`StatusPoller::begin_poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    cycle: u64,
}

impl PollTicket {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

/// What [`StatusPoller::complete`] did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new snapshot replaced the previous one.
    Published { vehicles: usize },
    /// The request failed; the previous snapshot stays on screen.
    Failed(String),
    /// The ticket did not belong to the request in flight and was ignored.
    Stale,
}

/// Owner of the poll cadence, the in-flight guard and the published snapshot.
///
/// `begin_poll` is the only way to start a request and `complete` is the only
/// place the snapshot changes. A request that never completes keeps every
/// later tick skipped.
#[derive(Debug)]
pub struct StatusPoller {
    interval: Duration,
    in_flight: Option<u64>,
    next_cycle: u64,
    snapshot: Option<StatusSnapshot>,
    metrics: Arc<MetricsRecorder>,
}

impl StatusPoller {
    pub fn new(interval: Duration, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            interval,
            in_flight: None,
            next_cycle: 0,
            snapshot: None,
            metrics,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn snapshot(&self) -> Option<&StatusSnapshot> {
        self.snapshot.as_ref()
    }

    /// Called on every tick. Returns `None` while the previous request is unresolved.
    pub fn begin_poll(&mut self) -> Option<PollTicket> {
        if let Some(cycle) = self.in_flight {
            debug!("status request {} still in flight, skipping tick", cycle);
            self.metrics.record_poll_skipped();
            return None;
        }

        let cycle = self.next_cycle;
        self.next_cycle += 1;
        self.in_flight = Some(cycle);
        self.metrics.record_poll_issued();
        Some(PollTicket { cycle })
    }

    /// Resolves the request behind `ticket`. Successful snapshots are ranked by
    /// position and replace the published one wholesale.
    pub fn complete<E: fmt::Display>(
        &mut self,
        ticket: PollTicket,
        result: Result<StatusSnapshot, E>,
    ) -> PollOutcome {
        if self.in_flight != Some(ticket.cycle) {
            return PollOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(snapshot) => {
                let snapshot = snapshot.ranked();
                let vehicles = snapshot.vehicles.len();
                self.snapshot = Some(snapshot);
                PollOutcome::Published { vehicles }
            }
            Err(err) => {
                warn!("status poll {} failed: {}", ticket.cycle, err);
                self.metrics.record_poll_failed();
                PollOutcome::Failed(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Vehicle;

    fn poller() -> StatusPoller {
        StatusPoller::new(Duration::from_millis(500), Arc::new(MetricsRecorder::new()))
    }

    fn snapshot(positions: &[u32]) -> StatusSnapshot {
        StatusSnapshot {
            name: "Sprint".into(),
            vehicles: positions
                .iter()
                .map(|&position| Vehicle {
                    position,
                    driver_name: format!("driver {position}"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn tick_while_in_flight_issues_nothing() {
        let mut poller = poller();
        let first = poller.begin_poll();
        assert!(first.is_some());
        assert!(poller.is_in_flight());
        assert_eq!(poller.begin_poll(), None);
        assert_eq!(poller.begin_poll(), None);

        let metrics = poller.metrics.snapshot();
        assert_eq!(metrics.polls_issued, 1);
        assert_eq!(metrics.polls_skipped, 2);
    }

    #[test]
    fn completion_publishes_ranked_snapshot() {
        let mut poller = poller();
        let ticket = poller.begin_poll().unwrap();
        let outcome = poller.complete::<String>(ticket, Ok(snapshot(&[3, 1, 2])));
        assert_eq!(outcome, PollOutcome::Published { vehicles: 3 });
        assert!(!poller.is_in_flight());

        let positions: Vec<u32> = poller
            .snapshot()
            .unwrap()
            .vehicles
            .iter()
            .map(|v| v.position)
            .collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(poller.begin_poll().is_some());
    }

    #[test]
    fn failure_keeps_previous_snapshot_and_polling_resumes() {
        let mut poller = poller();
        let ticket = poller.begin_poll().unwrap();
        poller.complete::<String>(ticket, Ok(snapshot(&[1, 2])));

        let ticket = poller.begin_poll().unwrap();
        let outcome = poller.complete(ticket, Err("connection refused"));
        assert_eq!(outcome, PollOutcome::Failed("connection refused".into()));
        assert_eq!(poller.snapshot().unwrap().vehicles.len(), 2);
        assert!(poller.begin_poll().is_some());
        assert_eq!(poller.metrics.snapshot().polls_failed, 1);
    }

    #[test]
    fn new_snapshot_replaces_old_one_wholesale() {
        let mut poller = poller();
        let ticket = poller.begin_poll().unwrap();
        poller.complete::<String>(ticket, Ok(snapshot(&[1, 2, 3])));
        let ticket = poller.begin_poll().unwrap();
        poller.complete::<String>(ticket, Ok(snapshot(&[1])));
        assert_eq!(poller.snapshot().unwrap().vehicles.len(), 1);
    }

    #[test]
    fn stale_ticket_is_ignored() {
        let mut poller = poller();
        let old = poller.begin_poll().unwrap();
        poller.complete::<String>(old, Ok(snapshot(&[1])));
        let current = poller.begin_poll().unwrap();

        assert_eq!(
            poller.complete::<String>(old, Ok(snapshot(&[1, 2, 3, 4]))),
            PollOutcome::Stale
        );
        assert!(poller.is_in_flight());
        assert_eq!(poller.snapshot().unwrap().vehicles.len(), 1);
        assert_ne!(old.cycle(), current.cycle());
    }
}
