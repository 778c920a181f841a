use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::{debug, warn};
use tokio::time::{self, Duration, Instant};

use crate::error::SessionError;
use crate::models::session::Phase;
use crate::services::TimekeepingService;

/// Outcome of comparing the local countdown with a server report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Lowered(u64),
    /// The server reported more time than the local estimate; only a stale
    /// response to an earlier request can do that.
    Stale { server: u64 },
}

pub fn reconcile(local: u64, server: u64) -> Reconciliation {
    if server < local {
        Reconciliation::Lowered(server)
    } else if server == local {
        Reconciliation::Unchanged
    } else {
        Reconciliation::Stale { server }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileSchedule {
    /// Delay of the single opportunistic check after the exam starts.
    pub follow_up: Duration,
    /// Period of the checks after the follow-up; `None` disables them.
    pub interval: Option<Duration>,
}

impl Default for ReconcileSchedule {
    fn default() -> Self {
        Self {
            follow_up: Duration::from_secs(5),
            interval: Some(Duration::from_secs(60)),
        }
    }
}

/// Polls the timekeeping service while the exam is in progress.
///
/// A pending fetch never holds back the clock: the driver keeps
/// ticking while the returned future is outstanding.
pub struct RemainingTimeOracle {
    service: Arc<dyn TimekeepingService>,
    exam_id: String,
    schedule: ReconcileSchedule,
    next_due: Option<Instant>,
    stage: Stage,
    in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Armed,
    Done,
}

impl RemainingTimeOracle {
    pub fn new(
        service: Arc<dyn TimekeepingService>,
        exam_id: &str,
        schedule: ReconcileSchedule,
    ) -> Self {
        Self {
            service,
            exam_id: exam_id.to_owned(),
            schedule,
            next_due: None,
            stage: Stage::Idle,
            in_flight: false,
        }
    }

    /// Arms the schedule on the first `InProgress` and disarms it for good
    /// once the session leaves that phase.
    pub fn track(&mut self, phase: Phase) {
        match (self.stage, phase) {
            (Stage::Idle, Phase::InProgress) => {
                self.stage = Stage::Armed;
                self.next_due = Some(Instant::now() + self.schedule.follow_up);
            }
            (Stage::Armed, phase) if phase != Phase::InProgress => {
                self.stage = Stage::Done;
                self.next_due = None;
            }
            _ => {}
        }
    }

    /// Resolves when the next reconciliation should be issued.
    pub async fn due(&self) {
        match self.next_due {
            Some(deadline) if !self.in_flight => time::sleep_until(deadline).await,
            _ => std::future::pending::<()>().await,
        }
    }

    pub fn fetch(&mut self) -> BoxFuture<'static, Result<u64, SessionError>> {
        self.in_flight = true;
        self.next_due = None;
        let service = Arc::clone(&self.service);
        let exam_id = self.exam_id.clone();
        Box::pin(async move { service.fetch_remaining_seconds(&exam_id).await })
    }

    /// Records a completed fetch, schedules the next one and returns the
    /// server value when there is one to apply.
    pub fn complete(&mut self, result: Result<u64, SessionError>) -> Option<u64> {
        self.in_flight = false;
        if self.stage == Stage::Armed {
            self.next_due = self.schedule.interval.map(|period| Instant::now() + period);
        }
        match result {
            Ok(seconds) => {
                debug!("Server reports {}s remaining for exam {}", seconds, self.exam_id);
                Some(seconds)
            }
            Err(e) => {
                warn!("Keeping local countdown for exam {}: {}", self.exam_id, e);
                None
            }
        }
    }
}
