pub mod answers;
pub mod clock;
pub mod controller;
pub mod gateway;
pub mod oracle;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::models::events::SessionEvent;
use crate::models::exam::ExamContent;
use crate::models::session::{Command, Phase, SessionSnapshot};
use crate::models::submission::{Acknowledgment, Submission};
use crate::services::{ExamContentService, ResultsService, TimekeepingService};

use self::clock::Clock;
use self::controller::{ExamSessionController, RetryAction};
use self::gateway::SubmissionGateway;
use self::oracle::{ReconcileSchedule, RemainingTimeOracle};

/// The collaborators one session talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub content: Arc<dyn ExamContentService>,
    pub time: Arc<dyn TimekeepingService>,
    pub results: Arc<dyn ResultsService>,
}

/// UI-side end of a running exam session.
///
/// Dropping the handle abandons the session exactly like [`SessionHandle::close`].
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    state: watch::Receiver<SessionSnapshot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Returns false once the session has ended.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    /// `None` once the session has ended and every event was read.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn state(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub async fn close(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            info!("Closing exam session");
            let _ = shutdown_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Exam session task ended abnormally: {}", e);
            }
        }
    }
}

/// Spawns the session task and starts loading the exam.
pub fn open_session(
    exam_id: &str,
    services: SessionServices,
    schedule: ReconcileSchedule,
) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionSnapshot::loading(exam_id));
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let driver = SessionDriver {
        controller: ExamSessionController::new(exam_id, Clock::new()),
        oracle: RemainingTimeOracle::new(Arc::clone(&services.time), exam_id, schedule),
        gateway: SubmissionGateway::new(Arc::clone(&services.results), exam_id),
        services,
        pending: FuturesUnordered::new(),
        commands: command_rx,
        events: event_tx,
        state: state_tx,
    };
    let task = tokio::spawn(driver.run(shutdown_rx));

    SessionHandle {
        commands: command_tx,
        events: event_rx,
        state: state_rx,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    }
}

enum Completion {
    Loaded {
        content: Result<ExamContent, SessionError>,
        remaining: Result<u64, SessionError>,
    },
    Reconciled(Result<u64, SessionError>),
    Submitted(Result<Acknowledgment, SessionError>),
}

/// Owns the controller and serialises ticks, commands and network
/// completions on one task. Pending requests live in `pending` and are
/// dropped with the driver, so nothing reaches a discarded session.
struct SessionDriver {
    controller: ExamSessionController,
    oracle: RemainingTimeOracle,
    gateway: SubmissionGateway,
    services: SessionServices,
    pending: FuturesUnordered<BoxFuture<'static, Completion>>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<SessionEvent>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionDriver {
    async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) {
        self.load();
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Exam {} session abandoned", self.controller.exam_id());
                    break;
                }
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        info!("Exam {} session view dropped", self.controller.exam_id());
                        break;
                    }
                },
                _ = self.controller.clock_mut().tick() => {
                    let submission = self.controller.tick();
                    self.submit(submission);
                }
                _ = self.oracle.due() => {
                    let fetch = self.oracle.fetch();
                    self.pending.push(Box::pin(async move { Completion::Reconciled(fetch.await) }));
                }
                Some(completion) = self.pending.next() => self.handle_completion(completion),
            }
            self.publish();
            if self.controller.phase() == Phase::Submitted {
                break;
            }
        }
        self.controller.abandon();
        debug!(
            "Exam {} session stopped with {} requests dropped",
            self.controller.exam_id(),
            self.pending.len()
        );
    }

    fn load(&mut self) {
        let content = Arc::clone(&self.services.content);
        let time = Arc::clone(&self.services.time);
        let exam_id = self.controller.exam_id().to_owned();
        self.pending.push(Box::pin(async move {
            let (content, remaining) = tokio::join!(
                content.fetch_content(&exam_id),
                time.fetch_remaining_seconds(&exam_id)
            );
            Completion::Loaded { content, remaining }
        }));
    }

    fn submit(&mut self, submission: Option<Submission>) {
        if let Some(submission) = submission {
            let send = self.gateway.send(submission);
            self.pending
                .push(Box::pin(async move { Completion::Submitted(send.await) }));
        }
    }

    fn handle_command(&mut self, command: Command) {
        debug!("Exam {} command {:?}", self.controller.exam_id(), command);
        let outcome = match command {
            Command::Answer { question_id, value } => self.controller.answer(&question_id, &value),
            Command::Next => self.controller.next(),
            Command::Previous => self.controller.previous(),
            Command::GoTo(index) => self.controller.go_to(index),
            Command::Pause => self.controller.pause(),
            Command::Resume => self.controller.resume(),
            Command::ConfirmSubmit => self
                .controller
                .confirm_submit()
                .map(|submission| self.submit(submission)),
            Command::Retry => self.controller.retry().map(|action| match action {
                RetryAction::Reload => self.load(),
                RetryAction::Submit(submission) => self.submit(Some(submission)),
            }),
        };
        if let Err(e) = outcome {
            warn!("Rejected command for exam {}: {}", self.controller.exam_id(), e);
            let _ = self.events.send(SessionEvent::CommandRejected(e.to_string()));
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded { content, remaining } => match content {
                Ok(content) => {
                    let submission = self.controller.content_loaded(content, remaining);
                    self.submit(submission);
                }
                Err(e) => self.controller.content_failed(e),
            },
            Completion::Reconciled(result) => {
                if let Some(seconds) = self.oracle.complete(result) {
                    let submission = self.controller.apply_remaining(seconds);
                    self.submit(submission);
                }
            }
            Completion::Submitted(outcome) => self.controller.submission_finished(outcome),
        }
    }

    fn publish(&mut self) {
        self.oracle.track(self.controller.phase());
        for event in self.controller.take_events() {
            let _ = self.events.send(event);
        }
        let snapshot = self.controller.snapshot();
        self.state.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{question, FakeContent, FakeResults, FakeTime};
    use tokio::time::{self, Duration, Instant};

    fn services(
        content: FakeContent,
        time: FakeTime,
        results: Arc<FakeResults>,
    ) -> SessionServices {
        SessionServices {
            content: Arc::new(content),
            time: Arc::new(time),
            results,
        }
    }

    fn two_questions() -> Vec<crate::models::exam::Question> {
        vec![question("q1", &["A", "B"]), question("q2", &["A", "B"])]
    }

    async fn wait_for_phase(handle: &mut SessionHandle, phase: Phase) -> Vec<(Phase, Phase)> {
        let mut seen = Vec::new();
        while let Some(event) = handle.next_event().await {
            if let SessionEvent::PhaseChanged { from, to } = event {
                seen.push((from, to));
                if to == phase {
                    return seen;
                }
            }
        }
        panic!("session ended before reaching {}; saw {:?}", phase, seen);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_submits_unanswered_exam_automatically() {
        let results = Arc::new(FakeResults::accepting());
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(2)),
                results.clone(),
            ),
            ReconcileSchedule::default(),
        );

        let seen = wait_for_phase(&mut handle, Phase::Submitted).await;
        assert_eq!(
            seen,
            vec![
                (Phase::Loading, Phase::InProgress),
                (Phase::InProgress, Phase::Expired),
                (Phase::Expired, Phase::Submitting),
                (Phase::Submitting, Phase::Submitted),
            ]
        );
        let sent = results.submissions();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].answers.is_empty());
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn confirm_racing_expiry_sends_once() {
        let results = Arc::new(FakeResults::accepting().with_delay(Duration::from_secs(3)));
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(1)),
                results.clone(),
            ),
            ReconcileSchedule::default(),
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;

        assert!(handle.send(Command::ConfirmSubmit));
        assert!(handle.send(Command::ConfirmSubmit));
        wait_for_phase(&mut handle, Phase::Submitted).await;

        assert_eq!(results.submissions().len(), 1);
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_time_service_keeps_local_countdown() {
        let time_service = FakeTime::scripted(
            vec![Ok(30)],
            Err(SessionError::TimeUnavailable("connection reset".to_owned())),
        );
        let schedule = ReconcileSchedule {
            follow_up: Duration::from_secs(2),
            interval: Some(Duration::from_secs(3)),
        };
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                time_service,
                Arc::new(FakeResults::accepting()),
            ),
            schedule,
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;
        let started = Instant::now();

        let mut state = handle.state();
        let mut last = state.borrow().remaining_seconds;
        while last > 20 {
            state.changed().await.unwrap();
            let snapshot = state.borrow().clone();
            assert_eq!(snapshot.phase, Phase::InProgress);
            assert!(snapshot.remaining_seconds <= last);
            last = snapshot.remaining_seconds;
        }
        assert_eq!(started.elapsed(), Duration::from_secs(10));
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn answers_and_navigation_reach_the_submission() {
        let results = Arc::new(FakeResults::accepting());
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(600)),
                results.clone(),
            ),
            ReconcileSchedule::default(),
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;

        handle.send(Command::Answer {
            question_id: "q1".to_owned(),
            value: "A".to_owned(),
        });
        handle.send(Command::Next);
        handle.send(Command::Answer {
            question_id: "q2".to_owned(),
            value: "B".to_owned(),
        });
        handle.send(Command::GoTo(7));
        handle.send(Command::ConfirmSubmit);
        wait_for_phase(&mut handle, Phase::Submitted).await;

        let snapshot = handle.snapshot();
        assert_eq!(snapshot.current_index, 1);
        assert_eq!(snapshot.answered_count(), 2);
        let sent = results.submissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].answers[0].selected_answer, "A");
        assert_eq!(sent[0].answers[1].selected_answer, "B");
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_goto_is_reported() {
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(600)),
                Arc::new(FakeResults::accepting()),
            ),
            ReconcileSchedule::default(),
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;

        handle.send(Command::GoTo(2));
        loop {
            match handle.next_event().await {
                Some(SessionEvent::CommandRejected(reason)) => {
                    assert!(reason.contains("outside"));
                    break;
                }
                Some(_) => continue,
                None => panic!("session ended"),
            }
        }
        assert_eq!(handle.snapshot().current_index, 0);
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_submission_can_be_retried() {
        let results = Arc::new(FakeResults::failing_first(1));
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(600)),
                results.clone(),
            ),
            ReconcileSchedule::default(),
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;

        handle.send(Command::Answer {
            question_id: "q1".to_owned(),
            value: "B".to_owned(),
        });
        handle.send(Command::ConfirmSubmit);
        wait_for_phase(&mut handle, Phase::Failed).await;

        handle.send(Command::Retry);
        wait_for_phase(&mut handle, Phase::Submitted).await;

        let sent = results.submissions();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], sent[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_load_can_be_retried() {
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()).failing_first(1),
                FakeTime::always(Ok(600)),
                Arc::new(FakeResults::accepting()),
            ),
            ReconcileSchedule::default(),
        );
        let seen = wait_for_phase(&mut handle, Phase::Failed).await;
        assert_eq!(seen, vec![(Phase::Loading, Phase::Failed)]);

        handle.send(Command::Retry);
        let seen = wait_for_phase(&mut handle, Phase::InProgress).await;
        assert_eq!(
            seen,
            vec![
                (Phase::Failed, Phase::Loading),
                (Phase::Loading, Phase::InProgress)
            ]
        );
        assert_eq!(handle.snapshot().question_count, 2);
        handle.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn closing_discards_late_responses() {
        let results = Arc::new(FakeResults::accepting().with_delay(Duration::from_secs(30)));
        let mut handle = open_session(
            "e1",
            services(
                FakeContent::new(30, two_questions()),
                FakeTime::always(Ok(600)),
                results.clone(),
            ),
            ReconcileSchedule::default(),
        );
        wait_for_phase(&mut handle, Phase::InProgress).await;
        handle.send(Command::ConfirmSubmit);
        wait_for_phase(&mut handle, Phase::Submitting).await;

        let state = handle.state();
        handle.close().await;
        time::sleep(Duration::from_secs(60)).await;

        assert_eq!(results.submissions().len(), 1);
        assert_eq!(state.borrow().phase, Phase::Submitting);
    }
}
