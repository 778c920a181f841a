use log::{debug, info, warn};

use crate::error::{CommandError, SessionError};
use crate::models::events::SessionEvent;
use crate::models::exam::{ExamContent, Question};
use crate::models::session::{Phase, SessionSnapshot};
use crate::models::submission::{Acknowledgment, Submission};
use crate::session::answers::AnswerBook;
use crate::session::clock::Clock;
use crate::session::gateway::SubmissionGateway;
use crate::session::oracle::{reconcile, Reconciliation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailedStage {
    Loading,
    Submitting,
}

/// What the driver has to do after a `Retry`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    Reload,
    Submit(Submission),
}

/// State machine of one student's attempt at one exam.
///
/// Every method runs to completion on the driver task, so a check of the
/// submission guard and its update can never interleave with another
/// trigger.
pub struct ExamSessionController {
    exam_id: String,
    title: String,
    questions: Vec<Question>,
    answers: AnswerBook,
    remaining_seconds: u64,
    current_index: usize,
    paused: bool,
    phase: Phase,
    failed_stage: Option<FailedStage>,
    clock: Clock,
    submission_started: bool,
    submission: Option<Submission>,
    outbox: Vec<SessionEvent>,
}

impl ExamSessionController {
    pub fn new(exam_id: &str, clock: Clock) -> Self {
        Self {
            exam_id: exam_id.to_owned(),
            title: String::new(),
            questions: Vec::new(),
            answers: AnswerBook::new(),
            remaining_seconds: 0,
            current_index: 0,
            paused: false,
            phase: Phase::Loading,
            failed_stage: None,
            clock,
            submission_started: false,
            submission: None,
            outbox: Vec::new(),
        }
    }

    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id)
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.outbox)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let current_question = self.questions.get(self.current_index).cloned();
        let current_answer = current_question
            .as_ref()
            .and_then(|question| self.answers.get(&question.id))
            .map(str::to_owned);
        SessionSnapshot {
            exam_id: self.exam_id.clone(),
            title: self.title.clone(),
            phase: self.phase,
            current_index: self.current_index,
            question_count: self.questions.len(),
            remaining_seconds: self.remaining_seconds,
            paused: self.paused,
            answered: self
                .questions
                .iter()
                .map(|question| self.answers.is_answered(&question.id))
                .collect(),
            current_question,
            current_answer,
        }
    }

    fn enter(&mut self, next: Phase) {
        let from = self.phase;
        if from == next {
            return;
        }
        self.phase = next;
        if next == Phase::InProgress {
            self.clock.start();
        } else if next.stops_clock() {
            self.clock.stop();
        }
        info!("Exam {} session {} -> {}", self.exam_id, from, next);
        self.outbox.push(SessionEvent::PhaseChanged { from, to: next });
    }

    fn require_in_progress(&self) -> Result<(), CommandError> {
        if self.phase == Phase::InProgress {
            Ok(())
        } else {
            Err(CommandError::NotInProgress(self.phase))
        }
    }

    /// Applies the result of the initial fetches. A failed time fetch falls
    /// back to the exam's full duration.
    pub fn content_loaded(
        &mut self,
        content: ExamContent,
        remaining: Result<u64, SessionError>,
    ) -> Option<Submission> {
        if self.phase != Phase::Loading {
            debug!("Ignoring content for exam {} while {}", self.exam_id, self.phase);
            return None;
        }
        self.remaining_seconds = match remaining {
            Ok(seconds) => seconds,
            Err(e) => {
                warn!(
                    "Starting exam {} from its full duration: {}",
                    self.exam_id, e
                );
                content.exam.duration_seconds()
            }
        };
        self.title = content.exam.title;
        self.questions = content.questions;
        self.current_index = 0;
        self.enter(Phase::InProgress);
        if self.remaining_seconds == 0 {
            return self.expire();
        }
        None
    }

    pub fn content_failed(&mut self, error: SessionError) {
        if self.phase != Phase::Loading {
            return;
        }
        warn!("Exam {} could not be loaded: {}", self.exam_id, error);
        self.failed_stage = Some(FailedStage::Loading);
        self.enter(Phase::Failed);
        self.outbox.push(SessionEvent::Notice(error.to_string()));
    }

    pub fn answer(&mut self, question_id: &str, value: &str) -> Result<(), CommandError> {
        self.require_in_progress()?;
        if !self.questions.iter().any(|question| question.id == question_id) {
            return Err(CommandError::UnknownQuestion(question_id.to_owned()));
        }
        if self.questions[self.current_index].id != question_id {
            return Err(CommandError::NotCurrentQuestion(question_id.to_owned()));
        }
        self.answers.set(question_id, value);
        Ok(())
    }

    pub fn next(&mut self) -> Result<(), CommandError> {
        self.require_in_progress()?;
        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
        }
        Ok(())
    }

    pub fn previous(&mut self) -> Result<(), CommandError> {
        self.require_in_progress()?;
        self.current_index = self.current_index.saturating_sub(1);
        Ok(())
    }

    pub fn go_to(&mut self, index: usize) -> Result<(), CommandError> {
        self.require_in_progress()?;
        if index >= self.questions.len() {
            return Err(CommandError::IndexOutOfRange {
                index,
                len: self.questions.len(),
            });
        }
        self.current_index = index;
        Ok(())
    }

    /// Suppresses local decrements only; server reports still apply.
    pub fn pause(&mut self) -> Result<(), CommandError> {
        self.require_in_progress()?;
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), CommandError> {
        self.require_in_progress()?;
        self.paused = false;
        Ok(())
    }

    pub fn tick(&mut self) -> Option<Submission> {
        if self.phase != Phase::InProgress || self.paused {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            return self.expire();
        }
        None
    }

    pub fn apply_remaining(&mut self, server_seconds: u64) -> Option<Submission> {
        if self.phase != Phase::InProgress {
            debug!(
                "Ignoring remaining time for exam {} while {}",
                self.exam_id, self.phase
            );
            return None;
        }
        match reconcile(self.remaining_seconds, server_seconds) {
            Reconciliation::Lowered(seconds) => {
                debug!(
                    "Exam {} countdown corrected {}s -> {}s",
                    self.exam_id, self.remaining_seconds, seconds
                );
                self.remaining_seconds = seconds;
                if seconds == 0 {
                    return self.expire();
                }
            }
            Reconciliation::Stale { server } => {
                debug!(
                    "Discarding stale remaining time {}s for exam {} (local {}s)",
                    server, self.exam_id, self.remaining_seconds
                );
            }
            Reconciliation::Unchanged => {}
        }
        None
    }

    fn expire(&mut self) -> Option<Submission> {
        if self.phase != Phase::InProgress {
            return None;
        }
        self.remaining_seconds = 0;
        self.enter(Phase::Expired);
        self.outbox.push(SessionEvent::Expired);
        self.begin_submission()
    }

    /// The single entry into `Submitting`. The flag is set before the
    /// submission leaves this method, so every later trigger collapses.
    fn begin_submission(&mut self) -> Option<Submission> {
        if self.submission_started {
            debug!("Submission for exam {} already started", self.exam_id);
            return None;
        }
        let retrying = self.phase == Phase::Failed
            && self.failed_stage == Some(FailedStage::Submitting);
        if !matches!(self.phase, Phase::InProgress | Phase::Expired) && !retrying {
            return None;
        }
        self.submission_started = true;
        let answers = &self.answers;
        let submission = self
            .submission
            .get_or_insert_with(|| SubmissionGateway::prepare(answers))
            .clone();
        self.failed_stage = None;
        self.enter(Phase::Submitting);
        Some(submission)
    }

    pub fn confirm_submit(&mut self) -> Result<Option<Submission>, CommandError> {
        match self.phase {
            Phase::InProgress | Phase::Expired | Phase::Submitting | Phase::Submitted => {
                Ok(self.begin_submission())
            }
            Phase::Failed if self.failed_stage == Some(FailedStage::Submitting) => {
                Ok(self.begin_submission())
            }
            phase => Err(CommandError::NotInProgress(phase)),
        }
    }

    pub fn retry(&mut self) -> Result<RetryAction, CommandError> {
        match (self.phase, self.failed_stage) {
            (Phase::Failed, Some(FailedStage::Loading)) => {
                self.failed_stage = None;
                self.enter(Phase::Loading);
                Ok(RetryAction::Reload)
            }
            (Phase::Failed, Some(FailedStage::Submitting)) => self
                .begin_submission()
                .map(RetryAction::Submit)
                .ok_or(CommandError::NothingToRetry(self.phase)),
            (phase, _) => Err(CommandError::NothingToRetry(phase)),
        }
    }

    pub fn submission_finished(&mut self, outcome: Result<Acknowledgment, SessionError>) {
        if self.phase != Phase::Submitting {
            debug!(
                "Ignoring submission outcome for exam {} while {}",
                self.exam_id, self.phase
            );
            return;
        }
        match outcome {
            Ok(ack) => {
                if let Some(message) = ack.message {
                    self.outbox.push(SessionEvent::Notice(message));
                }
                self.enter(Phase::Submitted);
            }
            Err(e) => {
                warn!("Exam {} submission failed: {}", self.exam_id, e);
                self.submission_started = false;
                self.failed_stage = Some(FailedStage::Submitting);
                self.enter(Phase::Failed);
                self.outbox.push(SessionEvent::Notice(e.to_string()));
            }
        }
    }

    /// Stops the countdown when the view is abandoned.
    pub fn abandon(&mut self) {
        self.clock.stop();
    }
}
