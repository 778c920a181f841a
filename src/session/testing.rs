//! In-memory collaborators for session tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::{self, Duration};

use crate::error::SessionError;
use crate::models::exam::{ExamInfo, Question};
use crate::models::submission::{Acknowledgment, ExamScore, Submission};
use crate::services::{ExamContentService, ResultsService, TimekeepingService};

pub fn question(id: &str, options: &[&str]) -> Question {
    Question {
        id: id.to_owned(),
        text: format!("Question {}", id),
        options: options.iter().map(|option| option.to_string()).collect(),
        points: Some(1),
    }
}

pub fn exam_info(exam_id: &str, minutes: u64) -> ExamInfo {
    ExamInfo {
        exam_id: exam_id.to_owned(),
        title: "Algebra midterm".to_owned(),
        duration: minutes,
        total_marks: None,
        passing_marks: None,
    }
}

pub struct FakeContent {
    exam: ExamInfo,
    questions: Vec<Question>,
    failures_left: Mutex<usize>,
}

impl FakeContent {
    pub fn new(minutes: u64, questions: Vec<Question>) -> Self {
        Self {
            exam: exam_info("e1", minutes),
            questions,
            failures_left: Mutex::new(0),
        }
    }

    pub fn failing_first(mut self, failures: usize) -> Self {
        self.failures_left = Mutex::new(failures);
        self
    }

    fn maybe_fail(&self) -> Result<(), SessionError> {
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(SessionError::ContentUnavailable("503".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl ExamContentService for FakeContent {
    async fn fetch_exam(&self, _exam_id: &str) -> Result<ExamInfo, SessionError> {
        self.maybe_fail()?;
        Ok(self.exam.clone())
    }

    async fn fetch_questions(&self, _exam_id: &str) -> Result<Vec<Question>, SessionError> {
        Ok(self.questions.clone())
    }
}

pub struct FakeTime {
    scripted: Mutex<VecDeque<Result<u64, SessionError>>>,
    fallback: Result<u64, SessionError>,
    calls: Mutex<usize>,
}

impl FakeTime {
    pub fn always(result: Result<u64, SessionError>) -> Self {
        Self::scripted(Vec::new(), result)
    }

    /// Answers from `first` in order, then `fallback` forever.
    pub fn scripted(first: Vec<Result<u64, SessionError>>, fallback: Result<u64, SessionError>) -> Self {
        Self {
            scripted: Mutex::new(first.into()),
            fallback,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TimekeepingService for FakeTime {
    async fn fetch_remaining_seconds(&self, _exam_id: &str) -> Result<u64, SessionError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.scripted.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }
}

pub struct FakeResults {
    submissions: Mutex<Vec<Submission>>,
    failures_left: Mutex<usize>,
    delay: Duration,
}

impl FakeResults {
    pub fn accepting() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            failures_left: Mutex::new(0),
            delay: Duration::ZERO,
        }
    }

    pub fn failing_first(failures: usize) -> Self {
        let results = Self::accepting();
        *results.failures_left.lock().unwrap() = failures;
        results
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultsService for FakeResults {
    async fn submit(
        &self,
        _exam_id: &str,
        submission: &Submission,
    ) -> Result<Acknowledgment, SessionError> {
        self.submissions.lock().unwrap().push(submission.clone());
        if !self.delay.is_zero() {
            time::sleep(self.delay).await;
        }
        let mut left = self.failures_left.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(SessionError::SubmissionFailed("502 Bad Gateway".to_owned()));
        }
        Ok(Acknowledgment::default())
    }

    async fn fetch_score(&self, _exam_id: &str) -> Result<ExamScore, SessionError> {
        Ok(ExamScore {
            correct_answers: 0,
            incorrect_answers: 0,
            total_questions: 0,
            time_spent: None,
        })
    }
}
