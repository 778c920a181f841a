//! Contracts of the remote collaborators consumed by an exam session.

use async_trait::async_trait;

use crate::error::SessionError;
use crate::models::exam::{ExamContent, ExamInfo, Question};
use crate::models::submission::{Acknowledgment, ExamScore, Submission};

#[async_trait]
pub trait ExamContentService: Send + Sync {
    async fn fetch_exam(&self, exam_id: &str) -> Result<ExamInfo, SessionError>;

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, SessionError>;

    /// Exam metadata and question list, fetched concurrently.
    async fn fetch_content(&self, exam_id: &str) -> Result<ExamContent, SessionError> {
        let (exam, questions) =
            tokio::try_join!(self.fetch_exam(exam_id), self.fetch_questions(exam_id))?;
        Ok(ExamContent { exam, questions })
    }
}

#[async_trait]
pub trait TimekeepingService: Send + Sync {
    async fn fetch_remaining_seconds(&self, exam_id: &str) -> Result<u64, SessionError>;
}

#[async_trait]
pub trait ResultsService: Send + Sync {
    async fn submit(
        &self,
        exam_id: &str,
        submission: &Submission,
    ) -> Result<Acknowledgment, SessionError>;

    async fn fetch_score(&self, exam_id: &str) -> Result<ExamScore, SessionError>;
}
