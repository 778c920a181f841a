use std::sync::Arc;

use futures_util::future::BoxFuture;
use log::info;

use crate::error::SessionError;
use crate::models::submission::{Acknowledgment, Submission};
use crate::services::ResultsService;
use crate::session::answers::AnswerBook;

/// Sends the finished answer set to the results service.
///
/// Callers must not have two sends outstanding for one session; the
/// controller's submission guard provides that, this type does not
/// check it again.
pub struct SubmissionGateway {
    service: Arc<dyn ResultsService>,
    exam_id: String,
}

impl SubmissionGateway {
    pub fn new(service: Arc<dyn ResultsService>, exam_id: &str) -> Self {
        Self {
            service,
            exam_id: exam_id.to_owned(),
        }
    }

    pub fn prepare(answers: &AnswerBook) -> Submission {
        answers.to_submission()
    }

    pub fn send(
        &self,
        submission: Submission,
    ) -> BoxFuture<'static, Result<Acknowledgment, SessionError>> {
        let service = Arc::clone(&self.service);
        let exam_id = self.exam_id.clone();
        info!(
            "Submitting exam {} with {} answers",
            exam_id,
            submission.answered()
        );
        Box::pin(async move {
            service
                .submit(&exam_id, &submission)
                .await
                .map_err(|e| match e {
                    failed @ SessionError::SubmissionFailed(_) => failed,
                    other => SessionError::SubmissionFailed(other.to_string()),
                })
        })
    }
}
