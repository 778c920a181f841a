pub mod exam;
pub mod results;
pub mod state;

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, RequestBuilder};

use crate::error::SessionError;
use crate::models::exam::{ExamInfo, Question};
use crate::models::submission::{Acknowledgment, ExamScore, Submission};
use crate::services::{ExamContentService, ResultsService, TimekeepingService};

/// REST client for the learning platform, shared by every service role.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header("token", &self.token)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("token", &self.token)
    }
}

#[async_trait]
impl ExamContentService for ApiClient {
    async fn fetch_exam(&self, exam_id: &str) -> Result<ExamInfo, SessionError> {
        exam::get_exam(self, exam_id)
            .await
            .map_err(|e| SessionError::ContentUnavailable(e.to_string()))
    }

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>, SessionError> {
        exam::get_questions(self, exam_id)
            .await
            .map_err(|e| SessionError::ContentUnavailable(e.to_string()))
    }
}

#[async_trait]
impl TimekeepingService for ApiClient {
    async fn fetch_remaining_seconds(&self, exam_id: &str) -> Result<u64, SessionError> {
        state::get_remaining_time(self, exam_id)
            .await
            .map_err(|e| SessionError::TimeUnavailable(e.to_string()))
    }
}

#[async_trait]
impl ResultsService for ApiClient {
    async fn submit(
        &self,
        exam_id: &str,
        submission: &Submission,
    ) -> Result<Acknowledgment, SessionError> {
        results::post_submission(self, exam_id, submission)
            .await
            .map_err(|e| SessionError::SubmissionFailed(e.to_string()))
    }

    async fn fetch_score(&self, exam_id: &str) -> Result<ExamScore, SessionError> {
        results::get_score(self, exam_id).await.map_err(|e| {
            warn!("Score for exam {} unavailable: {}", exam_id, e);
            SessionError::ContentUnavailable(e.to_string())
        })
    }
}
