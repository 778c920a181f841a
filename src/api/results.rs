use anyhow::Result;
use log::{error, info};

use super::ApiClient;
use crate::models::submission::{Acknowledgment, ExamScore, Submission};

pub async fn post_submission(
    api: &ApiClient,
    exam_id: &str,
    submission: &Submission,
) -> Result<Acknowledgment, anyhow::Error> {
    let resp = api
        .post(&format!("/studentExam/submit/{}", exam_id))
        .json(submission)
        .send()
        .await?;
    if resp.status().is_success() {
        let body = resp.text().await?;
        info!(
            "Exam {} submitted with {} answers",
            exam_id,
            submission.answered()
        );
        Ok(serde_json::from_str::<Acknowledgment>(&body).unwrap_or_default())
    } else {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        error!("Failed to submit exam {}: {} {}", exam_id, status, body);
        Err(anyhow::anyhow!("Failed to submit exam ({})", status))
    }
}

pub async fn get_score(api: &ApiClient, exam_id: &str) -> Result<ExamScore, anyhow::Error> {
    let resp = api
        .get(&format!("/studentExam/exams/score/{}", exam_id))
        .send()
        .await?;
    if resp.status().is_success() {
        let response = resp.json::<ExamScore>().await?;
        info!("Score for exam {} received successfully", exam_id);
        Ok(response)
    } else {
        error!("Failed to get score for exam {}: {}", exam_id, resp.status());
        Err(anyhow::anyhow!("Failed to get exam score ({})", resp.status()))
    }
}
