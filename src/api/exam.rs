use anyhow::Result;
use log::{error, info};

use super::ApiClient;
use crate::models::exam::{ExamInfo, ExamResponse, ExamsResponse, Question, QuestionsResponse};

pub async fn list_exams(api: &ApiClient) -> Result<Vec<ExamInfo>, anyhow::Error> {
    let resp = api.get("/exam").send().await?;
    if resp.status().is_success() {
        let exams = resp.json::<ExamsResponse>().await?.into_exams();
        info!("{} exams available", exams.len());
        Ok(exams)
    } else {
        error!("Failed to list exams: {}", resp.status());
        Err(anyhow::anyhow!("Failed to list exams ({})", resp.status()))
    }
}

pub async fn get_exam(api: &ApiClient, exam_id: &str) -> Result<ExamInfo, anyhow::Error> {
    let resp = api.get(&format!("/exam/{}", exam_id)).send().await?;
    if resp.status().is_success() {
        let response = resp.json::<ExamResponse>().await?;
        info!("Exam {} received successfully", exam_id);
        Ok(response.exam)
    } else {
        error!("Failed to get exam {}: {}", exam_id, resp.status());
        Err(anyhow::anyhow!("Failed to get exam ({})", resp.status()))
    }
}

pub async fn get_questions(api: &ApiClient, exam_id: &str) -> Result<Vec<Question>, anyhow::Error> {
    let resp = api
        .get(&format!("/studentExam/exams/{}/questions", exam_id))
        .send()
        .await?;
    if resp.status().is_success() {
        let response = resp.json::<QuestionsResponse>().await?;
        info!(
            "{} questions received for exam {}",
            response.questions.len(),
            exam_id
        );
        Ok(response.questions)
    } else {
        error!("Failed to get questions for exam {}: {}", exam_id, resp.status());
        Err(anyhow::anyhow!("Failed to get exam questions ({})", resp.status()))
    }
}

/// Opens the student's attempt on the server; its remaining time starts here.
pub async fn start_exam(api: &ApiClient, exam_id: &str) -> Result<(), anyhow::Error> {
    let resp = api
        .post(&format!("/studentExam/start/{}", exam_id))
        .json(&serde_json::json!({}))
        .send()
        .await?;
    if resp.status().is_success() {
        info!("Exam {} started", exam_id);
        Ok(())
    } else {
        error!("Failed to start exam {}: {}", exam_id, resp.status());
        Err(anyhow::anyhow!("Failed to start exam ({})", resp.status()))
    }
}
