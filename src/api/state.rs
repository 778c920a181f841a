use anyhow::Result;
use futures_util::future::join_all;
use log::{debug, error};

use super::ApiClient;
use crate::models::state::RemainingTime;

pub async fn get_remaining_time(api: &ApiClient, exam_id: &str) -> Result<u64, anyhow::Error> {
    let resp = api
        .get(&format!("/studentExam/exams/remaining-time/{}", exam_id))
        .send()
        .await?;
    if resp.status().is_success() {
        let response = resp.json::<RemainingTime>().await?;
        debug!("Remaining time for exam {}: {:?}", exam_id, response.remaining_time);
        Ok(response.seconds())
    } else {
        error!("Failed to get remaining time for exam {}: {}", exam_id, resp.status());
        Err(anyhow::anyhow!("Failed to get remaining time ({})", resp.status()))
    }
}

/// Remaining time for each exam, in order. A failed lookup yields `None`
/// without affecting the others.
pub async fn get_remaining_times(api: &ApiClient, exam_ids: &[&str]) -> Vec<Option<u64>> {
    join_all(
        exam_ids
            .iter()
            .map(|exam_id| async move { get_remaining_time(api, exam_id).await.ok() }),
    )
    .await
}
