mod console;

use std::sync::Arc;

use anyhow::Context;
use exam_session_client::api::{exam::start_exam, ApiClient};
use exam_session_client::config::ClientConfig;
use exam_session_client::models::session::Phase;
use exam_session_client::services::ResultsService;
use exam_session_client::{open_session, SessionServices};
use log::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ClientConfig::load(std::env::args().nth(1)).context("invalid configuration")?;
    let api = Arc::new(ApiClient::new(&config.api_base_url, &config.token));
    let mut lines = console::stdin_lines();

    let exam_id = match config.exam_id.clone() {
        Some(exam_id) => exam_id,
        None => match console::pick_exam(&api, &mut lines)
            .await
            .context("could not list exams")?
        {
            Some(exam_id) => exam_id,
            None => return Ok(()),
        },
    };
    info!("Opening exam {} against {}", exam_id, config.api_base_url);

    if config.start_attempt {
        if let Err(e) = start_exam(&api, &exam_id).await {
            warn!("Could not start exam {}: {}", exam_id, e);
        }
    }

    let services = SessionServices {
        content: api.clone(),
        time: api.clone(),
        results: api.clone(),
    };
    let handle = open_session(&exam_id, services, config.reconcile);
    let phase = console::run(handle, &mut lines).await?;

    if phase == Phase::Submitted {
        match api.fetch_score(&exam_id).await {
            Ok(score) => {
                println!(
                    "Score: {}% ({} correct, {} incorrect, {} questions) - {}",
                    score.percentage(),
                    score.correct_answers,
                    score.incorrect_answers,
                    score.total_questions,
                    score.performance_message()
                );
                println!("{}", if score.passed() { "Passed" } else { "Not passed" });
            }
            Err(e) => println!("Results are not available yet: {}", e),
        }
    } else {
        info!("Leaving exam {} while {}", exam_id, phase);
    }
    Ok(())
}
