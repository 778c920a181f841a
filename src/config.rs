use std::env;

use thiserror::Error;
use tokio::time::Duration;

use crate::session::oracle::ReconcileSchedule;

const DEFAULT_API_BASE_URL: &str = "https://edu-master-psi.vercel.app";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub token: String,
    /// `None` lets the student pick from the exam list.
    pub exam_id: Option<String>,
    pub reconcile: ReconcileSchedule,
    pub start_attempt: bool,
}

impl ClientConfig {
    /// Reads the environment; `exam_id_arg` takes precedence over `EDU_EXAM_ID`.
    pub fn load(exam_id_arg: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(exam_id_arg, |key| env::var(key).ok())
    }

    fn from_lookup(
        exam_id_arg: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_base_url =
            get("EDU_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_owned());
        let token = get("EDU_TOKEN").ok_or(ConfigError::Missing("EDU_TOKEN"))?;
        let exam_id = exam_id_arg
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .or_else(|| get("EDU_EXAM_ID"));

        let follow_up = match get("EDU_RECONCILE_FOLLOW_UP_SECS") {
            Some(value) => parse_u64("EDU_RECONCILE_FOLLOW_UP_SECS", value)?,
            None => 5,
        };
        let interval = match get("EDU_RECONCILE_INTERVAL_SECS") {
            Some(value) => parse_u64("EDU_RECONCILE_INTERVAL_SECS", value)?,
            None => 60,
        };
        let start_attempt = match get("EDU_START_ATTEMPT") {
            Some(value) => parse_bool("EDU_START_ATTEMPT", value)?,
            None => true,
        };

        Ok(Self {
            api_base_url,
            token,
            exam_id,
            reconcile: ReconcileSchedule {
                follow_up: Duration::from_secs(follow_up),
                interval: (interval > 0).then(|| Duration::from_secs(interval)),
            },
            start_attempt,
        })
    }
}

fn parse_u64(field: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidValue { field, value })
}

fn parse_bool(field: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { field, value }),
    }
}
