use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct RemainingTime {
    #[serde(rename = "remainingTime", default)]
    pub remaining_time: Option<f64>,
}

impl RemainingTime {
    /// Whole seconds left; absent or negative values count as zero.
    pub fn seconds(&self) -> u64 {
        match self.remaining_time {
            Some(value) if value.is_finite() && value > 0.0 => value.floor() as u64,
            _ => 0,
        }
    }
}
