use std::fmt;

use crate::models::exam::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    InProgress,
    Submitting,
    Submitted,
    Expired,
    Failed,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Loading => "loading",
            Phase::InProgress => "in_progress",
            Phase::Submitting => "submitting",
            Phase::Submitted => "submitted",
            Phase::Expired => "expired",
            Phase::Failed => "failed",
        }
    }

    /// Phases in which the local countdown must not run.
    pub fn stops_clock(self) -> bool {
        !matches!(self, Phase::Loading | Phase::InProgress)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands accepted from the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Answer { question_id: String, value: String },
    Next,
    Previous,
    GoTo(usize),
    Pause,
    Resume,
    ConfirmSubmit,
    Retry,
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub exam_id: String,
    pub title: String,
    pub phase: Phase,
    pub current_index: usize,
    pub question_count: usize,
    pub remaining_seconds: u64,
    pub paused: bool,
    pub answered: Vec<bool>,
    pub current_question: Option<Question>,
    pub current_answer: Option<String>,
}

impl SessionSnapshot {
    pub fn loading(exam_id: &str) -> Self {
        Self {
            exam_id: exam_id.to_owned(),
            title: String::new(),
            phase: Phase::Loading,
            current_index: 0,
            question_count: 0,
            remaining_seconds: 0,
            paused: false,
            answered: Vec::new(),
            current_question: None,
            current_answer: None,
        }
    }

    pub fn answered_count(&self) -> usize {
        self.answered.iter().filter(|answered| **answered).count()
    }

    pub fn unanswered_count(&self) -> usize {
        self.question_count - self.answered_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUrgency {
    Calm,
    Warning,
    Critical,
}

impl TimeUrgency {
    pub fn for_remaining(seconds: u64) -> Self {
        if seconds < 300 {
            TimeUrgency::Critical
        } else if seconds < 600 {
            TimeUrgency::Warning
        } else {
            TimeUrgency::Calm
        }
    }
}

/// `H:MM:SS` from one hour upwards, `M:SS` below.
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_time_switches_to_hours() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(65), "1:05");
        assert_eq!(format_time(3599), "59:59");
        assert_eq!(format_time(3600), "1:00:00");
        assert_eq!(format_time(7384), "2:03:04");
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(TimeUrgency::for_remaining(299), TimeUrgency::Critical);
        assert_eq!(TimeUrgency::for_remaining(300), TimeUrgency::Warning);
        assert_eq!(TimeUrgency::for_remaining(599), TimeUrgency::Warning);
        assert_eq!(TimeUrgency::for_remaining(600), TimeUrgency::Calm);
    }

    #[test]
    fn snapshot_counts_answered_questions() {
        let mut snapshot = SessionSnapshot::loading("e1");
        snapshot.question_count = 3;
        snapshot.answered = vec![true, false, true];
        assert_eq!(snapshot.answered_count(), 2);
        assert_eq!(snapshot.unanswered_count(), 1);
    }
}
