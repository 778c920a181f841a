use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AnswerEntry {
    #[serde(rename = "questionId")]
    pub question_id: String,
    #[serde(rename = "selectedAnswer")]
    pub selected_answer: String,
}

/// Write-once body of the submit call. Unanswered questions are omitted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Submission {
    pub answers: Vec<AnswerEntry>,
}

impl Submission {
    pub fn answered(&self) -> usize {
        self.answers.len()
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Acknowledgment {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExamScore {
    #[serde(rename = "correctAnswers", default)]
    pub correct_answers: u32,
    #[serde(rename = "incorrectAnswers", default)]
    pub incorrect_answers: u32,
    #[serde(rename = "totalQuestions", default)]
    pub total_questions: u32,
    #[serde(rename = "timeSpent", default)]
    pub time_spent: Option<serde_json::Value>,
}

impl ExamScore {
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        (f64::from(self.correct_answers) * 100.0 / f64::from(self.total_questions)).round() as u32
    }

    pub fn passed(&self) -> bool {
        self.percentage() >= 60
    }

    pub fn performance_message(&self) -> &'static str {
        let percentage = self.percentage();
        if percentage >= 90 {
            "Outstanding! Excellent work!"
        } else if percentage >= 80 {
            "Great job! Well done!"
        } else if percentage >= 70 {
            "Good work! Keep it up!"
        } else if percentage >= 60 {
            "Not bad! Room for improvement."
        } else {
            "Keep studying! You can do better!"
        }
    }
}
