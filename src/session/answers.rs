use crate::models::submission::{AnswerEntry, Submission};

/// Selected option per question, kept in first-answered order.
#[derive(Debug, Clone, Default)]
pub struct AnswerBook {
    entries: Vec<(String, String)>,
}

impl AnswerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the answer for `question_id` or records a new one.
    pub fn set(&mut self, question_id: &str, answer: &str) {
        match self.entries.iter_mut().find(|(id, _)| id == question_id) {
            Some((_, existing)) => *existing = answer.to_owned(),
            None => self
                .entries
                .push((question_id.to_owned(), answer.to_owned())),
        }
    }

    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == question_id)
            .map(|(_, answer)| answer.as_str())
    }

    pub fn is_answered(&self, question_id: &str) -> bool {
        self.get(question_id).is_some()
    }

    pub fn to_submission(&self) -> Submission {
        Submission {
            answers: self
                .entries
                .iter()
                .map(|(question_id, answer)| AnswerEntry {
                    question_id: question_id.clone(),
                    selected_answer: answer.clone(),
                })
                .collect(),
        }
    }
}
