use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ExamInfo {
    #[serde(rename = "_id", default)]
    pub exam_id: String,
    #[serde(default)]
    pub title: String,
    /// Minutes.
    #[serde(default)]
    pub duration: u64,
    #[serde(rename = "totalMarks", default)]
    pub total_marks: Option<u32>,
    #[serde(rename = "passingMarks", default)]
    pub passing_marks: Option<u32>,
}

impl ExamInfo {
    pub fn duration_seconds(&self) -> u64 {
        self.duration.saturating_mul(60)
    }
}

#[derive(Deserialize, Debug)]
pub struct ExamResponse {
    pub exam: ExamInfo,
}

/// `GET /exam` answers either `{"exams": [...]}` or a bare array.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum ExamsResponse {
    Bare(Vec<ExamInfo>),
    Wrapped {
        #[serde(default)]
        exams: Option<Vec<ExamInfo>>,
    },
}

impl ExamsResponse {
    pub fn into_exams(self) -> Vec<ExamInfo> {
        match self {
            ExamsResponse::Bare(exams) => exams,
            ExamsResponse::Wrapped { exams } => exams.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub points: Option<u32>,
}

#[derive(Deserialize, Debug)]
pub struct QuestionsResponse {
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Everything the session needs from the content service, fetched once.
#[derive(Debug, Clone)]
pub struct ExamContent {
    pub exam: ExamInfo,
    pub questions: Vec<Question>,
}
