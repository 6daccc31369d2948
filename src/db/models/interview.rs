//! Interview and feedback records.
//!
//! Both are written by the generation and feedback services; this crate only
//! reads them. List-valued columns are stored as JSON strings.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Interview {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub level: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub interview_type: String,
    /// JSON array of technologies
    pub techstack: String,
    /// JSON array of question strings
    pub questions: String,
    pub finalized: bool,
    pub created_at: String,
}

impl Interview {
    /// Parse the tech stack from its JSON column
    pub fn get_techstack(&self) -> Vec<String> {
        parse_string_list(&self.techstack)
    }

    /// Parse the questions from their JSON column
    pub fn get_questions(&self) -> Vec<String> {
        parse_string_list(&self.questions)
    }
}

fn parse_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Interview as returned by the API, with list columns decoded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
    pub id: String,
    pub user_id: String,
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    pub finalized: bool,
    pub created_at: String,
}

impl From<Interview> for InterviewResponse {
    fn from(interview: Interview) -> Self {
        let techstack = interview.get_techstack();
        let questions = interview.get_questions();
        Self {
            id: interview.id,
            user_id: interview.user_id,
            role: interview.role,
            level: interview.level,
            interview_type: interview.interview_type,
            techstack,
            questions,
            finalized: interview.finalized,
            created_at: interview.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    pub interview_id: String,
    pub user_id: String,
    pub total_score: i64,
    pub final_assessment: String,
    pub created_at: String,
}
