// src/models/assessment.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'assessments' table: one subject's attempt.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AssessmentState {
    pub id: i64,
    pub user_id: i64,
    pub is_complete: bool,

    /// Permutation of catalog indices, fixed at creation.
    pub question_order: Vec<i32>,

    pub current_question_index: i32,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl AssessmentState {
    pub fn position(&self) -> usize {
        self.current_question_index.max(0) as usize
    }

    pub fn total(&self) -> usize {
        self.question_order.len()
    }
}

/// Represents the 'answers' table. Unique per (assessment_id, question_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub assessment_id: i64,
    pub question_id: String,
    pub answer_value: String,
}

/// Represents the 'metrics' table. Rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AssessmentMetric {
    pub id: i64,
    pub assessment_id: i64,
    pub question_id: String,
    pub metric_key: String,
    pub metric_value: f64,
    pub sample_size: i32,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// A calculated metric waiting to be attached to an attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAssessmentMetric {
    pub question_id: String,
    pub metric_key: String,
    pub metric_value: f64,
    pub sample_size: i32,
}

/// DTO for answering the current question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    #[validate(length(min = 1, max = 255))]
    pub question_id: String,

    /// Free text, a selected option value, or a serialized cognitive-test payload.
    #[serde(default)]
    pub answer: Option<String>,
}

/// Answers collected for a finished attempt, keyed by question id.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentResults {
    pub assessment_id: i64,
    pub answers: BTreeMap<String, String>,
}
