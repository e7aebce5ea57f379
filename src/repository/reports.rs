// src/repository/reports.rs

//! Read-side queries for the results views.
//!
//! Interaction metrics, cognitive test summaries and numeric answers are
//! flattened into one `(assessment, question, metric, value)` relation so the
//! timeline and correlation queries do not care where a value came from.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::{PgStore, StoreError};

const ALL_METRICS_CTE: &str = r#"
WITH all_metrics AS (
    SELECT m.assessment_id, a.created_at, m.question_id, m.metric_key, m.metric_value
    FROM metrics m
    JOIN assessments a ON m.assessment_id = a.id
    UNION ALL
    SELECT assessment_id, created_at, 'cpt', 'reaction_time', average_reaction_time FROM cpt_results
    UNION ALL
    SELECT assessment_id, created_at, 'cpt', 'detection_rate', detection_rate FROM cpt_results
    UNION ALL
    SELECT assessment_id, created_at, 'cpt', 'omission_error_rate', omission_error_rate FROM cpt_results
    UNION ALL
    SELECT assessment_id, created_at, 'cpt', 'commission_error_rate', commission_error_rate FROM cpt_results
    UNION ALL
    SELECT assessment_id, created_at, 'tmt', 'part_a_time', part_a_completion_time FROM tmt_results
    UNION ALL
    SELECT assessment_id, created_at, 'tmt', 'part_b_time', part_b_completion_time FROM tmt_results
    UNION ALL
    SELECT assessment_id, created_at, 'tmt', 'part_a_errors', part_a_errors::FLOAT8 FROM tmt_results
    UNION ALL
    SELECT assessment_id, created_at, 'tmt', 'part_b_errors', part_b_errors::FLOAT8 FROM tmt_results
    UNION ALL
    SELECT assessment_id, created_at, 'tmt', 'b_a_ratio', b_to_a_ratio FROM tmt_results
    UNION ALL
    SELECT assessment_id, created_at, 'dst', 'highest_span', highest_span_achieved::FLOAT8 FROM dst_results
    UNION ALL
    SELECT assessment_id, created_at, 'dst', 'correct_trials', correct_trials::FLOAT8 FROM dst_results
    UNION ALL
    SELECT assessment_id, created_at, 'dst', 'total_trials', total_trials::FLOAT8 FROM dst_results
    UNION ALL
    SELECT ans.assessment_id, a.created_at, ans.question_id, ans.question_id,
        CASE WHEN ans.answer_value ~ '^[0-9]+(\.[0-9]+)?$' THEN ans.answer_value::FLOAT8 END
    FROM answers ans
    JOIN assessments a ON ans.assessment_id = a.id
)
"#;

/// One value of a metric over time.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct TimelinePoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

/// A metric paired with the self-reported symptom score of the same attempt.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPoint {
    pub metric_value: f64,
    pub symptom_value: f64,
}

impl PgStore {
    /// Values of `metric_key` recorded under `question_id` across the
    /// subject's completed attempts, oldest first.
    pub async fn timeline(
        &self,
        user_id: i64,
        question_id: &str,
        metric_key: &str,
    ) -> Result<Vec<TimelinePoint>, StoreError> {
        let points = sqlx::query_as::<_, TimelinePoint>(&format!(
            r#"
            {ALL_METRICS_CTE}
            SELECT a.created_at AS date, am.metric_value AS value
            FROM all_metrics am
            JOIN assessments a ON am.assessment_id = a.id
            WHERE a.user_id = $1
              AND am.question_id = $2
              AND am.metric_key = $3
              AND a.is_complete = true
              AND am.metric_value IS NOT NULL
            ORDER BY a.created_at
            "#
        ))
        .bind(user_id)
        .bind(question_id)
        .bind(metric_key)
        .fetch_all(self.pool())
        .await?;
        Ok(points)
    }

    /// Pairs `metric_key` of `question_id` with the numeric answer to
    /// `symptom_question_id`, one point per completed attempt that has both.
    pub async fn correlation(
        &self,
        user_id: i64,
        symptom_question_id: &str,
        question_id: &str,
        metric_key: &str,
    ) -> Result<Vec<CorrelationPoint>, StoreError> {
        let points = sqlx::query_as::<_, CorrelationPoint>(&format!(
            r#"
            {ALL_METRICS_CTE}
            SELECT task.metric_value AS metric_value, symptom.metric_value AS symptom_value
            FROM assessments a
            JOIN all_metrics task ON a.id = task.assessment_id
                AND task.question_id = $3
                AND task.metric_key = $4
            JOIN all_metrics symptom ON a.id = symptom.assessment_id
                AND symptom.question_id = $2
                AND symptom.metric_key = $2
            WHERE a.user_id = $1
              AND a.is_complete = true
              AND task.metric_value IS NOT NULL
              AND symptom.metric_value IS NOT NULL
            ORDER BY a.created_at
            "#
        ))
        .bind(user_id)
        .bind(symptom_question_id)
        .bind(question_id)
        .bind(metric_key)
        .fetch_all(self.pool())
        .await?;
        Ok(points)
    }
}
