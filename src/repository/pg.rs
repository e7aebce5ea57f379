// src/repository/pg.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{Advance, AssessmentStore, ResultRecord, StoreError};
use crate::{
    models::{
        assessment::{AssessmentState, NewAssessmentMetric},
        cognitive::{CptOutcome, DstOutcome, TmtOutcome},
    },
    scoring::TestOutcome,
};

const STATE_COLUMNS: &str =
    "id, user_id, is_complete, question_order, current_question_index, created_at, updated_at";

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AssessmentStore for PgStore {
    async fn find_active(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError> {
        let state = sqlx::query_as::<_, AssessmentState>(&format!(
            "SELECT {STATE_COLUMNS} FROM assessments WHERE user_id = $1 AND is_complete = false"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(state)
    }

    async fn active_or_create(
        &self,
        user_id: i64,
        order: &[i32],
    ) -> Result<AssessmentState, StoreError> {
        // The partial unique index turns a losing concurrent insert into a
        // no-op; the loser then reads the winner. A second pass covers the
        // winner completing in between.
        for _ in 0..2 {
            if let Some(active) = self.find_active(user_id).await? {
                return Ok(active);
            }

            let inserted = sqlx::query_as::<_, AssessmentState>(&format!(
                r#"
                INSERT INTO assessments (user_id, question_order, current_question_index, is_complete)
                VALUES ($1, $2, 0, false)
                ON CONFLICT (user_id) WHERE is_complete = false DO NOTHING
                RETURNING {STATE_COLUMNS}
                "#
            ))
            .bind(user_id)
            .bind(order)
            .fetch_optional(&self.pool)
            .await?;

            if let Some(created) = inserted {
                tracing::info!(user_id, assessment_id = created.id, "Assessment created");
                return Ok(created);
            }
            tracing::debug!(user_id, "Lost assessment creation race, reading winner");
        }

        self.find_active(user_id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn find_latest(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError> {
        let state = sqlx::query_as::<_, AssessmentState>(&format!(
            r#"
            SELECT {STATE_COLUMNS} FROM assessments
            WHERE user_id = $1
            ORDER BY is_complete ASC, updated_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(state)
    }

    async fn find_assessment(
        &self,
        user_id: i64,
        assessment_id: i64,
    ) -> Result<Option<AssessmentState>, StoreError> {
        let state = sqlx::query_as::<_, AssessmentState>(&format!(
            "SELECT {STATE_COLUMNS} FROM assessments WHERE id = $1 AND user_id = $2"
        ))
        .bind(assessment_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(state)
    }

    async fn advance(&self, advance: Advance) -> Result<AssessmentState, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Position guard first: a concurrent advance makes this match nothing
        // and the transaction is dropped before any result is written.
        let state = sqlx::query_as::<_, AssessmentState>(&format!(
            r#"
            UPDATE assessments
            SET current_question_index = $3, is_complete = $4, updated_at = NOW()
            WHERE id = $1 AND current_question_index = $2 AND is_complete = false
            RETURNING {STATE_COLUMNS}
            "#
        ))
        .bind(advance.assessment_id)
        .bind(advance.from_position)
        .bind(advance.to_position())
        .bind(advance.complete)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::Conflict(advance.assessment_id))?;

        match &advance.record {
            Some(ResultRecord::Answer { question_id, value }) => {
                upsert_answer(&mut tx, advance.assessment_id, question_id, value).await?;
            }
            Some(ResultRecord::Test(TestOutcome::Cpt(outcome))) => {
                insert_cpt(&mut tx, advance.assessment_id, outcome).await?;
            }
            Some(ResultRecord::Test(TestOutcome::Dst(outcome))) => {
                insert_dst(&mut tx, advance.assessment_id, outcome).await?;
            }
            Some(ResultRecord::Test(TestOutcome::Tmt(outcome))) => {
                insert_tmt(&mut tx, advance.assessment_id, outcome).await?;
            }
            None => {}
        }

        tx.commit().await?;
        Ok(state)
    }

    async fn set_position(
        &self,
        assessment_id: i64,
        from_position: i32,
        to_position: i32,
    ) -> Result<AssessmentState, StoreError> {
        sqlx::query_as::<_, AssessmentState>(&format!(
            r#"
            UPDATE assessments
            SET current_question_index = $3, updated_at = NOW()
            WHERE id = $1 AND current_question_index = $2 AND is_complete = false
            RETURNING {STATE_COLUMNS}
            "#
        ))
        .bind(assessment_id)
        .bind(from_position)
        .bind(to_position)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::Conflict(assessment_id))
    }

    async fn answers(&self, assessment_id: i64) -> Result<BTreeMap<String, String>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT question_id, answer_value FROM answers WHERE assessment_id = $1",
        )
        .bind(assessment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn save_metrics(
        &self,
        assessment_id: i64,
        metrics: &[NewAssessmentMetric],
    ) -> Result<usize, StoreError> {
        if metrics.is_empty() {
            return Ok(0);
        }

        let question_ids: Vec<String> = metrics.iter().map(|m| m.question_id.clone()).collect();
        let keys: Vec<String> = metrics.iter().map(|m| m.metric_key.clone()).collect();
        let values: Vec<f64> = metrics.iter().map(|m| m.metric_value).collect();
        let sample_sizes: Vec<i32> = metrics.iter().map(|m| m.sample_size).collect();

        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            INSERT INTO metrics (assessment_id, question_id, metric_key, metric_value, sample_size)
            SELECT $1, * FROM UNNEST($2::TEXT[], $3::TEXT[], $4::FLOAT8[], $5::INT4[])
            "#,
        )
        .bind(assessment_id)
        .bind(&question_ids)
        .bind(&keys)
        .bind(&values)
        .bind(&sample_sizes)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(result.rows_affected() as usize)
    }
}

async fn upsert_answer(
    tx: &mut Transaction<'_, Postgres>,
    assessment_id: i64,
    question_id: &str,
    value: &str,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO answers (assessment_id, question_id, answer_value)
        VALUES ($1, $2, $3)
        ON CONFLICT (assessment_id, question_id)
        DO UPDATE SET answer_value = EXCLUDED.answer_value, updated_at = NOW()
        "#,
    )
    .bind(assessment_id)
    .bind(question_id)
    .bind(value)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_cpt(
    tx: &mut Transaction<'_, Postgres>,
    assessment_id: i64,
    outcome: &CptOutcome,
) -> Result<i64, StoreError> {
    let s = &outcome.summary;
    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO cpt_results (
            assessment_id, correct_detections, commission_errors, omission_errors,
            average_reaction_time, reaction_time_sd, detection_rate,
            omission_error_rate, commission_error_rate, raw_data
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        "#,
    )
    .bind(assessment_id)
    .bind(s.correct_detections)
    .bind(s.commission_errors)
    .bind(s.omission_errors)
    .bind(s.average_reaction_time)
    .bind(s.reaction_time_sd)
    .bind(s.detection_rate)
    .bind(s.omission_error_rate)
    .bind(s.commission_error_rate)
    .bind(&outcome.raw_data)
    .fetch_one(&mut **tx)
    .await?;

    if outcome.details.is_empty() {
        return Ok(result_id);
    }

    // Kind-specific fields become NULL for the other kind.
    let details = &outcome.details;
    let event_types: Vec<String> = details.iter().map(|e| e.kind.label().to_string()).collect();
    let values: Vec<String> = details.iter().map(|e| e.stimulus_value.clone()).collect();
    let targets: Vec<bool> = details.iter().map(|e| e.is_target).collect();
    let presented: Vec<Option<f64>> = details.iter().map(|e| e.kind.presented_at()).collect();
    let responses: Vec<Option<f64>> = details.iter().map(|e| e.kind.response_time()).collect();
    let indices: Vec<Option<i32>> = details.iter().map(|e| e.kind.stimulus_index()).collect();

    sqlx::query(
        r#"
        INSERT INTO cpt_events (
            result_id, event_type, stimulus_value, is_target, presented_at, response_time, stimulus_index
        )
        SELECT $1, * FROM UNNEST($2::TEXT[], $3::TEXT[], $4::BOOL[], $5::FLOAT8[], $6::FLOAT8[], $7::INT4[])
        "#,
    )
    .bind(result_id)
    .bind(&event_types)
    .bind(&values)
    .bind(&targets)
    .bind(&presented)
    .bind(&responses)
    .bind(&indices)
    .execute(&mut **tx)
    .await?;

    Ok(result_id)
}

async fn insert_dst(
    tx: &mut Transaction<'_, Postgres>,
    assessment_id: i64,
    outcome: &DstOutcome,
) -> Result<i64, StoreError> {
    let s = &outcome.summary;
    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO dst_results (assessment_id, highest_span_achieved, total_trials, correct_trials, raw_data)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(assessment_id)
    .bind(s.highest_span_achieved)
    .bind(s.total_trials)
    .bind(s.correct_trials)
    .bind(&outcome.raw_data)
    .fetch_one(&mut **tx)
    .await?;

    if outcome.details.is_empty() {
        return Ok(result_id);
    }

    let spans: Vec<i32> = outcome.details.iter().map(|a| a.span).collect();
    let trials: Vec<i32> = outcome.details.iter().map(|a| a.trial).collect();
    let sequences: Vec<String> = outcome.details.iter().map(|a| a.sequence.clone()).collect();
    let inputs: Vec<String> = outcome.details.iter().map(|a| a.input.clone()).collect();
    let correct: Vec<bool> = outcome.details.iter().map(|a| a.correct).collect();
    let timestamps: Vec<f64> = outcome.details.iter().map(|a| a.timestamp).collect();

    sqlx::query(
        r#"
        INSERT INTO dst_attempts (result_id, span, trial, sequence, input, is_correct, timestamp)
        SELECT $1, * FROM UNNEST($2::INT4[], $3::INT4[], $4::TEXT[], $5::TEXT[], $6::BOOL[], $7::FLOAT8[])
        "#,
    )
    .bind(result_id)
    .bind(&spans)
    .bind(&trials)
    .bind(&sequences)
    .bind(&inputs)
    .bind(&correct)
    .bind(&timestamps)
    .execute(&mut **tx)
    .await?;

    Ok(result_id)
}

async fn insert_tmt(
    tx: &mut Transaction<'_, Postgres>,
    assessment_id: i64,
    outcome: &TmtOutcome,
) -> Result<i64, StoreError> {
    let s = &outcome.summary;
    let result_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tmt_results (
            assessment_id, part_a_completion_time, part_a_errors,
            part_b_completion_time, part_b_errors, b_to_a_ratio, raw_data
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(assessment_id)
    .bind(s.part_a_completion_time)
    .bind(s.part_a_errors)
    .bind(s.part_b_completion_time)
    .bind(s.part_b_errors)
    .bind(s.b_to_a_ratio)
    .bind(&outcome.raw_data)
    .fetch_one(&mut **tx)
    .await?;

    if outcome.details.is_empty() {
        return Ok(result_id);
    }

    let xs: Vec<f64> = outcome.details.iter().map(|c| c.x).collect();
    let ys: Vec<f64> = outcome.details.iter().map(|c| c.y).collect();
    let times: Vec<f64> = outcome.details.iter().map(|c| c.time).collect();
    let items: Vec<i32> = outcome.details.iter().map(|c| c.target_item).collect();
    let parts: Vec<String> = outcome.details.iter().map(|c| c.current_part.clone()).collect();

    sqlx::query(
        r#"
        INSERT INTO tmt_clicks (result_id, x, y, time, target_item, current_part)
        SELECT $1, * FROM UNNEST($2::FLOAT8[], $3::FLOAT8[], $4::FLOAT8[], $5::INT4[], $6::TEXT[])
        "#,
    )
    .bind(result_id)
    .bind(&xs)
    .bind(&ys)
    .bind(&times)
    .bind(&items)
    .bind(&parts)
    .execute(&mut **tx)
    .await?;

    Ok(result_id)
}
