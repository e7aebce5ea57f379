// src/repository/mod.rs

//! Persistence gateway.
//!
//! `AssessmentStore` is the seam between the assessment state machine and the
//! database. Every method that writes more than one row commits them as a
//! single unit; a failure leaves nothing behind.

pub mod pg;
pub mod reminders;
pub mod reports;

use std::collections::BTreeMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    models::assessment::{AssessmentState, NewAssessmentMetric},
    scoring::TestOutcome,
};

pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The attempt was not at the expected position (or already complete).
    #[error("assessment {0} was modified concurrently")]
    Conflict(i64),

    #[error("assessment {0} not found")]
    NotFound(i64),
}

/// Result written alongside a position change.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord {
    /// Upserted by (assessment, question id).
    Answer { question_id: String, value: String },
    /// Summary row plus its detail rows.
    Test(TestOutcome),
}

/// Moves an attempt one question forward and writes its result atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct Advance {
    pub assessment_id: i64,
    /// Position the caller observed; the write fails with `Conflict` otherwise.
    pub from_position: i32,
    pub complete: bool,
    pub record: Option<ResultRecord>,
}

impl Advance {
    pub fn to_position(&self) -> i32 {
        self.from_position + 1
    }
}

#[async_trait]
pub trait AssessmentStore: Send + Sync {
    /// The subject's incomplete attempt, if any.
    async fn find_active(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError>;

    /// Returns the subject's incomplete attempt, creating one with `order` if
    /// none exists. Concurrent callers all observe the same attempt.
    async fn active_or_create(
        &self,
        user_id: i64,
        order: &[i32],
    ) -> Result<AssessmentState, StoreError>;

    /// The incomplete attempt, otherwise the most recently completed one.
    async fn find_latest(&self, user_id: i64) -> Result<Option<AssessmentState>, StoreError>;

    /// An attempt by id, restricted to its owner.
    async fn find_assessment(
        &self,
        user_id: i64,
        assessment_id: i64,
    ) -> Result<Option<AssessmentState>, StoreError>;

    async fn advance(&self, advance: Advance) -> Result<AssessmentState, StoreError>;

    /// Moves an incomplete attempt from `from_position` to `to_position`
    /// without touching any stored result.
    async fn set_position(
        &self,
        assessment_id: i64,
        from_position: i32,
        to_position: i32,
    ) -> Result<AssessmentState, StoreError>;

    /// Stored answers keyed by question id.
    async fn answers(&self, assessment_id: i64) -> Result<BTreeMap<String, String>, StoreError>;

    /// Appends metric rows in one transaction. Returns the number written.
    async fn save_metrics(
        &self,
        assessment_id: i64,
        metrics: &[NewAssessmentMetric],
    ) -> Result<usize, StoreError>;
}
