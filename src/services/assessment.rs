// src/services/assessment.rs

//! Assessment state machine.
//!
//! An attempt moves through a per-attempt random permutation of the catalog.
//! All mutations go through the store with an expected-position guard, so a
//! stale or concurrent request never double-advances an attempt.

use std::sync::{Arc, Mutex};

use rand::{rngs::StdRng, seq::SliceRandom};
use serde::Serialize;
use thiserror::Error;

use crate::{
    metrics::{CalculatedMetrics, calculate_interaction_metrics},
    models::{
        assessment::{AdvanceRequest, AssessmentResults, AssessmentState},
        interaction::InteractionData,
        question::{Catalog, Question},
    },
    repository::{Advance, AssessmentStore, ResultRecord, StoreError},
    scoring,
    utils::html::clean_answer,
};

pub const REQUIRED_MESSAGE: &str = "This question is required. Please select an answer.";

/// The question an attempt is currently on.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub assessment_id: i64,
    pub question: Question,
    /// Zero-based position within the attempt's order.
    pub position: usize,
    pub total: usize,
    /// Runner settings for cognitive tests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What the subject sees after answering.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Step {
    Question(QuestionView),
    Complete(AssessmentResults),
}

/// Metrics stored from one telemetry bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMetrics {
    pub assessment_id: i64,
    pub global_metrics: usize,
    pub question_metrics: usize,
}

#[derive(Debug, Error)]
pub enum AssessmentError {
    /// A required standard question was submitted empty. Carries the same
    /// question, re-served with the message attached.
    #[error("{message}")]
    Required {
        message: String,
        view: Box<QuestionView>,
    },

    #[error("answer for '{submitted}' does not match current question '{expected}'")]
    StaleQuestion { submitted: String, expected: String },

    #[error("no assessment in progress")]
    NoActiveAssessment,

    #[error("assessment {0} not found")]
    NotFound(i64),

    #[error("question catalog is empty")]
    EmptyCatalog,

    #[error("question order references unknown catalog index {0}")]
    UnknownQuestion(i32),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Drives attempts over a read-only catalog.
pub struct AssessmentService<S> {
    store: Arc<S>,
    catalog: Arc<Catalog>,
    rng: Arc<Mutex<StdRng>>,
}

impl<S> Clone for AssessmentService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            catalog: Arc::clone(&self.catalog),
            rng: Arc::clone(&self.rng),
        }
    }
}

impl<S: AssessmentStore> AssessmentService<S> {
    pub fn new(store: Arc<S>, catalog: Arc<Catalog>, rng: StdRng) -> Self {
        Self {
            store,
            catalog,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn shuffled_order(&self) -> Vec<i32> {
        let mut order: Vec<i32> = (0..self.catalog.len() as i32).collect();
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        order.shuffle(&mut *rng);
        order
    }

    fn question_at(&self, state: &AssessmentState) -> Result<&Question, AssessmentError> {
        let index = state
            .question_order
            .get(state.position())
            .copied()
            .ok_or(AssessmentError::UnknownQuestion(state.current_question_index))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.catalog.get(i))
            .ok_or(AssessmentError::UnknownQuestion(index))
    }

    fn view(&self, state: &AssessmentState) -> Result<QuestionView, AssessmentError> {
        let question = self.question_at(state)?;
        Ok(QuestionView {
            assessment_id: state.id,
            settings: question.settings(),
            question: question.clone(),
            position: state.position(),
            total: state.total(),
            error: None,
        })
    }

    /// Resumes the subject's incomplete attempt or starts a new one.
    pub async fn start_or_resume(&self, user_id: i64) -> Result<AssessmentState, AssessmentError> {
        if self.catalog.is_empty() {
            return Err(AssessmentError::EmptyCatalog);
        }
        if let Some(active) = self.store.find_active(user_id).await? {
            return Ok(active);
        }
        let order = self.shuffled_order();
        Ok(self.store.active_or_create(user_id, &order).await?)
    }

    /// The question the subject should answer next.
    pub async fn current(&self, user_id: i64) -> Result<QuestionView, AssessmentError> {
        let state = self.start_or_resume(user_id).await?;
        self.view(&state)
    }

    /// Answers the current question and moves forward.
    pub async fn advance(
        &self,
        user_id: i64,
        request: AdvanceRequest,
    ) -> Result<Step, AssessmentError> {
        let state = self
            .store
            .find_active(user_id)
            .await?
            .ok_or(AssessmentError::NoActiveAssessment)?;
        let question = self.question_at(&state)?;

        if question.id != request.question_id {
            return Err(AssessmentError::StaleQuestion {
                submitted: request.question_id,
                expected: question.id.clone(),
            });
        }

        let answer = request
            .answer
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());

        let record = if question.question_type.is_cognitive_test() {
            answer.and_then(|payload| {
                match scoring::score_payload(question.question_type, payload) {
                    Ok(outcome) => {
                        tracing::debug!(
                            assessment_id = state.id,
                            test = outcome.question_type().as_str(),
                            "Test payload scored"
                        );
                        Some(ResultRecord::Test(outcome))
                    }
                    Err(e) => {
                        tracing::warn!(
                            assessment_id = state.id,
                            question_id = %question.id,
                            "Discarding test payload: {}",
                            e
                        );
                        None
                    }
                }
            })
        } else {
            match answer.map(clean_answer).filter(|a| !a.is_empty()) {
                Some(value) => Some(ResultRecord::Answer {
                    question_id: question.id.clone(),
                    value,
                }),
                None if question.required => {
                    let mut view = self.view(&state)?;
                    view.error = Some(REQUIRED_MESSAGE.to_string());
                    return Err(AssessmentError::Required {
                        message: REQUIRED_MESSAGE.to_string(),
                        view: Box::new(view),
                    });
                }
                None => None,
            }
        };

        let complete = state.position() + 1 >= state.total();
        let next = self
            .store
            .advance(Advance {
                assessment_id: state.id,
                from_position: state.current_question_index,
                complete,
                record,
            })
            .await?;

        if next.is_complete {
            tracing::info!(user_id, assessment_id = next.id, "Assessment completed");
            let answers = self.store.answers(next.id).await?;
            return Ok(Step::Complete(AssessmentResults {
                assessment_id: next.id,
                answers,
            }));
        }
        Ok(Step::Question(self.view(&next)?))
    }

    /// Steps back one question. Stored answers are left as they are.
    pub async fn retreat(&self, user_id: i64) -> Result<QuestionView, AssessmentError> {
        let state = self
            .store
            .find_active(user_id)
            .await?
            .ok_or(AssessmentError::NoActiveAssessment)?;

        if state.current_question_index <= 0 {
            return self.view(&state);
        }
        let moved = self
            .store
            .set_position(state.id, state.current_question_index, state.current_question_index - 1)
            .await?;
        self.view(&moved)
    }

    /// Collected answers of one of the subject's attempts.
    pub async fn results(
        &self,
        user_id: i64,
        assessment_id: i64,
    ) -> Result<AssessmentResults, AssessmentError> {
        let state = self
            .store
            .find_assessment(user_id, assessment_id)
            .await?
            .ok_or(AssessmentError::NotFound(assessment_id))?;
        let answers = self.store.answers(state.id).await?;
        Ok(AssessmentResults {
            assessment_id: state.id,
            answers,
        })
    }

    /// Derives interaction metrics from a telemetry bundle and stores them
    /// against the subject's current (or last finished) attempt.
    pub async fn record_interactions(
        &self,
        user_id: i64,
        data: &InteractionData,
    ) -> Result<RecordedMetrics, AssessmentError> {
        let state = self
            .store
            .find_latest(user_id)
            .await?
            .ok_or(AssessmentError::NoActiveAssessment)?;

        let metrics: CalculatedMetrics = calculate_interaction_metrics(data);
        let global_metrics = metrics.global_metrics.len();
        let question_metrics = metrics.question_metrics.len();
        if !metrics.is_empty() {
            self.store.save_metrics(state.id, &metrics.into_rows()).await?;
        }

        tracing::debug!(
            assessment_id = state.id,
            global_metrics,
            question_metrics,
            "Interaction metrics stored"
        );
        Ok(RecordedMetrics {
            assessment_id: state.id,
            global_metrics,
            question_metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    struct NoStore;

    #[async_trait::async_trait]
    impl AssessmentStore for NoStore {
        async fn find_active(&self, _: i64) -> Result<Option<AssessmentState>, StoreError> {
            Ok(None)
        }
        async fn active_or_create(&self, _: i64, _: &[i32]) -> Result<AssessmentState, StoreError> {
            Err(StoreError::NotFound(0))
        }
        async fn find_latest(&self, _: i64) -> Result<Option<AssessmentState>, StoreError> {
            Ok(None)
        }
        async fn find_assessment(
            &self,
            _: i64,
            _: i64,
        ) -> Result<Option<AssessmentState>, StoreError> {
            Ok(None)
        }
        async fn advance(&self, a: Advance) -> Result<AssessmentState, StoreError> {
            Err(StoreError::Conflict(a.assessment_id))
        }
        async fn set_position(
            &self,
            id: i64,
            _: i32,
            _: i32,
        ) -> Result<AssessmentState, StoreError> {
            Err(StoreError::Conflict(id))
        }
        async fn answers(
            &self,
            _: i64,
        ) -> Result<std::collections::BTreeMap<String, String>, StoreError> {
            Ok(Default::default())
        }
        async fn save_metrics(
            &self,
            _: i64,
            _: &[crate::models::assessment::NewAssessmentMetric],
        ) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    fn service(seed: u64) -> AssessmentService<NoStore> {
        let catalog = Catalog::from_json(
            r#"{"questions": [
                {"id": "a", "title": "A", "type": "radio"},
                {"id": "b", "title": "B", "type": "text"},
                {"id": "c", "title": "C", "type": "cpt"},
                {"id": "d", "title": "D", "type": "dst"},
                {"id": "e", "title": "E", "type": "tmt"}
            ]}"#,
        )
        .unwrap();
        AssessmentService::new(Arc::new(NoStore), Arc::new(catalog), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_shuffled_order_is_a_permutation() {
        let svc = service(42);
        let mut order = svc.shuffled_order();
        assert_eq!(order.len(), 5);
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_same_seed_same_order() {
        assert_eq!(service(7).shuffled_order(), service(7).shuffled_order());
    }

    #[test]
    fn test_view_rejects_out_of_range_order() {
        let svc = service(1);
        let state = AssessmentState {
            id: 1,
            user_id: 1,
            is_complete: false,
            question_order: vec![9],
            current_question_index: 0,
            created_at: None,
            updated_at: None,
        };
        assert!(matches!(svc.view(&state), Err(AssessmentError::UnknownQuestion(9))));
    }

    #[tokio::test]
    async fn test_advance_without_attempt() {
        let svc = service(1);
        let request = AdvanceRequest {
            question_id: "a".into(),
            answer: Some("1".into()),
        };
        assert!(matches!(
            svc.advance(1, request).await,
            Err(AssessmentError::NoActiveAssessment)
        ));
    }
}
